//! Name Generation for Heroes
//!
//! Given names and epithets drawn from fixed lists. Callers hand in the
//! simulation's rng so seeded runs name their heroes identically.

use rand::Rng;

const GIVEN_NAMES: &[&str] = &[
    "Aldric", "Brenna", "Cedric", "Dagny", "Edric", "Freya", "Garrick", "Helga",
    "Ivor", "Jorunn", "Kael", "Liora", "Magnus", "Nessa", "Osric", "Perrin",
    "Quenby", "Rowan", "Sigrid", "Tamsin", "Ulric", "Vesna", "Wulfric", "Yrsa",
    "Alaric", "Brynja", "Corwin", "Elowen", "Fenris", "Gwendolyn", "Hakon", "Isolde",
    "Leofric", "Maelis", "Oswin", "Rhiannon", "Soren", "Thora", "Wren", "Ysolde",
];

const EPITHETS: &[&str] = &[
    "Stormbane", "Ironhand", "Ashwood", "Brightblade", "Duskwalker", "Emberheart",
    "Frostborn", "Greymantle", "Hawkeye", "Lionmane", "Oakenshield", "Ravenwing",
    "Shadowstep", "Stonefist", "Swiftarrow", "Thornfield", "Wolfsbane", "Goldleaf",
    "Nightshade", "Silverbrook",
];

pub fn random_given_name<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    GIVEN_NAMES[rng.gen_range(0..GIVEN_NAMES.len())]
}

pub fn random_epithet<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    EPITHETS[rng.gen_range(0..EPITHETS.len())]
}

/// Generate a full hero name
pub fn random_hero_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let given = random_given_name(rng);
    let epithet = random_epithet(rng);
    format!("{given} {epithet}")
}
