//! Spawning System
//!
//! Enemies arrive on a random border cell; the kind is drawn by weight.

use once_cell::sync::Lazy;
use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};
use tracing::debug;

use crate::catalog::EnemyKind;
use crate::components::{Enemy, EnemyId, Position};
use crate::events::GameEvent;
use crate::systems::TickContext;

static KIND_WEIGHTS: Lazy<Option<WeightedIndex<u32>>> =
    Lazy::new(|| WeightedIndex::new(EnemyKind::ALL.iter().map(|k| k.spawn_weight())).ok());

fn pick_kind(ctx: &mut TickContext<'_>) -> EnemyKind {
    match KIND_WEIGHTS.as_ref() {
        Some(weights) => EnemyKind::ALL[weights.sample(&mut *ctx.rng)],
        None => EnemyKind::Goblin,
    }
}

/// A uniformly chosen side, then a uniform cell along it.
fn border_cell(ctx: &mut TickContext<'_>) -> Position {
    let width = ctx.registry.grid().width() as i32;
    let height = ctx.registry.grid().height() as i32;
    match ctx.rng.gen_range(0..4) {
        0 => Position::new(ctx.rng.gen_range(0..width), 0),
        1 => Position::new(width - 1, ctx.rng.gen_range(0..height)),
        2 => Position::new(ctx.rng.gen_range(0..width), height - 1),
        _ => Position::new(0, ctx.rng.gen_range(0..height)),
    }
}

/// Try to bring one enemy onto the map. Returns `None` when the chosen
/// border cell holds a building or another enemy; the next spawn window
/// simply tries again.
pub fn spawn_enemy(ctx: &mut TickContext<'_>) -> Option<EnemyId> {
    let kind = pick_kind(ctx);
    let at = border_cell(ctx);
    let id = ctx.registry.insert_enemy(Enemy::new(kind), at).ok()?;
    ctx.statistics.enemies_spawned += 1;
    debug!(%id, %kind, %at, "enemy spawned");
    ctx.emit(GameEvent::EnemySpawned { id, kind, position: at });
    Some(id)
}
