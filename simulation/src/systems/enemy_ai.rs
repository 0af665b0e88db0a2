//! Enemy AI
//!
//! Enemies march on the castle. No scoring and no memory: most turns they
//! step straight at it, the rest they wander.

use rand::seq::SliceRandom;
use tracing::debug;

use crate::components::EnemyId;
use crate::events::GameOverReason;
use crate::systems::movement::{free_enemy_steps, move_enemy_toward};
use crate::systems::TickContext;

/// Run one enemy's turn. Ends the game if the enemy is already at the
/// castle walls.
pub fn enemy_turn(ctx: &mut TickContext<'_>, id: EnemyId) {
    let Some(from) = ctx.registry.enemy_position(id) else {
        return;
    };
    let cooldown = match ctx.registry.enemy_mut(id) {
        Some(enemy) if enemy.move_cooldown > 0 => {
            enemy.move_cooldown -= 1;
            return;
        }
        Some(_) => ctx.config.enemy_cooldown,
        None => return,
    };

    let castle = ctx.registry.castle().map(|(_, pos)| pos);
    if let Some(castle) = castle {
        if from.manhattan(castle) <= 1 {
            ctx.end_game(GameOverReason::CastleOverrun);
            return;
        }
    }

    let seek = ctx.roll(ctx.config.enemy_seek_chance);
    match castle {
        Some(castle) if seek => {
            move_enemy_toward(ctx.registry, id, from, castle);
        }
        _ => {
            let steps = free_enemy_steps(ctx.registry, from);
            if let Some(&to) = steps.choose(&mut *ctx.rng) {
                ctx.registry.move_enemy(id, to);
            }
        }
    }
    if let Some(enemy) = ctx.registry.enemy_mut(id) {
        enemy.move_cooldown = cooldown;
    }
    debug!(%id, from = %from, to = ?ctx.registry.enemy_position(id), "enemy moved");
}

/// Give every enemy its chance to act, lowest id first.
pub fn enemy_system(ctx: &mut TickContext<'_>) {
    for id in ctx.registry.enemy_ids() {
        if ctx.is_over() {
            return;
        }
        if !ctx.registry.contains_enemy(id) {
            continue;
        }
        if ctx.roll(ctx.config.enemy_act_chance) {
            enemy_turn(ctx, id);
        }
    }
}
