// Breakdown simulator.
//
// Runs as part of the head's update step, once per train per tick, over the
// train's logical cars (never over individual sections: an articulated car
// breaks down as a whole, and its smoke and sound come from its first body).
//
// Nothing happens while the head is in a breakdown-inactive drive state
// (stopped, waiting, loading, crashed, ...). Otherwise, per car:
//
// - Broken down: on ticks where `tick & smoke_tick_mask == 0` (every 4th
//   tick with the stock config) a black smoke puff is spawned above the
//   first body. The cadence is keyed to the tick counter, not random.
// - Pending: unless the game is in title mode or breakdowns are disabled in
//   the config, the breakdown starts. The car becomes broken down with a
//   fresh timeout, `TrainHooks::apply_breakdown_effects` runs, and one
//   breakdown sound (uniform over the configured id range) is played above
//   the first body.
//
// A full entity pool drops the smoke silently. A car without a body breaks
// the train model; `Train::validate` rejects it on every way in, and debug
// builds assert on it here.
//
// See also: `config.rs` (`BreakdownParams`), `particle.rs`, `update.rs`.

use crate::event::SimEventKind;
use crate::particle::create_black_smoke;
use crate::types::SoundId;
use crate::update::{TickContext, UpdateEnv};
use crate::vehicle::{Car, VehicleHead};

/// Advance the breakdown state of every car of a train by one tick.
pub fn update_breakdowns(head: &mut VehicleHead, cars: &mut [Car], ctx: &TickContext, env: &mut UpdateEnv<'_>) {
    if head.status.is_breakdown_inactive() {
        return;
    }
    let config = env.config;
    let params = &config.breakdown;

    for (index, car) in cars.iter_mut().enumerate() {
        let first_body = car.first_body();
        debug_assert!(first_body.is_some(), "{} car {index} has no body", ctx.train);
        let Some(position) = first_body.map(|body| body.position) else {
            continue;
        };

        if car.breakdown.broken_down && ctx.tick & params.smoke_tick_mask == 0 {
            create_black_smoke(env.entities, position.offset_z(params.smoke_height));
        }

        if car.breakdown.pending && !ctx.title_mode && !config.breakdowns_disabled {
            car.breakdown.pending = false;
            car.breakdown.broken_down = true;
            car.breakdown_timeout = params.breakdown_timeout;
            env.hooks.apply_breakdown_effects(head, car);

            let high = params.sound_first.saturating_add(params.sound_count);
            let sound = if high > params.sound_first {
                env.rng.range_u8(params.sound_first, high)
            } else {
                params.sound_first
            };
            env.emit(
                ctx.tick,
                SimEventKind::SoundPlayed {
                    sound: SoundId(sound),
                    position: position.offset_z(params.sound_height),
                },
            );
            env.emit(
                ctx.tick,
                SimEventKind::BreakdownStarted {
                    train: ctx.train,
                    car: index,
                },
            );
            log::debug!("{} car {index} broke down at tick {}", ctx.train, ctx.tick);
        }
    }
}
