// loco_sim: deterministic train animation and breakdown engine.
//
// Each tick the engine walks every train's chain of segments (head, drive
// units, bogie/bogie/body sections, tail), repositions every car body between
// its bogies, derives its sprite pitch and yaw from fixed-point lookup
// tables, advances wheel/piston animation, and runs the breakdown simulator
// (smoke, breakdown sounds). Track following, audio and rendering are outside
// the crate: drive-unit physics plugs in through `update::TrainHooks`, and
// sounds and redraws come out as `SimEvent`s.
//
// Module overview:
// - `sim.rs`:         SimState, tick loop, command processing, save/load.
// - `update.rs`:      Per-train traversal, dispatch by segment kind, TickContext, TrainHooks.
// - `body.rs`:        Car body step: reposition, speed wobble, visual effects, animation frames.
// - `orientation.rs`: Midpoint reposition, pitch classifiers, yaw quantisation.
// - `tables.rs`:      Fast square-root table, pitch remap, yaw tangent thresholds.
// - `breakdown.rs`:   Breakdown smoke cadence and pending-breakdown activation.
// - `vehicle.rs`:     Train model (cars, components, segments) and chain parsing.
// - `catalog.rs`:     Vehicle type definitions (sprites, effects, top speed).
// - `entity.rs`:      Misc entity header, subtype tags, tagged payloads.
// - `pool.rs`:        Fixed-capacity entity pool with a live list in allocation order.
// - `particle.rs`:    Smoke, exhaust and money-effect factories.
// - `command.rs`:     SimCommand / SimAction, all external mutations.
// - `event.rs`:       SimEvent output (sounds, sprite invalidation, bookkeeping).
// - `config.rs`:      SimConfig + BreakdownParams.
// - `error.rs`:       SimError.
// - `prng`:           Re-exported from `loco_prng`, xoshiro256++ PRNG.
// - `types.rs`:       WorldPos, compact ids, Speed32.
//
// **Critical constraint: determinism.** The simulation is a pure function:
// `(state, commands, hooks) -> (new_state, events)`. No floating point on the
// tick path, no `HashMap`, no system time, no OS entropy. All randomness
// comes from the seeded `GameRng` in `SimState`.

pub mod body;
pub mod breakdown;
pub mod catalog;
pub mod command;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod orientation;
pub mod particle;
pub mod pool;
pub use loco_prng as prng;
pub mod sim;
pub mod tables;
pub mod types;
pub mod update;
pub mod vehicle;

#[cfg(test)]
mod test_util;
