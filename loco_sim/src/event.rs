// Simulation output events.
//
// `SimState::step()` returns everything the outside world has to react to as
// a list of `SimEvent`s: sounds to play, screen regions to redraw, and the
// bookkeeping events of commands. The engine never calls an audio device or a
// viewport itself; the caller drains the events after each step.
//
// Events are appended in the exact order the tick produced them (trains in id
// order, segments in chain order), so two runs with the same seed and the
// same commands yield identical event lists.
//
// See also: `sim.rs` for the tick loop, `body.rs` and `breakdown.rs` for the
// producers of sound and invalidation events.

use crate::sim::SimMode;
use crate::types::{SoundId, TrainId, WorldPos};
use serde::{Deserialize, Serialize};

/// An event emitted during a tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: SimEventKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEventKind {
    /// Play `sound` positioned at `position`.
    SoundPlayed { sound: SoundId, position: WorldPos },
    /// The sprite of a segment of `train` at `position` must be redrawn.
    SpriteInvalidated { train: TrainId, position: WorldPos },
    /// Car `car` (index into `Train::cars`) broke down.
    BreakdownStarted { train: TrainId, car: usize },
    TrainPlaced { train: TrainId },
    TrainRemoved { train: TrainId },
    ModeChanged { mode: SimMode },
}
