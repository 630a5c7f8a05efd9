// Commands that mutate simulation state from outside.
//
// Everything that is not the per-tick animation itself goes through
// `SimCommand`: placing and removing trains, scheduling a breakdown, changing
// a train's drive status, switching between playing and title mode. The sim
// is a function `(state, commands) -> (new_state, events)`; commands carry
// the tick at which they apply and are processed at the start of that tick,
// before any train is updated.
//
// See also: `sim.rs` for `apply_command()`, `event.rs` for the events the
// commands emit.
//
// **Critical constraint: determinism.** Commands are the only external input.
// Callers must pass them sorted by tick.

use crate::sim::SimMode;
use crate::types::TrainId;
use crate::vehicle::{DriveStatus, Train};
use serde::{Deserialize, Serialize};

/// A command scheduled for a specific tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimCommand {
    pub tick: u64,
    pub action: SimAction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimAction {
    /// Add a train. Rejected if its id is taken or its chain is malformed.
    PlaceTrain { train: Box<Train> },
    RemoveTrain { train: TrainId },
    /// Mark car `car` of `train` as pending breakdown.
    RequestBreakdown { train: TrainId, car: usize },
    SetDriveStatus { train: TrainId, status: DriveStatus },
    SetMode { mode: SimMode },
}
