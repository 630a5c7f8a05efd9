// Simulation errors.
//
// Expected absence never shows up here: a full entity pool or a particle
// viewed as the wrong variant is an `Option::None` at the call site, and the
// caller simply skips the effect. `SimError` is reserved for structural
// corruption (a train chain that does not parse, a body pointing at a vehicle
// type the catalog does not have) and for bad input at the edges (config
// JSON, commands naming a train that does not exist). Structural errors abort
// the current tick: `SimState::step` propagates them unchanged.
//
// See also: `vehicle.rs` for chain parsing, `body.rs` for catalog lookups.

use crate::types::{ObjectId, TrainId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// A flat segment chain did not describe a well-formed train.
    #[error("malformed train chain at segment {index}: {reason}")]
    MalformedChain { index: usize, reason: &'static str },

    /// A body references a vehicle type missing from the catalog.
    #[error("vehicle object {0} is not in the catalog")]
    UnknownVehicleObject(ObjectId),

    /// A body's sprite index is past the end of its object's sprite list.
    #[error("vehicle object {object} has no body sprite {sprite}")]
    UnknownBodySprite { object: ObjectId, sprite: u8 },

    #[error("no train with id {0}")]
    UnknownTrain(TrainId),

    #[error("{train} has no car {car}")]
    UnknownCar { train: TrainId, car: usize },

    /// A loaded entity pool whose live list cannot be followed safely.
    #[error("corrupt entity pool: {reason}")]
    CorruptEntityPool { reason: &'static str },

    #[error("a train with id {0} already exists")]
    DuplicateTrain(TrainId),

    /// Config, catalog or save data that failed to parse.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
