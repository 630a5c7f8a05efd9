// Data-driven simulation configuration.
//
// `SimConfig` holds every tunable the train engine reads: the global
// "breakdowns disabled" switch, the entity pool capacity, the map extent used
// to reject particles spawned off the map, and the breakdown cadence and
// sound parameters. It loads from JSON; every field has a named default, so a
// partial file (or `{}`) is valid and yields the stock behaviour.
//
// The breakdown defaults are the stock gameplay values: smoke every 4th
// tick, 4 units above the body, five breakdown sounds starting at id 26, and
// a 5-step breakdown timeout. Changing them changes gameplay, so all clients
// of a shared session must load identical configs.
//
// See also: `breakdown.rs` which reads `BreakdownParams`, `pool.rs` for the
// capacity, `particle.rs` for the map bounds check.

use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Parameters of the breakdown simulator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownParams {
    /// Smoke is spawned on ticks where `tick & smoke_tick_mask == 0`.
    #[serde(default = "default_smoke_tick_mask")]
    pub smoke_tick_mask: u64,
    /// Height above the car body at which smoke appears.
    #[serde(default = "default_smoke_height")]
    pub smoke_height: i16,
    /// Height above the car body at which the breakdown sound plays.
    #[serde(default = "default_sound_height")]
    pub sound_height: i16,
    /// First breakdown sound id.
    #[serde(default = "default_sound_first")]
    pub sound_first: u8,
    /// Number of consecutive breakdown sound ids to choose from.
    #[serde(default = "default_sound_count")]
    pub sound_count: u8,
    /// Value written to a car's breakdown timeout when a breakdown starts.
    #[serde(default = "default_breakdown_timeout")]
    pub breakdown_timeout: u8,
}

fn default_smoke_tick_mask() -> u64 {
    3
}
fn default_smoke_height() -> i16 {
    4
}
fn default_sound_height() -> i16 {
    22
}
fn default_sound_first() -> u8 {
    26
}
fn default_sound_count() -> u8 {
    5
}
fn default_breakdown_timeout() -> u8 {
    5
}

impl Default for BreakdownParams {
    fn default() -> Self {
        Self {
            smoke_tick_mask: default_smoke_tick_mask(),
            smoke_height: default_smoke_height(),
            sound_height: default_sound_height(),
            sound_first: default_sound_first(),
            sound_count: default_sound_count(),
            breakdown_timeout: default_breakdown_timeout(),
        }
    }
}

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// When set, pending breakdowns never mature into active ones.
    #[serde(default)]
    pub breakdowns_disabled: bool,
    /// Number of slots in the shared particle/effect entity pool.
    #[serde(default = "default_entity_capacity")]
    pub entity_capacity: usize,
    /// Map extent along both planar axes, in world units.
    #[serde(default = "default_map_extent")]
    pub map_extent: i16,
    #[serde(default)]
    pub breakdown: BreakdownParams,
}

fn default_entity_capacity() -> usize {
    1000
}
fn default_map_extent() -> i16 {
    // 384 tiles of 32 units.
    12_288
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            breakdowns_disabled: false,
            entity_capacity: default_entity_capacity(),
            map_extent: default_map_extent(),
            breakdown: BreakdownParams::default(),
        }
    }
}

impl SimConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }
}
