// Vehicle type definitions, as consumed by the simulation.
//
// The engine never loads game asset files. Whatever loads them hands over a
// `VehicleCatalog`: a read-only map from `ObjectId` to `VehicleObject`. A
// car body keeps the id of its type plus an index into that type's
// `body_sprites`, and the orientation solver and animation step look both up
// every tick. The catalog is also serde-loadable from JSON, which is what the
// tests and the scenario runner use.
//
// A body pointing at an id or sprite that is not in the catalog means the
// train was built from inconsistent data; lookups report it as a `SimError`
// and the tick is abandoned.
//
// See also: `orientation.rs` (yaw accuracy, steep-sprite flag), `body.rs`
// (animation frames, visual effects).

use crate::error::SimError;
use crate::types::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Visual effect a vehicle type emits while running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum VisualEffectType {
    #[default]
    None = 0,
    SteamPuffs1 = 1,
    SteamPuffs2 = 2,
    SteamPuffs3 = 3,
    DieselExhaust1 = 4,
    ElectricSpark1 = 5,
    ElectricSpark2 = 6,
    DieselExhaust2 = 7,
    ShipWake = 8,
}

/// How finely a set of sprites resolves heading: 4, 8, 16, 32 or 64
/// directions per full turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum YawAccuracy {
    Directions4 = 0,
    #[default]
    Directions8 = 1,
    Directions16 = 2,
    Directions32 = 3,
    Directions64 = 4,
}

impl YawAccuracy {
    /// Distance between adjacent representable yaws, in 64ths of a turn.
    pub const fn step(self) -> u8 {
        16 >> (self as u8)
    }
}

/// One emitter slot (chimney, exhaust pipe, pantograph) of a vehicle type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationSlot {
    /// Steam/exhaust effect definition used for puffs from this slot.
    pub object_id: ObjectId,
    /// Emitter height biased by 0x80; 0 means the slot emits nothing.
    pub emitter_height: u8,
}

/// Sprite set of one body of a vehicle type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySprite {
    /// Animation frames (wheels, pistons); a power of two for cyclic
    /// animation.
    pub num_animation_frames: u8,
    /// Roll frames for tilting on curves. Exactly 1 means the body does not
    /// roll and animates cyclically instead.
    pub num_roll_frames: u8,
    /// Heading resolution of the level sprites.
    pub flat_yaw_accuracy: YawAccuracy,
    /// Heading resolution of the sloped sprites with even pitch codes.
    pub sloped_yaw_accuracy: YawAccuracy,
    /// Has extra sprites for steep grades; selects the special classifier.
    pub has_steep_sprites: bool,
    /// Animation frame follows speed rather than distance.
    pub has_speed_animation: bool,
}

impl Default for BodySprite {
    fn default() -> Self {
        Self {
            num_animation_frames: 1,
            num_roll_frames: 1,
            flat_yaw_accuracy: YawAccuracy::Directions32,
            sloped_yaw_accuracy: YawAccuracy::Directions16,
            has_steep_sprites: false,
            has_speed_animation: false,
        }
    }
}

/// Definition of one vehicle type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleObject {
    pub name: String,
    /// Design speed in whole speed units.
    pub top_speed: u16,
    #[serde(default)]
    pub visual_effect: VisualEffectType,
    #[serde(default)]
    pub animations: Vec<AnimationSlot>,
    pub body_sprites: Vec<BodySprite>,
}

/// Read-only lookup of vehicle types by id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCatalog {
    objects: BTreeMap<ObjectId, VehicleObject>,
}

impl VehicleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from a JSON object keyed by object id.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add or replace a vehicle type.
    pub fn insert(&mut self, id: ObjectId, object: VehicleObject) {
        self.objects.insert(id, object);
    }

    pub fn get(&self, id: ObjectId) -> Option<&VehicleObject> {
        self.objects.get(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The vehicle type `id`, or an error if it is missing.
    pub fn object(&self, id: ObjectId) -> Result<&VehicleObject, SimError> {
        self.get(id).ok_or(SimError::UnknownVehicleObject(id))
    }

    /// The vehicle type `id` together with its body sprite `sprite`.
    pub fn body_sprite(&self, id: ObjectId, sprite: u8) -> Result<(&VehicleObject, &BodySprite), SimError> {
        let object = self.object(id)?;
        let body = object
            .body_sprites
            .get(sprite as usize)
            .ok_or(SimError::UnknownBodySprite { object: id, sprite })?;
        Ok((object, body))
    }
}
