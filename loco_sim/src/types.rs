// Core types shared across the simulation.
//
// Map positions (`WorldPos`), compact integer ids for entities, trains,
// catalog objects and sounds, and the 16.16 fixed-point speed used by the
// drive units. All types derive `Serialize`/`Deserialize` so trains and the
// entity pool persist without custom glue.
//
// Ids are plain integers rather than UUIDs: entities live in a fixed-capacity
// pool and trains are keyed by a small number handed out by the caller, so
// the ids double as stable slot indices.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A position on the map in world units.
///
/// - X, Y: planar axes (32 units per tile)
/// - Z: height, positive is up
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl WorldPos {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Per-axis integer average of two positions.
    ///
    /// The sum is taken in `i32` so it cannot overflow, and the division
    /// truncates toward zero: `midpoint((0,0,0), (-3,0,0))` is `(-1,0,0)`.
    pub fn midpoint(a: Self, b: Self) -> Self {
        Self {
            x: ((a.x as i32 + b.x as i32) / 2) as i16,
            y: ((a.y as i32 + b.y as i32) / 2) as i16,
            z: ((a.z as i32 + b.z as i32) / 2) as i16,
        }
    }

    /// The same position raised by `dz` world units.
    pub fn offset_z(self, dz: i16) -> Self {
        Self {
            z: self.z.wrapping_add(dz),
            ..self
        }
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Compact ids
// ---------------------------------------------------------------------------

macro_rules! compact_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

compact_id!(/// Slot index of an entity in the `EntityPool`.
EntityId(u16));
compact_id!(/// Identifier of one train (a head, its drive units, cars and tail).
TrainId(u16));
compact_id!(/// Index of a vehicle type definition in the `VehicleCatalog`.
ObjectId(u16));
compact_id!(/// Sound effect id, handed to the audio collaborator.
SoundId(u8));
compact_id!(/// Owning company of a vehicle or a money effect.
CompanyId(u8));

// ---------------------------------------------------------------------------
// Fixed-point speed
// ---------------------------------------------------------------------------

/// A speed in 16.16 fixed point (upper half is whole speed units).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Speed32(pub i32);

impl Speed32 {
    pub const ZERO: Self = Self(0);

    /// Build a speed from whole units.
    pub const fn from_whole(units: i16) -> Self {
        Self((units as i32) << 16)
    }

    /// Whole speed units (the fractional half is discarded).
    pub const fn whole(self) -> i32 {
        self.0 >> 16
    }
}
