// Orientation solver for car bodies.
//
// Each tick a car body is placed half way between its two bogies and its
// sprite pitch and yaw are derived from the bogies' relative offset. The
// whole computation is integer arithmetic over the tables in `tables.rs`:
//
// 1. Position = per-axis midpoint of the front and back bogie.
// 2. A body without a sprite stops here.
// 3. `dx, dy` = planar offset front minus back; the planar magnitude is
//    `fast_square_root(dx² + dy²)`.
// 4. Pitch: `dz` = front height minus back height, classified against the
//    magnitude by the standard or (for sprites with steep variants) the
//    special classifier, then remapped through `PITCH_REMAP`.
// 5. Yaw: odd pitch codes always resolve 8 directions; even ones use the
//    sprite's flat or sloped yaw accuracy.
//
// Sprite invalidation around the reposition is the caller's job (`body.rs`),
// since only the caller knows whether the bogies moved this tick.
//
// **Critical constraint: determinism.** Thresholds, table values, truncating
// division and the classifier quirks (the collapse of raw index 5, the strict
// `>` at 10064 in the special classifier) are all observable in sprite
// selection and must not be "tidied".

use crate::catalog::{VehicleCatalog, YawAccuracy};
use crate::error::SimError;
use crate::tables::{PITCH_REMAP, YAW_TANGENTS, fast_square_root};
use crate::types::WorldPos;
use crate::vehicle::{Body, Bogie};

/// Result of one reposition, mostly useful to tests and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Orientation {
    /// Planar distance between the bogies as produced by `fast_square_root`.
    pub magnitude: u32,
    pub pitch: u8,
    pub yaw: u8,
}

/// Height-over-distance ratio in 16.16 fixed point, or -1 when the bogies
/// share a planar position.
fn grade_ratio(magnitude: u32, dz: i32) -> i64 {
    if magnitude == 0 {
        return -1;
    }
    ((dz.unsigned_abs() as i64) << 16) / magnitude as i64
}

/// Standard pitch classifier: two grades per direction.
pub fn pitch_standard(magnitude: u32, dz: i32) -> u8 {
    let mut index = if dz < 0 { 5 } else { 0 };
    let ratio = grade_ratio(magnitude, dz);
    if ratio >= 3331 {
        index += 1;
        if ratio >= 9000 {
            index += 1;
        }
    }
    PITCH_REMAP[index]
}

/// Classifier for sprites that have steep variants: four grades per
/// direction.
pub fn pitch_special(magnitude: u32, dz: i32) -> u8 {
    let mut index = if dz < 0 { 5 } else { 0 };
    let ratio = grade_ratio(magnitude, dz);
    if ratio > 10064 {
        index += 2;
        if ratio >= 20500 {
            index += 1;
        }
        if ratio >= 22000 {
            index += 1;
        }
    } else if ratio >= 3331 {
        index += 1;
    }
    PITCH_REMAP[index]
}

/// Quantise the heading of `(dx, dy)` to the directions of `accuracy`.
///
/// The yaw is in 64ths of a turn: 0 points along +x, 16 along +y, 32 along
/// -x and 48 along -y. A zero vector faces 0.
pub fn yaw_from_vector(accuracy: YawAccuracy, dx: i32, dy: i32) -> u8 {
    let run = dx.unsigned_abs() as u64;
    let rise = dy.unsigned_abs() as u64;
    let ratio = match (run, rise) {
        (0, 0) => 0,
        (0, _) => u64::MAX,
        _ => (rise << 16) / run,
    };

    // Boundaries between representable yaws sit at odd multiples of half a
    // step; YAW_TANGENTS is indexed in half-64ths.
    let step = accuracy.step();
    let mut quadrant_yaw = 0u8;
    let mut boundary = step;
    while boundary < 32 && ratio >= YAW_TANGENTS[boundary as usize - 1] as u64 {
        quadrant_yaw += step;
        boundary += 2 * step;
    }

    let yaw = match (dx >= 0, dy >= 0) {
        (true, true) => quadrant_yaw,
        (false, true) => 32 - quadrant_yaw,
        (false, false) => 32 + quadrant_yaw,
        (true, false) => 64 - quadrant_yaw,
    };
    yaw & 63
}

/// Move `body` between its bogies and recompute its sprite pitch and yaw.
///
/// Returns `Ok(None)` when the body has no sprite (only the position is
/// updated). Fails when the body references a vehicle type or sprite the
/// catalog does not have.
pub fn reposition(
    body: &mut Body,
    back: &Bogie,
    front: &Bogie,
    catalog: &VehicleCatalog,
) -> Result<Option<Orientation>, SimError> {
    body.position = WorldPos::midpoint(front.position, back.position);
    let Some(sprite_index) = body.body_sprite else {
        return Ok(None);
    };

    let dx = front.position.x as i32 - back.position.x as i32;
    let dy = front.position.y as i32 - back.position.y as i32;
    let dist_sq = (dx as i64 * dx as i64 + dy as i64 * dy as i64).min(u32::MAX as i64) as u32;
    let magnitude = fast_square_root(dist_sq);

    let (_, sprite) = catalog.body_sprite(body.object_id, sprite_index)?;
    let dz = front.position.z as i32 - back.position.z as i32;
    let pitch = if sprite.has_steep_sprites {
        pitch_special(magnitude, dz)
    } else {
        pitch_standard(magnitude, dz)
    };

    let accuracy = if pitch & 1 == 1 {
        YawAccuracy::Directions8
    } else if pitch == 0 {
        sprite.flat_yaw_accuracy
    } else {
        sprite.sloped_yaw_accuracy
    };
    let yaw = yaw_from_vector(accuracy, dx, dy);

    body.sprite_pitch = pitch;
    body.sprite_yaw = yaw;
    Ok(Some(Orientation {
        magnitude,
        pitch,
        yaw,
    }))
}
