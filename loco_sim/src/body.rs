// Car body update step.
//
// Runs for both body kinds (`BodyStart`, `BodyContinued`) once both bogies
// of the section have been updated for the tick:
//
// 1. A body entering or exiting a facility is placed by the facility logic
//    (`TrainHooks::reposition_in_facility`); it then only emits visual
//    effects and the step ends.
// 2. If the bogies moved, the old sprite region is invalidated, the
//    orientation solver repositions the body, and the new region is
//    invalidated.
// 3. The body's speed wobble is folded into a car-scoped copy of the tick
//    context. The caller's context is never modified.
// 4. Visual effects: suppressed for bodies with effects disabled and for
//    trains that are crashed or stuck. Otherwise the body's emitter slot
//    picks the effect and its height, and `TrainHooks::emit_visual_effect`
//    spawns the particles.
// 5. Animation: the animation position advances by an eighth of the
//    distance travelled, then the frame is chosen by speed, by track lean
//    (roll sprites) or cyclically by position. A frame change invalidates
//    the sprite.
//
// Bodies never stop traversal.
//
// See also: `orientation.rs`, `update.rs` (`TickContext`, hooks).

use crate::catalog::{AnimationSlot, VisualEffectType};
use crate::error::SimError;
use crate::event::SimEventKind;
use crate::orientation::reposition;
use crate::types::{ObjectId, Speed32};
use crate::update::{EffectEmission, TickContext, UpdateEnv};
use crate::vehicle::{Body, Bogie};

/// Vehicle 2 must be at least this fast for roll sprites to lean.
pub const ROLL_MIN_SPEED: Speed32 = Speed32(0x23_0000);

/// Emitter heights are stored with this bias.
const EMITTER_HEIGHT_BIAS: i16 = 0x80;

/// Update one body. Returns the stop flag, which is always `false`.
pub fn update_body(
    body: &mut Body,
    front: &Bogie,
    back: &Bogie,
    ctx: &TickContext,
    env: &mut UpdateEnv<'_>,
) -> Result<bool, SimError> {
    if body.transit.in_transit() {
        env.hooks.reposition_in_facility(body, front, back, ctx);
        emit_effects(body, ctx, env)?;
        return Ok(false);
    }

    if ctx.bogies_moved {
        invalidate(body, ctx, env);
        reposition(body, back, front, env.catalog)?;
        invalidate(body, ctx, env);
    }

    let car_ctx = ctx.with_speed_wobble(body.speed_wobble);
    emit_effects(body, &car_ctx, env)?;
    animate(body, front, &car_ctx, env)?;
    Ok(false)
}

fn invalidate(body: &Body, ctx: &TickContext, env: &mut UpdateEnv<'_>) {
    env.emit(
        ctx.tick,
        SimEventKind::SpriteInvalidated {
            train: ctx.train,
            position: body.position,
        },
    );
}

/// The emission a body's emitter slot calls for. A missing slot or a slot
/// with height 0 emits `VisualEffectType::None`.
pub fn select_emission(
    visual_effect: VisualEffectType,
    slot: Option<&AnimationSlot>,
) -> EffectEmission {
    match slot {
        Some(slot) if slot.emitter_height != 0 => EffectEmission {
            effect: visual_effect,
            steam_object: slot.object_id,
            emitter_offset: slot.emitter_height as i16 - EMITTER_HEIGHT_BIAS,
        },
        _ => EffectEmission {
            effect: VisualEffectType::None,
            steam_object: slot.map_or(ObjectId::default(), |s| s.object_id),
            emitter_offset: 0,
        },
    }
}

fn emit_effects(body: &Body, ctx: &TickContext, env: &mut UpdateEnv<'_>) -> Result<(), SimError> {
    if body.effects_disabled || ctx.head_status.suppresses_effects() {
        return Ok(());
    }
    let catalog = env.catalog;
    let object = catalog.object(body.object_id)?;
    let emission = select_emission(
        object.visual_effect,
        object.animations.get(body.animation_index as usize),
    );
    env.hooks.emit_visual_effect(&emission, body, ctx, env.entities);
    Ok(())
}

fn animate(body: &mut Body, front: &Bogie, ctx: &TickContext, env: &mut UpdateEnv<'_>) -> Result<(), SimError> {
    let mut advance = ctx.distance_travelled >> 3;
    if body.reversed {
        advance = advance.wrapping_neg();
    }
    body.animation_position = body.animation_position.wrapping_add(advance as u16);

    let Some(sprite_index) = body.body_sprite else {
        return Ok(());
    };
    let catalog = env.catalog;
    let (object, sprite) = catalog.body_sprite(body.object_id, sprite_index)?;

    let frame = if sprite.has_speed_animation {
        speed_frame(ctx.vehicle_2_speed, object.top_speed, sprite.num_animation_frames)
    } else if sprite.num_roll_frames != 1 {
        roll_frame(body.animation_frame, ctx.vehicle_2_speed, front.track_lean, body.reversed)
    } else {
        cyclic_frame(body.animation_position, sprite.num_animation_frames)
    };

    if frame != body.animation_frame {
        body.animation_frame = frame;
        invalidate(body, ctx, env);
    }
    Ok(())
}

/// Frame proportional to speed, saturating at `frames`. Types whose top
/// speed is below their frame count never animate.
pub fn speed_frame(speed: Speed32, top_speed: u16, frames: u8) -> u8 {
    match (top_speed as i32).checked_div(frames as i32) {
        Some(per_frame) if per_frame > 0 => (speed.whole() / per_frame).clamp(0, frames as i32) as u8,
        _ => 0,
    }
}

/// Roll frame: 0 upright, 1 and 2 the two lean directions (swapped when the
/// body runs reversed). A leaning body returns upright before it can lean
/// the other way.
pub fn roll_frame(current: u8, speed: Speed32, track_lean: i8, reversed: bool) -> u8 {
    if speed < ROLL_MIN_SPEED {
        return 0;
    }
    let target = match (track_lean.signum(), reversed) {
        (0, _) => return 0,
        (-1, false) | (1, true) => 1,
        _ => 2,
    };
    if current != 0 && current != target { 0 } else { target }
}

/// Frame cycling with the animation position; `frames` is a power of two.
pub fn cyclic_frame(animation_position: u16, frames: u8) -> u8 {
    (animation_position >> 12) as u8 & frames.wrapping_sub(1)
}
