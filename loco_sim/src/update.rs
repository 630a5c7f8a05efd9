// Per-train traversal and update dispatch.
//
// `update_head()` walks one train's segments in chain order and runs the
// update step for each segment's kind:
//
//   Head      breakdown simulator, then `TrainHooks::update_head`
//   Vehicle1  `TrainHooks::update_vehicle_1`
//   Vehicle2  `TrainHooks::update_vehicle_2`
//   Bogie     `TrainHooks::update_bogie`
//   Body      `body::update_body` (BodyStart and BodyContinued alike)
//   Tail      `TrainHooks::update_tail`
//
// Every step returns a "stop" flag; the walk halts on the first `true` or
// after the tail. Drive-unit, bogie and tail physics (track following,
// acceleration, signals) live outside this crate and are plugged in through
// `TrainHooks`, which also places bodies inside facilities and receives
// visual-effect emissions and the broken-down side effects.
//
// State shared across the steps of one train travels in `TickContext`, an
// explicit `Copy` value threaded through the walk by `&mut`. Drive-unit hooks
// publish the tick's travelled distance and the "bogies moved" flag there;
// the head and vehicle 2 steps refresh the status and speed copies after
// their hook runs. A body step only ever reads the context and derives its
// own car-scoped copy (see `TickContext::with_speed_wobble`), so nothing a
// body does leaks into the next car.
//
// Shared resources (catalog, config, RNG, entity pool, event sink, hooks) are
// bundled in `UpdateEnv` and borrowed for the duration of one train.
//
// See also: `vehicle.rs` (chain order), `body.rs`, `breakdown.rs`, `sim.rs`.

use crate::body;
use crate::breakdown;
use crate::catalog::{VehicleCatalog, VisualEffectType};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::event::{SimEvent, SimEventKind};
use crate::pool::EntityPool;
use crate::types::{ObjectId, Speed32, TrainId};
use crate::vehicle::{
    Body, Bogie, Car, CarComponent, DriveStatus, Tail, Train, Vehicle1, Vehicle2, VehicleHead, VehicleKind,
};
use loco_prng::GameRng;

// ---------------------------------------------------------------------------
// Tick context
// ---------------------------------------------------------------------------

/// Per-train state shared by the update steps of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickContext {
    pub tick: u64,
    pub train: TrainId,
    /// Non-interactive preview: breakdowns never start.
    pub title_mode: bool,
    pub head_status: DriveStatus,
    pub vehicle_2_speed: Speed32,
    /// Distance the train moved this tick, in animation units.
    pub distance_travelled: i32,
    /// Whether the bogies moved this tick, so bodies must be repositioned.
    pub bogies_moved: bool,
}

impl TickContext {
    /// Context at the start of `train`'s update.
    pub fn new(tick: u64, train: &Train, title_mode: bool) -> Self {
        Self {
            tick,
            train: train.id,
            title_mode,
            head_status: train.head.status,
            vehicle_2_speed: train.vehicle_2.current_speed,
            distance_travelled: 0,
            bogies_moved: false,
        }
    }

    /// Car-scoped copy with a body's speed wobble folded into the distance.
    ///
    /// The wobble is a position on a 64-step cycle; its triangular weight
    /// `min(w, 64 - w)` scales the extra distance. Zero leaves the context
    /// unchanged.
    pub fn with_speed_wobble(self, wobble: u8) -> Self {
        if wobble == 0 {
            return self;
        }
        let weight = if wobble > 32 { 64 - wobble as i32 } else { wobble as i32 };
        Self {
            distance_travelled: self.distance_travelled.wrapping_add(weight * 320 + 500),
            ..self
        }
    }
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// A visual effect a body wants emitted this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectEmission {
    pub effect: VisualEffectType,
    /// Steam/exhaust definition of the emitting slot.
    pub steam_object: ObjectId,
    /// Emitter height relative to the body.
    pub emitter_offset: i16,
}

/// Behaviour supplied from outside the engine. Every method has a no-op
/// default; the drive-unit, bogie and tail methods return `true` to stop
/// the rest of the train from updating this tick.
pub trait TrainHooks {
    fn update_head(&mut self, _head: &mut VehicleHead, _ctx: &mut TickContext) -> bool {
        false
    }

    fn update_vehicle_1(&mut self, _vehicle: &mut Vehicle1, _ctx: &mut TickContext) -> bool {
        false
    }

    fn update_vehicle_2(&mut self, _vehicle: &mut Vehicle2, _ctx: &mut TickContext) -> bool {
        false
    }

    fn update_bogie(&mut self, _bogie: &mut Bogie, _ctx: &mut TickContext) -> bool {
        false
    }

    fn update_tail(&mut self, _tail: &mut Tail, _ctx: &mut TickContext) -> bool {
        false
    }

    /// Place a body whose train is entering or exiting a facility. Such
    /// bodies skip the bogie midpoint reposition and animation; the facility
    /// logic positions them instead.
    fn reposition_in_facility(&mut self, _body: &mut Body, _front: &Bogie, _back: &Bogie, _ctx: &TickContext) {}

    /// Spawn whatever particles `emission` calls for. Called for every body
    /// that is allowed to emit, including `VisualEffectType::None`.
    fn emit_visual_effect(
        &mut self,
        _emission: &EffectEmission,
        _body: &Body,
        _ctx: &TickContext,
        _entities: &mut EntityPool,
    ) {
    }

    /// Called once when a car's pending breakdown becomes active.
    fn apply_breakdown_effects(&mut self, _head: &mut VehicleHead, _car: &mut Car) {}
}

/// Hooks that do nothing and never stop traversal.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl TrainHooks for NoopHooks {}

/// Shared resources borrowed for one train's update.
pub struct UpdateEnv<'a> {
    pub catalog: &'a VehicleCatalog,
    pub config: &'a SimConfig,
    pub rng: &'a mut GameRng,
    pub entities: &'a mut EntityPool,
    pub events: &'a mut Vec<SimEvent>,
    pub hooks: &'a mut dyn TrainHooks,
}

impl UpdateEnv<'_> {
    pub fn emit(&mut self, tick: u64, kind: SimEventKind) {
        self.events.push(SimEvent { tick, kind });
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Update routine selected by a segment kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateStep {
    Head,
    Vehicle1,
    Vehicle2,
    Bogie,
    Body,
    Tail,
}

impl VehicleKind {
    pub const fn update_step(self) -> UpdateStep {
        match self {
            VehicleKind::Head => UpdateStep::Head,
            VehicleKind::Vehicle1 => UpdateStep::Vehicle1,
            VehicleKind::Vehicle2 => UpdateStep::Vehicle2,
            VehicleKind::Bogie => UpdateStep::Bogie,
            VehicleKind::BodyStart | VehicleKind::BodyContinued => UpdateStep::Body,
            VehicleKind::Tail => UpdateStep::Tail,
        }
    }
}

/// Mutable view of one segment together with what its step may read.
pub enum SegmentMut<'t> {
    /// The head also sees the cars, for the breakdown scan.
    Head {
        head: &'t mut VehicleHead,
        cars: &'t mut [Car],
    },
    Vehicle1(&'t mut Vehicle1),
    Vehicle2(&'t mut Vehicle2),
    Bogie(&'t mut Bogie),
    Body {
        kind: VehicleKind,
        body: &'t mut Body,
        front: &'t Bogie,
        back: &'t Bogie,
    },
    Tail(&'t mut Tail),
}

impl SegmentMut<'_> {
    pub fn kind(&self) -> VehicleKind {
        match self {
            SegmentMut::Head { .. } => VehicleKind::Head,
            SegmentMut::Vehicle1(_) => VehicleKind::Vehicle1,
            SegmentMut::Vehicle2(_) => VehicleKind::Vehicle2,
            SegmentMut::Bogie(_) => VehicleKind::Bogie,
            SegmentMut::Body { kind, .. } => *kind,
            SegmentMut::Tail(_) => VehicleKind::Tail,
        }
    }
}

/// Run the update step of one segment. Returns the stop flag.
pub fn dispatch(segment: SegmentMut<'_>, ctx: &mut TickContext, env: &mut UpdateEnv<'_>) -> Result<bool, SimError> {
    match segment {
        SegmentMut::Head { head, cars } => {
            breakdown::update_breakdowns(head, cars, ctx, env);
            let stop = env.hooks.update_head(head, ctx);
            ctx.head_status = head.status;
            Ok(stop)
        }
        SegmentMut::Vehicle1(vehicle) => Ok(env.hooks.update_vehicle_1(vehicle, ctx)),
        SegmentMut::Vehicle2(vehicle) => {
            let stop = env.hooks.update_vehicle_2(vehicle, ctx);
            ctx.vehicle_2_speed = vehicle.current_speed;
            Ok(stop)
        }
        SegmentMut::Bogie(bogie) => Ok(env.hooks.update_bogie(bogie, ctx)),
        SegmentMut::Body { body, front, back, .. } => body::update_body(body, front, back, ctx, env),
        SegmentMut::Tail(tail) => Ok(env.hooks.update_tail(tail, ctx)),
    }
}

/// How far a traversal got.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraversalOutcome {
    /// Segments whose step ran, including the one that stopped.
    pub visited: usize,
    /// Kind of the segment that stopped the walk, if any did.
    pub stopped_by: Option<VehicleKind>,
}

/// Update every segment of `train` in chain order until a step stops the
/// walk or the tail has run.
pub fn update_head(
    train: &mut Train,
    ctx: &mut TickContext,
    env: &mut UpdateEnv<'_>,
) -> Result<TraversalOutcome, SimError> {
    let mut visited = 0;

    macro_rules! visit {
        ($segment:expr) => {{
            let segment = $segment;
            let kind = segment.kind();
            visited += 1;
            if dispatch(segment, ctx, env)? {
                return Ok(TraversalOutcome {
                    visited,
                    stopped_by: Some(kind),
                });
            }
        }};
    }

    let Train {
        head,
        vehicle_1,
        vehicle_2,
        cars,
        tail,
        ..
    } = train;

    visit!(SegmentMut::Head {
        head: &mut *head,
        cars: cars.as_mut_slice(),
    });
    visit!(SegmentMut::Vehicle1(&mut *vehicle_1));
    visit!(SegmentMut::Vehicle2(&mut *vehicle_2));

    for car in cars.iter_mut() {
        for (i, component) in car.components_mut().iter_mut().enumerate() {
            let CarComponent { front, back, body } = component;
            visit!(SegmentMut::Bogie(&mut *front));
            visit!(SegmentMut::Bogie(&mut *back));
            let kind = if i == 0 {
                VehicleKind::BodyStart
            } else {
                VehicleKind::BodyContinued
            };
            visit!(SegmentMut::Body {
                kind,
                body: &mut *body,
                front: &*front,
                back: &*back,
            });
        }
    }

    visit!(SegmentMut::Tail(&mut *tail));
    Ok(TraversalOutcome {
        visited,
        stopped_by: None,
    })
}
