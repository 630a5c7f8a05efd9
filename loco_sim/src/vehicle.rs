// Train model.
//
// A train is stored as an explicit structure rather than a linked list of
// untyped segments:
//
//   Train
//   ├── head: VehicleHead          drive state (Travelling, BrokenDown, ...)
//   ├── vehicle_1: Vehicle1        first drive unit
//   ├── vehicle_2: Vehicle2        second drive unit, owns the current speed
//   ├── cars: Vec<Car>             logical cars, front to back
//   │     └── components           1..n physical sections per car
//   │           ├── front: Bogie
//   │           ├── back: Bogie
//   │           └── body: Body
//   └── tail: Tail                 sentinel
//
// Breakdown state belongs to the logical car; a multi-section car (an
// articulated unit) breaks down as a whole and only its first body emits
// smoke. The traversal in `update.rs` walks this structure in the fixed
// chain order head, vehicle 1, vehicle 2, then front bogie, back bogie and
// body of every component, then the tail. Because of that order a body is
// always updated after both of its bogies have moved for the tick.
//
// The flat form survives as `Segment`: `Train::from_segments()` parses a
// chain of segments (as produced by a loader or a save converter) and
// rejects anything that does not describe a well-formed train;
// `Train::into_segments()` is the inverse. `VehicleKind` values match the
// segment type codes 0 through 6.
//
// See also: `update.rs` (traversal), `body.rs` (body update), `breakdown.rs`.

use crate::error::SimError;
use crate::types::{ObjectId, Speed32, TrainId, WorldPos};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ---------------------------------------------------------------------------
// Kinds and states
// ---------------------------------------------------------------------------

/// Kind of a segment in the train chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VehicleKind {
    Head = 0,
    Vehicle1 = 1,
    Vehicle2 = 2,
    Bogie = 3,
    BodyStart = 4,
    BodyContinued = 5,
    Tail = 6,
}

/// Drive state of a train, held by its head.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DriveStatus {
    #[default]
    Unk0 = 0,
    Stopped = 1,
    Travelling = 2,
    WaitingAtSignal = 3,
    Approaching = 4,
    Unloading = 5,
    Loading = 6,
    BrokenDown = 7,
    Crashed = 8,
    Stuck = 9,
}

impl DriveStatus {
    /// States in which breakdowns neither smoke nor start.
    pub fn is_breakdown_inactive(self) -> bool {
        matches!(
            self,
            DriveStatus::Unk0
                | DriveStatus::Stopped
                | DriveStatus::WaitingAtSignal
                | DriveStatus::Unloading
                | DriveStatus::Loading
                | DriveStatus::Crashed
                | DriveStatus::Stuck
        )
    }

    /// States in which no car emits steam, exhaust or sparks.
    pub fn suppresses_effects(self) -> bool {
        matches!(self, DriveStatus::Crashed | DriveStatus::Stuck)
    }
}

/// Whether a body is disappearing into or emerging from a facility (a
/// tunnel mouth, a depot). Such bodies are positioned by the facility logic
/// and only emit visual effects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacilityTransit {
    #[default]
    None,
    Entering,
    Exiting,
}

impl FacilityTransit {
    pub fn in_transit(self) -> bool {
        self != FacilityTransit::None
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownFlags {
    /// A breakdown has been scheduled and starts on the next eligible tick.
    pub pending: bool,
    pub broken_down: bool,
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleHead {
    pub position: WorldPos,
    pub status: DriveStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle1 {
    pub position: WorldPos,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle2 {
    pub position: WorldPos,
    pub current_speed: Speed32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tail {
    pub position: WorldPos,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bogie {
    pub position: WorldPos,
    /// Sideways lean of the track under the bogie: negative leans one way,
    /// positive the other. Read by bodies with roll sprites.
    pub track_lean: i8,
}

/// A car body: the visible sprite of one car section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub position: WorldPos,
    pub object_id: ObjectId,
    /// Index into the vehicle type's `body_sprites`; `None` is invisible.
    pub body_sprite: Option<u8>,
    /// Index into the vehicle type's `animations` (emitter slots).
    pub animation_index: u8,
    pub sprite_pitch: u8,
    pub sprite_yaw: u8,
    /// Distance-driven animation phase.
    pub animation_position: u16,
    pub animation_frame: u8,
    /// Speed deviation in 64ths; 0 means the body runs at nominal speed.
    pub speed_wobble: u8,
    pub reversed: bool,
    /// Set on bodies that never emit effects, whatever their type says.
    pub effects_disabled: bool,
    pub transit: FacilityTransit,
}

impl Body {
    pub fn new(object_id: ObjectId, body_sprite: Option<u8>) -> Self {
        Self {
            object_id,
            body_sprite,
            ..Default::default()
        }
    }
}

/// One physical section of a car.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarComponent {
    pub front: Bogie,
    pub back: Bogie,
    pub body: Body,
}

impl CarComponent {
    pub fn new(body: Body) -> Self {
        Self {
            body,
            ..Default::default()
        }
    }
}

/// One logical car: breakdown state plus at least one component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub breakdown: BreakdownFlags,
    /// Counts down once a breakdown has started.
    pub breakdown_timeout: u8,
    components: SmallVec<[CarComponent; 2]>,
}

impl Car {
    pub fn new(first: CarComponent) -> Self {
        let mut components = SmallVec::new();
        components.push(first);
        Self {
            breakdown: BreakdownFlags::default(),
            breakdown_timeout: 0,
            components,
        }
    }

    /// Append an articulated section behind the existing ones.
    pub fn push_component(&mut self, component: CarComponent) {
        self.components.push(component);
    }

    pub fn components(&self) -> &[CarComponent] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [CarComponent] {
        &mut self.components
    }

    /// The body of the leading section. Smoke and breakdown sounds are
    /// placed relative to it.
    pub fn first_body(&self) -> Option<&Body> {
        self.components.first().map(|c| &c.body)
    }
}

/// A segment of the flat chain form of a train.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    Head(VehicleHead),
    Vehicle1(Vehicle1),
    Vehicle2(Vehicle2),
    Bogie(Bogie),
    /// First body of a car; carries the car's breakdown state.
    BodyStart {
        body: Body,
        breakdown: BreakdownFlags,
        breakdown_timeout: u8,
    },
    BodyContinued(Body),
    Tail(Tail),
}

impl Segment {
    pub fn kind(&self) -> VehicleKind {
        match self {
            Segment::Head(_) => VehicleKind::Head,
            Segment::Vehicle1(_) => VehicleKind::Vehicle1,
            Segment::Vehicle2(_) => VehicleKind::Vehicle2,
            Segment::Bogie(_) => VehicleKind::Bogie,
            Segment::BodyStart { .. } => VehicleKind::BodyStart,
            Segment::BodyContinued(_) => VehicleKind::BodyContinued,
            Segment::Tail(_) => VehicleKind::Tail,
        }
    }
}

// ---------------------------------------------------------------------------
// Train
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Train {
    pub id: TrainId,
    pub head: VehicleHead,
    pub vehicle_1: Vehicle1,
    pub vehicle_2: Vehicle2,
    pub cars: Vec<Car>,
    pub tail: Tail,
}

fn malformed(index: usize, reason: &'static str) -> SimError {
    SimError::MalformedChain { index, reason }
}

impl Train {
    /// A train with drive units and a tail but no cars yet.
    pub fn new(id: TrainId, head: VehicleHead, vehicle_1: Vehicle1, vehicle_2: Vehicle2) -> Self {
        Self {
            id,
            head,
            vehicle_1,
            vehicle_2,
            cars: Vec::new(),
            tail: Tail::default(),
        }
    }

    pub fn push_car(&mut self, car: Car) {
        self.cars.push(car);
    }

    /// Parse the flat chain form. The chain must be head, vehicle 1,
    /// vehicle 2, then bogie/bogie/body triples, then exactly one tail.
    pub fn from_segments(id: TrainId, segments: impl IntoIterator<Item = Segment>) -> Result<Self, SimError> {
        let segments: Vec<Segment> = segments.into_iter().collect();
        let len = segments.len();
        let mut iter = segments.into_iter().enumerate();

        let head = match iter.next() {
            Some((_, Segment::Head(head))) => head,
            _ => return Err(malformed(0, "chain must start with a head")),
        };
        let vehicle_1 = match iter.next() {
            Some((_, Segment::Vehicle1(v))) => v,
            _ => return Err(malformed(1, "head must be followed by vehicle 1")),
        };
        let vehicle_2 = match iter.next() {
            Some((_, Segment::Vehicle2(v))) => v,
            _ => return Err(malformed(2, "vehicle 1 must be followed by vehicle 2")),
        };

        let mut train = Train::new(id, head, vehicle_1, vehicle_2);
        loop {
            let front = match iter.next() {
                Some((_, Segment::Tail(tail))) => {
                    if let Some((index, _)) = iter.next() {
                        return Err(malformed(index, "segments after the tail"));
                    }
                    train.tail = tail;
                    return Ok(train);
                }
                Some((_, Segment::Bogie(bogie))) => bogie,
                Some((index, _)) => return Err(malformed(index, "expected a front bogie or the tail")),
                None => return Err(malformed(len, "chain has no tail")),
            };
            let back = match iter.next() {
                Some((_, Segment::Bogie(bogie))) => bogie,
                Some((index, _)) => return Err(malformed(index, "front bogie without a back bogie")),
                None => return Err(malformed(len, "chain has no tail")),
            };
            match iter.next() {
                Some((
                    _,
                    Segment::BodyStart {
                        body,
                        breakdown,
                        breakdown_timeout,
                    },
                )) => {
                    let mut car = Car::new(CarComponent { front, back, body });
                    car.breakdown = breakdown;
                    car.breakdown_timeout = breakdown_timeout;
                    train.cars.push(car);
                }
                Some((index, Segment::BodyContinued(body))) => match train.cars.last_mut() {
                    Some(car) => car.push_component(CarComponent { front, back, body }),
                    None => return Err(malformed(index, "continued body before any car")),
                },
                Some((index, _)) => return Err(malformed(index, "bogie pair without a body")),
                None => return Err(malformed(len, "chain has no tail")),
            }
        }
    }

    /// The flat chain form, in traversal order.
    pub fn into_segments(self) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(self.segment_count());
        segments.push(Segment::Head(self.head));
        segments.push(Segment::Vehicle1(self.vehicle_1));
        segments.push(Segment::Vehicle2(self.vehicle_2));
        for car in self.cars {
            let Car {
                breakdown,
                breakdown_timeout,
                components,
            } = car;
            for (i, component) in components.into_iter().enumerate() {
                segments.push(Segment::Bogie(component.front));
                segments.push(Segment::Bogie(component.back));
                segments.push(if i == 0 {
                    Segment::BodyStart {
                        body: component.body,
                        breakdown,
                        breakdown_timeout,
                    }
                } else {
                    Segment::BodyContinued(component.body)
                });
            }
        }
        segments.push(Segment::Tail(self.tail));
        segments
    }

    /// Segment kinds in traversal order.
    pub fn chain_kinds(&self) -> impl Iterator<Item = VehicleKind> + '_ {
        let cars = self.cars.iter().flat_map(|car| {
            (0..car.components.len()).flat_map(|i| {
                let body = if i == 0 {
                    VehicleKind::BodyStart
                } else {
                    VehicleKind::BodyContinued
                };
                [VehicleKind::Bogie, VehicleKind::Bogie, body]
            })
        });
        [VehicleKind::Head, VehicleKind::Vehicle1, VehicleKind::Vehicle2]
            .into_iter()
            .chain(cars)
            .chain(std::iter::once(VehicleKind::Tail))
    }

    /// Number of segments in the chain, tail included.
    pub fn segment_count(&self) -> usize {
        let components: usize = self.cars.iter().map(|c| c.components.len()).sum();
        4 + 3 * components
    }

    /// Check invariants that deserialisation cannot enforce: every car has
    /// at least one component.
    pub fn validate(&self) -> Result<(), SimError> {
        let mut index = 3;
        for car in &self.cars {
            if car.components.is_empty() {
                return Err(malformed(index, "car without components"));
            }
            index += 3 * car.components.len();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(object: u16) -> Body {
        Body::new(ObjectId(object), Some(0))
    }

    fn sample_train() -> Train {
        let mut train = Train::new(
            TrainId(3),
            VehicleHead {
                status: DriveStatus::Travelling,
                ..Default::default()
            },
            Vehicle1::default(),
            Vehicle2::default(),
        );
        train.push_car(Car::new(CarComponent::new(body(1))));
        let mut articulated = Car::new(CarComponent::new(body(2)));
        articulated.push_component(CarComponent::new(body(2)));
        articulated.breakdown.pending = true;
        train.push_car(articulated);
        train
    }

    fn flat_prefix() -> Vec<Segment> {
        vec![
            Segment::Head(VehicleHead::default()),
            Segment::Vehicle1(Vehicle1::default()),
            Segment::Vehicle2(Vehicle2::default()),
        ]
    }

    fn reason(err: SimError) -> (usize, &'static str) {
        match err {
            SimError::MalformedChain { index, reason } => (index, reason),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn chain_kinds_follow_traversal_order() {
        use VehicleKind::*;
        let train = sample_train();
        let kinds: Vec<_> = train.chain_kinds().collect();
        assert_eq!(
            kinds,
            vec![
                Head, Vehicle1, Vehicle2, Bogie, Bogie, BodyStart, Bogie, Bogie, BodyStart, Bogie, Bogie,
                BodyContinued, Tail
            ]
        );
        assert_eq!(train.segment_count(), kinds.len());
    }

    #[test]
    fn segments_round_trip() {
        let train = sample_train();
        let segments = train.clone().into_segments();
        assert_eq!(segments.len(), 13);
        assert_eq!(segments[8].kind(), VehicleKind::BodyStart);
        let parsed = Train::from_segments(TrainId(3), segments).unwrap();
        assert_eq!(parsed, train);
        assert!(parsed.cars[1].breakdown.pending);
        assert_eq!(parsed.cars[1].components().len(), 2);
    }

    #[test]
    fn empty_train_is_drive_units_and_tail() {
        let mut segments = flat_prefix();
        segments.push(Segment::Tail(Tail::default()));
        let train = Train::from_segments(TrainId(0), segments).unwrap();
        assert!(train.cars.is_empty());
        assert_eq!(train.segment_count(), 4);
    }

    #[test]
    fn rejects_missing_head() {
        let err = Train::from_segments(TrainId(0), vec![Segment::Tail(Tail::default())]).unwrap_err();
        assert_eq!(reason(err).0, 0);
    }

    #[test]
    fn rejects_missing_tail() {
        let mut segments = flat_prefix();
        segments.push(Segment::Bogie(Bogie::default()));
        segments.push(Segment::Bogie(Bogie::default()));
        segments.push(Segment::BodyStart {
            body: body(1),
            breakdown: BreakdownFlags::default(),
            breakdown_timeout: 0,
        });
        let err = Train::from_segments(TrainId(0), segments).unwrap_err();
        assert_eq!(reason(err), (6, "chain has no tail"));
    }

    #[test]
    fn rejects_body_without_bogies() {
        let mut segments = flat_prefix();
        segments.push(Segment::Bogie(Bogie::default()));
        segments.push(Segment::BodyContinued(body(1)));
        let err = Train::from_segments(TrainId(0), segments).unwrap_err();
        assert_eq!(reason(err), (4, "front bogie without a back bogie"));
    }

    #[test]
    fn rejects_continued_body_before_any_car() {
        let mut segments = flat_prefix();
        segments.push(Segment::Bogie(Bogie::default()));
        segments.push(Segment::Bogie(Bogie::default()));
        segments.push(Segment::BodyContinued(body(1)));
        segments.push(Segment::Tail(Tail::default()));
        let err = Train::from_segments(TrainId(0), segments).unwrap_err();
        assert_eq!(reason(err), (5, "continued body before any car"));
    }

    #[test]
    fn rejects_segments_after_tail() {
        let mut segments = flat_prefix();
        segments.push(Segment::Tail(Tail::default()));
        segments.push(Segment::Bogie(Bogie::default()));
        let err = Train::from_segments(TrainId(0), segments).unwrap_err();
        assert_eq!(reason(err), (4, "segments after the tail"));
    }

    #[test]
    fn validate_catches_empty_car_from_save_data() {
        let mut json = serde_json::to_value(sample_train()).unwrap();
        json["cars"][1]["components"] = serde_json::json!([]);
        let train: Train = serde_json::from_value(json).unwrap();
        assert_eq!(reason(train.validate().unwrap_err()), (6, "car without components"));
        assert!(sample_train().validate().is_ok());
    }

    #[test]
    fn breakdown_inactive_statuses() {
        let inactive: Vec<u8> = [
            DriveStatus::Unk0,
            DriveStatus::Stopped,
            DriveStatus::Travelling,
            DriveStatus::WaitingAtSignal,
            DriveStatus::Approaching,
            DriveStatus::Unloading,
            DriveStatus::Loading,
            DriveStatus::BrokenDown,
            DriveStatus::Crashed,
            DriveStatus::Stuck,
        ]
        .into_iter()
        .filter(|s| s.is_breakdown_inactive())
        .map(|s| s as u8)
        .collect();
        assert_eq!(inactive, vec![0, 1, 3, 5, 6, 8, 9]);
        assert!(DriveStatus::Crashed.suppresses_effects());
        assert!(!DriveStatus::BrokenDown.suppresses_effects());
    }
}
