// Shared fixtures for unit tests: a small catalog, a straight train and an
// owned set of the resources `UpdateEnv` borrows.

use crate::catalog::{AnimationSlot, BodySprite, VehicleCatalog, VehicleObject, VisualEffectType, YawAccuracy};
use crate::config::SimConfig;
use crate::event::SimEvent;
use crate::pool::EntityPool;
use crate::types::{ObjectId, TrainId, WorldPos};
use crate::update::{TrainHooks, UpdateEnv};
use crate::vehicle::{Body, Bogie, Car, CarComponent, DriveStatus, Train, Vehicle1, Vehicle2, VehicleHead};
use loco_prng::GameRng;

/// Steam engine: one cyclic sprite with four frames, chimney at 0x90.
pub const LOCOMOTIVE: ObjectId = ObjectId(1);
/// Plain wagon: single-frame sprite, no emitters.
pub const WAGON: ObjectId = ObjectId(2);

pub fn sample_catalog() -> VehicleCatalog {
    let mut catalog = VehicleCatalog::new();
    catalog.insert(
        LOCOMOTIVE,
        VehicleObject {
            name: "Tank engine".into(),
            top_speed: 80,
            visual_effect: VisualEffectType::SteamPuffs1,
            animations: vec![AnimationSlot {
                object_id: ObjectId(40),
                emitter_height: 0x90,
            }],
            body_sprites: vec![BodySprite {
                num_animation_frames: 4,
                flat_yaw_accuracy: YawAccuracy::Directions32,
                sloped_yaw_accuracy: YawAccuracy::Directions16,
                ..Default::default()
            }],
        },
    );
    catalog.insert(
        WAGON,
        VehicleObject {
            name: "Box wagon".into(),
            top_speed: 60,
            body_sprites: vec![BodySprite::default()],
            ..Default::default()
        },
    );
    catalog
}

/// A travelling train heading +x with `cars` single-section cars, 40 units
/// apart. The first car is a locomotive, the rest wagons.
pub fn sample_train(id: TrainId, cars: usize) -> Train {
    let mut train = Train::new(
        id,
        VehicleHead {
            position: WorldPos::new(1040, 512, 16),
            status: DriveStatus::Travelling,
        },
        Vehicle1 {
            position: WorldPos::new(1040, 512, 16),
        },
        Vehicle2 {
            position: WorldPos::new(1040, 512, 16),
            ..Default::default()
        },
    );
    for i in 0..cars {
        let front_x = 1030 - 40 * i as i16;
        let object = if i == 0 { LOCOMOTIVE } else { WAGON };
        train.push_car(Car::new(CarComponent {
            front: Bogie {
                position: WorldPos::new(front_x, 512, 16),
                ..Default::default()
            },
            back: Bogie {
                position: WorldPos::new(front_x - 30, 512, 16),
                ..Default::default()
            },
            body: Body::new(object, Some(0)),
        }));
    }
    train
}

/// Owned resources for building an `UpdateEnv` in tests.
pub struct Harness {
    pub catalog: VehicleCatalog,
    pub config: SimConfig,
    pub rng: GameRng,
    pub entities: EntityPool,
    pub events: Vec<SimEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self {
            catalog: sample_catalog(),
            entities: EntityPool::new(config.entity_capacity),
            config,
            rng: GameRng::new(7),
            events: Vec::new(),
        }
    }

    pub fn env<'a>(&'a mut self, hooks: &'a mut dyn TrainHooks) -> UpdateEnv<'a> {
        UpdateEnv {
            catalog: &self.catalog,
            config: &self.config,
            rng: &mut self.rng,
            entities: &mut self.entities,
            events: &mut self.events,
            hooks,
        }
    }
}
