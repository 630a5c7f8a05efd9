// Benchmarks for the per-body hot path: the square-root lookup, the yaw
// quantiser and a full reposition, plus one tick of a long train.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use loco_sim::catalog::{BodySprite, VehicleCatalog, VehicleObject, YawAccuracy};
use loco_sim::config::SimConfig;
use loco_sim::orientation::{reposition, yaw_from_vector};
use loco_sim::sim::SimState;
use loco_sim::tables::fast_square_root;
use loco_sim::types::{ObjectId, TrainId, WorldPos};
use loco_sim::update::NoopHooks;
use loco_sim::vehicle::{Body, Bogie, Car, CarComponent, DriveStatus, Train, Vehicle1, Vehicle2, VehicleHead};

fn catalog() -> VehicleCatalog {
    let mut catalog = VehicleCatalog::new();
    catalog.insert(
        ObjectId(1),
        VehicleObject {
            name: "Bench wagon".into(),
            top_speed: 60,
            body_sprites: vec![BodySprite {
                num_animation_frames: 4,
                flat_yaw_accuracy: YawAccuracy::Directions64,
                ..Default::default()
            }],
            ..Default::default()
        },
    );
    catalog
}

fn bogie(x: i16, y: i16, z: i16) -> Bogie {
    Bogie {
        position: WorldPos::new(x, y, z),
        track_lean: 0,
    }
}

fn long_train(cars: usize) -> Train {
    let head = VehicleHead {
        position: WorldPos::new(8000, 4000, 64),
        status: DriveStatus::Travelling,
    };
    let mut train = Train::new(TrainId(1), head, Vehicle1::default(), Vehicle2::default());
    for i in 0..cars {
        let x = 7990 - 32 * i as i16;
        train.push_car(Car::new(CarComponent {
            front: bogie(x, 4000, 64),
            back: bogie(x - 24, 3990, 62),
            body: Body::new(ObjectId(1), Some(0)),
        }));
    }
    train
}

fn bench_fast_square_root(c: &mut Criterion) {
    c.bench_function("fast_square_root", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for d in (0..1_000_000u32).step_by(977) {
                acc = acc.wrapping_add(fast_square_root(black_box(d)));
            }
            acc
        })
    });
}

fn bench_yaw(c: &mut Criterion) {
    c.bench_function("yaw_from_vector_64", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for dx in -32..32 {
                for dy in -32..32 {
                    acc += yaw_from_vector(YawAccuracy::Directions64, black_box(dx), black_box(dy)) as u32;
                }
            }
            acc
        })
    });
}

fn bench_reposition(c: &mut Criterion) {
    let catalog = catalog();
    let back = bogie(100, 100, 10);
    let front = bogie(124, 110, 14);
    c.bench_function("reposition", |b| {
        let mut body = Body::new(ObjectId(1), Some(0));
        b.iter(|| reposition(&mut body, black_box(&back), black_box(&front), &catalog))
    });
}

fn bench_tick(c: &mut Criterion) {
    let mut sim = SimState::new(1, SimConfig::default(), catalog());
    sim.place_train(long_train(200)).expect("bench train is well formed");
    c.bench_function("tick_200_car_train", |b| {
        b.iter(|| {
            let target = sim.tick + 1;
            sim.step(&[], target, &mut NoopHooks).expect("bench tick")
        })
    });
}

criterion_group!(benches, bench_fast_square_root, bench_yaw, bench_reposition, bench_tick);
criterion_main!(benches);
