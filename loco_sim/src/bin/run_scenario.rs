// Headless scenario runner.
//
// Builds a small catalog (a steam engine and two wagon types, one of them
// articulated), places one train on a gentle climb, schedules a breakdown,
// and runs the sim with hooks that push the train along at a constant speed.
// Prints what happened: event counts, particles alive, the engine's final
// sprite orientation. Useful for eyeballing determinism (same seed, same
// output) and for profiling the tick loop outside the test harness.
//
// Usage:
//   run_scenario [OPTIONS]
//     --seed <N>          PRNG seed (default: 1)
//     --ticks <N>         Ticks to simulate (default: 200)
//     --config <PATH>     SimConfig JSON file (default: built-in defaults)
//     --no-breakdowns     Disable breakdowns regardless of the config
//
// Logging goes through env_logger; set RUST_LOG=debug to see breakdowns.

use std::collections::BTreeMap;

use loco_sim::catalog::{AnimationSlot, BodySprite, VehicleCatalog, VehicleObject, VisualEffectType, YawAccuracy};
use loco_sim::command::{SimAction, SimCommand};
use loco_sim::config::SimConfig;
use loco_sim::entity::{Exhaust, MiscEntityType};
use loco_sim::event::SimEventKind;
use loco_sim::pool::EntityPool;
use loco_sim::sim::SimState;
use loco_sim::types::{ObjectId, Speed32, TrainId, WorldPos};
use loco_sim::update::{EffectEmission, TickContext, TrainHooks};
use loco_sim::vehicle::{
    Body, Bogie, Car, CarComponent, DriveStatus, Train, Vehicle1, Vehicle2, VehicleHead,
};

const ENGINE: ObjectId = ObjectId(1);
const HOPPER: ObjectId = ObjectId(2);
const ARTICULATED: ObjectId = ObjectId(3);

struct Options {
    seed: u64,
    ticks: u64,
    config_path: Option<String>,
    no_breakdowns: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = parse_args();

    let mut config = match &options.config_path {
        Some(path) => load_config(path),
        None => SimConfig::default(),
    };
    if options.no_breakdowns {
        config.breakdowns_disabled = true;
    }
    let map_extent = config.map_extent;

    let mut sim = SimState::new(options.seed, config, build_catalog());
    let commands = vec![
        SimCommand {
            tick: 1,
            action: SimAction::PlaceTrain {
                train: Box::new(build_train()),
            },
        },
        SimCommand {
            tick: 30,
            action: SimAction::RequestBreakdown {
                train: TrainId(1),
                car: 2,
            },
        },
    ];

    let mut hooks = ConstantSpeed {
        speed: Speed32::from_whole(40),
        map_extent,
    };
    let result = match sim.step(&commands, options.ticks, &mut hooks) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Simulation failed at tick {}: {e}", sim.tick);
            std::process::exit(1);
        }
    };

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for event in &result.events {
        let name = match event.kind {
            SimEventKind::SoundPlayed { .. } => "sound",
            SimEventKind::SpriteInvalidated { .. } => "invalidate",
            SimEventKind::BreakdownStarted { .. } => "breakdown",
            SimEventKind::TrainPlaced { .. } => "placed",
            SimEventKind::TrainRemoved { .. } => "removed",
            SimEventKind::ModeChanged { .. } => "mode",
        };
        *counts.entry(name).or_default() += 1;
    }

    println!("seed {} ran to tick {}", options.seed, sim.tick);
    for (name, count) in &counts {
        println!("  {name:>10}: {count}");
    }
    println!(
        "  particles: {} smoke, {} exhaust ({} of {} slots)",
        sim.entities.count_of_tag(MiscEntityType::Smoke),
        sim.entities.count_of_tag(MiscEntityType::Exhaust),
        sim.entities.len(),
        sim.entities.capacity(),
    );
    if let Some(body) = sim
        .train(TrainId(1))
        .and_then(|t| t.cars.first())
        .and_then(|c| c.first_body())
    {
        println!(
            "  engine at {} pitch {} yaw {} frame {}",
            body.position, body.sprite_pitch, body.sprite_yaw, body.animation_frame
        );
    }
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Options {
    let mut options = Options {
        seed: 1,
        ticks: 200,
        config_path: None,
        no_breakdowns: false,
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                options.seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires an integer");
                    std::process::exit(1);
                });
            }
            "--ticks" => {
                i += 1;
                options.ticks = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--ticks requires an integer");
                    std::process::exit(1);
                });
            }
            "--config" => {
                i += 1;
                options.config_path = args.get(i).cloned().or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                });
            }
            "--no-breakdowns" => options.no_breakdowns = true,
            "--help" | "-h" => {
                println!("Usage: run_scenario [--seed N] [--ticks N] [--config PATH] [--no-breakdowns]");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

fn load_config(path: &str) -> SimConfig {
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Cannot read {path}: {e}");
        std::process::exit(1);
    });
    SimConfig::from_json(&text).unwrap_or_else(|e| {
        eprintln!("Bad config {path}: {e}");
        std::process::exit(1);
    })
}

fn build_catalog() -> VehicleCatalog {
    let mut catalog = VehicleCatalog::new();
    catalog.insert(
        ENGINE,
        VehicleObject {
            name: "2-6-0 Mogul".into(),
            top_speed: 64,
            visual_effect: VisualEffectType::SteamPuffs1,
            animations: vec![AnimationSlot {
                object_id: ObjectId(40),
                emitter_height: 0x98,
            }],
            body_sprites: vec![BodySprite {
                num_animation_frames: 8,
                flat_yaw_accuracy: YawAccuracy::Directions64,
                sloped_yaw_accuracy: YawAccuracy::Directions32,
                ..Default::default()
            }],
        },
    );
    catalog.insert(
        HOPPER,
        VehicleObject {
            name: "Coal hopper".into(),
            top_speed: 64,
            body_sprites: vec![BodySprite::default()],
            ..Default::default()
        },
    );
    catalog.insert(
        ARTICULATED,
        VehicleObject {
            name: "Articulated coach".into(),
            top_speed: 80,
            body_sprites: vec![BodySprite {
                has_steep_sprites: true,
                num_roll_frames: 3,
                ..Default::default()
            }],
            ..Default::default()
        },
    );
    catalog
}

fn section(object: ObjectId, front_x: i16, z: i16) -> CarComponent {
    CarComponent {
        front: Bogie {
            position: WorldPos::new(front_x, 2048, z),
            track_lean: 0,
        },
        back: Bogie {
            position: WorldPos::new(front_x - 24, 2048, z - 2),
            track_lean: 0,
        },
        body: Body::new(object, Some(0)),
    }
}

/// Engine, two hoppers and a two-section coach, on a slight climb.
fn build_train() -> Train {
    let start = WorldPos::new(4000, 2048, 96);
    let mut train = Train::new(
        TrainId(1),
        VehicleHead {
            position: start,
            status: DriveStatus::Travelling,
        },
        Vehicle1 { position: start },
        Vehicle2 {
            position: start,
            current_speed: Speed32::ZERO,
        },
    );
    let mut x = start.x - 8;
    let mut z = start.z;
    for object in [ENGINE, HOPPER, HOPPER] {
        train.push_car(Car::new(section(object, x, z)));
        x -= 32;
        z -= 2;
    }
    let mut coach = Car::new(section(ARTICULATED, x, z));
    coach.push_component(section(ARTICULATED, x - 32, z - 2));
    train.push_car(coach);
    train
}

/// Moves every bogie one unit along +x per tick at a fixed speed and turns
/// steam emissions into exhaust puffs every eighth tick.
struct ConstantSpeed {
    speed: Speed32,
    map_extent: i16,
}

impl TrainHooks for ConstantSpeed {
    fn update_vehicle_2(&mut self, vehicle: &mut Vehicle2, ctx: &mut TickContext) -> bool {
        vehicle.current_speed = self.speed;
        ctx.distance_travelled = self.speed.whole() * 64;
        ctx.bogies_moved = true;
        false
    }

    fn update_bogie(&mut self, bogie: &mut Bogie, _ctx: &mut TickContext) -> bool {
        bogie.position.x = bogie.position.x.saturating_add(1);
        false
    }

    fn emit_visual_effect(
        &mut self,
        emission: &EffectEmission,
        body: &Body,
        ctx: &TickContext,
        entities: &mut EntityPool,
    ) {
        if emission.effect == VisualEffectType::None || ctx.tick % 8 != 0 {
            return;
        }
        Exhaust::create(
            entities,
            body.position.offset_z(emission.emitter_offset),
            emission.steam_object,
            self.map_extent,
        );
    }
}
