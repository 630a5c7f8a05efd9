// Simulation state and tick loop.
//
// `SimState` owns everything the train engine mutates: the tick counter, the
// PRNG, the trains (keyed by id in a `BTreeMap` so iteration order is
// deterministic), the shared misc-entity pool, plus the read-only config and
// vehicle catalog. The sim is a function
// `(state, commands, hooks) -> (new_state, events)`.
//
// `step()` advances one tick at a time up to `target_tick`. Each tick:
//
//   1. `tick += 1`.
//   2. Commands scheduled at or before the new tick are applied, in order.
//      Invalid commands (unknown train, duplicate id, malformed chain) are
//      logged and skipped; they never abort the tick.
//   3. Every train is updated in id order through `update::update_head()`
//      with a fresh `TickContext`.
//
// A structural error during step 3 (a body referencing a vehicle type that
// is not in the catalog) aborts the step and is returned unchanged. The state
// is then mid-tick and should be discarded.
//
// Title mode is the non-interactive preview played behind the main menu:
// trains run and animate, but breakdowns never start.
//
// See also: `update.rs` for the per-train traversal, `command.rs`,
// `event.rs`, `config.rs`.
//
// **Critical constraint: determinism.** Same seed, same config, same catalog,
// same commands and same hooks give identical events and identical state,
// including after a save/load round trip in the middle of a run.

use crate::catalog::VehicleCatalog;
use crate::command::{SimAction, SimCommand};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::event::{SimEvent, SimEventKind};
use crate::pool::EntityPool;
use crate::types::TrainId;
use crate::update::{self, TickContext, TrainHooks, UpdateEnv};
use crate::vehicle::{DriveStatus, Train};
use loco_prng::GameRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether the game is being played or shown as a title-screen preview.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimMode {
    #[default]
    Playing,
    Title,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    /// Last completed tick.
    pub tick: u64,
    pub rng: GameRng,
    pub config: SimConfig,
    pub mode: SimMode,
    pub trains: BTreeMap<TrainId, Train>,
    pub entities: EntityPool,
    pub catalog: VehicleCatalog,
}

/// Output of one `step()` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepResult {
    /// Events emitted during the step, in emission order.
    pub events: Vec<SimEvent>,
}

impl SimState {
    pub fn new(seed: u64, config: SimConfig, catalog: VehicleCatalog) -> Self {
        Self {
            tick: 0,
            rng: GameRng::new(seed),
            entities: EntityPool::new(config.entity_capacity),
            config,
            mode: SimMode::Playing,
            trains: BTreeMap::new(),
            catalog,
        }
    }

    /// Advance to `target_tick`, applying `commands` (sorted by tick) on
    /// their ticks.
    pub fn step(
        &mut self,
        commands: &[SimCommand],
        target_tick: u64,
        hooks: &mut dyn TrainHooks,
    ) -> Result<StepResult, SimError> {
        let mut events = Vec::new();
        let mut cmd_idx = 0;

        while self.tick < target_tick {
            self.tick += 1;

            while cmd_idx < commands.len() && commands[cmd_idx].tick <= self.tick {
                let cmd = &commands[cmd_idx];
                cmd_idx += 1;
                self.apply_command(cmd, &mut events);
            }

            self.update_trains(hooks, &mut events)?;
        }

        Ok(StepResult { events })
    }

    fn update_trains(&mut self, hooks: &mut dyn TrainHooks, events: &mut Vec<SimEvent>) -> Result<(), SimError> {
        let tick = self.tick;
        let title_mode = self.mode == SimMode::Title;
        let mut env = UpdateEnv {
            catalog: &self.catalog,
            config: &self.config,
            rng: &mut self.rng,
            entities: &mut self.entities,
            events,
            hooks,
        };
        for train in self.trains.values_mut() {
            let mut ctx = TickContext::new(tick, train, title_mode);
            update::update_head(train, &mut ctx, &mut env)?;
        }
        Ok(())
    }

    fn apply_command(&mut self, cmd: &SimCommand, events: &mut Vec<SimEvent>) {
        let tick = self.tick;
        let result = match &cmd.action {
            SimAction::PlaceTrain { train } => self.place_train((**train).clone()).map(|id| {
                events.push(SimEvent {
                    tick,
                    kind: SimEventKind::TrainPlaced { train: id },
                });
            }),
            SimAction::RemoveTrain { train } => self.remove_train(*train).map(|_| {
                events.push(SimEvent {
                    tick,
                    kind: SimEventKind::TrainRemoved { train: *train },
                });
            }),
            SimAction::RequestBreakdown { train, car } => self.request_breakdown(*train, *car),
            SimAction::SetDriveStatus { train, status } => self.set_drive_status(*train, *status),
            SimAction::SetMode { mode } => {
                self.mode = *mode;
                events.push(SimEvent {
                    tick,
                    kind: SimEventKind::ModeChanged { mode: *mode },
                });
                Ok(())
            }
        };
        if let Err(err) = result {
            log::warn!("tick {tick}: ignoring command: {err}");
        }
    }

    /// Add a train after checking its structure. Returns its id.
    pub fn place_train(&mut self, train: Train) -> Result<TrainId, SimError> {
        train.validate()?;
        let id = train.id;
        if self.trains.contains_key(&id) {
            return Err(SimError::DuplicateTrain(id));
        }
        self.trains.insert(id, train);
        Ok(id)
    }

    pub fn remove_train(&mut self, id: TrainId) -> Result<Train, SimError> {
        self.trains.remove(&id).ok_or(SimError::UnknownTrain(id))
    }

    /// Schedule a breakdown; it starts on the car's next eligible tick.
    pub fn request_breakdown(&mut self, train: TrainId, car: usize) -> Result<(), SimError> {
        let target = self
            .trains
            .get_mut(&train)
            .ok_or(SimError::UnknownTrain(train))?
            .cars
            .get_mut(car)
            .ok_or(SimError::UnknownCar { train, car })?;
        target.breakdown.pending = true;
        Ok(())
    }

    pub fn set_drive_status(&mut self, train: TrainId, status: DriveStatus) -> Result<(), SimError> {
        let train = self.trains.get_mut(&train).ok_or(SimError::UnknownTrain(train))?;
        train.head.status = status;
        Ok(())
    }

    pub fn train(&self, id: TrainId) -> Option<&Train> {
        self.trains.get(&id)
    }

    /// Serialize the full state, catalog included.
    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a state saved with `to_json`. Every train and the entity
    /// pool are re-validated.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let state: SimState = serde_json::from_str(json)?;
        for train in state.trains.values() {
            train.validate()?;
        }
        state.entities.validate()?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{sample_catalog, sample_train};
    use crate::types::ObjectId;
    use crate::update::NoopHooks;
    use crate::vehicle::{Body, Car, CarComponent};

    fn new_sim() -> SimState {
        SimState::new(42, SimConfig::default(), sample_catalog())
    }

    fn cmd(tick: u64, action: SimAction) -> SimCommand {
        SimCommand { tick, action }
    }

    fn place(id: u16, cars: usize) -> SimAction {
        SimAction::PlaceTrain {
            train: Box::new(sample_train(TrainId(id), cars)),
        }
    }

    fn kinds(result: &StepResult) -> Vec<&SimEventKind> {
        result.events.iter().map(|e| &e.kind).collect()
    }

    #[test]
    fn new_sim_is_empty() {
        let sim = new_sim();
        assert_eq!(sim.tick, 0);
        assert!(sim.trains.is_empty());
        assert_eq!(sim.entities.capacity(), 1000);
        assert_eq!(sim.mode, SimMode::Playing);
    }

    #[test]
    fn step_advances_to_target() {
        let mut sim = new_sim();
        let result = sim.step(&[], 25, &mut NoopHooks).unwrap();
        assert_eq!(sim.tick, 25);
        assert!(result.events.is_empty());
        // Stepping backwards is a no-op.
        sim.step(&[], 10, &mut NoopHooks).unwrap();
        assert_eq!(sim.tick, 25);
    }

    #[test]
    fn commands_apply_on_their_tick() {
        let mut sim = new_sim();
        let commands = vec![cmd(3, place(1, 2)), cmd(5, place(2, 1))];
        let result = sim.step(&commands, 4, &mut NoopHooks).unwrap();
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].tick, 3);
        assert!(sim.train(TrainId(1)).is_some());
        assert!(sim.train(TrainId(2)).is_none());

        sim.step(&commands[1..], 5, &mut NoopHooks).unwrap();
        assert_eq!(sim.trains.len(), 2);
    }

    #[test]
    fn duplicate_train_rejected() {
        let mut sim = new_sim();
        assert_eq!(sim.place_train(sample_train(TrainId(4), 1)).unwrap(), TrainId(4));
        let err = sim.place_train(sample_train(TrainId(4), 3)).unwrap_err();
        assert!(matches!(err, SimError::DuplicateTrain(TrainId(4))));
        assert_eq!(sim.trains[&TrainId(4)].cars.len(), 1);

        // Through a command the duplicate is skipped, not fatal.
        let result = sim.step(&[cmd(1, place(4, 2))], 1, &mut NoopHooks).unwrap();
        assert!(result.events.is_empty());
        assert_eq!(sim.trains[&TrainId(4)].cars.len(), 1);
    }

    #[test]
    fn malformed_train_rejected() {
        let mut json = serde_json::to_value(sample_train(TrainId(1), 1)).unwrap();
        json["cars"][0]["components"] = serde_json::json!([]);
        let train: Train = serde_json::from_value(json).unwrap();
        let mut sim = new_sim();
        assert!(matches!(
            sim.place_train(train),
            Err(SimError::MalformedChain { index: 3, .. })
        ));
    }

    #[test]
    fn request_breakdown_checks_ids() {
        let mut sim = new_sim();
        sim.place_train(sample_train(TrainId(1), 2)).unwrap();
        assert!(matches!(
            sim.request_breakdown(TrainId(9), 0),
            Err(SimError::UnknownTrain(TrainId(9)))
        ));
        assert!(matches!(
            sim.request_breakdown(TrainId(1), 2),
            Err(SimError::UnknownCar { car: 2, .. })
        ));
        sim.request_breakdown(TrainId(1), 1).unwrap();
        assert!(sim.trains[&TrainId(1)].cars[1].breakdown.pending);
    }

    #[test]
    fn breakdown_command_plays_one_sound() {
        let mut sim = new_sim();
        let commands = vec![
            cmd(1, place(1, 2)),
            cmd(
                2,
                SimAction::RequestBreakdown {
                    train: TrainId(1),
                    car: 1,
                },
            ),
        ];
        let result = sim.step(&commands, 10, &mut NoopHooks).unwrap();
        let sounds: Vec<_> = result
            .events
            .iter()
            .filter(|e| matches!(e.kind, SimEventKind::SoundPlayed { .. }))
            .collect();
        assert_eq!(sounds.len(), 1);
        assert_eq!(sounds[0].tick, 2);
        assert!(sim.trains[&TrainId(1)].cars[1].breakdown.broken_down);
        // Smoke on ticks 4 and 8.
        assert_eq!(sim.entities.len(), 2);
    }

    #[test]
    fn title_mode_defers_breakdowns() {
        let mut sim = new_sim();
        let commands = vec![
            cmd(1, SimAction::SetMode { mode: SimMode::Title }),
            cmd(1, place(1, 1)),
            cmd(
                1,
                SimAction::RequestBreakdown {
                    train: TrainId(1),
                    car: 0,
                },
            ),
        ];
        let result = sim.step(&commands, 8, &mut NoopHooks).unwrap();
        assert_eq!(
            kinds(&result),
            vec![
                &SimEventKind::ModeChanged { mode: SimMode::Title },
                &SimEventKind::TrainPlaced { train: TrainId(1) },
            ]
        );
        assert!(sim.trains[&TrainId(1)].cars[0].breakdown.pending);

        let result = sim
            .step(&[cmd(9, SimAction::SetMode { mode: SimMode::Playing })], 9, &mut NoopHooks)
            .unwrap();
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.kind, SimEventKind::BreakdownStarted { car: 0, .. })));
    }

    #[test]
    fn unknown_vehicle_object_aborts_step() {
        let mut sim = new_sim();
        let mut train = sample_train(TrainId(1), 1);
        train.push_car(Car::new(CarComponent::new(Body::new(ObjectId(77), Some(0)))));
        sim.place_train(train).unwrap();
        let err = sim.step(&[], 1, &mut NoopHooks).unwrap_err();
        assert!(matches!(err, SimError::UnknownVehicleObject(ObjectId(77))));
    }

    #[test]
    fn same_seed_same_run() {
        let commands: Vec<SimCommand> = vec![
            cmd(1, place(1, 3)),
            cmd(1, place(2, 2)),
            cmd(
                6,
                SimAction::RequestBreakdown {
                    train: TrainId(2),
                    car: 0,
                },
            ),
            cmd(
                7,
                SimAction::RequestBreakdown {
                    train: TrainId(1),
                    car: 2,
                },
            ),
        ];
        let mut a = new_sim();
        let mut b = new_sim();
        let ra = a.step(&commands, 50, &mut NoopHooks).unwrap();
        let rb = b.step(&commands, 50, &mut NoopHooks).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(a, b);
    }

    #[test]
    fn json_round_trip_resumes_identically() {
        let mut sim = new_sim();
        sim.step(&[cmd(1, place(1, 2))], 5, &mut NoopHooks).unwrap();

        let json = sim.to_json().unwrap();
        let mut restored = SimState::from_json(&json).unwrap();
        assert_eq!(restored, sim);

        let breakdown = [cmd(
            6,
            SimAction::RequestBreakdown {
                train: TrainId(1),
                car: 0,
            },
        )];
        let a = sim.step(&breakdown, 20, &mut NoopHooks).unwrap();
        let b = restored.step(&breakdown, 20, &mut NoopHooks).unwrap();
        assert_eq!(a, b);
        assert_eq!(sim, restored);
    }

    #[test]
    fn corrupt_entity_pool_fails_to_load() {
        let config = SimConfig {
            entity_capacity: 2,
            ..Default::default()
        };
        let mut sim = SimState::new(42, config, sample_catalog());
        crate::particle::create_black_smoke(&mut sim.entities, crate::types::WorldPos::default());

        let mut json: serde_json::Value = serde_json::from_str(&sim.to_json().unwrap()).unwrap();
        json["entities"]["last"] = serde_json::json!(40);
        let err = SimState::from_json(&json.to_string()).unwrap_err();
        assert!(matches!(err, SimError::CorruptEntityPool { .. }));

        // The untouched save still loads and keeps allocating.
        let mut loaded = SimState::from_json(&sim.to_json().unwrap()).unwrap();
        assert!(crate::particle::create_black_smoke(&mut loaded.entities, Default::default()).is_some());
    }

    #[test]
    fn bincode_round_trip() {
        let mut sim = new_sim();
        sim.step(&[cmd(1, place(3, 2))], 4, &mut NoopHooks).unwrap();
        let bytes = bincode::serialize(&sim).unwrap();
        let restored: SimState = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, sim);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(SimState::from_json("not json {{"), Err(SimError::Json(_))));
        assert!(SimState::from_json(r#"{"tick": "soon"}"#).is_err());
    }
}
