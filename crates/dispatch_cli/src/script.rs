//! Scripted sessions: a JSON list of commands run against one engine, with
//! drivers, riders and rides referred to by symbolic names.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use dispatch_core::ecs::{DriverId, RideId, RiderId};
use dispatch_core::engine::DispatchEngine;
use dispatch_core::geometry::Location;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateDriver {
        name: String,
        location: Location,
    },
    RemoveDriver { driver: String },
    SetDriverOffline { driver: String },
    SetDriverOnline { driver: String },
    CreateRider {
        name: String,
        pickup: Location,
        dropoff: Location,
    },
    RemoveRider { rider: String },
    /// The ride is named `ride` when `name` is omitted.
    RequestRide { rider: String, name: Option<String> },
    AcceptRide { ride: String, driver: String },
    RejectRide { ride: String, driver: String },
    RetryRide { ride: String },
    DispatchWaiting,
    Tick {
        #[serde(default = "one")]
        count: u64,
    },
    Snapshot,
    ActiveRides,
    PendingOffers { driver: String },
    Telemetry,
}

fn one() -> u64 {
    1
}

/// Outcome of one command, printed as one JSON line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub step: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn load_script(path: &Path) -> Result<Vec<Command>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing script {}", path.display()))
}

pub struct ScriptRunner {
    engine: DispatchEngine,
    drivers: HashMap<String, DriverId>,
    riders: HashMap<String, RiderId>,
    rides: HashMap<String, RideId>,
}

impl ScriptRunner {
    pub fn new(engine: DispatchEngine) -> Self {
        Self {
            engine,
            drivers: HashMap::new(),
            riders: HashMap::new(),
            rides: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    /// Run every command, carrying on past failures.
    pub fn run_all(&mut self, commands: &[Command]) -> Vec<StepResult> {
        commands
            .iter()
            .enumerate()
            .map(|(step, command)| match self.execute(command) {
                Ok(result) => StepResult {
                    step,
                    ok: true,
                    result: Some(result),
                    error: None,
                },
                Err(err) => StepResult {
                    step,
                    ok: false,
                    result: None,
                    error: Some(format!("{err:#}")),
                },
            })
            .collect()
    }

    fn driver(&self, name: &str) -> Result<DriverId> {
        self.drivers
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown driver `{name}`"))
    }

    fn rider(&self, name: &str) -> Result<RiderId> {
        self.riders
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown rider `{name}`"))
    }

    fn ride(&self, name: &str) -> Result<RideId> {
        self.rides
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown ride `{name}`"))
    }

    pub fn execute(&mut self, command: &Command) -> Result<Value> {
        debug!(?command, "executing script command");
        let value = match command {
            Command::CreateDriver { name, location } => {
                if self.drivers.contains_key(name) {
                    bail!("driver `{name}` already exists");
                }
                let view = self.engine.create_driver(name.clone(), *location)?;
                self.drivers.insert(name.clone(), view.id);
                serde_json::to_value(view)?
            }
            Command::RemoveDriver { driver } => {
                let id = self.driver(driver)?;
                self.engine.remove_driver(id)?;
                self.drivers.remove(driver);
                json!({ "removed": id })
            }
            Command::SetDriverOffline { driver } => {
                serde_json::to_value(self.engine.set_driver_offline(self.driver(driver)?)?)?
            }
            Command::SetDriverOnline { driver } => {
                serde_json::to_value(self.engine.set_driver_online(self.driver(driver)?)?)?
            }
            Command::CreateRider {
                name,
                pickup,
                dropoff,
            } => {
                if self.riders.contains_key(name) {
                    bail!("rider `{name}` already exists");
                }
                let view = self.engine.create_rider(name.clone(), *pickup, *dropoff)?;
                self.riders.insert(name.clone(), view.id);
                serde_json::to_value(view)?
            }
            Command::RemoveRider { rider } => {
                let id = self.rider(rider)?;
                self.engine.remove_rider(id)?;
                self.riders.remove(rider);
                json!({ "removed": id })
            }
            Command::RequestRide { rider, name } => {
                let id = self.rider(rider)?;
                let view = self
                    .engine
                    .request_ride(id)
                    .with_context(|| format!("requesting a ride for `{rider}`"))?;
                let name = name.clone().unwrap_or_else(|| "ride".to_string());
                self.rides.insert(name, view.id);
                serde_json::to_value(view)?
            }
            Command::AcceptRide { ride, driver } => {
                let view = self
                    .engine
                    .accept_ride(self.ride(ride)?, self.driver(driver)?)
                    .with_context(|| format!("`{driver}` accepting `{ride}`"))?;
                serde_json::to_value(view)?
            }
            Command::RejectRide { ride, driver } => {
                let view = self
                    .engine
                    .reject_ride(self.ride(ride)?, self.driver(driver)?)
                    .with_context(|| format!("`{driver}` rejecting `{ride}`"))?;
                serde_json::to_value(view)?
            }
            Command::RetryRide { ride } => {
                serde_json::to_value(self.engine.retry_ride(self.ride(ride)?)?)?
            }
            Command::DispatchWaiting => serde_json::to_value(self.engine.dispatch_waiting())?,
            Command::Tick { count } => serde_json::to_value(self.engine.run_ticks(*count))?,
            Command::Snapshot => serde_json::to_value(self.engine.snapshot())?,
            Command::ActiveRides => serde_json::to_value(self.engine.active_rides())?,
            Command::PendingOffers { driver } => {
                serde_json::to_value(self.engine.pending_offers(self.driver(driver)?)?)?
            }
            Command::Telemetry => serde_json::to_value(self.engine.telemetry())?,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::ecs::RideState;
    use std::io::Write;

    const SCRIPT: &str = r#"[
        {"op": "create_driver", "name": "ada", "location": {"x": 20, "y": 20}},
        {"op": "create_rider", "name": "bo", "pickup": {"x": 10, "y": 10}, "dropoff": {"x": 50, "y": 50}},
        {"op": "request_ride", "rider": "bo", "name": "trip"},
        {"op": "accept_ride", "ride": "trip", "driver": "ada"},
        {"op": "tick", "count": 100},
        {"op": "create_driver", "name": "far", "location": {"x": 120, "y": 0}},
        {"op": "snapshot"}
    ]"#;

    #[test]
    fn script_file_runs_to_completion() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SCRIPT.as_bytes()).expect("write script");

        let commands = load_script(file.path()).expect("load");
        assert_eq!(commands.len(), 7);

        let mut runner = ScriptRunner::new(DispatchEngine::default());
        let results = runner.run_all(&commands);

        assert!(results[..5].iter().all(|r| r.ok));
        assert!(!results[5].ok);
        assert!(results[5]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("outside the grid")));
        assert!(results[6].ok);

        let ride = runner.ride("trip").expect("named ride");
        assert_eq!(
            runner.engine().ride(ride).expect("ride").status,
            RideState::Completed
        );
    }

    #[test]
    fn unknown_names_are_reported() {
        let mut runner = ScriptRunner::new(DispatchEngine::default());
        let err = runner
            .execute(&Command::RetryRide {
                ride: "nope".into(),
            })
            .expect_err("unknown ride");
        assert!(err.to_string().contains("unknown ride `nope`"));
    }

    #[test]
    fn tick_count_defaults_to_one() {
        let commands: Vec<Command> =
            serde_json::from_str(r#"[{"op": "tick"}, {"op": "dispatch_waiting"}]"#).expect("parse");
        assert_eq!(commands[0], Command::Tick { count: 1 });
        assert_eq!(commands[1], Command::DispatchWaiting);
    }

    #[test]
    fn malformed_script_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"{\"op\": 3}").expect("write");
        let err = load_script(file.path()).expect_err("malformed");
        assert!(format!("{err:#}").contains("parsing script"));
    }
}
