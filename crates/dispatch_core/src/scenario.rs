//! Seeded random scenarios: drivers and riders scattered over the grid, riders
//! requesting over the first half of the run, drivers answering offers at random.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::config::DispatchConfig;
use crate::ecs::{RideState, RiderId};
use crate::engine::DispatchEngine;
use crate::error::DispatchResult;
use crate::geometry::Location;
use crate::telemetry::DispatchCounts;

/// Parameters for a random scenario.
#[derive(Debug, Clone)]
pub struct ScenarioParams {
    pub num_drivers: usize,
    pub num_riders: usize,
    pub ticks: u64,
    /// Probability that a driver accepts an offer, in [0, 1].
    pub accept_probability: f64,
    /// Random seed for reproducibility (optional; if None, uses entropy).
    pub seed: Option<u64>,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            num_drivers: 20,
            num_riders: 50,
            ticks: 500,
            accept_probability: 0.8,
            seed: None,
        }
    }
}

impl ScenarioParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_drivers(mut self, count: usize) -> Self {
        self.num_drivers = count;
        self
    }

    pub fn with_riders(mut self, count: usize) -> Self {
        self.num_riders = count;
        self
    }

    pub fn with_ticks(mut self, ticks: u64) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn with_accept_probability(mut self, probability: f64) -> Self {
        self.accept_probability = probability.clamp(0.0, 1.0);
        self
    }
}

/// End-of-run summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub seed: Option<u64>,
    pub ticks: u64,
    pub rides_requested: usize,
    pub counts: DispatchCounts,
    pub offers_made: u64,
    pub offers_accepted: u64,
    pub offers_rejected: u64,
    pub acceptance_rate: Option<f64>,
    pub mean_time_to_pickup: Option<f64>,
    pub mean_trip_duration: Option<f64>,
}

fn random_location<R: Rng>(rng: &mut R, grid_size: i32) -> Location {
    Location::new(rng.gen_range(0..grid_size), rng.gen_range(0..grid_size))
}

/// A rider waiting for its request tick.
#[derive(Debug, Clone, Copy)]
struct PlannedRequest {
    rider: RiderId,
    at_tick: u64,
}

/// Spawn drivers and riders into `engine` and plan when each rider requests.
fn populate<R: Rng>(
    engine: &mut DispatchEngine,
    params: &ScenarioParams,
    rng: &mut R,
) -> DispatchResult<Vec<PlannedRequest>> {
    let grid_size = engine.config().grid_size.max(1);
    for i in 0..params.num_drivers {
        engine.create_driver(format!("driver-{i}"), random_location(rng, grid_size))?;
    }

    let request_window = (params.ticks / 2).max(1);
    let mut plan = Vec::with_capacity(params.num_riders);
    for i in 0..params.num_riders {
        let pickup = random_location(rng, grid_size);
        let dropoff = random_location(rng, grid_size);
        let rider = engine.create_rider(format!("rider-{i}"), pickup, dropoff)?;
        plan.push(PlannedRequest {
            rider: rider.id,
            at_tick: rng.gen_range(0..request_window),
        });
    }
    plan.sort_by_key(|p| p.at_tick);
    Ok(plan)
}

/// Let every driver holding an offer answer it, until no offers are outstanding.
fn answer_offers<R: Rng>(
    engine: &mut DispatchEngine,
    accept_probability: f64,
    rng: &mut R,
) -> DispatchResult<()> {
    loop {
        let pending: Vec<_> = engine
            .rides()
            .into_iter()
            .filter_map(|ride| ride.offered_to_driver_id.map(|driver| (ride.id, driver)))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        for (ride, driver) in pending {
            if rng.gen_bool(accept_probability) {
                engine.accept_ride(ride, driver)?;
            } else {
                engine.reject_ride(ride, driver)?;
            }
        }
    }
}

/// Run a full scenario and summarize it. The same seed always gives the same summary.
pub fn run_scenario(
    config: DispatchConfig,
    params: &ScenarioParams,
) -> DispatchResult<ScenarioSummary> {
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let accept_probability = params.accept_probability.clamp(0.0, 1.0);
    let mut engine = DispatchEngine::new(config)?;
    let plan = populate(&mut engine, params, &mut rng)?;

    let mut next_request = 0;
    for _ in 0..params.ticks {
        let now = engine.now();
        while let Some(request) = plan.get(next_request).filter(|p| p.at_tick <= now) {
            engine.request_ride(request.rider)?;
            next_request += 1;
        }
        engine.dispatch_waiting();
        answer_offers(&mut engine, accept_probability, &mut rng)?;
        engine.tick();
    }

    let snapshot = engine.snapshot();
    let telemetry = engine.telemetry();
    let summary = ScenarioSummary {
        seed: params.seed,
        ticks: snapshot.tick,
        rides_requested: next_request,
        counts: snapshot.counts,
        offers_made: telemetry.offers_made,
        offers_accepted: telemetry.offers_accepted,
        offers_rejected: telemetry.offers_rejected,
        acceptance_rate: telemetry.acceptance_rate(),
        mean_time_to_pickup: telemetry.mean_time_to_pickup(),
        mean_trip_duration: telemetry.mean_trip_duration(),
    };
    info!(
        ticks = summary.ticks,
        completed = summary.counts.rides_completed,
        failed = summary.counts.rides_failed,
        "scenario finished"
    );
    Ok(summary)
}

impl ScenarioSummary {
    /// Rides that reached a terminal state.
    pub fn finished(&self) -> usize {
        self.counts.rides_completed + self.counts.rides_failed
    }

    pub fn count(&self, state: RideState) -> usize {
        match state {
            RideState::Waiting => self.counts.rides_waiting,
            RideState::PendingAcceptance => self.counts.rides_pending_acceptance,
            RideState::Assigned => self.counts.rides_assigned,
            RideState::Completed => self.counts.rides_completed,
            RideState::Failed => self.counts.rides_failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_summary() {
        let params = ScenarioParams::default()
            .with_seed(7)
            .with_drivers(5)
            .with_riders(10)
            .with_ticks(200);
        let first = run_scenario(DispatchConfig::default(), &params).expect("first run");
        let second = run_scenario(DispatchConfig::default(), &params).expect("second run");
        assert_eq!(first, second);
        assert_eq!(first.rides_requested, 10);
        assert_eq!(first.ticks, 200);
        assert!(first.finished() <= first.rides_requested);
    }

    #[test]
    fn invalid_config_stops_the_scenario_before_it_starts() {
        let params = ScenarioParams::default().with_seed(1).with_ticks(10);
        let config = DispatchConfig::default().with_max_rejections(0);
        assert!(matches!(
            run_scenario(config, &params),
            Err(crate::error::DispatchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn drivers_that_never_accept_fail_every_ride() {
        let params = ScenarioParams::default()
            .with_seed(3)
            .with_drivers(4)
            .with_riders(6)
            .with_ticks(100)
            .with_accept_probability(0.0);
        let summary = run_scenario(DispatchConfig::default(), &params).expect("run");
        assert_eq!(summary.count(RideState::Failed), summary.rides_requested);
        assert_eq!(summary.offers_accepted, 0);
    }
}
