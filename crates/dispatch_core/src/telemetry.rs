//! Telemetry / KPIs: completed and failed rides plus dispatch counters.

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::ecs::{DriverId, DriverStatus, RideId, RideState, RiderId};

/// One completed ride, recorded on the tick the driver reaches dropoff.
/// Timestamps are ticks; use the helper methods for derived KPIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedRideRecord {
    pub ride: RideId,
    pub rider: RiderId,
    pub driver: DriverId,
    pub requested_at: u64,
    pub assigned_at: u64,
    pub picked_up_at: u64,
    pub completed_at: u64,
    /// Rejections the request collected before this driver accepted.
    pub rejections: u32,
}

impl CompletedRideRecord {
    /// Ticks from request to acceptance.
    pub fn time_to_assign(&self) -> u64 {
        self.assigned_at.saturating_sub(self.requested_at)
    }

    /// Ticks from acceptance to pickup.
    pub fn time_to_pickup(&self) -> u64 {
        self.picked_up_at.saturating_sub(self.assigned_at)
    }

    /// Ticks from pickup to dropoff.
    pub fn trip_duration(&self) -> u64 {
        self.completed_at.saturating_sub(self.picked_up_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRideRecord {
    pub ride: RideId,
    pub rider: RiderId,
    pub failed_at: u64,
    pub rejected_by: Vec<DriverId>,
}

/// Running dispatch telemetry, kept as a world resource.
#[derive(Debug, Clone, Default, Resource, Serialize)]
pub struct DispatchTelemetry {
    pub completed_rides: Vec<CompletedRideRecord>,
    pub failed_rides: Vec<FailedRideRecord>,
    pub offers_made: u64,
    pub offers_accepted: u64,
    pub offers_rejected: u64,
    /// Dispatch attempts that found no eligible driver.
    pub no_candidate_attempts: u64,
}

impl DispatchTelemetry {
    pub fn acceptance_rate(&self) -> Option<f64> {
        let answered = self.offers_accepted + self.offers_rejected;
        (answered > 0).then(|| self.offers_accepted as f64 / answered as f64)
    }

    pub fn mean_time_to_pickup(&self) -> Option<f64> {
        mean(self.completed_rides.iter().map(|r| r.time_to_pickup()))
    }

    pub fn mean_trip_duration(&self) -> Option<f64> {
        mean(self.completed_rides.iter().map(|r| r.trip_duration()))
    }
}

fn mean(values: impl Iterator<Item = u64>) -> Option<f64> {
    let (sum, count) = values.fold((0u64, 0u64), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Aggregated counts at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchCounts {
    pub drivers_available: usize,
    pub drivers_on_trip: usize,
    pub drivers_offline: usize,
    pub rides_waiting: usize,
    pub rides_pending_acceptance: usize,
    pub rides_assigned: usize,
    pub rides_completed: usize,
    pub rides_failed: usize,
}

impl DispatchCounts {
    pub fn add_driver(&mut self, status: DriverStatus) {
        match status {
            DriverStatus::Available => self.drivers_available += 1,
            DriverStatus::OnTrip => self.drivers_on_trip += 1,
            DriverStatus::Offline => self.drivers_offline += 1,
        }
    }

    pub fn add_ride(&mut self, state: RideState) {
        match state {
            RideState::Waiting => self.rides_waiting += 1,
            RideState::PendingAcceptance => self.rides_pending_acceptance += 1,
            RideState::Assigned => self.rides_assigned += 1,
            RideState::Completed => self.rides_completed += 1,
            RideState::Failed => self.rides_failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::Entity;

    fn record(
        requested: u64,
        assigned: u64,
        picked_up: u64,
        completed: u64,
    ) -> CompletedRideRecord {
        CompletedRideRecord {
            ride: RideId(Entity::from_raw(1)),
            rider: RiderId(Entity::from_raw(2)),
            driver: DriverId(Entity::from_raw(3)),
            requested_at: requested,
            assigned_at: assigned,
            picked_up_at: picked_up,
            completed_at: completed,
            rejections: 0,
        }
    }

    #[test]
    fn record_derives_phase_durations() {
        let r = record(2, 5, 25, 105);
        assert_eq!(r.time_to_assign(), 3);
        assert_eq!(r.time_to_pickup(), 20);
        assert_eq!(r.trip_duration(), 80);
    }

    #[test]
    fn aggregate_metrics_handle_empty_and_filled() {
        let mut telemetry = DispatchTelemetry::default();
        assert_eq!(telemetry.acceptance_rate(), None);
        assert_eq!(telemetry.mean_trip_duration(), None);

        telemetry.offers_accepted = 3;
        telemetry.offers_rejected = 1;
        telemetry.completed_rides.push(record(0, 0, 10, 20));
        telemetry.completed_rides.push(record(0, 0, 10, 40));
        assert_eq!(telemetry.acceptance_rate(), Some(0.75));
        assert_eq!(telemetry.mean_time_to_pickup(), Some(10.0));
        assert_eq!(telemetry.mean_trip_duration(), Some(20.0));
    }

    #[test]
    fn counts_bucket_by_status() {
        let mut counts = DispatchCounts::default();
        counts.add_driver(DriverStatus::Available);
        counts.add_driver(DriverStatus::OnTrip);
        counts.add_ride(RideState::Failed);
        counts.add_ride(RideState::Failed);
        assert_eq!(counts.drivers_available, 1);
        assert_eq!(counts.drivers_on_trip, 1);
        assert_eq!(counts.rides_failed, 2);
    }
}
