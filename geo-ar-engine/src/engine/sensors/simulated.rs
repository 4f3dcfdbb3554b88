use bevy::prelude::*;
use std::time::Duration;

use super::queue::SensorSender;
use crate::engine::core::CancellationToken;
use crate::engine::geo::{GeoPoint, Heading, from_local_offset};

/// Desktop stand-in for the device sensors: a straight walk at constant speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedWalk {
    pub start: GeoPoint,
    /// Walking direction and reported heading, degrees.
    pub bearing: f64,
    pub speed_mps: f64,
    pub interval: Duration,
    pub accuracy_m: f64,
}

impl SimulatedWalk {
    pub fn standing_at(start: GeoPoint, bearing: f64) -> Self {
        Self {
            start,
            bearing,
            speed_mps: 0.0,
            interval: Duration::from_millis(1000),
            accuracy_m: 5.0,
        }
    }

    pub fn walking(mut self, speed_mps: f64) -> Self {
        self.speed_mps = speed_mps;
        self
    }

    pub fn every(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Location and heading reported on the given tick.
    pub fn fix_at(&self, step: u64) -> (GeoPoint, Heading) {
        let elapsed = self.interval.as_secs_f64() * step as f64;
        let timestamp = self.start.timestamp + (self.interval.as_millis() as u64) * step;
        let travelled = self.speed_mps * elapsed;

        let location = from_local_offset(&self.start, (0.0, -travelled), self.bearing)
            .with_accuracy(self.accuracy_m)
            .at(timestamp);
        let heading = Heading::true_north(self.bearing).at(timestamp);
        (location, heading)
    }

    /// Push fixes from a background thread until `cancel` is triggered.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn(
        self,
        sender: SensorSender,
        cancel: CancellationToken,
    ) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || {
            info!(
                "Simulated sensors walking {:.1}° at {:.1} m/s",
                self.bearing, self.speed_mps
            );
            let mut step = 0;
            while !cancel.is_cancelled() {
                let (location, heading) = self.fix_at(step);
                sender.push_location(location);
                sender.push_heading(heading);
                step += 1;
                std::thread::sleep(self.interval);
            }
            debug!("Simulated sensors stopped after {} fixes", step);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geo::bearing_and_distance;
    use crate::engine::sensors::SensorQueue;
    use approx::assert_abs_diff_eq;

    #[test]
    fn walk_covers_speed_times_elapsed() {
        let walk = SimulatedWalk::standing_at(GeoPoint::new(32.782149, -96.805218), 45.0)
            .walking(1.5)
            .every(Duration::from_millis(500));

        let (location, heading) = walk.fix_at(8);
        let (bearing, distance) = bearing_and_distance(&walk.start, &location);
        assert_abs_diff_eq!(distance, 6.0, epsilon = 1e-3);
        assert_abs_diff_eq!(bearing, 45.0, epsilon = 1e-3);
        assert_eq!(location.timestamp, 4000);
        assert_eq!(heading.degrees(), 45.0);
    }

    #[test]
    fn spawned_walk_stops_on_cancel() {
        let queue = SensorQueue::default();
        let cancel = CancellationToken::default();
        let walk = SimulatedWalk::standing_at(GeoPoint::new(0.0, 0.0), 0.0)
            .every(Duration::from_millis(5));

        let handle = walk.spawn(queue.sender(), cancel.clone());
        std::thread::sleep(Duration::from_millis(30));
        cancel.cancel();
        handle.join().unwrap();

        let fixes = queue.drain();
        assert!(!fixes.is_empty());
        assert_eq!(fixes.len() % 2, 0);
    }
}
