use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::engine::geo::{GeoPoint, Heading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Location,
    Heading,
}

/// One item delivered by a location or heading provider.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorFix {
    Location(GeoPoint),
    Heading(Heading),
    /// Permission denied or hardware missing. Calibration keeps waiting.
    Unavailable(SensorKind),
}

/// Fixes pushed from provider callbacks or threads, drained once per frame.
#[derive(Resource, Clone, Default)]
pub struct SensorQueue(Arc<Mutex<VecDeque<SensorFix>>>);

impl SensorQueue {
    pub fn sender(&self) -> SensorSender {
        SensorSender(self.0.clone())
    }

    /// Take every pending fix in arrival order.
    pub fn drain(&self) -> Vec<SensorFix> {
        let mut queue = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cloneable producer handle; safe to move into provider threads and JS closures.
#[derive(Clone)]
pub struct SensorSender(Arc<Mutex<VecDeque<SensorFix>>>);

impl SensorSender {
    pub fn push(&self, fix: SensorFix) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(fix);
    }

    pub fn push_location(&self, location: GeoPoint) {
        self.push(SensorFix::Location(location));
    }

    pub fn push_heading(&self, heading: Heading) {
        self.push(SensorFix::Heading(heading));
    }

    pub fn report_unavailable(&self, kind: SensorKind) {
        self.push(SensorFix::Unavailable(kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_preserves_arrival_order_and_empties_queue() {
        let queue = SensorQueue::default();
        let sender = queue.sender();
        sender.push_heading(Heading::magnetic(90.0));
        sender.push_location(GeoPoint::new(1.0, 2.0));
        sender.report_unavailable(SensorKind::Heading);

        let fixes = queue.drain();
        assert_eq!(
            fixes,
            vec![
                SensorFix::Heading(Heading::magnetic(90.0)),
                SensorFix::Location(GeoPoint::new(1.0, 2.0)),
                SensorFix::Unavailable(SensorKind::Heading),
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn senders_from_other_threads_reach_the_queue() {
        let queue = SensorQueue::default();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sender = queue.sender();
                std::thread::spawn(move || sender.push_location(GeoPoint::new(i as f64, 0.0)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.len(), 4);
    }
}
