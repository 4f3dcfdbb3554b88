use bevy::prelude::*;
use constants::gesture::{DEFAULT_DRAG_JITTER_PX, DEFAULT_LONG_PRESS_DURATION_MS};
use std::time::Duration;

use crate::engine::scene::ObjectId;

/// Fired once when a press is held still for the configured duration.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct LongPressAction {
    /// Object under the press, if the press started on one.
    pub target: Option<ObjectId>,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingPress {
    start_point: Vec2,
    started_at: Duration,
    target: Option<ObjectId>,
}

/// Press-and-hold timer. Movement beyond the jitter radius turns the press
/// into a drag and cancels the timer.
#[derive(Resource, Debug, Clone)]
pub struct LongPressController {
    duration: Duration,
    jitter_px: f32,
    pending: Option<PendingPress>,
}

impl Default for LongPressController {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_LONG_PRESS_DURATION_MS),
            DEFAULT_DRAG_JITTER_PX,
        )
    }
}

impl LongPressController {
    pub fn new(duration: Duration, jitter_px: f32) -> Self {
        Self {
            duration,
            jitter_px,
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start timing a press at `point`. Replaces any earlier pending press.
    pub fn handle_gesture_start(&mut self, point: Vec2, now: Duration, target: Option<ObjectId>) {
        self.pending = Some(PendingPress {
            start_point: point,
            started_at: now,
            target,
        });
    }

    /// Tentatively attach the pending press to an object.
    pub fn attach(&mut self, id: ObjectId) {
        if let Some(pending) = self.pending.as_mut() {
            pending.target = Some(id);
        }
    }

    /// Drop the pending press's target if it is `id` (object removed).
    pub fn detach_if(&mut self, id: ObjectId) {
        if let Some(pending) = self.pending.as_mut() {
            if pending.target == Some(id) {
                pending.target = None;
            }
        }
    }

    /// Returns true when this move cancelled the pending press.
    pub fn handle_gesture_move(&mut self, point: Vec2) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        if point.distance(pending.start_point) > self.jitter_px {
            self.pending = None;
            return true;
        }
        false
    }

    pub fn update(&mut self, now: Duration) -> Option<LongPressAction> {
        let pending = self.pending?;
        if now.saturating_sub(pending.started_at) < self.duration {
            return None;
        }
        self.pending = None;
        Some(LongPressAction {
            target: pending.target,
            position: pending.start_point,
        })
    }

    pub fn handle_gesture_end(&mut self) {
        self.pending = None;
    }

    pub fn handle_gesture_terminate(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const START: Vec2 = Vec2::new(200.0, 300.0);

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn fires_exactly_once_after_duration() {
        let mut controller = LongPressController::default();
        controller.handle_gesture_start(START, ms(1000), Some(ObjectId(4)));

        assert_eq!(controller.update(ms(1499)), None);
        assert_eq!(
            controller.update(ms(1500)),
            Some(LongPressAction {
                target: Some(ObjectId(4)),
                position: START
            })
        );
        assert_eq!(controller.update(ms(2500)), None);
    }

    #[test]
    fn small_moves_within_jitter_keep_the_timer() {
        let mut controller = LongPressController::default();
        controller.handle_gesture_start(START, ms(0), None);
        assert!(!controller.handle_gesture_move(START + Vec2::new(6.0, -7.0)));
        assert!(controller.update(ms(500)).is_some());
    }

    #[test]
    fn end_before_expiry_cancels() {
        let mut controller = LongPressController::default();
        controller.handle_gesture_start(START, ms(0), None);
        controller.handle_gesture_end();
        assert_eq!(controller.update(ms(10_000)), None);

        controller.handle_gesture_start(START, ms(0), None);
        controller.handle_gesture_terminate();
        assert!(!controller.is_pending());
    }

    #[test]
    fn attach_sets_the_target_of_the_pending_press() {
        let mut controller = LongPressController::default();
        controller.attach(ObjectId(1));
        controller.handle_gesture_start(START, ms(0), None);
        controller.attach(ObjectId(9));
        assert_eq!(controller.update(ms(600)).and_then(|a| a.target), Some(ObjectId(9)));
    }

    #[test]
    fn removed_target_fires_without_object() {
        let mut controller = LongPressController::default();
        controller.handle_gesture_start(START, ms(0), Some(ObjectId(2)));
        controller.detach_if(ObjectId(2));
        assert_eq!(controller.update(ms(600)).and_then(|a| a.target), None);
    }

    proptest! {
        #[test]
        fn moves_beyond_jitter_never_fire(
            angle in 0.0f32..std::f32::consts::TAU,
            distance in 10.5f32..400.0,
            move_at in 0u64..500,
            checks in proptest::collection::vec(0u64..5_000, 1..10),
        ) {
            let mut controller = LongPressController::default();
            controller.handle_gesture_start(START, ms(0), Some(ObjectId(1)));
            let _ = controller.update(ms(move_at.saturating_sub(1)));
            controller.handle_gesture_move(START + Vec2::from_angle(angle) * distance);
            for at in checks {
                prop_assert_eq!(controller.update(ms(move_at + at)), None);
            }
        }
    }
}
