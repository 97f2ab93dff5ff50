//! Amplitude and damping policy layered on top of the [`Oscillator`].

use serde::{Deserialize, Serialize};

use crate::oscillator::{Oscillator, OscillatorState, TIME_STEP};

/// Number of updates during which the swing is pushed.
pub const ACCELERATION_TICKS: u64 = 30;
/// Driving amplitude applied while accelerating.
pub const ACCELERATION_AMPLITUDE: f64 = 2.0;
/// Damping while a rider keeps the swing going.
pub const NORMAL_DAMPING: f64 = 0.5;
/// Damping once the swing has been told to slow down.
pub const DECELERATION_DAMPING: f64 = 1.2;
/// Angular velocity below which the swing may count as still.
pub const STILL_VELOCITY_THRESHOLD: f64 = 0.5;
/// Angle below which the swing may count as still.
pub const STILL_ANGLE_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Accelerating,
    Driven,
    Decelerating,
}

/// Drives an [`Oscillator`] through the ramp, free swing and slowdown phases.
#[derive(Debug, Clone)]
pub struct PhaseController {
    oscillator: Oscillator,
    phase: Phase,
    tick_count: u64,
    settled: bool,
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseController {
    pub fn new() -> Self {
        Self {
            oscillator: Oscillator::new(),
            phase: Phase::Accelerating,
            tick_count: 0,
            settled: false,
        }
    }

    /// Applies the current phase's policy and steps the oscillator once.
    pub fn update(&mut self) {
        if self.phase != Phase::Decelerating {
            if self.tick_count >= ACCELERATION_TICKS {
                self.phase = Phase::Driven;
                self.oscillator.set_amplitude(0.0);
                self.oscillator.set_damping(NORMAL_DAMPING);
            } else {
                self.oscillator.set_amplitude(ACCELERATION_AMPLITUDE);
            }
        }

        self.oscillator.step(TIME_STEP);
        self.tick_count += 1;

        if !self.settled && self.is_at_rest() {
            self.settled = true;
        }
    }

    /// Removes the drive and raises damping. Calling it again has no effect.
    pub fn slowdown(&mut self) {
        if self.phase == Phase::Decelerating {
            return;
        }
        self.oscillator.set_amplitude(0.0);
        self.oscillator.set_damping(DECELERATION_DAMPING);
        self.phase = Phase::Decelerating;
    }

    /// Whether the swing has come to rest after the acceleration window.
    ///
    /// Latches: once an update observed the rest condition this keeps
    /// returning `true`.
    pub fn settled(&self) -> bool {
        self.settled
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_decelerating(&self) -> bool {
        self.phase == Phase::Decelerating
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn angle(&self) -> f64 {
        self.oscillator.angle()
    }

    pub fn state(&self) -> OscillatorState {
        self.oscillator.state()
    }

    fn is_at_rest(&self) -> bool {
        self.oscillator.angular_velocity().abs() < STILL_VELOCITY_THRESHOLD
            && self.oscillator.angle().abs() < STILL_ANGLE_THRESHOLD
            && self.tick_count >= ACCELERATION_TICKS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramps_then_drives() {
        let mut controller = PhaseController::new();

        for tick in 0..ACCELERATION_TICKS {
            controller.update();
            assert_eq!(controller.phase(), Phase::Accelerating, "tick {tick}");
            assert_eq!(controller.state().amplitude, ACCELERATION_AMPLITUDE);
            assert_eq!(controller.state().damping, 0.0);
        }

        for _ in 0..100 {
            controller.update();
            assert_eq!(controller.phase(), Phase::Driven);
            assert_eq!(controller.state().amplitude, 0.0);
            assert_eq!(controller.state().damping, NORMAL_DAMPING);
        }
        assert_eq!(controller.tick_count(), ACCELERATION_TICKS + 100);
    }

    #[test]
    fn ramp_builds_up_a_swing() {
        let mut controller = PhaseController::new();
        let mut peak: f64 = 0.0;
        for _ in 0..ACCELERATION_TICKS + 40 {
            controller.update();
            peak = peak.max(controller.angle().abs());
        }
        assert!(peak > 0.1, "swing barely moved: {peak}");
        assert!(!controller.settled());
    }

    #[test]
    fn slowdown_during_ramp_overrides_policy() {
        let mut controller = PhaseController::new();
        for _ in 0..10 {
            controller.update();
        }
        controller.slowdown();

        for _ in 0..60 {
            controller.update();
            assert_eq!(controller.phase(), Phase::Decelerating);
            assert_eq!(controller.state().amplitude, 0.0);
            assert_eq!(controller.state().damping, DECELERATION_DAMPING);
        }
    }

    #[test]
    fn slowdown_is_idempotent() {
        let mut controller = PhaseController::new();
        for _ in 0..35 {
            controller.update();
        }
        controller.slowdown();
        let before = controller.state();
        controller.slowdown();
        assert_eq!(controller.state(), before);
        assert!(controller.is_decelerating());
    }

    #[test]
    fn never_settles_inside_acceleration_window() {
        let mut controller = PhaseController::new();
        controller.slowdown();
        // Without drive the pendulum never leaves rest, yet the window holds.
        for _ in 0..ACCELERATION_TICKS - 1 {
            controller.update();
            assert!(!controller.settled());
        }
        controller.update();
        assert!(controller.settled());
    }

    #[test]
    fn rider_dismount_scenario_settles_and_stays_settled() {
        let mut controller = PhaseController::new();

        for _ in 0..ACCELERATION_TICKS {
            controller.update();
        }
        assert_eq!(controller.state().amplitude, ACCELERATION_AMPLITUDE);

        for _ in ACCELERATION_TICKS..40 {
            controller.update();
            assert_eq!(controller.state().amplitude, 0.0);
            assert_eq!(controller.state().damping, NORMAL_DAMPING);
        }
        assert!(!controller.settled());

        controller.slowdown();
        let mut settled_at = None;
        for tick in 40..2_000 {
            controller.update();
            assert_eq!(controller.state().amplitude, 0.0);
            assert_eq!(controller.state().damping, DECELERATION_DAMPING);
            if controller.settled() {
                settled_at = Some(tick);
                break;
            }
        }
        assert_eq!(settled_at, Some(122));
        assert_eq!(controller.tick_count(), 123);

        for _ in 0..200 {
            controller.update();
            assert!(controller.settled());
        }
    }

    #[test]
    fn driven_swing_keeps_moving() {
        let mut controller = PhaseController::new();
        for _ in 0..1_000 {
            controller.update();
        }
        assert!(!controller.settled());
        assert_eq!(controller.phase(), Phase::Driven);
    }
}
