//! Damped, driven pendulum integrated in fixed time steps.

use serde::{Deserialize, Serialize};

/// Gravitational acceleration (m/s^2).
pub const GRAVITY: f64 = 9.81;
/// Length of the pendulum (m).
pub const LENGTH: f64 = 1.0;
/// Mass of the bob (kg).
pub const MASS: f64 = 1.0;
/// Angular frequency of the driving force (rad/s).
pub const DRIVE_FREQUENCY: f64 = 3.20;
/// Seconds advanced by a single step.
pub const TIME_STEP: f64 = 0.05;
/// Modulus used to fold the angle back into `(-135°, 135°]`.
pub const WRAP_MODULUS: f64 = 3.0 * std::f64::consts::FRAC_PI_2;

/// Snapshot of the pendulum. Angle is in radians, velocity in rad/s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OscillatorState {
    pub angle: f64,
    pub angular_velocity: f64,
    pub amplitude: f64,
    pub damping: f64,
    pub elapsed_time: f64,
}

/// Single degree of freedom pendulum with a periodic driving force.
///
/// The integrator is deliberately explicit: the acceleration is evaluated
/// from the state at the start of the step, the angle advances with the old
/// velocity, and only then does the velocity pick up the acceleration. The
/// tuned damping constants in [`crate::phase`] depend on this ordering.
#[derive(Debug, Clone, Default)]
pub struct Oscillator {
    state: OscillatorState,
}

impl Oscillator {
    /// Creates a pendulum hanging at rest with no drive and no damping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// # Panics
    /// If `dt` is negative or not finite.
    pub fn step(&mut self, dt: f64) {
        assert!(
            dt.is_finite() && dt >= 0.0,
            "oscillator stepped with invalid dt {dt}"
        );

        self.state.elapsed_time += dt;
        let acceleration = self.angular_acceleration();

        self.state.angle = wrap_angle(self.state.angle + self.state.angular_velocity * dt);
        self.state.angular_velocity += acceleration * dt;
    }

    pub fn set_amplitude(&mut self, amplitude: f64) {
        self.state.amplitude = amplitude;
    }

    pub fn set_damping(&mut self, damping: f64) {
        self.state.damping = damping;
    }

    pub fn angle(&self) -> f64 {
        self.state.angle
    }

    pub fn angular_velocity(&self) -> f64 {
        self.state.angular_velocity
    }

    pub fn amplitude(&self) -> f64 {
        self.state.amplitude
    }

    pub fn damping(&self) -> f64 {
        self.state.damping
    }

    pub fn elapsed_time(&self) -> f64 {
        self.state.elapsed_time
    }

    pub fn state(&self) -> OscillatorState {
        self.state
    }

    fn angular_acceleration(&self) -> f64 {
        let OscillatorState {
            angle,
            angular_velocity,
            amplitude,
            damping,
            elapsed_time,
        } = self.state;
        let inertia = MASS * LENGTH * LENGTH;

        -(GRAVITY / LENGTH) * angle.sin() - (damping / inertia) * angular_velocity
            + (amplitude / inertia) * (DRIVE_FREQUENCY * elapsed_time).cos()
    }
}

/// Folds `angle` into `(-135°, 135°]` with a symmetric remainder.
///
/// The quotient is rounded half-to-even, so the result keeps the sign of the
/// nearest multiple rather than the sign of the input. The lower boundary is
/// moved to the upper one to keep the range half-open.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle - (angle / WRAP_MODULUS).round_ties_even() * WRAP_MODULUS;
    if wrapped <= -WRAP_MODULUS / 2.0 {
        wrapped + WRAP_MODULUS
    } else {
        wrapped
    }
}
