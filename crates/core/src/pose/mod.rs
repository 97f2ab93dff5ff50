//! Turns the pendulum angle into transforms and a pivot position.

use std::f64::consts::FRAC_PI_2;

use glam::{DVec3, Mat4};

use crate::{
    assembly::{AssemblyGroup, BaseTransform},
    render::{Interpolation, ObjectHandle, RenderWorld},
    Result,
};

/// Angle the swing hangs at when nobody is on it.
pub const REST_ANGLE: f64 = 0.0;

/// Base transform followed by a rotation of `angle` radians about the X axis
/// of the object the piece is rendered on.
pub fn member_pose(base: &BaseTransform, angle: f64) -> Mat4 {
    Mat4::from_rotation_x(angle as f32)
        * Mat4::from_translation(base.translation)
        * Mat4::from_scale(base.scale)
        * Mat4::from_quat(base.left_rotation)
}

/// Vertical circle in the Y/Z plane that the swinging part travels on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitFrame {
    center: DVec3,
    radius: f64,
}

impl OrbitFrame {
    /// # Panics
    /// If `radius` is negative or not finite.
    pub fn new(center: DVec3, radius: f64) -> Self {
        assert!(
            radius.is_finite() && radius >= 0.0,
            "orbit radius must be finite and non-negative, got {radius}"
        );
        Self { center, radius }
    }

    /// Angle on the circle for a pendulum angle; a resting pendulum hangs
    /// straight down.
    pub fn orbit_angle(angle: f64) -> f64 {
        -(angle + FRAC_PI_2)
    }

    pub fn position(&self, angle: f64) -> DVec3 {
        let orbit_angle = Self::orbit_angle(angle);
        let offset = DVec3::new(
            0.0,
            orbit_angle.sin() * self.radius,
            orbit_angle.cos() * self.radius,
        );
        self.center + offset
    }
}

/// Everything written to the world for one angle.
#[derive(Debug, Clone, PartialEq)]
pub struct SwingPose {
    pub angle: f64,
    pub transforms: Vec<(ObjectHandle, Mat4)>,
    pub pivot: ObjectHandle,
    pub pivot_position: DVec3,
}

/// Poses the rope and rotational groups of a spawned swing.
#[derive(Debug, Clone)]
pub struct PoseComposer {
    orbit: OrbitFrame,
    pivot: ObjectHandle,
}

impl PoseComposer {
    /// `pivot` is the rotational group's primary object, the only one that
    /// gets moved; everything else rides along attached to it.
    pub fn new(orbit: OrbitFrame, pivot: ObjectHandle) -> Self {
        Self { orbit, pivot }
    }

    pub fn orbit(&self) -> &OrbitFrame {
        &self.orbit
    }

    pub fn pivot(&self) -> ObjectHandle {
        self.pivot
    }

    pub fn compose(&self, angle: f64, rope: &AssemblyGroup, rotational: &AssemblyGroup) -> SwingPose {
        let transforms = rope
            .members()
            .iter()
            .chain(rotational.members())
            .map(|member| (member.handle, member_pose(&member.transform, angle)))
            .collect();

        SwingPose {
            angle,
            transforms,
            pivot: self.pivot,
            pivot_position: self.orbit.position(angle),
        }
    }

    pub fn apply<W: RenderWorld + ?Sized>(&self, pose: &SwingPose, world: &mut W) -> Result<()> {
        for (handle, transform) in &pose.transforms {
            world.set_transform(*handle, *transform, Interpolation::ONE_TICK)?;
        }
        world.teleport(pose.pivot, pose.pivot_position, true)
    }

    pub fn rotate<W: RenderWorld + ?Sized>(
        &self,
        angle: f64,
        rope: &AssemblyGroup,
        rotational: &AssemblyGroup,
        world: &mut W,
    ) -> Result<()> {
        let pose = self.compose(angle, rope, rotational);
        self.apply(&pose, world)
    }

    /// Puts the swing back into its hanging pose.
    pub fn reset_rotation<W: RenderWorld + ?Sized>(
        &self,
        rope: &AssemblyGroup,
        rotational: &AssemblyGroup,
        world: &mut W,
    ) -> Result<()> {
        self.rotate(REST_ANGLE, rope, rotational, world)
    }
}
