use std::path::Path;

use glam::{DVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    assembly::{BaseTransform, MemberSpec},
    Result, SwingError,
};

/// Everything needed to place one swing in a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingConfig {
    pub world: String,
    /// Spawn point of the models and center of the swing's orbit.
    pub location: DVec3,
    pub interaction: InteractionConfig,
    pub fulcrum: FulcrumConfig,
    pub models: ModelSet,
}

/// Invisible hitbox riders click to get on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionConfig {
    pub location: DVec3,
    pub width: f32,
    pub height: f32,
}

/// The block the swing hangs from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulcrumConfig {
    pub location: DVec3,
    pub material: String,
    #[serde(default)]
    pub left_rotation: Quat,
    #[serde(default)]
    pub right_rotation: Quat,
    /// Distance from the swing location to the swinging part.
    pub radius: f64,
}

impl FulcrumConfig {
    /// The fulcrum is never translated or scaled, only rotated.
    pub fn transform(&self) -> BaseTransform {
        BaseTransform {
            left_rotation: self.left_rotation,
            right_rotation: self.right_rotation,
            ..BaseTransform::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelSet {
    /// Seat pieces; the first becomes the pivot the others attach to.
    pub rotational: Vec<MemberSpec>,
    #[serde(default)]
    pub rope: Vec<MemberSpec>,
    #[serde(default)]
    pub still: Vec<MemberSpec>,
}

impl Default for SwingConfig {
    fn default() -> Self {
        let location = DVec3::new(0.5, 68.0, 0.5);
        let tire = |translation: Vec3, yaw: f32| MemberSpec {
            texture: Some("tire".to_string()),
            transform: BaseTransform {
                translation,
                left_rotation: Quat::from_rotation_y(yaw),
                scale: Vec3::splat(0.6),
                right_rotation: Quat::IDENTITY,
            },
        };
        let rope = |depth: f32| MemberSpec {
            texture: Some("rope".to_string()),
            transform: BaseTransform {
                translation: Vec3::new(0.0, -depth, 0.0),
                scale: Vec3::new(0.1, 0.5, 0.1),
                ..BaseTransform::default()
            },
        };

        Self {
            world: "world".to_string(),
            location,
            interaction: InteractionConfig {
                location: location - DVec3::new(0.0, 3.0, 0.0),
                width: 1.2,
                height: 0.8,
            },
            fulcrum: FulcrumConfig {
                location: location + DVec3::new(-1.5, 0.0, 0.0),
                material: "oak_log".to_string(),
                left_rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                right_rotation: Quat::IDENTITY,
                radius: 2.5,
            },
            models: ModelSet {
                rotational: vec![
                    tire(Vec3::ZERO, 0.0),
                    tire(Vec3::new(0.3, 0.0, 0.0), std::f32::consts::FRAC_PI_4),
                    tire(Vec3::new(-0.3, 0.0, 0.0), -std::f32::consts::FRAC_PI_4),
                ],
                rope: vec![rope(0.5), rope(1.0), rope(1.5), rope(2.0)],
                still: vec![MemberSpec {
                    texture: Some("knot".to_string()),
                    transform: BaseTransform::from_translation(Vec3::new(0.0, 0.1, 0.0)),
                }],
            },
        }
    }
}

impl SwingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.world.trim().is_empty() {
            return Err(SwingError::config("world name is empty"));
        }
        if !self.location.is_finite() {
            return Err(SwingError::config("swing location is not finite"));
        }
        if self.fulcrum.material.trim().is_empty() {
            return Err(SwingError::config("fulcrum material is empty"));
        }
        if !self.fulcrum.radius.is_finite() || self.fulcrum.radius < 0.0 {
            return Err(SwingError::config(format!(
                "fulcrum radius must be a non-negative number, got {}",
                self.fulcrum.radius
            )));
        }
        if !(self.interaction.width > 0.0 && self.interaction.height > 0.0) {
            return Err(SwingError::config(format!(
                "interaction hitbox must have a positive size, got {}x{}",
                self.interaction.width, self.interaction.height
            )));
        }
        if self.models.rotational.is_empty() {
            return Err(SwingError::EmptyAssembly("rotational".to_string()));
        }
        Ok(())
    }
}
