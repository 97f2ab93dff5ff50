//! Core library for the tire swing.
//!
//! A swing is a driven, damped pendulum whose angle is turned into poses for
//! a handful of display objects every tick. The modules follow that pipeline
//! from the bottom up: the [`oscillator`] integrates the pendulum, [`phase`]
//! decides how hard it is pushed or braked, [`pose`] turns the angle into
//! transforms and an orbit position, and [`assembly`] owns the objects being
//! posed. [`controller`] ties them to a [`render::RenderWorld`], rider events
//! and a [`timeline::Scheduler`] task.

pub mod assembly;
pub mod config;
pub mod controller;
pub mod error;
pub mod oscillator;
pub mod phase;
pub mod pose;
pub mod render;
pub mod rider;
pub mod timeline;

pub use assembly::{AssemblyGroup, AssemblyMember, BaseTransform, MemberSpec};
pub use config::{FulcrumConfig, InteractionConfig, ModelSet, SwingConfig};
pub use controller::{ChunkPos, Stage, SwingController, TickOutcome, TickReport};
pub use error::{Result, SwingError};
pub use oscillator::{Oscillator, OscillatorState};
pub use phase::{Phase, PhaseController};
pub use pose::{OrbitFrame, PoseComposer, SwingPose};
pub use render::{HeadlessWorld, Interpolation, ObjectHandle, ObjectKind, RenderWorld, WorldWrite};
pub use rider::{RiderEvent, SwingSession};
pub use timeline::{Scheduler, TaskHandle, TaskId};
