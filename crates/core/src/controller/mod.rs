//! Owns one swing in a world: its objects, its rider and its animation task.

use glam::{DVec3, Mat4};
use serde::{Deserialize, Serialize};

use crate::{
    assembly::AssemblyGroup,
    config::{FulcrumConfig, InteractionConfig, SwingConfig},
    oscillator::OscillatorState,
    phase::{Phase, PhaseController},
    pose::{OrbitFrame, PoseComposer},
    render::{ObjectHandle, ObjectKind, RenderWorld},
    rider::{RiderEvent, SwingSession},
    timeline::{Scheduler, TaskHandle},
    Result, SwingError,
};

/// 16x16 column of the world that is loaded and unloaded as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn containing(position: DVec3) -> Self {
        Self {
            x: (position.x.floor() as i32) >> 4,
            z: (position.z.floor() as i32) >> 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// The swing moved and will tick again.
    Swinging,
    /// The swing came to rest and was put back in its hanging pose.
    Settled,
    /// Objects went missing; the swing was cleared.
    Aborted,
}

/// What one animation tick did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub phase: Phase,
    pub state: OscillatorState,
    pub outcome: TickOutcome,
}

/// Spawns, animates and tears down one tire swing.
#[derive(Debug)]
pub struct SwingController {
    location: DVec3,
    interaction_config: InteractionConfig,
    fulcrum_config: FulcrumConfig,
    still: AssemblyGroup,
    rope: AssemblyGroup,
    rotational: AssemblyGroup,
    interaction: Option<ObjectHandle>,
    fulcrum: Option<ObjectHandle>,
    composer: Option<PoseComposer>,
    session: SwingSession,
    task: Option<TaskHandle>,
    last_report: Option<TickReport>,
}

impl SwingController {
    pub fn new(config: SwingConfig) -> Result<Self> {
        config.validate()?;
        let SwingConfig {
            location,
            interaction,
            fulcrum,
            models,
            ..
        } = config;

        Ok(Self {
            location,
            interaction_config: interaction,
            fulcrum_config: fulcrum,
            still: AssemblyGroup::new("still", models.still),
            rope: AssemblyGroup::new("rope", models.rope),
            rotational: AssemblyGroup::new("rotational", models.rotational),
            interaction: None,
            fulcrum: None,
            composer: None,
            session: SwingSession::new(),
            task: None,
            last_report: None,
        })
    }

    /// Creates every object of the swing and hangs it at rest. A swing that
    /// was already spawned is cleared first.
    pub fn spawn<W: RenderWorld + ?Sized>(&mut self, world: &mut W) -> Result<()> {
        self.clear(world);
        if let Err(err) = self.spawn_objects(world) {
            self.clear(world);
            return Err(err);
        }
        tracing::info!(
            location = ?self.location,
            radius = self.fulcrum_config.radius,
            "spawned tire swing"
        );
        Ok(())
    }

    fn spawn_objects<W: RenderWorld + ?Sized>(&mut self, world: &mut W) -> Result<()> {
        let interaction = &self.interaction_config;
        self.interaction = Some(world.create(
            ObjectKind::Interaction {
                width: interaction.width,
                height: interaction.height,
            },
            Mat4::IDENTITY,
            interaction.location,
        ));

        let fulcrum = &self.fulcrum_config;
        self.fulcrum = Some(world.create(
            ObjectKind::BlockDisplay {
                material: fulcrum.material.clone(),
            },
            fulcrum.transform().to_matrix(),
            fulcrum.location,
        ));

        self.still.spawn(self.location, world);
        self.rope.spawn(self.location, world);
        self.rotational.spawn(self.location, world);

        let pivot = self
            .rotational
            .primary()
            .ok_or_else(|| SwingError::EmptyAssembly(self.rotational.name().to_string()))?
            .handle;
        for member in self.rotational.members().iter().skip(1) {
            world.attach(pivot, member.handle)?;
        }

        let composer = PoseComposer::new(
            OrbitFrame::new(self.location, self.fulcrum_config.radius),
            pivot,
        );
        composer.reset_rotation(&self.rope, &self.rotational, world)?;
        self.composer = Some(composer);
        Ok(())
    }

    /// Removes every object the swing created. Safe to call repeatedly.
    pub fn clear<W: RenderWorld + ?Sized>(&mut self, world: &mut W) {
        self.still.clear(world);
        self.rope.clear(world);
        self.rotational.clear(world);
        for handle in [self.interaction.take(), self.fulcrum.take()].into_iter().flatten() {
            world.remove(handle);
        }
        self.composer = None;
    }

    /// Checks that every model object is still live. If not, the swing is
    /// cleared and any running animation is cancelled.
    pub fn validate<W: RenderWorld + ?Sized>(&mut self, world: &mut W) -> bool {
        let intact = [&self.still, &self.rope, &self.rotational]
            .into_iter()
            .all(|group| group.specs().is_empty() || group.is_intact(&*world));
        if intact {
            return true;
        }

        tracing::warn!("swing objects went missing, clearing");
        self.clear(world);
        self.abort_task();
        false
    }

    /// Respawns the swing when the chunk holding it comes back and the swing
    /// did not survive the unload. Returns whether it respawned.
    pub fn on_chunk_load<W: RenderWorld + ?Sized>(
        &mut self,
        chunk: ChunkPos,
        world: &mut W,
    ) -> Result<bool> {
        if self.validate(world) || chunk != self.chunk() {
            return Ok(false);
        }
        tracing::info!(x = chunk.x, z = chunk.z, "respawning swing in reloaded chunk");
        self.spawn(world)?;
        Ok(true)
    }

    /// Runs one animation tick for the swing task that owns `phase`.
    pub fn advance<W: RenderWorld + ?Sized>(
        &mut self,
        phase: &mut PhaseController,
        world: &mut W,
        task: &TaskHandle,
    ) -> TickReport {
        let outcome = match self.step_swing(phase, world) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(%err, "render write failed mid-swing, clearing");
                self.clear(world);
                self.session.reset();
                TickOutcome::Aborted
            }
        };

        if outcome != TickOutcome::Swinging {
            tracing::debug!(task = task.id().0, ?outcome, "swing task finished");
            self.session.stop_swinging();
            task.cancel();
            self.task = None;
        }

        let report = TickReport {
            tick: phase.tick_count(),
            phase: phase.phase(),
            state: phase.state(),
            outcome,
        };
        tracing::trace!(?report, "swing tick");
        self.last_report = Some(report);
        report
    }

    fn step_swing<W: RenderWorld + ?Sized>(
        &mut self,
        phase: &mut PhaseController,
        world: &mut W,
    ) -> Result<TickOutcome> {
        if !self.validate(world) {
            return Ok(TickOutcome::Aborted);
        }

        phase.update();
        let composer = self.composer.as_ref().ok_or(SwingError::NotSpawned)?;

        if phase.settled() {
            composer.reset_rotation(&self.rope, &self.rotational, world)?;
            tracing::info!(ticks = phase.tick_count(), "swing settled");
            return Ok(TickOutcome::Settled);
        }

        if !self.session.has_passenger() && !phase.is_decelerating() {
            tracing::debug!(tick = phase.tick_count(), "no rider left, slowing down");
            phase.slowdown();
        }

        composer.rotate(phase.angle(), &self.rope, &self.rotational, world)?;
        Ok(TickOutcome::Swinging)
    }

    /// Cancels any running animation and clears the swing.
    pub fn shutdown<W: RenderWorld + ?Sized>(&mut self, world: &mut W) {
        self.abort_task();
        self.clear(world);
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
        self.session.reset();
    }

    pub fn location(&self) -> DVec3 {
        self.location
    }

    pub fn chunk(&self) -> ChunkPos {
        ChunkPos::containing(self.location)
    }

    pub fn session(&self) -> &SwingSession {
        &self.session
    }

    pub fn interaction(&self) -> Option<ObjectHandle> {
        self.interaction
    }

    pub fn fulcrum(&self) -> Option<ObjectHandle> {
        self.fulcrum
    }

    /// The rotational group's primary object, which riders attach to.
    pub fn pivot(&self) -> Option<ObjectHandle> {
        self.composer.as_ref().map(PoseComposer::pivot)
    }

    pub fn composer(&self) -> Option<&PoseComposer> {
        self.composer.as_ref()
    }

    pub fn still(&self) -> &AssemblyGroup {
        &self.still
    }

    pub fn rope(&self) -> &AssemblyGroup {
        &self.rope
    }

    pub fn rotational(&self) -> &AssemblyGroup {
        &self.rotational
    }

    pub fn is_spawned(&self) -> bool {
        self.composer.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_cancelled())
    }

    pub fn last_report(&self) -> Option<TickReport> {
        self.last_report
    }
}

/// A controller together with the world it lives in; the context the
/// swing's repeating task runs against.
#[derive(Debug)]
pub struct Stage<W> {
    pub controller: SwingController,
    pub world: W,
}

impl<W: RenderWorld + 'static> Stage<W> {
    pub fn new(controller: SwingController, world: W) -> Self {
        Self { controller, world }
    }

    pub fn spawn(&mut self) -> Result<()> {
        self.controller.spawn(&mut self.world)
    }

    pub fn on_chunk_load(&mut self, chunk: ChunkPos) -> Result<bool> {
        self.controller.on_chunk_load(chunk, &mut self.world)
    }

    pub fn shutdown(&mut self) {
        self.controller.shutdown(&mut self.world);
    }

    /// Routes a rider event. Events that do not concern this swing are
    /// ignored.
    pub fn handle(&mut self, event: RiderEvent, scheduler: &mut Scheduler<Self>) -> Result<()> {
        match event {
            RiderEvent::Interact { rider, target } => {
                let session = self.controller.session();
                if self.controller.interaction() != Some(target) || !session.can_mount() {
                    tracing::debug!(%rider, %target, "ignoring interaction");
                    return Ok(());
                }
                self.swing(rider, scheduler)
            }
            RiderEvent::Dismount { rider } => {
                if self.controller.session.release(rider) {
                    tracing::info!(%rider, "rider dismounted");
                }
                Ok(())
            }
            RiderEvent::Quit { rider } => {
                if !self.controller.session.is_passenger(rider) {
                    return Ok(());
                }
                if let Some(pivot) = self.controller.pivot() {
                    if self.world.is_valid(pivot) && self.world.is_valid(rider) {
                        self.world.detach(pivot, rider)?;
                    }
                }
                self.controller.session.release(rider);
                tracing::info!(%rider, "rider quit while on the swing");
                Ok(())
            }
        }
    }

    /// Puts `rider` on the swing and starts animating it every tick.
    pub fn swing(&mut self, rider: ObjectHandle, scheduler: &mut Scheduler<Self>) -> Result<()> {
        if !self.controller.session.can_mount() {
            return Err(SwingError::msg("the swing is already in use"));
        }
        let pivot = self.controller.pivot().ok_or(SwingError::NotSpawned)?;
        self.world.attach(pivot, rider)?;
        self.controller.session.mount(rider);

        let mut phase = PhaseController::new();
        let task = scheduler.schedule_repeating(0, 1, move |stage: &mut Self, task| {
            let Stage { controller, world } = stage;
            controller.advance(&mut phase, world, task);
        });
        tracing::info!(%rider, task = task.id().0, "swing started");
        self.controller.task = Some(task);
        Ok(())
    }
}
