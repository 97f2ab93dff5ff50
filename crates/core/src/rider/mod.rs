use serde::{Deserialize, Serialize};

use crate::render::ObjectHandle;

/// Input from whatever front end captures player actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiderEvent {
    /// `rider` used `target`; mounts when `target` is the swing's hitbox.
    Interact {
        rider: ObjectHandle,
        target: ObjectHandle,
    },
    /// `rider` got off whatever it was riding.
    Dismount { rider: ObjectHandle },
    /// `rider` left the world entirely.
    Quit { rider: ObjectHandle },
}

impl RiderEvent {
    pub fn rider(&self) -> ObjectHandle {
        match self {
            Self::Interact { rider, .. } | Self::Dismount { rider } | Self::Quit { rider } => *rider,
        }
    }
}

/// Who is on the swing and whether it is animating.
///
/// `swinging` outlives the passenger: after a dismount the swing keeps
/// moving until it settles, and nobody can mount in the meantime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwingSession {
    passenger: Option<ObjectHandle>,
    swinging: bool,
}

impl SwingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn passenger(&self) -> Option<ObjectHandle> {
        self.passenger
    }

    pub fn has_passenger(&self) -> bool {
        self.passenger.is_some()
    }

    pub fn is_swinging(&self) -> bool {
        self.swinging
    }

    pub fn is_passenger(&self, rider: ObjectHandle) -> bool {
        self.passenger == Some(rider)
    }

    /// Whether `rider` may start a ride right now.
    pub fn can_mount(&self) -> bool {
        self.passenger.is_none() && !self.swinging
    }

    pub fn mount(&mut self, rider: ObjectHandle) {
        self.passenger = Some(rider);
        self.swinging = true;
    }

    /// Forgets `rider` if it is the passenger. Returns whether it was.
    pub fn release(&mut self, rider: ObjectHandle) -> bool {
        if !self.is_passenger(rider) {
            return false;
        }
        self.passenger = None;
        true
    }

    pub fn stop_swinging(&mut self) {
        self.swinging = false;
    }

    /// Drops both the passenger and the swinging flag.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_and_release() {
        let rider = ObjectHandle(7);
        let mut session = SwingSession::new();
        assert!(session.can_mount());

        session.mount(rider);
        assert!(session.is_passenger(rider));
        assert!(session.is_swinging());
        assert!(!session.can_mount());

        assert!(!session.release(ObjectHandle(8)));
        assert!(session.release(rider));
        assert!(!session.has_passenger());
        // Still moving, so a new rider has to wait.
        assert!(!session.can_mount());

        session.stop_swinging();
        assert!(session.can_mount());
    }

    #[test]
    fn events_expose_their_rider() {
        let rider = ObjectHandle(3);
        let events = [
            RiderEvent::Interact {
                rider,
                target: ObjectHandle(1),
            },
            RiderEvent::Dismount { rider },
            RiderEvent::Quit { rider },
        ];
        assert!(events.iter().all(|event| event.rider() == rider));
    }
}
