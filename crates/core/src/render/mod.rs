//! Render-object capabilities consumed by the swing, plus an in-memory world.

use std::{collections::HashMap, fmt};

use glam::{DVec3, Mat4};
use serde::{Deserialize, Serialize};

use crate::{Result, SwingError};

/// Opaque reference to an object living in a [`RenderWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectHandle(pub u64);

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the host should create for a handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Model piece rendered from an item, optionally with a custom texture.
    ItemDisplay { texture: Option<String> },
    /// Static block prop, used for the fulcrum.
    BlockDisplay { material: String },
    /// Invisible hitbox riders interact with.
    Interaction { width: f32, height: f32 },
    /// Something the swing did not create, such as a rider.
    Actor,
}

/// Client-side smoothing applied to a transform change, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpolation {
    pub delay: u32,
    pub duration: u32,
}

impl Interpolation {
    /// Blend over the next tick, starting immediately.
    pub const ONE_TICK: Self = Self {
        delay: 0,
        duration: 1,
    };
}

/// Capabilities the swing needs from the host world.
pub trait RenderWorld {
    fn create(&mut self, kind: ObjectKind, transform: Mat4, position: DVec3) -> ObjectHandle;

    /// Removes the object. Unknown or already removed handles are ignored.
    fn remove(&mut self, handle: ObjectHandle);

    fn is_valid(&self, handle: ObjectHandle) -> bool;

    fn set_transform(
        &mut self,
        handle: ObjectHandle,
        transform: Mat4,
        interpolation: Interpolation,
    ) -> Result<()>;

    /// Moves the object instantly. With `retain_attachments` the attached
    /// children travel along; otherwise they are dropped off first.
    fn teleport(
        &mut self,
        handle: ObjectHandle,
        position: DVec3,
        retain_attachments: bool,
    ) -> Result<()>;

    fn attach(&mut self, parent: ObjectHandle, child: ObjectHandle) -> Result<()>;

    fn detach(&mut self, parent: ObjectHandle, child: ObjectHandle) -> Result<()>;
}

/// State of one object held by [`HeadlessWorld`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessObject {
    pub kind: ObjectKind,
    pub transform: Mat4,
    pub interpolation: Option<Interpolation>,
    pub position: DVec3,
    pub parent: Option<ObjectHandle>,
    pub children: Vec<ObjectHandle>,
}

/// Every mutation the swing performed on a [`HeadlessWorld`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldWrite {
    Transform {
        handle: ObjectHandle,
        transform: Mat4,
        interpolation: Interpolation,
    },
    Teleport {
        handle: ObjectHandle,
        position: DVec3,
    },
}

/// In-memory [`RenderWorld`] used by the command line driver and the tests.
/// Handles are never reused.
#[derive(Debug, Default)]
pub struct HeadlessWorld {
    objects: HashMap<ObjectHandle, HeadlessObject>,
    next_id: u64,
    writes: Vec<WorldWrite>,
}

impl HeadlessWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object the swing does not own, e.g. a rider.
    pub fn spawn_actor(&mut self, position: DVec3) -> ObjectHandle {
        self.insert(ObjectKind::Actor, Mat4::IDENTITY, position)
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&HeadlessObject> {
        self.objects.get(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.objects.len()
    }

    /// Objects of the given kind, sorted by handle.
    pub fn handles_where(&self, predicate: impl Fn(&ObjectKind) -> bool) -> Vec<ObjectHandle> {
        let mut handles: Vec<_> = self
            .objects
            .iter()
            .filter(|(_, object)| predicate(&object.kind))
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort();
        handles
    }

    pub fn writes(&self) -> &[WorldWrite] {
        &self.writes
    }

    pub fn take_writes(&mut self) -> Vec<WorldWrite> {
        std::mem::take(&mut self.writes)
    }

    fn insert(&mut self, kind: ObjectKind, transform: Mat4, position: DVec3) -> ObjectHandle {
        self.next_id += 1;
        let handle = ObjectHandle(self.next_id);
        self.objects.insert(
            handle,
            HeadlessObject {
                kind,
                transform,
                interpolation: None,
                position,
                parent: None,
                children: Vec::new(),
            },
        );
        handle
    }

    fn live_mut(&mut self, handle: ObjectHandle) -> Result<&mut HeadlessObject> {
        self.objects
            .get_mut(&handle)
            .ok_or(SwingError::InvalidHandle(handle))
    }

    /// Whether `ancestor` appears on `handle`'s parent chain, `handle` included.
    fn has_ancestor(&self, handle: ObjectHandle, ancestor: ObjectHandle) -> bool {
        let mut current = Some(handle);
        while let Some(next) = current {
            if next == ancestor {
                return true;
            }
            current = self.objects.get(&next).and_then(|object| object.parent);
        }
        false
    }

    fn move_subtree(&mut self, handle: ObjectHandle, position: DVec3) {
        let children = match self.objects.get_mut(&handle) {
            Some(object) => {
                object.position = position;
                object.children.clone()
            }
            None => return,
        };
        for child in children {
            self.move_subtree(child, position);
        }
    }
}

impl RenderWorld for HeadlessWorld {
    fn create(&mut self, kind: ObjectKind, transform: Mat4, position: DVec3) -> ObjectHandle {
        self.insert(kind, transform, position)
    }

    fn remove(&mut self, handle: ObjectHandle) {
        let Some(object) = self.objects.remove(&handle) else {
            return;
        };
        if let Some(parent) = object.parent.and_then(|parent| self.objects.get_mut(&parent)) {
            parent.children.retain(|child| *child != handle);
        }
        for child in object.children {
            if let Some(child) = self.objects.get_mut(&child) {
                child.parent = None;
            }
        }
    }

    fn is_valid(&self, handle: ObjectHandle) -> bool {
        self.objects.contains_key(&handle)
    }

    fn set_transform(
        &mut self,
        handle: ObjectHandle,
        transform: Mat4,
        interpolation: Interpolation,
    ) -> Result<()> {
        let object = self.live_mut(handle)?;
        object.transform = transform;
        object.interpolation = Some(interpolation);
        self.writes.push(WorldWrite::Transform {
            handle,
            transform,
            interpolation,
        });
        Ok(())
    }

    fn teleport(
        &mut self,
        handle: ObjectHandle,
        position: DVec3,
        retain_attachments: bool,
    ) -> Result<()> {
        let children = self.live_mut(handle)?.children.clone();
        if !retain_attachments {
            for child in children {
                self.detach(handle, child)?;
            }
        }
        self.move_subtree(handle, position);
        self.writes.push(WorldWrite::Teleport { handle, position });
        Ok(())
    }

    fn attach(&mut self, parent: ObjectHandle, child: ObjectHandle) -> Result<()> {
        let previous = self.live_mut(child)?.parent;
        let parent_position = self.live_mut(parent)?.position;
        if self.has_ancestor(parent, child) {
            return Err(SwingError::msg(format!(
                "cannot attach {child} below its own descendant {parent}"
            )));
        }
        if let Some(previous) = previous {
            self.detach(previous, child)?;
        }

        let parent_object = self.live_mut(parent)?;
        if !parent_object.children.contains(&child) {
            parent_object.children.push(child);
        }
        self.live_mut(child)?.parent = Some(parent);
        self.move_subtree(child, parent_position);
        Ok(())
    }

    fn detach(&mut self, parent: ObjectHandle, child: ObjectHandle) -> Result<()> {
        self.live_mut(parent)?.children.retain(|c| *c != child);
        let child_object = self.live_mut(child)?;
        if child_object.parent == Some(parent) {
            child_object.parent = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(world: &mut HeadlessWorld, position: DVec3) -> ObjectHandle {
        world.create(
            ObjectKind::ItemDisplay { texture: None },
            Mat4::IDENTITY,
            position,
        )
    }

    #[test]
    fn handles_are_never_reused() {
        let mut world = HeadlessWorld::new();
        let first = display(&mut world, DVec3::ZERO);
        world.remove(first);
        let second = display(&mut world, DVec3::ZERO);

        assert_ne!(first, second);
        assert!(!world.is_valid(first));
        assert!(world.is_valid(second));
    }

    #[test]
    fn writes_to_removed_objects_fail() {
        let mut world = HeadlessWorld::new();
        let handle = display(&mut world, DVec3::ZERO);
        world.remove(handle);

        let err = world
            .set_transform(handle, Mat4::IDENTITY, Interpolation::ONE_TICK)
            .unwrap_err();
        assert!(matches!(err, SwingError::InvalidHandle(h) if h == handle));
        assert!(world.teleport(handle, DVec3::ONE, true).is_err());
        assert!(world.writes().is_empty());
    }

    #[test]
    fn teleport_carries_attached_children() {
        let mut world = HeadlessWorld::new();
        let parent = display(&mut world, DVec3::ZERO);
        let child = display(&mut world, DVec3::new(5.0, 5.0, 5.0));
        let rider = world.spawn_actor(DVec3::new(9.0, 0.0, 0.0));
        world.attach(parent, child).unwrap();
        world.attach(parent, rider).unwrap();

        let target = DVec3::new(1.0, 2.0, 3.0);
        world.teleport(parent, target, true).unwrap();

        assert_eq!(world.object(child).unwrap().position, target);
        assert_eq!(world.object(rider).unwrap().position, target);
        assert_eq!(world.object(parent).unwrap().children, vec![child, rider]);
        assert_eq!(world.writes().len(), 1);
    }

    #[test]
    fn teleport_without_retain_drops_children() {
        let mut world = HeadlessWorld::new();
        let parent = display(&mut world, DVec3::ZERO);
        let child = display(&mut world, DVec3::ZERO);
        world.attach(parent, child).unwrap();

        world.teleport(parent, DVec3::ONE, false).unwrap();

        assert!(world.object(parent).unwrap().children.is_empty());
        assert_eq!(world.object(child).unwrap().parent, None);
        assert_eq!(world.object(child).unwrap().position, DVec3::ZERO);
    }

    #[test]
    fn removing_a_parent_frees_its_children() {
        let mut world = HeadlessWorld::new();
        let parent = display(&mut world, DVec3::ZERO);
        let child = display(&mut world, DVec3::ZERO);
        world.attach(parent, child).unwrap();

        world.remove(parent);
        world.remove(parent);

        assert_eq!(world.object(child).unwrap().parent, None);
        assert_eq!(world.live_count(), 1);
    }

    #[test]
    fn reattaching_moves_child_between_parents() {
        let mut world = HeadlessWorld::new();
        let first = display(&mut world, DVec3::ZERO);
        let second = display(&mut world, DVec3::ONE);
        let child = display(&mut world, DVec3::ZERO);

        world.attach(first, child).unwrap();
        world.attach(second, child).unwrap();

        assert!(world.object(first).unwrap().children.is_empty());
        assert_eq!(world.object(second).unwrap().children, vec![child]);
        assert_eq!(world.object(child).unwrap().position, DVec3::ONE);
        assert!(world.attach(child, child).is_err());
    }

    #[test]
    fn reattaching_an_ancestor_is_rejected() {
        let mut world = HeadlessWorld::new();
        let root = display(&mut world, DVec3::ZERO);
        let middle = display(&mut world, DVec3::ONE);
        let leaf = display(&mut world, DVec3::ONE);
        world.attach(root, middle).unwrap();
        world.attach(middle, leaf).unwrap();

        assert!(world.attach(middle, root).is_err());
        assert!(world.attach(leaf, root).is_err());
        assert_eq!(world.object(root).unwrap().parent, None);
        assert_eq!(world.object(root).unwrap().children, vec![middle]);

        world.teleport(root, DVec3::splat(2.0), true).unwrap();
        assert_eq!(world.object(leaf).unwrap().position, DVec3::splat(2.0));
    }
}
