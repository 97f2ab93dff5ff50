use glam::{DVec3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::render::{ObjectHandle, ObjectKind, RenderWorld};

/// Static placement of a model piece relative to the object it is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseTransform {
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default)]
    pub left_rotation: Quat,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub right_rotation: Quat,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl Default for BaseTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            left_rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            right_rotation: Quat::IDENTITY,
        }
    }
}

impl BaseTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// Matrix used when the piece is first created: translate, rotate left,
    /// scale, rotate right.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
            * Mat4::from_quat(self.left_rotation)
            * Mat4::from_scale(self.scale)
            * Mat4::from_quat(self.right_rotation)
    }
}

/// Description of one piece a group spawns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(flatten)]
    pub transform: BaseTransform,
}

impl MemberSpec {
    pub fn new(transform: BaseTransform) -> Self {
        Self {
            texture: None,
            transform,
        }
    }

    fn kind(&self) -> ObjectKind {
        ObjectKind::ItemDisplay {
            texture: self.texture.clone(),
        }
    }
}

/// A spawned piece: its base transform and the render object carrying it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyMember {
    pub transform: BaseTransform,
    pub handle: ObjectHandle,
}

/// Named set of model pieces spawned and torn down together.
#[derive(Debug, Clone)]
pub struct AssemblyGroup {
    name: String,
    specs: Vec<MemberSpec>,
    members: Vec<AssemblyMember>,
}

impl AssemblyGroup {
    pub fn new(name: impl Into<String>, specs: Vec<MemberSpec>) -> Self {
        Self {
            name: name.into(),
            specs,
            members: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn specs(&self) -> &[MemberSpec] {
        &self.specs
    }

    pub fn members(&self) -> &[AssemblyMember] {
        &self.members
    }

    /// The first spawned piece; the rest of the group hangs off it.
    pub fn primary(&self) -> Option<&AssemblyMember> {
        self.members.first()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Creates one object per spec at `origin`. Anything spawned earlier is
    /// cleared first, so every handle is fresh.
    pub fn spawn<W: RenderWorld + ?Sized>(&mut self, origin: DVec3, world: &mut W) {
        if !self.members.is_empty() {
            self.clear(world);
        }

        self.members = self
            .specs
            .iter()
            .map(|spec| AssemblyMember {
                transform: spec.transform,
                handle: world.create(spec.kind(), spec.transform.to_matrix(), origin),
            })
            .collect();
        tracing::debug!(group = %self.name, members = self.members.len(), "spawned model group");
    }

    /// Removes every object and empties the group. Safe to call repeatedly.
    pub fn clear<W: RenderWorld + ?Sized>(&mut self, world: &mut W) {
        if self.members.is_empty() {
            return;
        }
        for member in self.members.drain(..) {
            world.remove(member.handle);
        }
        tracing::debug!(group = %self.name, "cleared model group");
    }

    /// True when the group is spawned and every object is still live.
    pub fn is_intact<W: RenderWorld + ?Sized>(&self, world: &W) -> bool {
        !self.members.is_empty() && self.members.iter().all(|m| world.is_valid(m.handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessWorld;

    fn group(count: usize) -> AssemblyGroup {
        let specs = (0..count)
            .map(|i| MemberSpec::new(BaseTransform::from_translation(Vec3::new(0.0, i as f32, 0.0))))
            .collect();
        AssemblyGroup::new("rope", specs)
    }

    #[test]
    fn spawn_creates_one_object_per_spec() {
        let mut world = HeadlessWorld::new();
        let mut rope = group(3);
        let origin = DVec3::new(10.0, 64.0, -3.0);
        rope.spawn(origin, &mut world);

        assert_eq!(rope.len(), 3);
        assert_eq!(world.live_count(), 3);
        for (member, spec) in rope.members().iter().zip(rope.specs()) {
            let object = world.object(member.handle).unwrap();
            assert_eq!(object.position, origin);
            assert_eq!(object.transform, spec.transform.to_matrix());
        }
        assert_eq!(rope.primary().unwrap().handle, rope.members()[0].handle);
    }

    #[test]
    fn respawn_replaces_handles() {
        let mut world = HeadlessWorld::new();
        let mut rope = group(2);
        rope.spawn(DVec3::ZERO, &mut world);
        let first: Vec<_> = rope.members().iter().map(|m| m.handle).collect();

        rope.spawn(DVec3::ZERO, &mut world);
        let second: Vec<_> = rope.members().iter().map(|m| m.handle).collect();

        assert_eq!(world.live_count(), 2);
        assert!(first.iter().all(|h| !second.contains(h)));
    }

    #[test]
    fn clear_is_idempotent() {
        let mut world = HeadlessWorld::new();
        let mut rope = group(2);
        rope.clear(&mut world);
        rope.spawn(DVec3::ZERO, &mut world);

        rope.clear(&mut world);
        rope.clear(&mut world);

        assert!(rope.is_empty());
        assert_eq!(world.live_count(), 0);
    }

    #[test]
    fn removed_member_breaks_integrity() {
        let mut world = HeadlessWorld::new();
        let mut rope = group(3);
        assert!(!rope.is_intact(&world));

        rope.spawn(DVec3::ZERO, &mut world);
        assert!(rope.is_intact(&world));

        let victim = rope.members()[1].handle;
        world.remove(victim);
        assert!(!rope.is_intact(&world));

        rope.clear(&mut world);
        assert!(rope.is_empty());
        assert_eq!(world.live_count(), 0);
    }

    #[test]
    fn empty_group_is_never_intact() {
        let mut world = HeadlessWorld::new();
        let mut empty = group(0);
        empty.spawn(DVec3::ZERO, &mut world);
        assert!(!empty.is_intact(&world));
    }

    #[test]
    fn spawn_matrix_applies_translation_last() {
        let transform = BaseTransform {
            translation: Vec3::new(0.0, 1.0, 0.0),
            left_rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
            right_rotation: Quat::IDENTITY,
        };
        let point = transform.to_matrix().transform_point3(Vec3::X);
        assert!(point.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-6), "{point}");
    }
}
