//! Homogeneous body collections (groups, emitters)

use serde::{Deserialize, Serialize};

use super::body::{BodyHandle, BodySet};

/// Identifies a collection; stamped on member bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub(crate) u32);

/// An ordered set of bodies tested together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    id: GroupId,
    members: Vec<BodyHandle>,
    /// A dead group takes part in no collision
    pub exists: bool,
}

impl Group {
    pub(crate) fn new(id: GroupId) -> Self {
        Self {
            id,
            members: Vec::new(),
            exists: true,
        }
    }

    #[inline]
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Add a body, moving it out of any group it was in before
    pub fn add(&mut self, bodies: &mut BodySet, handle: BodyHandle) {
        let Some(body) = bodies.get_mut(handle) else {
            return;
        };
        body.group = Some(self.id);
        if !self.members.contains(&handle) {
            self.members.push(handle);
        }
    }

    pub fn remove(&mut self, bodies: &mut BodySet, handle: BodyHandle) {
        self.members.retain(|&h| h != handle);
        if let Some(body) = bodies.get_mut(handle) {
            if body.group == Some(self.id) {
                body.group = None;
            }
        }
    }

    pub fn members(&self) -> &[BodyHandle] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members whose bodies exist and still belong to this group, in insertion order
    pub fn active_members<'a>(
        &'a self,
        bodies: &'a BodySet,
    ) -> impl Iterator<Item = BodyHandle> + 'a {
        self.members.iter().copied().filter(move |&h| {
            bodies
                .get(h)
                .is_some_and(|b| b.exists && b.group == Some(self.id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Body;

    #[test]
    fn test_membership_is_exclusive() {
        let mut bodies = BodySet::new();
        let mut reds = bodies.create_group();
        let mut blues = bodies.create_group();
        let h = bodies.insert(Body::new(0.0, 0.0, 4.0, 4.0));

        reds.add(&mut bodies, h);
        blues.add(&mut bodies, h);

        assert_eq!(bodies[h].group, Some(blues.id()));
        assert_eq!(reds.active_members(&bodies).count(), 0);
        assert_eq!(blues.active_members(&bodies).count(), 1);
    }

    #[test]
    fn test_active_members_skip_dead_bodies() {
        let mut bodies = BodySet::new();
        let mut group = bodies.create_group();
        let a = bodies.insert(Body::new(0.0, 0.0, 4.0, 4.0));
        let b = bodies.insert(Body::new(10.0, 0.0, 4.0, 4.0));
        group.add(&mut bodies, a);
        group.add(&mut bodies, b);

        bodies[a].exists = false;

        let active: Vec<_> = group.active_members(&bodies).collect();
        assert_eq!(active, vec![b]);

        group.remove(&mut bodies, b);
        assert_eq!(group.len(), 1);
        assert_eq!(bodies[b].group, None);
    }
}
