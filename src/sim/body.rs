//! Physics bodies and the arena that owns them
//!
//! Bodies are plain data. The integrator and the separation engine mutate
//! them in place every step; game objects refer to them through a
//! [`BodyHandle`], which is also what collision callbacks receive.

use std::ops::{Index, IndexMut};

use glam::Vec2;
use serde::{Deserialize, Deserializer, Serialize};

use super::group::{Group, GroupId};
use super::rect::Rect;
use crate::consts::*;

/// One flag per rectangle edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Edges {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Edges {
    pub const ALL: Edges = Edges {
        up: true,
        down: true,
        left: true,
        right: true,
    };
    pub const NONE: Edges = Edges {
        up: false,
        down: false,
        left: false,
        right: false,
    };

    /// No edge set
    #[inline]
    pub fn none(&self) -> bool {
        !self.any()
    }

    #[inline]
    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

/// A dynamic axis-aligned rectangle with physical state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner
    pub position: Vec2,
    /// Position at the start of the current step
    pub prev_position: Vec2,
    pub width: f32,
    pub height: f32,

    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Deceleration applied while acceleration is zero
    pub drag: Vec2,
    /// Restitution per axis (0 = dead stop, 1 = full rebound)
    pub bounce: Vec2,
    /// Added to world gravity for this body
    pub gravity: Vec2,
    /// Per-axis speed cap; zero falls back to the default cap
    pub max_velocity: Vec2,
    #[serde(deserialize_with = "positive_mass")]
    mass: f32,

    /// Rotation in degrees
    pub rotation: f32,
    pub prev_rotation: f32,
    pub angular_velocity: f32,
    pub angular_acceleration: f32,
    pub angular_drag: f32,
    pub max_angular: f32,

    pub allow_gravity: bool,
    pub allow_rotation: bool,
    /// Integrator advances this body
    pub moves: bool,
    /// Never displaced or given velocity by a collision
    pub immovable: bool,
    /// Owner is alive; non-existing bodies are ignored everywhere
    pub exists: bool,
    /// Clamp into the world bounds after integration
    pub collide_world_bounds: bool,
    pub skip_quad_tree: bool,
    /// Caller resolves X overlaps itself
    pub custom_separate_x: bool,
    /// Caller resolves Y overlaps itself
    pub custom_separate_y: bool,

    /// Edges allowed to take part in separation
    pub allow_collision: Edges,
    /// Edges in contact this step
    pub touching: Edges,
    /// `touching` from the previous step
    pub was_touching: Edges,
    /// Edges stopped by the world bounds or a tile this step
    pub blocked: Edges,
    /// Overlapping another body without either having moved
    pub embedded: bool,
    /// Overlap found by the latest collision test, 0 if none
    pub overlap_x: f32,
    pub overlap_y: f32,

    /// Bounds swept along X only: `(x, prev_y)`
    pub hull_x: Rect,
    /// Bounds swept along Y only: `(prev_x, y)`
    pub hull_y: Rect,

    /// Collection this body belongs to
    pub group: Option<GroupId>,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let position = Vec2::new(x, y);
        let bounds = Rect::new(x, y, width, height);
        Self {
            position,
            prev_position: position,
            width,
            height,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag: Vec2::ZERO,
            bounce: Vec2::ZERO,
            gravity: Vec2::ZERO,
            max_velocity: Vec2::splat(DEFAULT_MAX_VELOCITY),
            mass: 1.0,
            rotation: 0.0,
            prev_rotation: 0.0,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
            angular_drag: 0.0,
            max_angular: DEFAULT_MAX_ANGULAR,
            allow_gravity: true,
            allow_rotation: true,
            moves: true,
            immovable: false,
            exists: true,
            collide_world_bounds: false,
            skip_quad_tree: false,
            custom_separate_x: false,
            custom_separate_y: false,
            allow_collision: Edges::ALL,
            touching: Edges::NONE,
            was_touching: Edges::NONE,
            blocked: Edges::NONE,
            embedded: false,
            overlap_x: 0.0,
            overlap_y: 0.0,
            hull_x: bounds,
            hull_y: bounds,
            group: None,
        }
    }

    /// Same body, made immovable
    pub fn immovable(mut self) -> Self {
        self.immovable = true;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Set the mass; non-positive or NaN values are raised to the smallest positive mass
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = clamp_mass(mass);
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.update_hulls();
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    #[inline]
    pub fn prev_bounds(&self) -> Rect {
        Rect::new(
            self.prev_position.x,
            self.prev_position.y,
            self.width,
            self.height,
        )
    }

    /// Area covered by the body over this step (previous and current bounds)
    pub fn swept_bounds(&self) -> Rect {
        self.prev_bounds().union(&self.bounds())
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.position.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.position.y + self.height
    }

    #[inline]
    pub fn delta_x(&self) -> f32 {
        self.position.x - self.prev_position.x
    }

    #[inline]
    pub fn delta_y(&self) -> f32 {
        self.position.y - self.prev_position.y
    }

    #[inline]
    pub fn delta_abs_x(&self) -> f32 {
        self.delta_x().abs()
    }

    #[inline]
    pub fn delta_abs_y(&self) -> f32 {
        self.delta_y().abs()
    }

    /// Rotation change this step
    #[inline]
    pub fn delta_z(&self) -> f32 {
        self.rotation - self.prev_rotation
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Resting on something below (world floor or a tile top)
    pub fn on_floor(&self) -> bool {
        self.blocked.down
    }

    pub fn on_wall(&self) -> bool {
        self.blocked.left || self.blocked.right
    }

    /// Start-of-step bookkeeping: remember where we were and clear contact state
    pub fn pre_update(&mut self) {
        self.prev_position = self.position;
        self.prev_rotation = self.rotation;
        self.was_touching = self.touching;
        self.blocked = Edges::NONE;
        self.clear_contacts();
    }

    /// Forget the result of the previous collision test
    ///
    /// `blocked` is left alone: it belongs to the whole step.
    pub fn clear_contacts(&mut self) {
        self.touching = Edges::NONE;
        self.embedded = false;
        self.overlap_x = 0.0;
        self.overlap_y = 0.0;
    }

    /// Recompute the per-axis sweep rectangles from the current position
    pub fn update_hulls(&mut self) {
        self.hull_x = Rect::new(
            self.position.x,
            self.prev_position.y,
            self.width,
            self.height,
        );
        self.hull_y = Rect::new(
            self.prev_position.x,
            self.position.y,
            self.width,
            self.height,
        );
    }

    /// Keep the body inside `bounds`, reflecting velocity by bounce on contact
    pub fn check_world_bounds(&mut self, bounds: &Rect) {
        if self.position.x < bounds.x {
            self.position.x = bounds.x;
            self.velocity.x *= -self.bounce.x;
            self.blocked.left = true;
        } else if self.right() > bounds.right() {
            self.position.x = bounds.right() - self.width;
            self.velocity.x *= -self.bounce.x;
            self.blocked.right = true;
        }

        if self.position.y < bounds.y {
            self.position.y = bounds.y;
            self.velocity.y *= -self.bounce.y;
            self.blocked.up = true;
        } else if self.bottom() > bounds.bottom() {
            self.position.y = bounds.bottom() - self.height;
            self.velocity.y *= -self.bounce.y;
            self.blocked.down = true;
        }
    }

    /// Teleport to `(x, y)` and stop all motion
    pub fn reset(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
        self.prev_position = self.position;
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
        self.angular_velocity = 0.0;
        self.angular_acceleration = 0.0;
        self.rotation = 0.0;
        self.prev_rotation = 0.0;
        self.touching = Edges::NONE;
        self.was_touching = Edges::NONE;
        self.blocked = Edges::NONE;
        self.embedded = false;
        self.update_hulls();
    }
}

fn clamp_mass(mass: f32) -> f32 {
    if mass > 0.0 { mass } else { f32::MIN_POSITIVE }
}

fn positive_mass<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    f32::deserialize(deserializer).map(clamp_mass)
}

/// Stable reference to a body in a [`BodySet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(u32);

impl BodyHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena owning every body in the simulation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BodySet {
    bodies: Vec<Body>,
    next_group: u32,
}

impl BodySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: Body) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(body);
        handle
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle.index())
    }

    /// True if the handle refers to a body that still exists
    pub fn exists(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some_and(|b| b.exists)
    }

    /// Two distinct bodies, mutably
    ///
    /// Returns `None` if the handles are equal or either is out of range.
    pub fn pair_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Option<(&mut Body, &mut Body)> {
        let (ia, ib) = (a.index(), b.index());
        if ia == ib || ia >= self.bodies.len() || ib >= self.bodies.len() {
            return None;
        }
        if ia < ib {
            let (lo, hi) = self.bodies.split_at_mut(ib);
            Some((&mut lo[ia], &mut hi[0]))
        } else {
            let (lo, hi) = self.bodies.split_at_mut(ia);
            Some((&mut hi[0], &mut lo[ib]))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, b)| (BodyHandle(i as u32), b))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut Body)> {
        self.bodies
            .iter_mut()
            .enumerate()
            .map(|(i, b)| (BodyHandle(i as u32), b))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Allocate a new, empty collection
    pub fn create_group(&mut self) -> Group {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        Group::new(id)
    }
}

impl Index<BodyHandle> for BodySet {
    type Output = Body;

    fn index(&self, handle: BodyHandle) -> &Body {
        &self.bodies[handle.index()]
    }
}

impl IndexMut<BodyHandle> for BodySet {
    fn index_mut(&mut self, handle: BodyHandle) -> &mut Body {
        &mut self.bodies[handle.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_update_clears_contact_state() {
        let mut body = Body::new(0.0, 0.0, 10.0, 10.0);
        body.touching.right = true;
        body.blocked.down = true;
        body.embedded = true;
        body.position = Vec2::new(5.0, 3.0);

        body.pre_update();

        assert!(body.touching.none());
        assert!(body.blocked.none());
        assert!(!body.embedded);
        assert!(body.was_touching.right);
        assert_eq!(body.prev_position, Vec2::new(5.0, 3.0));
        assert_eq!(body.delta_x(), 0.0);
    }

    #[test]
    fn test_pre_update_clears_stale_overlap() {
        let mut body = Body::new(0.0, 0.0, 10.0, 10.0);
        body.overlap_x = 3.0;
        body.overlap_y = -2.0;

        body.pre_update();

        assert_eq!(body.overlap_x, 0.0);
        assert_eq!(body.overlap_y, 0.0);
    }

    #[test]
    fn test_clear_contacts_keeps_blocked() {
        let mut body = Body::new(0.0, 0.0, 10.0, 10.0);
        body.touching.down = true;
        body.blocked.down = true;
        body.embedded = true;
        body.overlap_y = 1.5;

        body.clear_contacts();

        assert!(body.touching.none());
        assert!(!body.embedded);
        assert_eq!(body.overlap_y, 0.0);
        assert!(body.on_floor());
    }

    #[test]
    fn test_hulls_follow_single_axis() {
        let mut body = Body::new(0.0, 0.0, 10.0, 10.0);
        body.pre_update();
        body.position = Vec2::new(4.0, 7.0);
        body.update_hulls();

        assert_eq!(body.hull_x, Rect::new(4.0, 0.0, 10.0, 10.0));
        assert_eq!(body.hull_y, Rect::new(0.0, 7.0, 10.0, 10.0));
        assert_eq!(body.swept_bounds(), Rect::new(0.0, 0.0, 14.0, 17.0));
    }

    #[test]
    fn test_world_bounds_reflect_with_bounce() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut body = Body::new(95.0, 50.0, 10.0, 10.0).with_velocity(Vec2::new(20.0, 0.0));
        body.bounce = Vec2::new(0.5, 0.0);

        body.check_world_bounds(&bounds);

        assert_eq!(body.position.x, 90.0);
        assert_eq!(body.velocity.x, -10.0);
        assert!(body.blocked.right);
        assert!(body.on_wall());
        assert!(!body.on_floor());
    }

    #[test]
    fn test_mass_stays_positive() {
        let mut body = Body::new(0.0, 0.0, 1.0, 1.0);
        body.set_mass(0.0);
        assert!(body.mass() > 0.0);
        body.set_mass(f32::NAN);
        assert!(body.mass() > 0.0);
        body.set_mass(3.0);
        assert_eq!(body.mass(), 3.0);
    }

    #[test]
    fn test_snapshot_mass_is_clamped_on_load() {
        let mut snapshot = serde_json::to_value(Body::new(0.0, 0.0, 4.0, 4.0)).unwrap();
        snapshot["mass"] = serde_json::json!(0.0);
        let body: Body = serde_json::from_value(snapshot.clone()).unwrap();
        assert!(body.mass() > 0.0);

        snapshot["mass"] = serde_json::json!(-2.5);
        let body: Body = serde_json::from_value(snapshot.clone()).unwrap();
        assert!(body.mass() > 0.0);

        snapshot["mass"] = serde_json::json!(2.5);
        let body: Body = serde_json::from_value(snapshot).unwrap();
        assert_eq!(body.mass(), 2.5);
    }

    #[test]
    fn test_pair_mut_rejects_aliasing() {
        let mut set = BodySet::new();
        let a = set.insert(Body::new(0.0, 0.0, 1.0, 1.0));
        let b = set.insert(Body::new(5.0, 0.0, 1.0, 1.0));

        assert!(set.pair_mut(a, a).is_none());

        let (second, first) = set.pair_mut(b, a).unwrap();
        assert_eq!(second.position.x, 5.0);
        assert_eq!(first.position.x, 0.0);
    }
}
