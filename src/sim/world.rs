//! Physics world: step pipeline and collision dispatch
//!
//! A step is `World::step` (integrate every body, rebuild the quad-tree),
//! followed by any number of `collide` / `overlap` calls made by the game.
//! `collide` picks one of five pairwise strategies from the kinds of its two
//! colliders and feeds every candidate pair through the separation engine.

use super::body::{BodyHandle, BodySet};
use super::group::Group;
use super::integrator;
use super::quadtree::QuadTree;
use super::rect::Rect;
use super::separation::{separate, separate_tile};
use super::tile::{Tile, TileLayer};
use crate::settings::PhysicsConfig;

/// One side of a `collide` / `overlap` call
#[derive(Clone, Copy)]
pub enum Collider<'a> {
    Body(BodyHandle),
    Group(&'a Group),
    TileLayer(&'a dyn TileLayer),
}

impl Collider<'_> {
    fn exists(&self, bodies: &BodySet) -> bool {
        match self {
            Collider::Body(handle) => bodies.exists(*handle),
            Collider::Group(group) => group.exists,
            Collider::TileLayer(layer) => layer.exists(),
        }
    }

    /// Reset contact state of every body on this side before a new test
    fn clear_contacts(&self, bodies: &mut BodySet) {
        match self {
            Collider::Body(handle) => {
                if let Some(body) = bodies.get_mut(*handle) {
                    body.clear_contacts();
                }
            }
            Collider::Group(group) => {
                for &handle in group.members() {
                    if let Some(body) = bodies.get_mut(handle) {
                        if body.exists && body.group == Some(group.id()) {
                            body.clear_contacts();
                        }
                    }
                }
            }
            Collider::TileLayer(_) => {}
        }
    }
}

impl<'a> From<BodyHandle> for Collider<'a> {
    fn from(handle: BodyHandle) -> Self {
        Collider::Body(handle)
    }
}

impl<'a> From<&'a Group> for Collider<'a> {
    fn from(group: &'a Group) -> Self {
        Collider::Group(group)
    }
}

/// What a collision callback is told about each side of a contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    Body(BodyHandle),
    Tile(Tile),
}

/// Notify callback: runs for every accepted contact
pub type OnCollide<'f> = &'f mut dyn FnMut(Contact, Contact);
/// Filter callback: a `false` return drops the contact
pub type ShouldCollide<'f> = &'f mut dyn FnMut(Contact, Contact) -> bool;

struct Callbacks<'f> {
    on_collide: Option<OnCollide<'f>>,
    should_collide: Option<ShouldCollide<'f>>,
}

impl Callbacks<'_> {
    /// Run the filter then the notifier; `swapped` restores caller argument order
    fn accept(&mut self, first: Contact, second: Contact, swapped: bool) -> bool {
        let (a, b) = if swapped {
            (second, first)
        } else {
            (first, second)
        };
        if let Some(filter) = self.should_collide.as_mut() {
            if !filter(a, b) {
                return false;
            }
        }
        if let Some(notify) = self.on_collide.as_mut() {
            notify(a, b);
        }
        true
    }
}

/// Arcade physics manager
#[derive(Debug, Clone)]
pub struct World {
    config: PhysicsConfig,
    quad_tree: QuadTree<BodyHandle>,
    total: u32,
    /// Reused candidate buffer for index queries
    candidates: Vec<BodyHandle>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl World {
    pub fn new(config: PhysicsConfig) -> Self {
        let quad_tree = QuadTree::new(config.bounds, config.max_objects, config.max_levels);
        Self {
            config,
            quad_tree,
            total: 0,
            candidates: Vec::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Replace the configuration; takes effect at the next index rebuild
    pub fn set_config(&mut self, config: PhysicsConfig) {
        self.config = config;
    }

    pub fn set_gravity(&mut self, gravity: glam::Vec2) {
        self.config.gravity = gravity;
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.config.bounds = bounds;
    }

    pub fn quad_tree(&self) -> &QuadTree<BodyHandle> {
        &self.quad_tree
    }

    /// Empty the spatial index and re-fit it to the configured bounds
    pub fn reset_index(&mut self) {
        self.quad_tree.reset(
            self.config.bounds,
            self.config.max_objects,
            self.config.max_levels,
        );
    }

    /// Add a body to this step's spatial index
    pub fn register(&mut self, bodies: &BodySet, handle: BodyHandle) {
        if let Some(body) = bodies.get(handle) {
            if body.exists && !body.skip_quad_tree {
                self.quad_tree.insert(handle, body.bounds());
            }
        }
    }

    /// Advance every body one step and rebuild the spatial index
    pub fn step(&mut self, bodies: &mut BodySet) {
        self.reset_index();

        for (handle, body) in bodies.iter_mut() {
            if !body.exists {
                continue;
            }
            body.pre_update();
            if body.moves {
                integrator::update_motion(body, &self.config);
            }
            if body.collide_world_bounds {
                body.check_world_bounds(&self.config.bounds);
            }
            body.update_hulls();
            if !body.skip_quad_tree {
                self.quad_tree.insert(handle, body.bounds());
            }
        }

        log::trace!(
            "Step: {} bodies indexed, quad-tree depth {}",
            self.quad_tree.len(),
            self.quad_tree.depth()
        );
    }

    /// True if both colliders exist and any of their rectangles intersect
    ///
    /// Never separates, never runs callbacks, never mutates.
    pub fn overlap<'a>(
        &self,
        bodies: &BodySet,
        a: impl Into<Collider<'a>>,
        b: impl Into<Collider<'a>>,
    ) -> bool {
        let (a, b) = (a.into(), b.into());
        if !a.exists(bodies) || !b.exists(bodies) {
            return false;
        }

        let bounds = |h: BodyHandle| bodies.get(h).map(|body| body.bounds());
        let body_vs_group = |h: BodyHandle, group: &Group| {
            bounds(h).is_some_and(|r| {
                group
                    .active_members(bodies)
                    .any(|m| m != h && bodies[m].bounds().intersects(&r))
            })
        };
        let body_vs_layer = |h: BodyHandle, layer: &dyn TileLayer| {
            bounds(h).is_some_and(|r| {
                layer
                    .get_tiles(r, true)
                    .iter()
                    .skip(1)
                    .any(|t| t.collides() && t.bounds.intersects(&r))
            })
        };

        match (a, b) {
            (Collider::Body(h1), Collider::Body(h2)) => match (bounds(h1), bounds(h2)) {
                (Some(r1), Some(r2)) => h1 != h2 && r1.intersects(&r2),
                _ => false,
            },
            (Collider::Body(h), Collider::Group(g)) | (Collider::Group(g), Collider::Body(h)) => {
                body_vs_group(h, g)
            }
            (Collider::Group(g1), Collider::Group(g2)) => {
                g1.active_members(bodies).any(|m| body_vs_group(m, g2))
            }
            (Collider::Body(h), Collider::TileLayer(l))
            | (Collider::TileLayer(l), Collider::Body(h)) => body_vs_layer(h, l),
            (Collider::Group(g), Collider::TileLayer(l))
            | (Collider::TileLayer(l), Collider::Group(g)) => {
                g.active_members(bodies).any(|m| body_vs_layer(m, l))
            }
            (Collider::TileLayer(_), Collider::TileLayer(_)) => false,
        }
    }

    /// Separate everything in `a` from everything in `b`
    pub fn collide<'a>(
        &mut self,
        bodies: &mut BodySet,
        a: impl Into<Collider<'a>>,
        b: impl Into<Collider<'a>>,
    ) -> bool {
        self.collide_with(bodies, a, b, None, None)
    }

    /// Separate everything in `a` from everything in `b`, with callbacks
    ///
    /// `touching`, `embedded` and the overlaps of every body involved are
    /// reset first, so they describe this call only. `should_collide` runs
    /// after a pair has separated and can veto the contact; `on_collide`
    /// runs for each accepted contact. Both receive the two sides in the
    /// order `a`, `b` were given. Returns true if any contact was accepted.
    pub fn collide_with<'a, 'f>(
        &mut self,
        bodies: &mut BodySet,
        a: impl Into<Collider<'a>>,
        b: impl Into<Collider<'a>>,
        on_collide: Option<OnCollide<'f>>,
        should_collide: Option<ShouldCollide<'f>>,
    ) -> bool {
        let (a, b) = (a.into(), b.into());
        self.total = 0;

        if !a.exists(bodies) || !b.exists(bodies) {
            return false;
        }
        a.clear_contacts(bodies);
        b.clear_contacts(bodies);

        let mut callbacks = Callbacks {
            on_collide,
            should_collide,
        };

        match (a, b) {
            (Collider::Body(h1), Collider::Body(h2)) => {
                self.collide_body_vs_body(bodies, h1, h2, false, &mut callbacks)
            }
            (Collider::Body(h), Collider::Group(g)) => {
                self.collide_body_vs_group(bodies, h, g, false, &mut callbacks)
            }
            (Collider::Group(g), Collider::Body(h)) => {
                self.collide_body_vs_group(bodies, h, g, true, &mut callbacks)
            }
            (Collider::Group(g1), Collider::Group(g2)) => {
                if g1.id() == g2.id() {
                    self.collide_group_vs_self_inner(bodies, g1, &mut callbacks);
                } else {
                    self.collide_group_vs_group(bodies, g1, g2, &mut callbacks);
                }
            }
            (Collider::Body(h), Collider::TileLayer(l)) => {
                self.collide_body_vs_layer(bodies, h, l, false, &mut callbacks)
            }
            (Collider::TileLayer(l), Collider::Body(h)) => {
                self.collide_body_vs_layer(bodies, h, l, true, &mut callbacks)
            }
            (Collider::Group(g), Collider::TileLayer(l)) => {
                self.collide_group_vs_layer(bodies, g, l, false, &mut callbacks)
            }
            (Collider::TileLayer(l), Collider::Group(g)) => {
                self.collide_group_vs_layer(bodies, g, l, true, &mut callbacks)
            }
            (Collider::TileLayer(_), Collider::TileLayer(_)) => {}
        }

        log::debug!("collide: {} contacts", self.total);
        self.total > 0
    }

    /// Separate every pair of active members of one group, each pair once
    pub fn collide_group_vs_self<'f>(
        &mut self,
        bodies: &mut BodySet,
        group: &Group,
        on_collide: Option<OnCollide<'f>>,
        should_collide: Option<ShouldCollide<'f>>,
    ) -> bool {
        self.total = 0;
        if !group.exists {
            return false;
        }
        Collider::Group(group).clear_contacts(bodies);
        let mut callbacks = Callbacks {
            on_collide,
            should_collide,
        };
        self.collide_group_vs_self_inner(bodies, group, &mut callbacks);
        self.total > 0
    }

    fn collide_body_vs_body(
        &mut self,
        bodies: &mut BodySet,
        h1: BodyHandle,
        h2: BodyHandle,
        swapped: bool,
        callbacks: &mut Callbacks<'_>,
    ) {
        let bias = self.config.overlap_bias;
        let Some((b1, b2)) = bodies.pair_mut(h1, h2) else {
            return;
        };
        if !b1.exists || !b2.exists {
            return;
        }
        if separate(b1, b2, bias)
            && callbacks.accept(Contact::Body(h1), Contact::Body(h2), swapped)
        {
            self.total += 1;
        }
    }

    /// Test one body against the members of `group` found by the spatial index
    ///
    /// The index holds bodies from every collection, so candidates are
    /// filtered by membership after the query.
    fn collide_body_vs_group(
        &mut self,
        bodies: &mut BodySet,
        handle: BodyHandle,
        group: &Group,
        swapped: bool,
        callbacks: &mut Callbacks<'_>,
    ) {
        if group.is_empty() {
            return;
        }
        let Some(bounds) = bodies.get(handle).map(|b| b.bounds()) else {
            return;
        };

        let mut candidates = std::mem::take(&mut self.candidates);
        candidates.clear();
        self.quad_tree.retrieve_into(&bounds, &mut candidates);

        for &other in &candidates {
            if other == handle {
                continue;
            }
            let member = bodies
                .get(other)
                .is_some_and(|b| b.exists && b.group == Some(group.id()));
            if member {
                self.collide_body_vs_body(bodies, handle, other, swapped, callbacks);
            }
        }

        self.candidates = candidates;
    }

    fn collide_group_vs_group(
        &mut self,
        bodies: &mut BodySet,
        g1: &Group,
        g2: &Group,
        callbacks: &mut Callbacks<'_>,
    ) {
        if g1.is_empty() {
            return;
        }
        for &handle in g1.members() {
            if bodies.exists(handle) && bodies[handle].group == Some(g1.id()) {
                self.collide_body_vs_group(bodies, handle, g2, false, callbacks);
            }
        }
    }

    fn collide_group_vs_self_inner(
        &mut self,
        bodies: &mut BodySet,
        group: &Group,
        callbacks: &mut Callbacks<'_>,
    ) {
        let members: Vec<BodyHandle> = group.active_members(bodies).collect();
        for (i, &h1) in members.iter().enumerate() {
            for &h2 in &members[i + 1..] {
                self.collide_body_vs_body(bodies, h1, h2, false, callbacks);
            }
        }
    }

    /// Test a body against every tile under its swept rectangle
    fn collide_body_vs_layer(
        &mut self,
        bodies: &mut BodySet,
        handle: BodyHandle,
        layer: &dyn TileLayer,
        swapped: bool,
        callbacks: &mut Callbacks<'_>,
    ) {
        let bias = self.config.overlap_bias;
        let Some(body) = bodies.get_mut(handle) else {
            return;
        };
        if !body.exists {
            return;
        }
        // Earlier body-vs-body separation may have moved it since the step began
        body.update_hulls();

        // First entry is the layer sentinel, not a tile
        let tiles = layer.get_tiles(body.swept_bounds(), true);
        for tile in tiles.iter().skip(1) {
            if separate_tile(body, tile, bias, true)
                && callbacks.accept(Contact::Body(handle), Contact::Tile(*tile), swapped)
            {
                self.total += 1;
            }
        }
    }

    fn collide_group_vs_layer(
        &mut self,
        bodies: &mut BodySet,
        group: &Group,
        layer: &dyn TileLayer,
        swapped: bool,
        callbacks: &mut Callbacks<'_>,
    ) {
        for &handle in group.members() {
            if bodies.exists(handle) && bodies[handle].group == Some(group.id()) {
                self.collide_body_vs_layer(bodies, handle, layer, swapped, callbacks);
            }
        }
    }
}
