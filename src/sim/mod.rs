//! Deterministic physics core
//!
//! Everything that touches body state lives here:
//! - Fixed timestep integration only
//! - Spatial index rebuilt from scratch every step
//! - Stable iteration order (insertion order of bodies and group members)
//! - No rendering or platform dependencies

pub mod body;
pub mod group;
pub mod integrator;
pub mod quadtree;
pub mod rect;
pub mod separation;
pub mod tile;
pub mod world;

pub use body::{Body, BodyHandle, BodySet, Edges};
pub use group::{Group, GroupId};
pub use integrator::{Axis, compute_velocity, update_motion};
pub use quadtree::QuadTree;
pub use rect::Rect;
pub use separation::{separate, separate_tile, separate_tile_x, separate_tile_y, separate_x, separate_y};
pub use tile::{Tile, TileGrid, TileLayer};
pub use world::{Collider, Contact, OnCollide, ShouldCollide, World};
