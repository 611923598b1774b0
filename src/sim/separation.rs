//! Overlap resolution between bodies and between a body and a tile
//!
//! Each axis is resolved on its own. A pair only separates along an axis if
//! one body moved toward the other on it this step, the overlap is no deeper
//! than both bodies' travel plus the overlap bias, and the facing edges allow
//! collision. Anything deeper is treated as spurious and left alone.

use super::body::Body;
use super::tile::Tile;
use crate::direction;

/// Resolve an overlap between two bodies on both axes
///
/// Both axes are always attempted; a diagonal hit may need both.
pub fn separate(a: &mut Body, b: &mut Body, bias: f32) -> bool {
    let x = separate_x(a, b, bias);
    let y = separate_y(a, b, bias);
    x || y
}

/// Post-collision velocities for two movable bodies
///
/// Mass-weighted elastic exchange: each body takes the other's speed scaled by
/// the mass ratio, then the shared average is kept and the remainder scaled by
/// each body's bounce.
fn exchange_velocities(v1: f32, m1: f32, bounce1: f32, v2: f32, m2: f32, bounce2: f32) -> (f32, f32) {
    let mut n1 = ((v2 * v2 * m2) / m1).sqrt() * direction(v2);
    let mut n2 = ((v1 * v1 * m1) / m2).sqrt() * direction(v1);
    let average = (n1 + n2) * 0.5;
    n1 -= average;
    n2 -= average;
    (average + n1 * bounce1, average + n2 * bounce2)
}

pub fn separate_x(a: &mut Body, b: &mut Body, bias: f32) -> bool {
    if a.immovable && b.immovable {
        return false;
    }
    if !a.bounds().intersects(&b.bounds()) {
        return false;
    }

    let max_overlap = a.delta_abs_x() + b.delta_abs_x() + bias;
    let (da, db) = (a.delta_x(), b.delta_x());
    let mut overlap = 0.0;

    if da == 0.0 && db == 0.0 {
        a.embedded = true;
        b.embedded = true;
    } else if da > db {
        // a moving right into b, or b moving left into a
        overlap = a.right() - b.position.x;
        if overlap > max_overlap || !a.allow_collision.right || !b.allow_collision.left {
            overlap = 0.0;
        } else {
            a.touching.right = true;
            b.touching.left = true;
        }
    } else if da < db {
        overlap = a.position.x - b.right();
        if -overlap > max_overlap || !a.allow_collision.left || !b.allow_collision.right {
            overlap = 0.0;
        } else {
            a.touching.left = true;
            b.touching.right = true;
        }
    }

    if overlap == 0.0 {
        return false;
    }

    a.overlap_x = overlap;
    b.overlap_x = overlap;

    if a.custom_separate_x || b.custom_separate_x {
        return true;
    }

    let (va, vb) = (a.velocity.x, b.velocity.x);
    match (a.immovable, b.immovable) {
        (false, false) => {
            let half = overlap * 0.5;
            a.position.x -= half;
            b.position.x += half;
            let (na, nb) = exchange_velocities(va, a.mass(), a.bounce.x, vb, b.mass(), b.bounce.x);
            a.velocity.x = na;
            b.velocity.x = nb;
        }
        (false, true) => {
            a.position.x -= overlap;
            a.velocity.x = vb - va * a.bounce.x;
        }
        (true, false) => {
            b.position.x += overlap;
            b.velocity.x = va - vb * b.bounce.x;
        }
        (true, true) => {}
    }

    true
}

pub fn separate_y(a: &mut Body, b: &mut Body, bias: f32) -> bool {
    if a.immovable && b.immovable {
        return false;
    }
    if !a.bounds().intersects(&b.bounds()) {
        return false;
    }

    let max_overlap = a.delta_abs_y() + b.delta_abs_y() + bias;
    let (da, db) = (a.delta_y(), b.delta_y());
    let mut overlap = 0.0;

    if da == 0.0 && db == 0.0 {
        a.embedded = true;
        b.embedded = true;
    } else if da > db {
        // a coming down onto b, or b rising into a
        overlap = a.bottom() - b.position.y;
        if overlap > max_overlap || !a.allow_collision.down || !b.allow_collision.up {
            overlap = 0.0;
        } else {
            a.touching.down = true;
            b.touching.up = true;
        }
    } else if da < db {
        overlap = a.position.y - b.bottom();
        if -overlap > max_overlap || !a.allow_collision.up || !b.allow_collision.down {
            overlap = 0.0;
        } else {
            a.touching.up = true;
            b.touching.down = true;
        }
    }

    if overlap == 0.0 {
        return false;
    }

    a.overlap_y = overlap;
    b.overlap_y = overlap;

    if a.custom_separate_y || b.custom_separate_y {
        return true;
    }

    let (va, vb) = (a.velocity.y, b.velocity.y);
    match (a.immovable, b.immovable) {
        (false, false) => {
            let half = overlap * 0.5;
            a.position.y -= half;
            b.position.y += half;
            let (na, nb) = exchange_velocities(va, a.mass(), a.bounce.y, vb, b.mass(), b.bounce.y);
            a.velocity.y = na;
            b.velocity.y = nb;
        }
        (false, true) => {
            a.position.y -= overlap;
            a.velocity.y = vb - va * a.bounce.y;
            // Riding a moving platform: follow its horizontal travel
            if b.exists && b.moves && da > db {
                a.position.x += b.delta_x();
            }
        }
        (true, false) => {
            b.position.y += overlap;
            b.velocity.y = va - vb * b.bounce.y;
            if a.exists && a.moves && db > da {
                b.position.x += a.delta_x();
            }
        }
        (true, true) => {}
    }

    true
}

/// Resolve a body against one tile on both axes
///
/// With `commit` false the contact is only detected: touching flags and the
/// return value are set but the body is not moved.
pub fn separate_tile(body: &mut Body, tile: &Tile, bias: f32, commit: bool) -> bool {
    let x = separate_tile_x(body, tile, bias, commit);
    let y = separate_tile_y(body, tile, bias, commit);
    x || y
}

pub fn separate_tile_x(body: &mut Body, tile: &Tile, bias: f32, commit: bool) -> bool {
    let dx = body.delta_x();
    if body.immovable || dx == 0.0 || !body.hull_x.intersects(&tile.bounds) {
        return false;
    }

    let max_overlap = body.delta_abs_x() + bias;
    let mut overlap;

    if dx < 0.0 {
        overlap = tile.bounds.right() - body.hull_x.x;
        if overlap > max_overlap || !body.allow_collision.left || !tile.collide.right {
            overlap = 0.0;
        } else {
            body.touching.left = true;
        }
    } else {
        overlap = body.hull_x.right() - tile.bounds.x;
        if overlap > max_overlap || !body.allow_collision.right || !tile.collide.left {
            overlap = 0.0;
        } else {
            body.touching.right = true;
        }
    }

    if overlap == 0.0 {
        return false;
    }

    body.overlap_x = overlap;
    if commit {
        if dx < 0.0 {
            body.position.x += overlap;
            body.blocked.left = true;
        } else {
            body.position.x -= overlap;
            body.blocked.right = true;
        }
        body.velocity.x = if body.bounce.x == 0.0 {
            0.0
        } else {
            -body.velocity.x * body.bounce.x
        };
        body.update_hulls();
    }

    true
}

pub fn separate_tile_y(body: &mut Body, tile: &Tile, bias: f32, commit: bool) -> bool {
    let dy = body.delta_y();
    if body.immovable || dy == 0.0 || !body.hull_y.intersects(&tile.bounds) {
        return false;
    }

    let max_overlap = body.delta_abs_y() + bias;
    let mut overlap;

    if dy < 0.0 {
        overlap = tile.bounds.bottom() - body.hull_y.y;
        if overlap > max_overlap || !body.allow_collision.up || !tile.collide.down {
            overlap = 0.0;
        } else {
            body.touching.up = true;
        }
    } else {
        overlap = body.hull_y.bottom() - tile.bounds.y;
        if overlap > max_overlap || !body.allow_collision.down || !tile.collide.up {
            overlap = 0.0;
        } else {
            body.touching.down = true;
        }
    }

    if overlap == 0.0 {
        return false;
    }

    body.overlap_y = overlap;
    if commit {
        if dy < 0.0 {
            body.position.y += overlap;
            body.blocked.up = true;
        } else {
            body.position.y -= overlap;
            body.blocked.down = true;
        }
        body.velocity.y = if body.bounce.y == 0.0 {
            0.0
        } else {
            -body.velocity.y * body.bounce.y
        };
        body.update_hulls();
    }

    true
}
