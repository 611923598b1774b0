//! Per-body motion integration
//!
//! Each axis takes half of its velocity change before the position update and
//! the other half after it. This keeps constant-acceleration trajectories
//! exact where plain Euler would drift; see
//! <http://www.niksula.hut.fi/~hkankaan/Homepages/gravity.html>.

use super::body::Body;
use crate::approach_zero;
use crate::consts::DEFAULT_MAX_VELOCITY;
use crate::settings::PhysicsConfig;

/// Which degree of freedom a velocity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Rotation,
    Horizontal,
    Vertical,
}

/// Advance rotation and position of `body` by one step
pub fn update_motion(body: &mut Body, config: &PhysicsConfig) {
    let dt = config.step_duration;

    if body.allow_rotation {
        let delta = (compute_velocity(
            Axis::Rotation,
            body,
            body.angular_velocity,
            body.angular_acceleration,
            body.angular_drag,
            body.max_angular,
            config,
        ) - body.angular_velocity)
            * 0.5;
        body.angular_velocity += delta;
        body.rotation += body.angular_velocity * dt;
        body.angular_velocity += delta;
    }

    let delta = (compute_velocity(
        Axis::Horizontal,
        body,
        body.velocity.x,
        body.acceleration.x,
        body.drag.x,
        body.max_velocity.x,
        config,
    ) - body.velocity.x)
        * 0.5;
    body.velocity.x += delta;
    body.position.x += body.velocity.x * dt;
    body.velocity.x += delta;

    let delta = (compute_velocity(
        Axis::Vertical,
        body,
        body.velocity.y,
        body.acceleration.y,
        body.drag.y,
        body.max_velocity.y,
        config,
    ) - body.velocity.y)
        * 0.5;
    body.velocity.y += delta;
    body.position.y += body.velocity.y * dt;
    body.velocity.y += delta;
}

/// Velocity after one step of gravity, acceleration or drag, capped at `±max`
///
/// Drag only applies while acceleration is zero and never reverses the sign of
/// the velocity. A `max` of zero means the default cap.
pub fn compute_velocity(
    axis: Axis,
    body: &Body,
    mut velocity: f32,
    acceleration: f32,
    drag: f32,
    max: f32,
    config: &PhysicsConfig,
) -> f32 {
    let dt = config.step_duration;
    let max = if max == 0.0 { DEFAULT_MAX_VELOCITY } else { max };

    if body.allow_gravity {
        match axis {
            Axis::Horizontal => velocity += config.gravity.x + body.gravity.x,
            Axis::Vertical => velocity += config.gravity.y + body.gravity.y,
            Axis::Rotation => {}
        }
    }

    if acceleration != 0.0 {
        velocity += acceleration * dt;
    } else if drag != 0.0 {
        velocity = approach_zero(velocity, drag * dt);
    }

    if velocity > max {
        max
    } else if velocity < -max {
        -max
    } else {
        velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn unit_step() -> PhysicsConfig {
        PhysicsConfig {
            step_duration: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_drag_clamps_at_zero() {
        let config = unit_step();
        let body = Body::new(0.0, 0.0, 10.0, 10.0);

        let v = compute_velocity(Axis::Horizontal, &body, 3.0, 0.0, 5.0, 100.0, &config);
        assert_eq!(v, 0.0);

        let v = compute_velocity(Axis::Horizontal, &body, -3.0, 0.0, 5.0, 100.0, &config);
        assert_eq!(v, 0.0);

        let v = compute_velocity(Axis::Horizontal, &body, 8.0, 0.0, 5.0, 100.0, &config);
        assert_eq!(v, 3.0);
    }

    #[test]
    fn test_negative_drag_still_decelerates() {
        let config = unit_step();
        let body = Body::new(0.0, 0.0, 10.0, 10.0);

        let v = compute_velocity(Axis::Horizontal, &body, 3.0, 0.0, -5.0, 100.0, &config);
        assert_eq!(v, 0.0);

        let v = compute_velocity(Axis::Vertical, &body, -8.0, 0.0, -5.0, 100.0, &config);
        assert_eq!(v, -3.0);
    }

    #[test]
    fn test_acceleration_overrides_drag() {
        let config = unit_step();
        let body = Body::new(0.0, 0.0, 10.0, 10.0);

        let v = compute_velocity(Axis::Vertical, &body, 1.0, 2.0, 50.0, 100.0, &config);
        assert_eq!(v, 3.0);
    }

    #[test]
    fn test_velocity_cap() {
        let config = unit_step();
        let body = Body::new(0.0, 0.0, 10.0, 10.0);

        assert_eq!(
            compute_velocity(Axis::Horizontal, &body, 90.0, 50.0, 0.0, 100.0, &config),
            100.0
        );
        assert_eq!(
            compute_velocity(Axis::Horizontal, &body, -90.0, -50.0, 0.0, 100.0, &config),
            -100.0
        );
        // Zero cap falls back to the default
        assert_eq!(
            compute_velocity(Axis::Horizontal, &body, 20000.0, 0.0, 0.0, 0.0, &config),
            DEFAULT_MAX_VELOCITY
        );
    }

    #[test]
    fn test_gravity_is_linear_only_and_optional() {
        let config = PhysicsConfig {
            gravity: Vec2::new(1.0, 10.0),
            ..unit_step()
        };
        let mut body = Body::new(0.0, 0.0, 10.0, 10.0);
        body.gravity = Vec2::new(0.0, 5.0);

        assert_eq!(
            compute_velocity(Axis::Vertical, &body, 0.0, 0.0, 0.0, 1000.0, &config),
            15.0
        );
        assert_eq!(
            compute_velocity(Axis::Horizontal, &body, 0.0, 0.0, 0.0, 1000.0, &config),
            1.0
        );
        assert_eq!(
            compute_velocity(Axis::Rotation, &body, 0.0, 0.0, 0.0, 1000.0, &config),
            0.0
        );

        body.allow_gravity = false;
        assert_eq!(
            compute_velocity(Axis::Vertical, &body, 0.0, 0.0, 0.0, 1000.0, &config),
            0.0
        );
    }

    #[test]
    fn test_half_delta_integration() {
        // Constant acceleration from rest: x = a*t^2/2 exactly after one step
        let config = unit_step();
        let mut body = Body::new(0.0, 0.0, 10.0, 10.0);
        body.acceleration = Vec2::new(4.0, 0.0);

        update_motion(&mut body, &config);

        assert_eq!(body.velocity.x, 4.0);
        assert_eq!(body.position.x, 2.0);

        update_motion(&mut body, &config);
        assert_eq!(body.velocity.x, 8.0);
        assert_eq!(body.position.x, 8.0);
    }

    #[test]
    fn test_rotation_respects_allow_rotation() {
        let config = unit_step();
        let mut body = Body::new(0.0, 0.0, 10.0, 10.0);
        body.angular_velocity = 30.0;

        update_motion(&mut body, &config);
        assert_eq!(body.rotation, 30.0);

        body.allow_rotation = false;
        update_motion(&mut body, &config);
        assert_eq!(body.rotation, 30.0);
    }

    #[test]
    fn test_nan_propagates() {
        let config = unit_step();
        let body = Body::new(0.0, 0.0, 10.0, 10.0);
        let v = compute_velocity(Axis::Horizontal, &body, f32::NAN, 0.0, 0.0, 100.0, &config);
        assert!(v.is_nan());
    }
}
