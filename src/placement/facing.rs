// src/placement/facing.rs
//! Orientation solver: turn a placed object's authored front toward a look
//! target.

use bevy::prelude::*;

/// Placeable assets author their visible front opposite the forward axis, so
/// every look rotation gets flipped half a turn around its up axis. This is
/// an asset-authoring convention; assets with a different front axis need a
/// different offset.
pub const FRONT_YAW_OFFSET: f32 = std::f32::consts::PI;

/// Yaw-only rotation that makes the object's front face `target`. Pitch and
/// roll are discarded. Degenerate directions (target directly above or at
/// `position`) yield identity.
pub fn compute_facing(position: Vec3, target: Vec3) -> Quat {
    let flat = Vec3::new(target.x - position.x, 0.0, target.z - position.z);
    if flat.length_squared() < 1e-12 {
        return Quat::IDENTITY;
    }
    // forward is -Z
    let yaw = (-flat.x).atan2(-flat.z);
    Quat::from_rotation_y(yaw + FRONT_YAW_OFFSET)
}

/// Facing for a surface-mounted object: the sampled surface normal replaces
/// world-up as the up reference, so wall and ceiling placements orient
/// consistently with their support.
pub fn compute_facing_on_surface(position: Vec3, target: Vec3, surface_normal: Vec3) -> Quat {
    let up = surface_normal.normalize_or_zero();
    if up == Vec3::ZERO {
        return compute_facing(position, target);
    }
    let dir = target - position;
    let in_plane = dir - up * dir.dot(up);
    if in_plane.length_squared() < 1e-12 {
        return Quat::IDENTITY;
    }
    let look = Transform::IDENTITY.looking_to(in_plane, up).rotation;
    look * Quat::from_rotation_y(FRONT_YAW_OFFSET)
}
