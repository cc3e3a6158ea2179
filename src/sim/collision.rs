//! Circle overlap tests
//!
//! Every body in the arena is a circle, so a hit is simply centers closer
//! than the sum of radii.

use glam::Vec2;

use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};

/// Check if two circles overlap (touching does not count)
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a.distance_squared(b) < reach * reach
}

/// Index of the first circle in `others` overlapping the circle at `pos`
pub fn first_overlap<I>(pos: Vec2, radius: f32, others: I) -> Option<usize>
where
    I: IntoIterator<Item = (Vec2, f32)>,
{
    others
        .into_iter()
        .position(|(other, other_radius)| circles_overlap(pos, radius, other, other_radius))
}

/// Keep a circle fully inside the world
pub fn clamp_to_world(pos: Vec2, radius: f32) -> Vec2 {
    Vec2::new(
        pos.x.clamp(radius, WORLD_WIDTH - radius),
        pos.y.clamp(radius, WORLD_HEIGHT - radius),
    )
}
