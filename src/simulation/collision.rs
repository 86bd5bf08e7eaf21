//! Collision and pickup resolution
//!
//! Axis-aligned box overlap. Touching edges do not count as a collision.

use serde::Serialize;

/// An axis-aligned box: top-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Both axis intervals overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// Anything with a collision box
pub trait Bounded {
    fn bounds(&self) -> Aabb;
}

impl Bounded for Aabb {
    fn bounds(&self) -> Aabb {
        *self
    }
}

pub fn check_collision(a: &impl Bounded, b: &impl Bounded) -> bool {
    a.bounds().overlaps(&b.bounds())
}

/// First box in `others` that `subject` overlaps, with its key
pub fn first_hit<'a, K: Copy + 'a, T: Bounded + 'a>(
    subject: &impl Bounded,
    others: impl IntoIterator<Item = (&'a K, &'a T)>,
) -> Option<K> {
    let bounds = subject.bounds();
    others
        .into_iter()
        .find(|(_, other)| bounds.overlaps(&other.bounds()))
        .map(|(key, _)| *key)
}

/// Every key in `others` whose box `subject` overlaps
pub fn all_hits<'a, K: Copy + 'a, T: Bounded + 'a>(
    subject: &impl Bounded,
    others: impl IntoIterator<Item = (&'a K, &'a T)>,
) -> Vec<K> {
    let bounds = subject.bounds();
    others
        .into_iter()
        .filter(|(_, other)| bounds.overlaps(&other.bounds()))
        .map(|(key, _)| *key)
        .collect()
}
