use core::f64::consts::TAU;

use serde::{Deserialize, Serialize};

pub type Vec2 = glam::DVec2;

/// Dimensions of the playfield in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSize {
    pub width: f64,
    pub height: f64,
}

impl WorldSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, half_extent: Vec2) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    pub fn from_points(points: &[Vec2]) -> Self {
        let mut min = Vec2::splat(f64::INFINITY);
        let mut max = Vec2::splat(f64::NEG_INFINITY);
        for point in points {
            min = min.min(*point);
            max = max.max(*point);
        }
        Self { min, max }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Touching edges count as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn inflate(&self, margin: f64) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    (b - a).perp_dot(c - a)
}

fn on_segment(a: Vec2, b: Vec2, point: Vec2) -> bool {
    point.x >= a.x.min(b.x)
        && point.x <= a.x.max(b.x)
        && point.y >= a.y.min(b.y)
        && point.y <= a.y.max(b.y)
}

fn straddles(d1: f64, d2: f64) -> bool {
    (d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)
}

/// Closed segments `p1-p2` and `q1-q2` share at least one point.
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if straddles(d1, d2) && straddles(d3, d4) {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

/// Even-odd crossing test.
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

pub fn point_segment_distance_sq(point: Vec2, a: Vec2, b: Vec2) -> f64 {
    let edge = b - a;
    let length_sq = edge.length_squared();
    if length_sq == 0.0 {
        return point.distance_squared(a);
    }
    let t = ((point - a).dot(edge) / length_sq).clamp(0.0, 1.0);
    point.distance_squared(a + edge * t)
}

fn edges(polygon: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    polygon
        .iter()
        .enumerate()
        .map(|(i, a)| (*a, polygon[(i + 1) % polygon.len()]))
}

pub fn circles_intersect(a: Vec2, radius_a: f64, b: Vec2, radius_b: f64) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) <= reach * reach
}

pub fn circle_polygon_intersect(center: Vec2, radius: f64, polygon: &[Vec2]) -> bool {
    if point_in_polygon(center, polygon) {
        return true;
    }
    let radius_sq = radius * radius;
    edges(polygon).any(|(a, b)| point_segment_distance_sq(center, a, b) <= radius_sq)
}

pub fn polygons_intersect(a: &[Vec2], b: &[Vec2]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    for (a1, a2) in edges(a) {
        for (b1, b2) in edges(b) {
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    point_in_polygon(a[0], b) || point_in_polygon(b[0], a)
}

/// Unit vector at `angle` radians.
///
/// Gameplay trig goes through `libm` so a replay on another target produces
/// the same bits as the recording. Never use `DVec2::from_angle` or
/// `f64::sin_cos` on the simulation path.
pub fn from_angle(angle: f64) -> Vec2 {
    Vec2::new(libm::cos(angle), libm::sin(angle))
}

/// Direction of `v` in radians, `(-PI, PI]`.
pub fn angle_of(v: Vec2) -> f64 {
    libm::atan2(v.y, v.x)
}

/// Rotates then translates `template` into `out`, reusing its allocation.
pub fn transform_polygon(
    template: &[Vec2],
    rotation: f64,
    translation: Vec2,
    out: &mut Vec<Vec2>,
) {
    let turn = from_angle(rotation);
    out.clear();
    out.extend(template.iter().map(|point| turn.rotate(*point) + translation));
}

/// Normalises `value` into `[-margin, size + margin)`. In-range values are
/// returned untouched.
pub fn wrap_coordinate(value: f64, size: f64, margin: f64) -> f64 {
    let low = -margin;
    let high = size + margin;
    if value >= low && value < high {
        return value;
    }
    low + (value - low).rem_euclid(high - low)
}

/// Signed minimum-image delta from `from` to `to` on an axis of length `size`.
pub fn shortest_delta(from: f64, to: f64, size: f64) -> f64 {
    let delta = to - from;
    if size <= 0.0 {
        return delta;
    }
    let half = size * 0.5;
    let wrapped = (delta + half).rem_euclid(size) - half;
    if wrapped == -half && delta > 0.0 {
        half
    } else {
        wrapped
    }
}

pub fn shortest_offset(from: Vec2, to: Vec2, world: WorldSize) -> Vec2 {
    Vec2::new(
        shortest_delta(from.x, to.x, world.width),
        shortest_delta(from.y, to.y, world.height),
    )
}

/// Smallest absolute difference between two angles, in `[0, PI]`.
pub fn angle_distance(a: f64, b: f64) -> f64 {
    let delta = (a - b).rem_euclid(TAU);
    delta.min(TAU - delta)
}

pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    from * (1.0 - t) + to * t
}
