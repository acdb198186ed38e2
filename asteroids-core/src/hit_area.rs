use core::f64::consts::TAU;

use crate::geometry::{
    circle_polygon_intersect, circles_intersect, from_angle, polygons_intersect,
    transform_polygon, Rect, Vec2,
};

/// Polygon outline in local space plus the world-space vertices it was last
/// transformed into.
#[derive(Clone, Debug)]
pub struct PolygonHitArea {
    template: Vec<Vec2>,
    world: Vec<Vec2>,
    transform: Option<(f64, Vec2)>,
}

impl PolygonHitArea {
    pub fn new(template: Vec<Vec2>) -> Self {
        assert!(
            template.len() >= 3,
            "polygon hit area needs at least 3 vertices, got {}",
            template.len()
        );
        Self {
            world: Vec::with_capacity(template.len()),
            template,
            transform: None,
        }
    }

    pub fn template(&self) -> &[Vec2] {
        &self.template
    }

    /// World-space vertices as of the last [`PolygonHitArea::sync`].
    pub fn vertices(&self) -> &[Vec2] {
        &self.world
    }

    pub fn is_synced(&self, rotation: f64, position: Vec2) -> bool {
        self.transform == Some((rotation, position))
    }

    /// Recomputes the world vertices if the transform moved. Returns whether
    /// any work was done.
    pub fn sync(&mut self, rotation: f64, position: Vec2) -> bool {
        if self.is_synced(rotation, position) {
            return false;
        }
        transform_polygon(&self.template, rotation, position, &mut self.world);
        self.transform = Some((rotation, position));
        true
    }
}

#[derive(Clone, Debug)]
pub enum HitArea {
    Circle { radius: f64 },
    Polygon(PolygonHitArea),
}

impl HitArea {
    pub fn circle(radius: f64) -> Self {
        Self::Circle { radius }
    }

    pub fn polygon(template: Vec<Vec2>) -> Self {
        Self::Polygon(PolygonHitArea::new(template))
    }

    pub fn from_points(points: &[[f64; 2]], scale: f64) -> Self {
        Self::polygon(
            points
                .iter()
                .map(|[x, y]| Vec2::new(*x, *y) * scale)
                .collect(),
        )
    }

    /// `vertices`-gon inscribed in a circle of `radius`.
    pub fn regular_polygon(vertices: usize, radius: f64) -> Self {
        let step = TAU / vertices as f64;
        Self::polygon(
            (0..vertices)
                .map(|i| from_angle(step * i as f64) * radius)
                .collect(),
        )
    }

    pub fn sync(&mut self, rotation: f64, position: Vec2) -> bool {
        match self {
            Self::Circle { .. } => false,
            Self::Polygon(polygon) => polygon.sync(rotation, position),
        }
    }

    /// Bounding box for the given transform, computed without touching the
    /// vertex cache.
    pub fn bounds_at(&self, rotation: f64, position: Vec2) -> Rect {
        match self {
            Self::Circle { radius } => Rect::from_center(position, Vec2::splat(*radius)),
            Self::Polygon(polygon) if polygon.is_synced(rotation, position) => {
                Rect::from_points(polygon.vertices())
            }
            Self::Polygon(polygon) => {
                let mut scratch = Vec::with_capacity(polygon.template().len());
                transform_polygon(polygon.template(), rotation, position, &mut scratch);
                Rect::from_points(&scratch)
            }
        }
    }

    /// Exact test. Polygon operands must already be synced to their
    /// current transform.
    pub fn intersects(&self, position: Vec2, other: &HitArea, other_position: Vec2) -> bool {
        match (self, other) {
            (Self::Circle { radius }, Self::Circle { radius: other_radius }) => {
                circles_intersect(position, *radius, other_position, *other_radius)
            }
            (Self::Circle { radius }, Self::Polygon(polygon)) => {
                circle_polygon_intersect(position, *radius, polygon.vertices())
            }
            (Self::Polygon(polygon), Self::Circle { radius }) => {
                circle_polygon_intersect(other_position, *radius, polygon.vertices())
            }
            (Self::Polygon(a), Self::Polygon(b)) => polygons_intersect(a.vertices(), b.vertices()),
        }
    }
}
