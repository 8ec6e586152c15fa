#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Circle-versus-box collision resolution on the horizontal plane.
//!
//! Walls, props and doors are approximated by axis-aligned boxes on the XZ
//! plane. Actors are circles that get pushed out of any box they overlap, and
//! projectiles are tested as segments against the same boxes.

use crawler_core::{DoorId, Grid, GridMapper, GridPoint, PropId};
use glam::Vec3;

/// Direction components smaller than this are treated as parallel to a slab.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Axis-aligned box on the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    min_x: f32,
    max_x: f32,
    min_z: f32,
    max_z: f32,
}

impl Aabb {
    /// Creates a box from its extents; inverted extents are reordered.
    #[must_use]
    pub fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> Self {
        Self {
            min_x: min_x.min(max_x),
            max_x: max_x.max(min_x),
            min_z: min_z.min(max_z),
            max_z: max_z.max(min_z),
        }
    }

    /// Creates a square box centred on the provided position.
    #[must_use]
    pub fn around(center: Vec3, half_extent: f32) -> Self {
        Self::new(
            center.x - half_extent,
            center.x + half_extent,
            center.z - half_extent,
            center.z + half_extent,
        )
    }

    /// Box covering exactly one grid cell.
    #[must_use]
    pub fn cell(mapper: &GridMapper, point: GridPoint) -> Self {
        Self::around(mapper.grid_to_world(point), mapper.cell_size() / 2.0)
    }

    /// Smallest x coordinate covered by the box.
    #[must_use]
    pub const fn min_x(&self) -> f32 {
        self.min_x
    }

    /// Largest x coordinate covered by the box.
    #[must_use]
    pub const fn max_x(&self) -> f32 {
        self.max_x
    }

    /// Smallest z coordinate covered by the box.
    #[must_use]
    pub const fn min_z(&self) -> f32 {
        self.min_z
    }

    /// Largest z coordinate covered by the box.
    #[must_use]
    pub const fn max_z(&self) -> f32 {
        self.max_z
    }

    /// Reports whether the position lies inside the box, borders included.
    #[must_use]
    pub fn contains_xz(&self, position: Vec3) -> bool {
        position.x >= self.min_x
            && position.x <= self.max_x
            && position.z >= self.min_z
            && position.z <= self.max_z
    }

    /// Point of the box closest to the position, ignoring height.
    #[must_use]
    pub fn closest_xz(&self, position: Vec3) -> (f32, f32) {
        (
            position.x.clamp(self.min_x, self.max_x),
            position.z.clamp(self.min_z, self.max_z),
        )
    }
}

/// Origin of a collider, used to rebuild or filter the set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColliderSource {
    /// Wall block at a grid cell.
    Wall(GridPoint),
    /// Destructible prop.
    Prop(PropId),
    /// Door block.
    Door(DoorId),
}

/// Single obstacle box tagged with where it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    /// Horizontal footprint of the obstacle.
    pub aabb: Aabb,
    /// Entity the collider belongs to.
    pub source: ColliderSource,
}

/// Flat list of every obstacle in a level.
///
/// Resolution walks the list in insertion order: walls first, then props,
/// then doors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColliderSet {
    colliders: Vec<Collider>,
}

impl ColliderSet {
    /// Creates an empty collider set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds colliders for every wall cell of the grid followed by the
    /// provided props and doors.
    #[must_use]
    pub fn rebuild<P, D>(grid: &Grid, mapper: &GridMapper, props: P, doors: D) -> Self
    where
        P: IntoIterator<Item = (PropId, Aabb)>,
        D: IntoIterator<Item = (DoorId, Aabb)>,
    {
        let mut set = Self::new();
        for point in grid.points() {
            if !grid.is_floor(point) {
                set.push(Aabb::cell(mapper, point), ColliderSource::Wall(point));
            }
        }
        for (prop, aabb) in props {
            set.push(aabb, ColliderSource::Prop(prop));
        }
        for (door, aabb) in doors {
            set.push(aabb, ColliderSource::Door(door));
        }
        set
    }

    /// Appends a collider at the end of the resolution order.
    pub fn push(&mut self, aabb: Aabb, source: ColliderSource) {
        self.colliders.push(Collider { aabb, source });
    }

    /// Number of colliders in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Reports whether the set holds no colliders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Iterates colliders in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &Collider> {
        self.colliders.iter()
    }

    /// Iterates the boxes of wall colliders only.
    pub fn walls(&self) -> impl Iterator<Item = &Aabb> {
        self.colliders
            .iter()
            .filter(|collider| matches!(collider.source, ColliderSource::Wall(_)))
            .map(|collider| &collider.aabb)
    }

    /// Pushes a circle of the given radius out of every overlapping box.
    ///
    /// Each collider is visited once; the height component is preserved.
    #[must_use]
    pub fn resolve(&self, position: Vec3, radius: f32) -> Vec3 {
        resolve_circle(self.colliders.iter().map(|collider| &collider.aabb), position, radius)
    }

    /// Reports whether the position lies inside any obstacle.
    #[must_use]
    pub fn contains_point(&self, position: Vec3) -> bool {
        self.colliders
            .iter()
            .any(|collider| collider.aabb.contains_xz(position))
    }

    /// First collider crossed by the segment, in resolution order.
    #[must_use]
    pub fn segment_hit(&self, start: Vec3, end: Vec3) -> Option<&Collider> {
        self.colliders
            .iter()
            .find(|collider| segment_aabb_intersect(start, end, &collider.aabb))
    }

    /// Reports whether the segment crosses any obstacle.
    #[must_use]
    pub fn segment_hits(&self, start: Vec3, end: Vec3) -> bool {
        self.segment_hit(start, end).is_some()
    }
}

/// Pushes a circle out of each provided box in turn.
#[must_use]
pub fn resolve_circle<'a, I>(boxes: I, position: Vec3, radius: f32) -> Vec3
where
    I: IntoIterator<Item = &'a Aabb>,
{
    let mut resolved = position;
    let radius_sq = radius * radius;
    for aabb in boxes {
        let (closest_x, closest_z) = aabb.closest_xz(resolved);
        let dx = resolved.x - closest_x;
        let dz = resolved.z - closest_z;
        if dx * dx + dz * dz >= radius_sq {
            continue;
        }

        if dx.abs() > dz.abs() {
            resolved.x = closest_x + push_sign(dx) * radius;
        } else {
            resolved.z = closest_z + push_sign(dz) * radius;
        }
    }
    resolved
}

fn push_sign(offset: f32) -> f32 {
    if offset < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Slab test of the segment `start..end` against the box on the XZ plane.
///
/// A component shorter than `1e-6` degrades to a containment check on that
/// axis, so zero-length segments behave like point tests.
#[must_use]
pub fn segment_aabb_intersect(start: Vec3, end: Vec3, aabb: &Aabb) -> bool {
    let mut t_min = 0.0_f32;
    let mut t_max = 1.0_f32;

    let axes = [
        (start.x, end.x - start.x, aabb.min_x, aabb.max_x),
        (start.z, end.z - start.z, aabb.min_z, aabb.max_z),
    ];
    for (origin, delta, low, high) in axes {
        if delta.abs() < PARALLEL_EPSILON {
            if origin < low || origin > high {
                return false;
            }
            continue;
        }

        let t1 = (low - origin) / delta;
        let t2 = (high - origin) / delta;
        t_min = t_min.max(t1.min(t2));
        t_max = t_max.min(t1.max(t2));
        if t_min > t_max {
            return false;
        }
    }

    true
}

/// Reports whether the segment passes within `radius` of `center`.
#[must_use]
pub fn segment_sphere_intersect(start: Vec3, end: Vec3, center: Vec3, radius: f32) -> bool {
    let segment = end - start;
    let length_sq = segment.length_squared();
    if length_sq == 0.0 {
        return start.distance(center) <= radius;
    }

    let t = ((center - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    let closest = start + segment * t;
    closest.distance(center) <= radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_core::Cell;

    fn unit_box() -> Aabb {
        Aabb::new(-1.0, 1.0, -1.0, 1.0)
    }

    #[test]
    fn resolve_pushes_along_dominant_axis() {
        let set = {
            let mut set = ColliderSet::new();
            set.push(unit_box(), ColliderSource::Wall(GridPoint::new(0, 0)));
            set
        };
        let resolved = set.resolve(Vec3::new(1.3, 1.7, 0.2), 0.5);
        assert!((resolved.x - 1.5).abs() < 1e-6);
        assert!((resolved.z - 0.2).abs() < 1e-6);
        assert!((resolved.y - 1.7).abs() < 1e-6);

        let resolved = set.resolve(Vec3::new(0.1, 0.0, -1.2), 0.5);
        assert!((resolved.z + 1.5).abs() < 1e-6);
    }

    #[test]
    fn resolve_leaves_clear_positions_untouched() {
        let mut set = ColliderSet::new();
        set.push(unit_box(), ColliderSource::Wall(GridPoint::new(0, 0)));
        let position = Vec3::new(3.0, 0.0, 3.0);
        assert_eq!(set.resolve(position, 0.7), position);
    }

    #[test]
    fn resolve_removes_penetration_for_every_box() {
        let mut set = ColliderSet::new();
        set.push(Aabb::new(-1.0, 1.0, -1.0, 1.0), ColliderSource::Wall(GridPoint::new(0, 0)));
        set.push(Aabb::new(5.0, 7.0, -1.0, 1.0), ColliderSource::Wall(GridPoint::new(1, 0)));
        let radius = 0.7;
        let resolved = set.resolve(Vec3::new(1.2, 0.0, 0.4), radius);
        for collider in set.iter() {
            let (x, z) = collider.aabb.closest_xz(resolved);
            let distance_sq = (resolved.x - x).powi(2) + (resolved.z - z).powi(2);
            assert!(distance_sq >= radius * radius - 1e-5);
        }
    }

    #[test]
    fn centered_circle_is_pushed_toward_positive_z() {
        let aabb = unit_box();
        let resolved = resolve_circle([&aabb], Vec3::ZERO, 0.5);
        assert!((resolved.z - 0.5).abs() < 1e-6);
        assert!(resolved.x.abs() < 1e-6);
    }

    #[test]
    fn segment_crossing_box_intersects() {
        let aabb = unit_box();
        assert!(segment_aabb_intersect(
            Vec3::new(-3.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.5),
            &aabb
        ));
        assert!(!segment_aabb_intersect(
            Vec3::new(-3.0, 0.0, 2.0),
            Vec3::new(3.0, 0.0, 2.0),
            &aabb
        ));
        assert!(!segment_aabb_intersect(
            Vec3::new(-3.0, 0.0, 0.0),
            Vec3::new(-2.0, 0.0, 0.0),
            &aabb
        ));
    }

    #[test]
    fn zero_length_segment_degrades_to_point_test() {
        let aabb = unit_box();
        let inside = Vec3::new(0.5, 0.0, 0.5);
        let outside = Vec3::new(1.5, 0.0, 0.5);
        assert!(segment_aabb_intersect(inside, inside, &aabb));
        assert!(!segment_aabb_intersect(outside, outside, &aabb));
    }

    #[test]
    fn segment_sphere_uses_closest_point() {
        let center = Vec3::new(0.0, 1.0, 0.0);
        assert!(segment_sphere_intersect(
            Vec3::new(-2.0, 1.0, 0.3),
            Vec3::new(2.0, 1.0, 0.3),
            center,
            0.5
        ));
        assert!(!segment_sphere_intersect(
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
            center,
            0.5
        ));
        assert!(segment_sphere_intersect(
            Vec3::new(0.2, 1.0, 0.0),
            Vec3::new(0.2, 1.0, 0.0),
            center,
            0.5
        ));
    }

    #[test]
    fn rebuild_orders_walls_props_then_doors() {
        let mut grid = Grid::filled(3, 3, Cell::Floor);
        grid.set(GridPoint::new(0, 0), Cell::Wall);
        grid.set(GridPoint::new(2, 2), Cell::Wall);
        let mapper = GridMapper::new(3, 3, 2.0);
        let door_cell = GridPoint::new(1, 1);

        let set = ColliderSet::rebuild(
            &grid,
            &mapper,
            [(PropId::new(0), Aabb::around(Vec3::new(2.0, 0.0, 0.0), 0.6))],
            [(DoorId::new(4), Aabb::cell(&mapper, door_cell))],
        );

        let sources: Vec<_> = set.iter().map(|collider| collider.source).collect();
        assert_eq!(
            sources,
            vec![
                ColliderSource::Wall(GridPoint::new(0, 0)),
                ColliderSource::Wall(GridPoint::new(2, 2)),
                ColliderSource::Prop(PropId::new(0)),
                ColliderSource::Door(DoorId::new(4)),
            ]
        );
        assert_eq!(set.walls().count(), 2);
        assert!(set.contains_point(mapper.grid_to_world(door_cell)));
        assert!(!set.contains_point(mapper.grid_to_world(GridPoint::new(0, 2))));
    }

    #[test]
    fn cell_box_covers_the_whole_cell() {
        let mapper = GridMapper::new(41, 41, 2.0);
        let aabb = Aabb::cell(&mapper, GridPoint::new(20, 20));
        assert_eq!(aabb, Aabb::new(-1.0, 1.0, -1.0, 1.0));
    }
}
