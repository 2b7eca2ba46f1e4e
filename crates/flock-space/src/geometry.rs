//! Geometry kernel: planes, spheres, axis-aligned boxes, and the
//! precomputed cube-sphere intersection helper.
//!
//! Point containment is strict by default (`<`), so a point lying exactly
//! on a face is outside. [`Aabb3::contains`] is half-open
//! (`min <= p < max`) so that the cells of a uniform grid tile space
//! without gaps. The sphere-box overlap tests are closed: a query sphere
//! that merely touches a cell still reaches it, matching the inclusive
//! range check of the neighbour filter.

use flock_core::math::sqr;
use glam::DVec3;

/// An oriented plane `dot(normal, p) = distance_to_origin`.
///
/// The half-space behind the normal is considered inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal pointing out of the inside half-space.
    pub normal: DVec3,
    /// Signed distance of the plane from the origin along `normal`.
    pub distance_to_origin: f64,
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            normal: DVec3::Y,
            distance_to_origin: 0.0,
        }
    }
}

impl Plane {
    /// Plane with the given normal through `point_on_plane`.
    pub fn new(normal: DVec3, point_on_plane: DVec3) -> Self {
        Self {
            normal,
            distance_to_origin: point_on_plane.dot(normal),
        }
    }

    /// Signed distance from `pos` to the plane; positive on the inside.
    #[inline]
    pub fn closest_distance(&self, pos: DVec3) -> f64 {
        self.distance_to_origin - self.normal.dot(pos)
    }

    /// Whether `pos` lies strictly on the inside.
    #[inline]
    pub fn is_inside(&self, pos: DVec3) -> bool {
        self.normal.dot(pos) < self.distance_to_origin
    }

    /// Whether `pos` lies on the inside or on the plane itself.
    #[inline]
    pub fn is_inside_or_on(&self, pos: DVec3) -> bool {
        self.normal.dot(pos) <= self.distance_to_origin
    }
}

/// A sphere, also used as a query region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    /// Centre.
    pub origin: DVec3,
    /// Radius.
    pub radius: f64,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            origin: DVec3::ZERO,
            radius: 0.0,
        }
    }
}

impl Sphere {
    /// Sphere at `origin` with `radius`.
    pub fn new(origin: DVec3, radius: f64) -> Self {
        Self { origin, radius }
    }

    /// Whether `pos` lies strictly inside the sphere.
    #[inline]
    pub fn contains(&self, pos: DVec3) -> bool {
        (self.origin - pos).length_squared() < sqr(self.radius)
    }

    /// Whether the sphere straddles `plane`.
    pub fn overlaps_plane(&self, plane: &Plane) -> bool {
        sqr(plane.closest_distance(self.origin)) < sqr(self.radius)
    }
}

/// Axis-aligned box spanning `min` (left-bottom-back) to `max`
/// (right-top-front).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
    /// Left-bottom-back corner.
    pub min: DVec3,
    /// Right-top-front corner.
    pub max: DVec3,
}

impl Aabb3 {
    /// Box from its two extreme corners.
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Cube of edge `2 * half_extent` centred on the origin.
    pub fn centred(half_extent: f64) -> Self {
        Self::new(DVec3::splat(-half_extent), DVec3::splat(half_extent))
    }

    /// Edge lengths.
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Centre point.
    pub fn centre(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-open containment: `min <= pos < max` on every axis.
    pub fn contains(&self, pos: DVec3) -> bool {
        pos.cmpge(self.min).all() && pos.cmplt(self.max).all()
    }

    /// Strict containment against the six face planes.
    pub fn contains_open(&self, pos: DVec3) -> bool {
        self.face_planes().iter().all(|p| p.is_inside(pos))
    }

    /// Closed containment against the six face planes.
    pub fn contains_closed(&self, pos: DVec3) -> bool {
        self.face_planes().iter().all(|p| p.is_inside_or_on(pos))
    }

    /// Squared distance from `pos` to the nearest point of the box; zero
    /// inside.
    pub fn distance_sq(&self, pos: DVec3) -> f64 {
        (pos.clamp(self.min, self.max) - pos).length_squared()
    }

    /// Box grown by `delta` on both sides of every axis.
    pub fn stretched(&self, delta: DVec3) -> Self {
        Self::new(self.min - delta, self.max + delta)
    }

    /// Face planes in the order left, right, bottom, top, back, front.
    pub fn face_planes(&self) -> [Plane; 6] {
        [
            Plane::new(-DVec3::X, self.min),
            Plane::new(DVec3::X, self.max),
            Plane::new(-DVec3::Y, self.min),
            Plane::new(DVec3::Y, self.max),
            Plane::new(-DVec3::Z, self.min),
            Plane::new(DVec3::Z, self.max),
        ]
    }

    /// The eight corners.
    pub fn corners(&self) -> [DVec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            DVec3::new(lo.x, lo.y, lo.z),
            DVec3::new(hi.x, lo.y, lo.z),
            DVec3::new(lo.x, hi.y, lo.z),
            DVec3::new(lo.x, lo.y, hi.z),
            DVec3::new(hi.x, hi.y, hi.z),
            DVec3::new(lo.x, hi.y, hi.z),
            DVec3::new(hi.x, lo.y, hi.z),
            DVec3::new(hi.x, hi.y, lo.z),
        ]
    }
}

/// General sphere-box overlap, closed: a sphere that only touches a face,
/// edge, or corner overlaps.
///
/// The sphere centre must lie within the box grown by the radius on
/// every axis. Inside one of the three single-axis stretches (a face
/// slab) it overlaps outright; elsewhere the squared distance to the
/// box decides.
pub fn box_sphere_overlap(bounds: &Aabb3, sphere: &Sphere) -> bool {
    let r = sphere.radius;
    if !bounds.stretched(DVec3::splat(r)).contains_closed(sphere.origin) {
        return false;
    }

    for axis in [DVec3::X, DVec3::Y, DVec3::Z] {
        if bounds.stretched(axis * r).contains_closed(sphere.origin) {
            return true;
        }
    }

    bounds.distance_sq(sphere.origin) <= sqr(r)
}

/// Precomputed [`box_sphere_overlap`] for one box and one fixed radius.
///
/// Stores the face planes of the four stretched boxes so a query is a
/// handful of comparisons, falling back to the box distance only in the
/// edge and corner regions. Answers are only meaningful for spheres of
/// exactly [`radius`](Self::radius); callers with any other radius must
/// use [`box_sphere_overlap`].
#[derive(Clone, Debug, PartialEq)]
pub struct CubeSphereIntersection {
    planes: [Plane; 24],
    bounds: Aabb3,
    radius: f64,
    radius_sq: f64,
}

const SUPER_BOX: usize = 0;
const STRETCH_X: usize = 1;
const STRETCH_Y: usize = 2;
const STRETCH_Z: usize = 3;

impl CubeSphereIntersection {
    /// Bake the helper for `bounds` and `radius`.
    pub fn new(bounds: &Aabb3, radius: f64) -> Self {
        let mut planes = [Plane::default(); 24];
        let stretches = [
            (SUPER_BOX, DVec3::splat(radius)),
            (STRETCH_X, DVec3::X * radius),
            (STRETCH_Y, DVec3::Y * radius),
            (STRETCH_Z, DVec3::Z * radius),
        ];
        for (target, delta) in stretches {
            let faces = bounds.stretched(delta).face_planes();
            planes[target * 6..target * 6 + 6].copy_from_slice(&faces);
        }

        Self {
            planes,
            bounds: *bounds,
            radius,
            radius_sq: sqr(radius),
        }
    }

    /// The radius baked in at construction.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Whether a sphere of the baked radius centred at `sphere_pos`
    /// overlaps or touches the box.
    pub fn intersects(&self, sphere_pos: DVec3) -> bool {
        if !self.inside(SUPER_BOX, sphere_pos) {
            return false;
        }
        if self.inside(STRETCH_X, sphere_pos)
            || self.inside(STRETCH_Y, sphere_pos)
            || self.inside(STRETCH_Z, sphere_pos)
        {
            return true;
        }
        self.bounds.distance_sq(sphere_pos) <= self.radius_sq
    }

    #[inline]
    fn inside(&self, stretch: usize, pos: DVec3) -> bool {
        self.planes[stretch * 6..stretch * 6 + 6]
            .iter()
            .all(|p| p.is_inside_or_on(pos))
    }
}
