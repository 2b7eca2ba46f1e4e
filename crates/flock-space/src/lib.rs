//! Spatial indexing for the flocking simulation.
//!
//! Provides the geometry kernel ([`Aabb3`], [`Sphere`], [`Plane`] and the
//! precomputed [`CubeSphereIntersection`]), the per-tick
//! [`TransformCache`], the uniform [`SpatialGrid`] rebuilt every tick,
//! and bounded k-nearest [`NeighbourSearch`] over both.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod layout;
pub mod neighbours;

pub use cache::TransformCache;
pub use error::SpaceError;
pub use flock_core::NeighbourCandidate;
pub use geometry::{box_sphere_overlap, Aabb3, CubeSphereIntersection, Plane, Sphere};
pub use grid::{BucketMember, GridBuildStats, SpatialBucket, SpatialGrid};
pub use layout::{CellKey, GridLayout, KEY_BITS_X, KEY_BITS_Y, KEY_BITS_Z};
pub use neighbours::{
    visible_distance_sq, NeighbourBuffer, NeighbourSearch, SearchMode, SearchStats,
};
