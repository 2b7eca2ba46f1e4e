//! Steering engine for the flocking simulation.
//!
//! Pure functions with no hidden state: [`steer`] turns a neighbour set
//! into a raw steering vector, [`shape`] applies the soft world
//! boundary, and [`turn`] rotates the heading under a turn-rate limit
//! and integrates position. [`integrate`] chains all three.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod steer;
pub mod turn;

pub use boundary::{keep_at_good_height, keep_near_origin, shape, BoundaryConfig};
pub use steer::steer;
pub use turn::{integrate, rotate_toward, turn};
