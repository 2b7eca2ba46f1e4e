//! Uniform cell layout over a fixed world extent.
//!
//! A position maps to a cell by subtracting the world's minimum corner,
//! dividing by the cell size and flooring. The three integer cell
//! coordinates are packed into one [`CellKey`] with 11 bits for x,
//! 10 bits for y and 11 bits for z. Positions outside the world extent
//! produce keys whose box does not contain them; the grid reports those
//! as placement inconsistencies.

use glam::DVec3;

use crate::error::SpaceError;
use crate::geometry::Aabb3;

/// Bits of the packed key holding the x cell coordinate.
pub const KEY_BITS_X: u32 = 11;
/// Bits of the packed key holding the y cell coordinate.
pub const KEY_BITS_Y: u32 = 10;
/// Bits of the packed key holding the z cell coordinate.
pub const KEY_BITS_Z: u32 = 11;

const MASK_X: u32 = (1 << KEY_BITS_X) - 1;
const MASK_Y: u32 = (1 << KEY_BITS_Y) - 1;
const MASK_Z: u32 = (1 << KEY_BITS_Z) - 1;
const SHIFT_Y: u32 = KEY_BITS_X;
const SHIFT_Z: u32 = KEY_BITS_X + KEY_BITS_Y;

/// Packed integer identifier of one grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey(pub u32);

impl CellKey {
    /// Pack per-axis cell coordinates. Coordinates wider than their
    /// field are truncated to it.
    pub fn pack(x: u32, y: u32, z: u32) -> Self {
        Self((x & MASK_X) | ((y & MASK_Y) << SHIFT_Y) | ((z & MASK_Z) << SHIFT_Z))
    }

    /// Per-axis cell coordinates.
    pub fn unpack(self) -> [u32; 3] {
        [
            self.0 & MASK_X,
            (self.0 >> SHIFT_Y) & MASK_Y,
            (self.0 >> SHIFT_Z) & MASK_Z,
        ]
    }
}

/// Geometry of the spatial grid.
///
/// `query_radius` is baked into every bucket's intersection helper when
/// the grid is built. Queries with any other radius still work, but
/// take the slower exact sphere-box path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    /// World extent covered by the grid.
    pub world: Aabb3,
    /// Edge length of each cubic cell.
    pub cell_size: f64,
    /// Query radius baked into bucket intersection helpers.
    pub query_radius: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            world: Aabb3::centred(1000.0),
            cell_size: 8.0,
            query_radius: 18.0,
        }
    }
}

impl GridLayout {
    /// Check that the layout is usable and fits the key budget.
    pub fn validate(&self) -> Result<(), SpaceError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(SpaceError::InvalidCellSize {
                value: self.cell_size,
            });
        }
        if !self.query_radius.is_finite() || self.query_radius <= 0.0 {
            return Err(SpaceError::InvalidQueryRadius {
                value: self.query_radius,
            });
        }
        let size = self.world.size();
        let axes = [
            ("x", size.x, KEY_BITS_X),
            ("y", size.y, KEY_BITS_Y),
            ("z", size.z, KEY_BITS_Z),
        ];
        for (axis, extent, bits) in axes {
            if !extent.is_finite() || extent <= 0.0 {
                return Err(SpaceError::EmptyWorld {
                    reason: format!("extent along {axis} is {extent}"),
                });
            }
            let cells = (extent / self.cell_size).ceil() as u64;
            let max = 1u64 << bits;
            if cells > max {
                return Err(SpaceError::ExtentExceedsKeyBudget { axis, cells, max });
            }
        }
        Ok(())
    }

    /// Key of the cell containing `pos`.
    pub fn cell_of(&self, pos: DVec3) -> CellKey {
        let idx = ((pos - self.world.min) / self.cell_size).floor();
        // `as` saturates: positions below the world minimum land in cell 0.
        CellKey::pack(idx.x as u32, idx.y as u32, idx.z as u32)
    }

    /// Box covered by the cell `key`.
    pub fn cell_bounds(&self, key: CellKey) -> Aabb3 {
        let [x, y, z] = key.unpack();
        let lo = DVec3::new(x as f64, y as f64, z as f64);
        Aabb3::new(
            self.world.min + lo * self.cell_size,
            self.world.min + (lo + DVec3::ONE) * self.cell_size,
        )
    }
}
