//! Uniform spatial grid rebuilt from scratch every tick.
//!
//! Every agent with a transform is appended to the bucket of the cell
//! containing it. Buckets are created on first use, carry the cell's box
//! and a [`CubeSphereIntersection`] baked for the layout's query radius,
//! and never survive a rebuild.

use flock_core::AgentId;
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::cache::TransformCache;
use crate::error::SpaceError;
use crate::geometry::{box_sphere_overlap, Aabb3, CubeSphereIntersection, Sphere};
use crate::layout::{CellKey, GridLayout};

/// One agent filed in a bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketMember {
    /// Agent identity.
    pub id: AgentId,
    /// Slot of the agent in this tick's [`TransformCache`].
    pub slot: usize,
}

/// A non-empty grid cell.
#[derive(Clone, Debug)]
pub struct SpatialBucket {
    key: CellKey,
    bounds: Aabb3,
    members: SmallVec<[BucketMember; 8]>,
    helper: CubeSphereIntersection,
}

impl SpatialBucket {
    fn new(key: CellKey, bounds: Aabb3, query_radius: f64) -> Self {
        Self {
            key,
            bounds,
            members: SmallVec::new(),
            helper: CubeSphereIntersection::new(&bounds, query_radius),
        }
    }

    /// Packed cell key.
    pub fn key(&self) -> CellKey {
        self.key
    }

    /// Box covered by the cell.
    pub fn bounds(&self) -> &Aabb3 {
        &self.bounds
    }

    /// Members in insertion (slot) order.
    pub fn members(&self) -> &[BucketMember] {
        &self.members
    }

    /// Intersection helper baked at bucket creation.
    pub fn helper(&self) -> &CubeSphereIntersection {
        &self.helper
    }

    /// Whether `sphere` overlaps the cell.
    ///
    /// Uses the baked helper when the radius matches exactly and the
    /// general sphere-box test otherwise.
    pub fn overlaps(&self, sphere: &Sphere) -> bool {
        if sphere.radius == self.helper.radius() {
            self.helper.intersects(sphere.origin)
        } else {
            box_sphere_overlap(&self.bounds, sphere)
        }
    }
}

/// Result of one grid rebuild.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridBuildStats {
    /// Agents filed.
    pub agents: usize,
    /// Buckets created.
    pub buckets: usize,
    /// Agents whose computed cell box does not contain them.
    pub misplaced: usize,
}

/// Buckets of all occupied cells, keyed by [`CellKey`].
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    layout: GridLayout,
    buckets: IndexMap<CellKey, SpatialBucket>,
}

impl SpatialGrid {
    /// Empty grid over `layout`.
    pub fn new(layout: GridLayout) -> Result<Self, SpaceError> {
        layout.validate()?;
        Ok(Self {
            layout,
            buckets: IndexMap::new(),
        })
    }

    /// Grid over `layout` populated from `cache`.
    pub fn build(layout: GridLayout, cache: &TransformCache) -> Result<Self, SpaceError> {
        let mut grid = Self::new(layout)?;
        grid.rebuild(cache);
        Ok(grid)
    }

    /// Discard every bucket and refile all agents in `cache`.
    ///
    /// An agent whose cell box does not contain it (only possible when
    /// it lies outside the world extent) is still filed under the
    /// computed key and reported once with `warn!`.
    pub fn rebuild(&mut self, cache: &TransformCache) -> GridBuildStats {
        self.buckets.clear();
        let mut stats = GridBuildStats::default();

        for (slot, id, transform) in cache.iter() {
            let pos = transform.position;
            let key = self.layout.cell_of(pos);
            let layout = &self.layout;
            let bucket = self.buckets.entry(key).or_insert_with(|| {
                SpatialBucket::new(key, layout.cell_bounds(key), layout.query_radius)
            });
            if !bucket.bounds.contains(pos) {
                stats.misplaced += 1;
                warn!(
                    agent = %id,
                    ?pos,
                    bounds = ?bucket.bounds,
                    "agent placed in a cell that does not contain it"
                );
            }
            bucket.members.push(BucketMember { id, slot });
            stats.agents += 1;
        }

        stats.buckets = self.buckets.len();
        stats
    }

    /// The layout the grid was built with.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Number of occupied cells.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket for `key`, if occupied.
    pub fn bucket(&self, key: CellKey) -> Option<&SpatialBucket> {
        self.buckets.get(&key)
    }

    /// All buckets in creation order.
    pub fn buckets(&self) -> impl Iterator<Item = &SpatialBucket> + '_ {
        self.buckets.values()
    }

    /// Buckets whose cell overlaps `sphere`, in no particular order.
    pub fn cells_overlapping<'a>(
        &'a self,
        sphere: &'a Sphere,
    ) -> impl Iterator<Item = &'a SpatialBucket> + 'a {
        if sphere.radius != self.layout.query_radius {
            trace!(
                query_radius = sphere.radius,
                baked_radius = self.layout.query_radius,
                "query radius differs from baked radius, using exact box test"
            );
        }
        self.buckets.values().filter(move |b| b.overlaps(sphere))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::{AgentRecord, DVec3, FlockingParams, Transform};
    use proptest::prelude::*;

    fn record(id: u64, pos: DVec3) -> AgentRecord {
        AgentRecord::new(
            AgentId(id),
            Transform::at(pos, DVec3::Z),
            FlockingParams::default(),
        )
    }

    fn cache_of(positions: &[DVec3]) -> TransformCache {
        let records: Vec<AgentRecord> = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| record(i as u64, p))
            .collect();
        TransformCache::from_records(&records)
    }

    // ── Build ───────────────────────────────────────────────────

    #[test]
    fn agents_in_same_cell_share_bucket() {
        let cache = cache_of(&[
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(7.0, 2.0, 3.0),
            DVec3::new(9.0, 1.0, 1.0),
        ]);
        let grid = SpatialGrid::build(GridLayout::default(), &cache).unwrap();
        assert_eq!(grid.bucket_count(), 2);

        let first = grid.buckets().next().unwrap();
        let slots: Vec<usize> = first.members().iter().map(|m| m.slot).collect();
        assert_eq!(slots, vec![0, 1]);
        assert!(first.bounds().contains(DVec3::new(1.0, 1.0, 1.0)));
        assert_eq!(first.helper().radius(), 18.0);
    }

    #[test]
    fn holes_are_not_filed() {
        let records = vec![
            record(0, DVec3::ONE),
            AgentRecord {
                id: AgentId(1),
                transform: None,
                params: None,
            },
            record(2, DVec3::ONE),
        ];
        let cache = TransformCache::from_records(&records);
        let mut grid = SpatialGrid::new(GridLayout::default()).unwrap();
        let stats = grid.rebuild(&cache);
        assert_eq!(stats.agents, 2);
        assert_eq!(stats.buckets, 1);
        let ids: Vec<AgentId> = grid.buckets().next().unwrap().members().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![AgentId(0), AgentId(2)]);
    }

    #[test]
    fn rebuild_discards_previous_buckets() {
        let mut grid = SpatialGrid::build(GridLayout::default(), &cache_of(&[DVec3::ONE])).unwrap();
        assert_eq!(grid.bucket_count(), 1);
        let stats = grid.rebuild(&cache_of(&[]));
        assert_eq!(stats, GridBuildStats::default());
        assert_eq!(grid.bucket_count(), 0);
    }

    #[test]
    fn out_of_world_agent_is_reported_but_filed() {
        let cache = cache_of(&[DVec3::new(-5000.0, 0.0, 0.0)]);
        let mut grid = SpatialGrid::new(GridLayout::default()).unwrap();
        let stats = grid.rebuild(&cache);
        assert_eq!(stats.misplaced, 1);
        assert_eq!(grid.bucket_count(), 1);
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let layout = GridLayout {
            cell_size: -1.0,
            ..GridLayout::default()
        };
        assert!(SpatialGrid::new(layout).is_err());
    }

    // ── Queries ─────────────────────────────────────────────────

    #[test]
    fn overlapping_cells_at_baked_radius() {
        let cache = cache_of(&[
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(100.0, 1.0, 1.0),
        ]);
        let grid = SpatialGrid::build(GridLayout::default(), &cache).unwrap();
        let sphere = Sphere::new(DVec3::new(-10.0, 0.0, 0.0), 18.0);
        let hits: Vec<CellKey> = grid.cells_overlapping(&sphere).map(|b| b.key()).collect();
        assert_eq!(hits, vec![grid.layout().cell_of(DVec3::ONE)]);
    }

    #[test]
    fn other_radius_falls_back_to_exact_test() {
        let cache = cache_of(&[DVec3::new(1.0, 1.0, 1.0)]);
        let grid = SpatialGrid::build(GridLayout::default(), &cache).unwrap();
        // 15 units from the cell face: inside the baked 18 but outside 5.
        let sphere = Sphere::new(DVec3::new(-15.0, 4.0, 4.0), 5.0);
        assert_eq!(grid.cells_overlapping(&sphere).count(), 0);
        let wide = Sphere::new(DVec3::new(-15.0, 4.0, 4.0), 18.0);
        assert_eq!(grid.cells_overlapping(&wide).count(), 1);
    }

    proptest! {
        #[test]
        fn bucket_overlap_matches_exact_test(
            ax in -50.0f64..50.0, ay in -50.0f64..50.0, az in -50.0f64..50.0,
            qx in -80.0f64..80.0, qy in -80.0f64..80.0, qz in -80.0f64..80.0,
            radius in prop_oneof![Just(18.0f64), 1.0f64..30.0],
        ) {
            let cache = cache_of(&[DVec3::new(ax, ay, az)]);
            let grid = SpatialGrid::build(GridLayout::default(), &cache).unwrap();
            let sphere = Sphere::new(DVec3::new(qx, qy, qz), radius);
            let bucket = grid.buckets().next().unwrap();
            prop_assert_eq!(
                grid.cells_overlapping(&sphere).count() == 1,
                box_sphere_overlap(bucket.bounds(), &sphere)
            );
        }
    }
}
