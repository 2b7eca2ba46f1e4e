//! Bounded neighbour search.
//!
//! A search walks the buckets overlapping the observer's query sphere,
//! filters members through [`visible_distance_sq`], and keeps the `k`
//! closest survivors in a reusable [`NeighbourBuffer`]. The result is a
//! bounded approximation: ties and insertion order are not stable.

use flock_core::math::sqr;
use flock_core::{AgentId, FlockingParams, NeighbourCandidate, Transform, EPSILON};

use crate::cache::TransformCache;
use crate::geometry::Sphere;
use crate::grid::SpatialGrid;

/// Squared distance from `observer` to `other` if `other` is a usable
/// neighbour, `None` otherwise.
///
/// Rejects agents beyond `search_range`, agents practically coincident
/// with the observer, and agents behind the observer's heading.
pub fn visible_distance_sq(observer: &Transform, other: &Transform, search_range: f64) -> Option<f64> {
    let line_to = other.position - observer.position;
    let dist_sq = line_to.length_squared();
    if dist_sq > sqr(search_range) {
        return None;
    }
    if dist_sq < sqr(EPSILON) {
        return None;
    }
    if line_to.dot(observer.forward) < 0.0 {
        return None;
    }
    Some(dist_sq)
}

/// Fixed-capacity neighbour set using replace-the-current-worst.
///
/// Allocated once per worker and reset for every agent. While fewer than
/// `k` entries are held a candidate is appended; after that it replaces
/// the furthest entry only if strictly closer, and the furthest entry is
/// found again by a linear scan.
#[derive(Clone, Debug)]
pub struct NeighbourBuffer {
    entries: Vec<NeighbourCandidate>,
    capacity: usize,
    limit: usize,
    furthest: usize,
}

impl NeighbourBuffer {
    /// Buffer that never holds more than `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            limit: capacity,
            furthest: 0,
        }
    }

    /// Empty the buffer and accept at most `k` entries, clamped to the
    /// capacity.
    pub fn reset(&mut self, k: usize) {
        self.entries.clear();
        self.limit = k.min(self.capacity);
        self.furthest = 0;
    }

    /// Offer a candidate. Returns whether it was retained.
    pub fn offer(&mut self, candidate: NeighbourCandidate) -> bool {
        if self.limit == 0 {
            return false;
        }
        if self.entries.len() < self.limit {
            self.entries.push(candidate);
            let last = self.entries.len() - 1;
            if last == 0 || candidate.distance_sq > self.entries[self.furthest].distance_sq {
                self.furthest = last;
            }
            return true;
        }
        if candidate.distance_sq >= self.entries[self.furthest].distance_sq {
            return false;
        }
        self.entries[self.furthest] = candidate;
        let mut worst = 0;
        for (i, c) in self.entries.iter().enumerate().skip(1) {
            if c.distance_sq > self.entries[worst].distance_sq {
                worst = i;
            }
        }
        self.furthest = worst;
        true
    }

    /// Retained candidates, unordered.
    pub fn as_slice(&self) -> &[NeighbourCandidate] {
        &self.entries
    }

    /// Number of retained candidates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry limit for the current search.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Hard capacity fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// How candidates are enumerated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Walk only buckets overlapping the query sphere.
    #[default]
    Grid,
    /// Scan every slot of the transform cache.
    Linear,
}

/// Counters from one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Candidates examined by the visibility predicate.
    pub visited: usize,
    /// Candidates that passed the predicate.
    pub accepted: usize,
}

/// Read-only view over one tick's grid and cache.
///
/// Both must have been built from the same snapshot: bucket members are
/// resolved through their cache slot.
#[derive(Clone, Copy, Debug)]
pub struct NeighbourSearch<'a> {
    grid: &'a SpatialGrid,
    cache: &'a TransformCache,
}

impl<'a> NeighbourSearch<'a> {
    /// View over `grid` and the `cache` it was built from.
    pub fn new(grid: &'a SpatialGrid, cache: &'a TransformCache) -> Self {
        Self { grid, cache }
    }

    /// Fill `buffer` with up to `params.number_to_consider` neighbours of
    /// agent `me`, enumerating candidates according to `mode`.
    pub fn search(
        &self,
        mode: SearchMode,
        me: AgentId,
        observer: &Transform,
        params: &FlockingParams,
        buffer: &mut NeighbourBuffer,
    ) -> SearchStats {
        match mode {
            SearchMode::Grid => self.k_nearest(me, observer, params, buffer),
            SearchMode::Linear => self.k_nearest_linear(me, observer, params, buffer),
        }
    }

    /// Grid search over the buckets overlapping the query sphere.
    pub fn k_nearest(
        &self,
        me: AgentId,
        observer: &Transform,
        params: &FlockingParams,
        buffer: &mut NeighbourBuffer,
    ) -> SearchStats {
        buffer.reset(params.number_to_consider as usize);
        let mut stats = SearchStats::default();
        let sphere = Sphere::new(observer.position, params.search_range);

        for bucket in self.grid.cells_overlapping(&sphere) {
            for member in bucket.members() {
                if member.id == me {
                    continue;
                }
                let Some(other) = self.cache.get(member.slot) else {
                    continue;
                };
                self.consider(member.id, observer, other, params.search_range, buffer, &mut stats);
            }
        }
        stats
    }

    /// Linear scan of the whole cache, same predicate and selection.
    pub fn k_nearest_linear(
        &self,
        me: AgentId,
        observer: &Transform,
        params: &FlockingParams,
        buffer: &mut NeighbourBuffer,
    ) -> SearchStats {
        buffer.reset(params.number_to_consider as usize);
        let mut stats = SearchStats::default();
        for (_, id, other) in self.cache.iter() {
            if id == me {
                continue;
            }
            self.consider(id, observer, other, params.search_range, buffer, &mut stats);
        }
        stats
    }

    /// Number of agents passing the visibility predicate, by linear scan.
    pub fn count_visible_linear(&self, me: AgentId, observer: &Transform, search_range: f64) -> usize {
        self.cache
            .iter()
            .filter(|(_, id, other)| {
                *id != me && visible_distance_sq(observer, other, search_range).is_some()
            })
            .count()
    }

    fn consider(
        &self,
        id: AgentId,
        observer: &Transform,
        other: &Transform,
        search_range: f64,
        buffer: &mut NeighbourBuffer,
        stats: &mut SearchStats,
    ) {
        stats.visited += 1;
        if let Some(distance_sq) = visible_distance_sq(observer, other, search_range) {
            stats.accepted += 1;
            buffer.offer(NeighbourCandidate {
                id,
                transform: *other,
                distance_sq,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::GridLayout;
    use flock_core::{AgentRecord, DVec3};
    use proptest::prelude::*;

    fn candidate(id: u64, distance_sq: f64) -> NeighbourCandidate {
        NeighbourCandidate {
            id: AgentId(id),
            transform: Transform::default(),
            distance_sq,
        }
    }

    fn scenario_records() -> Vec<AgentRecord> {
        let params = FlockingParams {
            search_range: 5.0,
            number_to_consider: 2,
            attract_coefficient: 0.5,
            follow_coefficient: 0.5,
            repel_coefficient: 1.0,
            repel_separation_for_half: 2.0,
            ..FlockingParams::default()
        };
        vec![
            AgentRecord::new(AgentId(1), Transform::at(DVec3::ZERO, DVec3::Z), params),
            AgentRecord::new(
                AgentId(2),
                Transform::at(DVec3::X, DVec3::Z).with_velocity(DVec3::Z),
                params,
            ),
            AgentRecord::new(
                AgentId(3),
                Transform::at(DVec3::Z, DVec3::Z).with_velocity(DVec3::Z),
                params,
            ),
        ]
    }

    // ── Visibility ──────────────────────────────────────────────

    #[test]
    fn visibility_rejects_far_coincident_and_behind() {
        let me = Transform::at(DVec3::ZERO, DVec3::Z);
        let ahead = Transform::at(DVec3::new(0.0, 0.0, 3.0), DVec3::Z);
        let far = Transform::at(DVec3::new(0.0, 0.0, 30.0), DVec3::Z);
        let behind = Transform::at(DVec3::new(0.0, 0.0, -3.0), DVec3::Z);
        let coincident = Transform::at(DVec3::splat(1e-5), DVec3::Z);

        assert_eq!(visible_distance_sq(&me, &ahead, 5.0), Some(9.0));
        assert_eq!(visible_distance_sq(&me, &far, 5.0), None);
        assert_eq!(visible_distance_sq(&me, &behind, 5.0), None);
        assert_eq!(visible_distance_sq(&me, &coincident, 5.0), None);
    }

    #[test]
    fn visibility_accepts_side_and_boundary() {
        let me = Transform::at(DVec3::ZERO, DVec3::Z);
        let side = Transform::at(DVec3::X, DVec3::Z);
        let edge = Transform::at(DVec3::new(0.0, 0.0, 5.0), DVec3::Z);
        assert_eq!(visible_distance_sq(&me, &side, 5.0), Some(1.0));
        assert_eq!(visible_distance_sq(&me, &edge, 5.0), Some(25.0));
    }

    // ── Grid boundaries ─────────────────────────────────────────

    fn grid_and_linear_accepted(observer: Transform, neighbour: Transform, range: f64) -> (usize, usize) {
        let params = FlockingParams {
            search_range: range,
            number_to_consider: 8,
            ..FlockingParams::default()
        };
        let records = vec![
            AgentRecord::new(AgentId(1), observer, params),
            AgentRecord::new(AgentId(2), neighbour, params),
        ];
        let cache = TransformCache::from_records(&records);
        let grid = SpatialGrid::build(GridLayout::default(), &cache).unwrap();
        let search = NeighbourSearch::new(&grid, &cache);
        let mut buf = NeighbourBuffer::with_capacity(8);
        let g = search.k_nearest(AgentId(1), &observer, &params, &mut buf);
        let l = search.k_nearest_linear(AgentId(1), &observer, &params, &mut buf);
        (g.accepted, l.accepted)
    }

    #[test]
    fn neighbour_at_range_on_cell_face_is_found() {
        // The neighbour sits on the low x face of its cell, exactly one
        // baked radius ahead of the observer.
        let range = GridLayout::default().query_radius;
        let observer = Transform::at(DVec3::new(-range, 4.0, 4.0), DVec3::X);
        let neighbour = Transform::at(DVec3::new(0.0, 4.0, 4.0), DVec3::X);
        assert_eq!(grid_and_linear_accepted(observer, neighbour, range), (1, 1));
    }

    #[test]
    fn neighbour_near_cell_edge_is_found() {
        // In range across a cell edge but further than range from every
        // corner of the neighbour's cell.
        let observer = Transform::at(DVec3::new(4.0, -12.6, -12.6), DVec3::new(0.0, 1.0, 1.0).normalize());
        let neighbour = Transform::at(DVec3::new(4.0, 0.0, 0.0), DVec3::X);
        assert_eq!(grid_and_linear_accepted(observer, neighbour, 18.0), (1, 1));
    }

    // ── Buffer ──────────────────────────────────────────────────

    #[test]
    fn buffer_keeps_k_closest() {
        let mut buf = NeighbourBuffer::with_capacity(8);
        buf.reset(3);
        for (i, d) in [9.0, 4.0, 16.0, 1.0, 25.0, 2.0].into_iter().enumerate() {
            buf.offer(candidate(i as u64, d));
        }
        let mut kept: Vec<f64> = buf.as_slice().iter().map(|c| c.distance_sq).collect();
        kept.sort_by(f64::total_cmp);
        assert_eq!(kept, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn buffer_rejects_equal_to_worst_when_full() {
        let mut buf = NeighbourBuffer::with_capacity(2);
        buf.reset(2);
        assert!(buf.offer(candidate(1, 4.0)));
        assert!(buf.offer(candidate(2, 9.0)));
        assert!(!buf.offer(candidate(3, 9.0)));
        assert!(buf.offer(candidate(4, 1.0)));
        let ids: Vec<AgentId> = buf.as_slice().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![AgentId(1), AgentId(4)]);
    }

    #[test]
    fn zero_k_rejects_everything() {
        let mut buf = NeighbourBuffer::with_capacity(4);
        buf.reset(0);
        assert!(!buf.offer(candidate(1, 1.0)));
        assert!(buf.is_empty());
    }

    #[test]
    fn k_is_clamped_to_capacity() {
        let mut buf = NeighbourBuffer::with_capacity(2);
        buf.reset(10);
        assert_eq!(buf.limit(), 2);
        for i in 0..5 {
            buf.offer(candidate(i, 10.0 - i as f64));
        }
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.capacity(), 2);
    }

    // ── Search ──────────────────────────────────────────────────

    #[test]
    fn scenario_finds_both_neighbours() {
        let records = scenario_records();
        let cache = TransformCache::from_records(&records);
        let grid = SpatialGrid::build(GridLayout::default(), &cache).unwrap();
        let search = NeighbourSearch::new(&grid, &cache);
        let me = &records[0];
        let mut buf = NeighbourBuffer::with_capacity(32);

        let stats = search.k_nearest(
            me.id,
            me.transform.as_ref().unwrap(),
            me.params.as_ref().unwrap(),
            &mut buf,
        );
        assert_eq!(stats, SearchStats { visited: 2, accepted: 2 });
        let mut ids: Vec<u64> = buf.as_slice().iter().map(|c| c.id.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn holes_are_skipped() {
        let mut records = scenario_records();
        records[1].transform = None;
        let cache = TransformCache::from_records(&records);
        let grid = SpatialGrid::build(GridLayout::default(), &cache).unwrap();
        let search = NeighbourSearch::new(&grid, &cache);
        let me = &records[0];
        let mut buf = NeighbourBuffer::with_capacity(32);
        for mode in [SearchMode::Grid, SearchMode::Linear] {
            search.search(
                mode,
                me.id,
                me.transform.as_ref().unwrap(),
                me.params.as_ref().unwrap(),
                &mut buf,
            );
            assert_eq!(buf.len(), 1);
            assert_eq!(buf.as_slice()[0].id, AgentId(3));
        }
    }

    proptest! {
        #[test]
        fn selection_is_bounded_and_ordered(
            distances in prop::collection::vec(0.0f64..1000.0, 0..64),
            k in 0usize..12,
        ) {
            let mut buf = NeighbourBuffer::with_capacity(32);
            buf.reset(k);
            for (i, &d) in distances.iter().enumerate() {
                buf.offer(candidate(i as u64, d));
            }
            prop_assert!(buf.len() <= k);
            prop_assert_eq!(buf.len(), k.min(distances.len()));

            let kept: Vec<u64> = buf.as_slice().iter().map(|c| c.id.0).collect();
            let worst_kept = buf
                .as_slice()
                .iter()
                .map(|c| c.distance_sq)
                .fold(f64::NEG_INFINITY, f64::max);
            for (i, &d) in distances.iter().enumerate() {
                if !kept.contains(&(i as u64)) {
                    prop_assert!(worst_kept <= d);
                }
            }
        }

        #[test]
        fn grid_and_linear_accept_the_same_agents(
            points in prop::collection::vec(
                (-40.0f64..40.0, -40.0f64..40.0, -40.0f64..40.0), 1..60),
            range in prop_oneof![Just(18.0f64), 2.0f64..30.0],
        ) {
            let params = FlockingParams {
                search_range: range,
                number_to_consider: 64,
                ..FlockingParams::default()
            };
            let records: Vec<AgentRecord> = points
                .iter()
                .enumerate()
                .map(|(i, &(x, y, z))| AgentRecord::new(
                    AgentId(i as u64),
                    Transform::at(DVec3::new(x, y, z), DVec3::X),
                    params,
                ))
                .collect();
            let cache = TransformCache::from_records(&records);
            let grid = SpatialGrid::build(GridLayout::default(), &cache).unwrap();
            let search = NeighbourSearch::new(&grid, &cache);

            let me = &records[0];
            let observer = me.transform.unwrap();
            let mut grid_buf = NeighbourBuffer::with_capacity(64);
            let mut linear_buf = NeighbourBuffer::with_capacity(64);
            let g = search.k_nearest(me.id, &observer, &params, &mut grid_buf);
            let l = search.k_nearest_linear(me.id, &observer, &params, &mut linear_buf);

            prop_assert_eq!(g.accepted, l.accepted);
            prop_assert_eq!(g.accepted, search.count_visible_linear(me.id, &observer, range));
            let mut a: Vec<u64> = grid_buf.as_slice().iter().map(|c| c.id.0).collect();
            let mut b: Vec<u64> = linear_buf.as_slice().iter().map(|c| c.id.0).collect();
            a.sort_unstable();
            b.sort_unstable();
            prop_assert_eq!(a, b);
        }
    }
}
