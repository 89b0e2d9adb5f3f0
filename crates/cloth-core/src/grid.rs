use glam::Vec3;
use tracing::debug;

use crate::error::{ClothError, ClothResult};

/// Buckets allocated per particle of capacity.
const TABLE_SIZE_FACTOR: usize = 5;
/// Initial adjacency slots allocated per particle of capacity.
const ADJACENCY_SLOTS_PER_PARTICLE: usize = 10;

/// Self-collision candidate pairs in CSR layout.
///
/// For particle `i`, `ids[offsets[i]..offsets[i + 1]]` lists every candidate
/// `j < i`, so each unordered pair is owned by its higher id.
pub struct AdjacencyList {
    first_adj_id: Vec<u32>,
    /// Backing buffer; only the first `len` slots are live.
    adj_ids: Vec<u32>,
    len: usize,
}

impl AdjacencyList {
    fn with_capacity(max_particles: usize) -> Self {
        Self {
            first_adj_id: vec![0; max_particles + 1],
            adj_ids: vec![0; ADJACENCY_SLOTS_PER_PARTICLE * max_particles],
            len: 0,
        }
    }

    /// Candidates recorded for particle `i`.
    #[inline]
    pub fn neighbors(&self, i: usize) -> &[u32] {
        let first = self.first_adj_id[i] as usize;
        let last = self.first_adj_id[i + 1] as usize;
        &self.adj_ids[first..last]
    }

    /// Total number of recorded pairs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots available before the buffer has to grow again.
    pub fn capacity(&self) -> usize {
        self.adj_ids.len()
    }

    pub fn offsets(&self) -> &[u32] {
        &self.first_adj_id
    }

    pub fn ids(&self) -> &[u32] {
        &self.adj_ids[..self.len]
    }

    #[inline]
    fn push(&mut self, id: u32) {
        if self.len >= self.adj_ids.len() {
            let grown = (2 * self.len).max(1);
            debug!(from = self.adj_ids.len(), to = grown, "growing adjacency buffer");
            self.adj_ids.resize(grown, 0);
        }
        self.adj_ids[self.len] = id;
        self.len += 1;
    }
}

/// Uniform spatial hash grid for broad-phase self-collision.
///
/// Uses counting sort for O(N) construction: count particles per bucket ->
/// prefix sum -> scatter back to front. Distinct cells may share a bucket;
/// callers filter candidates by true distance.
pub struct SpatialHashGrid {
    spacing: f32,
    table_size: usize,
    max_particles: usize,
    /// Number of particles hashed by the last `build`
    num_objects: usize,
    /// cell_start[h]..cell_start[h + 1] is the range of bucket h in cell_entries.
    /// The final entry is a guard equal to the number of hashed particles.
    cell_start: Vec<u32>,
    /// Particle indices grouped by bucket
    cell_entries: Vec<u32>,
    /// Scratch output of the last range query
    query_ids: Vec<u32>,
    /// Per-bucket stamp so a bucket hit by two cells of one query box is scanned once
    bucket_stamp: Vec<u32>,
    query_stamp: u32,
    adjacency: AdjacencyList,
}

impl SpatialHashGrid {
    /// Create a grid with the given cell size and particle capacity.
    pub fn new(spacing: f32, max_particles: usize) -> ClothResult<Self> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(ClothError::InvalidSpacing(spacing));
        }
        if max_particles == 0 {
            return Err(ClothError::InvalidCapacity);
        }
        let table_size = TABLE_SIZE_FACTOR * max_particles;
        Ok(Self {
            spacing,
            table_size,
            max_particles,
            num_objects: 0,
            cell_start: vec![0; table_size + 1],
            cell_entries: vec![0; max_particles],
            query_ids: Vec::with_capacity(max_particles),
            bucket_stamp: vec![0; table_size],
            query_stamp: 0,
            adjacency: AdjacencyList::with_capacity(max_particles),
        })
    }

    /// Rebuild the table from current positions.
    /// Particles beyond the grid's capacity are ignored.
    pub fn build(&mut self, positions: &[Vec3]) {
        let num_objects = positions.len().min(self.max_particles);
        self.num_objects = num_objects;

        // 1. Count particles per bucket
        self.cell_start.fill(0);
        self.cell_entries.fill(0);
        for pos in &positions[..num_objects] {
            let h = self.hash_pos(*pos);
            self.cell_start[h] += 1;
        }

        // 2. Running sum: cell_start[h] becomes the exclusive end of bucket h
        let mut start = 0u32;
        for slot in self.cell_start[..self.table_size].iter_mut() {
            start += *slot;
            *slot = start;
        }
        self.cell_start[self.table_size] = start;

        // 3. Scatter back to front; each decrement leaves cell_start[h] at the bucket start
        for (i, pos) in positions[..num_objects].iter().enumerate() {
            let h = self.hash_pos(*pos);
            self.cell_start[h] -= 1;
            self.cell_entries[self.cell_start[h] as usize] = i as u32;
        }
    }

    /// Collect every particle hashed into the box of cells covering
    /// `positions[i] ± max_dist`.
    ///
    /// The result over-approximates the sphere of radius `max_dist`; callers
    /// are responsible for distance checks. Cost grows with
    /// `(max_dist / spacing)^3`.
    pub fn range_query(&mut self, positions: &[Vec3], i: usize, max_dist: f32) -> &[u32] {
        let pos = positions[i];
        let lo = self.cell_coords(pos - Vec3::splat(max_dist));
        let hi = self.cell_coords(pos + Vec3::splat(max_dist));

        self.query_ids.clear();
        self.next_query_stamp();

        for xi in lo.0..=hi.0 {
            for yi in lo.1..=hi.1 {
                for zi in lo.2..=hi.2 {
                    let h = self.hash_coords(xi, yi, zi);
                    if self.bucket_stamp[h] == self.query_stamp {
                        continue;
                    }
                    self.bucket_stamp[h] = self.query_stamp;
                    let start = self.cell_start[h] as usize;
                    let end = self.cell_start[h + 1] as usize;
                    self.query_ids.extend_from_slice(&self.cell_entries[start..end]);
                }
            }
        }

        &self.query_ids
    }

    /// Precompute, for every particle, the lower-indexed particles within
    /// `max_dist` of it. Must follow a `build` on the same positions.
    pub fn build_adjacency(&mut self, positions: &[Vec3], max_dist: f32) {
        let max_dist2 = max_dist * max_dist;
        let num_objects = self.num_objects.min(positions.len());
        self.adjacency.len = 0;

        for id0 in 0..num_objects {
            self.adjacency.first_adj_id[id0] = self.adjacency.len as u32;
            let p0 = positions[id0];
            self.range_query(positions, id0, max_dist);

            for q in 0..self.query_ids.len() {
                let id1 = self.query_ids[q];
                if id1 as usize >= id0 {
                    continue;
                }
                if p0.distance_squared(positions[id1 as usize]) > max_dist2 {
                    continue;
                }
                self.adjacency.push(id1);
            }
        }

        let total = self.adjacency.len as u32;
        for offset in self.adjacency.first_adj_id[num_objects..].iter_mut() {
            *offset = total;
        }
    }

    pub fn adjacency(&self) -> &AdjacencyList {
        &self.adjacency
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn table_size(&self) -> usize {
        self.table_size
    }

    pub fn cell_start(&self) -> &[u32] {
        &self.cell_start
    }

    /// Particle ids grouped by bucket, for the particles of the last build.
    pub fn cell_entries(&self) -> &[u32] {
        &self.cell_entries[..self.num_objects]
    }

    /// Bucket index of the cell containing `pos`.
    #[inline]
    pub fn hash_pos(&self, pos: Vec3) -> usize {
        let (xi, yi, zi) = self.cell_coords(pos);
        self.hash_coords(xi, yi, zi)
    }

    /// Hash function: cell coords -> table index
    #[inline]
    fn hash_coords(&self, xi: i32, yi: i32, zi: i32) -> usize {
        let h = xi.wrapping_mul(92837111)
            ^ yi.wrapping_mul(689287499)
            ^ zi.wrapping_mul(283923481);
        h.unsigned_abs() as usize % self.table_size
    }

    /// Convert world position to cell coordinates
    #[inline]
    fn cell_coords(&self, pos: Vec3) -> (i32, i32, i32) {
        (
            (pos.x / self.spacing).floor() as i32,
            (pos.y / self.spacing).floor() as i32,
            (pos.z / self.spacing).floor() as i32,
        )
    }

    fn next_query_stamp(&mut self) {
        self.query_stamp = self.query_stamp.wrapping_add(1);
        if self.query_stamp == 0 {
            self.bucket_stamp.fill(0);
            self.query_stamp = 1;
        }
    }
}
