use crate::particles::Particle;

/// Edge length of a bucket in field cells. Fixed; callers pass their own
/// query radius and the window of scanned buckets is derived from it.
pub const CELL_SIZE: f32 = 10.0;

/// Uniform-grid spatial hash over particle positions.
///
/// Stored in offset-array form: the particle indices of bucket `i` are
/// `entity_indices[cell_offsets[i]..cell_offsets[i + 1]]`. Rebuilt from scratch
/// every tick into buffers that keep their capacity between ticks. Buckets
/// hold indices into the particle slice, never references.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    cols: usize,
    rows: usize,
    cell_offsets: Vec<usize>,
    entity_indices: Vec<usize>,
    // Scratch cursor per bucket, reused across rebuilds.
    cursors: Vec<usize>,
}

impl SpatialIndex {
    pub fn new(width: usize, height: usize) -> Self {
        let cell_size = CELL_SIZE;
        let cols = ((width as f32 / cell_size).ceil() as usize).max(1);
        let rows = ((height as f32 / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            cols,
            rows,
            cell_offsets: vec![0; cols * rows + 1],
            entity_indices: Vec::new(),
            cursors: vec![0; cols * rows],
        }
    }

    /// Integer bucket coordinate of a position, clamped into the grid
    #[inline]
    pub fn cell_of(&self, x: f32, y: f32) -> (usize, usize) {
        let cx = (x / self.cell_size).floor();
        let cy = (y / self.cell_size).floor();
        // NaN casts to 0
        let cx = (cx.max(0.0) as usize).min(self.cols - 1);
        let cy = (cy.max(0.0) as usize).min(self.rows - 1);
        (cx, cy)
    }

    #[inline]
    fn bucket(&self, cx: usize, cy: usize) -> &[usize] {
        let cell = cy * self.cols + cx;
        &self.entity_indices[self.cell_offsets[cell]..self.cell_offsets[cell + 1]]
    }

    /// Drop all buckets and reinsert every particle by its current position
    pub fn rebuild(&mut self, particles: &[Particle]) {
        let cell_count = self.cols * self.rows;

        self.cell_offsets.clear();
        self.cell_offsets.resize(cell_count + 1, 0);
        for p in particles {
            let (cx, cy) = self.cell_of(p.x, p.y);
            self.cell_offsets[cy * self.cols + cx + 1] += 1;
        }
        for i in 0..cell_count {
            self.cell_offsets[i + 1] += self.cell_offsets[i];
        }

        self.cursors.clear();
        self.cursors.extend_from_slice(&self.cell_offsets[..cell_count]);
        self.entity_indices.clear();
        self.entity_indices.resize(particles.len(), 0);
        for (idx, p) in particles.iter().enumerate() {
            let (cx, cy) = self.cell_of(p.x, p.y);
            let cell = cy * self.cols + cx;
            self.entity_indices[self.cursors[cell]] = idx;
            self.cursors[cell] += 1;
        }
    }

    /// Number of particles indexed by the last rebuild
    pub fn len(&self) -> usize {
        self.entity_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_indices.is_empty()
    }

    /// Visit every other particle within `radius` of `particles[idx]`.
    ///
    /// Scans the square of buckets `ceil(radius / cell_size)` around the query
    /// particle's bucket, then filters by exact Euclidean distance. The visitor
    /// receives the neighbor index and its distance. Neighbors are read from
    /// `particles` as they are now, not as they were at rebuild time.
    pub fn for_each_neighbor(
        &self,
        particles: &[Particle],
        idx: usize,
        radius: f32,
        mut visit: impl FnMut(usize, f32),
    ) {
        let Some(me) = particles.get(idx) else {
            return;
        };
        if !(radius > 0.0) {
            return;
        }
        let reach = (radius / self.cell_size).ceil() as usize;
        let (cx, cy) = self.cell_of(me.x, me.y);
        // Planar scan: buckets are clamped at the grid edges, not wrapped
        let x0 = cx.saturating_sub(reach);
        let y0 = cy.saturating_sub(reach);
        let x1 = (cx + reach).min(self.cols - 1);
        let y1 = (cy + reach).min(self.rows - 1);
        let radius_sq = radius * radius;

        for by in y0..=y1 {
            for bx in x0..=x1 {
                for &other in self.bucket(bx, by) {
                    if other == idx {
                        continue;
                    }
                    let Some(p) = particles.get(other) else {
                        continue;
                    };
                    let dx = p.x - me.x;
                    let dy = p.y - me.y;
                    let dist_sq = dx * dx + dy * dy;
                    if dist_sq <= radius_sq {
                        visit(other, dist_sq.sqrt());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32) -> Particle {
        Particle::pinned(x, y)
    }

    fn neighbors(index: &SpatialIndex, particles: &[Particle], idx: usize, radius: f32) -> Vec<usize> {
        let mut found = Vec::new();
        index.for_each_neighbor(particles, idx, radius, |i, _| found.push(i));
        found.sort_unstable();
        found
    }

    #[test]
    fn test_cell_of_floors_and_clamps() {
        let index = SpatialIndex::new(100, 50);
        assert_eq!(index.cell_of(0.0, 0.0), (0, 0));
        assert_eq!(index.cell_of(19.9, 10.0), (1, 1));
        assert_eq!(index.cell_of(-5.0, 500.0), (0, 4));
        assert_eq!(index.cell_of(f32::NAN, 3.0), (0, 0));
    }

    #[test]
    fn test_rebuild_indexes_every_particle() {
        let particles = vec![at(1.0, 1.0), at(55.0, 5.0), at(99.0, 49.0), at(2.0, 2.0)];
        let mut index = SpatialIndex::new(100, 50);
        index.rebuild(&particles);
        assert_eq!(index.len(), 4);
        assert_eq!(index.bucket(0, 0), &[0, 3]);
        assert_eq!(index.bucket(5, 0), &[1]);
        assert_eq!(index.bucket(9, 4), &[2]);
    }

    #[test]
    fn test_rebuild_replaces_previous_contents() {
        let mut index = SpatialIndex::new(100, 100);
        index.rebuild(&[at(5.0, 5.0), at(6.0, 6.0)]);
        index.rebuild(&[at(95.0, 95.0)]);
        assert_eq!(index.len(), 1);
        assert!(index.bucket(0, 0).is_empty());
    }

    #[test]
    fn test_neighbors_filtered_by_exact_distance() {
        let particles = vec![at(50.0, 50.0), at(53.0, 54.0), at(56.0, 50.0), at(80.0, 80.0)];
        let mut index = SpatialIndex::new(100, 100);
        index.rebuild(&particles);

        assert_eq!(neighbors(&index, &particles, 0, 5.0), vec![1]);
        assert_eq!(neighbors(&index, &particles, 0, 6.0), vec![1, 2]);
        assert!(neighbors(&index, &particles, 0, 0.0).is_empty());
    }

    #[test]
    fn test_neighbors_cross_bucket_boundaries() {
        // Radius larger than a bucket must widen the scanned window
        let particles = vec![at(5.0, 5.0), at(28.0, 5.0)];
        let mut index = SpatialIndex::new(100, 100);
        index.rebuild(&particles);
        assert_eq!(neighbors(&index, &particles, 0, 25.0), vec![1]);
        assert!(neighbors(&index, &particles, 0, 22.0).is_empty());
    }

    #[test]
    fn test_neighbor_distances_reported() {
        let particles = vec![at(10.0, 10.0), at(13.0, 14.0)];
        let mut index = SpatialIndex::new(50, 50);
        index.rebuild(&particles);
        let mut dist = 0.0;
        index.for_each_neighbor(&particles, 0, 10.0, |_, d| dist = d);
        assert!((dist - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_matches_brute_force() {
        let mut particles = Vec::new();
        for i in 0..60 {
            let x = (i * 37 % 100) as f32 + 0.5;
            let y = (i * 53 % 80) as f32 + 0.25;
            particles.push(at(x, y));
        }
        let mut index = SpatialIndex::new(100, 80);
        index.rebuild(&particles);

        for idx in 0..particles.len() {
            let mut expected: Vec<usize> = (0..particles.len())
                .filter(|&j| j != idx)
                .filter(|&j| {
                    let dx = particles[j].x - particles[idx].x;
                    let dy = particles[j].y - particles[idx].y;
                    dx * dx + dy * dy <= 15.0 * 15.0
                })
                .collect();
            expected.sort_unstable();
            assert_eq!(neighbors(&index, &particles, idx, 15.0), expected);
        }
    }
}
