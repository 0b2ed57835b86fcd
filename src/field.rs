use crate::food::FoodSource;
use rayon::prelude::*;

/// Highest value a single deposit may leave in a cell
pub const DEPOSIT_CAP: f32 = 1.0;

/// Diffusion knobs for one pass
#[derive(Debug, Clone, Copy)]
pub struct DiffusionParams {
    /// Weight of the neighborhood mean, the cell keeps `1 - diffusion_rate` of itself
    pub diffusion_rate: f32,
    /// Fraction removed after blending
    pub decay_rate: f32,
    /// Neighborhood radius in cells; 1 is the 8-cell Moore neighborhood
    pub radius: usize,
}

/// A 2D grid with one chemical concentration per cell.
///
/// Double-buffered: `step_diffusion` writes the whole next generation into the
/// scratch buffer from the current one, then swaps.
#[derive(Debug, Clone)]
pub struct ScalarField {
    width: usize,
    height: usize,
    data: Vec<f32>,

    // Scratch space for the diffusion pass.
    buf: Vec<f32>,
}

impl ScalarField {
    /// Create a zeroed field of exactly `width * height` cells
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
            buf: vec![0.0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Flat index of the cell containing (x, y), or None outside the grid
    #[inline]
    fn index(&self, x: f32, y: f32) -> Option<usize> {
        // NaN fails both comparisons and lands here too
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        let (ix, iy) = (x as usize, y as usize);
        if ix < self.width && iy < self.height {
            Some(iy * self.width + ix)
        } else {
            None
        }
    }

    /// Concentration at (x, y); 0 anywhere outside `[0,width) x [0,height)`
    #[inline]
    pub fn query(&self, x: f32, y: f32) -> f32 {
        self.index(x, y).map_or(0.0, |idx| self.data[idx])
    }

    /// Value of an integer cell, 0 when out of range
    pub fn get_cell(&self, x: usize, y: usize) -> f32 {
        if x < self.width && y < self.height {
            self.data[y * self.width + x]
        } else {
            0.0
        }
    }

    /// Add `amount` to the cell containing (x, y), capping that cell at
    /// `DEPOSIT_CAP`. Writes outside the grid are dropped.
    #[inline]
    pub fn deposit(&mut self, x: f32, y: f32, amount: f32) {
        if let Some(idx) = self.index(x, y) {
            self.data[idx] = (self.data[idx] + amount).min(DEPOSIT_CAP);
        }
    }

    /// Deposit `amount` into every cell of the disk `dx² + dy² <= radius²`
    /// around the cell containing (x, y)
    pub fn deposit_disk(&mut self, x: f32, y: f32, radius: usize, amount: f32) {
        let cx = x.floor();
        let cy = y.floor();
        let r = radius as i64;
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy <= r * r {
                    self.deposit(cx + dx as f32, cy + dy as f32, amount);
                }
            }
        }
    }

    /// One food-injection, blur and decay pass.
    ///
    /// Every output cell is computed from the previous generation only.
    /// Cells covered by a food source are pinned to that source's strength
    /// (later sources overwrite earlier ones) and then decayed like any other
    /// cell; all other cells blend their neighborhood mean with themselves.
    pub fn step_diffusion(&mut self, food: &[FoodSource], params: DiffusionParams) {
        if self.data.is_empty() {
            return;
        }
        let width = self.width;
        let height = self.height;
        let rate = params.diffusion_rate;
        let keep = 1.0 - params.decay_rate;
        let offsets = neighborhood_offsets(params.radius);
        let inv_count = 1.0 / offsets.len() as f32;
        let src = &self.data;

        self.buf
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.iter_mut().enumerate() {
                    let mut sum = 0.0;
                    for &(dx, dy) in &offsets {
                        let nx = wrap(x as isize + dx, width);
                        let ny = wrap(y as isize + dy, height);
                        sum += src[ny * width + nx];
                    }
                    let own = src[y * width + x];
                    let blended = rate * sum * inv_count + (1.0 - rate) * own;
                    *out = blended * keep;
                }
            });

        for source in food {
            let value = source.strength * keep;
            let buf = &mut self.buf;
            source.for_each_covered_cell(width, height, |idx| buf[idx] = value);
        }

        std::mem::swap(&mut self.data, &mut self.buf);
    }

    /// Reset every cell to zero
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.buf.fill(0.0);
    }

    /// Sum of all cells
    pub fn total(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Largest cell value, 0 for an empty field
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[inline]
fn wrap(v: isize, len: usize) -> usize {
    v.rem_euclid(len as isize) as usize
}

/// Offsets of the disk of radius `r + 1/2` around a cell, excluding the cell
/// itself. For r = 1 this is the Moore neighborhood.
fn neighborhood_offsets(radius: usize) -> Vec<(isize, isize)> {
    let r = radius.max(1) as isize;
    let limit = r * r + r;
    let mut offsets = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx, dy) != (0, 0) && dx * dx + dy * dy <= limit {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(diffusion_rate: f32, decay_rate: f32) -> DiffusionParams {
        DiffusionParams {
            diffusion_rate,
            decay_rate,
            radius: 1,
        }
    }

    #[test]
    fn test_query_out_of_bounds_is_zero() {
        let mut field = ScalarField::new(4, 4);
        field.deposit(3.5, 3.5, 0.5);
        assert_eq!(field.query(3.9, 3.9), 0.5);
        assert_eq!(field.query(4.0, 0.0), 0.0);
        assert_eq!(field.query(-0.1, 1.0), 0.0);
        assert_eq!(field.query(f32::NAN, 1.0), 0.0);
    }

    #[test]
    fn test_deposit_caps_at_one() {
        let mut field = ScalarField::new(4, 4);
        field.deposit(1.0, 1.0, 0.8);
        field.deposit(1.0, 1.0, 0.8);
        assert_eq!(field.get_cell(1, 1), DEPOSIT_CAP);
    }

    #[test]
    fn test_deposit_disk_unit_radius_plus_shape() {
        let mut field = ScalarField::new(4, 4);
        field.deposit_disk(2.0, 2.0, 1, 0.1);

        let plus = [(2, 2), (1, 2), (3, 2), (2, 1), (2, 3)];
        for y in 0..4 {
            for x in 0..4 {
                let expected = if plus.contains(&(x, y)) { 0.1 } else { 0.0 };
                assert_eq!(field.get_cell(x, y), expected, "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_deposit_disk_drops_out_of_bounds_cells() {
        let mut field = ScalarField::new(4, 4);
        field.deposit_disk(0.0, 0.0, 1, 0.1);
        assert!((field.total() - 0.3).abs() < 1e-6);
        assert_eq!(field.get_cell(3, 0), 0.0);
    }

    #[test]
    fn test_moore_neighborhood_for_unit_radius() {
        let offsets = neighborhood_offsets(1);
        assert_eq!(offsets.len(), 8);
        assert!(offsets.contains(&(1, 1)));
        assert!(!offsets.contains(&(0, 0)));
        // r = 2 drops the far corners
        let wide = neighborhood_offsets(2);
        assert!(!wide.contains(&(2, 2)));
        assert!(wide.contains(&(2, 1)));
    }

    #[test]
    fn test_decay_without_activity_never_increases() {
        let mut field = ScalarField::new(8, 8);
        field.deposit(3.0, 3.0, 1.0);
        field.deposit(6.0, 1.0, 0.4);

        let mut previous_total = field.total();
        let mut previous_max = field.max();
        for _ in 0..50 {
            field.step_diffusion(&[], params(0.5, 0.1));
            assert!(field.total() <= previous_total);
            assert!(field.max() <= previous_max);
            previous_total = field.total();
            previous_max = field.max();
        }
        assert!(field.max() < 0.01);
    }

    #[test]
    fn test_food_injection_sets_then_decays() {
        let mut field = ScalarField::new(4, 4);
        let food = [FoodSource::new(1.0, 1.0, 1.0, 0.7)];
        field.step_diffusion(&food, params(0.5, 0.1));

        let expected = 0.7 * (1.0 - 0.1);
        for (x, y) in [(1, 1), (0, 1), (2, 1), (1, 0), (1, 2)] {
            assert!((field.get_cell(x, y) - expected).abs() < 1e-6, "cell ({x}, {y})");
        }
        assert_eq!(field.get_cell(3, 3), 0.0);
    }

    #[test]
    fn test_food_overwrites_existing_value() {
        let mut field = ScalarField::new(4, 4);
        field.deposit(1.0, 1.0, 1.0);
        let food = [FoodSource::new(1.0, 1.0, 0.0, 0.2)];
        field.step_diffusion(&food, params(0.0, 0.0));
        assert_eq!(field.get_cell(1, 1), 0.2);
    }

    #[test]
    fn test_overlapping_food_last_writer_wins() {
        let mut field = ScalarField::new(6, 6);
        let food = [
            FoodSource::new(2.0, 2.0, 1.0, 0.9),
            FoodSource::new(3.0, 2.0, 1.0, 0.3),
        ];
        field.step_diffusion(&food, params(0.0, 0.0));
        // (2,2) and (3,2) are covered by both; the second source wins
        assert_eq!(field.get_cell(2, 2), 0.3);
        assert_eq!(field.get_cell(3, 2), 0.3);
        assert_eq!(field.get_cell(1, 2), 0.9);
    }

    #[test]
    fn test_diffusion_wraps_toroidally() {
        let mut field = ScalarField::new(4, 4);
        field.deposit(0.0, 0.0, 0.8);
        field.step_diffusion(&[], params(1.0, 0.0));

        let spread = 0.8 / 8.0;
        assert!((field.get_cell(3, 3) - spread).abs() < 1e-6);
        assert!((field.get_cell(3, 0) - spread).abs() < 1e-6);
        assert!((field.get_cell(0, 3) - spread).abs() < 1e-6);
        assert_eq!(field.get_cell(0, 0), 0.0);
    }

    #[test]
    fn test_diffusion_reads_only_previous_generation() {
        // Two neighbors in a row: with in-place updates the second would see
        // the first's new value and the result would be asymmetric.
        let mut field = ScalarField::new(8, 1);
        field.deposit(3.0, 0.0, 1.0);
        field.deposit(4.0, 0.0, 1.0);
        field.step_diffusion(&[], params(0.5, 0.0));
        assert_eq!(field.get_cell(3, 0), field.get_cell(4, 0));
        assert_eq!(field.get_cell(2, 0), field.get_cell(5, 0));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut field = ScalarField::new(4, 4);
        field.deposit_disk(2.0, 2.0, 1, 0.5);
        field.clear();
        assert_eq!(field.total(), 0.0);
    }
}
