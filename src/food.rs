/// A circular region that pins the field to a fixed concentration every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodSource {
    pub x: f32,
    pub y: f32,
    /// Radius in field cells
    pub radius: f32,
    /// Concentration written into every covered cell
    pub strength: f32,
}

impl FoodSource {
    /// Negative or NaN radius/strength collapse to zero
    pub fn new(x: f32, y: f32, radius: f32, strength: f32) -> Self {
        Self {
            x,
            y,
            radius: non_negative(radius),
            strength: non_negative(strength),
        }
    }

    /// Whether the integer cell (cx, cy) lies inside this source
    #[inline]
    pub fn covers(&self, cx: usize, cy: usize) -> bool {
        let dx = cx as f32 - self.x;
        let dy = cy as f32 - self.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    /// Visit the flat index of every in-bounds cell covered by this source
    pub fn for_each_covered_cell(&self, width: usize, height: usize, mut visit: impl FnMut(usize)) {
        if width == 0 || height == 0 || !self.x.is_finite() || !self.y.is_finite() {
            return;
        }
        let x0 = (self.x - self.radius).floor().max(0.0);
        let y0 = (self.y - self.radius).floor().max(0.0);
        let x1 = (self.x + self.radius).ceil().min((width - 1) as f32);
        let y1 = (self.y + self.radius).ceil().min((height - 1) as f32);
        if x0 > x1 || y0 > y1 {
            return;
        }

        for cy in y0 as usize..=y1 as usize {
            for cx in x0 as usize..=x1 as usize {
                if self.covers(cx, cy) {
                    visit(cy * width + cx);
                }
            }
        }
    }
}

fn non_negative(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

/// Ordered list of food sources. Order matters only where sources overlap:
/// the later source's strength wins.
#[derive(Debug, Clone, Default)]
pub struct FoodRegistry {
    sources: Vec<FoodSource>,
}

impl FoodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, source: FoodSource) {
        self.sources.push(source);
    }

    /// Remove every source whose center lies strictly within `radius` of (x, y).
    /// Returns how many were removed.
    pub fn remove_near(&mut self, x: f32, y: f32, radius: f32) -> usize {
        let radius = non_negative(radius);
        let before = self.sources.len();
        self.sources.retain(|s| {
            let dx = s.x - x;
            let dy = s.y - y;
            (dx * dx + dy * dy).sqrt() >= radius
        });
        before - self.sources.len()
    }

    pub fn clear(&mut self) {
        self.sources.clear();
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn as_slice(&self) -> &[FoodSource] {
        &self.sources
    }

    pub fn iter(&self) -> impl Iterator<Item = &FoodSource> {
        self.sources.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_negative_values() {
        let source = FoodSource::new(1.0, 1.0, -4.0, f32::NAN);
        assert_eq!(source.radius, 0.0);
        assert_eq!(source.strength, 0.0);
    }

    #[test]
    fn test_covered_cells_unit_radius_is_plus_shape() {
        let source = FoodSource::new(1.0, 1.0, 1.0, 0.7);
        let mut cells = Vec::new();
        source.for_each_covered_cell(4, 4, |idx| cells.push(idx));
        cells.sort_unstable();
        // (1,0), (0,1), (1,1), (2,1), (1,2) on a 4-wide grid
        assert_eq!(cells, vec![1, 4, 5, 6, 9]);
    }

    #[test]
    fn test_covered_cells_clip_at_edges() {
        let source = FoodSource::new(0.0, 0.0, 1.0, 1.0);
        let mut cells = Vec::new();
        source.for_each_covered_cell(4, 4, |idx| cells.push(idx));
        cells.sort_unstable();
        assert_eq!(cells, vec![0, 1, 4]);

        let outside = FoodSource::new(-10.0, -10.0, 1.0, 1.0);
        let mut count = 0;
        outside.for_each_covered_cell(4, 4, |_| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_remove_near_is_strict() {
        let mut registry = FoodRegistry::new();
        registry.add(FoodSource::new(0.0, 0.0, 2.0, 1.0));
        registry.add(FoodSource::new(5.0, 0.0, 2.0, 1.0));
        registry.add(FoodSource::new(20.0, 20.0, 2.0, 1.0));

        // (5, 0) sits exactly on the boundary and survives
        assert_eq!(registry.remove_near(0.0, 0.0, 5.0), 1);
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.remove_near(0.0, 0.0, 5.1), 1);
        assert_eq!(registry.as_slice()[0].x, 20.0);
    }

    #[test]
    fn test_clear_empties_registry() {
        let mut registry = FoodRegistry::new();
        registry.add(FoodSource::new(3.0, 3.0, 1.0, 1.0));
        registry.clear();
        assert!(registry.is_empty());
    }
}
