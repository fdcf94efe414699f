//! Dense row-major height grid used by the standalone pipeline and erosion.

use glam::Vec2;

use crate::settings::SettingsError;

/// A `width × height` grid of heights, indexed `y * width + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct Heightmap {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Heightmap {
    /// A zero-filled grid. Zero dimensions produce an empty grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Wraps existing samples; `data.len()` must equal `width * height`.
    pub fn from_data(width: usize, height: usize, data: Vec<f32>) -> Result<Self, SettingsError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(SettingsError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        let i = self.index(x, y);
        self.data[i] = value;
    }

    /// Sample at signed coordinates clamped onto the grid.
    pub fn get_clamped(&self, x: isize, y: isize) -> f32 {
        let cx = x.clamp(0, self.width as isize - 1) as usize;
        let cy = y.clamp(0, self.height as isize - 1) as usize;
        self.get(cx, cy)
    }

    /// Bilinear sample at fractional grid coordinates, clamped to the grid.
    /// Returns `0.0` for an empty grid.
    pub fn bilinear(&self, x: f32, y: f32) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let u = x - x0 as f32;
        let v = y - y0 as f32;

        let top = self.get(x0, y0) * (1.0 - u) + self.get(x1, y0) * u;
        let bottom = self.get(x0, y1) * (1.0 - u) + self.get(x1, y1) * u;
        top * (1.0 - v) + bottom * v
    }

    /// Height and `(∂h/∂x, ∂h/∂y)` at a point inside the cell grid.
    ///
    /// The point must satisfy `0 ≤ x < width − 1` and `0 ≤ y < height − 1`.
    pub fn height_and_gradient(&self, x: f32, y: f32) -> (f32, Vec2) {
        let cx = x as usize;
        let cy = y as usize;
        let u = x - cx as f32;
        let v = y - cy as f32;

        let h00 = self.get(cx, cy);
        let h10 = self.get(cx + 1, cy);
        let h01 = self.get(cx, cy + 1);
        let h11 = self.get(cx + 1, cy + 1);

        let gx = (h10 - h00) * (1.0 - v) + (h11 - h01) * v;
        let gy = (h01 - h00) * (1.0 - u) + (h11 - h10) * u;
        let h = h00 * (1.0 - u) * (1.0 - v) + h10 * u * (1.0 - v) + h01 * (1.0 - u) * v + h11 * u * v;
        (h, Vec2::new(gx, gy))
    }

    /// Central-difference gradient at a grid sample, edges clamped.
    pub fn gradient(&self, x: usize, y: usize) -> Vec2 {
        let (xi, yi) = (x as isize, y as isize);
        let gx = (self.get_clamped(xi + 1, yi) - self.get_clamped(xi - 1, yi)) * 0.5;
        let gy = (self.get_clamped(xi, yi + 1) - self.get_clamped(xi, yi - 1)) * 0.5;
        Vec2::new(gx, gy)
    }

    /// `(min, max)` over all samples, or `None` for an empty grid.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        min_max(&self.data)
    }

    /// Rescales to `[0, 1]`. Constant grids become a flat `0.5`.
    pub fn normalize(&mut self) {
        let Some((lo, hi)) = self.min_max() else {
            return;
        };
        let span = hi - lo;
        if span <= 0.0 {
            self.data.fill(0.5);
            return;
        }
        for h in &mut self.data {
            *h = ((*h - lo) / span).clamp(0.0, 1.0);
        }
    }

    /// Maps `[0, 1]` samples onto `[min, max]`.
    pub fn remap(&mut self, min: f32, max: f32) {
        for h in &mut self.data {
            *h = remap_unit(*h, min, max);
        }
    }

    /// Sum of all samples in double precision.
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&h| f64::from(h)).sum()
    }
}

/// Maps a unit value onto `[min, max]`; the endpoints map exactly.
#[inline]
pub fn remap_unit(h: f32, min: f32, max: f32) -> f32 {
    (min * (1.0 - h) + max * h).clamp(min, max)
}

/// `(min, max)` of a slice, or `None` when it is empty.
pub fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Heightmap {
        let data = (0..width * height).map(|i| (i % width) as f32).collect();
        Heightmap::from_data(width, height, data).unwrap()
    }

    #[test]
    fn test_from_data_checks_length() {
        assert!(matches!(
            Heightmap::from_data(3, 3, vec![0.0; 8]),
            Err(SettingsError::DimensionMismatch {
                expected: 9,
                actual: 8
            })
        ));
    }

    #[test]
    fn test_bilinear_interpolates_and_clamps() {
        let map = ramp(4, 4);
        assert!((map.bilinear(1.5, 2.0) - 1.5).abs() < 1e-6);
        assert_eq!(map.bilinear(-5.0, 0.0), 0.0);
        assert_eq!(map.bilinear(100.0, 1.0), 3.0);
        assert_eq!(map.bilinear(3.0, 3.0), 3.0);
    }

    #[test]
    fn test_gradient_of_ramp() {
        let map = ramp(5, 3);
        assert_eq!(map.gradient(2, 1), Vec2::new(1.0, 0.0));
        assert_eq!(map.gradient(0, 1), Vec2::new(0.5, 0.0));
        let (h, g) = map.height_and_gradient(1.25, 0.5);
        assert!((h - 1.25).abs() < 1e-6);
        assert!((g.x - 1.0).abs() < 1e-6 && g.y.abs() < 1e-6);
    }

    #[test]
    fn test_normalize_then_remap_hits_exact_bounds() {
        let mut map = Heightmap::from_data(3, 2, vec![-3.7, 12.1, 0.4, 5.5, 9.9, -1.0]).unwrap();
        map.normalize();
        assert_eq!(map.min_max(), Some((0.0, 1.0)));
        map.remap(0.1, 0.3);
        assert_eq!(map.min_max(), Some((0.1, 0.3)));
    }

    #[test]
    fn test_constant_grid_normalizes_to_midpoint() {
        let mut map = Heightmap::from_data(2, 2, vec![7.0; 4]).unwrap();
        map.normalize();
        assert!(map.data().iter().all(|&h| h == 0.5));
    }

    #[test]
    fn test_empty_grid_is_harmless() {
        let mut map = Heightmap::new(0, 0);
        map.normalize();
        map.remap(0.0, 1.0);
        assert_eq!(map.min_max(), None);
        assert_eq!(map.sum(), 0.0);
        assert_eq!(map.bilinear(0.5, 0.5), 0.0);
    }

    #[test]
    fn test_remap_unit_endpoints() {
        assert_eq!(remap_unit(0.0, -20.0, 80.0), -20.0);
        assert_eq!(remap_unit(1.0, -20.0, 80.0), 80.0);
        assert_eq!(remap_unit(0.5, -20.0, 80.0), 30.0);
    }
}
