//! Droplet-based hydraulic erosion.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::heightmap::Heightmap;
use crate::seed::det_sqrtf;
use crate::settings::{ErosionSettings, SettingsError};

/// Totals accumulated over one [`HydraulicErosion::erode`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ErosionReport {
    pub droplets: u32,
    /// Material removed from the grid.
    pub eroded: f64,
    /// Material added back to the grid.
    pub deposited: f64,
}

/// One brush cell: offset from the droplet's cell and its unclipped weight.
#[derive(Clone, Copy, Debug)]
struct BrushCell {
    dx: isize,
    dy: isize,
    weight: f32,
}

/// Simulates water droplets that pick up sediment downhill and drop it in
/// pits or when they slow down.
///
/// Droplets that leave the grid, stall, or reach the end of their lifetime
/// drop whatever they still carry at their last in-grid position, so the
/// total height is conserved up to float rounding.
#[derive(Clone, Debug)]
pub struct HydraulicErosion {
    settings: ErosionSettings,
    brush: Vec<BrushCell>,
}

impl HydraulicErosion {
    pub fn new(settings: ErosionSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            brush: build_brush(settings.erosion_radius),
            settings,
        })
    }

    pub fn settings(&self) -> &ErosionSettings {
        &self.settings
    }

    /// Runs `settings.iterations` droplets over `map`, spawning them from a
    /// ChaCha stream seeded with `seed`.
    pub fn erode(&self, map: &mut Heightmap, seed: u32) -> ErosionReport {
        let mut report = ErosionReport::default();
        if map.width() < 2 || map.height() < 2 {
            return report;
        }

        let s = &self.settings;
        let max_x = (map.width() - 1) as f32;
        let max_y = (map.height() - 1) as f32;
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));

        for _ in 0..s.iterations {
            let mut pos = Vec2::new(rng.random::<f32>() * max_x, rng.random::<f32>() * max_y);
            let mut dir = Vec2::ZERO;
            let mut speed = 1.0_f32;
            let mut water = 1.0_f32;
            let mut sediment = 0.0_f32;

            for _ in 0..s.max_droplet_lifetime {
                let (old_height, gradient) = map.height_and_gradient(pos.x, pos.y);

                dir = dir * s.inertia - gradient * (1.0 - s.inertia);
                let len = dir.length();
                if len <= f32::EPSILON {
                    break;
                }
                dir /= len;

                let next = pos + dir;
                if next.x < 0.0 || next.x >= max_x || next.y < 0.0 || next.y >= max_y {
                    break;
                }

                let (new_height, _) = map.height_and_gradient(next.x, next.y);
                let delta_h = new_height - old_height;
                let capacity =
                    (-delta_h * speed * water * s.sediment_capacity).max(s.min_sediment_capacity);

                if sediment > capacity || delta_h > 0.0 {
                    let amount = if delta_h > 0.0 {
                        delta_h.min(sediment)
                    } else {
                        (sediment - capacity) * s.deposit_speed
                    };
                    sediment -= amount;
                    deposit(map, pos, amount);
                    report.deposited += f64::from(amount);
                } else {
                    let amount = ((capacity - sediment) * s.erode_speed).min(-delta_h);
                    let removed = self.erode_at(map, pos, amount);
                    sediment += removed;
                    report.eroded += f64::from(removed);
                }

                speed = det_sqrtf((speed * speed + delta_h * s.gravity).max(0.0));
                water *= 1.0 - s.evaporate_speed;
                pos = next;
            }

            if sediment > 0.0 {
                deposit(map, pos, sediment);
                report.deposited += f64::from(sediment);
            }
            report.droplets += 1;
        }

        debug!(
            "Hydraulic erosion: {} droplets, eroded {:.3}, deposited {:.3}",
            report.droplets, report.eroded, report.deposited
        );
        report
    }

    /// Removes up to `amount` around the cell containing `pos`, spread over the
    /// brush clipped to the grid. Returns the material actually removed.
    fn erode_at(&self, map: &mut Heightmap, pos: Vec2, amount: f32) -> f32 {
        if amount <= 0.0 {
            return 0.0;
        }
        let cx = pos.x as isize;
        let cy = pos.y as isize;
        let (w, h) = (map.width() as isize, map.height() as isize);
        let in_bounds = |c: &&BrushCell| {
            let (x, y) = (cx + c.dx, cy + c.dy);
            x >= 0 && x < w && y >= 0 && y < h
        };

        let total: f32 = self.brush.iter().filter(in_bounds).map(|c| c.weight).sum();
        if total <= 0.0 {
            return 0.0;
        }

        let mut removed = 0.0;
        for cell in self.brush.iter().filter(in_bounds) {
            let (x, y) = ((cx + cell.dx) as usize, (cy + cell.dy) as usize);
            let current = map.get(x, y);
            let delta = (amount * cell.weight / total).min(current.max(0.0));
            map.set(x, y, current - delta);
            removed += delta;
        }
        removed
    }
}

/// Circular brush with linear falloff; weights sum to one.
fn build_brush(radius: u32) -> Vec<BrushCell> {
    let r = radius as isize;
    let rf = radius as f32;
    let mut cells = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            let dist = ((dx * dx + dy * dy) as f32).sqrt();
            let weight = 1.0 - dist / rf;
            if weight > 0.0 {
                cells.push(BrushCell { dx, dy, weight });
            }
        }
    }
    let total: f32 = cells.iter().map(|c| c.weight).sum();
    for cell in &mut cells {
        cell.weight /= total;
    }
    cells
}

/// Adds `amount` to the four corners of the cell containing `pos`,
/// weighted by bilinear fractions.
fn deposit(map: &mut Heightmap, pos: Vec2, amount: f32) {
    if amount == 0.0 {
        return;
    }
    let cx = pos.x as usize;
    let cy = pos.y as usize;
    let u = pos.x - cx as f32;
    let v = pos.y - cy as f32;
    let corners = [
        (cx, cy, (1.0 - u) * (1.0 - v)),
        (cx + 1, cy, u * (1.0 - v)),
        (cx, cy + 1, (1.0 - u) * v),
        (cx + 1, cy + 1, u * v),
    ];
    for (x, y, weight) in corners {
        let i = map.index(x, y);
        map.data_mut()[i] += amount * weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::HeightmapGenerator;
    use crate::settings::HeightmapSettings;

    fn conserving_settings() -> ErosionSettings {
        ErosionSettings {
            iterations: 3_000,
            deposit_speed: 1.0,
            erode_speed: 1.0,
            evaporate_speed: 0.0,
            ..Default::default()
        }
    }

    fn slope(width: usize, height: usize) -> Heightmap {
        let mut map = Heightmap::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let bump = ((x as f32 * 0.4).sin() + (y as f32 * 0.3).cos()) * 2.0;
                map.set(x, y, 20.0 + x as f32 * 0.5 + bump);
            }
        }
        map
    }

    #[test]
    fn test_brush_weights_sum_to_one() {
        for radius in 1..=8 {
            let brush = build_brush(radius);
            let total: f32 = brush.iter().map(|c| c.weight).sum();
            assert!((total - 1.0).abs() < 1e-5, "radius {radius} total {total}");
            assert!(brush.iter().all(|c| c.weight > 0.0));
            let centre = brush.iter().find(|c| c.dx == 0 && c.dy == 0).unwrap();
            assert!(brush.iter().all(|c| c.weight <= centre.weight));
        }
    }

    #[test]
    fn test_mass_is_conserved_on_generated_terrain() {
        let generator = HeightmapGenerator::new(HeightmapSettings::with_seed(12345)).unwrap();
        let mut map = generator.generate_grid(64, 64).unwrap();
        let before = map.sum();

        let erosion = HydraulicErosion::new(conserving_settings()).unwrap();
        let report = erosion.erode(&mut map, 12345);
        let after = map.sum();

        assert_eq!(report.droplets, 3_000);
        let relative = ((after - before) / before).abs();
        assert!(relative < 1e-3, "before {before} after {after}");
        assert!(
            (report.eroded - report.deposited).abs() <= report.eroded.max(1.0) * 1e-3,
            "{report:?}"
        );
    }

    #[test]
    fn test_erosion_changes_a_slope() {
        let mut map = slope(48, 48);
        let original = map.clone();
        let erosion = HydraulicErosion::new(conserving_settings()).unwrap();
        let report = erosion.erode(&mut map, 7);
        assert!(report.eroded > 0.0);
        assert_ne!(map, original);
        let relative = ((map.sum() - original.sum()) / original.sum()).abs();
        assert!(relative < 1e-3);
    }

    #[test]
    fn test_same_seed_same_result() {
        let erosion = HydraulicErosion::new(ErosionSettings {
            iterations: 500,
            ..Default::default()
        })
        .unwrap();
        let mut a = slope(32, 32);
        let mut b = slope(32, 32);
        erosion.erode(&mut a, 99);
        erosion.erode(&mut b, 99);
        assert_eq!(a, b);
    }

    #[test]
    fn test_heights_never_go_negative() {
        let mut map = Heightmap::new(24, 24);
        for y in 0..24 {
            for x in 0..24 {
                map.set(x, y, if x > 12 { 0.05 } else { 0.0 });
            }
        }
        let erosion = HydraulicErosion::new(ErosionSettings {
            iterations: 1_000,
            erode_speed: 1.0,
            ..Default::default()
        })
        .unwrap();
        erosion.erode(&mut map, 3);
        assert!(map.data().iter().all(|&h| h >= 0.0));
    }

    #[test]
    fn test_tiny_grid_is_left_alone() {
        let mut map = Heightmap::from_data(1, 3, vec![1.0, 2.0, 3.0]).unwrap();
        let erosion = HydraulicErosion::new(ErosionSettings::default()).unwrap();
        let report = erosion.erode(&mut map, 0);
        assert_eq!(report.droplets, 0);
        assert_eq!(map.data(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let bad = ErosionSettings {
            erosion_radius: 0,
            ..Default::default()
        };
        assert!(HydraulicErosion::new(bad).is_err());
    }
}
