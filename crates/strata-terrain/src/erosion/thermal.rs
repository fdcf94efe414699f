//! Talus-angle thermal erosion.

use tracing::debug;

use crate::heightmap::Heightmap;
use crate::settings::{SettingsError, ThermalSettings};

const NEIGHBOURS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Moves material from each interior cell to its steepest lower 4-neighbour
/// whenever the drop exceeds the talus angle.
#[derive(Clone, Debug)]
pub struct ThermalErosion {
    settings: ThermalSettings,
}

impl ThermalErosion {
    pub fn new(settings: ThermalSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &ThermalSettings {
        &self.settings
    }

    /// Runs `settings.iterations` sweeps and returns the total material moved.
    pub fn erode(&self, map: &mut Heightmap) -> f64 {
        let (w, h) = (map.width(), map.height());
        if w < 3 || h < 3 {
            return 0.0;
        }
        let talus = self.settings.talus_angle;
        let mut moved = 0.0_f64;

        for _ in 0..self.settings.iterations {
            for y in 1..h - 1 {
                for x in 1..w - 1 {
                    let here = map.get(x, y);
                    let mut steepest = 0.0_f32;
                    let mut target = None;
                    for (dx, dy) in NEIGHBOURS {
                        let nx = (x as isize + dx) as usize;
                        let ny = (y as isize + dy) as usize;
                        let drop = here - map.get(nx, ny);
                        if drop > steepest {
                            steepest = drop;
                            target = Some((nx, ny));
                        }
                    }

                    if steepest <= talus {
                        continue;
                    }
                    if let Some((nx, ny)) = target {
                        let amount = (steepest - talus) * 0.5;
                        map.set(x, y, here - amount);
                        map.set(nx, ny, map.get(nx, ny) + amount);
                        moved += f64::from(amount);
                    }
                }
            }
        }

        debug!("Thermal erosion moved {moved:.3} over {} sweeps", self.settings.iterations);
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike() -> Heightmap {
        let mut map = Heightmap::new(9, 9);
        map.set(4, 4, 10.0);
        map
    }

    #[test]
    fn test_spike_collapses_and_mass_is_conserved() {
        let mut map = spike();
        let before = map.sum();
        let thermal = ThermalErosion::new(ThermalSettings {
            iterations: 50,
            talus_angle: 0.5,
        })
        .unwrap();
        let moved = thermal.erode(&mut map);
        assert!(moved > 0.0);
        assert!(map.get(4, 4) < 10.0);
        assert!((map.sum() - before).abs() < 1e-4);
    }

    #[test]
    fn test_first_move_is_half_the_excess() {
        let mut map = spike();
        let thermal = ThermalErosion::new(ThermalSettings {
            iterations: 1,
            talus_angle: 2.0,
        })
        .unwrap();
        thermal.erode(&mut map);
        // Drop of 10 with talus 2 moves 4 to the first steepest neighbour (left).
        assert_eq!(map.get(4, 4), 6.0);
        assert_eq!(map.get(3, 4), 4.0);
    }

    #[test]
    fn test_stable_slope_is_untouched() {
        let mut map = Heightmap::new(6, 6);
        for y in 0..6 {
            for x in 0..6 {
                map.set(x, y, x as f32 * 0.1);
            }
        }
        let original = map.clone();
        let thermal = ThermalErosion::new(ThermalSettings {
            iterations: 10,
            talus_angle: 0.2,
        })
        .unwrap();
        assert_eq!(thermal.erode(&mut map), 0.0);
        assert_eq!(map, original);
    }
}
