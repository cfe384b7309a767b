//! Grid configuration parsed from CLI flags and environment variables.

use canvas::grid::Grid;

pub use canvas::consts::DEFAULT_GRID_SPACING;

pub const SPACING_X_ENV: &str = "GRIDWIRE_SPACING_X";
pub const SPACING_Y_ENV: &str = "GRIDWIRE_SPACING_Y";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Grid spacing must be a positive, finite number of world units.
    #[error("invalid {axis} grid spacing {value}: must be positive and finite")]
    InvalidSpacing { axis: &'static str, value: f64 },
}

/// Cell size of the routing grid, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub spacing_x: f64,
    pub spacing_y: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { spacing_x: DEFAULT_GRID_SPACING, spacing_y: DEFAULT_GRID_SPACING }
    }
}

impl GridConfig {
    /// Validate raw spacings.
    ///
    /// The values normally come from `--spacing-x` / `--spacing-y`, which fall
    /// back to `GRIDWIRE_SPACING_X` / `GRIDWIRE_SPACING_Y` and then to
    /// [`DEFAULT_GRID_SPACING`].
    pub fn new(spacing_x: f64, spacing_y: f64) -> Result<Self, ConfigError> {
        Ok(Self { spacing_x: check_spacing("x", spacing_x)?, spacing_y: check_spacing("y", spacing_y)? })
    }

    #[must_use]
    pub fn grid(&self) -> Grid {
        Grid::new(self.spacing_x, self.spacing_y)
    }
}

fn check_spacing(axis: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidSpacing { axis, value })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
