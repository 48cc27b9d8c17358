//! Engine configuration

use serde::{Deserialize, Serialize};

/// Configuration of one dashboard composition engine instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Column count of the layout grid
    pub grid_columns: u32,
    /// Breakpoint a legacy per-breakpoint layout map is normalized against
    pub reference_breakpoint: String,
    /// Upper bound on components per dashboard
    pub max_components: usize,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With grid column count
    #[inline]
    #[must_use]
    pub fn with_grid_columns(mut self, columns: u32) -> Self {
        self.grid_columns = columns;
        self
    }

    /// With reference breakpoint
    #[inline]
    #[must_use]
    pub fn with_reference_breakpoint(mut self, breakpoint: impl Into<String>) -> Self {
        self.reference_breakpoint = breakpoint.into();
        self
    }

    /// With component cap
    #[inline]
    #[must_use]
    pub fn with_max_components(mut self, max: usize) -> Self {
        self.max_components = max;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_columns: 12,
            reference_breakpoint: "lg".to_string(),
            max_components: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_observed_grid() {
        let config = EngineConfig::default();
        assert_eq!(config.grid_columns, 12);
        assert_eq!(config.reference_breakpoint, "lg");
    }

    #[test]
    fn builder_overrides() {
        let config = EngineConfig::new()
            .with_grid_columns(24)
            .with_reference_breakpoint("md")
            .with_max_components(10);

        assert_eq!(config.grid_columns, 24);
        assert_eq!(config.reference_breakpoint, "md");
        assert_eq!(config.max_components, 10);
    }
}
