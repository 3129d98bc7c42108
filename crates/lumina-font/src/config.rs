use crate::sdf::SdfConfig;

/// Configuration for a [`crate::FontSystem`].
///
/// # Example
///
/// ```
/// use lumina_font::{FontSystemConfig, SdfConfig};
///
/// let config = FontSystemConfig::large().with_sdf_config(SdfConfig::msdf());
/// assert_eq!(config.run_cache_capacity, 4096);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FontSystemConfig {
    /// Maximum number of shaped runs kept in the text run cache.
    /// Default: 1024
    pub run_cache_capacity: usize,
    /// Distance field settings used when rendering glyphs.
    pub sdf: SdfConfig,
}

impl Default for FontSystemConfig {
    fn default() -> Self {
        Self {
            run_cache_capacity: 1024,
            sdf: SdfConfig::default(),
        }
    }
}

impl FontSystemConfig {
    /// Create default configuration (1024 cached runs).
    pub fn new() -> Self {
        Self::default()
    }

    /// Small config for memory-constrained environments (256 cached runs).
    pub fn small() -> Self {
        Self {
            run_cache_capacity: 256,
            ..Default::default()
        }
    }

    /// Medium config (1024 cached runs).
    ///
    /// Good balance for most applications.
    pub fn medium() -> Self {
        Self {
            run_cache_capacity: 1024,
            ..Default::default()
        }
    }

    /// Large config for text-heavy applications (4096 cached runs).
    pub fn large() -> Self {
        Self {
            run_cache_capacity: 4096,
            ..Default::default()
        }
    }

    pub fn with_run_cache_capacity(mut self, capacity: usize) -> Self {
        self.run_cache_capacity = capacity;
        self
    }

    /// Set SDF configuration.
    pub fn with_sdf_config(mut self, config: SdfConfig) -> Self {
        self.sdf = config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdf::SdfMode;

    #[test]
    fn test_presets() {
        assert_eq!(FontSystemConfig::small().run_cache_capacity, 256);
        assert_eq!(FontSystemConfig::medium(), FontSystemConfig::default());
        assert_eq!(FontSystemConfig::large().run_cache_capacity, 4096);
    }

    #[test]
    fn test_builder() {
        let config = FontSystemConfig::new()
            .with_run_cache_capacity(8)
            .with_sdf_config(SdfConfig::mtsdf());
        assert_eq!(config.run_cache_capacity, 8);
        assert_eq!(config.sdf.mode, SdfMode::Mtsdf);
    }
}
