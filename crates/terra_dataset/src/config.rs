//! # Dataset Configuration
//!
//! TOML-backed settings, loaded once at startup.
//!
//! ```toml
//! tile_size = 256
//!
//! [cache]
//! expire_after_access_secs = 300
//! max_entries = 4096
//!
//! [[urls]]
//! url = "https://tiles.example.org/elevation/${zoom}/${x}/${z}.png"
//! zoom = 0
//! priority = 10.0
//!
//! [[urls]]
//! url = "https://backup.example.org/${lon.min}/${lat.min}.tif"
//! bounds = [-4096.0, 4096.0, -4096.0, 4096.0]
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use terra_core::{Bounds2d, CacheSettings};

use crate::error::{DatasetError, DatasetResult};
use crate::url::WrappedUrl;

/// Cache eviction settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Idle seconds before an entry is dropped.
    pub expire_after_access_secs: u64,
    /// Entry count above which finished entries are evicted.
    pub max_entries: usize,
    /// Minimum seconds between lazy expiry sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let defaults = CacheSettings::default();
        Self {
            expire_after_access_secs: defaults.expire_after_access.as_secs(),
            max_entries: defaults.max_entries,
            sweep_interval_secs: defaults.sweep_interval.as_secs(),
        }
    }
}

impl CacheConfig {
    /// Converts to the core cache policy.
    #[must_use]
    pub fn settings(&self) -> CacheSettings {
        CacheSettings {
            expire_after_access: Duration::from_secs(self.expire_after_access_secs),
            max_entries: self.max_entries.max(1),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }
}

/// One configured URL template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UrlConfig {
    /// Template with `${...}` placeholders.
    pub url: String,
    /// Zoom level served.
    #[serde(default)]
    pub zoom: u8,
    /// Higher is tried first.
    #[serde(default)]
    pub priority: f64,
    /// `[min_x, max_x, min_z, max_z]` in blocks; absent means everywhere.
    #[serde(default)]
    pub bounds: Option<[f64; 4]>,
}

/// A tiled dataset definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Samples along one tile edge.
    pub tile_size: u32,
    /// Tile cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Candidate URL templates.
    #[serde(default)]
    pub urls: Vec<UrlConfig>,
}

impl DatasetConfig {
    /// Parses a dataset definition from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidConfig`] on malformed TOML, a zero tile
    /// size, or inverted URL bounds.
    pub fn from_toml_str(source: &str) -> DatasetResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| DatasetError::InvalidConfig(e.to_string()))?;
        if config.tile_size == 0 {
            return Err(DatasetError::InvalidConfig("tile_size must be positive".into()));
        }
        // Validate bounds eagerly so a bad file fails at startup
        config.wrapped_urls()?;
        Ok(config)
    }

    /// Resolves the URL list, in configured order.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Core`] if any bounds are inverted.
    pub fn wrapped_urls(&self) -> DatasetResult<Vec<WrappedUrl>> {
        self.urls
            .iter()
            .map(|u| {
                let bounds = match u.bounds {
                    Some([min_x, max_x, min_z, max_z]) => Bounds2d::new(min_x, max_x, min_z, max_z)?,
                    None => Bounds2d::EVERYTHING,
                };
                Ok(WrappedUrl::new(u.url.clone(), bounds, u.zoom, u.priority))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = DatasetConfig::from_toml_str(
            r#"
            tile_size = 256

            [cache]
            expire_after_access_secs = 60
            max_entries = 10

            [[urls]]
            url = "https://a/${x}/${z}"
            priority = 2.0

            [[urls]]
            url = "https://b/${zoom}"
            zoom = 3
            bounds = [0.0, 100.0, -50.0, 50.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.tile_size, 256);
        assert_eq!(config.cache.max_entries, 10);
        assert_eq!(config.cache.sweep_interval_secs, 30);
        assert_eq!(config.cache.settings().expire_after_access, Duration::from_secs(60));

        let urls = config.wrapped_urls().unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].zoom(), 0);
        assert_eq!(urls[1].zoom(), 3);
        assert_eq!(urls[0].priority(), 2.0);
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            DatasetConfig::from_toml_str("tile_size = 0"),
            Err(DatasetError::InvalidConfig(_))
        ));
        assert!(DatasetConfig::from_toml_str("tile_size = \"big\"").is_err());
        assert!(matches!(
            DatasetConfig::from_toml_str(
                "tile_size = 16\n[[urls]]\nurl = \"x\"\nbounds = [10.0, 0.0, 0.0, 1.0]\n"
            ),
            Err(DatasetError::Core(_))
        ));
    }
}
