//! Grid configuration and persisted settings
//!
//! `GridConfig` is the validated, immutable configuration of one run.
//! `ConversionSettings` is the loose key/value form a front end saves between
//! sessions; missing keys fall back to the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HIGH_QUALITY, DEFAULT_IMAGES_PER_PAGE, DEFAULT_OUTPUT_BASE_NAME, DEFAULT_PAGE_SIZE,
    MAX_IMAGES_PER_PAGE, MIN_IMAGES_PER_PAGE,
};
use crate::error::{Error, Result};
use crate::layout::{GridDimensions, GridLayout, PageSize};

/// Validated layout and quality settings for one conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    images_per_page: usize,
    page_size: PageSize,
    high_quality: bool,
}

impl GridConfig {
    /// Fails with `InvalidConfig` unless `images_per_page` is within [1, 12]
    pub fn new(images_per_page: usize, page_size: PageSize, high_quality: bool) -> Result<Self> {
        if !(MIN_IMAGES_PER_PAGE..=MAX_IMAGES_PER_PAGE).contains(&images_per_page) {
            return Err(Error::InvalidConfig(format!(
                "images per page must be between {} and {}, got {}",
                MIN_IMAGES_PER_PAGE, MAX_IMAGES_PER_PAGE, images_per_page
            )));
        }
        Ok(Self {
            images_per_page,
            page_size,
            high_quality,
        })
    }

    pub fn images_per_page(&self) -> usize {
        self.images_per_page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn high_quality(&self) -> bool {
        self.high_quality
    }

    pub fn grid_dimensions(&self) -> GridDimensions {
        GridDimensions::for_images_per_page(self.images_per_page)
    }

    pub fn grid_layout(&self) -> GridLayout {
        GridLayout::new(self.page_size, self.images_per_page)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            images_per_page: DEFAULT_IMAGES_PER_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            high_quality: DEFAULT_HIGH_QUALITY,
        }
    }
}

/// Settings a front end persists between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    pub images_per_page: usize,
    pub page_size: PageSize,
    pub high_quality: bool,
    pub output_base_name: String,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            images_per_page: DEFAULT_IMAGES_PER_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            high_quality: DEFAULT_HIGH_QUALITY,
            output_base_name: DEFAULT_OUTPUT_BASE_NAME.to_string(),
        }
    }
}

impl ConversionSettings {
    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Validate into a `GridConfig`
    pub fn grid_config(&self) -> Result<GridConfig> {
        GridConfig::new(self.images_per_page, self.page_size, self.high_quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = GridConfig::default();
        assert_eq!(config.images_per_page(), 9);
        assert_eq!(config.page_size(), PageSize::A4);
        assert!(config.high_quality());
        assert_eq!(config.grid_dimensions(), GridDimensions { rows: 3, cols: 3 });

        let settings = ConversionSettings::default();
        assert_eq!(settings.grid_config().unwrap(), config);
        assert_eq!(settings.output_base_name, "converted_svgs");
    }

    #[test]
    fn test_images_per_page_bounds() {
        assert!(GridConfig::new(1, PageSize::A4, true).is_ok());
        assert!(GridConfig::new(12, PageSize::A4, true).is_ok());
        assert!(matches!(
            GridConfig::new(0, PageSize::A4, true),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            GridConfig::new(13, PageSize::A4, true),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_settings_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let settings = ConversionSettings {
            images_per_page: 4,
            page_size: PageSize::Letter,
            high_quality: false,
            output_base_name: "contact_sheet".to_string(),
        };

        settings.save(&path).unwrap();
        assert_eq!(ConversionSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: ConversionSettings =
            serde_json::from_str(r#"{ "page_size": "A3", "images_per_page": 6 }"#).unwrap();
        assert_eq!(settings.page_size, PageSize::A3);
        assert_eq!(settings.images_per_page, 6);
        assert!(settings.high_quality);
        assert_eq!(settings.output_base_name, "converted_svgs");
    }

    #[test]
    fn test_invalid_settings_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ConversionSettings::load(&path), Err(Error::Settings(_))));
    }
}
