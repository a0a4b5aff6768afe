//! Gallery settings.
//!
//! Settings come from a YAML file (`settings.yaml` by default) layered
//! under `EXPOSURE_*` environment variables, merged once at startup into
//! an immutable [`GalleryConfig`] that is passed by reference everywhere —
//! no global state. Priority: environment > settings file > defaults.
//!
//! ```yaml
//! # All keys optional — defaults shown
//! content_dir: content            # Flat directory of source photos
//! gallery_file: gallery.yaml      # Category + per-image metadata document
//! output_dir: dist
//! default_category: Uncategorized # Category assigned to new stub entries
//! site_title: Gallery
//!
//! thumbnails:
//!   max_dimension: 800            # Larger edge of generated thumbnails
//!   webp_quality: 85
//!   jpeg_quality: 90
//!   enable_cache: true
//!
//! placeholders:
//!   enabled: true
//!   target_size: 20               # Larger edge of the blur preview
//!   start_quality: 50
//!   max_data_url_bytes: 2000
//!   blur_radius: 12               # CSS blur radius hint for the renderer
//! ```

use confique::Config;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings file consulted when `--settings` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings load error: {0}")]
    Load(#[from] confique::Error),
    #[error("settings file not found: {0}")]
    MissingSettings(PathBuf),
    #[error("content directory not found: {0}")]
    MissingContentDir(PathBuf),
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Build settings, immutable after [`load_config`].
#[derive(Debug, Clone, Config)]
pub struct GalleryConfig {
    #[config(env = "EXPOSURE_CONTENT_DIR", default = "content")]
    pub content_dir: PathBuf,

    #[config(env = "EXPOSURE_GALLERY_FILE", default = "gallery.yaml")]
    pub gallery_file: PathBuf,

    #[config(env = "EXPOSURE_OUTPUT_DIR", default = "dist")]
    pub output_dir: PathBuf,

    /// Category assigned to newly discovered images without a YAML entry.
    #[config(env = "EXPOSURE_DEFAULT_CATEGORY", default = "Uncategorized")]
    pub default_category: String,

    #[config(env = "EXPOSURE_SITE_TITLE", default = "Gallery")]
    pub site_title: String,

    #[config(nested)]
    pub thumbnails: ThumbnailsConfig,

    #[config(nested)]
    pub placeholders: PlaceholderConfig,
}

/// Thumbnail pipeline settings.
#[derive(Debug, Clone, Config)]
pub struct ThumbnailsConfig {
    /// Larger edge of generated thumbnails. Sources already within this
    /// bound are never upscaled.
    #[config(default = 800)]
    pub max_dimension: u32,

    #[config(default = 85)]
    pub webp_quality: u8,

    #[config(default = 90)]
    pub jpeg_quality: u8,

    /// Disable to force regeneration of every thumbnail.
    #[config(default = true)]
    pub enable_cache: bool,
}

/// Blur placeholder settings.
#[derive(Debug, Clone, Config)]
pub struct PlaceholderConfig {
    #[config(default = true)]
    pub enabled: bool,

    /// Larger edge of the preview image.
    #[config(default = 20)]
    pub target_size: u32,

    /// JPEG quality of the first encode attempt; reduced stepwise when the
    /// data URL exceeds `max_data_url_bytes`.
    #[config(default = 50)]
    pub start_quality: u8,

    #[config(default = 2000)]
    pub max_data_url_bytes: usize,

    /// CSS blur radius in pixels, carried as metadata for the renderer.
    #[config(default = 12)]
    pub blur_radius: u32,
}

impl GalleryConfig {
    /// Validate value ranges and required paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.content_dir.is_dir() {
            return Err(ConfigError::MissingContentDir(self.content_dir.clone()));
        }
        if self.default_category.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default_category must not be empty".into(),
            ));
        }
        for (name, quality) in [
            ("thumbnails.webp_quality", self.thumbnails.webp_quality),
            ("thumbnails.jpeg_quality", self.thumbnails.jpeg_quality),
            ("placeholders.start_quality", self.placeholders.start_quality),
        ] {
            if quality == 0 || quality > 100 {
                return Err(ConfigError::Validation(format!("{name} must be 1-100")));
            }
        }
        if self.thumbnails.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.max_dimension must be positive".into(),
            ));
        }
        if self.placeholders.target_size == 0 || self.placeholders.target_size > 50 {
            return Err(ConfigError::Validation(
                "placeholders.target_size must be 1-50".into(),
            ));
        }
        Ok(())
    }
}

/// Load settings with the full layering: environment over the settings
/// file over defaults, then validate.
///
/// An explicitly requested settings file must exist; the default
/// `settings.yaml` is optional.
pub fn load_config(settings: Option<&Path>) -> Result<GalleryConfig, ConfigError> {
    let mut builder = GalleryConfig::builder().env();
    match settings {
        Some(path) => {
            if !path.is_file() {
                return Err(ConfigError::MissingSettings(path.to_path_buf()));
            }
            builder = builder.file(path);
        }
        None => {
            builder = builder.file(DEFAULT_SETTINGS_FILE);
        }
    }
    let config = builder.load()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn base_config(tmp: &TempDir) -> GalleryConfig {
        let mut config = GalleryConfig::builder().load().unwrap();
        config.content_dir = tmp.path().to_path_buf();
        config
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = GalleryConfig::builder().load().unwrap();
        assert_eq!(config.content_dir, PathBuf::from("content"));
        assert_eq!(config.default_category, "Uncategorized");
        assert_eq!(config.thumbnails.max_dimension, 800);
        assert_eq!(config.thumbnails.webp_quality, 85);
        assert_eq!(config.thumbnails.jpeg_quality, 90);
        assert!(config.thumbnails.enable_cache);
        assert!(config.placeholders.enabled);
        assert_eq!(config.placeholders.target_size, 20);
        assert_eq!(config.placeholders.start_quality, 50);
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.yaml");
        fs::write(
            &path,
            "site_title: Portfolio\nthumbnails:\n  max_dimension: 640\n",
        )
        .unwrap();

        let config: GalleryConfig = GalleryConfig::builder().file(&path).load().unwrap();
        assert_eq!(config.site_title, "Portfolio");
        assert_eq!(config.thumbnails.max_dimension, 640);
        // Untouched keys keep their defaults
        assert_eq!(config.thumbnails.webp_quality, 85);
    }

    #[test]
    fn environment_overrides_settings_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.yaml");
        fs::write(&path, "site_title: FromFile\n").unwrap();

        // SAFETY: the only test in this binary touching this variable
        unsafe { std::env::set_var("EXPOSURE_SITE_TITLE", "FromEnv") };
        let config: GalleryConfig = GalleryConfig::builder().env().file(&path).load().unwrap();
        unsafe { std::env::remove_var("EXPOSURE_SITE_TITLE") };

        assert_eq!(config.site_title, "FromEnv");
    }

    #[test]
    fn load_config_rejects_missing_explicit_settings() {
        let err = load_config(Some(Path::new("/nonexistent/settings.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSettings(_)));
    }

    #[test]
    fn validate_rejects_missing_content_dir() {
        let mut config = GalleryConfig::builder().load().unwrap();
        config.content_dir = PathBuf::from("/nonexistent/content");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingContentDir(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_quality() {
        let tmp = TempDir::new().unwrap();
        let mut config = base_config(&tmp);
        config.thumbnails.webp_quality = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_quality_above_100() {
        let tmp = TempDir::new().unwrap();
        let mut config = base_config(&tmp);
        config.thumbnails.jpeg_quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_default_category() {
        let tmp = TempDir::new().unwrap();
        let mut config = base_config(&tmp);
        config.default_category = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_placeholder_target() {
        let tmp = TempDir::new().unwrap();
        let mut config = base_config(&tmp);
        config.placeholders.target_size = 80;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults_with_existing_content_dir() {
        let tmp = TempDir::new().unwrap();
        let config = base_config(&tmp);
        config.validate().unwrap();
    }
}
