//! Creative build configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Banner markup used when a build supplies none
pub const DEFAULT_TEMPLATE: &str = "<canvas></canvas>";

/// Static choices baked into a creative build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreativeConfig {
    /// Markup injected into the animation container
    pub html_template: String,
    /// Ad duration in seconds
    pub duration: f64,
    /// Initial remaining time in seconds
    pub remaining_time: f64,
    /// Whether the host may skip the ad
    pub skippable: bool,
    /// Linear (in-stream) vs non-linear ad
    pub linear: bool,
    /// Companion payload handed to the host verbatim
    pub companions: String,
    /// Icon payload handed to the host verbatim
    pub icons: String,
    /// Mute the video slot when autoplaying
    pub autoplay_muted: bool,
    /// Loop the video slot when autoplaying
    pub autoplay_loop: bool,
}

impl Default for CreativeConfig {
    fn default() -> Self {
        Self {
            html_template: DEFAULT_TEMPLATE.to_string(),
            duration: 30.0,
            remaining_time: 10.0,
            skippable: false,
            linear: true,
            companions: String::new(),
            icons: String::new(),
            autoplay_muted: true,
            autoplay_loop: true,
        }
    }
}

impl CreativeConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: CreativeConfig =
            serde_json::from_str(raw).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.duration.is_finite() || !self.remaining_time.is_finite() {
            return Err(Error::InvalidConfig("timing values must be finite".into()));
        }
        Ok(())
    }

    /// Skippable in-stream spot
    pub fn skippable() -> Self {
        Self {
            skippable: true,
            ..Self::default()
        }
    }

    /// Non-linear overlay banner
    pub fn overlay() -> Self {
        Self {
            linear: false,
            autoplay_loop: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CreativeConfig::default();
        assert_eq!(config.html_template, "<canvas></canvas>");
        assert_eq!(config.duration, 30.0);
        assert!(config.linear);
        assert!(!config.skippable);
    }

    #[test]
    fn test_partial_json() {
        let config = CreativeConfig::from_json(r#"{"skippable":true,"duration":15}"#).unwrap();
        assert!(config.skippable);
        assert_eq!(config.duration, 15.0);
        assert_eq!(config.remaining_time, 10.0);
    }

    #[test]
    fn test_invalid_json() {
        let err = CreativeConfig::from_json(r#"{"duration":"long"}"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }
}
