//! Post-processing settings.

use serde::{Deserialize, Serialize};

use crate::error::{PostProcessError, Result};

/// Line after which the slicer dumps its configuration.
pub const DEFAULT_CONFIG_START_MARKER: &str = "; prusaslicer_config = begin";

/// Line that closes the fixed start code in legacy templates.
pub const DEFAULT_START_CODE_END_MARKER: &str = "; FFPP-start-code-end";

/// Which set of rewrite passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineMode {
    /// Macro substitution, M109 split with feed backfill, tool-change strip.
    #[default]
    Standard,
    /// Macro substitution, M109 dropped after the start code, tool-change strip.
    LegacyStartCode,
    /// Z-move feed correction only.
    LegacyZFeed,
}

impl PipelineMode {
    /// Name as used in settings files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineMode::Standard => "standard",
            PipelineMode::LegacyStartCode => "legacy-start-code",
            PipelineMode::LegacyZFeed => "legacy-z-feed",
        }
    }
}

/// Travel feed rates in mm/min.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedRates {
    /// XY travel feed rate (mm/min).
    pub xy_travel: f64,
    /// Z travel feed rate (mm/min).
    pub z_travel: f64,
}

impl Default for FeedRates {
    fn default() -> Self {
        // 130 mm/s and 7 mm/s, the slicer defaults for FlashForge profiles.
        Self {
            xy_travel: 7800.0,
            z_travel: 420.0,
        }
    }
}

impl FeedRates {
    /// Build from speeds in mm/s, as slicers report them.
    pub fn from_mm_per_second(xy: f64, z: f64) -> Self {
        Self {
            xy_travel: xy * 60.0,
            z_travel: z * 60.0,
        }
    }
}

/// Post-processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessSettings {
    /// Travel feed rates used for backfilled and corrected moves.
    pub feed_rates: FeedRates,
    /// Pass selection.
    pub mode: PipelineMode,
    /// Substitution stops at this line.
    pub config_start_marker: String,
    /// Legacy M109 suppression starts after this line.
    pub start_code_end_marker: String,
    /// Prepend the post-processing header to the output.
    pub add_header: bool,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            feed_rates: FeedRates::default(),
            mode: PipelineMode::default(),
            config_start_marker: DEFAULT_CONFIG_START_MARKER.into(),
            start_code_end_marker: DEFAULT_START_CODE_END_MARKER.into(),
            add_header: true,
        }
    }
}

impl PostProcessSettings {
    /// Parse settings from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(s).map_err(|e| PostProcessError::InvalidSettings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("xy_travel", self.feed_rates.xy_travel),
            ("z_travel", self.feed_rates.z_travel),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PostProcessError::InvalidSettings(format!(
                    "{name} feed rate must be positive, got {value}"
                )));
            }
        }
        if self.config_start_marker.trim().is_empty() {
            return Err(PostProcessError::InvalidSettings(
                "config_start_marker must not be empty".into(),
            ));
        }
        if self.start_code_end_marker.trim().is_empty() {
            return Err(PostProcessError::InvalidSettings(
                "start_code_end_marker must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PostProcessSettings::default().validate().is_ok());
    }

    #[test]
    fn test_from_mm_per_second() {
        let feed = FeedRates::from_mm_per_second(130.0, 7.0);
        assert_relative_eq!(feed.xy_travel, 7800.0);
        assert_relative_eq!(feed.z_travel, 420.0);
    }

    #[test]
    fn test_from_toml_partial() {
        let settings = PostProcessSettings::from_toml_str(
            r#"
            mode = "legacy-z-feed"

            [feed_rates]
            xy_travel = 9000.0
            z_travel = 600.0
            "#,
        )
        .unwrap();
        assert_eq!(settings.mode, PipelineMode::LegacyZFeed);
        assert_relative_eq!(settings.feed_rates.xy_travel, 9000.0);
        assert_eq!(settings.config_start_marker, DEFAULT_CONFIG_START_MARKER);
        assert!(settings.add_header);
    }

    #[test]
    fn test_rejects_bad_feed() {
        let mut settings = PostProcessSettings::default();
        settings.feed_rates.z_travel = 0.0;
        assert!(matches!(
            settings.validate(),
            Err(PostProcessError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_mode_names_match_toml() {
        for mode in [
            PipelineMode::Standard,
            PipelineMode::LegacyStartCode,
            PipelineMode::LegacyZFeed,
        ] {
            let text = format!("mode = \"{}\"", mode.as_str());
            assert_eq!(PostProcessSettings::from_toml_str(&text).unwrap().mode, mode);
        }
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(PostProcessSettings::from_toml_str("mode = \"fast\"").is_err());
    }
}
