//! Settings exported by the slicer to post-processing scripts.
//!
//! PrusaSlicer and its forks export every print setting as a
//! `SLIC3R_<NAME>` environment variable. Speeds are in mm/s.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ffpp_gcode::PostProcessSettings;
use tracing::debug;

/// Path the slicer intends to write the G-code to.
pub const OUTPUT_NAME_VAR: &str = "SLIC3R_PP_OUTPUT_NAME";
/// XY travel speed (mm/s).
pub const TRAVEL_SPEED_VAR: &str = "SLIC3R_TRAVEL_SPEED";
/// Z travel speed (mm/s); 0 means "not set" in the slicer.
pub const TRAVEL_SPEED_Z_VAR: &str = "SLIC3R_TRAVEL_SPEED_Z";

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Values read from the slicer environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlicerEnv {
    /// Destination path chosen in the slicer.
    pub output_name: Option<PathBuf>,
    /// XY travel speed (mm/s).
    pub travel_speed: Option<f64>,
    /// Z travel speed (mm/s), `None` when unset or 0.
    pub travel_speed_z: Option<f64>,
}

impl SlicerEnv {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through `lookup`, which returns a variable's value if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let speed = |name: &str| -> Result<Option<f64>> {
            lookup(name)
                .map(|raw| {
                    raw.trim()
                        .parse::<f64>()
                        .with_context(|| format!("{name}={raw:?} is not a number"))
                })
                .transpose()
        };

        let travel_speed = speed(TRAVEL_SPEED_VAR)?;
        let travel_speed_z = match speed(TRAVEL_SPEED_Z_VAR)? {
            Some(z) if z <= 0.0 => {
                debug!("{TRAVEL_SPEED_Z_VAR} is {z}, keeping the configured Z feed rate");
                None
            }
            other => other,
        };

        Ok(Self {
            output_name: lookup(OUTPUT_NAME_VAR).map(PathBuf::from),
            travel_speed,
            travel_speed_z,
        })
    }

    /// Override feed rates in `settings` with the slicer's speeds.
    pub fn apply(&self, settings: &mut PostProcessSettings) {
        if let Some(xy) = self.travel_speed {
            settings.feed_rates.xy_travel = xy * SECONDS_PER_MINUTE;
        }
        if let Some(z) = self.travel_speed_z {
            settings.feed_rates.z_travel = z * SECONDS_PER_MINUTE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffpp_gcode::FeedRates;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Result<SlicerEnv> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SlicerEnv::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_reads_speeds() {
        let env = env(&[
            (OUTPUT_NAME_VAR, "/tmp/cube.gcode"),
            (TRAVEL_SPEED_VAR, "130"),
            (TRAVEL_SPEED_Z_VAR, "7"),
        ])
        .unwrap();
        assert_eq!(env.output_name, Some(PathBuf::from("/tmp/cube.gcode")));
        assert_eq!(env.travel_speed, Some(130.0));
        assert_eq!(env.travel_speed_z, Some(7.0));

        let mut settings = PostProcessSettings::default();
        settings.feed_rates = FeedRates {
            xy_travel: 1.0,
            z_travel: 1.0,
        };
        env.apply(&mut settings);
        assert_eq!(settings.feed_rates.xy_travel, 7800.0);
        assert_eq!(settings.feed_rates.z_travel, 420.0);
    }

    #[test]
    fn test_zero_z_speed_is_unset() {
        let env = env(&[(TRAVEL_SPEED_Z_VAR, "0")]).unwrap();
        assert_eq!(env.travel_speed_z, None);

        let mut settings = PostProcessSettings::default();
        env.apply(&mut settings);
        assert_eq!(settings.feed_rates.z_travel, 420.0);
    }

    #[test]
    fn test_missing_values_keep_settings() {
        let env = env(&[]).unwrap();
        let mut settings = PostProcessSettings::default();
        env.apply(&mut settings);
        assert_eq!(settings.feed_rates, FeedRates::default());
    }

    #[test]
    fn test_rejects_garbage() {
        let err = env(&[(TRAVEL_SPEED_VAR, "fast")]).unwrap_err();
        assert!(err.to_string().contains(TRAVEL_SPEED_VAR));
    }
}
