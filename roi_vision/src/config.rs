// THEORY:
// Configuration is layered. `PipelineConfig::default()` carries the observed
// constants; an optional TOML file overrides any subset of them; the command
// line overrides the result. This module owns the middle layer only.
//
// Every section and key in the file is optional, but keys that are present
// must be known and well-formed. A typo is a configuration error rather than
// a silently ignored setting.

use crate::core_modules::background_model::MotionConfig;
use crate::core_modules::occupancy::OccupancyMode;
use crate::core_modules::rect::Roi;
use crate::error::{Result, VisionError};
use crate::pipeline::PipelineConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    mode: Option<OccupancyMode>,
    roi: Option<Roi>,
    motion: Option<MotionConfig>,
    candidates: Option<CandidatesConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CandidatesConfigFile {
    min_area: Option<u32>,
}

impl PipelineConfig {
    /// Reads a TOML configuration file and merges it over the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| VisionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loading configuration from {}", path.display());
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(raw).map_err(|e| VisionError::Config(e.to_string()))?;
        let defaults = PipelineConfig::default();

        let config = PipelineConfig {
            roi: file.roi.unwrap_or(defaults.roi),
            mode: file.mode.unwrap_or(defaults.mode),
            motion: file.motion.unwrap_or(defaults.motion),
            min_candidate_area: file
                .candidates
                .and_then(|c| c.min_area)
                .unwrap_or(defaults.min_candidate_area),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(PipelineConfig::from_toml_str("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            mode = "first-entry"

            [motion]
            var_threshold = 25.0

            [candidates]
            min_area = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, OccupancyMode::FirstEntry);
        assert_eq!(config.motion.var_threshold, 25.0);
        assert_eq!(config.motion.history, 500);
        assert_eq!(config.motion.binarize_threshold, 50);
        assert_eq!(config.min_candidate_area, 120);
        assert_eq!(config.roi, Roi::default());
    }

    #[test]
    fn roi_table_must_be_complete() {
        let err = PipelineConfig::from_toml_str("[roi]\nx = 1\ny = 2\nwidth = 3\n").unwrap_err();
        assert!(matches!(err, VisionError::Config(_)));

        let config =
            PipelineConfig::from_toml_str("[roi]\nx = 1\ny = 2\nwidth = 3\nheight = 4\n").unwrap();
        assert_eq!(config.roi, Roi::new(1, 2, 3, 4).unwrap());
    }

    #[test]
    fn zero_sized_roi_is_rejected() {
        let err = PipelineConfig::from_toml_str("[roi]\nx = 1\ny = 2\nwidth = 0\nheight = 4\n");
        assert!(err.is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(PipelineConfig::from_toml_str("[motion]\nvar_treshold = 10.0\n").is_err());
        assert!(PipelineConfig::from_toml_str("colour = \"red\"\n").is_err());
    }

    #[test]
    fn invalid_motion_values_are_rejected() {
        let err = PipelineConfig::from_toml_str("[motion]\nvar_min = 90.0\n").unwrap_err();
        assert!(matches!(err, VisionError::Config(_)));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mode = \"intervals\"\n[candidates]\nmin_area = 42").unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.min_candidate_area, 42);
        assert_eq!(config.mode, OccupancyMode::Intervals);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            PipelineConfig::load(dir.path().join("absent.toml")),
            Err(VisionError::Io { .. })
        ));
    }
}
