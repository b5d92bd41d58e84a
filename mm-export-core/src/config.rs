//! Export configuration, shared between the CLI flags and the on-disk
//! `KEY=VALUE` config file the original emulator keeps alongside its save
//! state.

use crate::error::ExportError;

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub video_codec: String,
    pub keyframe_interval_ms: u32,
    pub compression_level: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            video_codec: "auto".to_string(),
            keyframe_interval_ms: 1000,
            compression_level: 6,
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.keyframe_interval_ms == 0 {
            return Err(ExportError::InvalidArgument(
                "keyframe interval must be greater than zero".to_string(),
            ));
        }
        if self.compression_level > 9 {
            return Err(ExportError::InvalidArgument(format!(
                "compression level {} out of range 0..=9",
                self.compression_level
            )));
        }
        Ok(())
    }

    /// Renders this config as the `KEY=VALUE` lines the config file format
    /// expects, one per line, no trailing newline. `VIDEO_CODEC=AUTO` is
    /// emitted (uppercase) when no explicit codec was requested; any other
    /// codec id is emitted verbatim.
    pub fn to_config_lines(&self) -> String {
        let codec = if self.video_codec.eq_ignore_ascii_case("auto") {
            "AUTO".to_string()
        } else {
            self.video_codec.clone()
        };
        format!(
            "VIDEO_CODEC={}\nVIDEO_CODEC_KEYFRAME_INTERVAL={}\nCOMPRESSION_LEVEL={}",
            codec, self.keyframe_interval_ms, self.compression_level
        )
    }

    /// Parses `KEY=VALUE` lines produced by [`Self::to_config_lines`],
    /// falling back to defaults for any key that is absent. Unknown keys
    /// and malformed lines are ignored rather than rejected, matching the
    /// tolerant config-file reading the emulator itself does.
    pub fn from_config_lines(text: &str) -> Self {
        let mut config = Self::default();
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "VIDEO_CODEC" => config.video_codec = value.trim().to_string(),
                "VIDEO_CODEC_KEYFRAME_INTERVAL" => {
                    if let Ok(ms) = value.trim().parse() {
                        config.keyframe_interval_ms = ms;
                    }
                }
                "COMPRESSION_LEVEL" => {
                    if let Ok(level) = value.trim().parse() {
                        config.compression_level = level;
                    }
                }
                _ => {}
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ExportConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_keyframe_interval_is_rejected() {
        let mut config = ExportConfig::default();
        config.keyframe_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ExportError::InvalidArgument(_))
        ));
    }

    #[test]
    fn compression_level_above_nine_is_rejected() {
        let mut config = ExportConfig::default();
        config.compression_level = 10;
        assert!(matches!(
            config.validate(),
            Err(ExportError::InvalidArgument(_))
        ));
    }

    #[test]
    fn round_trips_through_config_lines() {
        let config = ExportConfig {
            video_codec: "mrle".to_string(),
            keyframe_interval_ms: 250,
            compression_level: 3,
        };
        let rendered = config.to_config_lines();
        let parsed = ExportConfig::from_config_lines(&rendered);
        assert_eq!(parsed.video_codec, "mrle");
        assert_eq!(parsed.keyframe_interval_ms, 250);
        assert_eq!(parsed.compression_level, 3);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let parsed = ExportConfig::from_config_lines("SOME_OTHER_KEY=1\nVIDEO_CODEC=mpng");
        assert_eq!(parsed.video_codec, "mpng");
    }

    #[test]
    fn default_codec_is_written_as_uppercase_auto() {
        let config = ExportConfig::default();
        assert!(config.to_config_lines().contains("VIDEO_CODEC=AUTO"));
    }
}
