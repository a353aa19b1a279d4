use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Contents of an optional `scry.toml`. Every field has a default so an
/// empty file (or no file) is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub slideshow: SlideshowSettings,
    #[serde(default)]
    pub brightness: BrightnessSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlideshowSettings {
    /// Hold time per photo.
    #[serde(default = "default_display", deserialize_with = "deserialize_duration")]
    pub display: Duration,
    /// Dissolve length.
    #[serde(default = "default_fade", deserialize_with = "deserialize_duration")]
    pub fade: Duration,
    /// Optional frame cap; absent or 0 means vsync only.
    #[serde(default)]
    pub fps: Option<f32>,
}

impl Default for SlideshowSettings {
    fn default() -> Self {
        Self {
            display: default_display(),
            fade: default_fade(),
            fps: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrightnessSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Interval between one-percent sweep steps.
    #[serde(default = "default_step", deserialize_with = "deserialize_duration")]
    pub step: Duration,
}

impl Default for BrightnessSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            step: default_step(),
        }
    }
}

fn default_display() -> Duration {
    Duration::from_secs(15)
}

fn default_fade() -> Duration {
    Duration::from_secs(2)
}

fn default_enabled() -> bool {
    true
}

fn default_step() -> Duration {
    Duration::from_millis(100)
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}
