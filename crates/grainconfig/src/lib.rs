use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "grainy.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GrainConfig {
    pub version: u32,
    #[serde(default)]
    pub gradient: Option<String>,
    #[serde(default)]
    pub shimmer_speed: Option<f32>,
    #[serde(default)]
    pub preserve_aspect: Option<bool>,
    #[serde(default)]
    pub pixelated: Option<bool>,
    #[serde(default)]
    pub paused: Option<bool>,
    #[serde(default)]
    pub resolution_scale: Option<f32>,
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_time: Option<Duration>,
    #[serde(default)]
    pub root_font_size: Option<f32>,
    #[serde(default)]
    pub noise: NoiseSection,
    #[serde(default)]
    pub cycle: Option<CycleSection>,
    #[serde(default)]
    pub context: ContextSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NoiseSection {
    #[serde(default)]
    pub texture_size: Option<u32>,
    #[serde(default)]
    pub seed: Option<SeedValue>,
}

/// A noise seed as written in the file; bare numbers stay numbers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SeedValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CycleSection {
    #[serde(
        default = "default_cycle_period",
        deserialize_with = "deserialize_duration"
    )]
    pub period: Duration,
    #[serde(default)]
    pub gradients: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextSection {
    #[serde(default)]
    pub force_fallback_adapter: Option<bool>,
    #[serde(default)]
    pub power_preference: Option<PowerPreference>,
    /// Backend name such as `vulkan` or `gl`; `auto` when absent.
    #[serde(default)]
    pub backend: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerPreference {
    Low,
    High,
}

fn default_cycle_period() -> Duration {
    Duration::from_secs(5)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_opt(deserializer).map(|d| d.unwrap_or_else(default_cycle_period))
}

/// Durations are either humantime strings (`"1.5s"`, `"250ms"`) or plain
/// numbers of milliseconds.
fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as milliseconds or a human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v.trim())
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_millis(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_millis(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be a non-negative number"));
            }
            Duration::try_from_secs_f64(v / 1000.0)
                .map(Some)
                .map_err(|_| E::custom("duration is out of range"))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl GrainConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GrainConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Like [`load`](Self::load), but a missing file yields `None`.
    pub fn load_optional(path: &Path) -> Result<Option<Self>, ConfigError> {
        match Self::load(path) {
            Ok(config) => Ok(Some(config)),
            Err(ConfigError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub fn initial_time_ms(&self) -> Option<f64> {
        self.initial_time
            .map(|duration| duration.as_secs_f64() * 1000.0)
    }

    /// Only structural problems are rejected here; out-of-range numbers are
    /// left for the renderer to normalize.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if let Some(gradient) = &self.gradient {
            if gradient.trim().is_empty() {
                return Err(ConfigError::Invalid("gradient may not be empty".into()));
            }
        }

        if let Some(cycle) = &self.cycle {
            if self.gradient.is_some() {
                return Err(ConfigError::Invalid(
                    "set either `gradient` or a [cycle] table, not both".into(),
                ));
            }
            if cycle.gradients.is_empty() {
                return Err(ConfigError::Invalid(
                    "cycle must contain at least one gradient".into(),
                ));
            }
            if cycle.period.is_zero() {
                return Err(ConfigError::Invalid(
                    "cycle period must be greater than zero".into(),
                ));
            }
            if let Some(index) = cycle.gradients.iter().position(|g| g.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "cycle gradient {index} is empty"
                )));
            }
        }

        if let Some(SeedValue::Text(seed)) = &self.noise.seed {
            if seed.is_empty() {
                return Err(ConfigError::Invalid("noise.seed may not be empty".into()));
            }
        }

        Ok(())
    }
}
