use std::fmt;
use std::path::PathBuf;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Highest ray-march step count accepted from configuration.
pub const MAX_RAY_STEPS: u32 = 512;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root of `config.toml`. Every section is optional.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectConfig {
    pub version: u32,
    pub window: WindowSection,
    pub logo: LogoSection,
    pub rays: RaySection,
    pub motion: MotionSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(
        deserialize_with = "deserialize_antialias_opt",
        serialize_with = "serialize_antialias_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub antialias: Option<AntialiasSetting>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogoSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub target_width: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RaySection {
    pub weight: f64,
    pub decay: f64,
    pub step: f64,
    pub max_steps: u32,
    pub mouse_influence: f64,
    pub drift: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionSection {
    /// Fraction of the remaining distance covered per 60 Hz frame.
    pub smoothing: f64,
    /// Amount the movement target loses per 60 Hz frame.
    pub decay: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl AntialiasSetting {
    /// MSAA sample count, `None` for `Auto`.
    pub fn samples(self) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::Off => Some(1),
            Self::Samples2 => Some(2),
            Self::Samples4 => Some(4),
            Self::Samples8 => Some(8),
            Self::Samples16 => Some(16),
        }
    }
}

impl fmt::Display for AntialiasSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.samples() {
            None => f.write_str("auto"),
            Some(1) => f.write_str("off"),
            Some(samples) => write!(f, "{samples}"),
        }
    }
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            version: 1,
            window: WindowSection::default(),
            logo: LogoSection::default(),
            rays: RaySection::default(),
            motion: MotionSection::default(),
        }
    }
}

impl Default for LogoSection {
    fn default() -> Self {
        Self {
            path: None,
            target_width: 300.0,
        }
    }
}

impl Default for RaySection {
    fn default() -> Self {
        Self {
            weight: 0.15,
            decay: 0.95,
            step: 0.015,
            max_steps: 100,
            mouse_influence: 0.8,
            drift: 0.05,
        }
    }
}

impl Default for MotionSection {
    fn default() -> Self {
        Self {
            smoothing: 0.05,
            decay: 0.01,
        }
    }
}

fn deserialize_antialias_opt<'de, D>(deserializer: D) -> Result<Option<AntialiasSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    let result = match helper {
        None => None,
        Some(Helper::Str(raw)) => Some(parse_antialias(&raw).map_err(de::Error::custom)?),
        Some(Helper::Num(value)) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            Some(parse_antialias(&value.to_string()).map_err(de::Error::custom)?)
        }
    };
    Ok(result)
}

fn serialize_antialias_opt<S>(value: &Option<AntialiasSetting>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(setting) => serializer.serialize_str(&setting.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Parses `auto`, `off`, or an explicit MSAA sample count.
pub fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(AntialiasSetting::Off),
        "2" => Ok(AntialiasSetting::Samples2),
        "4" => Ok(AntialiasSetting::Samples4),
        "8" => Ok(AntialiasSetting::Samples8),
        "16" => Ok(AntialiasSetting::Samples16),
        other => Err(format!(
            "invalid antialias setting '{other}'; use auto/off or 2/4/8/16"
        )),
    }
}

/// Parses `WIDTHxHEIGHT` into a non-zero pixel size.
pub fn parse_size(spec: &str) -> Result<(u32, u32), ConfigError> {
    let (width, height) = spec
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| ConfigError::Invalid(format!("expected WxH size, got '{spec}'")))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("invalid width in size '{spec}'")))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("invalid height in size '{spec}'")))?;
    if width == 0 || height == 0 {
        return Err(ConfigError::Invalid(
            "window dimensions must be greater than zero".into(),
        ));
    }
    Ok((width, height))
}

impl EffectConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: EffectConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parsed window size, if one was configured.
    pub fn window_size(&self) -> Result<Option<(u32, u32)>, ConfigError> {
        self.window.size.as_deref().map(parse_size).transpose()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        self.window_size()?;
        if let Some(fps) = self.window.fps {
            if !fps.is_finite() || fps < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "window.fps must be zero (uncapped) or positive, got {fps}"
                )));
            }
        }

        require_positive("logo.target_width", self.logo.target_width)?;

        let rays = &self.rays;
        require_positive("rays.weight", rays.weight)?;
        require_positive("rays.step", rays.step)?;
        require_unit_interval("rays.decay", rays.decay)?;
        if rays.max_steps == 0 || rays.max_steps > MAX_RAY_STEPS {
            return Err(ConfigError::Invalid(format!(
                "rays.max_steps must be between 1 and {MAX_RAY_STEPS}, got {}",
                rays.max_steps
            )));
        }
        require_non_negative("rays.mouse_influence", rays.mouse_influence)?;
        require_non_negative("rays.drift", rays.drift)?;

        require_unit_interval("motion.smoothing", self.motion.smoothing)?;
        require_unit_interval("motion.decay", self.motion.decay)?;
        Ok(())
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be greater than zero, got {value}"
        )))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must not be negative, got {value}"
        )))
    }
}

fn require_unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be in (0, 1], got {value}"
        )))
    }
}
