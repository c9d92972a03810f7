use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use cutcost_core::currency::CurrencyCode;
use cutcost_core::units::LengthUnit;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "CUTCOST_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub estimate: EstimateConfig,
    #[serde(default)]
    pub measurement: MeasurementConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `CUTCOST_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontendMode {
    /// 一次性输出测量与报价结果。
    Report,
    /// 逐行读取命令的交互模式。
    Interactive,
}

impl Default for FrontendMode {
    fn default() -> Self {
        FrontendMode::Report
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontendConfig {
    #[serde(default)]
    pub default_mode: FrontendMode,
}

/// 报价相关的默认选择。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstimateConfig {
    #[serde(default)]
    pub default_unit: LengthUnit,
    /// 覆盖系统语言区域，例如 `"de-DE"`；缺省时读取运行环境。
    #[serde(default)]
    pub locale: Option<String>,
    /// 限定可选货币，例如 `["EUR", "GBP"]`；缺省时提供全部六种。
    #[serde(default)]
    pub currencies: Option<Vec<CurrencyCode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementConfig {
    /// SVG 曲线展平容差（像素）。
    #[serde(default = "MeasurementConfig::default_tolerance")]
    pub svg_flatten_tolerance: f32,
}

impl MeasurementConfig {
    fn default_tolerance() -> f32 {
        0.01
    }
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            svg_flatten_tolerance: Self::default_tolerance(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_returned_when_file_missing() {
        let cfg = AppConfig::discover().expect("discover should succeed");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.frontend.default_mode, FrontendMode::Report);
        assert_eq!(cfg.estimate.default_unit, LengthUnit::Centimeter);
        assert!(cfg.estimate.locale.is_none());
        assert!(cfg.estimate.currencies.is_none());
        assert!((cfg.measurement.svg_flatten_tolerance - 0.01).abs() < f32::EPSILON);
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [frontend]
            default_mode = "interactive"

            [estimate]
            default_unit = "in"
            locale = "de-DE"
            currencies = ["EUR", "GBP"]

            [measurement]
            svg_flatten_tolerance = 0.25
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.frontend.default_mode, FrontendMode::Interactive);
        assert_eq!(cfg.estimate.default_unit, LengthUnit::Inch);
        assert_eq!(cfg.estimate.locale.as_deref(), Some("de-DE"));
        assert_eq!(
            cfg.estimate.currencies,
            Some(vec![CurrencyCode::Eur, CurrencyCode::Gbp])
        );
        assert!((cfg.measurement.svg_flatten_tolerance - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[estimate]\ndefault_unit = \"mm\"").unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.estimate.default_unit, LengthUnit::Millimeter);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.frontend.default_mode, FrontendMode::Report);
    }

    #[test]
    fn unknown_unit_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[estimate]\ndefault_unit = \"yard\"").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_currency_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[estimate]\ncurrencies = [\"EUR\", \"CNY\"]").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_explicit_file_is_an_io_error() {
        let err = AppConfig::from_file("/nonexistent/cutcost.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
