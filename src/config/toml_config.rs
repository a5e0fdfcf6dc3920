use crate::domain::model::{ExplainerSettings, DEFAULT_PERIOD_DAYS};
use crate::domain::ports::SettingsProvider;
use crate::utils::error::{AgentError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    pub explainer: ExplainerConfig,
    pub fetcher: FetcherConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub default_period_days: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            default_period_days: DEFAULT_PERIOD_DAYS.get(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainerConfig {
    pub lead_time_days: u32,
    pub safety_stock_ratio: f64,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        let defaults = ExplainerSettings::default();
        Self {
            lead_time_days: defaults.lead_time_days,
            safety_stock_ratio: defaults.safety_stock_ratio,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub timeout_ms: u64,
    pub retry_attempts: u32,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            retry_attempts: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: bool,
}

fn env_var_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("Invalid regex"))
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AgentError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| AgentError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 有指定路徑就讀檔，否則使用預設值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// 替換環境變數 (例如 ${SHOP_ASK_BIND})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_regex()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_range(
            "classifier.default_period_days",
            self.classifier.default_period_days,
            1,
            3650,
        )?;
        validation::validate_range(
            "explainer.lead_time_days",
            self.explainer.lead_time_days,
            1,
            365,
        )?;
        validation::validate_range(
            "explainer.safety_stock_ratio",
            self.explainer.safety_stock_ratio,
            0.0,
            5.0,
        )?;
        validation::validate_positive_number("fetcher.timeout_ms", self.fetcher.timeout_ms, 1)?;
        validation::validate_range("fetcher.retry_attempts", self.fetcher.retry_attempts, 0, 10)?;
        validation::validate_socket_addr("server.bind_address", &self.server.bind_address)?;
        if let Some(level) = &self.logging.level {
            validation::validate_log_level("logging.level", level)?;
        }
        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

impl SettingsProvider for AppConfig {
    fn default_period_days(&self) -> NonZeroU32 {
        NonZeroU32::new(self.classifier.default_period_days).unwrap_or(DEFAULT_PERIOD_DAYS)
    }

    fn explainer_settings(&self) -> ExplainerSettings {
        ExplainerSettings {
            lead_time_days: self.explainer.lead_time_days,
            safety_stock_ratio: self.explainer.safety_stock_ratio,
        }
    }

    fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetcher.timeout_ms)
    }

    fn retry_attempts(&self) -> u32 {
        self.fetcher.retry_attempts
    }
}
