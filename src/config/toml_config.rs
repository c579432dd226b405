use crate::adapters::kv::KvStore;
use crate::adapters::supabase::SupabaseStore;
use crate::config::cli::LocalStorage;
use crate::core::stock::DEFAULT_LOW_STOCK_THRESHOLD;
use crate::core::ConfigProvider;
use crate::domain::money::DEFAULT_CURRENCY_SYMBOL;
use crate::utils::error::{PosError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "brewcave.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PosConfig {
    pub store: StoreConfig,
    pub inventory: InventoryConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub name: String,
    pub currency_symbol: String,
    pub order_prefix: String,
    /// VAT already included in menu prices, e.g. `0.12`.
    pub tax_rate: f64,
    pub receipt_footer: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "Brew Cave".to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            order_prefix: "ORD".to_string(),
            tax_rate: 0.12,
            receipt_footer: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub low_stock_threshold: f64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    Supabase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    #[serde(rename = "type")]
    pub kind: BackendKind,
    pub data_dir: String,
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Local,
            data_dir: "./data".to_string(),
            url: None,
            anon_key: None,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl PosConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Reads `path` when it exists, otherwise starts from the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::debug!("{} not found, using default configuration", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PosError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PosError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("store.order_prefix", &self.store.order_prefix)?;
        validate_non_empty_string("store.currency_symbol", &self.store.currency_symbol)?;
        validate_range("store.tax_rate", self.store.tax_rate, 0.0, 1.0)?;
        validate_range(
            "inventory.low_stock_threshold",
            self.inventory.low_stock_threshold,
            0.0,
            f64::MAX,
        )?;

        match self.backend.kind {
            BackendKind::Local => validate_path("backend.data_dir", &self.backend.data_dir)?,
            BackendKind::Supabase => {
                let url = validate_required_field("backend.url", &self.backend.url)?;
                validate_url("backend.url", url)?;
                let key = validate_required_field("backend.anon_key", &self.backend.anon_key)?;
                validate_non_empty_string("backend.anon_key", key)?;
                validate_range("backend.timeout_seconds", self.backend.timeout_seconds, 1, 300)?;
            }
        }

        Ok(())
    }

    pub fn local_store(&self) -> KvStore<LocalStorage> {
        KvStore::new(LocalStorage::new(&self.backend.data_dir))
    }

    pub fn supabase_store(&self) -> Result<SupabaseStore> {
        let url = validate_required_field("backend.url", &self.backend.url)?;
        let key = validate_required_field("backend.anon_key", &self.backend.anon_key)?;
        SupabaseStore::new(
            url,
            key,
            Duration::from_secs(self.backend.timeout_seconds),
            self.inventory.low_stock_threshold,
        )
    }
}

impl ConfigProvider for PosConfig {
    fn order_prefix(&self) -> &str {
        &self.store.order_prefix
    }

    fn low_stock_threshold(&self) -> f64 {
        self.inventory.low_stock_threshold
    }

    fn currency_symbol(&self) -> &str {
        &self.store.currency_symbol
    }

    fn tax_rate(&self) -> f64 {
        self.store.tax_rate
    }
}

impl Validate for PosConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
