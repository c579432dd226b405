pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{cli::LocalStorage, toml_config::PosConfig};

pub use crate::adapters::{kv::KvStore, supabase::SupabaseStore};
pub use crate::core::{cart::Cart, checkout::PaymentRequest, service::PosService};
pub use crate::domain::money::Money;
pub use crate::utils::error::{PosError, Result};
