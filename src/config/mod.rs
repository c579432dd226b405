pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "brewcave")]
#[command(about = "Point of sale and inventory for the Brew Cave coffee shop")]
pub struct CliConfig {
    #[arg(long, short, global = true, default_value = toml_config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Override backend.data_dir")]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Seed the default menu and roles when the store is empty
    Seed,

    /// List menu items
    Menu {
        #[arg(long, default_value = "all")]
        category: String,
        #[arg(long, default_value = "")]
        query: String,
    },

    /// List stock records
    Stock {
        #[arg(long, help = "In Stock, Low Stock or Out of Stock")]
        status: Option<String>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long, help = "Only records at or below the low-stock threshold")]
        low: bool,
    },

    /// Ring up an order and deduct stock
    Order {
        /// Menu item id, optionally followed by add-on ids: `c4+addon_1+addon_2`
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        #[arg(long)]
        tendered: String,
        #[arg(long, default_value = "cash")]
        method: String,
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        reference: Option<String>,
    },

    /// Search past orders
    History {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, help = "Print sales totals instead of rows")]
        summary: bool,
        #[arg(long, help = "Write matching orders to a CSV file")]
        csv: Option<PathBuf>,
    },

    /// Mark a pending order as completed
    Complete { id: String },

    /// Refund a pending or completed order
    Refund { id: String },

    /// List roles and the pages they can open
    Roles,

    /// Check whether a role may open a page
    Can { role: String, page: String },
}

/// Splits `c4+addon_1+addon_2` into the menu id and its add-on ids.
pub fn parse_item_arg(arg: &str) -> (&str, Vec<&str>) {
    let mut parts = arg.split('+').map(str::trim).filter(|p| !p.is_empty());
    let menu_id = parts.next().unwrap_or("");
    (menu_id, parts.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_arg() {
        assert_eq!(parse_item_arg("c4"), ("c4", vec![]));
        assert_eq!(
            parse_item_arg("c4+addon_2+ addon_1"),
            ("c4", vec!["addon_2", "addon_1"])
        );
        assert_eq!(parse_item_arg(""), ("", vec![]));
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_parses_order() {
        let cli = CliConfig::try_parse_from([
            "brewcave",
            "--data-dir",
            "/tmp/bc",
            "order",
            "--item",
            "c4+addon_1",
            "--item",
            "p1",
            "--tendered",
            "500",
            "--method",
            "gcash",
        ])
        .unwrap();

        assert_eq!(cli.data_dir.as_deref(), Some("/tmp/bc"));
        match cli.command {
            Command::Order { items, method, .. } => {
                assert_eq!(items, vec!["c4+addon_1", "p1"]);
                assert_eq!(method, "gcash");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
