use brewcave_pos::config::toml_config::{BackendKind, LogFormat};
use brewcave_pos::config::{parse_item_arg, Command};
use brewcave_pos::core::checkout::Receipt;
use brewcave_pos::core::stock::{low_stock, refresh_statuses, StockFilter};
use brewcave_pos::core::{history, menu, rbac, PosStore};
use brewcave_pos::domain::model::{Page, PaymentMethod, StockStatus};
use brewcave_pos::utils::error::ErrorSeverity;
use brewcave_pos::utils::{logger, validation::Validate};
use brewcave_pos::{Cart, CliConfig, Money, PaymentRequest, PosConfig, PosError, PosService, Result};
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let config = PosConfig::load_or_default(&cli.config);
    let log_format = config
        .as_ref()
        .map(|c| c.logging.format)
        .unwrap_or_default();
    match log_format {
        LogFormat::Json => logger::init_json_logger(cli.verbose),
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
    }

    let mut config = match config {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };
    if let Some(dir) = &cli.data_dir {
        config.backend.data_dir = dir.clone();
    }
    if cli.verbose {
        tracing::debug!("Config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        exit_with(e);
    }

    let result = match config.backend.kind {
        BackendKind::Local => {
            tracing::debug!("Using local data directory {}", config.backend.data_dir);
            let store = config.local_store();
            run(PosService::new(store, config), cli.command).await
        }
        BackendKind::Supabase => match config.supabase_store() {
            Ok(store) => run(PosService::new(store, config), cli.command).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        exit_with(e);
    }
}

fn exit_with(e: PosError) -> ! {
    tracing::error!(
        "{} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

async fn run<S: PosStore>(service: PosService<S, PosConfig>, command: Command) -> Result<()> {
    let store = service.store();
    let config = service.config();
    let symbol = config.store.currency_symbol.as_str();

    match command {
        Command::Seed => {
            let items = menu::ensure_seeded(store).await?;
            let roles = rbac::ensure_roles(store).await?;
            println!("Menu has {} item(s), {} role(s) defined", items.len(), roles.len());
        }

        Command::Menu { category, query } => {
            let items = store.menu_items().await?;
            if items.is_empty() {
                println!("Menu is empty. Run `brewcave seed` first.");
            }
            for item in menu::filter_menu(&items, &category, &query) {
                println!(
                    "{:<10} {:<24} {:>10}  {}",
                    item.id,
                    item.name,
                    item.price.display_with(symbol),
                    item.category
                );
            }
        }

        Command::Stock { status, query, low } => {
            let threshold = config.inventory.low_stock_threshold;
            let mut stocks = store.stocks().await?;
            refresh_statuses(&mut stocks, threshold);
            let filter = StockFilter {
                status: status.as_deref().map(str::parse::<StockStatus>).transpose()?,
                query,
                low_threshold: threshold,
            };
            if low {
                for stock in low_stock(&stocks, threshold) {
                    println!(
                        "{:<24} {:>8} {:<6} {}",
                        stock.item_name, stock.quantity, stock.unit, stock.status
                    );
                }
            } else {
                for (id, stock) in filter.apply(&stocks) {
                    println!(
                        "{:<10} {:<24} {:>8} {:<6} {}",
                        id, stock.item_name, stock.quantity, stock.unit, stock.status
                    );
                }
            }
        }

        Command::Order {
            items,
            tendered,
            method,
            customer,
            reference,
        } => {
            let menu_items = store.menu_items().await?;
            let addons = store.addons().await?;

            let mut cart = Cart::new();
            for arg in &items {
                let (menu_id, addon_ids) = parse_item_arg(arg);
                let item = menu_items
                    .iter()
                    .find(|i| i.id == menu_id)
                    .ok_or_else(|| PosError::NotFound {
                        entity: "Menu item",
                        id: menu_id.to_string(),
                    })?;
                let chosen = addon_ids
                    .iter()
                    .map(|id| {
                        addons
                            .iter()
                            .find(|a| a.id == *id)
                            .cloned()
                            .ok_or_else(|| PosError::NotFound {
                                entity: "Add-on",
                                id: id.to_string(),
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                cart.add(item, &chosen)?;
            }

            let payment = PaymentRequest {
                customer,
                tendered: Money::parse(&tendered)?,
                method: method.parse::<PaymentMethod>()?,
                reference,
            };
            let receipt = service.checkout(&mut cart, payment).await?;
            print_receipt(&receipt, config);
        }

        Command::History {
            query,
            summary,
            csv,
        } => {
            let orders = store.orders().await?;
            let matching: Vec<_> = history::search(&orders, &query).into_iter().cloned().collect();

            if let Some(path) = csv {
                let file = std::fs::File::create(&path)?;
                history::export_csv(&matching, file)?;
                println!("Exported {} order(s) to {}", matching.len(), path.display());
            } else if summary {
                let totals = history::summarize(&matching);
                println!("Orders:   {} ({} pending)", totals.order_count, totals.pending);
                println!("Gross:    {}", totals.gross_sales.display_with(symbol));
                println!("Refunded: {}", totals.refunded.display_with(symbol));
                for (method, count) in &totals.by_method {
                    println!("  {:<6} {}", method, count);
                }
            } else {
                for order in &matching {
                    println!(
                        "{:<12} {:<22} {:<16} {:>10} {:<6} {:<9} {}",
                        order.id,
                        history::format_timestamp(order),
                        order.customer,
                        order.total.display_with(symbol),
                        order.payment_method,
                        order.status,
                        order.items_summary
                    );
                }
            }
        }

        Command::Complete { id } => {
            let order = service.complete_order(&id).await?;
            println!("Order {} is now {}", order.id, order.status);
        }

        Command::Refund { id } => {
            let order = service.refund_order(&id).await?;
            println!(
                "Order {} refunded ({})",
                order.id,
                order.total.display_with(symbol)
            );
        }

        Command::Roles => {
            for role in rbac::ensure_roles(store).await? {
                println!(
                    "{:<3} {:<12} {}",
                    role.role_id,
                    role.role_name,
                    role.permissions.accessible_pages().join(", ")
                );
            }
        }

        Command::Can { role, page } => {
            let roles = rbac::ensure_roles(store).await?;
            let page: Page = page.parse()?;
            let resolved = rbac::resolve_role(&roles, Some(role.as_str())).ok_or_else(|| {
                PosError::NotFound {
                    entity: "Role",
                    id: role.clone(),
                }
            })?;
            rbac::authorize(resolved, page)?;
            println!("{} may open {}", resolved.role_name, page);
        }
    }

    Ok(())
}

fn print_receipt(receipt: &Receipt, config: &PosConfig) {
    let symbol = config.store.currency_symbol.as_str();
    let order = &receipt.order;

    println!("{}", config.store.name);
    println!("Order {}  {}", order.id, history::format_timestamp(order));
    println!("Customer: {}", order.customer);
    for line in &order.lines {
        println!(
            "  {}x {:<24} {:>10}",
            line.qty,
            line.name,
            line.line_total().display_with(symbol)
        );
        for addon in &line.addons {
            println!("     + {}", addon);
        }
    }
    println!("Total:    {}", order.total.display_with(symbol));
    if receipt.vat > Money::ZERO {
        println!("  VAT incl. {}", receipt.vat.display_with(symbol));
    }
    println!(
        "Paid:     {} ({})",
        order.amount_tendered.display_with(symbol),
        order.payment_method
    );
    if order.payment_method == PaymentMethod::Cash {
        println!("Change:   {}", order.change.display_with(symbol));
    } else {
        println!("Ref:      {}", order.reference);
    }

    for short in receipt.deductions.shortfalls() {
        println!(
            "⚠️  {} ran short ({} needed, {} on hand)",
            short.stock_name, short.requested, short.available
        );
    }
    for missing in &receipt.deductions.unmatched {
        println!("⚠️  No stock record for '{}'", missing.ingredient);
    }
    if let Some(footer) = &config.store.receipt_footer {
        println!("{}", footer);
    }
}
