use brewcave_pos::adapters::kv::{ORDERS_KEY, STOCKS_KEY};
use brewcave_pos::core::menu::{self, Catalog};
use brewcave_pos::core::{history, rbac, PosStore};
use brewcave_pos::domain::model::{
    Addon, OrderStatus, Page, PaymentMethod, StockItem, StockStatus,
};
use brewcave_pos::{Cart, Money, PaymentRequest, PosConfig, PosError, PosService};
use tempfile::TempDir;

fn stock(pid: &str, name: &str, qty: f64, unit: &str) -> StockItem {
    StockItem {
        product_id: pid.to_string(),
        item_name: name.to_string(),
        category: Some("Ingredients".to_string()),
        quantity: qty,
        unit: unit.to_string(),
        status: StockStatus::InStock,
        updated_at: None,
    }
}

fn config_for(dir: &TempDir) -> PosConfig {
    let mut config = PosConfig::default();
    config.backend.data_dir = dir.path().to_string_lossy().into_owned();
    config.store.order_prefix = "TBC".to_string();
    config
}

/// Seeds the menu, three stock records, a latte recipe and an extra-shot add-on.
async fn seed_shop<S: PosStore>(store: &S) -> anyhow::Result<()> {
    menu::ensure_seeded(store).await?;
    store
        .save_stocks(&[
            stock("1", "Whole Milk", 1000.0, "ml"),
            stock("2", "Espresso Beans", 100.0, "g"),
            stock("3", "Croissant", 11.0, "pcs"),
        ])
        .await?;

    let mut catalog = Catalog::load(store).await?;
    let stocks = store.stocks().await?;
    menu::set_ingredient(&mut catalog.recipes, &stocks, "c4", "1", 200.0, None)?;
    menu::set_ingredient(&mut catalog.recipes, &stocks, "c4", "2", 18.0, None)?;
    menu::set_ingredient(&mut catalog.recipes, &stocks, "p1", "3", 1.0, None)?;
    catalog.addons.push(Addon {
        id: "addon_shot".to_string(),
        name: "Extra Shot".to_string(),
        price: Money::from_pesos(30.0),
        applicable_items: vec!["c4".to_string()],
        stock_pid: Some("2".to_string()),
        stock_qty: 9.0,
        stock_unit: "g".to_string(),
    });
    for addon in &catalog.addons {
        menu::validate_addon(addon, &catalog.items)?;
    }
    catalog.save(store).await?;
    Ok(())
}

#[tokio::test]
async fn test_checkout_round_trip_on_disk() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = config_for(&dir);
    let service = PosService::new(config.local_store(), config);
    seed_shop(service.store()).await?;

    let menu_items = service.store().menu_items().await?;
    let addons = service.store().addons().await?;
    let latte = menu_items.iter().find(|i| i.id == "c4").unwrap();
    let croissant = menu_items.iter().find(|i| i.id == "p1").unwrap();

    let mut cart = Cart::new();
    cart.add(latte, &addons)?;
    cart.add(latte, &addons)?;
    cart.add(croissant, &[])?;
    assert_eq!(cart.total(), Money::from_pesos(455.0));

    let receipt = service
        .checkout(
            &mut cart,
            PaymentRequest {
                customer: Some("Ana".to_string()),
                tendered: Money::from_pesos(500.0),
                method: PaymentMethod::Cash,
                reference: None,
            },
        )
        .await?;

    assert!(cart.is_empty());
    assert!(receipt.order.id.starts_with("TBC-"));
    assert_eq!(receipt.order.change, Money::from_pesos(45.0));
    assert_eq!(receipt.order.items_summary, "2x Latte, 1x Croissant");
    assert_eq!(receipt.order.notes.as_deref(), Some("Customer: Ana"));
    assert!(receipt.deductions.unmatched.is_empty());
    assert_eq!(receipt.deductions.shortfalls().count(), 0);

    let stocks = service.store().stocks().await?;
    assert_eq!(stocks[0].quantity, 600.0);
    // 2 x 18g recipe + 2 x 9g extra shot
    assert_eq!(stocks[1].quantity, 46.0);
    assert_eq!(stocks[2].quantity, 10.0);
    assert_eq!(stocks[2].status, StockStatus::LowStock);

    assert!(dir.path().join(format!("{}.json", STOCKS_KEY)).exists());
    let raw = std::fs::read_to_string(dir.path().join(format!("{}.json", ORDERS_KEY)))?;
    let stored: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(stored[0]["id"], receipt.order.id.as_str());
    assert_eq!(stored[0]["total"], 455.0);
    assert_eq!(stored[0]["status"], "Pending");

    Ok(())
}

#[tokio::test]
async fn test_order_lifecycle_and_reporting() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = config_for(&dir);
    let service = PosService::new(config.local_store(), config);
    seed_shop(service.store()).await?;

    let menu_items = service.store().menu_items().await?;
    let cold_brew = menu_items.iter().find(|i| i.id == "c7").unwrap();

    let mut ids = Vec::new();
    for customer in ["Ana", "Ben"] {
        let mut cart = Cart::new();
        cart.add(cold_brew, &[])?;
        let receipt = service
            .checkout(
                &mut cart,
                PaymentRequest {
                    customer: Some(customer.to_string()),
                    tendered: Money::from_pesos(145.0),
                    method: PaymentMethod::GCash,
                    reference: Some("GC-0001".to_string()),
                },
            )
            .await?;
        ids.push(receipt.order.id);
    }
    assert_ne!(ids[0], ids[1]);

    let orders = service.store().orders().await?;
    assert_eq!(orders[0].id, ids[1], "newest order comes first");
    assert_eq!(history::search(&orders, "ben").len(), 1);

    service.complete_order(&ids[0]).await?;
    service.refund_order(&ids[1]).await?;
    assert!(matches!(
        service.complete_order(&ids[1]).await,
        Err(PosError::InvalidTransition { .. })
    ));

    let orders = service.store().orders().await?;
    let summary = history::summarize(&orders);
    assert_eq!(summary.order_count, 2);
    assert_eq!(summary.gross_sales, Money::from_pesos(145.0));
    assert_eq!(summary.refunded, Money::from_pesos(145.0));
    assert_eq!(summary.by_method["GCash"], 2);
    assert_eq!(
        orders.iter().find(|o| o.id == ids[0]).unwrap().status,
        OrderStatus::Completed
    );

    let csv_path = dir.path().join("history.csv");
    history::export_csv(&orders, std::fs::File::create(&csv_path)?)?;
    let csv_text = std::fs::read_to_string(&csv_path)?;
    assert_eq!(csv_text.lines().count(), 3);
    assert!(csv_text.contains("GC-0001"));

    Ok(())
}

#[tokio::test]
async fn test_removing_menu_item_cleans_recipes_and_addons() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = config_for(&dir);
    let store = config.local_store();
    seed_shop(&store).await?;

    let mut catalog = Catalog::load(&store).await?;
    catalog.remove_menu_item("c4")?;
    catalog.save(&store).await?;

    let reloaded = Catalog::load(&store).await?;
    assert_eq!(reloaded.items.len(), 18);
    assert!(!reloaded.recipes.contains_key("c4"));
    assert!(reloaded.recipes.contains_key("p1"));
    assert!(reloaded.addons[0].applicable_items.is_empty());
    assert_eq!(menu::next_custom_id(&reloaded.items), "custom1");
    Ok(())
}

#[test]
fn test_roles_seed_once_and_gate_pages() {
    let dir = TempDir::new().unwrap();
    let store = config_for(&dir).local_store();

    let roles = tokio_test::block_on(rbac::ensure_roles(&store)).unwrap();
    assert_eq!(roles.len(), 2);

    let mut stored = tokio_test::block_on(store.roles()).unwrap();
    stored[1].permissions.set(Page::Stocks, true);
    tokio_test::block_on(store.save_roles(&stored)).unwrap();

    let roles = tokio_test::block_on(rbac::ensure_roles(&store)).unwrap();
    let staff = rbac::resolve_role(&roles, Some("Staff")).unwrap();
    assert!(rbac::authorize(staff, Page::Stocks).is_ok());
    assert!(matches!(
        rbac::authorize(staff, Page::Settings),
        Err(PosError::AccessDenied { .. })
    ));
}
