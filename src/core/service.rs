use crate::core::cart::Cart;
use crate::core::checkout::{
    build_order, generate_order_id, validate_payment, PaymentRequest, Receipt,
};
use crate::core::history::check_transition;
use crate::core::stock::deduct_for_cart;
use crate::core::{ConfigProvider, PosStore};
use crate::domain::model::{Order, OrderStatus};
use crate::utils::error::{PosError, Result};
use chrono::Utc;

/// Runs the multi-step POS operations against a store.
pub struct PosService<S: PosStore, C: ConfigProvider> {
    store: S,
    config: C,
}

impl<S: PosStore, C: ConfigProvider> PosService<S, C> {
    pub fn new(store: S, config: C) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Deducts stock, records the order and clears `cart`.
    ///
    /// An empty cart or short payment fails before anything is written.
    pub async fn checkout(&self, cart: &mut Cart, payment: PaymentRequest) -> Result<Receipt> {
        let total = validate_payment(cart, &payment)?;
        tracing::info!(
            "Checking out {} item(s), total {}",
            cart.item_count(),
            total.display_with(self.config.currency_symbol())
        );

        let mut stocks = self.store.stocks().await?;
        let recipes = self.store.recipes().await?;
        let addons = self.store.addons().await?;

        let threshold = self.config.low_stock_threshold();
        let deductions = deduct_for_cart(&mut stocks, &recipes, &addons, cart, threshold);
        if deductions.changed() {
            self.store.save_stocks(&stocks).await?;
            tracing::debug!("Saved {} stock deduction(s)", deductions.deductions.len());
        }

        let now = Utc::now();
        let existing = self.store.orders().await?;
        let id = generate_order_id(
            self.config.order_prefix(),
            now,
            existing.iter().map(|o| o.id.as_str()),
        );
        let order = build_order(id, cart, &payment, total, now);
        self.store.record_order(&order).await?;

        tracing::info!(
            "Order {} recorded ({}, {})",
            order.id,
            order.payment_method,
            order.total.display_with(self.config.currency_symbol())
        );

        let vat = cart.vat_component(self.config.tax_rate());
        cart.clear();
        Ok(Receipt {
            order,
            deductions,
            vat,
        })
    }

    pub async fn complete_order(&self, order_id: &str) -> Result<Order> {
        self.transition(order_id, OrderStatus::Completed).await
    }

    pub async fn refund_order(&self, order_id: &str) -> Result<Order> {
        self.transition(order_id, OrderStatus::Refunded).await
    }

    async fn transition(&self, order_id: &str, to: OrderStatus) -> Result<Order> {
        let mut order = self
            .store
            .orders()
            .await?
            .into_iter()
            .find(|o| o.id == order_id)
            .ok_or_else(|| PosError::NotFound {
                entity: "Order",
                id: order_id.to_string(),
            })?;

        check_transition(order_id, order.status, to)?;
        self.store.update_order_status(order_id, to).await?;
        tracing::info!("Order {} moved from {} to {}", order_id, order.status, to);

        order.status = to;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        Addon, MenuItem, PaymentMethod, RecipeIngredient, Recipes, Role, StockItem, StockStatus,
    };
    use crate::domain::money::Money;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        recipes: Mutex<Recipes>,
        stocks: Mutex<Vec<StockItem>>,
        orders: Mutex<Vec<Order>>,
        stock_saves: Mutex<usize>,
    }

    #[async_trait]
    impl PosStore for MemoryStore {
        async fn menu_items(&self) -> Result<Vec<MenuItem>> {
            Ok(vec![])
        }
        async fn save_menu_items(&self, _items: &[MenuItem]) -> Result<()> {
            Ok(())
        }
        async fn recipes(&self) -> Result<Recipes> {
            Ok(self.recipes.lock().unwrap().clone())
        }
        async fn save_recipes(&self, recipes: &Recipes) -> Result<()> {
            *self.recipes.lock().unwrap() = recipes.clone();
            Ok(())
        }
        async fn addons(&self) -> Result<Vec<Addon>> {
            Ok(vec![])
        }
        async fn save_addons(&self, _addons: &[Addon]) -> Result<()> {
            Ok(())
        }
        async fn stocks(&self) -> Result<Vec<StockItem>> {
            Ok(self.stocks.lock().unwrap().clone())
        }
        async fn save_stocks(&self, stocks: &[StockItem]) -> Result<()> {
            *self.stock_saves.lock().unwrap() += 1;
            *self.stocks.lock().unwrap() = stocks.to_vec();
            Ok(())
        }
        async fn orders(&self) -> Result<Vec<Order>> {
            Ok(self.orders.lock().unwrap().clone())
        }
        async fn record_order(&self, order: &Order) -> Result<()> {
            self.orders.lock().unwrap().insert(0, order.clone());
            Ok(())
        }
        async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<()> {
            let mut orders = self.orders.lock().unwrap();
            let order = orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or_else(|| PosError::NotFound {
                    entity: "Order",
                    id: order_id.to_string(),
                })?;
            order.status = status;
            Ok(())
        }
        async fn roles(&self) -> Result<Vec<Role>> {
            Ok(vec![])
        }
        async fn save_roles(&self, _roles: &[Role]) -> Result<()> {
            Ok(())
        }
    }

    struct TestConfig;

    impl ConfigProvider for TestConfig {
        fn order_prefix(&self) -> &str {
            "ORD"
        }
        fn low_stock_threshold(&self) -> f64 {
            10.0
        }
        fn currency_symbol(&self) -> &str {
            "₱"
        }
        fn tax_rate(&self) -> f64 {
            0.12
        }
    }

    fn latte() -> MenuItem {
        MenuItem {
            id: "c4".to_string(),
            name: "Latte".to_string(),
            price: Money::from_pesos(150.0),
            category: "coffee".to_string(),
            image: None,
        }
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::default();
        store.stocks.lock().unwrap().push(StockItem {
            product_id: "S-1".to_string(),
            item_name: "Whole Milk".to_string(),
            category: None,
            quantity: 500.0,
            unit: "ml".to_string(),
            status: StockStatus::InStock,
            updated_at: None,
        });
        store.recipes.lock().unwrap().insert(
            "c4".to_string(),
            vec![RecipeIngredient {
                id: "ing_1".to_string(),
                stock_pid: None,
                name: "milk".to_string(),
                quantity: 200.0,
                unit: "ml".to_string(),
            }],
        );
        store
    }

    #[tokio::test]
    async fn test_checkout_deducts_and_records() {
        let service = PosService::new(seeded_store(), TestConfig);
        let mut cart = Cart::new();
        cart.add(&latte(), &[]).unwrap();
        cart.add(&latte(), &[]).unwrap();

        let receipt = service
            .checkout(&mut cart, PaymentRequest::cash(Money::from_pesos(500.0)))
            .await
            .unwrap();

        assert!(cart.is_empty());
        assert!(receipt.order.id.starts_with("ORD-"));
        assert_eq!(receipt.order.total, Money::from_pesos(300.0));
        assert_eq!(receipt.order.change, Money::from_pesos(200.0));
        assert_eq!(receipt.order.payment_method, PaymentMethod::Cash);
        assert_eq!(receipt.vat, Money::from_centavos(3214));

        let stocks = service.store().stocks().await.unwrap();
        assert_eq!(stocks[0].quantity, 100.0);
        assert_eq!(service.store().orders().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_checkout_writes_nothing() {
        let service = PosService::new(seeded_store(), TestConfig);
        let mut cart = Cart::new();
        cart.add(&latte(), &[]).unwrap();

        let err = service
            .checkout(&mut cart, PaymentRequest::cash(Money::from_pesos(100.0)))
            .await
            .unwrap_err();

        assert!(matches!(err, PosError::InsufficientPayment { .. }));
        assert_eq!(cart.item_count(), 1);
        assert_eq!(*service.store().stock_saves.lock().unwrap(), 0);
        assert!(service.store().orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_writes_nothing() {
        let service = PosService::new(seeded_store(), TestConfig);
        let mut cart = Cart::new();

        let err = service
            .checkout(&mut cart, PaymentRequest::cash(Money::from_pesos(500.0)))
            .await
            .unwrap_err();

        assert!(matches!(err, PosError::EmptyCart));
        assert_eq!(*service.store().stock_saves.lock().unwrap(), 0);
        assert_eq!(service.store().stocks().await.unwrap()[0].quantity, 500.0);
        assert!(service.store().orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_complete_then_refund() {
        let service = PosService::new(seeded_store(), TestConfig);
        let mut cart = Cart::new();
        cart.add(&latte(), &[]).unwrap();
        let receipt = service
            .checkout(&mut cart, PaymentRequest::cash(Money::from_pesos(150.0)))
            .await
            .unwrap();
        let id = receipt.order.id;

        let completed = service.complete_order(&id).await.unwrap();
        assert_eq!(completed.status, OrderStatus::Completed);
        assert!(matches!(
            service.complete_order(&id).await,
            Err(PosError::InvalidTransition { .. })
        ));

        service.refund_order(&id).await.unwrap();
        assert_eq!(
            service.store().orders().await.unwrap()[0].status,
            OrderStatus::Refunded
        );
        assert!(matches!(
            service.refund_order("ORD-MISSING").await,
            Err(PosError::NotFound { .. })
        ));
    }
}
