use crate::core::{PosStore, Storage};
use crate::domain::model::{Addon, MenuItem, Order, OrderStatus, Recipes, Role, StockItem};
use crate::utils::error::{PosError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

pub const MENU_KEY: &str = "brewcave_menu_items";
pub const RECIPES_KEY: &str = "brewcave_menu_ingredients";
pub const ADDONS_KEY: &str = "brewcave_addons";
pub const STOCKS_KEY: &str = "brewcave_stocks";
pub const ORDERS_KEY: &str = "brewcave_orders";
pub const ROLES_KEY: &str = "brewcave_roles";

/// A [`PosStore`] that keeps each collection as one JSON document.
pub struct KvStore<S: Storage> {
    storage: S,
    // serializes read-modify-write cycles on the orders document
    orders_lock: Mutex<()>,
}

impl<S: Storage> KvStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            orders_lock: Mutex::new(()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn path_for(key: &str) -> String {
        format!("{}.json", key)
    }

    async fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let path = Self::path_for(key);
        if !self.storage.exists(&path).await? {
            tracing::debug!("{} not found, starting empty", path);
            return Ok(T::default());
        }

        let bytes = self.storage.read_file(&path).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        // a cleared key holds `null`
        let value: Option<T> = serde_json::from_slice(&bytes)?;
        Ok(value.unwrap_or_default())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)?;
        tracing::debug!("Writing {} ({} bytes)", key, data.len());
        self.storage.write_file(&Self::path_for(key), &data).await
    }
}

#[async_trait]
impl<S: Storage> PosStore for KvStore<S> {
    async fn menu_items(&self) -> Result<Vec<MenuItem>> {
        self.read_json(MENU_KEY).await
    }

    async fn save_menu_items(&self, items: &[MenuItem]) -> Result<()> {
        self.write_json(MENU_KEY, items).await
    }

    async fn recipes(&self) -> Result<Recipes> {
        self.read_json(RECIPES_KEY).await
    }

    async fn save_recipes(&self, recipes: &Recipes) -> Result<()> {
        self.write_json(RECIPES_KEY, recipes).await
    }

    async fn addons(&self) -> Result<Vec<Addon>> {
        self.read_json(ADDONS_KEY).await
    }

    async fn save_addons(&self, addons: &[Addon]) -> Result<()> {
        self.write_json(ADDONS_KEY, addons).await
    }

    async fn stocks(&self) -> Result<Vec<StockItem>> {
        self.read_json(STOCKS_KEY).await
    }

    async fn save_stocks(&self, stocks: &[StockItem]) -> Result<()> {
        self.write_json(STOCKS_KEY, stocks).await
    }

    async fn orders(&self) -> Result<Vec<Order>> {
        self.read_json(ORDERS_KEY).await
    }

    async fn record_order(&self, order: &Order) -> Result<()> {
        let _guard = self.orders_lock.lock().await;
        let mut orders: Vec<Order> = self.read_json(ORDERS_KEY).await?;
        orders.insert(0, order.clone());
        self.write_json(ORDERS_KEY, &orders).await
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<()> {
        let _guard = self.orders_lock.lock().await;
        let mut orders: Vec<Order> = self.read_json(ORDERS_KEY).await?;
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| PosError::NotFound {
                entity: "Order",
                id: order_id.to_string(),
            })?;
        order.status = status;
        self.write_json(ORDERS_KEY, &orders).await
    }

    async fn roles(&self) -> Result<Vec<Role>> {
        self.read_json(ROLES_KEY).await
    }

    async fn save_roles(&self, roles: &[Role]) -> Result<()> {
        self.write_json(ROLES_KEY, roles).await
    }
}
