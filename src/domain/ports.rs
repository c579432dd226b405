use crate::domain::model::{Addon, MenuItem, Order, OrderStatus, Recipes, Role, StockItem};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Blob storage addressed by relative path.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn order_prefix(&self) -> &str;
    fn low_stock_threshold(&self) -> f64;
    fn currency_symbol(&self) -> &str;
    fn tax_rate(&self) -> f64;
}

/// Persistence for everything the POS reads or writes.
///
/// Loaders return an empty collection when nothing has been stored yet.
#[async_trait]
pub trait PosStore: Send + Sync {
    async fn menu_items(&self) -> Result<Vec<MenuItem>>;
    async fn save_menu_items(&self, items: &[MenuItem]) -> Result<()>;

    async fn recipes(&self) -> Result<Recipes>;
    async fn save_recipes(&self, recipes: &Recipes) -> Result<()>;

    async fn addons(&self) -> Result<Vec<Addon>>;
    async fn save_addons(&self, addons: &[Addon]) -> Result<()>;

    async fn stocks(&self) -> Result<Vec<StockItem>>;
    async fn save_stocks(&self, stocks: &[StockItem]) -> Result<()>;

    /// Newest first.
    async fn orders(&self) -> Result<Vec<Order>>;
    async fn record_order(&self, order: &Order) -> Result<()>;
    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<()>;

    async fn roles(&self) -> Result<Vec<Role>>;
    async fn save_roles(&self, roles: &[Role]) -> Result<()>;
}
