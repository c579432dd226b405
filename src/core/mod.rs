pub mod cart;
pub mod checkout;
pub mod history;
pub mod menu;
pub mod rbac;
pub mod service;
pub mod stock;

pub use crate::domain::model::{
    Addon, MenuItem, Order, OrderStatus, PaymentMethod, Recipes, Role, StockItem, StockStatus,
};
pub use crate::domain::ports::{ConfigProvider, PosStore, Storage};
pub use crate::utils::error::Result;
