use crate::domain::money::Money;
use crate::utils::error::PosError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// One line of a menu item's recipe, pointing at a stock record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_pid: Option<String>,
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
}

/// Recipes keyed by menu item id.
pub type Recipes = BTreeMap<String, Vec<RecipeIngredient>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
    pub id: String,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub applicable_items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_pid: Option<String>,
    #[serde(default)]
    pub stock_qty: f64,
    #[serde(default)]
    pub stock_unit: String,
}

impl Addon {
    pub fn applies_to(&self, menu_item_id: &str) -> bool {
        self.applicable_items.iter().any(|id| id == menu_item_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[default]
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockStatus {
    pub fn from_quantity(quantity: f64, low_threshold: f64) -> Self {
        if quantity <= 0.0 {
            StockStatus::OutOfStock
        } else if quantity <= low_threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StockStatus {
    type Err = PosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "in stock" => Ok(StockStatus::InStock),
            "low stock" | "low" => Ok(StockStatus::LowStock),
            "out of stock" | "out" => Ok(StockStatus::OutOfStock),
            other => Err(PosError::validation(format!("unknown stock status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    pub product_id: String,
    pub item_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub status: StockStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_unit() -> String {
    "pcs".to_string()
}

impl StockItem {
    pub fn refresh_status(&mut self, low_threshold: f64) {
        self.status = StockStatus::from_quantity(self.quantity, low_threshold);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(alias = "cash")]
    Cash,
    #[serde(rename = "GCash", alias = "gcash", alias = "Gcash")]
    GCash,
    #[serde(alias = "card")]
    Card,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::GCash => "GCash",
            PaymentMethod::Card => "Card",
        })
    }
}

impl FromStr for PaymentMethod {
    type Err = PosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "gcash" => Ok(PaymentMethod::GCash),
            "card" => Ok(PaymentMethod::Card),
            other => Err(PosError::validation(format!(
                "unknown payment method '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "refunded")]
    Refunded,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Completed => "Completed",
            OrderStatus::Refunded => "Refunded",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: String,
    pub name: String,
    pub qty: u32,
    pub unit_price: Money,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addons: Vec<String>,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.qty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
    pub items_summary: String,
    pub payment_method: PaymentMethod,
    pub amount_tendered: Money,
    pub change: Money,
    pub reference: String,
    pub total: Money,
    #[serde(default)]
    pub status: OrderStatus,
    pub customer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Pages a role can be granted, in sidebar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Profile,
    Home,
    Dashboard,
    TakeOrders,
    ViewOrders,
    Stocks,
    MenuCustomization,
    OrderHistory,
    UserManagement,
    AuditLog,
    SessionManagement,
    Settings,
}

impl Page {
    pub const ALL: [Page; 12] = [
        Page::Profile,
        Page::Home,
        Page::Dashboard,
        Page::TakeOrders,
        Page::ViewOrders,
        Page::Stocks,
        Page::MenuCustomization,
        Page::OrderHistory,
        Page::UserManagement,
        Page::AuditLog,
        Page::SessionManagement,
        Page::Settings,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Page::Profile => "can_profile",
            Page::Home => "can_home",
            Page::Dashboard => "can_dashboard",
            Page::TakeOrders => "can_take_orders",
            Page::ViewOrders => "can_view_orders",
            Page::Stocks => "can_stocks",
            Page::MenuCustomization => "can_menu_customization",
            Page::OrderHistory => "can_order_history",
            Page::UserManagement => "can_user_management",
            Page::AuditLog => "can_auditlog",
            Page::SessionManagement => "can_session_management",
            Page::Settings => "can_settings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Page::Profile => "Profile",
            Page::Home => "Home",
            Page::Dashboard => "Dashboard",
            Page::TakeOrders => "Take Order",
            Page::ViewOrders => "View Orders",
            Page::Stocks => "Stocks",
            Page::MenuCustomization => "Menu Customization",
            Page::OrderHistory => "Order History",
            Page::UserManagement => "User Management",
            Page::AuditLog => "Audit Log",
            Page::SessionManagement => "Session Management",
            Page::Settings => "Settings",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Page {
    type Err = PosError;

    /// Accepts the label, the column name, or a kebab/snake-case slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s
            .trim()
            .to_lowercase()
            .trim_start_matches("can_")
            .replace(['-', ' '], "_");
        Page::ALL
            .into_iter()
            .find(|page| {
                page.column().trim_start_matches("can_") == wanted
                    || page.label().to_lowercase().replace(' ', "_") == wanted
            })
            .ok_or_else(|| PosError::validation(format!("unknown page '{}'", s)))
    }
}

/// Per-page flags, stored flat as `can_*` columns on the role record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub can_profile: bool,
    pub can_home: bool,
    pub can_dashboard: bool,
    pub can_take_orders: bool,
    pub can_view_orders: bool,
    pub can_stocks: bool,
    pub can_menu_customization: bool,
    pub can_order_history: bool,
    pub can_user_management: bool,
    pub can_auditlog: bool,
    pub can_session_management: bool,
    pub can_settings: bool,
}

impl Permissions {
    fn flag_mut(&mut self, page: Page) -> &mut bool {
        match page {
            Page::Profile => &mut self.can_profile,
            Page::Home => &mut self.can_home,
            Page::Dashboard => &mut self.can_dashboard,
            Page::TakeOrders => &mut self.can_take_orders,
            Page::ViewOrders => &mut self.can_view_orders,
            Page::Stocks => &mut self.can_stocks,
            Page::MenuCustomization => &mut self.can_menu_customization,
            Page::OrderHistory => &mut self.can_order_history,
            Page::UserManagement => &mut self.can_user_management,
            Page::AuditLog => &mut self.can_auditlog,
            Page::SessionManagement => &mut self.can_session_management,
            Page::Settings => &mut self.can_settings,
        }
    }

    pub fn allows(&self, page: Page) -> bool {
        match page {
            Page::Profile => self.can_profile,
            Page::Home => self.can_home,
            Page::Dashboard => self.can_dashboard,
            Page::TakeOrders => self.can_take_orders,
            Page::ViewOrders => self.can_view_orders,
            Page::Stocks => self.can_stocks,
            Page::MenuCustomization => self.can_menu_customization,
            Page::OrderHistory => self.can_order_history,
            Page::UserManagement => self.can_user_management,
            Page::AuditLog => self.can_auditlog,
            Page::SessionManagement => self.can_session_management,
            Page::Settings => self.can_settings,
        }
    }

    pub fn set(&mut self, page: Page, allowed: bool) {
        *self.flag_mut(page) = allowed;
    }

    pub fn with(mut self, pages: &[Page]) -> Self {
        for page in pages {
            self.set(*page, true);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub role_id: u32,
    pub role_name: String,
    #[serde(flatten)]
    pub permissions: Permissions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
