//! PostgREST-backed [`PosStore`] for stores that keep their data in Supabase.
//!
//! Every collection maps to one table. Full-collection saves upsert the
//! given rows and then prune rows whose key is no longer present, so the
//! remote table ends up matching the slice that was passed in. Stock saves
//! only upsert: deduction never removes records.

use crate::core::PosStore;
use crate::domain::model::{
    Addon, MenuItem, Order, OrderLine, OrderStatus, PaymentMethod, Recipes, RecipeIngredient,
    Role, StockItem, StockStatus,
};
use crate::domain::money::Money;
use crate::utils::error::{PosError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use url::Url;

const MENU_TABLE: &str = "menu_items";
const INGREDIENT_TABLE: &str = "menu_ingredients";
const ADDON_TABLE: &str = "addons";
const STOCK_TABLE: &str = "stocks";
const ORDER_TABLE: &str = "orders";
const ROLE_TABLE: &str = "roles";

pub struct SupabaseStore {
    client: Client,
    base_url: String,
    anon_key: String,
    low_stock_threshold: f64,
}

impl SupabaseStore {
    pub fn new(
        base_url: &str,
        anon_key: &str,
        timeout: Duration,
        low_stock_threshold: f64,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            low_stock_threshold,
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        Url::parse(&format!("{}/rest/v1/{}", self.base_url, table)).map_err(|e| {
            PosError::InvalidConfigValueError {
                field: "backend.url".to_string(),
                value: self.base_url.clone(),
                reason: e.to_string(),
            }
        })
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Content-Type", "application/json")
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Supabase request failed with {}: {}", status, body);
        Err(PosError::BackendError {
            status: status.as_u16(),
            body,
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        order: Option<&str>,
    ) -> Result<Vec<T>> {
        let url = self.table_url(table)?;
        let mut query = vec![("select", "*")];
        if let Some(order) = order {
            query.push(("order", order));
        }

        tracing::debug!("GET {} {:?}", url, query);
        let response = self
            .request(reqwest::Method::GET, url)
            .query(&query)
            .send()
            .await?;
        let rows = Self::check(response).await?.json::<Vec<T>>().await?;
        Ok(rows)
    }

    async fn upsert<T: Serialize + Sync>(&self, table: &str, key: &str, rows: &[T]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let url = self.table_url(table)?;
        tracing::debug!("UPSERT {} rows into {}", rows.len(), table);
        let response = self
            .request(reqwest::Method::POST, url)
            .query(&[("on_conflict", key)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Deletes rows whose `key` is not among `keep`.
    async fn prune(&self, table: &str, key: &str, keep: &[String]) -> Result<()> {
        let url = self.table_url(table)?;
        let filter = if keep.is_empty() {
            "not.is.null".to_string()
        } else {
            let quoted: Vec<String> = keep
                .iter()
                .map(|k| format!("\"{}\"", k.replace('"', "\\\"")))
                .collect();
            format!("not.in.({})", quoted.join(","))
        };

        let response = self
            .request(reqwest::Method::DELETE, url)
            .query(&[(key, filter.as_str())])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn replace<T: Serialize + Sync>(
        &self,
        table: &str,
        key: &str,
        rows: &[T],
        keys: Vec<String>,
    ) -> Result<()> {
        self.upsert(table, key, rows).await?;
        self.prune(table, key, &keys).await
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct IngredientRow {
    id: String,
    menu_item_id: String,
    #[serde(default)]
    stock_pid: Option<String>,
    name: String,
    quantity: f64,
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AddonRow {
    id: String,
    name: String,
    price: Money,
    #[serde(default)]
    applicable_items: Option<Vec<String>>,
    #[serde(default)]
    stock_pid: Option<String>,
    #[serde(default)]
    stock_qty: Option<f64>,
    #[serde(default)]
    stock_unit: Option<String>,
}

impl From<AddonRow> for Addon {
    fn from(row: AddonRow) -> Self {
        Addon {
            id: row.id,
            name: row.name,
            price: row.price,
            applicable_items: row.applicable_items.unwrap_or_default(),
            stock_pid: row.stock_pid.filter(|pid| !pid.is_empty()),
            stock_qty: row.stock_qty.unwrap_or(0.0),
            stock_unit: row.stock_unit.unwrap_or_default(),
        }
    }
}

impl From<&Addon> for AddonRow {
    fn from(addon: &Addon) -> Self {
        AddonRow {
            id: addon.id.clone(),
            name: addon.name.clone(),
            price: addon.price,
            applicable_items: Some(addon.applicable_items.clone()),
            stock_pid: addon.stock_pid.clone(),
            stock_qty: Some(addon.stock_qty),
            stock_unit: Some(addon.stock_unit.clone()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StockRow {
    #[serde(deserialize_with = "string_or_number")]
    stock_pk: String,
    stock_name: String,
    #[serde(default)]
    category: Option<String>,
    quantity: f64,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl StockRow {
    fn into_item(self, low_threshold: f64) -> StockItem {
        StockItem {
            product_id: self.stock_pk,
            item_name: self.stock_name,
            category: self.category,
            status: StockStatus::from_quantity(self.quantity, low_threshold),
            quantity: self.quantity,
            unit: self.unit.unwrap_or_else(|| "pcs".to_string()),
            updated_at: self.updated_at,
        }
    }
}

impl From<&StockItem> for StockRow {
    fn from(item: &StockItem) -> Self {
        StockRow {
            stock_pk: item.product_id.clone(),
            stock_name: item.item_name.clone(),
            category: item.category.clone(),
            quantity: item.quantity,
            unit: Some(item.unit.clone()),
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OrderRow {
    order_code: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    status: OrderStatus,
    total_amount: Money,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    customer: Option<String>,
    payment_method: PaymentMethod,
    #[serde(default)]
    amount_tendered: Money,
    #[serde(default)]
    change_amount: Money,
    #[serde(default)]
    reference_no: Option<String>,
    #[serde(default)]
    items_summary: Option<String>,
    #[serde(default)]
    lines: Option<Vec<OrderLine>>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        let customer = row
            .customer
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| crate::core::history::customer_from_notes(row.notes.as_deref()));
        let lines = row.lines.unwrap_or_default();
        let items_summary = row
            .items_summary
            .unwrap_or_else(|| crate::core::cart::summarize_lines(&lines));

        Order {
            id: row.order_code,
            created_at: row.created_at,
            lines,
            items_summary,
            payment_method: row.payment_method,
            amount_tendered: row.amount_tendered,
            change: row.change_amount,
            reference: row.reference_no.unwrap_or_else(|| "-".to_string()),
            total: row.total_amount,
            status: row.status,
            customer,
            notes: row.notes,
        }
    }
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        OrderRow {
            order_code: order.id.clone(),
            created_at: order.created_at,
            status: order.status,
            total_amount: order.total,
            notes: order.notes.clone(),
            customer: Some(order.customer.clone()),
            payment_method: order.payment_method,
            amount_tendered: order.amount_tendered,
            change_amount: order.change,
            reference_no: Some(order.reference.clone()),
            items_summary: Some(order.items_summary.clone()),
            lines: Some(order.lines.clone()),
        }
    }
}

#[async_trait]
impl PosStore for SupabaseStore {
    async fn menu_items(&self) -> Result<Vec<MenuItem>> {
        self.select(MENU_TABLE, Some("id")).await
    }

    async fn save_menu_items(&self, items: &[MenuItem]) -> Result<()> {
        let keys = items.iter().map(|i| i.id.clone()).collect();
        self.replace(MENU_TABLE, "id", items, keys).await
    }

    async fn recipes(&self) -> Result<Recipes> {
        let rows: Vec<IngredientRow> = self.select(INGREDIENT_TABLE, None).await?;
        let mut recipes = Recipes::new();
        for row in rows {
            recipes
                .entry(row.menu_item_id)
                .or_default()
                .push(RecipeIngredient {
                    id: row.id,
                    stock_pid: row.stock_pid.filter(|pid| !pid.is_empty()),
                    name: row.name,
                    quantity: row.quantity,
                    unit: row.unit.unwrap_or_default(),
                });
        }
        Ok(recipes)
    }

    async fn save_recipes(&self, recipes: &Recipes) -> Result<()> {
        let rows: Vec<IngredientRow> = recipes
            .iter()
            .flat_map(|(menu_id, ingredients)| {
                ingredients.iter().map(move |ing| IngredientRow {
                    id: ing.id.clone(),
                    menu_item_id: menu_id.clone(),
                    stock_pid: ing.stock_pid.clone(),
                    name: ing.name.clone(),
                    quantity: ing.quantity,
                    unit: Some(ing.unit.clone()),
                })
            })
            .collect();
        let keys = rows.iter().map(|r| r.id.clone()).collect();
        self.replace(INGREDIENT_TABLE, "id", &rows, keys).await
    }

    async fn addons(&self) -> Result<Vec<Addon>> {
        let rows: Vec<AddonRow> = self.select(ADDON_TABLE, Some("name")).await?;
        Ok(rows.into_iter().map(Addon::from).collect())
    }

    async fn save_addons(&self, addons: &[Addon]) -> Result<()> {
        let rows: Vec<AddonRow> = addons.iter().map(AddonRow::from).collect();
        let keys = addons.iter().map(|a| a.id.clone()).collect();
        self.replace(ADDON_TABLE, "id", &rows, keys).await
    }

    async fn stocks(&self) -> Result<Vec<StockItem>> {
        let rows: Vec<StockRow> = self.select(STOCK_TABLE, None).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_item(self.low_stock_threshold))
            .collect())
    }

    async fn save_stocks(&self, stocks: &[StockItem]) -> Result<()> {
        let rows: Vec<StockRow> = stocks.iter().map(StockRow::from).collect();
        self.upsert(STOCK_TABLE, "stock_pk", &rows).await
    }

    async fn orders(&self) -> Result<Vec<Order>> {
        let rows: Vec<OrderRow> = self.select(ORDER_TABLE, Some("created_at.desc")).await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn record_order(&self, order: &Order) -> Result<()> {
        let url = self.table_url(ORDER_TABLE)?;
        let response = self
            .request(reqwest::Method::POST, url)
            .header("Prefer", "return=minimal")
            .json(&OrderRow::from(order))
            .send()
            .await?;
        Self::check(response).await?;
        tracing::debug!("Recorded order {} remotely", order.id);
        Ok(())
    }

    async fn update_order_status(&self, order_id: &str, status: OrderStatus) -> Result<()> {
        let url = self.table_url(ORDER_TABLE)?;
        let filter = format!("eq.{}", order_id);
        let response = self
            .request(reqwest::Method::PATCH, url)
            .query(&[("order_code", filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?;
        let updated: Vec<serde_json::Value> = Self::check(response).await?.json().await?;
        if updated.is_empty() {
            return Err(PosError::NotFound {
                entity: "Order",
                id: order_id.to_string(),
            });
        }
        Ok(())
    }

    async fn roles(&self) -> Result<Vec<Role>> {
        self.select(ROLE_TABLE, Some("role_id")).await
    }

    async fn save_roles(&self, roles: &[Role]) -> Result<()> {
        self.upsert(ROLE_TABLE, "role_id", roles).await
    }
}
