//! Stock-deduction reconciliation.
//!
//! At checkout every cart line is expanded into its recipe, each recipe
//! ingredient is matched to a stock record and the record is decremented by
//! `ingredient.quantity * line.qty`. Add-ons that name a stock record are
//! deducted the same way. Quantities never go below zero and each touched
//! record gets its status recomputed.
//!
//! Matching prefers the ingredient's `stock_pid`. Ingredients without one
//! (or whose record has since been deleted) fall back to the first record
//! whose lowercased name contains the ingredient name or is contained in it.

use crate::core::cart::Cart;
use crate::domain::model::{Addon, Recipes, StockItem, StockStatus};
use chrono::Utc;

pub const DEFAULT_LOW_STOCK_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Deduction {
    pub stock_id: String,
    pub stock_name: String,
    pub requested: f64,
    /// On hand before this deduction.
    pub available: f64,
    pub applied: f64,
    pub remaining: f64,
    pub status: StockStatus,
}

impl Deduction {
    pub fn is_short(&self) -> bool {
        self.requested > self.available
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unmatched {
    pub menu_item_id: String,
    pub ingredient: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeductionReport {
    pub deductions: Vec<Deduction>,
    pub unmatched: Vec<Unmatched>,
}

impl DeductionReport {
    pub fn is_empty(&self) -> bool {
        self.deductions.is_empty() && self.unmatched.is_empty()
    }

    pub fn shortfalls(&self) -> impl Iterator<Item = &Deduction> {
        self.deductions.iter().filter(|d| d.is_short())
    }

    pub fn changed(&self) -> bool {
        self.deductions.iter().any(|d| d.applied > 0.0)
    }
}

fn find_stock(stocks: &[StockItem], stock_pid: Option<&str>, name: &str) -> Option<usize> {
    if let Some(pid) = stock_pid.filter(|p| !p.is_empty()) {
        if let Some(index) = stocks.iter().position(|s| s.product_id == pid) {
            return Some(index);
        }
    }

    let wanted = name.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    stocks.iter().position(|s| {
        let have = s.item_name.to_lowercase();
        !have.is_empty() && (have.contains(&wanted) || wanted.contains(&have))
    })
}

fn apply(stock: &mut StockItem, amount: f64, low_threshold: f64) -> Deduction {
    let available = stock.quantity.max(0.0);
    let applied = amount.min(available);
    let remaining = (stock.quantity - amount).max(0.0);
    stock.quantity = remaining;
    stock.refresh_status(low_threshold);
    stock.updated_at = Some(Utc::now());

    Deduction {
        stock_id: stock.product_id.clone(),
        stock_name: stock.item_name.clone(),
        requested: amount,
        available,
        applied,
        remaining,
        status: stock.status,
    }
}

/// Decrements `stocks` for everything in `cart`.
///
/// Missing recipes, unmatched ingredients and shortfalls are reported and
/// logged but never fail the sale.
pub fn deduct_for_cart(
    stocks: &mut [StockItem],
    recipes: &Recipes,
    addons: &[Addon],
    cart: &Cart,
    low_threshold: f64,
) -> DeductionReport {
    let mut report = DeductionReport::default();
    if stocks.is_empty() {
        tracing::debug!("No stock records, skipping deduction");
        return report;
    }

    for line in cart.lines() {
        let qty = f64::from(line.qty);

        for ingredient in recipes.get(&line.item.id).map(Vec::as_slice).unwrap_or(&[]) {
            match find_stock(stocks, ingredient.stock_pid.as_deref(), &ingredient.name) {
                Some(index) => {
                    let amount = ingredient.quantity * qty;
                    report
                        .deductions
                        .push(apply(&mut stocks[index], amount, low_threshold));
                }
                None => {
                    tracing::warn!(
                        "No stock record matches ingredient '{}' of {}",
                        ingredient.name,
                        line.item.name
                    );
                    report.unmatched.push(Unmatched {
                        menu_item_id: line.item.id.clone(),
                        ingredient: ingredient.name.clone(),
                    });
                }
            }
        }

        for chosen in &line.addons {
            // the cart holds a snapshot; prefer the current add-on definition
            let addon = addons.iter().find(|a| a.id == chosen.id).unwrap_or(chosen);
            let Some(pid) = addon.stock_pid.as_deref().filter(|p| !p.is_empty()) else {
                continue;
            };
            if addon.stock_qty <= 0.0 {
                continue;
            }
            match stocks.iter().position(|s| s.product_id == pid) {
                Some(index) => {
                    let deduction = apply(&mut stocks[index], addon.stock_qty * qty, low_threshold);
                    report.deductions.push(deduction);
                }
                None => {
                    tracing::warn!("Add-on '{}' points at missing stock {}", addon.name, pid);
                    report.unmatched.push(Unmatched {
                        menu_item_id: line.item.id.clone(),
                        ingredient: addon.name.clone(),
                    });
                }
            }
        }
    }

    for short in report.shortfalls() {
        tracing::warn!(
            "Stock '{}' ran short: needed {}, had {}",
            short.stock_name,
            short.requested,
            short.available
        );
    }

    report
}

/// Listing filter for the stock screen.
///
/// Status is worked out from the quantity at `low_threshold`, never read
/// from the stored record.
#[derive(Debug, Clone)]
pub struct StockFilter {
    pub status: Option<StockStatus>,
    pub query: Option<String>,
    pub low_threshold: f64,
}

impl Default for StockFilter {
    fn default() -> Self {
        Self {
            status: None,
            query: None,
            low_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl StockFilter {
    pub fn matches(&self, index: usize, stock: &StockItem) -> bool {
        if let Some(status) = self.status {
            if StockStatus::from_quantity(stock.quantity, self.low_threshold) != status {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                stock.item_name.to_lowercase().contains(&q)
                    || display_id(index, stock).to_lowercase().contains(&q)
            }
            _ => true,
        }
    }

    pub fn apply<'a>(&self, stocks: &'a [StockItem]) -> Vec<(String, &'a StockItem)> {
        stocks
            .iter()
            .enumerate()
            .filter(|(i, s)| self.matches(*i, s))
            .map(|(i, s)| (display_id(i, s), s))
            .collect()
    }
}

/// `STK-007` for numeric ids, the raw id otherwise (1-based position when empty).
pub fn display_id(index: usize, stock: &StockItem) -> String {
    match stock.product_id.trim().parse::<u64>() {
        Ok(n) => format!("STK-{:03}", n),
        Err(_) if stock.product_id.trim().is_empty() => format!("STK-{:03}", index + 1),
        Err(_) => stock.product_id.clone(),
    }
}

pub fn low_stock(stocks: &[StockItem], low_threshold: f64) -> Vec<&StockItem> {
    stocks
        .iter()
        .filter(|s| s.quantity <= low_threshold)
        .collect()
}

/// Recomputes every status, e.g. after the threshold changed.
pub fn refresh_statuses(stocks: &mut [StockItem], low_threshold: f64) {
    for stock in stocks {
        stock.refresh_status(low_threshold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{MenuItem, RecipeIngredient};
    use crate::domain::money::Money;

    fn stock(id: &str, name: &str, qty: f64) -> StockItem {
        StockItem {
            product_id: id.to_string(),
            item_name: name.to_string(),
            category: None,
            quantity: qty,
            unit: "g".to_string(),
            status: StockStatus::from_quantity(qty, DEFAULT_LOW_STOCK_THRESHOLD),
            updated_at: None,
        }
    }

    fn ingredient(pid: Option<&str>, name: &str, qty: f64) -> RecipeIngredient {
        RecipeIngredient {
            id: format!("ing_{}", name),
            stock_pid: pid.map(str::to_string),
            name: name.to_string(),
            quantity: qty,
            unit: "g".to_string(),
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

    #[test]
    fn test_deducts_recipe_times_quantity() {
        let mut stocks = vec![stock("1", "Espresso Beans", 100.0), stock("2", "Whole Milk", 50.0)];
        let mut recipes = Recipes::new();
        recipes.insert(
            "c4".to_string(),
            vec![ingredient(Some("1"), "Espresso Beans", 18.0), ingredient(None, "milk", 20.0)],
        );
        let mut cart = Cart::new();
        cart.add(&latte(), &[]).unwrap();
        cart.add(&latte(), &[]).unwrap();

        let report = deduct_for_cart(&mut stocks, &recipes, &[], &cart, 10.0);

        assert_eq!(stocks[0].quantity, 64.0);
        assert_eq!(stocks[0].status, StockStatus::InStock);
        // "milk" matched "Whole Milk" by name, 50 - 40 = 10 is low
        assert_eq!(stocks[1].quantity, 10.0);
        assert_eq!(stocks[1].status, StockStatus::LowStock);
        assert_eq!(report.deductions.len(), 2);
        assert!(report.unmatched.is_empty());
        assert!(report.changed());
    }

    #[test]
    fn test_clamps_at_zero_and_reports_shortfall() {
        let mut stocks = vec![stock("1", "Milk", 5.0)];
        let mut recipes = Recipes::new();
        recipes.insert("c4".to_string(), vec![ingredient(Some("1"), "Milk", 8.0)]);
        let mut cart = Cart::new();
        cart.add(&latte(), &[]).unwrap();

        let report = deduct_for_cart(&mut stocks, &recipes, &[], &cart, 10.0);

        assert_eq!(stocks[0].quantity, 0.0);
        assert_eq!(stocks[0].status, StockStatus::OutOfStock);
        let short: Vec<_> = report.shortfalls().collect();
        assert_eq!(short.len(), 1);
        assert_eq!(short[0].applied, 5.0);
        assert_eq!(short[0].requested, 8.0);
    }

    #[test]
    fn test_stale_pid_falls_back_to_name_and_unknown_is_reported() {
        let mut stocks = vec![stock("9", "Caramel Syrup", 40.0)];
        let mut recipes = Recipes::new();
        recipes.insert(
            "c4".to_string(),
            vec![
                ingredient(Some("deleted"), "caramel", 10.0),
                ingredient(None, "Vanilla", 5.0),
            ],
        );
        let mut cart = Cart::new();
        cart.add(&latte(), &[]).unwrap();

        let report = deduct_for_cart(&mut stocks, &recipes, &[], &cart, 10.0);

        assert_eq!(stocks[0].quantity, 30.0);
        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(report.unmatched[0].ingredient, "Vanilla");
    }

    #[test]
    fn test_addon_stock_is_deducted() {
        let mut stocks = vec![stock("s1", "Espresso Beans", 100.0)];
        let shot = Addon {
            id: "addon_shot".to_string(),
            name: "Extra Shot".to_string(),
            price: Money::from_pesos(30.0),
            applicable_items: vec!["c4".to_string()],
            stock_pid: Some("s1".to_string()),
            stock_qty: 9.0,
            stock_unit: "g".to_string(),
        };
        let mut cart = Cart::new();
        cart.add(&latte(), &[shot.clone()]).unwrap();
        cart.update_qty("c4|addon_shot", 1).unwrap();

        let report = deduct_for_cart(&mut stocks, &Recipes::new(), &[shot], &cart, 10.0);

        assert_eq!(stocks[0].quantity, 82.0);
        assert_eq!(report.deductions.len(), 1);
    }

    #[test]
    fn test_no_stocks_is_noop() {
        let mut stocks: Vec<StockItem> = vec![];
        let mut cart = Cart::new();
        cart.add(&latte(), &[]).unwrap();
        let report = deduct_for_cart(&mut stocks, &Recipes::new(), &[], &cart, 10.0);
        assert!(report.is_empty());
    }

    #[test]
    fn test_filter_by_status_and_display_id() {
        let stocks = vec![stock("7", "Whole Milk", 4.0), stock("8", "Cups", 300.0)];
        let low = StockFilter {
            status: Some(StockStatus::LowStock),
            ..StockFilter::default()
        };
        let rows = low.apply(&stocks);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "STK-007");

        let by_id = StockFilter {
            query: Some("stk-008".to_string()),
            ..StockFilter::default()
        };
        assert_eq!(by_id.apply(&stocks)[0].1.item_name, "Cups");
        assert_eq!(low_stock(&stocks, 10.0).len(), 1);
    }

    #[test]
    fn test_fractional_deduction_is_not_a_shortfall() {
        let mut stocks = vec![stock("1", "Whole Milk", 10.0)];
        let mut recipes = Recipes::new();
        recipes.insert("c4".to_string(), vec![ingredient(Some("1"), "Whole Milk", 0.2)]);
        let mut cart = Cart::new();
        cart.add(&latte(), &[]).unwrap();

        let report = deduct_for_cart(&mut stocks, &recipes, &[], &cart, 10.0);

        assert_eq!(report.shortfalls().count(), 0);
        assert_eq!(report.deductions[0].applied, 0.2);
        assert_eq!(report.deductions[0].available, 10.0);
        assert!((stocks[0].quantity - 9.8).abs() < 1e-9);
    }

    #[test]
    fn test_filter_ignores_stale_stored_status() {
        let mut cups = stock("3", "Paper Cups", 3.0);
        cups.status = StockStatus::InStock;
        let stocks = vec![cups, stock("4", "Lids", 300.0)];

        let low = StockFilter {
            status: Some(StockStatus::LowStock),
            low_threshold: 10.0,
            ..StockFilter::default()
        };
        assert_eq!(low.apply(&stocks).len(), 1);
        assert_eq!(low_stock(&stocks, 10.0).len(), 1);

        let strict = StockFilter {
            status: Some(StockStatus::LowStock),
            low_threshold: 2.0,
            ..StockFilter::default()
        };
        assert!(strict.apply(&stocks).is_empty());
    }

    #[test]
    fn test_addon_pointing_at_missing_stock_is_unmatched() {
        let mut stocks = vec![stock("s1", "Espresso Beans", 100.0)];
        let syrup = Addon {
            id: "addon_syrup".to_string(),
            name: "Hazelnut Syrup".to_string(),
            price: Money::from_pesos(20.0),
            applicable_items: vec!["c4".to_string()],
            stock_pid: Some("gone".to_string()),
            stock_qty: 15.0,
            stock_unit: "ml".to_string(),
        };
        let mut cart = Cart::new();
        cart.add(&latte(), &[syrup.clone()]).unwrap();

        let report = deduct_for_cart(&mut stocks, &Recipes::new(), &[syrup], &cart, 10.0);

        assert_eq!(stocks[0].quantity, 100.0);
        assert!(report.deductions.is_empty());
        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(report.unmatched[0].ingredient, "Hazelnut Syrup");
        assert!(!report.changed());
    }
}
