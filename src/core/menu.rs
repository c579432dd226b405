use crate::core::PosStore;
use crate::domain::model::{Addon, MenuItem, RecipeIngredient, Recipes, StockItem};
use crate::domain::money::Money;
use crate::utils::error::{PosError, Result};
use chrono::Utc;
use rand::Rng;

pub const DEFAULT_IMAGE: &str = "assets/CoffeeBean.png";
pub const ALL_CATEGORIES: &str = "all";

const SEED_MENU: [(&str, &str, i64, &str); 19] = [
    ("c1", "Espresso", 110, "coffee"),
    ("c2", "Americano", 120, "coffee"),
    ("c3", "Cappuccino", 140, "coffee"),
    ("c4", "Latte", 150, "coffee"),
    ("c5", "Mocha", 160, "coffee"),
    ("c6", "Caramel Macchiato", 170, "coffee"),
    ("c7", "Cold Brew", 145, "coffee"),
    ("nc1", "Hot Chocolate", 130, "non-coffee"),
    ("nc2", "Matcha Latte", 160, "non-coffee"),
    ("nc3", "Chai Tea", 135, "non-coffee"),
    ("nc4", "Iced Tea", 100, "non-coffee"),
    ("p1", "Croissant", 95, "pastries"),
    ("p2", "Choc Croissant", 115, "pastries"),
    ("p3", "Blueberry Muffin", 105, "pastries"),
    ("p4", "Bagel & Cream Cheese", 110, "pastries"),
    ("b1", "Breakfast Sandwich", 220, "breakfast"),
    ("b2", "Oatmeal", 120, "breakfast"),
    ("m1", "Brew Cave Mug", 450, "apparel"),
    ("m2", "Coffee Beans (1lb)", 650, "apparel"),
];

/// The products a fresh install starts with.
pub fn default_menu() -> Vec<MenuItem> {
    SEED_MENU
        .iter()
        .map(|(id, name, pesos, category)| MenuItem {
            id: id.to_string(),
            name: name.to_string(),
            price: Money::from_centavos(pesos * 100),
            category: category.to_string(),
            image: Some(DEFAULT_IMAGE.to_string()),
        })
        .collect()
}

/// Returns the stored menu, writing the seed menu first if nothing is stored.
pub async fn ensure_seeded<S: PosStore + ?Sized>(store: &S) -> Result<Vec<MenuItem>> {
    let items = store.menu_items().await?;
    if !items.is_empty() {
        return Ok(items);
    }

    let items = default_menu();
    tracing::info!("Menu is empty, seeding {} default products", items.len());
    store.save_menu_items(&items).await?;
    Ok(items)
}

/// `custom{N+1}` for the highest `customN` id in use.
pub fn next_custom_id(items: &[MenuItem]) -> String {
    let highest = items
        .iter()
        .filter_map(|item| item.id.strip_prefix("custom"))
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|digits| digits.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("custom{}", highest + 1)
}

pub fn validate_menu_item(item: &MenuItem) -> Result<()> {
    if item.name.trim().is_empty() {
        return Err(PosError::validation("menu item name is required"));
    }
    if item.price.is_negative() {
        return Err(PosError::validation(format!(
            "price for '{}' cannot be negative",
            item.name
        )));
    }
    Ok(())
}

pub fn validate_addon(addon: &Addon, menu: &[MenuItem]) -> Result<()> {
    if addon.name.trim().is_empty() {
        return Err(PosError::validation("add-on name is required"));
    }
    if addon.price.is_negative() {
        return Err(PosError::validation(format!(
            "price for add-on '{}' cannot be negative",
            addon.name
        )));
    }
    if let Some(missing) = addon
        .applicable_items
        .iter()
        .find(|id| !menu.iter().any(|item| &item.id == *id))
    {
        return Err(PosError::NotFound {
            entity: "Menu item",
            id: missing.clone(),
        });
    }
    Ok(())
}

/// Menu, recipes and add-ons loaded together for edits that touch all three.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub items: Vec<MenuItem>,
    pub recipes: Recipes,
    pub addons: Vec<Addon>,
}

impl Catalog {
    pub async fn load<S: PosStore + ?Sized>(store: &S) -> Result<Self> {
        Ok(Self {
            items: store.menu_items().await?,
            recipes: store.recipes().await?,
            addons: store.addons().await?,
        })
    }

    pub async fn save<S: PosStore + ?Sized>(&self, store: &S) -> Result<()> {
        store.save_menu_items(&self.items).await?;
        store.save_recipes(&self.recipes).await?;
        store.save_addons(&self.addons).await
    }

    /// Removes the item along with its recipe and every add-on link to it.
    pub fn remove_menu_item(&mut self, id: &str) -> Result<MenuItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| PosError::NotFound {
                entity: "Menu item",
                id: id.to_string(),
            })?;

        let removed = self.items.remove(index);
        self.recipes.remove(id);
        for addon in &mut self.addons {
            addon.applicable_items.retain(|item_id| item_id != id);
        }

        tracing::info!("Removed menu item {} ({})", removed.name, removed.id);
        Ok(removed)
    }
}

fn ingredient_id() -> String {
    const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("ing_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Adds or replaces one recipe line for `menu_id`, linked to a stock record.
///
/// Name and unit are always taken from the stock record so the line keeps
/// matching during deduction.
pub fn set_ingredient(
    recipes: &mut Recipes,
    stocks: &[StockItem],
    menu_id: &str,
    stock_pid: &str,
    quantity: f64,
    existing_id: Option<&str>,
) -> Result<RecipeIngredient> {
    let stock = stocks
        .iter()
        .find(|s| s.product_id == stock_pid)
        .ok_or_else(|| PosError::NotFound {
            entity: "Stock item",
            id: stock_pid.to_string(),
        })?;
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(PosError::validation(format!(
            "ingredient quantity must be greater than zero, got {}",
            quantity
        )));
    }

    let lines = recipes.entry(menu_id.to_string()).or_default();
    let ingredient = RecipeIngredient {
        id: existing_id
            .map(str::to_string)
            .unwrap_or_else(ingredient_id),
        stock_pid: Some(stock.product_id.clone()),
        name: stock.item_name.clone(),
        quantity,
        unit: stock.unit.clone(),
    };

    match lines.iter_mut().find(|line| line.id == ingredient.id) {
        Some(line) => *line = ingredient.clone(),
        None => lines.push(ingredient.clone()),
    }
    Ok(ingredient)
}

pub fn remove_ingredient(recipes: &mut Recipes, menu_id: &str, ingredient_id: &str) -> bool {
    let Some(lines) = recipes.get_mut(menu_id) else {
        return false;
    };
    let before = lines.len();
    lines.retain(|line| line.id != ingredient_id);
    let removed = lines.len() != before;
    if lines.is_empty() {
        recipes.remove(menu_id);
    }
    removed
}

/// Items in `category` (or every category for `all`) whose name contains `query`.
pub fn filter_menu<'a>(items: &'a [MenuItem], category: &str, query: &str) -> Vec<&'a MenuItem> {
    let q = query.trim().to_lowercase();
    items
        .iter()
        .filter(|item| {
            category.eq_ignore_ascii_case(ALL_CATEGORIES)
                || item.category.eq_ignore_ascii_case(category)
        })
        .filter(|item| q.is_empty() || item.name.to_lowercase().contains(&q))
        .collect()
}
