use crate::domain::model::{Addon, MenuItem, OrderLine};
use crate::domain::money::Money;
use crate::utils::error::{PosError, Result};

/// Add-ons that may be attached to `product`.
pub fn applicable_addons<'a>(product: &MenuItem, all_addons: &'a [Addon]) -> Vec<&'a Addon> {
    all_addons
        .iter()
        .filter(|addon| addon.applies_to(&product.id))
        .collect()
}

/// Product id, then the sorted add-on ids after a `|`.
pub fn cart_line_id(product_id: &str, addons: &[Addon]) -> String {
    let mut addon_ids: Vec<&str> = addons.iter().map(|a| a.id.as_str()).collect();
    if addon_ids.is_empty() {
        return product_id.to_string();
    }
    addon_ids.sort_unstable();
    format!("{}|{}", product_id, addon_ids.join(","))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub cart_id: String,
    pub item: MenuItem,
    pub addons: Vec<Addon>,
    pub qty: u32,
    /// Menu price plus every chosen add-on.
    pub unit_price: Money,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.qty)
    }

    pub fn to_order_line(&self) -> OrderLine {
        OrderLine {
            menu_item_id: self.item.id.clone(),
            name: self.item.name.clone(),
            qty: self.qty,
            unit_price: self.unit_price,
            addons: self.addons.iter().map(|a| a.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Adds one unit of `product` with `addons`, merging into an identical line.
    pub fn add(&mut self, product: &MenuItem, addons: &[Addon]) -> Result<&CartLine> {
        if let Some(stray) = addons.iter().find(|a| !a.applies_to(&product.id)) {
            return Err(PosError::validation(format!(
                "add-on '{}' is not available for {}",
                stray.name, product.name
            )));
        }

        let cart_id = cart_line_id(&product.id, addons);
        let index = match self.lines.iter().position(|l| l.cart_id == cart_id) {
            Some(index) => {
                self.lines[index].qty += 1;
                index
            }
            None => {
                let addon_total: Money = addons.iter().map(|a| a.price).sum();
                let mut sorted = addons.to_vec();
                sorted.sort_by(|a, b| a.id.cmp(&b.id));
                self.lines.push(CartLine {
                    cart_id,
                    item: product.clone(),
                    addons: sorted,
                    qty: 1,
                    unit_price: product.price + addon_total,
                });
                self.lines.len() - 1
            }
        };

        tracing::debug!("Added {} to cart", product.name);
        Ok(&self.lines[index])
    }

    /// Adjusts a line's quantity; the line is dropped once it reaches zero.
    pub fn update_qty(&mut self, cart_id: &str, delta: i32) -> Result<()> {
        let index = self
            .lines
            .iter()
            .position(|l| l.cart_id == cart_id)
            .ok_or_else(|| PosError::NotFound {
                entity: "Cart line",
                id: cart_id.to_string(),
            })?;

        let new_qty = i64::from(self.lines[index].qty) + i64::from(delta);
        if new_qty <= 0 {
            self.lines.remove(index);
        } else {
            self.lines[index].qty = u32::try_from(new_qty).unwrap_or(u32::MAX);
        }
        Ok(())
    }

    pub fn remove(&mut self, cart_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.cart_id != cart_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.qty).sum()
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Menu prices already include VAT, so the total is the subtotal.
    pub fn total(&self) -> Money {
        self.subtotal()
    }

    /// The VAT share contained in the total at `rate` (0.12 for 12%).
    pub fn vat_component(&self, rate: f64) -> Money {
        if rate <= 0.0 {
            return Money::ZERO;
        }
        let total = self.total().centavos() as f64;
        Money::from_centavos((total * rate / (1.0 + rate)).round() as i64)
    }

    pub fn items_summary(&self) -> String {
        self.lines
            .iter()
            .map(|l| format!("{}x {}", l.qty, l.item.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lines.iter().map(CartLine::to_order_line).collect()
    }
}

/// `"2x Latte, 1x Croissant"` for stored order lines.
pub fn summarize_lines(lines: &[OrderLine]) -> String {
    lines
        .iter()
        .map(|l| format!("{}x {}", l.qty, l.name))
        .collect::<Vec<_>>()
        .join(", ")
}
