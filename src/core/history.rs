use crate::core::checkout::WALK_IN;
use crate::domain::model::{Order, OrderStatus, PaymentMethod};
use crate::domain::money::Money;
use crate::utils::error::{PosError, Result};
use chrono::Local;
use std::collections::BTreeMap;
use std::io::Write;

/// Orders whose id, customer or notes contain `query` (case-insensitive).
pub fn search<'a>(orders: &'a [Order], query: &str) -> Vec<&'a Order> {
    let q = query.trim().to_lowercase();
    orders
        .iter()
        .filter(|o| {
            q.is_empty()
                || o.id.to_lowercase().contains(&q)
                || o.customer.to_lowercase().contains(&q)
                || o.notes
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&q))
        })
        .collect()
}

pub fn customer_from_notes(notes: Option<&str>) -> String {
    notes
        .and_then(|n| n.split_once("Customer:"))
        .map(|(_, rest)| rest.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(WALK_IN)
        .to_string()
}

/// Checks that `from -> to` is a legal order status change.
pub fn check_transition(order_id: &str, from: OrderStatus, to: OrderStatus) -> Result<()> {
    let allowed = matches!(
        (from, to),
        (OrderStatus::Pending, OrderStatus::Completed)
            | (OrderStatus::Pending, OrderStatus::Refunded)
            | (OrderStatus::Completed, OrderStatus::Refunded)
    );
    if allowed {
        Ok(())
    } else {
        Err(PosError::InvalidTransition {
            id: order_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesSummary {
    pub order_count: usize,
    pub pending: usize,
    pub gross_sales: Money,
    pub refunded: Money,
    pub by_method: BTreeMap<String, usize>,
}

pub fn summarize(orders: &[Order]) -> SalesSummary {
    let mut summary = SalesSummary::default();
    for order in orders {
        summary.order_count += 1;
        match order.status {
            OrderStatus::Refunded => summary.refunded += order.total,
            OrderStatus::Pending => {
                summary.pending += 1;
                summary.gross_sales += order.total;
            }
            OrderStatus::Completed => summary.gross_sales += order.total,
        }
        *summary
            .by_method
            .entry(order.payment_method.to_string())
            .or_default() += 1;
    }
    summary
}

pub fn count_by_method(orders: &[Order], method: PaymentMethod) -> usize {
    orders.iter().filter(|o| o.payment_method == method).count()
}

/// `Feb 8, 2026 10:30 AM` in the terminal's local time.
pub fn format_timestamp(order: &Order) -> String {
    order
        .created_at
        .with_timezone(&Local)
        .format("%b %-d, %Y %-I:%M %p")
        .to_string()
}

/// Writes one CSV row per order.
pub fn export_csv<W: Write>(orders: &[Order], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "id", "date", "customer", "items", "payment", "reference", "total", "change", "status",
    ])?;

    for order in orders {
        let date = order.created_at.to_rfc3339();
        let payment = order.payment_method.to_string();
        let total = format!("{:.2}", order.total.as_pesos());
        let change = format!("{:.2}", order.change.as_pesos());
        let status = order.status.to_string();
        csv_writer.write_record([
            order.id.as_str(),
            date.as_str(),
            order.customer.as_str(),
            order.items_summary.as_str(),
            payment.as_str(),
            order.reference.as_str(),
            total.as_str(),
            change.as_str(),
            status.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
