use crate::core::cart::Cart;
use crate::core::stock::DeductionReport;
use crate::domain::model::{Order, OrderStatus, PaymentMethod};
use crate::domain::money::Money;
use crate::utils::error::{PosError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

pub const WALK_IN: &str = "Walk-in";

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub customer: Option<String>,
    pub tendered: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

impl PaymentRequest {
    pub fn cash(tendered: Money) -> Self {
        Self {
            customer: None,
            tendered,
            method: PaymentMethod::Cash,
            reference: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Receipt {
    pub order: Order,
    pub deductions: DeductionReport,
    pub vat: Money,
}

/// Rejects an empty cart or a short payment before anything is written.
pub fn validate_payment(cart: &Cart, payment: &PaymentRequest) -> Result<Money> {
    if cart.is_empty() {
        return Err(PosError::EmptyCart);
    }
    let total = cart.total();
    if payment.tendered < total {
        return Err(PosError::InsufficientPayment {
            total: total.to_string(),
            tendered: payment.tendered.to_string(),
        });
    }
    Ok(total)
}

/// `{prefix}-{last six digits of the millisecond clock}`, bumped until unique.
pub fn generate_order_id<'a>(
    prefix: &str,
    now: DateTime<Utc>,
    existing: impl IntoIterator<Item = &'a str>,
) -> String {
    let taken: HashSet<&str> = existing.into_iter().collect();
    let mut n = now.timestamp_millis().rem_euclid(1_000_000);
    loop {
        let candidate = format!("{}-{:06}", prefix, n);
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        n = (n + 1) % 1_000_000;
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn build_order(
    id: String,
    cart: &Cart,
    payment: &PaymentRequest,
    total: Money,
    now: DateTime<Utc>,
) -> Order {
    let customer = non_blank(payment.customer.as_deref()).unwrap_or_else(|| WALK_IN.to_string());

    Order {
        id,
        created_at: now,
        lines: cart.order_lines(),
        items_summary: cart.items_summary(),
        payment_method: payment.method,
        amount_tendered: payment.tendered,
        change: payment.tendered - total,
        reference: non_blank(payment.reference.as_deref()).unwrap_or_else(|| "-".to_string()),
        total,
        status: OrderStatus::Pending,
        notes: Some(format!("Customer: {}", customer)),
        customer,
    }
}
