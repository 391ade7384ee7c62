//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::Quantity;

/// A placed order. Everything except `status` is fixed at creation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: Uuid,
    user_id: Uuid,
    items: Vec<OrderLine>,
    total_amount: Decimal,
    customer_info: CustomerInfo,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

/// Order line with the unit price captured when the order was placed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: Quantity,
    pub price: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo { pub name: String, pub email: String, pub phone: String, pub address: String }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus { #[default] Placed, Processing, Shipped, Delivered, Cancelled }

impl OrderLine {
    /// Prices a line from the product's current price.
    pub fn snapshot(product: &Product, quantity: Quantity) -> Self {
        Self { product_id: product.id, quantity, price: product.price.amount() }
    }

    /// `None` on overflow.
    pub fn line_total(&self) -> Option<Decimal> { self.price.checked_mul(Decimal::from(self.quantity.value())) }
}

/// Sum of `price * quantity` over all lines, `None` on overflow.
pub fn order_total(lines: &[OrderLine]) -> Option<Decimal> {
    lines.iter().try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.line_total()?))
}

impl Order {
    /// Exclusive upper bound on `total_amount`, the range of a `NUMERIC(14, 2)` column.
    pub const TOTAL_LIMIT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

    pub fn place(user_id: Uuid, items: Vec<OrderLine>, customer_info: CustomerInfo) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let total_amount = order_total(&items)
            .filter(|total| *total < Self::TOTAL_LIMIT)
            .ok_or(OrderError::TotalTooLarge)?;
        Ok(Self {
            id: Uuid::now_v7(), user_id, total_amount, items, customer_info,
            status: OrderStatus::Placed, created_at: Utc::now(),
        })
    }

    /// Rebuilds an order from persisted fields without recomputing anything.
    pub fn restore(
        id: Uuid, user_id: Uuid, items: Vec<OrderLine>, total_amount: Decimal,
        customer_info: CustomerInfo, status: OrderStatus, created_at: DateTime<Utc>,
    ) -> Self {
        Self { id, user_id, items, total_amount, customer_info, status, created_at }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn items(&self) -> &[OrderLine] { &self.items }
    pub fn total_amount(&self) -> Decimal { self.total_amount }
    pub fn customer_info(&self) -> &CustomerInfo { &self.customer_info }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Any status may follow any other; there is no transition guard.
    pub fn set_status(&mut self, status: OrderStatus) { self.status = status; }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "Placed",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Placed" => Ok(Self::Placed),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)] pub enum OrderError { NoItems, TotalTooLarge, UnknownStatus(String) }
impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoItems => write!(f, "No items"),
            Self::TotalTooLarge => write!(f, "Order total must be less than {}", Order::TOTAL_LIMIT),
            Self::UnknownStatus(s) => write!(f, "Unknown order status: {s}"),
        }
    }
}
