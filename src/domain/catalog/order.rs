//! Order entity, status enum, filters and sort fields

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::Product;
use super::query::{compare_f64, ListFilter, ListQuery, SortField};
use super::user::User;
use crate::domain::cache::CacheKeyParams;
use crate::domain::DomainError;

/// Closed set of order states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "status must be one of: {}",
                    Self::ALL.map(|s| s.as_str()).join(", ")
                ))
            })
    }
}

/// Stored order row; `user_id` and `product_id` are soft references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

impl NewOrder {
    /// Builds an order whose total is `quantity * unit_price` rounded to cents
    pub fn priced(
        user_id: i64,
        product_id: i64,
        quantity: i32,
        unit_price: f64,
        status: OrderStatus,
        order_date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            product_id,
            quantity,
            unit_price,
            total_amount: round2(f64::from(quantity) * unit_price),
            status,
            order_date,
        }
    }
}

/// Rounds to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// An order with its one-hop expansion; either side is `None` when the
/// reference no longer resolves
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order: Order,
    pub user: Option<User>,
    pub product: Option<Product>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub user_id: Option<i64>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }
}

impl ListFilter for OrderFilter {
    type Record = Order;

    fn validate(&self) -> Result<(), DomainError> {
        if self.user_id.is_some_and(|id| id < 1) {
            return Err(DomainError::validation("User ID must be greater than 0"));
        }
        Ok(())
    }

    fn matches(&self, order: &Order) -> bool {
        !self.user_id.is_some_and(|id| id != order.user_id)
            && !self.status.is_some_and(|s| s != order.status)
    }

    fn key_params(&self, params: CacheKeyParams) -> CacheKeyParams {
        params
            .with_optional("user_id", self.user_id)
            .with_optional("status", self.status.map(|s| s.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSortField {
    Id,
    UserId,
    ProductId,
    Quantity,
    UnitPrice,
    TotalAmount,
    Status,
    OrderDate,
}

impl SortField for OrderSortField {
    type Record = Order;

    const DEFAULT: Self = Self::Id;

    fn from_name(name: &str) -> Self {
        match name {
            "user_id" => Self::UserId,
            "product_id" => Self::ProductId,
            "quantity" => Self::Quantity,
            "unit_price" => Self::UnitPrice,
            "total_amount" => Self::TotalAmount,
            "status" => Self::Status,
            "order_date" => Self::OrderDate,
            _ => Self::Id,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::UserId => "user_id",
            Self::ProductId => "product_id",
            Self::Quantity => "quantity",
            Self::UnitPrice => "unit_price",
            Self::TotalAmount => "total_amount",
            Self::Status => "status",
            Self::OrderDate => "order_date",
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, Self::Status)
    }

    fn compare(&self, a: &Order, b: &Order) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::UserId => a.user_id.cmp(&b.user_id),
            Self::ProductId => a.product_id.cmp(&b.product_id),
            Self::Quantity => a.quantity.cmp(&b.quantity),
            Self::UnitPrice => compare_f64(a.unit_price, b.unit_price),
            Self::TotalAmount => compare_f64(a.total_amount, b.total_amount),
            // Stored as text, so order by the canonical name
            Self::Status => a.status.as_str().cmp(b.status.as_str()),
            Self::OrderDate => a.order_date.cmp(&b.order_date),
        }
    }
}

pub type OrderQuery = ListQuery<OrderFilter, OrderSortField>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("Shipped".parse::<OrderStatus>().is_err());
        assert!("confirmed".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_by_name() {
        let json = serde_json::to_string(&OrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn test_priced_rounds_total() {
        let order = NewOrder::priced(1, 2, 3, 19.99, OrderStatus::Pending, Utc::now());
        assert_eq!(order.total_amount, 59.97);

        let order = NewOrder::priced(1, 2, 3, 0.1, OrderStatus::Pending, Utc::now());
        assert_eq!(order.total_amount, 0.3);
    }

    #[test]
    fn test_non_positive_user_id_rejected() {
        assert!(OrderFilter::default().with_user_id(0).validate().is_err());
        assert!(OrderFilter::default().with_user_id(1).validate().is_ok());
    }

    #[test]
    fn test_filter_matches_conjunction() {
        let order = Order {
            id: 1,
            user_id: 7,
            product_id: 3,
            quantity: 1,
            unit_price: 10.0,
            total_amount: 10.0,
            status: OrderStatus::Delivered,
            order_date: Utc::now(),
        };

        assert!(OrderFilter::default().matches(&order));
        assert!(OrderFilter::default().with_user_id(7).matches(&order));
        assert!(!OrderFilter::default()
            .with_user_id(7)
            .with_status(OrderStatus::Pending)
            .matches(&order));
    }

    #[test]
    fn test_status_sorts_by_name() {
        assert_eq!(OrderSortField::from_name("status"), OrderSortField::Status);
        assert_eq!(OrderSortField::from_name("nope"), OrderSortField::Id);
    }
}
