//! Wire representations of catalog records
//!
//! Views are what gets cached and what gets returned, so a response built
//! from a live query and one decoded from the cache serialize identically.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::order::{OrderRecord, OrderStatus};
use super::product::Product;
use super::user::User;

/// ISO-8601 timestamp with fixed microsecond precision
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub brand: String,
    pub stock_quantity: i32,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price,
            category: p.category,
            brand: p.brand,
            stock_quantity: p.stock_quantity,
            rating: p.rating,
            is_active: p.is_active,
            created_at: format_timestamp(&p.created_at),
            updated_at: format_timestamp(&p.updated_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub country: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            phone: u.phone,
            address: u.address,
            city: u.city,
            country: u.country,
            is_active: u.is_active,
            created_at: format_timestamp(&u.created_at),
        }
    }
}

/// Order with its expanded user and product; unresolved sides are `null`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub order_date: String,
    pub user: Option<UserView>,
    pub product: Option<ProductView>,
}

impl From<OrderRecord> for OrderView {
    fn from(record: OrderRecord) -> Self {
        let OrderRecord {
            order,
            user,
            product,
        } = record;

        Self {
            id: order.id,
            user_id: order.user_id,
            product_id: order.product_id,
            quantity: order.quantity,
            unit_price: order.unit_price,
            total_amount: order.total_amount,
            status: order.status,
            order_date: format_timestamp(&order.order_date),
            user: user.map(UserView::from),
            product: product.map(ProductView::from),
        }
    }
}
