//! Product entity, filters and sort fields

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::{
    check_text_len, compare_f64, compare_nullable_f64, contains_ignore_case, ListFilter, ListQuery,
    SortField,
};
use crate::domain::cache::CacheKeyParams;
use crate::domain::DomainError;

pub const SEARCH_MAX_LEN: usize = 255;
pub const FACET_MAX_LEN: usize = 100;

/// Stored product row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub brand: String,
    pub stock_quantity: i32,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product to insert; identity is assigned by storage and `updated_at`
/// starts equal to `created_at`
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub brand: String,
    pub stock_quantity: i32,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ProductFilter {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }
}

impl ListFilter for ProductFilter {
    type Record = Product;

    fn validate(&self) -> Result<(), DomainError> {
        check_text_len("search", &self.search, SEARCH_MAX_LEN)?;
        check_text_len("category", &self.category, FACET_MAX_LEN)?;
        check_text_len("brand", &self.brand, FACET_MAX_LEN)?;

        for (name, value) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(DomainError::validation(format!(
                        "{} must be a non-negative number",
                        name
                    )));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if max < min {
                return Err(DomainError::validation(
                    "max_price must be greater than or equal to min_price",
                ));
            }
        }

        Ok(())
    }

    fn matches(&self, product: &Product) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = contains_ignore_case(&product.name, &needle)
                || product
                    .description
                    .as_deref()
                    .is_some_and(|d| contains_ignore_case(d, &needle))
                || contains_ignore_case(&product.brand, &needle);

            if !hit {
                return false;
            }
        }

        if self.category.as_ref().is_some_and(|c| *c != product.category) {
            return false;
        }

        if self.brand.as_ref().is_some_and(|b| *b != product.brand) {
            return false;
        }

        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }

        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }

        true
    }

    fn key_params(&self, params: CacheKeyParams) -> CacheKeyParams {
        params
            .with_optional("search", self.search.clone())
            .with_optional("category", self.category.clone())
            .with_optional("brand", self.brand.clone())
            .with_optional("min_price", self.min_price)
            .with_optional("max_price", self.max_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortField {
    Id,
    Name,
    Price,
    Category,
    Brand,
    StockQuantity,
    Rating,
    CreatedAt,
    UpdatedAt,
}

impl SortField for ProductSortField {
    type Record = Product;

    const DEFAULT: Self = Self::Id;

    fn from_name(name: &str) -> Self {
        match name {
            "name" => Self::Name,
            "price" => Self::Price,
            "category" => Self::Category,
            "brand" => Self::Brand,
            "stock_quantity" => Self::StockQuantity,
            "rating" => Self::Rating,
            "created_at" => Self::CreatedAt,
            "updated_at" => Self::UpdatedAt,
            _ => Self::Id,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::Category => "category",
            Self::Brand => "brand",
            Self::StockQuantity => "stock_quantity",
            Self::Rating => "rating",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, Self::Name | Self::Category | Self::Brand)
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Name => a.name.cmp(&b.name),
            Self::Price => compare_f64(a.price, b.price),
            Self::Category => a.category.cmp(&b.category),
            Self::Brand => a.brand.cmp(&b.brand),
            Self::StockQuantity => a.stock_quantity.cmp(&b.stock_quantity),
            Self::Rating => compare_nullable_f64(a.rating, b.rating),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

pub type ProductQuery = ListQuery<ProductFilter, ProductSortField>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::query::{PageRequest, Sort, SortOrder};
    use crate::domain::cache::{CacheKeyGenerator, QueryKeyEncoder};

    fn product(id: i64, name: &str, price: f64) -> Product {
        let now = Utc::now();
        Product {
            id,
            name: name.to_string(),
            description: Some("A sturdy widget".to_string()),
            price,
            category: "Electronics".to_string(),
            brand: "Sony".to_string(),
            stock_quantity: 10,
            rating: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_unknown_sort_field_falls_back_to_id() {
        assert_eq!(ProductSortField::from_name("price"), ProductSortField::Price);
        assert_eq!(ProductSortField::from_name("__class__"), ProductSortField::Id);
        assert_eq!(ProductSortField::from_name("PRICE"), ProductSortField::Id);
    }

    #[test]
    fn test_inverted_price_range_rejected() {
        let filter = ProductFilter::default().with_price_range(Some(500.0), Some(100.0));
        assert!(filter.validate().unwrap_err().is_caller_error());

        let equal = ProductFilter::default().with_price_range(Some(100.0), Some(100.0));
        assert!(equal.validate().is_ok());
    }

    #[test]
    fn test_negative_or_nan_price_rejected() {
        assert!(ProductFilter::default()
            .with_price_range(Some(-1.0), None)
            .validate()
            .is_err());
        assert!(ProductFilter::default()
            .with_price_range(None, Some(f64::NAN))
            .validate()
            .is_err());
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let item = product(1, "Walkman", 99.0);

        assert!(ProductFilter::default().with_search("WALK").matches(&item));
        assert!(ProductFilter::default().with_search("sturdy").matches(&item));
        assert!(ProductFilter::default().with_search("sOnY").matches(&item));
        assert!(!ProductFilter::default().with_search("toaster").matches(&item));
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let filter = ProductFilter::default().with_price_range(Some(100.0), Some(500.0));

        assert!(filter.matches(&product(1, "a", 100.0)));
        assert!(filter.matches(&product(2, "b", 500.0)));
        assert!(!filter.matches(&product(3, "c", 99.99)));
        assert!(!filter.matches(&product(4, "d", 500.01)));
    }

    #[test]
    fn test_query_compare_breaks_ties_by_id() {
        let sort = Sort::new(ProductSortField::Price, SortOrder::Desc);
        let query =
            ProductQuery::new(PageRequest::default(), ProductFilter::default(), sort).unwrap();

        let mut items = vec![product(3, "c", 10.0), product(1, "a", 10.0), product(2, "b", 20.0)];
        items.sort_by(|a, b| query.compare(a, b));

        let ids: Vec<i64> = items.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_absent_filter_produces_same_key() {
        let encoder = QueryKeyEncoder::new();
        let plain = ProductQuery::new(
            PageRequest::default(),
            ProductFilter::default(),
            Sort::default(),
        )
        .unwrap();
        let explicit_none = ProductQuery::new(
            PageRequest::default(),
            ProductFilter {
                search: None,
                category: None,
                ..Default::default()
            },
            Sort::default(),
        )
        .unwrap();
        let filtered = ProductQuery::new(
            PageRequest::default(),
            ProductFilter::default().with_category("Books"),
            Sort::default(),
        )
        .unwrap();

        let a = encoder.generate(&plain.key_params("products"));
        let b = encoder.generate(&explicit_none.key_params("products"));
        let c = encoder.generate(&filtered.key_params("products"));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
