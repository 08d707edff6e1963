//! In-memory catalog storage
//!
//! Same query semantics as the PostgreSQL backend, evaluated with the
//! domain's filter predicates and sort comparators. Data is lost when the
//! process terminates.

use std::collections::{BTreeMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::catalog::{
    DatasetRepository, DatasetStats, DeletedCounts, ListFilter, ListQuery, Listing, NewOrder,
    NewProduct, NewUser, Order, OrderQuery, OrderRecord, OrderRepository, Product, ProductQuery,
    ProductRepository, SortField, User, UserQuery, UserRepository,
};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<i64, Product>,
    users: BTreeMap<i64, User>,
    orders: BTreeMap<i64, Order>,
    next_product_id: i64,
    next_user_id: i64,
    next_order_id: i64,
}

impl Tables {
    fn expand(&self, order: &Order) -> OrderRecord {
        OrderRecord {
            order: order.clone(),
            user: self.users.get(&order.user_id).cloned(),
            product: self.products.get(&order.product_id).cloned(),
        }
    }
}

/// Filters, orders and windows a record set the way the SQL backend does
fn run_query<'a, F, S>(
    records: impl Iterator<Item = &'a F::Record>,
    query: &ListQuery<F, S>,
) -> Listing<&'a F::Record>
where
    F: ListFilter,
    F::Record: 'a,
    S: SortField<Record = F::Record>,
{
    let mut matching: Vec<&F::Record> = records.filter(|r| query.filter.matches(r)).collect();
    let total = matching.len() as u64;

    matching.sort_by(|a, b| query.compare(a, b));

    let items = matching
        .into_iter()
        .skip(query.page.skip() as usize)
        .take(query.page.limit() as usize)
        .collect();

    Listing::new(items, total)
}

/// Thread-safe in-memory catalog implementing every catalog repository
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    tables: RwLock<Tables>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, DomainError> {
        self.tables
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, DomainError> {
        self.tables
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Removes a single user, leaving their orders pointing at nothing
    pub fn remove_user(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.write()?.users.remove(&id).is_some())
    }

    /// Removes a single product, leaving its orders pointing at nothing
    pub fn remove_product(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.write()?.products.remove(&id).is_some())
    }
}

#[async_trait]
impl ProductRepository for InMemoryCatalog {
    async fn list(&self, query: &ProductQuery) -> Result<Listing<Product>, DomainError> {
        let tables = self.read()?;
        let listing = run_query(tables.products.values(), query);

        Ok(Listing::new(
            listing.items.into_iter().cloned().collect(),
            listing.total,
        ))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError> {
        Ok(self.read()?.products.get(&id).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryCatalog {
    async fn list(&self, query: &UserQuery) -> Result<Listing<User>, DomainError> {
        let tables = self.read()?;
        let listing = run_query(tables.users.values(), query);

        Ok(Listing::new(
            listing.items.into_iter().cloned().collect(),
            listing.total,
        ))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        Ok(self.read()?.users.get(&id).cloned())
    }
}

#[async_trait]
impl OrderRepository for InMemoryCatalog {
    async fn list(&self, query: &OrderQuery) -> Result<Listing<OrderRecord>, DomainError> {
        let tables = self.read()?;
        let listing = run_query(tables.orders.values(), query);

        Ok(Listing::new(
            listing.items.into_iter().map(|o| tables.expand(o)).collect(),
            listing.total,
        ))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<OrderRecord>, DomainError> {
        let tables = self.read()?;
        Ok(tables.orders.get(&id).map(|o| tables.expand(o)))
    }
}

#[async_trait]
impl DatasetRepository for InMemoryCatalog {
    async fn stats(&self) -> Result<DatasetStats, DomainError> {
        let tables = self.read()?;

        Ok(DatasetStats {
            total_products: tables.products.len() as u64,
            total_users: tables.users.len() as u64,
            total_orders: tables.orders.len() as u64,
            active_products: tables.products.values().filter(|p| p.is_active).count() as u64,
            active_users: tables.users.values().filter(|u| u.is_active).count() as u64,
        })
    }

    async fn truncate_all(&self) -> Result<DeletedCounts, DomainError> {
        let mut tables = self.write()?;

        let counts = DeletedCounts {
            orders: tables.orders.len() as u64,
            users: tables.users.len() as u64,
            products: tables.products.len() as u64,
        };

        tables.orders.clear();
        tables.users.clear();
        tables.products.clear();

        Ok(counts)
    }

    async fn insert_products(&self, batch: Vec<NewProduct>) -> Result<u64, DomainError> {
        let mut tables = self.write()?;
        let count = batch.len() as u64;

        for p in batch {
            tables.next_product_id += 1;
            let id = tables.next_product_id;

            tables.products.insert(
                id,
                Product {
                    id,
                    name: p.name,
                    description: p.description,
                    price: p.price,
                    category: p.category,
                    brand: p.brand,
                    stock_quantity: p.stock_quantity,
                    rating: p.rating,
                    is_active: p.is_active,
                    created_at: p.created_at,
                    updated_at: p.created_at,
                },
            );
        }

        Ok(count)
    }

    async fn insert_users(&self, batch: Vec<NewUser>) -> Result<u64, DomainError> {
        let mut tables = self.write()?;
        let mut emails: HashSet<String> = tables.users.values().map(|u| u.email.clone()).collect();
        let mut inserted = 0;

        for u in batch {
            // Unique email; duplicates are skipped like the SQL backend does
            if !emails.insert(u.email.clone()) {
                continue;
            }

            tables.next_user_id += 1;
            let id = tables.next_user_id;

            tables.users.insert(
                id,
                User {
                    id,
                    email: u.email,
                    first_name: u.first_name,
                    last_name: u.last_name,
                    phone: u.phone,
                    address: u.address,
                    city: u.city,
                    country: u.country,
                    is_active: u.is_active,
                    created_at: u.created_at,
                },
            );
            inserted += 1;
        }

        Ok(inserted)
    }

    async fn insert_orders(&self, batch: Vec<NewOrder>) -> Result<u64, DomainError> {
        if batch.iter().any(|o| o.quantity < 1) {
            return Err(DomainError::storage("Order quantity must be positive"));
        }

        let mut tables = self.write()?;
        let count = batch.len() as u64;

        for o in batch {
            tables.next_order_id += 1;
            let id = tables.next_order_id;

            tables.orders.insert(
                id,
                Order {
                    id,
                    user_id: o.user_id,
                    product_id: o.product_id,
                    quantity: o.quantity,
                    unit_price: o.unit_price,
                    total_amount: o.total_amount,
                    status: o.status,
                    order_date: o.order_date,
                },
            );
        }

        Ok(count)
    }

    async fn product_ids(&self) -> Result<Vec<i64>, DomainError> {
        Ok(self.read()?.products.keys().copied().collect())
    }

    async fn user_ids(&self) -> Result<Vec<i64>, DomainError> {
        Ok(self.read()?.users.keys().copied().collect())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.read().map(|_| ())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::domain::catalog::{
        OrderFilter, OrderSortField, PageRequest, ProductFilter, ProductSortField, Sort, SortOrder,
        UserFilter,
    };

    fn product_query(filter: ProductFilter, sort: Sort<ProductSortField>, page: u32, size: u32) -> ProductQuery {
        ProductQuery::new(PageRequest::new(page, size).unwrap(), filter, sort).unwrap()
    }

    #[tokio::test]
    async fn test_filtered_price_range_scenario() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_products(product_grid(120)).await.unwrap();

        let filter = ProductFilter::default()
            .with_category("Electronics")
            .with_price_range(Some(100.0), Some(500.0));
        let query = product_query(
            filter.clone(),
            Sort::new(ProductSortField::Price, SortOrder::Desc),
            1,
            10,
        );

        let listing = ProductRepository::list(&catalog, &query).await.unwrap();

        assert!(listing.items.len() <= 10);
        for p in &listing.items {
            assert_eq!(p.category, "Electronics");
            assert!((100.0..=500.0).contains(&p.price));
        }
        for pair in listing.items.windows(2) {
            assert!(pair[0].price >= pair[1].price);
        }

        let everything = product_query(ProductFilter::default(), Sort::default(), 1, 1000);
        let all = ProductRepository::list(&catalog, &everything).await.unwrap();
        let expected = all.items.iter().filter(|p| filter.matches(p)).count() as u64;
        assert_eq!(listing.total, expected);
    }

    #[tokio::test]
    async fn test_pages_cover_every_row_once() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_products(product_grid(47)).await.unwrap();

        // Many equal categories force the id tie-break
        let sort = Sort::new(ProductSortField::Category, SortOrder::Asc);
        let mut seen = Vec::new();
        let mut page = 1;

        loop {
            let query = product_query(ProductFilter::default(), sort, page, 10);
            let listing = ProductRepository::list(&catalog, &query).await.unwrap();
            if listing.items.is_empty() {
                break;
            }
            seen.extend(listing.items.iter().map(|p| p.id));
            page += 1;
        }

        assert_eq!(page - 1, 5);
        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(seen.len(), 47);
        assert_eq!(unique.len(), 47);
    }

    #[tokio::test]
    async fn test_page_past_end_is_empty_with_total() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_products(product_grid(25)).await.unwrap();

        let query = product_query(ProductFilter::default(), Sort::default(), 9, 10);
        let listing = ProductRepository::list(&catalog, &query).await.unwrap();

        assert!(listing.items.is_empty());
        assert_eq!(listing.total, 25);
    }

    #[tokio::test]
    async fn test_order_with_deleted_user_expands_to_none() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_products(vec![new_product("Lamp", "Home & Garden", "LG", 30.0)])
            .await
            .unwrap();
        catalog.insert_users(vec![new_user(1)]).await.unwrap();
        catalog.insert_orders(vec![new_order(1, 1, 2, 30.0)]).await.unwrap();

        assert!(catalog.remove_user(1).unwrap());

        let record = OrderRepository::find_by_id(&catalog, 1).await.unwrap().unwrap();
        assert!(record.user.is_none());
        assert_eq!(record.product.unwrap().name, "Lamp");
        assert_eq!(record.order.total_amount, 60.0);
    }

    #[tokio::test]
    async fn test_order_filters_and_sort() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_orders(vec![
                new_order(1, 1, 1, 10.0),
                new_order(2, 1, 3, 10.0),
                new_order(1, 2, 2, 10.0),
            ])
            .await
            .unwrap();

        let query = OrderQuery::new(
            PageRequest::default(),
            OrderFilter::default().with_user_id(1),
            Sort::new(OrderSortField::TotalAmount, SortOrder::Desc),
        )
        .unwrap();

        let listing = OrderRepository::list(&catalog, &query).await.unwrap();
        let totals: Vec<f64> = listing.items.iter().map(|r| r.order.total_amount).collect();

        assert_eq!(listing.total, 2);
        assert_eq!(totals, vec![20.0, 10.0]);
    }

    #[tokio::test]
    async fn test_user_search_and_duplicate_emails() {
        let catalog = InMemoryCatalog::new();
        let inserted = catalog
            .insert_users(vec![new_user(1), new_user(2), new_user(1)])
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let query = UserQuery::new(
            PageRequest::default(),
            UserFilter::default().with_search("USER2@"),
            Sort::default(),
        )
        .unwrap();

        let listing = UserRepository::list(&catalog, &query).await.unwrap();
        assert_eq!(listing.total, 1);
        assert_eq!(listing.items[0].first_name, "First2");
    }

    #[tokio::test]
    async fn test_truncate_counts_and_empties() {
        let catalog = InMemoryCatalog::new();
        catalog.insert_products(product_grid(5)).await.unwrap();
        catalog
            .insert_users(vec![new_user(1), new_user(2)])
            .await
            .unwrap();
        catalog
            .insert_orders(vec![
                new_order(1, 1, 1, 5.0),
                new_order(2, 2, 1, 5.0),
                new_order(1, 3, 1, 5.0),
            ])
            .await
            .unwrap();

        let counts = catalog.truncate_all().await.unwrap();
        assert_eq!(
            counts,
            DeletedCounts {
                orders: 3,
                users: 2,
                products: 5
            }
        );

        let stats = catalog.stats().await.unwrap();
        assert_eq!(stats, DatasetStats::default());
    }

    #[tokio::test]
    async fn test_stats_counts_active() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_users((1..=8).map(new_user).collect())
            .await
            .unwrap();

        let stats = catalog.stats().await.unwrap();
        assert_eq!(stats.total_users, 8);
        assert_eq!(stats.active_users, 6);
    }
}
