//! PostgreSQL catalog storage with connection pooling

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};

use crate::config::StorageConfig;
use crate::domain::catalog::{
    DatasetRepository, DatasetStats, DeletedCounts, Listing, NewOrder, NewProduct, NewUser, Order,
    OrderFilter, OrderQuery, OrderRecord, OrderRepository, OrderSortField, OrderStatus, Product,
    ProductFilter, ProductQuery, ProductRepository, ProductSortField, SortField, User, UserFilter,
    UserQuery, UserRepository, UserSortField,
};
use crate::domain::DomainError;

/// PostgreSQL pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Bound on waiting for a pooled connection; exceeding it is a retryable failure
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl From<&StorageConfig> for PostgresConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            acquire_timeout_secs: config.acquire_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

/// Opens a connection pool
pub async fn connect_pool(config: &PostgresConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
}

/// Maps a sqlx error, keeping pool exhaustion distinguishable as retryable
pub fn map_sqlx_error(context: &str, e: sqlx::Error) -> DomainError {
    match e {
        sqlx::Error::PoolTimedOut => {
            DomainError::unavailable(format!("{}: timed out acquiring a connection", context))
        }
        sqlx::Error::PoolClosed => {
            DomainError::unavailable(format!("{}: connection pool is closed", context))
        }
        other => DomainError::storage(format!("{}: {}", context, other)),
    }
}

/// Escapes `LIKE` wildcards so user input only matches literally
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');

    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped.push('%');
    escaped
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, brand, stock_quantity, \
                               rating, is_active, created_at, updated_at";

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, phone, address, city, country, is_active, created_at";

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.user_id, o.product_id, o.quantity, o.unit_price, o.total_amount,
           o.status, o.order_date,
           u.id AS u_id, u.email AS u_email, u.first_name AS u_first_name,
           u.last_name AS u_last_name, u.phone AS u_phone, u.address AS u_address,
           u.city AS u_city, u.country AS u_country, u.is_active AS u_is_active,
           u.created_at AS u_created_at,
           p.id AS p_id, p.name AS p_name, p.description AS p_description,
           p.price AS p_price, p.category AS p_category, p.brand AS p_brand,
           p.stock_quantity AS p_stock_quantity, p.rating AS p_rating,
           p.is_active AS p_is_active, p.created_at AS p_created_at,
           p.updated_at AS p_updated_at
    FROM orders o
    LEFT JOIN users u ON u.id = o.user_id
    LEFT JOIN products p ON p.id = o.product_id
"#;

fn push_product_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR brand ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }

    if let Some(brand) = &filter.brand {
        qb.push(" AND brand = ").push_bind(brand.clone());
    }

    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }

    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(city) = &filter.city {
        qb.push(" AND city = ").push_bind(city.clone());
    }

    if let Some(country) = &filter.country {
        qb.push(" AND country = ").push_bind(country.clone());
    }
}

fn push_order_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    if let Some(user_id) = filter.user_id {
        qb.push(" AND o.user_id = ").push_bind(user_id);
    }

    if let Some(status) = filter.status {
        qb.push(" AND o.status = ").push_bind(status.as_str());
    }
}

/// Appends `ORDER BY <column> <dir>, <identity> ASC LIMIT .. OFFSET ..`
///
/// Text columns use the `C` collation so pages match the in-memory backend.
fn push_window<S: SortField>(
    qb: &mut QueryBuilder<'_, Postgres>,
    table_alias: &str,
    field: S,
    order_sql: &str,
    skip: u64,
    limit: u64,
) {
    qb.push(format_args!(
        " ORDER BY {alias}{col}{collate} {dir}, {alias}{id} ASC",
        alias = table_alias,
        col = field.column(),
        collate = if field.is_text() { " COLLATE \"C\"" } else { "" },
        dir = order_sql,
        id = S::DEFAULT.column(),
    ));
    qb.push(" LIMIT ").push_bind(limit as i64);
    qb.push(" OFFSET ").push_bind(skip as i64);
}

fn row_to_product(row: &PgRow, prefix: &str) -> Result<Product, sqlx::Error> {
    let col = |name: &str| format!("{}{}", prefix, name);

    Ok(Product {
        id: row.try_get(col("id").as_str())?,
        name: row.try_get(col("name").as_str())?,
        description: row.try_get(col("description").as_str())?,
        price: row.try_get(col("price").as_str())?,
        category: row.try_get(col("category").as_str())?,
        brand: row.try_get(col("brand").as_str())?,
        stock_quantity: row.try_get(col("stock_quantity").as_str())?,
        rating: row.try_get(col("rating").as_str())?,
        is_active: row.try_get(col("is_active").as_str())?,
        created_at: row.try_get(col("created_at").as_str())?,
        updated_at: row.try_get(col("updated_at").as_str())?,
    })
}

fn row_to_user(row: &PgRow, prefix: &str) -> Result<User, sqlx::Error> {
    let col = |name: &str| format!("{}{}", prefix, name);

    Ok(User {
        id: row.try_get(col("id").as_str())?,
        email: row.try_get(col("email").as_str())?,
        first_name: row.try_get(col("first_name").as_str())?,
        last_name: row.try_get(col("last_name").as_str())?,
        phone: row.try_get(col("phone").as_str())?,
        address: row.try_get(col("address").as_str())?,
        city: row.try_get(col("city").as_str())?,
        country: row.try_get(col("country").as_str())?,
        is_active: row.try_get(col("is_active").as_str())?,
        created_at: row.try_get(col("created_at").as_str())?,
    })
}

fn row_to_order_record(row: &PgRow) -> Result<OrderRecord, DomainError> {
    let decode = |e: sqlx::Error| map_sqlx_error("Failed to decode order row", e);

    let status: String = row.try_get("status").map_err(decode)?;
    let order = Order {
        id: row.try_get("id").map_err(decode)?,
        user_id: row.try_get("user_id").map_err(decode)?,
        product_id: row.try_get("product_id").map_err(decode)?,
        quantity: row.try_get("quantity").map_err(decode)?,
        unit_price: row.try_get("unit_price").map_err(decode)?,
        total_amount: row.try_get("total_amount").map_err(decode)?,
        status: status
            .parse::<OrderStatus>()
            .map_err(|_| DomainError::storage(format!("Unknown order status '{}'", status)))?,
        order_date: row.try_get("order_date").map_err(decode)?,
    };

    let user_id: Option<i64> = row.try_get("u_id").map_err(decode)?;
    let user = match user_id {
        Some(_) => Some(row_to_user(row, "u_").map_err(decode)?),
        None => None,
    };

    let product_id: Option<i64> = row.try_get("p_id").map_err(decode)?;
    let product = match product_id {
        Some(_) => Some(row_to_product(row, "p_").map_err(decode)?),
        None => None,
    };

    Ok(OrderRecord {
        order,
        user,
        product,
    })
}

/// PostgreSQL implementation of the catalog repositories
#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn count(&self, mut qb: QueryBuilder<'_, Postgres>, context: &str) -> Result<u64, DomainError> {
        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(context, e))?;

        Ok(total.max(0) as u64)
    }
}

#[async_trait]
impl ProductRepository for PostgresCatalog {
    async fn list(&self, query: &ProductQuery) -> Result<Listing<Product>, DomainError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM products WHERE TRUE");
        push_product_filters(&mut count_qb, &query.filter);
        let total = self.count(count_qb, "Failed to count products").await?;

        let mut qb = QueryBuilder::new(format!("SELECT {} FROM products WHERE TRUE", PRODUCT_COLUMNS));
        push_product_filters(&mut qb, &query.filter);
        push_window::<ProductSortField>(
            &mut qb,
            "",
            query.sort.field,
            query.sort.order.as_sql(),
            query.page.skip(),
            query.page.limit(),
        );

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to list products", e))?;

        let items = rows
            .iter()
            .map(|row| row_to_product(row, ""))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("Failed to decode product row", e))?;

        Ok(Listing::new(items, total))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get product", e))?;

        row.map(|r| row_to_product(&r, ""))
            .transpose()
            .map_err(|e| map_sqlx_error("Failed to decode product row", e))
    }
}

#[async_trait]
impl UserRepository for PostgresCatalog {
    async fn list(&self, query: &UserQuery) -> Result<Listing<User>, DomainError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");
        push_user_filters(&mut count_qb, &query.filter);
        let total = self.count(count_qb, "Failed to count users").await?;

        let mut qb = QueryBuilder::new(format!("SELECT {} FROM users WHERE TRUE", USER_COLUMNS));
        push_user_filters(&mut qb, &query.filter);
        push_window::<UserSortField>(
            &mut qb,
            "",
            query.sort.field,
            query.sort.order.as_sql(),
            query.page.skip(),
            query.page.limit(),
        );

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to list users", e))?;

        let items = rows
            .iter()
            .map(|row| row_to_user(row, ""))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("Failed to decode user row", e))?;

        Ok(Listing::new(items, total))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get user", e))?;

        row.map(|r| row_to_user(&r, ""))
            .transpose()
            .map_err(|e| map_sqlx_error("Failed to decode user row", e))
    }
}

#[async_trait]
impl OrderRepository for PostgresCatalog {
    async fn list(&self, query: &OrderQuery) -> Result<Listing<OrderRecord>, DomainError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM orders o WHERE TRUE");
        push_order_filters(&mut count_qb, &query.filter);
        let total = self.count(count_qb, "Failed to count orders").await?;

        let mut qb = QueryBuilder::new(ORDER_SELECT);
        qb.push(" WHERE TRUE");
        push_order_filters(&mut qb, &query.filter);
        push_window::<OrderSortField>(
            &mut qb,
            "o.",
            query.sort.field,
            query.sort.order.as_sql(),
            query.page.skip(),
            query.page.limit(),
        );

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to list orders", e))?;

        let items = rows
            .iter()
            .map(row_to_order_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Listing::new(items, total))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<OrderRecord>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE o.id = $1", ORDER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get order", e))?;

        row.as_ref().map(row_to_order_record).transpose()
    }
}

#[async_trait]
impl DatasetRepository for PostgresCatalog {
    async fn stats(&self) -> Result<DatasetStats, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products) AS total_products,
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COUNT(*) FROM products WHERE is_active) AS active_products,
                (SELECT COUNT(*) FROM users WHERE is_active) AS active_users
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to compute stats", e))?;

        let get = |name: &str| -> Result<u64, DomainError> {
            let value: i64 = row
                .try_get(name)
                .map_err(|e| map_sqlx_error("Failed to decode stats", e))?;
            Ok(value.max(0) as u64)
        };

        Ok(DatasetStats {
            total_products: get("total_products")?,
            total_users: get("total_users")?,
            total_orders: get("total_orders")?,
            active_products: get("active_products")?,
            active_users: get("active_users")?,
        })
    }

    async fn truncate_all(&self) -> Result<DeletedCounts, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to begin truncate", e))?;

        // Orders first, then the rows they reference
        let orders = sqlx::query("DELETE FROM orders")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete orders", e))?
            .rows_affected();

        let users = sqlx::query("DELETE FROM users")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete users", e))?
            .rows_affected();

        let products = sqlx::query("DELETE FROM products")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete products", e))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit truncate", e))?;

        Ok(DeletedCounts {
            orders,
            users,
            products,
        })
    }

    async fn insert_products(&self, batch: Vec<NewProduct>) -> Result<u64, DomainError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::new(
            "INSERT INTO products (name, description, price, category, brand, stock_quantity, \
             rating, is_active, created_at, updated_at) ",
        );
        qb.push_values(batch, |mut b, p| {
            b.push_bind(p.name)
                .push_bind(p.description)
                .push_bind(p.price)
                .push_bind(p.category)
                .push_bind(p.brand)
                .push_bind(p.stock_quantity)
                .push_bind(p.rating)
                .push_bind(p.is_active)
                .push_bind(p.created_at)
                .push_bind(p.created_at);
        });

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to insert products", e))?;

        Ok(result.rows_affected())
    }

    async fn insert_users(&self, batch: Vec<NewUser>) -> Result<u64, DomainError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::new(
            "INSERT INTO users (email, first_name, last_name, phone, address, city, country, \
             is_active, created_at, updated_at) ",
        );
        qb.push_values(batch, |mut b, u| {
            b.push_bind(u.email)
                .push_bind(u.first_name)
                .push_bind(u.last_name)
                .push_bind(u.phone)
                .push_bind(u.address)
                .push_bind(u.city)
                .push_bind(u.country)
                .push_bind(u.is_active)
                .push_bind(u.created_at)
                .push_bind(u.created_at);
        });
        // Duplicate emails from a reseed are skipped rather than failing the batch
        qb.push(" ON CONFLICT (email) DO NOTHING");

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to insert users", e))?;

        Ok(result.rows_affected())
    }

    async fn insert_orders(&self, batch: Vec<NewOrder>) -> Result<u64, DomainError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::new(
            "INSERT INTO orders (user_id, product_id, quantity, unit_price, total_amount, \
             status, order_date) ",
        );
        qb.push_values(batch, |mut b, o| {
            b.push_bind(o.user_id)
                .push_bind(o.product_id)
                .push_bind(o.quantity)
                .push_bind(o.unit_price)
                .push_bind(o.total_amount)
                .push_bind(o.status.as_str())
                .push_bind(o.order_date);
        });

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to insert orders", e))?;

        Ok(result.rows_affected())
    }

    async fn product_ids(&self) -> Result<Vec<i64>, DomainError> {
        sqlx::query_scalar("SELECT id FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to load product ids", e))
    }

    async fn user_ids(&self) -> Result<Vec<i64>, DomainError> {
        sqlx::query_scalar("SELECT id FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to load user ids", e))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Storage ping failed", e))?;

        Ok(())
    }
}
