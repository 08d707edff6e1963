//! Catalog domain - products, users and orders

mod order;
mod product;
pub mod query;
mod repository;
mod user;
mod view;

pub use order::{
    round2, NewOrder, Order, OrderFilter, OrderQuery, OrderRecord, OrderSortField, OrderStatus,
};
pub use product::{NewProduct, Product, ProductFilter, ProductQuery, ProductSortField};
pub use query::{
    ListFilter, ListQuery, Listing, Page, PageRequest, Sort, SortField, SortOrder,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use repository::{
    DatasetRepository, DatasetStats, DeletedCounts, OrderRepository, ProductRepository,
    UserRepository,
};
pub use user::{NewUser, User, UserFilter, UserQuery, UserSortField};
pub use view::{format_timestamp, OrderView, ProductView, UserView};

#[cfg(test)]
pub use repository::{
    MockDatasetRepository, MockOrderRepository, MockProductRepository, MockUserRepository,
};
