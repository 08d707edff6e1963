//! List query parameters, sorting and pagination arithmetic

use std::cmp::Ordering;
use std::fmt::Debug;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::cache::CacheKeyParams;
use crate::domain::DomainError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Applies the direction to an ascending comparison
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(DomainError::validation(
                "sort_order must be either 'asc' or 'desc'",
            )),
        }
    }
}

/// Closed allow-list of sortable fields for one entity
///
/// Each variant maps to a storage column and to an in-memory comparator.
/// Names outside the list resolve to [`SortField::DEFAULT`], the identity field.
pub trait SortField: Copy + Debug + PartialEq + Send + Sync + 'static {
    type Record;

    /// Identity field, used for unknown names and as the tie-breaker
    const DEFAULT: Self;

    /// Resolves a field name, falling back to the identity field
    fn from_name(name: &str) -> Self;

    /// Canonical field name
    fn as_str(&self) -> &'static str;

    /// Storage column backing this field
    fn column(&self) -> &'static str {
        self.as_str()
    }

    /// Text columns; storage orders them bytewise to agree with `compare`
    fn is_text(&self) -> bool {
        false
    }

    /// Ascending comparison of two records on this field
    fn compare(&self, a: &Self::Record, b: &Self::Record) -> Ordering;
}

/// Field and direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sort<S: SortField> {
    pub field: S,
    pub order: SortOrder,
}

impl<S: SortField> Default for Sort<S> {
    fn default() -> Self {
        Self {
            field: S::DEFAULT,
            order: SortOrder::Asc,
        }
    }
}

impl<S: SortField> Sort<S> {
    pub fn new(field: S, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Parses an optional field name and direction.
    ///
    /// An unknown field falls back to the identity field; an unknown
    /// direction is a caller error.
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Result<Self, DomainError> {
        let field = sort_by.map(S::from_name).unwrap_or(S::DEFAULT);
        let order = match sort_order {
            Some(raw) => raw.parse()?,
            None => SortOrder::default(),
        };

        Ok(Self { field, order })
    }
}

/// Validated page number and size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Result<Self, DomainError> {
        if page < 1 {
            return Err(DomainError::validation("Page must be greater than 0"));
        }

        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(DomainError::validation(format!(
                "Size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(Self { page, size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Rows to skip: `(page - 1) * size`
    pub fn skip(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }

    /// Rows to return
    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

/// Rows matching a query plus the pre-pagination match count
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

/// Paginated result as returned to callers.
///
/// `page` is echoed from the request. A page past the end is a valid empty
/// result; comparing `page` with `pages` is left to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page(),
            size: request.size(),
            pages: page_count(total, request.size()),
        }
    }

    pub fn from_listing<R>(listing: Listing<R>, request: PageRequest, f: impl FnMut(R) -> T) -> Self {
        let items = listing.items.into_iter().map(f).collect();
        Self::new(items, listing.total, request)
    }
}

/// `ceil(total / size)`
pub fn page_count(total: u64, size: u32) -> u64 {
    if size == 0 {
        return 0;
    }

    total.div_ceil(u64::from(size))
}

/// Entity-specific filter set
pub trait ListFilter: Debug + Clone + Default + Send + Sync + 'static {
    type Record;

    /// Rejects inconsistent filter values before any storage or cache work
    fn validate(&self) -> Result<(), DomainError>;

    /// Whether a record satisfies every present predicate
    fn matches(&self, record: &Self::Record) -> bool;

    /// Adds the present filter values to a cache key
    fn key_params(&self, params: CacheKeyParams) -> CacheKeyParams;
}

/// A complete, validated list request for one entity
#[derive(Debug, Clone)]
pub struct ListQuery<F, S>
where
    F: ListFilter,
    S: SortField<Record = F::Record>,
{
    pub page: PageRequest,
    pub filter: F,
    pub sort: Sort<S>,
}

impl<F, S> ListQuery<F, S>
where
    F: ListFilter,
    S: SortField<Record = F::Record>,
{
    pub fn new(page: PageRequest, filter: F, sort: Sort<S>) -> Result<Self, DomainError> {
        filter.validate()?;
        Ok(Self { page, filter, sort })
    }

    /// Cache key parameters identifying this request on `endpoint`
    pub fn key_params(&self, endpoint: &str) -> CacheKeyParams {
        let params = CacheKeyParams::new(endpoint)
            .with_component("page", self.page.page())
            .with_component("size", self.page.size())
            .with_component("sort_by", self.sort.field.as_str())
            .with_component("sort_order", self.sort.order.as_str());

        self.filter.key_params(params)
    }

    /// Full ordering used by the engine: requested field, then identity ascending
    pub fn compare(&self, a: &F::Record, b: &F::Record) -> Ordering {
        self.sort
            .order
            .apply(self.sort.field.compare(a, b))
            .then_with(|| S::DEFAULT.compare(a, b))
    }
}

/// Case-insensitive substring test used by the free-text search filters
pub fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Total order on floats for sorting; NaN compares equal
pub fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Ascending order with absent values last, matching SQL `NULLS LAST`
pub fn compare_nullable_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_f64(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Checks an optional text filter against a maximum length
pub fn check_text_len(name: &str, value: &Option<String>, max: usize) -> Result<(), DomainError> {
    match value {
        Some(v) if v.chars().count() > max => Err(DomainError::validation(format!(
            "{} must be at most {} characters",
            name, max
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("up".parse::<SortOrder>().is_err());
        assert!("".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, MAX_PAGE_SIZE + 1).is_err());
        assert!(PageRequest::new(1, MAX_PAGE_SIZE).is_ok());
    }

    #[test]
    fn test_skip_and_limit() {
        let request = PageRequest::new(3, 25).unwrap();
        assert_eq!(request.skip(), 50);
        assert_eq!(request.limit(), 25);

        let first = PageRequest::new(1, 25).unwrap();
        assert_eq!(first.skip(), 0);
    }

    #[test]
    fn test_page_count_is_ceiling() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(100_000, 1000), 100);
        assert_eq!(page_count(100_001, 1000), 101);
    }

    #[test]
    fn test_pagination_law_over_range() {
        for total in 0u64..200 {
            for size in [1u32, 3, 7, 10, 50] {
                let pages = page_count(total, size);
                let mut sum = 0u64;

                for page in 1..=pages {
                    let request = PageRequest::new(page as u32, size).unwrap();
                    let remaining = total.saturating_sub(request.skip());
                    sum += remaining.min(request.limit());
                }

                assert_eq!(sum, total, "total={} size={}", total, size);
            }
        }
    }

    #[test]
    fn test_page_echoes_request() {
        let request = PageRequest::new(9, 10).unwrap();
        let page: Page<u8> = Page::new(vec![], 25, request);

        assert_eq!(page.page, 9);
        assert_eq!(page.size, 10);
        assert_eq!(page.pages, 3);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_nullable_ordering_puts_absent_last() {
        assert_eq!(compare_nullable_f64(Some(1.0), None), Ordering::Less);
        assert_eq!(compare_nullable_f64(None, Some(1.0)), Ordering::Greater);
        assert_eq!(compare_nullable_f64(Some(2.0), Some(1.0)), Ordering::Greater);
    }

    #[test]
    fn test_text_len_check() {
        assert!(check_text_len("search", &None, 3).is_ok());
        assert!(check_text_len("search", &Some("abc".into()), 3).is_ok());
        assert!(check_text_len("search", &Some("abcd".into()), 3).is_err());
    }
}
