//! User entity, filters and sort fields

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::{FACET_MAX_LEN, SEARCH_MAX_LEN};
use super::query::{check_text_len, contains_ignore_case, ListFilter, ListQuery, SortField};
use crate::domain::cache::CacheKeyParams;
use crate::domain::DomainError;

/// Stored user row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub country: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: String,
    pub country: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub search: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl UserFilter {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
}

impl ListFilter for UserFilter {
    type Record = User;

    fn validate(&self) -> Result<(), DomainError> {
        check_text_len("search", &self.search, SEARCH_MAX_LEN)?;
        check_text_len("city", &self.city, FACET_MAX_LEN)?;
        check_text_len("country", &self.country, FACET_MAX_LEN)
    }

    fn matches(&self, user: &User) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = contains_ignore_case(&user.first_name, &needle)
                || contains_ignore_case(&user.last_name, &needle)
                || contains_ignore_case(&user.email, &needle);

            if !hit {
                return false;
            }
        }

        if self.city.as_ref().is_some_and(|c| *c != user.city) {
            return false;
        }

        !self.country.as_ref().is_some_and(|c| *c != user.country)
    }

    fn key_params(&self, params: CacheKeyParams) -> CacheKeyParams {
        params
            .with_optional("search", self.search.clone())
            .with_optional("city", self.city.clone())
            .with_optional("country", self.country.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Id,
    Email,
    FirstName,
    LastName,
    City,
    Country,
    CreatedAt,
}

impl SortField for UserSortField {
    type Record = User;

    const DEFAULT: Self = Self::Id;

    fn from_name(name: &str) -> Self {
        match name {
            "email" => Self::Email,
            "first_name" => Self::FirstName,
            "last_name" => Self::LastName,
            "city" => Self::City,
            "country" => Self::Country,
            "created_at" => Self::CreatedAt,
            _ => Self::Id,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Email => "email",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::City => "city",
            Self::Country => "country",
            Self::CreatedAt => "created_at",
        }
    }

    fn is_text(&self) -> bool {
        matches!(
            self,
            Self::Email | Self::FirstName | Self::LastName | Self::City | Self::Country
        )
    }

    fn compare(&self, a: &User, b: &User) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Email => a.email.cmp(&b.email),
            Self::FirstName => a.first_name.cmp(&b.first_name),
            Self::LastName => a.last_name.cmp(&b.last_name),
            Self::City => a.city.cmp(&b.city),
            Self::Country => a.country.cmp(&b.country),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

pub type UserQuery = ListQuery<UserFilter, UserSortField>;
