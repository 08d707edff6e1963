//! Synthetic catalog records

use chrono::{DateTime, Duration, Utc};
use fake::faker::address::raw::{BuildingNumber, CityName, CountryName, StreetName};
use fake::faker::company::raw::CatchPhrase;
use fake::faker::internet::raw::FreeEmailProvider;
use fake::faker::lorem::raw::Paragraph;
use fake::faker::name::raw::{FirstName, LastName};
use fake::faker::phone_number::raw::PhoneNumber;
use fake::locales::EN;
use fake::Fake;
use rand::Rng;

use crate::domain::catalog::{round2, NewOrder, NewProduct, NewUser, OrderStatus};

pub const CATEGORIES: [&str; 8] = [
    "Electronics",
    "Clothing",
    "Home & Garden",
    "Sports",
    "Books",
    "Toys",
    "Health",
    "Automotive",
];

pub const BRANDS: [&str; 10] = [
    "Apple", "Samsung", "Nike", "Adidas", "Sony", "LG", "Dell", "HP", "Canon", "Microsoft",
];

const DESCRIPTION_MAX_CHARS: usize = 500;
const ACTIVE_PROBABILITY: f64 = 0.75;
const CATALOG_HISTORY_DAYS: i64 = 730;
const ORDER_HISTORY_DAYS: i64 = 365;

fn pick<'a, R: Rng>(rng: &mut R, values: &[&'a str]) -> &'a str {
    values[rng.gen_range(0..values.len())]
}

/// Uniform instant in `[now - days, now]`
fn within_last_days<R: Rng>(rng: &mut R, now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::seconds(rng.gen_range(0..=days * 86_400))
}

fn truncate_chars(value: String, max: usize) -> String {
    if value.chars().count() <= max {
        value
    } else {
        value.chars().take(max).collect()
    }
}

pub fn product<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> NewProduct {
    let name: String = CatchPhrase(EN).fake_with_rng(rng);
    let description: String = Paragraph(EN, 2..6).fake_with_rng(rng);

    NewProduct {
        name,
        description: Some(truncate_chars(description, DESCRIPTION_MAX_CHARS)),
        price: round2(rng.gen_range(10.0..=2000.0)),
        category: pick(rng, &CATEGORIES).to_string(),
        brand: pick(rng, &BRANDS).to_string(),
        stock_quantity: rng.gen_range(0..=1000),
        rating: Some((rng.gen_range(1.0..=5.0_f64) * 10.0).round() / 10.0),
        is_active: rng.gen_bool(ACTIVE_PROBABILITY),
        created_at: within_last_days(rng, now, CATALOG_HISTORY_DAYS),
    }
}

/// Builds a user; `serial` keeps the generated email unique within a run
pub fn user<R: Rng>(rng: &mut R, now: DateTime<Utc>, serial: &str) -> NewUser {
    let first_name: String = FirstName(EN).fake_with_rng(rng);
    let last_name: String = LastName(EN).fake_with_rng(rng);
    let provider: String = FreeEmailProvider(EN).fake_with_rng(rng);

    let local: String = format!("{}.{}", first_name, last_name)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect::<String>()
        .to_lowercase();

    let building: String = BuildingNumber(EN).fake_with_rng(rng);
    let street: String = StreetName(EN).fake_with_rng(rng);

    NewUser {
        email: format!("{}.{}@{}", local, serial, provider),
        first_name,
        last_name,
        phone: Some(truncate_chars(PhoneNumber(EN).fake_with_rng(rng), 35)),
        address: Some(format!("{} {}", building, street)),
        city: truncate_chars(CityName(EN).fake_with_rng(rng), 100),
        country: truncate_chars(CountryName(EN).fake_with_rng(rng), 100),
        is_active: rng.gen_bool(ACTIVE_PROBABILITY),
        created_at: within_last_days(rng, now, CATALOG_HISTORY_DAYS),
    }
}

/// Builds an order against existing ids; both slices must be non-empty
pub fn order<R: Rng>(
    rng: &mut R,
    now: DateTime<Utc>,
    user_ids: &[i64],
    product_ids: &[i64],
) -> NewOrder {
    let user_id = user_ids[rng.gen_range(0..user_ids.len())];
    let product_id = product_ids[rng.gen_range(0..product_ids.len())];
    let quantity = rng.gen_range(1..=5);
    let unit_price = round2(rng.gen_range(10.0..=500.0));
    let status = OrderStatus::ALL[rng.gen_range(0..OrderStatus::ALL.len())];

    NewOrder::priced(
        user_id,
        product_id,
        quantity,
        unit_price,
        status,
        within_last_days(rng, now, ORDER_HISTORY_DAYS),
    )
}
