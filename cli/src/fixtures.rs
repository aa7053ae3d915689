//! Demo wallet and product catalog.

use monieking_common::{Currency, Money, ProductId};
use monieking_ledger::{Catalog, Product};
use rust_decimal::Decimal;

/// Owner of the demo wallet.
pub const DEMO_OWNER: &str = "Wisdom Okechukwu";

/// Opening balances of the demo wallet.
pub fn demo_balances() -> Vec<Money> {
    vec![
        Money::new(Decimal::new(125000, 2), Currency::usd()),
        Money::new(Decimal::new(64000, 2), Currency::eur()),
        Money::new(Decimal::new(32050, 2), Currency::gbp()),
        Money::new(Decimal::new(580000, 0), Currency::ngn()),
    ]
}

fn product(id: u32, name: &str, brand: &str, price: i64, category: &str, in_stock: bool) -> Product {
    Product {
        id: ProductId(id),
        name: name.to_string(),
        brand: brand.to_string(),
        price: Money::new(Decimal::new(price, 0), Currency::usd()),
        category: category.to_string(),
        in_stock,
    }
}

/// The demo storefront. Prices are in USD.
pub fn demo_catalog() -> Catalog {
    Catalog::new([
        product(1, "iPhone 15 Pro", "Apple", 999, "Electronics", true),
        product(2, "AirPods Pro", "Apple", 249, "Audio", true),
        product(3, "MacBook Air M2", "Apple", 1199, "Computers", true),
        product(4, "Samsung Galaxy S24", "Samsung", 899, "Electronics", true),
        product(5, "Sony WH-1000XM5", "Sony", 399, "Audio", false),
        product(6, "iPad Pro 12.9", "Apple", 1099, "Tablets", true),
        product(7, "Dell XPS 15", "Dell", 1499, "Computers", true),
        product(8, "Nintendo Switch", "Nintendo", 299, "Gaming", true),
    ])
}
