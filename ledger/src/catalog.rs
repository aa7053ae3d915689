//! Product catalog for in-wallet purchases.

use std::collections::BTreeMap;

use monieking_common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A purchasable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub price: Money,
    pub category: String,
    pub in_stock: bool,
}

/// Immutable set of products keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: BTreeMap<ProductId, Product>,
}

impl Catalog {
    /// Build a catalog; a later product with a duplicate id replaces the earlier one.
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Products currently in stock.
    pub fn available(&self) -> impl Iterator<Item = &Product> {
        self.products.values().filter(|p| p.in_stock)
    }

    /// Products in a category, case-insensitive.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> + 'a {
        self.products
            .values()
            .filter(move |p| p.category.eq_ignore_ascii_case(category))
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.products.values().map(|p| p.category.as_str()).collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }
}
