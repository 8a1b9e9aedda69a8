//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::value_objects::{Name, Price, Quantity};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub merchant_id: i64,
    pub name: Name,
    pub description: Option<String>,
    pub img_url: Option<String>,
    pub inventory: Quantity,
    pub price: Price,
    pub active: bool,
    pub categories: BTreeSet<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated attributes for a product that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProduct {
    pub merchant_id: i64,
    pub name: Name,
    pub description: Option<String>,
    pub img_url: Option<String>,
    pub inventory: Quantity,
    pub price: Price,
    pub category_ids: BTreeSet<i64>,
}

/// Validated partial update. `None` leaves a field as it is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<Name>,
    /// `Some(None)` clears the field.
    pub description: Option<Option<String>>,
    pub img_url: Option<Option<String>>,
    pub inventory: Option<Quantity>,
    pub price: Option<Price>,
    /// Replaces the whole category set when present.
    pub category_ids: Option<BTreeSet<i64>>,
}

impl Product {
    /// Builds the stored form of `new`; new products always start active.
    pub fn from_new(id: i64, new: NewProduct, categories: BTreeSet<i64>) -> Self {
        let now = Utc::now();
        Self {
            id, merchant_id: new.merchant_id, name: new.name, description: new.description,
            img_url: new.img_url, inventory: new.inventory, price: new.price, active: true,
            categories, created_at: now, updated_at: now,
        }
    }

    pub fn is_in_stock(&self) -> bool { !self.inventory.is_zero() }

    pub fn in_category(&self, category_id: i64) -> bool { self.categories.contains(&category_id) }

    /// Applies `changes`. Category ids must already be filtered to known categories.
    pub fn apply(&mut self, changes: ProductChanges) {
        if let Some(name) = changes.name { self.name = name; }
        if let Some(description) = changes.description { self.description = description; }
        if let Some(img_url) = changes.img_url { self.img_url = img_url; }
        if let Some(inventory) = changes.inventory { self.inventory = inventory; }
        if let Some(price) = changes.price { self.price = price; }
        if let Some(categories) = changes.category_ids { self.categories = categories; }
        self.touch();
    }

    /// Flips visibility and returns the new state.
    pub fn toggle_active(&mut self) -> bool {
        self.active = !self.active;
        self.touch();
        self.active
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.touch();
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}
