//! Application services. Each one is cheap to clone and shares its stores.

pub mod cart;
pub mod catalog;
pub mod events;
pub mod inventory;
pub mod products;

pub use cart::{CartService, QuantityUpdate};
pub use catalog::{CatalogService, CategoryForm, Storefront};
pub use events::EventPublisher;
pub use inventory::InventoryViolation;
pub use products::{ProductForm, ProductService, ProductTemplate, ProductUpdateForm};
