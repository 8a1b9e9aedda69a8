//! Aggregates module
pub mod product;
pub mod cart;
pub mod category;

pub use product::{NewProduct, Product, ProductChanges};
pub use cart::{Cart, CartLine, CartView};
pub use category::{Category, Merchant, NewCategory};
