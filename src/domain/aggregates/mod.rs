//! Aggregates module
pub mod category;
pub mod product;
pub mod cart;
pub mod order;
pub mod message;
pub mod user;

pub use category::{Category, CategoryRef};
pub use product::{Product, ProductDetails};
pub use cart::{Cart, CartLine};
pub use order::{order_total, CustomerInfo, Order, OrderError, OrderLine, OrderStatus};
pub use message::Message;
pub use user::{User, UserRef};
