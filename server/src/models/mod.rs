// server/src/models/mod.rs

//! Row types for every table.

pub mod admin;
pub mod cart_item;
pub mod coupon;
pub mod merchant;
pub mod message;
pub mod order;
pub mod order_item;
pub mod product;
pub mod review;
pub mod rider;
pub mod store;
pub mod user;

pub use admin::Admin;
pub use cart_item::{CartItem, CartLine};
pub use coupon::Coupon;
pub use merchant::Merchant;
pub use message::Message;
pub use order::{Order, OrderSummary};
pub use order_item::{OrderItem, OrderItemDetail};
pub use product::Product;
pub use review::{Review, ReviewRow, ReviewView};
pub use rider::{Rider, RiderEarnings};
pub use store::{Store, ViewedStore};
pub use user::{Credentials, User};
