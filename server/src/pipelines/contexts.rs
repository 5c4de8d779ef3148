// server/src/pipelines/contexts.rs

//! Data carried through each pipeline run, wrapped in `ContextData` by the handlers.

use crate::models::{CartItem, Order, OrderItemDetail, Rider, Store};
use crate::services::order_locks::OrderLockGuard;
use crate::state::AppState;
use baoleme_core::domain::{OrderQuote, OrderStatus, PricedLine, Role};

/// Fields accepted at registration. Which ones matter depends on the role.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
  pub username: String,
  pub password: String,
  pub phone: String,
  pub gender: Option<String>,
  pub description: Option<String>,
  pub location: Option<String>,
  pub avatar: Option<String>,
}

#[derive(Clone)]
pub struct SignupCtxData {
  pub app_state: AppState,
  pub role: Role,
  pub form: SignupForm,
  pub password_hash: Option<String>,
  pub created_id: Option<i64>,
}

#[derive(Clone)]
pub struct SigninCtxData {
  pub app_state: AppState,
  pub role: Role,
  /// Phone for users and riders, username for merchants, numeric id for the admin.
  pub login: String,
  pub password: String,
  pub account_id: Option<i64>,
  pub username: Option<String>,
  pub stored_hash: Option<String>,
  pub token: Option<String>,
}

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub user_id: i64,
  pub product_id: i64,
  pub quantity: i32,
  pub updated_item: Option<CartItem>,
}

#[derive(Debug, Clone, Copy)]
pub struct RequestedLine {
  pub product_id: i64,
  pub quantity: i32,
}

#[derive(Clone)]
pub struct PlaceOrderCtxData {
  pub app_state: AppState,
  pub user_id: i64,
  pub store_id: i64,
  pub items: Vec<RequestedLine>,
  pub user_location: String,
  pub remark: Option<String>,
  pub coupon_id: Option<i64>,
  pub delivery_price: rust_decimal::Decimal,
  pub store: Option<Store>,
  pub priced_lines: Vec<PricedLine>,
  pub quote: Option<OrderQuote>,
  pub order: Option<Order>,
  pub order_items: Vec<OrderItemDetail>,
}

/// Manual grab of a chosen order.
pub struct GrabOrderCtxData {
  pub app_state: AppState,
  pub rider_id: i64,
  pub order_id: i64,
  pub lock: Option<OrderLockGuard>,
  pub order: Option<Order>,
}

/// Automatic dispatch: the order is picked for the rider.
#[derive(Clone)]
pub struct AutoDispatchCtxData {
  pub app_state: AppState,
  pub rider_id: i64,
  pub rider: Option<Rider>,
  pub order: Option<Order>,
}

#[derive(Clone)]
pub struct DeliveryProgressCtxData {
  pub app_state: AppState,
  pub rider_id: i64,
  pub order_id: i64,
  pub target: OrderStatus,
  pub current: Option<Order>,
  pub updated: Option<Order>,
}
