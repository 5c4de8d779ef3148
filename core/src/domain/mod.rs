// core/src/domain/mod.rs

//! Storage-free business rules.

pub mod coupon;
pub mod listing;
pub mod order_status;
pub mod paging;
pub mod pricing;
pub mod review;
pub mod rider;
pub mod role;
pub mod stats;

pub use coupon::{round_money, CouponKind, CouponPolicy, CouponTerms};
pub use listing::ListingStatus;
pub use order_status::OrderStatus;
pub use paging::{Page, PageRequest};
pub use pricing::{OrderQuote, PricedLine, QuoteRequest};
pub use review::ReviewFilter;
pub use rider::{DispatchMode, RiderState};
pub use role::Role;
pub use stats::{TimeRange, TrendAxis, TrendPoint};
