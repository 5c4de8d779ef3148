// core/src/error.rs

use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Failures raised by the pipeline engine itself.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step '{step_name}' not found in pipeline '{pipeline}'")]
  StepNotFound { pipeline: String, step_name: String },

  #[error("Step '{step_name}' already exists in pipeline '{pipeline}'")]
  DuplicateStep { pipeline: String, step_name: String },

  #[error("Required step '{step_name}' of pipeline '{pipeline}' has no handlers")]
  HandlerMissing { pipeline: String, step_name: String },

  #[error("No pipeline registered for context type {context_type}")]
  NotRegistered { context_type: String },

  #[error("Context type {context_type} is already served by pipeline '{pipeline}'")]
  AlreadyRegistered { context_type: String, pipeline: String },

  #[error("Context type mismatch, expected {expected_type}")]
  TypeMismatch { expected_type: String },

  #[error("Step handler failed: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for FlowError {
  fn from(source: AnyhowError) -> Self {
    FlowError::Handler { source }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;

/// A business rule refused the requested operation.
///
/// Messages are user facing and match what the HTTP layer returns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
  #[error("订单状态不允许从 {from} 变更为 {to}")]
  IllegalTransition { from: i16, to: i16 },

  #[error("无效的订单状态: {0}")]
  UnknownOrderStatus(i16),

  #[error("无效的骑手状态: {0}")]
  UnknownRiderState(i16),

  #[error("接单模式只能为0或1")]
  UnknownDispatchMode(i16),

  #[error("状态值必须是0或1")]
  UnknownListingStatus(i16),

  #[error("无效的优惠券类型: {0}")]
  UnknownCouponKind(i16),

  #[error("优惠券不可用: {0}")]
  CouponUnusable(String),

  #[error("优惠券参数不合法: {0}")]
  InvalidCouponTerms(String),

  #[error("订单商品不能为空")]
  EmptyOrder,

  #[error("商品数量必须大于0")]
  NonPositiveQuantity,

  #[error("商品数量过大")]
  QuantityTooLarge,

  #[error("商品库存不足: {product}")]
  InsufficientStock { product: String },

  #[error("评分必须在1到5之间")]
  InvalidRating,

  #[error("分页参数必须大于0")]
  InvalidPage,

  #[error("无效的筛选类型")]
  UnknownFilter(String),

  #[error("统计天数必须在1到{max}之间")]
  InvalidDayRange { max: u32 },

  #[error("取消订单必须填写原因")]
  MissingCancelReason,

  #[error("骑手未上线，无法接单")]
  RiderOffline,

  #[error("骑手正在配送中")]
  RiderBusy,

  #[error("骑手仍有 {0} 个未完成的订单，无法注销")]
  RiderHasActiveOrders(i64),

  #[error("当前为手动接单模式")]
  ManualDispatchMode,
}
