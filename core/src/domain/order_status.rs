// core/src/domain/order_status.rs

//! Order lifecycle.
//!
//! ```text
//!   Pending(0) --rider grabs--> Accepted(1) --pickup--> Delivering(2) --drop-off--> Completed(3)
//!       ^                          |
//!       +------rider releases------+
//!   Pending / Accepted --merchant cancels--> Cancelled(4)
//! ```

use super::role::Role;
use crate::error::RuleViolation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
#[repr(i16)]
pub enum OrderStatus {
  Pending = 0,
  Accepted = 1,
  Delivering = 2,
  Completed = 3,
  Cancelled = 4,
}

impl OrderStatus {
  pub fn code(self) -> i16 {
    self as i16
  }

  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
  }

  /// Still in flight from the customer's point of view.
  pub fn is_active(self) -> bool {
    !self.is_terminal()
  }

  pub const ACTIVE: [OrderStatus; 3] = [OrderStatus::Pending, OrderStatus::Accepted, OrderStatus::Delivering];
}

impl TryFrom<i16> for OrderStatus {
  type Error = RuleViolation;

  fn try_from(code: i16) -> Result<Self, Self::Error> {
    match code {
      0 => Ok(OrderStatus::Pending),
      1 => Ok(OrderStatus::Accepted),
      2 => Ok(OrderStatus::Delivering),
      3 => Ok(OrderStatus::Completed),
      4 => Ok(OrderStatus::Cancelled),
      other => Err(RuleViolation::UnknownOrderStatus(other)),
    }
  }
}

impl From<OrderStatus> for i16 {
  fn from(status: OrderStatus) -> Self {
    status.code()
  }
}

/// Whether `actor` may move an order from `from` to `to`.
pub fn is_allowed(from: OrderStatus, to: OrderStatus, actor: Role) -> bool {
  use OrderStatus::*;
  match (from, to) {
    (Pending, Accepted) | (Accepted, Pending) | (Delivering, Completed) => actor == Role::Rider,
    (Accepted, Delivering) => matches!(actor, Role::Rider | Role::Merchant),
    (Pending | Accepted, Cancelled) => actor == Role::Merchant,
    _ => false,
  }
}

pub fn check_transition(from: OrderStatus, to: OrderStatus, actor: Role) -> Result<(), RuleViolation> {
  if is_allowed(from, to, actor) {
    Ok(())
  } else {
    Err(RuleViolation::IllegalTransition {
      from: from.code(),
      to: to.code(),
    })
  }
}

/// Merchant-side transition, which also demands a reason when cancelling.
pub fn check_merchant_update(
  from: OrderStatus,
  to: OrderStatus,
  cancel_reason: Option<&str>,
) -> Result<(), RuleViolation> {
  check_transition(from, to, Role::Merchant)?;
  if to == OrderStatus::Cancelled && cancel_reason.map_or(true, |r| r.trim().is_empty()) {
    return Err(RuleViolation::MissingCancelReason);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use OrderStatus::*;

  #[test]
  fn terminal_states_reject_everything() {
    for to in [Pending, Accepted, Delivering, Completed, Cancelled] {
      for actor in Role::ALL {
        assert!(!is_allowed(Completed, to, actor));
        assert!(!is_allowed(Cancelled, to, actor));
      }
    }
  }

  #[test]
  fn users_and_admins_never_drive_transitions() {
    assert!(!is_allowed(Pending, Accepted, Role::User));
    assert!(!is_allowed(Accepted, Cancelled, Role::Admin));
  }

  #[test]
  fn rejects_unknown_codes() {
    assert_eq!(i16::from(Delivering), 2);
    assert_eq!(OrderStatus::try_from(3), Ok(Completed));
    assert_eq!(OrderStatus::try_from(7), Err(RuleViolation::UnknownOrderStatus(7)));
  }

  #[test]
  fn cancelling_needs_a_reason() {
    assert_eq!(
      check_merchant_update(Pending, Cancelled, Some("  ")),
      Err(RuleViolation::MissingCancelReason)
    );
    assert!(check_merchant_update(Accepted, Cancelled, Some("sold out")).is_ok());
    assert!(check_merchant_update(Accepted, Delivering, None).is_ok());
  }
}
