// core/src/domain/rider.rs

use crate::error::RuleViolation;
use serde::{Deserialize, Serialize};

/// Availability stored in `riders.order_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum RiderState {
  /// Logged out.
  Offline,
  /// Carrying at least one accepted or delivering order.
  Busy,
  Idle,
}

impl RiderState {
  pub fn code(self) -> i16 {
    match self {
      RiderState::Offline => -1,
      RiderState::Busy => 0,
      RiderState::Idle => 1,
    }
  }

  /// Manual grabbing only needs the rider to be online.
  pub fn ensure_can_grab(self) -> Result<(), RuleViolation> {
    match self {
      RiderState::Offline => Err(RuleViolation::RiderOffline),
      RiderState::Busy | RiderState::Idle => Ok(()),
    }
  }

  /// Automatic dispatch hands out one order at a time.
  pub fn ensure_can_auto_dispatch(self) -> Result<(), RuleViolation> {
    match self {
      RiderState::Offline => Err(RuleViolation::RiderOffline),
      RiderState::Busy => Err(RuleViolation::RiderBusy),
      RiderState::Idle => Ok(()),
    }
  }
}

/// A rider account can only go away once nothing is accepted or delivering.
pub fn ensure_can_leave(active_orders: i64) -> Result<(), RuleViolation> {
  if active_orders > 0 {
    return Err(RuleViolation::RiderHasActiveOrders(active_orders));
  }
  Ok(())
}

impl TryFrom<i16> for RiderState {
  type Error = RuleViolation;

  fn try_from(code: i16) -> Result<Self, Self::Error> {
    match code {
      -1 => Ok(RiderState::Offline),
      0 => Ok(RiderState::Busy),
      1 => Ok(RiderState::Idle),
      other => Err(RuleViolation::UnknownRiderState(other)),
    }
  }
}

impl From<RiderState> for i16 {
  fn from(state: RiderState) -> Self {
    state.code()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum DispatchMode {
  Manual,
  Automatic,
}

impl DispatchMode {
  pub fn code(self) -> i16 {
    match self {
      DispatchMode::Manual => 0,
      DispatchMode::Automatic => 1,
    }
  }

  pub fn ensure_automatic(self) -> Result<(), RuleViolation> {
    match self {
      DispatchMode::Automatic => Ok(()),
      DispatchMode::Manual => Err(RuleViolation::ManualDispatchMode),
    }
  }
}

impl TryFrom<i16> for DispatchMode {
  type Error = RuleViolation;

  fn try_from(code: i16) -> Result<Self, Self::Error> {
    match code {
      0 => Ok(DispatchMode::Manual),
      1 => Ok(DispatchMode::Automatic),
      other => Err(RuleViolation::UnknownDispatchMode(other)),
    }
  }
}

impl From<DispatchMode> for i16 {
  fn from(mode: DispatchMode) -> Self {
    mode.code()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn busy_riders_may_grab_but_not_be_dispatched() {
    assert!(RiderState::Busy.ensure_can_grab().is_ok());
    assert_eq!(RiderState::Busy.ensure_can_auto_dispatch(), Err(RuleViolation::RiderBusy));
    assert_eq!(RiderState::Offline.ensure_can_grab(), Err(RuleViolation::RiderOffline));
  }

  #[test]
  fn codes_match_storage() {
    assert_eq!(RiderState::try_from(-1), Ok(RiderState::Offline));
    assert_eq!(RiderState::Idle.code(), 1);
    assert_eq!(DispatchMode::try_from(2), Err(RuleViolation::UnknownDispatchMode(2)));
  }

  #[test]
  fn riders_with_orders_in_hand_cannot_leave() {
    assert_eq!(ensure_can_leave(2), Err(RuleViolation::RiderHasActiveOrders(2)));
    assert!(ensure_can_leave(0).is_ok());
  }
}
