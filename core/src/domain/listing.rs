// core/src/domain/listing.rs

use crate::error::RuleViolation;
use serde::{Deserialize, Serialize};

/// Open/closed flag shared by stores (open for business) and products (on sale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum ListingStatus {
  Closed,
  Open,
}

impl ListingStatus {
  pub fn code(self) -> i16 {
    match self {
      ListingStatus::Closed => 0,
      ListingStatus::Open => 1,
    }
  }

  pub fn is_open(self) -> bool {
    self == ListingStatus::Open
  }
}

impl TryFrom<i16> for ListingStatus {
  type Error = RuleViolation;

  fn try_from(code: i16) -> Result<Self, Self::Error> {
    match code {
      0 => Ok(ListingStatus::Closed),
      1 => Ok(ListingStatus::Open),
      other => Err(RuleViolation::UnknownListingStatus(other)),
    }
  }
}

impl From<ListingStatus> for i16 {
  fn from(status: ListingStatus) -> Self {
    status.code()
  }
}
