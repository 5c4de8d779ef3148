// core/src/domain/role.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who is acting. Each role has its own account table and session namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Merchant,
  Rider,
  Admin,
}

impl Role {
  pub const ALL: [Role; 4] = [Role::User, Role::Merchant, Role::Rider, Role::Admin];

  pub fn as_str(self) -> &'static str {
    match self {
      Role::User => "user",
      Role::Merchant => "merchant",
      Role::Rider => "rider",
      Role::Admin => "admin",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
  type Err = UnknownRole;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Role::ALL
      .into_iter()
      .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| UnknownRole(s.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_case_insensitively() {
    assert_eq!("Rider".parse::<Role>(), Ok(Role::Rider));
    assert_eq!(" admin ".parse::<Role>(), Ok(Role::Admin));
    assert!("courier".parse::<Role>().is_err());
  }
}
