// core/src/validation.rs

//! Field rules shared by every account type.

use once_cell::sync::Lazy;
use regex::Regex;

pub const USERNAME_MIN: u64 = 2;
pub const USERNAME_MAX: u64 = 20;
pub const PASSWORD_MIN: u64 = 6;
pub const PASSWORD_MAX: u64 = 20;

pub const USERNAME_MESSAGE: &str = "用户名长度应为2~20个字符";
pub const PASSWORD_MESSAGE: &str = "密码长度应为6~20个字符";
pub const PHONE_MESSAGE: &str = "手机号格式不合法";

/// Mainland mobile numbers: 11 digits, `1` then `3`..`9`.
pub static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^1[3-9]\d{9}$").expect("PHONE_RE: invalid regex pattern"));

pub fn is_valid_phone(phone: &str) -> bool {
  PHONE_RE.is_match(phone)
}

pub fn is_blank(value: &str) -> bool {
  value.trim().is_empty()
}

/// Trims and drops empty optional text so blank form fields do not overwrite data.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn phone_pattern() {
    assert!(is_valid_phone("13812345678"));
    assert!(is_valid_phone("19900000000"));
    assert!(!is_valid_phone("12812345678"));
    assert!(!is_valid_phone("1381234567"));
    assert!(!is_valid_phone("138123456789"));
    assert!(!is_valid_phone("1381234567a"));
    assert!(!is_valid_phone(" 13812345678"));
  }

  #[test]
  fn optional_text_is_normalized() {
    assert_eq!(normalize_optional(Some("  hi ".into())), Some("hi".to_string()));
    assert_eq!(normalize_optional(Some("   ".into())), None);
    assert_eq!(normalize_optional(None), None);
  }
}
