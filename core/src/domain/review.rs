// core/src/domain/review.rs

use crate::error::RuleViolation;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Merchant-side review filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFilter {
  /// Rating of 4 or more.
  Positive,
  /// Rating of exactly 3.
  Neutral,
  /// Rating of 2 or less.
  Negative,
  HasImage,
}

impl ReviewFilter {
  /// Inclusive rating range, or `None` for filters that do not look at the rating.
  pub fn rating_range(self) -> Option<(Decimal, Decimal)> {
    match self {
      ReviewFilter::Positive => Some((Decimal::from(4), Decimal::from(5))),
      ReviewFilter::Neutral => Some((Decimal::from(3), Decimal::from(3))),
      ReviewFilter::Negative => Some((Decimal::ONE, Decimal::from(2))),
      ReviewFilter::HasImage => None,
    }
  }

  pub fn requires_image(self) -> bool {
    self == ReviewFilter::HasImage
  }
}

impl FromStr for ReviewFilter {
  type Err = RuleViolation;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "POSITIVE" => Ok(ReviewFilter::Positive),
      "NEUTRAL" => Ok(ReviewFilter::Neutral),
      "NEGATIVE" => Ok(ReviewFilter::Negative),
      "HAS_IMAGE" => Ok(ReviewFilter::HasImage),
      _ => Err(RuleViolation::UnknownFilter(s.to_string())),
    }
  }
}

/// Ratings are whole or half stars between 1 and 5.
pub fn ensure_rating(rating: Decimal) -> Result<(), RuleViolation> {
  let in_range = rating >= Decimal::ONE && rating <= Decimal::from(5);
  let half_step = (rating * Decimal::from(2)).fract().is_zero();
  if in_range && half_step {
    Ok(())
  } else {
    Err(RuleViolation::InvalidRating)
  }
}

/// Review images are stored as one comma-separated column.
pub fn join_images(images: &[String]) -> Option<String> {
  let kept: Vec<&str> = images.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
  (!kept.is_empty()).then(|| kept.join(","))
}

pub fn split_images(column: Option<&str>) -> Vec<String> {
  column
    .map(|raw| {
      raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_known_filters_only() {
    assert_eq!("positive".parse::<ReviewFilter>(), Ok(ReviewFilter::Positive));
    assert_eq!("HAS_IMAGE".parse::<ReviewFilter>(), Ok(ReviewFilter::HasImage));
    assert!(matches!("LOUD".parse::<ReviewFilter>(), Err(RuleViolation::UnknownFilter(_))));
  }

  #[test]
  fn images_round_through_the_column_format() {
    let joined = join_images(&["a.png".into(), " ".into(), "b.png ".into()]);
    assert_eq!(joined.as_deref(), Some("a.png,b.png"));
    assert_eq!(split_images(joined.as_deref()), vec!["a.png", "b.png"]);
    assert!(join_images(&[]).is_none());
  }

  #[test]
  fn ratings_must_be_half_stars_in_range() {
    assert!(ensure_rating(Decimal::new(45, 1)).is_ok());
    assert!(ensure_rating(Decimal::new(43, 1)).is_err());
    assert!(ensure_rating(Decimal::ZERO).is_err());
  }
}
