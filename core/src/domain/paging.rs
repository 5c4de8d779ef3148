// core/src/domain/paging.rs

use crate::error::RuleViolation;
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  page: u32,
  page_size: u32,
}

impl Default for PageRequest {
  fn default() -> Self {
    Self {
      page: 1,
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

impl PageRequest {
  /// Missing values fall back to page 1 and the default size.
  /// Zero or negative values are rejected; oversized pages are capped.
  pub fn new(page: Option<i64>, page_size: Option<i64>) -> Result<Self, RuleViolation> {
    let page = page.unwrap_or(1);
    let page_size = page_size.unwrap_or(i64::from(DEFAULT_PAGE_SIZE));
    if page < 1 || page_size < 1 {
      return Err(RuleViolation::InvalidPage);
    }
    Ok(Self {
      page: u32::try_from(page).unwrap_or(u32::MAX),
      page_size: u32::try_from(page_size).unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE),
    })
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn page_size(&self) -> u32 {
    self.page_size
  }

  pub fn limit(&self) -> i64 {
    i64::from(self.page_size)
  }

  pub fn offset(&self) -> i64 {
    i64::from(self.page - 1) * i64::from(self.page_size)
  }

  /// Moves a page past the end back onto the last page (page 1 when empty).
  pub fn clamp_to(self, total: i64) -> Self {
    let last = page_count(total, self.page_size).max(1);
    Self {
      page: self.page.min(last),
      ..self
    }
  }
}

pub fn page_count(total: i64, page_size: u32) -> u32 {
  if total <= 0 || page_size == 0 {
    return 0;
  }
  let size = i64::from(page_size);
  u32::try_from((total + size - 1) / size).unwrap_or(u32::MAX)
}

/// One page of results plus the numbers a pager needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
  pub curr_page: u32,
  pub pre_page: Option<u32>,
  pub next_page: Option<u32>,
  pub page_size: u32,
  pub page_count: u32,
  pub count: i64,
  pub list: Vec<T>,
}

impl<T> Page<T> {
  pub fn new(req: PageRequest, count: i64, list: Vec<T>) -> Self {
    let pages = page_count(count, req.page_size);
    Self {
      curr_page: req.page,
      pre_page: (req.page > 1).then(|| req.page - 1),
      next_page: (req.page < pages).then(|| req.page + 1),
      page_size: req.page_size,
      page_count: pages,
      count,
      list,
    }
  }

  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      curr_page: self.curr_page,
      pre_page: self.pre_page,
      next_page: self.next_page,
      page_size: self.page_size,
      page_count: self.page_count,
      count: self.count,
      list: self.list.into_iter().map(f).collect(),
    }
  }
}
