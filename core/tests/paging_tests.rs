// tests/paging_tests.rs
use baoleme_core::domain::paging::{page_count, MAX_PAGE_SIZE};
use baoleme_core::domain::{Page, PageRequest};
use baoleme_core::RuleViolation;

#[test]
fn defaults_apply_when_values_are_missing() {
  let req = PageRequest::new(None, None).expect("defaults");
  assert_eq!(req.page(), 1);
  assert_eq!(req.page_size(), 10);
  assert_eq!(req.offset(), 0);
}

#[test]
fn rejects_non_positive_and_caps_oversized() {
  assert_eq!(PageRequest::new(Some(0), None), Err(RuleViolation::InvalidPage));
  assert_eq!(PageRequest::new(Some(1), Some(-5)), Err(RuleViolation::InvalidPage));

  let req = PageRequest::new(Some(3), Some(5000)).expect("capped");
  assert_eq!(req.page_size(), MAX_PAGE_SIZE);
  assert_eq!(req.offset(), 200);
  assert_eq!(req.limit(), 100);
}

#[test]
fn page_metadata_tracks_neighbours() {
  assert_eq!(page_count(0, 10), 0);
  assert_eq!(page_count(21, 10), 3);

  let req = PageRequest::new(Some(2), Some(10)).expect("valid");
  let page = Page::new(req, 21, vec!["k"; 10]);
  assert_eq!(page.curr_page, 2);
  assert_eq!(page.pre_page, Some(1));
  assert_eq!(page.next_page, Some(3));
  assert_eq!(page.page_count, 3);

  let last = Page::new(PageRequest::new(Some(3), Some(10)).expect("valid"), 21, vec![1]);
  assert_eq!(last.next_page, None);
  assert_eq!(last.map(|n| n * 2).list, vec![2]);
}

#[test]
fn clamp_moves_overflowing_page_back() {
  let req = PageRequest::new(Some(9), Some(10)).expect("valid");
  assert_eq!(req.clamp_to(25).page(), 3);
  assert_eq!(req.clamp_to(0).page(), 1);
}
