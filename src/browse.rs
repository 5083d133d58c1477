//! Search, sort and pagination over the loaded episodes.
//!
//! Everything here is a pure function of the episode list plus UI parameters.
//! Views are index lists into the episode slice, rebuilt from scratch on
//! every change.

use std::cmp::Ordering;

use crate::episode::Episode;

// --- Search ---

/// Indices of episodes whose name contains `query`, case-insensitively.
/// An empty query keeps everything in original order.
pub fn filter_indices(episodes: &[Episode], query: &str) -> Vec<usize> {
  if query.is_empty() {
    return (0..episodes.len()).collect();
  }
  let needle = query.to_lowercase();
  episodes.iter().enumerate().filter(|(_, e)| e.name.to_lowercase().contains(&needle)).map(|(i, _)| i).collect()
}

// --- Sort ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
  ReleaseDate,
  Views,
  Likes,
  /// Leave the order as loaded. Any unrecognised key maps here.
  Original,
}

impl SortKey {
  /// The keys offered in the sort selector, in cycling order.
  pub const CYCLE: [SortKey; 3] = [SortKey::ReleaseDate, SortKey::Views, SortKey::Likes];

  pub fn from_config(s: &str) -> Self {
    match s.trim().to_lowercase().as_str() {
      "release_date" => SortKey::ReleaseDate,
      "views" => SortKey::Views,
      "likes" => SortKey::Likes,
      _ => SortKey::Original,
    }
  }

  pub fn config_name(self) -> &'static str {
    match self {
      SortKey::ReleaseDate => "release_date",
      SortKey::Views => "views",
      SortKey::Likes => "likes",
      SortKey::Original => "original",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      SortKey::ReleaseDate => "Release Date",
      SortKey::Views => "Views",
      SortKey::Likes => "Likes",
      SortKey::Original => "Original Order",
    }
  }

  pub fn next(self) -> Self {
    let idx = Self::CYCLE.iter().position(|k| *k == self).map_or(0, |i| (i + 1) % Self::CYCLE.len());
    Self::CYCLE[idx]
  }
}

/// Descending order where a missing value ranks below every present one.
fn desc_missing_last<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
  match (a, b) {
    (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

/// Return `indices` reordered by `key`. The sort is stable; `Original` is a no-op.
pub fn sort_indices(episodes: &[Episode], indices: &[usize], key: SortKey) -> Vec<usize> {
  let mut out = indices.to_vec();
  match key {
    SortKey::ReleaseDate => out.sort_by(|&a, &b| desc_missing_last(episodes[a].released, episodes[b].released)),
    SortKey::Views => out.sort_by(|&a, &b| desc_missing_last(episodes[a].views, episodes[b].views)),
    SortKey::Likes => out.sort_by(|&a, &b| desc_missing_last(episodes[a].likes, episodes[b].likes)),
    SortKey::Original => {}
  }
  out
}

// --- Pagination ---

/// Zero-based half-open bounds of one page, plus the page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
  pub start: usize,
  pub end: usize,
  pub total_pages: usize,
}

impl PageSlice {
  pub fn len(&self) -> usize {
    self.end - self.start
  }

  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
  len.div_ceil(page_size.max(1))
}

/// Bounds of 1-based `page`. Pages past the end give an empty slice at `len`.
pub fn page_bounds(len: usize, page_size: usize, page: usize) -> PageSlice {
  let page_size = page_size.max(1);
  let start = page.saturating_sub(1).saturating_mul(page_size).min(len);
  let end = start.saturating_add(page_size).min(len);
  PageSlice { start, end, total_pages: total_pages(len, page_size) }
}

/// Keep `page` within `[1, max(total_pages, 1)]`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
  page.clamp(1, total_pages.max(1))
}

/// Page numbers to show as buttons: up to `window` pages centred on `current`,
/// shifted left when the window would run past `total`.
pub fn page_window(current: usize, total: usize, window: usize) -> Vec<usize> {
  let mut start = current.saturating_sub(window / 2).max(1);
  let end = total.min(start + window.saturating_sub(1));
  if end == total {
    start = (total + 1).saturating_sub(window).max(1);
  }
  (start..=end).collect()
}

/// Whether the trailing "..." marker follows the page buttons.
pub fn show_ellipsis(current: usize, total: usize) -> bool {
  current > 3 && total > 5
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::episode::tests::episode;
  use crate::episode::{COL_LIKES, COL_RELEASE_DATE, COL_VIEWS};

  fn names(episodes: &[Episode], idx: &[usize]) -> Vec<String> {
    idx.iter().map(|&i| episodes[i].name.clone()).collect()
  }

  fn sample() -> Vec<Episode> {
    vec![
      episode("a", "Money and Mindset", &[(COL_VIEWS, "300"), (COL_LIKES, "3"), (COL_RELEASE_DATE, "2023-05-01")]),
      episode("b", "The Sleep Scientist", &[(COL_VIEWS, "900"), (COL_LIKES, "1"), (COL_RELEASE_DATE, "2024-02-10")]),
      episode("c", "MONEY talks", &[(COL_VIEWS, "n/a"), (COL_LIKES, "7"), (COL_RELEASE_DATE, "garbage")]),
      episode("d", "Habits", &[(COL_VIEWS, "500"), (COL_LIKES, "x"), (COL_RELEASE_DATE, "2022-11-30")]),
    ]
  }

  // --- filter ---

  #[test]
  fn empty_query_keeps_everything_in_order() {
    let eps = sample();
    assert_eq!(filter_indices(&eps, ""), vec![0, 1, 2, 3]);
  }

  #[test]
  fn query_matches_case_insensitive_substring() {
    let eps = sample();
    let idx = filter_indices(&eps, "money");
    assert_eq!(names(&eps, &idx), vec!["Money and Mindset", "MONEY talks"]);
    for &i in &idx {
      assert!(eps[i].name.to_lowercase().contains("money"));
    }
  }

  #[test]
  fn query_is_not_tokenised() {
    let eps = sample();
    assert!(filter_indices(&eps, "money mindset").is_empty());
    assert_eq!(filter_indices(&eps, "y and m"), vec![0]);
  }

  #[test]
  fn no_match_gives_empty() {
    assert!(filter_indices(&sample(), "zzz").is_empty());
  }

  // --- sort ---

  #[test]
  fn sort_views_descending_missing_last() {
    let eps = sample();
    let idx = sort_indices(&eps, &[0, 1, 2, 3], SortKey::Views);
    assert_eq!(names(&eps, &idx), vec!["The Sleep Scientist", "Habits", "Money and Mindset", "MONEY talks"]);
    let views: Vec<Option<i64>> = idx.iter().map(|&i| eps[i].views).collect();
    for pair in views.windows(2) {
      if let (Some(a), Some(b)) = (pair[0], pair[1]) {
        assert!(a >= b);
      }
    }
  }

  #[test]
  fn sort_likes_descending_missing_last() {
    let eps = sample();
    let idx = sort_indices(&eps, &[0, 1, 2, 3], SortKey::Likes);
    assert_eq!(names(&eps, &idx), vec!["MONEY talks", "Money and Mindset", "The Sleep Scientist", "Habits"]);
  }

  #[test]
  fn sort_likes_descending() {
    let eps = vec![
      episode("a", "Three", &[(COL_VIEWS, "100"), (COL_LIKES, "3")]),
      episode("b", "Five", &[(COL_VIEWS, "0"), (COL_LIKES, "5")]),
    ];
    let idx = sort_indices(&eps, &[0, 1], SortKey::Likes);
    assert_eq!(names(&eps, &idx), vec!["Five", "Three"]);
  }

  #[test]
  fn sort_release_date_newest_first_unparsable_last() {
    let eps = sample();
    let idx = sort_indices(&eps, &[0, 1, 2, 3], SortKey::ReleaseDate);
    assert_eq!(names(&eps, &idx), vec!["The Sleep Scientist", "Money and Mindset", "Habits", "MONEY talks"]);
  }

  #[test]
  fn sort_is_stable_among_missing_and_ties() {
    let eps = vec![
      episode("a", "A", &[(COL_VIEWS, "bad")]),
      episode("b", "B", &[(COL_VIEWS, "10")]),
      episode("c", "C", &[(COL_VIEWS, "worse")]),
      episode("d", "D", &[(COL_VIEWS, "10")]),
    ];
    let idx = sort_indices(&eps, &[0, 1, 2, 3], SortKey::Views);
    assert_eq!(names(&eps, &idx), vec!["B", "D", "A", "C"]);
  }

  #[test]
  fn original_key_is_a_no_op_and_input_untouched() {
    let eps = sample();
    let input = vec![3, 1, 0, 2];
    assert_eq!(sort_indices(&eps, &input, SortKey::Original), input);
    let _ = sort_indices(&eps, &input, SortKey::Views);
    assert_eq!(input, vec![3, 1, 0, 2]);
  }

  #[test]
  fn sort_key_from_config() {
    assert_eq!(SortKey::from_config("release_date"), SortKey::ReleaseDate);
    assert_eq!(SortKey::from_config("VIEWS"), SortKey::Views);
    assert_eq!(SortKey::from_config("likes"), SortKey::Likes);
    assert_eq!(SortKey::from_config("duration"), SortKey::Original);
    assert_eq!(SortKey::from_config(""), SortKey::Original);
  }

  #[test]
  fn sort_key_cycles() {
    assert_eq!(SortKey::ReleaseDate.next(), SortKey::Views);
    assert_eq!(SortKey::Views.next(), SortKey::Likes);
    assert_eq!(SortKey::Likes.next(), SortKey::ReleaseDate);
    assert_eq!(SortKey::Original.next(), SortKey::ReleaseDate);
  }

  // --- pagination ---

  #[test]
  fn total_pages_is_ceiling() {
    assert_eq!(total_pages(0, 21), 0);
    assert_eq!(total_pages(1, 21), 1);
    assert_eq!(total_pages(21, 21), 1);
    assert_eq!(total_pages(22, 21), 2);
    assert_eq!(total_pages(45, 21), 3);
  }

  #[test]
  fn pages_cover_sequence_exactly_once() {
    for n in [0usize, 1, 20, 21, 22, 45, 63, 100] {
      let pages = total_pages(n, 21);
      let mut seen = Vec::new();
      for p in 1..=pages {
        let s = page_bounds(n, 21, p);
        seen.extend(s.start..s.end);
      }
      assert_eq!(seen, (0..n).collect::<Vec<_>>(), "n = {n}");
    }
  }

  #[test]
  fn forty_five_rows_make_three_pages() {
    assert_eq!(page_bounds(45, 21, 1).len(), 21);
    assert_eq!(page_bounds(45, 21, 2).len(), 21);
    let last = page_bounds(45, 21, 3);
    assert_eq!(last.len(), 3);
    assert_eq!(last.total_pages, 3);
  }

  #[test]
  fn page_past_end_is_empty() {
    let s = page_bounds(10, 21, 4);
    assert!(s.is_empty());
    assert_eq!(s.start, 10);
    let zero = page_bounds(0, 21, 1);
    assert!(zero.is_empty());
    assert_eq!(zero.total_pages, 0);
  }

  #[test]
  fn clamp_page_into_range() {
    assert_eq!(clamp_page(7, 3), 3);
    assert_eq!(clamp_page(0, 3), 1);
    assert_eq!(clamp_page(2, 3), 2);
    assert_eq!(clamp_page(5, 0), 1);
  }

  #[test]
  fn page_window_examples() {
    assert_eq!(page_window(1, 10, 5), vec![1, 2, 3, 4, 5]);
    assert_eq!(page_window(8, 10, 5), vec![6, 7, 8, 9, 10]);
    assert_eq!(page_window(5, 5, 5), vec![1, 2, 3, 4, 5]);
    assert_eq!(page_window(5, 10, 5), vec![3, 4, 5, 6, 7]);
    assert_eq!(page_window(10, 10, 5), vec![6, 7, 8, 9, 10]);
  }

  #[test]
  fn page_window_small_totals() {
    assert_eq!(page_window(1, 3, 5), vec![1, 2, 3]);
    assert_eq!(page_window(2, 2, 5), vec![1, 2]);
    assert!(page_window(1, 0, 5).is_empty());
  }

  #[test]
  fn page_window_is_contiguous_and_bounded() {
    for total in 1..=15 {
      for current in 1..=total {
        let w = page_window(current, total, 5);
        assert!(w.contains(&current), "current {current} total {total}");
        assert!(w.len() <= 5);
        assert!(*w.first().unwrap() >= 1 && *w.last().unwrap() <= total);
        assert!(w.windows(2).all(|p| p[1] == p[0] + 1));
      }
    }
  }

  #[test]
  fn ellipsis_rule() {
    assert!(!show_ellipsis(3, 10));
    assert!(show_ellipsis(4, 10));
    assert!(!show_ellipsis(4, 5));
  }
}
