use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::constants::{constants, expand_template};

/// One CSV row keyed by header name, exactly as it came off the wire.
pub type RawRecord = HashMap<String, String>;

// --- Column names ---

pub const COL_ID: &str = "episode_id";
pub const COL_NAME: &str = "episode_name";
pub const COL_RELEASE_DATE: &str = "release_date";
pub const COL_THUMBNAIL: &str = "thumbnail_url";
pub const COL_THUMBNAIL_MAXRES: &str = "thumbnail_url_maxres";
pub const COL_VIEWS: &str = "views";
pub const COL_LIKES: &str = "likes";
pub const COL_DISLIKES: &str = "dislikes";
pub const COL_COMMENTS: &str = "comments";
pub const COL_SHARES: &str = "shares";
pub const COL_SUBS_GAINED: &str = "subscribersGained";
pub const COL_SUBS_LOST: &str = "subscribersLost";
pub const COL_MINUTES_WATCHED: &str = "estimatedMinutesWatched";
pub const COL_AVG_DURATION: &str = "averageViewDuration";
pub const COL_AVG_PERCENTAGE: &str = "averageViewPercentage";
pub const COL_DESCRIPTION: &str = "description";

/// A typed episode row. Counters are `None` when the source text was not numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
  pub id: String,
  pub name: String,
  /// Release date as written in the CSV, shown verbatim on cards.
  pub release_date: String,
  /// Parsed release date used for sorting.
  pub released: Option<NaiveDateTime>,
  pub thumbnail_url: String,
  pub thumbnail_url_maxres: String,
  pub views: Option<i64>,
  pub likes: Option<i64>,
  pub dislikes: Option<i64>,
  pub comments: Option<i64>,
  pub shares: Option<i64>,
  pub subscribers_gained: Option<i64>,
  pub subscribers_lost: Option<i64>,
  pub estimated_minutes_watched: Option<i64>,
  /// Seconds.
  pub average_view_duration: Option<i64>,
  pub average_view_percentage: Option<f64>,
  pub description: String,
}

/// A field that could not be converted, or a row dropped for a repeated id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
  /// Zero-based data row (the header is not counted).
  pub row: usize,
  pub episode_id: String,
  pub field: &'static str,
  pub value: String,
}

impl std::fmt::Display for FieldIssue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.field == COL_ID {
      write!(f, "row {}: duplicate episode id '{}'", self.row, self.value)
    } else {
      write!(f, "row {} ({}): {} = '{}' is not valid", self.row, self.episode_id, self.field, self.value)
    }
  }
}

impl Episode {
  pub fn watch_url(&self) -> String {
    expand_template(&constants().watch_url, &self.id)
  }

  pub fn embed_url(&self) -> String {
    expand_template(&constants().embed_url, &self.id)
  }

  /// Thumbnail URLs to try in order: maxres, regular, then the id-based fallbacks.
  pub fn thumbnail_candidates(&self) -> Vec<String> {
    let mut urls: Vec<String> = [&self.thumbnail_url_maxres, &self.thumbnail_url]
      .into_iter()
      .filter(|u| !u.trim().is_empty())
      .cloned()
      .collect();
    if !self.id.is_empty() {
      urls.extend(constants().thumbnail_fallbacks.iter().map(|t| expand_template(t, &self.id)));
    }
    urls
  }

  /// Convert a raw row, collecting any field that failed to parse.
  pub fn from_raw(row: usize, raw: &RawRecord) -> (Self, Vec<FieldIssue>) {
    let text = |col: &str| raw.get(col).cloned().unwrap_or_default();
    let id = text(COL_ID);
    let mut issues = Vec::new();

    let mut int = |col: &'static str| {
      let value = text(col);
      let parsed = parse_int(&value);
      if parsed.is_none() {
        issues.push(FieldIssue { row, episode_id: id.clone(), field: col, value });
      }
      parsed
    };

    let views = int(COL_VIEWS);
    let likes = int(COL_LIKES);
    let dislikes = int(COL_DISLIKES);
    let comments = int(COL_COMMENTS);
    let shares = int(COL_SHARES);
    let subscribers_gained = int(COL_SUBS_GAINED);
    let subscribers_lost = int(COL_SUBS_LOST);
    let estimated_minutes_watched = int(COL_MINUTES_WATCHED);
    let average_view_duration = int(COL_AVG_DURATION);

    let pct_text = text(COL_AVG_PERCENTAGE);
    let average_view_percentage = parse_float(&pct_text);
    if average_view_percentage.is_none() {
      issues.push(FieldIssue { row, episode_id: id.clone(), field: COL_AVG_PERCENTAGE, value: pct_text });
    }

    let release_date = text(COL_RELEASE_DATE);
    let released = parse_release_date(&release_date);
    if released.is_none() {
      issues.push(FieldIssue { row, episode_id: id.clone(), field: COL_RELEASE_DATE, value: release_date.clone() });
    }

    let episode = Episode {
      name: text(COL_NAME),
      release_date,
      released,
      thumbnail_url: text(COL_THUMBNAIL),
      thumbnail_url_maxres: text(COL_THUMBNAIL_MAXRES),
      views,
      likes,
      dislikes,
      comments,
      shares,
      subscribers_gained,
      subscribers_lost,
      estimated_minutes_watched,
      average_view_duration,
      average_view_percentage,
      description: text(COL_DESCRIPTION),
      id,
    };
    (episode, issues)
  }
}

/// Result of converting a whole table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
  pub episodes: Vec<Episode>,
  pub issues: Vec<FieldIssue>,
}

/// Convert every raw row once, dropping rows whose id was already seen.
pub fn convert_records(raw: &[RawRecord]) -> Catalog {
  let mut seen = HashSet::new();
  let mut catalog = Catalog::default();

  for (row, record) in raw.iter().enumerate() {
    let (episode, issues) = Episode::from_raw(row, record);
    if !seen.insert(episode.id.clone()) {
      warn!(row, id = %episode.id, "episode: dropping row with duplicate id");
      catalog.issues.push(FieldIssue {
        row,
        episode_id: episode.id.clone(),
        field: COL_ID,
        value: episode.id,
      });
      continue;
    }
    catalog.issues.extend(issues);
    catalog.episodes.push(episode);
  }

  for issue in &catalog.issues {
    warn!("episode: {}", issue);
  }
  catalog
}

// --- Field parsing ---

/// Best-effort integer parse: optional sign, then the leading run of digits.
/// `"12abc"` gives 12, `"1,234"` gives 1, text with no leading digits gives `None`.
pub fn parse_int(s: &str) -> Option<i64> {
  let s = s.trim_start();
  let (negative, rest) = match s.as_bytes().first() {
    Some(b'-') => (true, &s[1..]),
    Some(b'+') => (false, &s[1..]),
    _ => (false, s),
  };
  let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
  if digits_len == 0 {
    return None;
  }
  // An all-digit run only fails to parse on overflow.
  Some(match (rest[..digits_len].parse::<i64>(), negative) {
    (Ok(m), true) => -m,
    (Ok(m), false) => m,
    (Err(_), true) => i64::MIN,
    (Err(_), false) => i64::MAX,
  })
}

/// Best-effort decimal parse of the leading number, e.g. `"45.2%"` gives 45.2.
pub fn parse_float(s: &str) -> Option<f64> {
  let s = s.trim();
  let end = s
    .char_indices()
    .take_while(|&(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+')))
    .map(|(i, c)| i + c.len_utf8())
    .last()?;
  s[..end].parse().ok().filter(|v: &f64| v.is_finite())
}

const DATETIME_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y"];

/// Parse a release date in any of the common layouts found in episode exports.
pub fn parse_release_date(s: &str) -> Option<NaiveDateTime> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
    return Some(dt.naive_utc());
  }
  let bare = s.trim_end_matches('Z');
  for fmt in DATETIME_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(bare, fmt) {
      return Some(dt);
    }
  }
  for fmt in DATE_FORMATS {
    if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
      return d.and_hms_opt(0, 0, 0);
    }
  }
  None
}

/// Format a counter with thousands separators, `n/a` when missing.
pub fn format_count(value: Option<i64>) -> String {
  let Some(v) = value else { return "n/a".to_string() };
  let digits = v.unsigned_abs().to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
  if v < 0 {
    out.push('-');
  }
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}

/// Format seconds as `h:mm:ss` or `m:ss`.
pub fn format_duration(secs: Option<i64>) -> String {
  let Some(s) = secs.filter(|s| *s >= 0) else { return "n/a".to_string() };
  let (h, m, s) = (s / 3600, (s % 3600) / 60, s % 60);
  if h > 0 { format!("{}:{:02}:{:02}", h, m, s) } else { format!("{}:{:02}", m, s) }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  /// Build a raw row with the full header set and overrides.
  pub(crate) fn raw_row(id: &str, name: &str, overrides: &[(&str, &str)]) -> RawRecord {
    let mut r: RawRecord = [
      (COL_ID, id),
      (COL_NAME, name),
      (COL_RELEASE_DATE, "2024-01-15"),
      (COL_THUMBNAIL, ""),
      (COL_THUMBNAIL_MAXRES, ""),
      (COL_VIEWS, "1000"),
      (COL_LIKES, "100"),
      (COL_DISLIKES, "1"),
      (COL_COMMENTS, "10"),
      (COL_SHARES, "5"),
      (COL_SUBS_GAINED, "20"),
      (COL_SUBS_LOST, "2"),
      (COL_MINUTES_WATCHED, "5000"),
      (COL_AVG_DURATION, "300"),
      (COL_AVG_PERCENTAGE, "42.5"),
      (COL_DESCRIPTION, "desc"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
      r.insert(k.to_string(), v.to_string());
    }
    r
  }

  pub(crate) fn episode(id: &str, name: &str, overrides: &[(&str, &str)]) -> Episode {
    Episode::from_raw(0, &raw_row(id, name, overrides)).0
  }

  // --- parse_int ---

  #[test]
  fn parse_int_plain_and_signed() {
    assert_eq!(parse_int("1234"), Some(1234));
    assert_eq!(parse_int("  42"), Some(42));
    assert_eq!(parse_int("-7"), Some(-7));
    assert_eq!(parse_int("+7"), Some(7));
  }

  #[test]
  fn parse_int_takes_leading_digits() {
    assert_eq!(parse_int("12abc"), Some(12));
    assert_eq!(parse_int("1,234"), Some(1));
    assert_eq!(parse_int("3.9"), Some(3));
  }

  #[test]
  fn parse_int_saturates_on_overflow() {
    assert_eq!(parse_int("99999999999999999999"), Some(i64::MAX));
    assert_eq!(parse_int("-99999999999999999999"), Some(i64::MIN));
    assert_eq!(parse_int("9223372036854775807"), Some(i64::MAX));
  }

  #[test]
  fn parse_int_rejects_non_numeric() {
    assert_eq!(parse_int(""), None);
    assert_eq!(parse_int("abc"), None);
    assert_eq!(parse_int("-"), None);
    assert_eq!(parse_int("NaN"), None);
  }

  #[test]
  fn parse_float_leading_number() {
    assert_eq!(parse_float("45.25"), Some(45.25));
    assert_eq!(parse_float("45.2%"), Some(45.2));
    assert_eq!(parse_float("pct"), None);
    assert_eq!(parse_float(""), None);
  }

  // --- parse_release_date ---

  #[test]
  fn release_date_layouts() {
    let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(0, 0, 0).unwrap();
    assert_eq!(parse_release_date("2024-03-09"), Some(day));
    assert_eq!(parse_release_date("2024/03/09"), Some(day));
    assert_eq!(parse_release_date("03/09/2024"), Some(day));
    assert_eq!(parse_release_date("2024-03-09T00:00:00Z"), Some(day));
    assert_eq!(parse_release_date("2024-03-09 00:00:00"), Some(day));
    assert_eq!(parse_release_date("someday"), None);
    assert_eq!(parse_release_date(""), None);
  }

  // --- conversion ---

  #[test]
  fn from_raw_parses_all_fields() {
    let (ep, issues) = Episode::from_raw(0, &raw_row("abc", "Hello", &[]));
    assert!(issues.is_empty(), "{:?}", issues);
    assert_eq!(ep.id, "abc");
    assert_eq!(ep.views, Some(1000));
    assert_eq!(ep.subscribers_lost, Some(2));
    assert_eq!(ep.average_view_percentage, Some(42.5));
    assert!(ep.released.is_some());
  }

  #[test]
  fn from_raw_reports_each_bad_field() {
    let (ep, issues) =
      Episode::from_raw(3, &raw_row("abc", "Hello", &[(COL_VIEWS, "lots"), (COL_RELEASE_DATE, "soon")]));
    assert_eq!(ep.views, None);
    assert_eq!(ep.released, None);
    let fields: Vec<&str> = issues.iter().map(|i| i.field).collect();
    assert_eq!(fields, vec![COL_VIEWS, COL_RELEASE_DATE]);
    assert!(issues.iter().all(|i| i.row == 3 && i.episode_id == "abc"));
  }

  #[test]
  fn from_raw_missing_columns_become_none() {
    let mut raw = RawRecord::new();
    raw.insert(COL_ID.to_string(), "x".to_string());
    let (ep, issues) = Episode::from_raw(0, &raw);
    assert_eq!(ep.name, "");
    assert_eq!(ep.likes, None);
    assert!(!issues.is_empty());
  }

  #[test]
  fn convert_drops_duplicate_ids() {
    let rows = vec![raw_row("a", "First", &[]), raw_row("b", "Second", &[]), raw_row("a", "Again", &[])];
    let catalog = convert_records(&rows);
    let names: Vec<&str> = catalog.episodes.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Second"]);
    assert_eq!(catalog.issues.len(), 1);
    assert_eq!(catalog.issues[0].field, COL_ID);
    assert_eq!(catalog.issues[0].row, 2);
  }

  // --- links ---

  #[test]
  fn links_embed_the_episode_id() {
    let ep = episode("dQw4w9WgXcQ", "Song", &[]);
    assert_eq!(ep.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    assert_eq!(ep.embed_url(), "https://www.youtube.com/embed/dQw4w9WgXcQ");
  }

  #[test]
  fn thumbnail_candidates_prefer_csv_urls() {
    let ep = episode("id1", "T", &[(COL_THUMBNAIL, "https://a/small.jpg"), (COL_THUMBNAIL_MAXRES, "https://a/big.jpg")]);
    let urls = ep.thumbnail_candidates();
    assert_eq!(urls[0], "https://a/big.jpg");
    assert_eq!(urls[1], "https://a/small.jpg");
    assert!(urls[2].contains("id1"));
  }

  // --- formatting ---

  #[test]
  fn format_count_groups_thousands() {
    assert_eq!(format_count(Some(0)), "0");
    assert_eq!(format_count(Some(999)), "999");
    assert_eq!(format_count(Some(1000)), "1,000");
    assert_eq!(format_count(Some(1234567)), "1,234,567");
    assert_eq!(format_count(Some(-4500)), "-4,500");
    assert_eq!(format_count(None), "n/a");
  }

  #[test]
  fn format_duration_layouts() {
    assert_eq!(format_duration(Some(59)), "0:59");
    assert_eq!(format_duration(Some(3725)), "1:02:05");
    assert_eq!(format_duration(None), "n/a");
  }
}
