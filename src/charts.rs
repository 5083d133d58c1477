//! Chart datasets derived from a single episode for the detail overlay.
//!
//! Chart kinds and their palettes live in a process-wide registry that is
//! built on first access; later lookups reuse it.

use ratatui::style::Color;
use std::sync::LazyLock;

use crate::episode::{Episode, format_count, format_duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
  Subscribers,
  Interactions,
  Engagement,
  Performance,
}

impl ChartKind {
  pub const ALL: [ChartKind; 4] =
    [ChartKind::Subscribers, ChartKind::Interactions, ChartKind::Engagement, ChartKind::Performance];
}

/// Presentation registered for one chart kind.
#[derive(Debug)]
pub struct ChartStyle {
  pub kind: ChartKind,
  pub title: &'static str,
  pub colors: Vec<Color>,
}

#[derive(Debug)]
pub struct ChartRegistry {
  styles: Vec<ChartStyle>,
}

impl ChartRegistry {
  pub fn style(&self, kind: ChartKind) -> &ChartStyle {
    // Safety: the registry is built from ChartKind::ALL, so every kind is present.
    self.styles.iter().find(|s| s.kind == kind).expect("every chart kind is registered")
  }

  /// Colour for bar `i`, cycling through the palette.
  pub fn color(&self, kind: ChartKind, i: usize) -> Color {
    let colors = &self.style(kind).colors;
    colors.get(i % colors.len().max(1)).copied().unwrap_or(Color::Reset)
  }
}

const GREEN: Color = Color::Rgb(16, 185, 129); // #10b981
const RED: Color = Color::Rgb(239, 68, 68); // #ef4444
const MINT: Color = Color::Rgb(52, 211, 153); // #34d399
const YELLOW: Color = Color::Rgb(250, 204, 21); // #facc15
const PEACH: Color = Color::Rgb(253, 186, 116); // #fdba74
const BLUE: Color = Color::Rgb(59, 130, 246); // #3b82f6
const VIOLET: Color = Color::Rgb(167, 139, 250); // #a78bfa

static REGISTRY: LazyLock<ChartRegistry> = LazyLock::new(|| {
  tracing::debug!("charts: registering chart kinds");
  let styles = ChartKind::ALL
    .iter()
    .map(|&kind| match kind {
      ChartKind::Subscribers => ChartStyle { kind, title: "Subscribers", colors: vec![GREEN, RED] },
      ChartKind::Interactions => ChartStyle { kind, title: "Interactions", colors: vec![MINT, YELLOW, PEACH] },
      ChartKind::Engagement => ChartStyle { kind, title: "Engagement", colors: vec![MINT, RED, YELLOW, PEACH] },
      ChartKind::Performance => ChartStyle { kind, title: "Performance", colors: vec![BLUE, VIOLET, GREEN] },
    })
    .collect();
  ChartRegistry { styles }
});

/// The chart registry, built once per process.
pub fn registry() -> &'static ChartRegistry {
  &REGISTRY
}

// --- Datasets ---

/// Gained vs lost subscribers as a two-way split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubscriberSplit {
  pub gained: Option<i64>,
  pub lost: Option<i64>,
}

impl SubscriberSplit {
  pub fn from_episode(ep: &Episode) -> Self {
    Self { gained: ep.subscribers_gained, lost: ep.subscribers_lost }
  }

  /// Share of the total that was gained, in `0.0..=1.0`. `None` when there is
  /// nothing to split.
  pub fn gained_ratio(&self) -> Option<f64> {
    let gained = self.gained.unwrap_or(0).max(0) as f64;
    let lost = self.lost.unwrap_or(0).max(0) as f64;
    let total = gained + lost;
    if total <= 0.0 { None } else { Some(gained / total) }
  }

  pub fn net(&self) -> Option<i64> {
    Some(self.gained? - self.lost?)
  }
}

/// One bar of a chart: label, raw value and the text shown beside it.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPoint {
  pub label: &'static str,
  pub value: Option<f64>,
  pub caption: String,
}

impl BarPoint {
  /// Height for a bar chart; missing and negative values draw as zero.
  pub fn bar_height(&self) -> u64 {
    self.value.filter(|v| v.is_finite() && *v > 0.0).map_or(0, |v| v.round() as u64)
  }
}

/// Percentage of `views` that `value` represents, for interaction tooltips.
pub fn share_of_views(value: Option<i64>, views: Option<i64>) -> Option<f64> {
  let views = views.filter(|v| *v != 0)?;
  Some(value? as f64 / views as f64 * 100.0)
}

fn share_caption(value: Option<i64>, views: Option<i64>) -> String {
  match share_of_views(value, views) {
    Some(pct) => format!("{} ({:.2}% of total viewers)", format_count(value), pct),
    None => format!("{} (n/a% of total viewers)", format_count(value)),
  }
}

fn count_bar(label: &'static str, value: Option<i64>) -> BarPoint {
  BarPoint { label, value: value.map(|v| v as f64), caption: format_count(value) }
}

/// Likes, comments and shares, each captioned with its share of total views.
pub fn interactions(ep: &Episode) -> Vec<BarPoint> {
  [("Likes", ep.likes), ("Comments", ep.comments), ("Shares", ep.shares)]
    .into_iter()
    .map(|(label, value)| BarPoint { label, value: value.map(|v| v as f64), caption: share_caption(value, ep.views) })
    .collect()
}

/// Aggregate engagement counts.
pub fn engagement(ep: &Episode) -> Vec<BarPoint> {
  vec![
    count_bar("Likes", ep.likes),
    count_bar("Dislikes", ep.dislikes),
    count_bar("Comments", ep.comments),
    count_bar("Shares", ep.shares),
  ]
}

/// One watch-time metric drawn against its own full scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Meter {
  pub label: &'static str,
  /// Filled share in `0.0..=1.0`; `None` when the scale cannot be derived.
  pub ratio: Option<f64>,
  pub caption: String,
}

fn ratio_of(value: Option<f64>, full: Option<f64>) -> Option<f64> {
  let (value, full) = (value?, full?);
  if !value.is_finite() || !full.is_finite() || full <= 0.0 {
    return None;
  }
  Some((value / full).clamp(0.0, 1.0))
}

/// Watch-time metrics. Their units differ, so each is measured against its own
/// ceiling: the video length implied by duration and percentage, and the minutes
/// every viewer would have spent watching it through.
pub fn performance(ep: &Episode) -> Vec<Meter> {
  let pct = ep.average_view_percentage;
  let duration = ep.average_view_duration.map(|v| v as f64);
  let length_secs = pct.filter(|p| *p > 0.0).and_then(|p| Some(duration? * 100.0 / p));
  let full_minutes = length_secs.and_then(|len| Some(ep.views? as f64 * len / 60.0));

  vec![
    Meter {
      label: "Minutes watched",
      ratio: ratio_of(ep.estimated_minutes_watched.map(|v| v as f64), full_minutes),
      caption: format_count(ep.estimated_minutes_watched),
    },
    Meter {
      label: "Avg duration",
      ratio: ratio_of(duration, length_secs),
      caption: format_duration(ep.average_view_duration),
    },
    Meter {
      label: "Avg % viewed",
      ratio: ratio_of(pct, Some(100.0)),
      caption: pct.map_or_else(|| "n/a".to_string(), |p| format!("{:.2}%", p)),
    },
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::episode::tests::episode;
  use crate::episode::{
    COL_AVG_PERCENTAGE, COL_COMMENTS, COL_LIKES, COL_MINUTES_WATCHED, COL_SHARES, COL_SUBS_GAINED, COL_SUBS_LOST,
    COL_VIEWS,
  };

  #[test]
  fn registry_is_built_once() {
    let a = registry();
    let b = registry();
    assert!(std::ptr::eq(a, b));
    for kind in ChartKind::ALL {
      assert!(!a.style(kind).colors.is_empty());
    }
  }

  #[test]
  fn registry_colors_cycle() {
    let r = registry();
    assert_eq!(r.color(ChartKind::Subscribers, 0), GREEN);
    assert_eq!(r.color(ChartKind::Subscribers, 1), RED);
    assert_eq!(r.color(ChartKind::Subscribers, 2), GREEN);
  }

  #[test]
  fn subscriber_split_ratio() {
    let ep = episode("a", "A", &[(COL_SUBS_GAINED, "30"), (COL_SUBS_LOST, "10")]);
    let split = SubscriberSplit::from_episode(&ep);
    assert_eq!(split.gained_ratio(), Some(0.75));
    assert_eq!(split.net(), Some(20));
  }

  #[test]
  fn subscriber_split_empty() {
    let ep = episode("a", "A", &[(COL_SUBS_GAINED, "0"), (COL_SUBS_LOST, "bad")]);
    let split = SubscriberSplit::from_episode(&ep);
    assert_eq!(split.gained_ratio(), None);
    assert_eq!(split.net(), None);
  }

  #[test]
  fn interactions_caption_share_of_views() {
    let ep = episode("a", "A", &[(COL_VIEWS, "2000"), (COL_LIKES, "150"), (COL_COMMENTS, "1"), (COL_SHARES, "0")]);
    let bars = interactions(&ep);
    let labels: Vec<&str> = bars.iter().map(|b| b.label).collect();
    assert_eq!(labels, vec!["Likes", "Comments", "Shares"]);
    assert_eq!(bars[0].caption, "150 (7.50% of total viewers)");
    assert_eq!(bars[1].caption, "1 (0.05% of total viewers)");
    assert_eq!(bars[2].caption, "0 (0.00% of total viewers)");
  }

  #[test]
  fn interactions_without_views() {
    let ep = episode("a", "A", &[(COL_VIEWS, "0"), (COL_LIKES, "5")]);
    assert_eq!(share_of_views(ep.likes, ep.views), None);
    assert_eq!(interactions(&ep)[0].caption, "5 (n/a% of total viewers)");
  }

  #[test]
  fn bar_height_floors_missing_and_negative() {
    let ep = episode("a", "A", &[(COL_LIKES, "junk")]);
    assert_eq!(engagement(&ep)[0].bar_height(), 0);
    let neg = BarPoint { label: "x", value: Some(-3.0), caption: String::new() };
    assert_eq!(neg.bar_height(), 0);
  }

  #[test]
  fn performance_meters_have_their_own_scale() {
    let ep = episode("a", "A", &[(COL_MINUTES_WATCHED, "48211093"), (COL_VIEWS, "1843210")]);
    let meters = performance(&ep);
    for m in &meters {
      let r = m.ratio.unwrap();
      assert!(r > 0.0 && r <= 1.0, "{}: {}", m.label, r);
    }
    assert!((meters[1].ratio.unwrap() - 0.425).abs() < 1e-9);
    assert!((meters[2].ratio.unwrap() - 0.425).abs() < 1e-9);
  }

  #[test]
  fn performance_without_percentage_has_no_scale() {
    let ep = episode("a", "A", &[(COL_AVG_PERCENTAGE, "n/a")]);
    let meters = performance(&ep);
    assert!(meters.iter().all(|m| m.ratio.is_none()));
    assert_eq!(meters[1].caption, "5:00");
  }

  #[test]
  fn performance_captions_use_units() {
    let ep = episode("a", "A", &[]);
    let bars = performance(&ep);
    assert_eq!(bars[0].caption, "5,000");
    assert_eq!(bars[1].caption, "5:00");
    assert_eq!(bars[2].caption, "42.50%");
  }
}
