use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Bar, BarChart, BarGroup, Block, BorderType, Clear, Gauge, Padding, Paragraph, Wrap},
};

use crate::app::{App, ChartPage, ThumbState};
use crate::charts::{self, BarPoint, ChartKind, Meter, SubscriberSplit, registry};
use crate::episode::{Episode, format_count};
use crate::graphics::{ThumbnailWidget, fit_to_area};
use crate::theme::Theme;
use crate::ui::truncate_str;

const CLOSE_LABEL: &str = " ✖ ";

/// Centre a `percent_x` by `percent_y` rectangle inside `area`.
pub fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
  let [_, middle, _] = Layout::vertical([
    Constraint::Percentage((100 - percent_y) / 2),
    Constraint::Percentage(percent_y),
    Constraint::Percentage((100 - percent_y) / 2),
  ])
  .areas(area);
  let [_, center, _] = Layout::horizontal([
    Constraint::Percentage((100 - percent_x) / 2),
    Constraint::Percentage(percent_x),
    Constraint::Percentage((100 - percent_x) / 2),
  ])
  .areas(middle);
  center
}

pub fn render_detail(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let Some(index) = app.detail.as_ref().map(|d| d.episode) else { return };
  let Some(episode) = app.episodes.get(index) else { return };

  let popup = centered_rect(area, 90, 90);
  frame.render_widget(Clear, popup);

  let block = Block::bordered()
    .title(format!(" {} ", truncate_str(&episode.name, popup.width.saturating_sub(8) as usize)))
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.accent))
    .style(Style::default().bg(theme.card_bg));
  let inner = block.inner(popup);
  frame.render_widget(block, popup);

  let close_w = CLOSE_LABEL.chars().count() as u16;
  let close = Rect { x: popup.right().saturating_sub(close_w + 1), y: popup.y, width: close_w, height: 1 };
  frame.render_widget(Span::styled(CLOSE_LABEL, Style::default().fg(theme.error).add_modifier(Modifier::BOLD)), close);
  app.hits.overlay = Some(popup);
  app.hits.close = Some(close);

  let direction = if inner.width >= 90 { Direction::Horizontal } else { Direction::Vertical };
  let [info_area, chart_area] =
    Layout::default().direction(direction).constraints([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(inner);

  let info_area = if app.display_mode.shows_thumbnails() {
    let thumb_h = (info_area.height / 2).min(14);
    let [thumb_area, rest] = Layout::vertical([Constraint::Length(thumb_h), Constraint::Min(3)]).areas(info_area);
    render_thumbnail(frame, app, index, thumb_area);
    rest
  } else {
    info_area
  };

  let Some(episode) = app.episodes.get(index) else { return };
  let scroll = app.detail.as_ref().map_or(0, |d| d.scroll);
  render_info(frame, theme, episode, scroll, info_area);

  let page = app.detail.as_ref().map_or(ChartPage::Audience, |d| d.chart_page);
  match page {
    ChartPage::Audience => render_audience(frame, theme, episode, chart_area),
    ChartPage::Overview => render_overview(frame, theme, episode, chart_area),
  }
}

fn render_thumbnail(frame: &mut Frame, app: &mut App, index: usize, area: Rect) {
  let theme = app.theme();
  let display_mode = app.display_mode;
  let inner = Rect { x: area.x + 1, width: area.width.saturating_sub(2), ..area };
  let Some(detail) = app.detail.as_mut().filter(|d| d.episode == index) else { return };

  let image = match &detail.thumbnail {
    ThumbState::Ready(image) => image,
    pending => {
      let text = if matches!(pending, ThumbState::Loading) { "Loading thumbnail..." } else { "No thumbnail" };
      frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(theme.muted)).centered(),
        Rect { y: area.y + area.height / 2, height: 1u16.min(area.height), ..area },
      );
      return;
    }
  };

  let stale = detail.resized_thumb.as_ref().is_none_or(|(w, h, _)| (*w, *h) != (inner.width, inner.height));
  if stale {
    detail.resized_thumb = Some((inner.width, inner.height, fit_to_area(image, inner, display_mode)));
  }
  if let Some((_, _, resized)) = detail.resized_thumb.as_ref() {
    frame.render_widget(ThumbnailWidget { image: resized, display_mode }, inner);
  }
}

fn stat_line<'a>(theme: &Theme, label: &'a str, value: String) -> Line<'a> {
  Line::from(vec![
    Span::styled(format!("{:<10}", label), Style::default().fg(theme.muted)),
    Span::styled(value, Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)),
  ])
}

fn render_info(frame: &mut Frame, theme: &Theme, episode: &Episode, scroll: u16, area: Rect) {
  let mut lines = vec![
    Line::from(Span::styled(episode.name.clone(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(Span::styled(episode.release_date.clone(), Style::default().fg(theme.muted))),
    Line::from(""),
    stat_line(theme, "Likes", format_count(episode.likes)),
    stat_line(theme, "Dislikes", format_count(episode.dislikes)),
    stat_line(theme, "Views", format_count(episode.views)),
    stat_line(theme, "Comments", format_count(episode.comments)),
    Line::from(""),
    Line::from(vec![
      Span::styled("Watch  ", Style::default().fg(theme.muted)),
      Span::styled(episode.watch_url(), Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED)),
    ]),
    Line::from(vec![
      Span::styled("Embed  ", Style::default().fg(theme.muted)),
      Span::styled(episode.embed_url(), Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED)),
    ]),
  ];
  if !episode.description.is_empty() {
    lines.push(Line::from(""));
    lines.extend(episode.description.lines().map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(theme.fg)))));
  }

  let block = Block::default().padding(Padding::horizontal(1));
  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((scroll, 0)).block(block), area);
}

fn chart_block(theme: &Theme, kind: ChartKind, hint: &str) -> Block<'static> {
  Block::bordered()
    .title(format!(" {} ", registry().style(kind).title))
    .title_bottom(Line::from(format!(" {} ", hint)).right_aligned())
    .title_style(Style::default().fg(theme.accent))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
}

fn bar_chart<'a>(theme: &Theme, kind: ChartKind, points: &'a [BarPoint], hint: &str) -> BarChart<'a> {
  let bars: Vec<Bar> = points
    .iter()
    .enumerate()
    .map(|(i, p)| {
      let color = registry().color(kind, i);
      Bar::default()
        .value(p.bar_height())
        .label(Line::from(p.label))
        .text_value(p.caption.clone())
        .style(Style::default().fg(color))
        .value_style(Style::default().fg(theme.bg).bg(color))
    })
    .collect();
  BarChart::default()
    .block(chart_block(theme, kind, hint))
    .direction(Direction::Horizontal)
    .bar_width(1)
    .bar_gap(1)
    .label_style(Style::default().fg(theme.fg))
    .data(BarGroup::default().bars(&bars))
}

fn render_audience(frame: &mut Frame, theme: &Theme, episode: &Episode, area: Rect) {
  let [gauge_area, bars_area] = Layout::vertical([Constraint::Length(5), Constraint::Min(5)]).areas(area);

  let split = SubscriberSplit::from_episode(episode);
  let label = format!(
    "+{} gained / -{} lost (net {})",
    format_count(split.gained),
    format_count(split.lost),
    format_count(split.net())
  );
  let gauge = Gauge::default()
    .block(chart_block(theme, ChartKind::Subscribers, "Tab: more charts"))
    .gauge_style(
      Style::default()
        .fg(registry().color(ChartKind::Subscribers, 0))
        .bg(registry().color(ChartKind::Subscribers, 1)),
    )
    .ratio(split.gained_ratio().unwrap_or(0.0))
    .label(Span::styled(label, Style::default().fg(theme.bg).add_modifier(Modifier::BOLD)));
  frame.render_widget(gauge, gauge_area);

  let points = charts::interactions(episode);
  frame.render_widget(bar_chart(theme, ChartKind::Interactions, &points, "share of views"), bars_area);
}

fn render_overview(frame: &mut Frame, theme: &Theme, episode: &Episode, area: Rect) {
  let [top, bottom] = Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(area);
  let engagement = charts::engagement(episode);
  frame.render_widget(bar_chart(theme, ChartKind::Engagement, &engagement, "Tab: audience"), top);
  render_performance(frame, theme, &charts::performance(episode), bottom);
}

fn render_performance(frame: &mut Frame, theme: &Theme, meters: &[Meter], area: Rect) {
  let block = chart_block(theme, ChartKind::Performance, "own scale each");
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let rows = Layout::vertical(meters.iter().flat_map(|_| [Constraint::Length(1), Constraint::Length(1)])).split(inner);
  for (i, meter) in meters.iter().enumerate() {
    let color = registry().color(ChartKind::Performance, i);
    frame.render_widget(
      Line::from(vec![
        Span::styled(format!("{}  ", meter.label), Style::default().fg(theme.fg)),
        Span::styled(meter.caption.clone(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
      ]),
      rows[i * 2],
    );
    let gauge = Gauge::default()
      .gauge_style(Style::default().fg(color).bg(theme.stripe_bg))
      .ratio(meter.ratio.unwrap_or(0.0))
      .label(meter.ratio.map_or_else(|| "n/a".to_string(), |r| format!("{:.0}%", r * 100.0)));
    frame.render_widget(gauge, rows[i * 2 + 1]);
  }
}
