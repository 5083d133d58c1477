use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Padding, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, AppMode, LoadState, PageTarget};
use crate::browse::{page_window, show_ellipsis};
use crate::constants::constants;
use crate::detail;
use crate::episode::format_count;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` display columns, appending "…" if truncated.
pub fn truncate_str(s: &str, max_width: usize) -> String {
  if s.width() <= max_width {
    return s.to_string();
  }
  let mut out = String::new();
  let mut used = 0;
  for c in s.chars() {
    let w = c.width().unwrap_or(0);
    if used + w + 1 > max_width {
      break;
    }
    used += w;
    out.push(c);
  }
  out.push('…');
  out
}

/// Grid columns for a given width: one on narrow terminals, up to three on wide ones.
pub fn grid_columns_for(width: u16) -> usize {
  match width {
    0..80 => 1,
    80..120 => 2,
    _ => 3,
  }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();
  app.hits.cards.clear();
  app.hits.page_buttons.clear();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, controls_area, main_area, pager_area, status_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_controls(frame, app, controls_area);
  render_main(frame, app, main_area);
  render_pager(frame, app, pager_area);
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);

  if app.detail.is_some() {
    detail::render_detail(frame, app, frame.area());
  }
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(vec![
    Span::styled(" ▦ epgrid ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled("Podcast Episode Search", Style::default().fg(theme.fg)),
  ]);
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_controls(frame: &mut Frame, app: &mut App, area: Rect) {
  let [search_area, sort_area] = Layout::horizontal([Constraint::Min(20), Constraint::Length(28)]).areas(area);
  render_search(frame, app, search_area);

  let theme = app.theme();
  let sort_block = Block::bordered()
    .title(" Sort (s) ")
    .title_style(Style::default().fg(theme.muted))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1));
  let label = Paragraph::new(Line::from(vec![
    Span::styled("by ", Style::default().fg(theme.muted)),
    Span::styled(app.sort_key.label(), Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)),
    Span::styled(" ▾", Style::default().fg(theme.muted)),
  ]))
  .block(sort_block);
  frame.render_widget(label, sort_area);
  app.hits.sort = Some(sort_area);
}

fn render_search(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::Search;
  let border_color = if focused { theme.accent } else { theme.border };
  let block = Block::bordered()
    .title(" Search episodes (/) ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));
  app.hits.search = Some(area);

  if app.query.is_empty() && !focused {
    let placeholder = Paragraph::new(Span::styled("Search for a podcast", Style::default().fg(theme.muted)));
    frame.render_widget(placeholder.block(block), area);
    return;
  }

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.query, app.query_cursor);

  if cursor_col < app.query_scroll {
    app.query_scroll = cursor_col;
  } else if cursor_col >= app.query_scroll + inner_w {
    app.query_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .query
    .chars()
    .scan(0usize, |col, c| {
      let w = c.width().unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.query_scroll)
    .take_while(|(start, _, _)| *start < app.query_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  frame.render_widget(Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(block), area);

  if focused {
    let cursor_x = area.x + 2 + (cursor_col - app.query_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_message(frame: &mut Frame, area: Rect, text: String, style: Style) {
  let [_, middle, _] = Layout::vertical([Constraint::Fill(1), Constraint::Length(1), Constraint::Fill(1)]).areas(area);
  frame.render_widget(Paragraph::new(text).style(style).alignment(Alignment::Center), middle);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  match app.load_state.clone() {
    LoadState::Failed(msg) => {
      render_message(frame, area, format!("Error: {}", msg), Style::default().fg(theme.error));
    }
    LoadState::Loading => {
      render_message(frame, area, "Loading data...".to_string(), Style::default().fg(theme.muted));
    }
    LoadState::Ready if app.page_slice().is_empty() => {
      render_message(frame, area, "No data available.".to_string(), Style::default().fg(theme.muted));
    }
    LoadState::Ready => render_grid(frame, app, area),
  }
}

fn render_grid(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let cols = grid_columns_for(area.width);
  app.grid_columns = cols;

  let card_h = constants().grid_card_height;
  let visible_rows = (area.height / card_h).max(1) as usize;
  let selected_row = app.selected / cols;
  if selected_row < app.grid_scroll {
    app.grid_scroll = selected_row;
  } else if selected_row >= app.grid_scroll + visible_rows {
    app.grid_scroll = selected_row + 1 - visible_rows;
  }

  let col_w = area.width / cols as u16;
  let first = app.grid_scroll * cols;
  let indices: Vec<usize> = app.page_indices().iter().copied().skip(first).take(visible_rows * cols).collect();

  for (offset, ep_idx) in indices.into_iter().enumerate() {
    let pos = first + offset;
    let (row, col) = (offset / cols, offset % cols);
    let y = area.y + row as u16 * card_h;
    let card = Rect {
      x: area.x + col as u16 * col_w,
      y,
      width: if col + 1 == cols { area.width - col as u16 * col_w } else { col_w },
      height: card_h.min(area.bottom().saturating_sub(y)),
    };
    let is_selected = pos == app.selected;
    let episode = &app.episodes[ep_idx];
    let inner_w = card.width.saturating_sub(4) as usize;

    let border = if is_selected { theme.accent } else { theme.border };
    let name_style = if is_selected {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)
    };
    let lines = vec![
      Line::from(Span::styled(truncate_str(&episode.name, inner_w), name_style)),
      Line::from(Span::styled(truncate_str(&episode.release_date, inner_w), Style::default().fg(theme.muted))),
      Line::from(Span::styled(
        truncate_str(
          &format!("{} views · {} likes", format_count(episode.views), format_count(episode.likes)),
          inner_w,
        ),
        Style::default().fg(theme.muted),
      )),
    ];
    let block = Block::bordered()
      .border_type(if is_selected { BorderType::Thick } else { BorderType::Rounded })
      .border_style(Style::default().fg(border))
      .style(Style::default().bg(if pos % 2 == 1 { theme.stripe_bg } else { theme.card_bg }))
      .padding(Padding::horizontal(1));
    frame.render_widget(Paragraph::new(lines).block(block), card);
    app.hits.cards.push((card, pos));
  }
}

/// Pager labels and their click targets, in display order.
pub fn pager_items(current: usize, total: usize) -> Vec<(String, Option<PageTarget>)> {
  let mut items = vec![(" < ".to_string(), Some(PageTarget::Prev))];
  for p in page_window(current, total, constants().page_window) {
    items.push((format!(" {} ", p), Some(PageTarget::Page(p))));
  }
  if show_ellipsis(current, total) {
    items.push((" ... ".to_string(), None));
  }
  items.push((" > ".to_string(), Some(PageTarget::Next)));
  items
}

fn render_pager(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let total = app.total_pages();
  if app.load_state != LoadState::Ready || total == 0 {
    return;
  }

  let items = pager_items(app.page, total);
  let gap = 1u16;
  let width: u16 = items.iter().map(|(l, _)| l.width() as u16 + gap).sum::<u16>().saturating_sub(gap);
  let mut x = area.x + area.width.saturating_sub(width) / 2;

  let mut spans = Vec::with_capacity(items.len() * 2);
  for (label, target) in items {
    let w = label.width() as u16;
    let style = match target {
      Some(PageTarget::Page(p)) if p == app.page => {
        Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
      }
      Some(PageTarget::Prev) if app.page <= 1 => Style::default().fg(theme.muted).add_modifier(Modifier::DIM),
      Some(PageTarget::Next) if app.page >= total => Style::default().fg(theme.muted).add_modifier(Modifier::DIM),
      Some(_) => Style::default().fg(theme.key_fg).bg(theme.key_bg),
      None => Style::default().fg(theme.muted),
    };
    if let Some(t) = target {
      app.hits.page_buttons.push((Rect { x, y: area.y, width: w, height: 1 }, t));
    }
    spans.push(Span::styled(label, style));
    spans.push(Span::raw(" "));
    x += w + gap;
  }
  spans.pop();

  frame.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if app.load_state == LoadState::Ready {
    let shown = app.page_slice();
    let summary = if app.view.is_empty() {
      "0 matching episodes".to_string()
    } else {
      format!(
        "{}–{} of {} episodes · page {}/{}",
        shown.start + 1,
        shown.end,
        app.view.len(),
        app.page,
        app.total_pages()
      )
    };
    match &app.info_message {
      Some(info) => (format!(" ℹ {} · {}", info, summary), Style::default().fg(theme.status)),
      None => (format!(" {}", summary), Style::default().fg(theme.muted)),
    }
  } else {
    (format!(" {}", app.source), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Browse => vec![
      ("←↑↓→", "Move"),
      ("Enter", "Details"),
      ("[ ]", "Page"),
      ("/", "Search"),
      ("s", "Sort"),
      ("^t", "Theme"),
      ("q", "Quit"),
    ],
    AppMode::Search => vec![("Enter", "Done"), ("Esc", "Clear"), ("↓", "Grid")],
    AppMode::Detail => vec![("o", "Watch"), ("e", "Embed"), ("Tab", "Charts"), ("j/k", "Scroll"), ("Esc", "Close")],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
