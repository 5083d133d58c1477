use ratatui::crossterm::event::{self, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tracing::debug;

use crate::app::{App, AppMode};
use crate::youtube::open_in_browser;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  match app.mode {
    AppMode::Browse => handle_browse_key(app, key),
    AppMode::Search => handle_search_key(app, key),
    AppMode::Detail => handle_detail_key(app, key),
  }
}

fn handle_browse_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Left | KeyCode::Char('h') => app.move_selection(-1, 0),
    KeyCode::Right | KeyCode::Char('l') => app.move_selection(1, 0),
    KeyCode::Up | KeyCode::Char('k') => app.move_selection(0, -1),
    KeyCode::Down | KeyCode::Char('j') => app.move_selection(0, 1),
    KeyCode::Enter => app.open_selected(),
    KeyCode::Char('/') => app.mode = AppMode::Search,
    KeyCode::Char('s') => app.cycle_sort(),
    KeyCode::Char('[') | KeyCode::PageUp => app.prev_page(),
    KeyCode::Char(']') | KeyCode::PageDown => app.next_page(),
    KeyCode::Home => app.go_to_page(1),
    KeyCode::End => app.go_to_page(app.total_pages()),
    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
    _ => {}
  }
}

fn handle_search_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.query, app.query_cursor);
      app.query.insert(byte_idx, c);
      app.query_cursor += 1;
      app.query_changed();
    }
    KeyCode::Backspace => {
      if app.query_cursor > 0 {
        app.query_cursor -= 1;
        let byte_idx = char_to_byte_index(&app.query, app.query_cursor);
        app.query.remove(byte_idx);
        app.query_changed();
      }
    }
    KeyCode::Delete => {
      if app.query_cursor < app.query.chars().count() {
        let byte_idx = char_to_byte_index(&app.query, app.query_cursor);
        app.query.remove(byte_idx);
        app.query_changed();
      }
    }
    KeyCode::Left => {
      app.query_cursor = app.query_cursor.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.query_cursor < app.query.chars().count() {
        app.query_cursor += 1;
      }
    }
    KeyCode::Home => {
      app.query_cursor = 0;
    }
    KeyCode::End => {
      app.query_cursor = app.query.chars().count();
    }
    KeyCode::Enter | KeyCode::Down => {
      app.mode = AppMode::Browse;
    }
    KeyCode::Esc => {
      app.clear_query();
      app.mode = AppMode::Browse;
    }
    _ => {}
  }
}

fn handle_detail_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Esc | KeyCode::Char('q') => app.close_detail(),
    KeyCode::Tab | KeyCode::BackTab => app.cycle_chart_page(),
    KeyCode::Down | KeyCode::Char('j') => app.scroll_detail(1),
    KeyCode::Up | KeyCode::Char('k') => app.scroll_detail(-1),
    KeyCode::Char('o') => open_link(app, false),
    KeyCode::Char('e') => open_link(app, true),
    _ => {}
  }
}

fn open_link(app: &mut App, embed: bool) {
  let Some(episode) = app.detail_episode() else { return };
  let url = if embed { episode.embed_url() } else { episode.watch_url() };
  debug!(url = %url, "opening link");
  if let Err(e) = open_in_browser(&url) {
    app.set_error(format!("Failed to open browser: {:#}", e));
  }
}

/// Route a mouse event through the hitboxes recorded by the last draw.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
  let (col, row) = (mouse.column, mouse.row);
  match mouse.kind {
    MouseEventKind::Down(MouseButton::Left) => {
      if app.mode == AppMode::Detail {
        // Clicks on the panel stay open; the backdrop and the close button dismiss.
        if app.hits.on_close(col, row) || !app.hits.on_overlay(col, row) {
          app.close_detail();
        }
        return;
      }
      if let Some(pos) = app.hits.card_at(col, row) {
        app.open_card(pos);
      } else if let Some(target) = app.hits.page_button_at(col, row) {
        app.activate_page_target(target);
      } else if app.hits.on_search(col, row) {
        app.mode = AppMode::Search;
      } else if app.hits.on_sort(col, row) {
        app.cycle_sort();
      } else if app.mode == AppMode::Search {
        app.mode = AppMode::Browse;
      }
    }
    MouseEventKind::ScrollDown => {
      if app.mode == AppMode::Detail {
        app.scroll_detail(1);
      } else {
        app.move_selection(0, 1);
      }
    }
    MouseEventKind::ScrollUp => {
      if app.mode == AppMode::Detail {
        app.scroll_detail(-1);
      } else {
        app.move_selection(0, -1);
      }
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::PageTarget;
  use crate::app::tests::{app_with, numbered};
  use ratatui::crossterm::event::{KeyEvent, KeyEventKind, KeyEventState};
  use ratatui::layout::Rect;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent { code, modifiers: KeyModifiers::NONE, kind: KeyEventKind::Press, state: KeyEventState::NONE }
  }

  fn click(column: u16, row: u16) -> MouseEvent {
    MouseEvent { kind: MouseEventKind::Down(MouseButton::Left), column, row, modifiers: KeyModifiers::NONE }
  }

  /// An app with the overlay open and hitboxes as a draw would leave them.
  fn overlay_app() -> App {
    let mut app = app_with(numbered(3));
    app.open_card(0);
    app.hits.overlay = Some(Rect::new(10, 5, 60, 20));
    app.hits.close = Some(Rect::new(66, 5, 3, 1));
    app
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0); // 'a'
    assert_eq!(char_to_byte_index(s, 1), 1); // 'é' starts at byte 1
    assert_eq!(char_to_byte_index(s, 2), 3); // '日' starts at byte 3
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- Overlay dismissal ---

  #[test]
  fn click_inside_panel_keeps_overlay_open() {
    let mut app = overlay_app();
    handle_mouse(&mut app, click(30, 12));
    assert_eq!(app.mode, AppMode::Detail);
    assert!(app.detail.is_some());
  }

  #[test]
  fn click_on_backdrop_closes_overlay() {
    let mut app = overlay_app();
    handle_mouse(&mut app, click(2, 2));
    assert_eq!(app.mode, AppMode::Browse);
    assert!(app.detail.is_none());
  }

  #[test]
  fn click_on_close_button_closes_overlay() {
    let mut app = overlay_app();
    handle_mouse(&mut app, click(67, 5));
    assert!(app.detail.is_none());
    assert!(app.hits.overlay.is_none());
  }

  #[test]
  fn escape_closes_overlay() {
    let mut app = overlay_app();
    handle_key_event(&mut app, key(KeyCode::Esc));
    assert_eq!(app.mode, AppMode::Browse);
    assert!(!app.should_quit);
  }

  // --- Browse and search ---

  #[test]
  fn clicking_cards_and_page_buttons() {
    let mut app = app_with(numbered(45));
    app.hits.page_buttons = vec![(Rect::new(40, 30, 3, 1), PageTarget::Page(3))];
    handle_mouse(&mut app, click(41, 30));
    assert_eq!(app.page, 3);

    app.hits.cards = vec![(Rect::new(0, 4, 40, 5), 1)];
    handle_mouse(&mut app, click(5, 6));
    assert_eq!(app.mode, AppMode::Detail);
    assert_eq!(app.detail_episode().unwrap().id, "id43");
  }

  #[test]
  fn typing_filters_and_resets_page() {
    let mut app = app_with(numbered(45));
    app.go_to_page(2);
    handle_key_event(&mut app, key(KeyCode::Char('/')));
    assert_eq!(app.mode, AppMode::Search);
    for c in "Episode 1".chars() {
      handle_key_event(&mut app, key(KeyCode::Char(c)));
    }
    assert_eq!(app.page, 1);
    // "Episode 1" and "Episode 10".."Episode 19"
    assert_eq!(app.view.len(), 11);
    handle_key_event(&mut app, key(KeyCode::Backspace));
    assert_eq!(app.query, "Episode ");
    handle_key_event(&mut app, key(KeyCode::Esc));
    assert!(app.query.is_empty());
    assert_eq!(app.view.len(), 45);
    assert_eq!(app.mode, AppMode::Browse);
  }

  #[test]
  fn q_in_search_is_typed_not_quit() {
    let mut app = app_with(numbered(2));
    app.mode = AppMode::Search;
    handle_key_event(&mut app, key(KeyCode::Char('q')));
    assert!(!app.should_quit);
    assert_eq!(app.query, "q");
  }

  #[test]
  fn bracket_keys_change_page() {
    let mut app = app_with(numbered(45));
    handle_key_event(&mut app, key(KeyCode::Char(']')));
    assert_eq!(app.page, 2);
    handle_key_event(&mut app, key(KeyCode::End));
    assert_eq!(app.page, 3);
    handle_key_event(&mut app, key(KeyCode::Char('[')));
    assert_eq!(app.page, 2);
  }
}
