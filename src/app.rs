use anyhow::Result;
use image::DynamicImage;
use ratatui::layout::{Position, Rect};
use reqwest::Client;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::browse::{PageSlice, SortKey, clamp_page, filter_indices, page_bounds, sort_indices, total_pages};
use crate::config::Config;
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::episode::{Catalog, Episode};
use crate::loader::{LoadError, load_catalog};
use crate::theme::{THEMES, Theme, theme_index};
use crate::youtube::fetch_thumbnail;

// --- Types ---

pub type ThumbResult = (String, Result<DynamicImage>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Moving between cards and pages.
  Browse,
  /// Typing into the search bar.
  Search,
  /// The detail overlay is open.
  Detail,
}

/// Lifecycle of the one load attempt made at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
  Loading,
  Ready,
  Failed(String),
}

/// Which chart set the overlay shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartPage {
  /// Subscriber split and interactions.
  Audience,
  /// Aggregate engagement and watch-time performance.
  Overview,
}

impl ChartPage {
  pub fn next(self) -> Self {
    match self {
      ChartPage::Audience => ChartPage::Overview,
      ChartPage::Overview => ChartPage::Audience,
    }
  }
}

/// Progress of the overlay's thumbnail.
pub enum ThumbState {
  Loading,
  Ready(DynamicImage),
  /// Every candidate failed, the fetch task died, or there was nothing to fetch.
  Unavailable,
}

/// State of an open detail overlay.
pub struct DetailState {
  /// Index into `App::episodes`.
  pub episode: usize,
  pub chart_page: ChartPage,
  pub scroll: u16,
  pub thumbnail: ThumbState,
  /// Thumbnail resized for the last render area.
  pub resized_thumb: Option<(u16, u16, DynamicImage)>,
}

/// A clickable pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
  Prev,
  Next,
  Page(usize),
}

/// Screen regions recorded during the last draw, used for mouse hit testing.
#[derive(Debug, Default, Clone)]
pub struct Hitboxes {
  /// Card area and its position within the current page.
  pub cards: Vec<(Rect, usize)>,
  pub page_buttons: Vec<(Rect, PageTarget)>,
  pub search: Option<Rect>,
  pub sort: Option<Rect>,
  /// The overlay's content panel; everything outside it is background.
  pub overlay: Option<Rect>,
  pub close: Option<Rect>,
}

fn contains(rect: Option<Rect>, col: u16, row: u16) -> bool {
  rect.is_some_and(|r| r.contains(Position::new(col, row)))
}

impl Hitboxes {
  pub fn card_at(&self, col: u16, row: u16) -> Option<usize> {
    self.cards.iter().find(|(r, _)| r.contains(Position::new(col, row))).map(|(_, i)| *i)
  }

  pub fn page_button_at(&self, col: u16, row: u16) -> Option<PageTarget> {
    self.page_buttons.iter().find(|(r, _)| r.contains(Position::new(col, row))).map(|(_, t)| *t)
  }

  pub fn on_close(&self, col: u16, row: u16) -> bool {
    contains(self.close, col, row)
  }

  pub fn on_overlay(&self, col: u16, row: u16) -> bool {
    contains(self.overlay, col, row)
  }

  pub fn on_search(&self, col: u16, row: u16) -> bool {
    contains(self.search, col, row)
  }

  pub fn on_sort(&self, col: u16, row: u16) -> bool {
    contains(self.sort, col, row)
  }
}

/// In-flight async task receivers.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) load_rx: Option<oneshot::Receiver<Result<Catalog, LoadError>>>,
  pub(crate) thumb_rx: Option<oneshot::Receiver<ThumbResult>>,
}

pub struct App {
  /// CSV path or URL being browsed.
  pub source: String,
  pub load_state: LoadState,
  pub episodes: Vec<Episode>,
  /// Number of fields that failed conversion during load.
  pub issue_count: usize,
  pub query: String,
  /// Cursor position within the query (char index).
  pub query_cursor: usize,
  pub query_scroll: usize,
  pub sort_key: SortKey,
  /// 1-based current page.
  pub page: usize,
  /// Filtered and sorted indices into `episodes`.
  pub view: Vec<usize>,
  /// Highlighted card, as a position within the current page.
  pub selected: usize,
  /// Columns in the grid as last drawn; drives up/down navigation.
  pub grid_columns: usize,
  /// First card row visible in the grid.
  pub grid_scroll: usize,
  pub mode: AppMode,
  pub detail: Option<DetailState>,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  pub last_error: Option<String>,
  pub info_message: Option<String>,
  pub should_quit: bool,
  pub hits: Hitboxes,
  pub http_client: Client,
  pub(crate) tasks: AsyncTasks,
  /// Where prefs are written; `None` disables persistence.
  prefs_path: Option<PathBuf>,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(config: &Config, source: String, display_mode: DisplayMode, prefs_path: Option<PathBuf>) -> Self {
    let sort_key = config.sort_key.as_deref().map_or(SortKey::ReleaseDate, SortKey::from_config);
    Self {
      source,
      load_state: LoadState::Loading,
      episodes: Vec::new(),
      issue_count: 0,
      query: String::new(),
      query_cursor: 0,
      query_scroll: 0,
      sort_key,
      page: 1,
      view: Vec::new(),
      selected: 0,
      grid_columns: 1,
      grid_scroll: 0,
      mode: AppMode::Browse,
      detail: None,
      theme_index: theme_index(config.theme_name.as_deref()),
      display_mode,
      last_error: None,
      info_message: None,
      should_quit: false,
      hits: Hitboxes::default(),
      http_client: Client::new(),
      tasks: AsyncTasks::default(),
      prefs_path,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    // Safety: theme_index is bounded by theme_index() and the modular arithmetic in next_theme().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.save_config();
  }

  fn save_config(&self) {
    let Some(ref path) = self.prefs_path else { return };
    let config = Config {
      theme_name: Some(self.theme().name.to_string()),
      sort_key: Some(self.sort_key.config_name().to_string()),
      source: Some(self.source.clone()),
    };
    config.save_to(path);
  }

  // --- Status line ---

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after the configured delay.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.clear_error();
    }
  }

  // --- Loading ---

  /// Spawn the one-shot catalogue load. Failures are not retried.
  pub fn start_load(&mut self) {
    info!(source = %self.source, "load triggered");
    self.load_state = LoadState::Loading;
    let client = self.http_client.clone();
    let source = self.source.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(load_catalog(&client, &source).await);
    });
    self.tasks.load_rx = Some(rx);
  }

  pub fn apply_catalog(&mut self, result: Result<Catalog, LoadError>) {
    match result {
      Ok(catalog) => {
        self.issue_count = catalog.issues.len();
        self.episodes = catalog.episodes;
        self.load_state = LoadState::Ready;
        self.info_message = Some(if self.issue_count == 0 {
          format!("Loaded {} episodes", self.episodes.len())
        } else {
          format!("Loaded {} episodes ({} field warnings)", self.episodes.len(), self.issue_count)
        });
        self.page = 1;
        self.recompute_view();
        // Chosen sort and source are worth remembering once they produced data.
        self.save_config();
      }
      Err(e) => {
        warn!(err = %e, "load failed");
        self.load_state = LoadState::Failed(e.to_string());
      }
    }
  }

  pub fn check_pending(&mut self) {
    if let Some(mut rx) = self.tasks.load_rx.take() {
      match rx.try_recv() {
        Ok(result) => self.apply_catalog(result),
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.load_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.load_state = LoadState::Failed("Load task failed.".to_string());
        }
      }
    }

    if let Some(mut rx) = self.tasks.thumb_rx.take() {
      match rx.try_recv() {
        Ok((id, result)) => self.apply_thumbnail(&id, result),
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.thumb_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          warn!("thumbnail task dropped without a result");
          self.mark_thumbnail_unavailable();
        }
      }
    }
  }

  // --- Derived view ---

  /// Rebuild `view` from the episodes, query and sort key, then clamp the
  /// page and the card selection into range.
  pub fn recompute_view(&mut self) {
    let filtered = filter_indices(&self.episodes, &self.query);
    self.view = sort_indices(&self.episodes, &filtered, self.sort_key);
    self.page = clamp_page(self.page, self.total_pages());
    let on_page = self.page_slice().len();
    self.selected = self.selected.min(on_page.saturating_sub(1));
    debug!(view = self.view.len(), page = self.page, "view recomputed");
  }

  /// Call after every edit of `query`: a new query always starts on page 1.
  pub fn query_changed(&mut self) {
    self.page = 1;
    self.selected = 0;
    self.recompute_view();
  }

  pub fn set_query(&mut self, query: &str) {
    self.query = query.to_string();
    self.query_cursor = self.query.chars().count();
    self.query_changed();
  }

  pub fn clear_query(&mut self) {
    self.query.clear();
    self.query_cursor = 0;
    self.query_scroll = 0;
    self.query_changed();
  }

  pub fn cycle_sort(&mut self) {
    self.sort_key = self.sort_key.next();
    info!(sort = self.sort_key.config_name(), "sort changed");
    self.recompute_view();
    self.save_config();
  }

  pub fn total_pages(&self) -> usize {
    total_pages(self.view.len(), constants().page_size)
  }

  pub fn page_slice(&self) -> PageSlice {
    page_bounds(self.view.len(), constants().page_size, self.page)
  }

  /// Episode indices on the current page, in display order.
  pub fn page_indices(&self) -> &[usize] {
    let slice = self.page_slice();
    &self.view[slice.start..slice.end]
  }

  pub fn go_to_page(&mut self, page: usize) {
    let page = clamp_page(page, self.total_pages());
    if page != self.page {
      self.page = page;
      self.selected = 0;
      self.grid_scroll = 0;
    }
  }

  pub fn next_page(&mut self) {
    if self.page < self.total_pages() {
      self.go_to_page(self.page + 1);
    }
  }

  pub fn prev_page(&mut self) {
    if self.page > 1 {
      self.go_to_page(self.page - 1);
    }
  }

  pub fn activate_page_target(&mut self, target: PageTarget) {
    match target {
      PageTarget::Prev => self.prev_page(),
      PageTarget::Next => self.next_page(),
      PageTarget::Page(p) => self.go_to_page(p),
    }
  }

  /// Move the card highlight by whole columns/rows, staying on the page.
  pub fn move_selection(&mut self, dx: isize, dy: isize) {
    let count = self.page_slice().len();
    if count == 0 {
      return;
    }
    let cols = self.grid_columns.max(1) as isize;
    let target = self.selected as isize + dx + dy * cols;
    if (0..count as isize).contains(&target) {
      self.selected = target as usize;
    }
  }

  // --- Detail overlay ---

  pub fn detail_episode(&self) -> Option<&Episode> {
    self.detail.as_ref().and_then(|d| self.episodes.get(d.episode))
  }

  /// Open the overlay for the card at `pos` on the current page.
  pub fn open_card(&mut self, pos: usize) {
    let Some(&episode) = self.page_indices().get(pos) else { return };
    self.selected = pos;
    self.open_detail(episode);
  }

  pub fn open_selected(&mut self) {
    self.open_card(self.selected);
  }

  fn open_detail(&mut self, episode: usize) {
    let Some(ep) = self.episodes.get(episode) else { return };
    info!(id = %ep.id, "detail opened");
    let urls = ep.thumbnail_candidates();
    let id = ep.id.clone();

    let thumbnail = if urls.is_empty() { ThumbState::Unavailable } else { ThumbState::Loading };
    self.detail = Some(DetailState { episode, chart_page: ChartPage::Audience, scroll: 0, thumbnail, resized_thumb: None });
    self.mode = AppMode::Detail;
    self.tasks.thumb_rx = None;

    if self.display_mode.shows_thumbnails() && !urls.is_empty() {
      let client = self.http_client.clone();
      let (tx, rx) = oneshot::channel();
      tokio::spawn(async move {
        let result = fetch_thumbnail(&client, &urls).await;
        let _ = tx.send((id, result));
      });
      self.tasks.thumb_rx = Some(rx);
    }
  }

  pub fn close_detail(&mut self) {
    if self.detail.take().is_some() {
      debug!("detail closed");
    }
    self.tasks.thumb_rx = None;
    self.hits.overlay = None;
    self.hits.close = None;
    self.mode = AppMode::Browse;
  }

  fn apply_thumbnail(&mut self, id: &str, result: Result<DynamicImage>) {
    let Some(open_id) = self.detail_episode().map(|e| e.id.clone()) else { return };
    if open_id != id {
      return;
    }
    match result {
      Ok(image) => {
        if let Some(ref mut detail) = self.detail {
          detail.thumbnail = ThumbState::Ready(image);
          detail.resized_thumb = None;
        }
      }
      Err(e) => {
        warn!(id = %id, err = %e, "thumbnail unavailable");
        self.mark_thumbnail_unavailable();
        self.set_error(format!("Thumbnail unavailable: {:#}", e));
      }
    }
  }

  fn mark_thumbnail_unavailable(&mut self) {
    if let Some(ref mut detail) = self.detail {
      detail.thumbnail = ThumbState::Unavailable;
      detail.resized_thumb = None;
    }
  }

  pub fn cycle_chart_page(&mut self) {
    if let Some(ref mut detail) = self.detail {
      detail.chart_page = detail.chart_page.next();
    }
  }

  pub fn scroll_detail(&mut self, delta: i16) {
    if let Some(ref mut detail) = self.detail {
      detail.scroll = detail.scroll.saturating_add_signed(delta);
    }
  }
}
