use ratatui::style::Color;

/// A complete colour scheme for the UI.
#[derive(Debug)]
pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub card_bg: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "Slate",
    bg: Color::Rgb(17, 24, 39),          // gray-900
    fg: Color::Rgb(209, 213, 219),       // gray-300
    accent: Color::Rgb(59, 130, 246),    // blue-500
    muted: Color::Rgb(156, 163, 175),    // gray-400
    border: Color::Rgb(55, 65, 81),      // gray-700
    card_bg: Color::Rgb(31, 41, 55),     // gray-800
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(37, 99, 235),
    stripe_bg: Color::Rgb(24, 32, 47),
    status: Color::Rgb(96, 165, 250),
    error: Color::Rgb(239, 68, 68),
    key_fg: Color::Rgb(17, 24, 39),
    key_bg: Color::Rgb(156, 163, 175),
  },
  Theme {
    name: "Ember",
    bg: Color::Rgb(28, 25, 23),
    fg: Color::Rgb(231, 229, 228),
    accent: Color::Rgb(249, 115, 22),
    muted: Color::Rgb(168, 162, 158),
    border: Color::Rgb(68, 64, 60),
    card_bg: Color::Rgb(41, 37, 36),
    highlight_fg: Color::Rgb(28, 25, 23),
    highlight_bg: Color::Rgb(251, 146, 60),
    stripe_bg: Color::Rgb(35, 31, 29),
    status: Color::Rgb(250, 204, 21),
    error: Color::Rgb(248, 113, 113),
    key_fg: Color::Rgb(28, 25, 23),
    key_bg: Color::Rgb(214, 211, 209),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(249, 249, 249),
    fg: Color::Rgb(74, 74, 74),
    accent: Color::Rgb(0, 153, 225),
    muted: Color::Rgb(150, 151, 151),
    border: Color::Rgb(200, 200, 200),
    card_bg: Color::Rgb(241, 241, 241),
    highlight_fg: Color::Rgb(255, 255, 255),
    highlight_bg: Color::Rgb(0, 153, 225),
    stripe_bg: Color::Rgb(232, 232, 232),
    status: Color::Rgb(112, 86, 151),
    error: Color::Rgb(200, 40, 40),
    key_fg: Color::Rgb(255, 255, 255),
    key_bg: Color::Rgb(74, 74, 74),
  },
];

/// Index of the theme called `name`, falling back to the first one.
pub fn theme_index(name: Option<&str>) -> usize {
  name.and_then(|n| THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(n))).unwrap_or(0)
}
