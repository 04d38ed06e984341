use serde::{Deserialize, Serialize};

use super::contrast::{ensure_contrast, MIN_CONTRAST};
use super::store::KeyValueStore;

/// Key prefix of a group's background color
pub const BG_PREFIX: &str = "lineColor_bg_";
/// Key prefix of a group's foreground color
pub const FG_PREFIX: &str = "lineColor_fg_";

/// Brand colors used when nothing else is known
pub const DEFAULT_BG: &str = "#000000";
pub const DEFAULT_FG: &str = "#d4c76f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub bg: String,
    pub fg: String,
}

impl ColorPair {
    pub fn new(bg: impl Into<String>, fg: impl Into<String>) -> Self {
        ColorPair {
            bg: bg.into(),
            fg: fg.into(),
        }
    }

    /// Returns the pair with its foreground adjusted to meet the minimum contrast
    pub fn guarded(self) -> Self {
        let fg = ensure_contrast(&self.bg, &self.fg, MIN_CONTRAST);
        ColorPair { bg: self.bg, fg }
    }
}

impl Default for ColorPair {
    fn default() -> Self {
        ColorPair::new(DEFAULT_BG, DEFAULT_FG).guarded()
    }
}

/// Persisted values must be exactly "#rrggbb"
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Per-group color preferences over an injected key-value store
#[derive(Debug)]
pub struct ColorPrefs<S> {
    store: S,
    defaults: ColorPair,
}

impl<S: KeyValueStore> ColorPrefs<S> {
    pub fn new(store: S) -> Self {
        ColorPrefs {
            store,
            defaults: ColorPair::default(),
        }
    }

    pub fn with_defaults(store: S, defaults: ColorPair) -> Self {
        ColorPrefs {
            store,
            defaults: defaults.guarded(),
        }
    }

    pub fn defaults(&self) -> &ColorPair {
        &self.defaults
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bg_key(group: &str) -> String {
        format!("{}{}", BG_PREFIX, group)
    }

    pub fn fg_key(group: &str) -> String {
        format!("{}{}", FG_PREFIX, group)
    }

    /// Resolves a group's colors: saved value, then the server-rendered one, then the default
    /// Malformed saved values discard the whole pair in favor of the defaults
    pub fn load(&self, group: &str, rendered: Option<&ColorPair>) -> ColorPair {
        let saved_bg = self.store.get(&Self::bg_key(group));
        let saved_fg = self.store.get(&Self::fg_key(group));
        let malformed = [&saved_bg, &saved_fg]
            .into_iter()
            .flatten()
            .any(|v| !is_hex_color(v));
        if malformed {
            log::warn!("malformed saved colors for group {}, using defaults", group);
            return self.defaults.clone();
        }

        let rendered_bg = rendered.map(|p| p.bg.clone()).filter(|v| is_hex_color(v));
        let rendered_fg = rendered.map(|p| p.fg.clone()).filter(|v| is_hex_color(v));
        let bg = saved_bg
            .or(rendered_bg)
            .unwrap_or_else(|| self.defaults.bg.clone());
        let fg = saved_fg
            .or(rendered_fg)
            .unwrap_or_else(|| self.defaults.fg.clone());
        ColorPair::new(bg, fg).guarded()
    }

    /// Background picker changed: persist it together with the contrast-adjusted foreground
    pub fn set_background(&mut self, group: &str, bg: &str, current_fg: Option<&str>) -> ColorPair {
        let bg = if is_hex_color(bg) { bg.to_string() } else { self.defaults.bg.clone() };
        let fg = current_fg
            .filter(|v| is_hex_color(v))
            .map(str::to_string)
            .unwrap_or_else(|| self.defaults.fg.clone());
        let pair = ColorPair::new(bg, fg).guarded();
        self.store.set(&Self::bg_key(group), &pair.bg);
        self.store.set(&Self::fg_key(group), &pair.fg);
        pair
    }

    /// Foreground picker changed: persist the contrast-adjusted value
    pub fn set_foreground(&mut self, group: &str, fg: &str, current_bg: Option<&str>) -> ColorPair {
        let bg = current_bg
            .filter(|v| is_hex_color(v))
            .map(str::to_string)
            .unwrap_or_else(|| self.defaults.bg.clone());
        let fg = if is_hex_color(fg) { fg.to_string() } else { self.defaults.fg.clone() };
        let pair = ColorPair::new(bg, fg).guarded();
        self.store.set(&Self::fg_key(group), &pair.fg);
        pair
    }

    /// Forgets the saved colors of all groups and returns the default pair
    pub fn reset<'a, I>(&mut self, groups: I) -> ColorPair
    where
        I: IntoIterator<Item = &'a str>,
    {
        for group in groups {
            self.store.remove(&Self::bg_key(group));
            self.store.remove(&Self::fg_key(group));
        }
        self.defaults.clone()
    }
}
