use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Minimum contrast ratio enforced between a line's background and foreground
pub const MIN_CONTRAST: f64 = 4.5;

pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid hex color: {0:?}")]
    InvalidHex(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parses "#rgb" or "#rrggbb" (the leading '#' is optional)
    pub fn from_hex(hex: &str) -> Result<Rgb, ColorError> {
        let invalid = || ColorError::InvalidHex(hex.to_string());
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(invalid()),
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Lowercase "#rrggbb"
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Relative luminance (sRGB, channels linearized)
    pub fn luminance(&self) -> f64 {
        fn linear(channel: u8) -> f64 {
            let v = channel as f64 / 255.0;
            if v <= 0.03928 {
                v / 12.92
            } else {
                ((v + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::from_hex(s)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// (L_lighter + 0.05) / (L_darker + 0.05)
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let (la, lb) = (a.luminance(), b.luminance());
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Keeps `fg` when it reaches `min` contrast against `bg`, otherwise
/// substitutes black or white, whichever contrasts more with `bg`
pub fn ensure_contrast(bg: &str, fg: &str, min: f64) -> String {
    let (bg_rgb, fg_rgb) = match (Rgb::from_hex(bg), Rgb::from_hex(fg)) {
        (Ok(b), Ok(f)) => (b, f),
        _ => {
            // Unreadable input keeps the requested color
            return if fg.is_empty() { WHITE.to_hex() } else { fg.to_string() };
        }
    };
    if contrast_ratio(bg_rgb, fg_rgb) >= min {
        return fg.to_string();
    }
    if contrast_ratio(bg_rgb, BLACK) > contrast_ratio(bg_rgb, WHITE) {
        BLACK.to_hex()
    } else {
        WHITE.to_hex()
    }
}
