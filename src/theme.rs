//! Palette selection from the host page's foreground color
//!
//! The overlay has no theme of its own; it picks a light or dark token
//! palette by measuring the WCAG relative luminance of the host's text
//! color. The measurement runs once per engine lifetime and the result
//! is memoized, so every panel in a session gets the same palette.

use std::sync::OnceLock;

use tracing::debug;

use crate::dom::{Dom, NodeId};

/// An sRGB color sampled from host style text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parse `rgb(r, g, b)`, `rgba(r, g, b, a)`, or `#rrggbb` color text.
    pub fn parse_css(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            if hex.len() != 6 {
                return None;
            }
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some(Self { r, g, b });
        }

        let body = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let mut parts = body.split(',').map(str::trim);
        let r = parts.next()?.parse::<u8>().ok()?;
        let g = parts.next()?.parse::<u8>().ok()?;
        let b = parts.next()?.parse::<u8>().ok()?;
        Some(Self { r, g, b })
    }

    /// WCAG relative luminance in `[0, 1]`.
    pub fn relative_luminance(&self) -> f64 {
        0.2126 * linearize(self.r) + 0.7152 * linearize(self.g) + 0.0722 * linearize(self.b)
    }
}

/// sRGB channel linearization per the WCAG definition.
fn linearize(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Token color palette to overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Light,
    Dark,
}

impl Palette {
    /// A light (high-luminance) foreground means the page itself is dark,
    /// which calls for the light token palette, and vice versa.
    pub fn classify(foreground: Rgb) -> Self {
        if foreground.relative_luminance() > 0.5 {
            Palette::Light
        } else {
            Palette::Dark
        }
    }

    /// Marker class the reconciler puts on overlay nodes.
    pub fn class(&self) -> &'static str {
        match self {
            Palette::Light => "adorn-light",
            Palette::Dark => "adorn-dark",
        }
    }
}

/// One-shot palette choice for an engine lifetime.
#[derive(Debug, Default)]
pub struct ThemeSelector {
    chosen: OnceLock<Palette>,
}

impl ThemeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the palette, sampling at most once. Later calls return the
    /// memoized choice and ignore the sample. A missing sample defaults
    /// to Dark.
    pub fn resolve_with(&self, sample: Option<Rgb>) -> Palette {
        *self.chosen.get_or_init(|| {
            let palette = match sample {
                Some(rgb) => Palette::classify(rgb),
                None => Palette::Dark,
            };
            debug!(?sample, ?palette, "palette chosen");
            palette
        })
    }

    /// The memoized palette, if a resolution has happened.
    pub fn get(&self) -> Option<Palette> {
        self.chosen.get().copied()
    }
}

/// Find the page's foreground color: the first element under `from`
/// (document order) whose `style` attribute carries a parseable `color:`
/// declaration.
pub fn sample_foreground(dom: &Dom, from: NodeId) -> Option<Rgb> {
    for node in dom.descendants(from) {
        let Some(style) = dom.attr(node, "style") else {
            continue;
        };
        for decl in style.split(';') {
            let Some((prop, value)) = decl.split_once(':') else {
                continue;
            };
            if prop.trim() != "color" {
                continue;
            }
            if let Some(rgb) = Rgb::parse_css(value) {
                return Some(rgb);
            }
        }
    }
    None
}
