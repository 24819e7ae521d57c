//! Styles used when rendering frames.
//!
//! A `Theme` is built once by the runner and passed down to every render
//! call, so rendering stays a function of state and theme.

use std::fmt::Display;

use crossterm::style::{Color, ContentStyle, Stylize};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub title: ContentStyle,
    pub accent: ContentStyle,
    pub muted: ContentStyle,
    pub selected: ContentStyle,
    pub success: ContentStyle,
    pub warning: ContentStyle,
    pub error: ContentStyle,
    pub border: ContentStyle,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            title: ContentStyle::new().with(Color::Magenta).bold(),
            accent: ContentStyle::new().with(Color::Cyan),
            muted: ContentStyle::new().with(Color::DarkGrey),
            selected: ContentStyle::new().with(Color::Black).on(Color::White),
            success: ContentStyle::new().with(Color::Green),
            warning: ContentStyle::new().with(Color::Yellow),
            error: ContentStyle::new().with(Color::Red).bold(),
            border: ContentStyle::new().with(Color::DarkGrey),
        }
    }
}

impl Theme {
    /// Theme without any escape sequences.
    pub fn plain() -> Self {
        let plain = ContentStyle::new();
        Self {
            title: plain,
            accent: plain,
            muted: plain,
            selected: plain,
            success: plain,
            warning: plain,
            error: plain,
            border: plain,
        }
    }

    pub fn paint<D: Display>(style: ContentStyle, text: D) -> String {
        style.apply(text).to_string()
    }
}
