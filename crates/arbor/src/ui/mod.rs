//! Text rendering utilities.
//!
//! Everything here works on newline-joined, ANSI-styled strings:
//! - text: cell-width measurement and column slicing
//! - overlay: modal compositing over a rendered frame
//! - theme: explicit style set passed to every render
//! - widgets: small line builders (titles, banners, boxes)

pub mod overlay;
pub mod text;
pub mod theme;
pub mod widgets;

pub use overlay::composite;
pub use theme::Theme;
