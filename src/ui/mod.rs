pub mod overlay;
pub mod theme;

pub use overlay::{PlaybackStatus, UiActions, draw_playback_panel};
pub use theme::apply_theme;
