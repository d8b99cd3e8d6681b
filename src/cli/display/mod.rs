//! Terminal rendering of plans and cluster status

pub mod colors;
pub mod icons;
pub mod table;

pub use colors::ColorTheme;
pub use icons::{Readiness, StatusIcon};
pub use table::TableRenderer;
