//! Color theme for CLI output

use super::icons::Readiness;
use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    pub fn readiness_color(&self, readiness: Readiness) -> TableColor {
        match readiness {
            Readiness::Ready => self.success,
            Readiness::Degraded => self.warning,
            Readiness::NotReady => self.error,
            Readiness::Unknown => self.muted,
        }
    }

    /// Optional components are highlighted when present.
    pub fn presence_color(&self, present: bool) -> TableColor {
        if present {
            self.info
        } else {
            self.muted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_color() {
        let theme = ColorTheme::default();
        assert_eq!(theme.readiness_color(Readiness::of(3, 3)), TableColor::Green);
        assert_eq!(theme.readiness_color(Readiness::of(1, 3)), TableColor::Yellow);
        assert_eq!(theme.readiness_color(Readiness::of(0, 3)), TableColor::Red);
        assert_eq!(theme.readiness_color(Readiness::of(0, 0)), TableColor::DarkGrey);
    }

    #[test]
    fn test_presence_color() {
        let theme = ColorTheme::default();
        assert_eq!(theme.presence_color(true), TableColor::Cyan);
        assert_eq!(theme.presence_color(false), TableColor::DarkGrey);
    }
}
