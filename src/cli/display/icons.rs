//! Status icons for CLI output

/// Readiness of a group of members (nodes of a cluster, for instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Degraded,
    NotReady,
    Unknown,
}

impl Readiness {
    pub fn of(ready: usize, total: usize) -> Self {
        match (ready, total) {
            (_, 0) => Self::Unknown,
            (r, t) if r >= t => Self::Ready,
            (0, _) => Self::NotReady,
            _ => Self::Degraded,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Ready => StatusIcon::SUCCESS,
            Self::Degraded => StatusIcon::WARNING,
            Self::NotReady => StatusIcon::ERROR,
            Self::Unknown => StatusIcon::UNKNOWN,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Degraded => "Degraded",
            Self::NotReady => "NotReady",
            Self::Unknown => "Unknown",
        }
    }
}

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    pub const SUCCESS: &'static str = "✓";
    pub const WARNING: &'static str = "⚠";
    pub const ERROR: &'static str = "✗";

    /// Component not part of this cluster
    pub const SKIPPED: &'static str = "-";

    pub const UNKNOWN: &'static str = "?";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_of() {
        assert_eq!(Readiness::of(3, 3), Readiness::Ready);
        assert_eq!(Readiness::of(2, 3), Readiness::Degraded);
        assert_eq!(Readiness::of(0, 3), Readiness::NotReady);
        assert_eq!(Readiness::of(0, 0), Readiness::Unknown);
    }

    #[test]
    fn test_icon_and_text() {
        assert_eq!(Readiness::Degraded.icon(), StatusIcon::WARNING);
        assert_eq!(Readiness::NotReady.text(), "NotReady");
        assert_eq!(Readiness::Unknown.icon(), StatusIcon::UNKNOWN);
    }
}
