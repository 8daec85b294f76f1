use chrono::{DateTime, Duration, Utc};

/// Default return window in hours. Two different windows (24h and 7 days) were in
/// use for the same rule; this is the single knob until product settles it.
pub const DEFAULT_RETURN_WINDOW_HOURS: i64 = 168;

/// How long after delivery a return may still be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnWindow(Duration);

impl ReturnWindow {
    /// Negative values collapse to an empty window. Returns `None` when `hours`
    /// is too large to represent.
    pub fn hours(hours: i64) -> Option<Self> {
        Duration::try_hours(hours.max(0)).map(Self)
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Undelivered orders are never eligible.
    pub fn is_open(&self, delivered_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match delivered_at {
            Some(delivered_at) => now >= delivered_at && now - delivered_at <= self.0,
            None => false,
        }
    }

    /// `None` if the close time falls past the representable calendar.
    pub fn closes_at(&self, delivered_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        delivered_at.checked_add_signed(self.0)
    }
}

impl Default for ReturnWindow {
    fn default() -> Self {
        Self(Duration::hours(DEFAULT_RETURN_WINDOW_HOURS))
    }
}
