//! MM:SS rendering of the remaining countdown time

use serde::{Deserialize, Serialize};

/// Split `seconds` into zero-padded minute and second text.
///
/// Minutes are not clamped: 6000 seconds and above render with three or more digits.
pub fn render(seconds: u64) -> (String, String) {
    (format!("{:02}", seconds / 60), format!("{:02}", seconds % 60))
}

/// The two text fields a countdown is rendered into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayFields {
    pub minutes: String,
    pub seconds: String,
}

impl DisplayFields {
    pub fn new() -> Self {
        let (minutes, seconds) = render(0);
        Self { minutes, seconds }
    }

    /// Overwrite both fields with the rendering of `seconds`.
    pub fn write(&mut self, seconds: u64) {
        let (minutes, secs) = render(seconds);
        self.minutes = minutes;
        self.seconds = secs;
    }

    /// Joined "MM:SS" form.
    pub fn text(&self) -> String {
        format!("{}:{}", self.minutes, self.seconds)
    }
}

impl Default for DisplayFields {
    fn default() -> Self {
        Self::new()
    }
}
