pub mod categories;
pub mod history;
pub mod mistakes;
pub mod practice;
pub mod reset;
pub mod settings;

use chrono::Duration;

/// `1m 05s` style rendering for summaries.
pub(crate) fn format_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        let tenths = d.num_milliseconds().max(0) / 100;
        format!("{}.{}s", tenths / 10, tenths % 10)
    }
}

pub(crate) fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}
