use chrono::{DateTime, Utc};

/// Elapsed-time label: `Just now`, `12m ago`, `1h 5m ago`
pub fn time_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = (now - then).num_minutes();
    if mins < 1 {
        "Just now".to_string()
    } else if mins < 60 {
        format!("{}m ago", mins)
    } else {
        format!("{}h {}m ago", mins / 60, mins % 60)
    }
}
