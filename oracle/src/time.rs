use chrono::Utc;

/// Wall-clock seconds since the unix epoch.
pub fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
