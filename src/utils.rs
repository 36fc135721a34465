use chrono::{DateTime, Local, Utc};

/// 当前毫秒时间戳
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// 将毫秒时间戳格式化为本地时间 HH:MM:SS.mmm
pub fn format_timestamp(timestamp_ms: i64) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(utc) => utc.with_timezone(&Local).format("%H:%M:%S%.3f").to_string(),
        None => format!("Invalid timestamp: {}", timestamp_ms),
    }
}
