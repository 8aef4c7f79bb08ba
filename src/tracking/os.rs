//! Coarse operating-system guess from a User-Agent string

pub const UNKNOWN_OS: &str = "Unknown";

/// Ordered table, first match wins
const WINDOWS: &[(&str, &str)] = &[
    ("Windows NT 10.0", "Windows 10/11"),
    ("Windows NT 6.3", "Windows 8.1"),
    ("Windows NT 6.2", "Windows 8"),
    ("Windows NT 6.1", "Windows 7"),
    ("Windows NT 6.0", "Windows Vista"),
    ("Windows NT 5.1", "Windows XP"),
    ("Windows XP", "Windows XP"),
];

const APPLE_MOBILE: &[&str] = &["iPhone", "iPad", "iPod"];

pub fn classify_os(user_agent: &str) -> &'static str {
    if user_agent.is_empty() {
        return UNKNOWN_OS;
    }

    if let Some((_, label)) = WINDOWS.iter().find(|(needle, _)| user_agent.contains(needle)) {
        return *label;
    }
    // iOS UAs also say "like Mac OS X", so devices are checked first
    if APPLE_MOBILE.iter().any(|needle| user_agent.contains(needle)) {
        return "iOS";
    }
    if user_agent.contains("Macintosh") || user_agent.contains("Mac OS X") {
        return "macOS";
    }
    if user_agent.contains("Linux") {
        return if user_agent.contains("Android") {
            "Android"
        } else {
            "Linux"
        };
    }

    UNKNOWN_OS
}
