//! Utility functions for size conversion and formatting.
//!
//! Sizes move between three units in this crate: raw bytes (what the engine
//! compares against), megabytes (what callers and the metrics record speak),
//! and human-readable strings (what the logs print).

/// Bytes per megabyte. Callers express budgets in binary megabytes.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Converts a size in megabytes to whole bytes, rounding down.
/// Negative and non-finite inputs map to 0.
#[must_use]
pub fn mb_to_bytes(mb: f64) -> u64 {
    if !mb.is_finite() || mb <= 0.0 {
        return 0;
    }
    (mb * BYTES_PER_MB).floor() as u64
}

/// Converts a byte count to megabytes.
#[must_use]
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Bitrate in kbps that spreads `budget_bytes` over `duration_secs`.
/// Returns `None` when the duration is unknown or zero.
#[must_use]
pub fn budget_bitrate_kbps(budget_bytes: u64, duration_secs: f64) -> Option<u32> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return None;
    }
    let kbps = (budget_bytes as f64 * 8.0) / duration_secs / 1000.0;
    Some(kbps.min(u32::MAX as f64) as u32)
}
