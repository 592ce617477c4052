// ============================================================================
// squish-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger Backend for the `log` Facade
//
// squish-core logs through the `log` crate; the CLI installs env_logger as
// the backend. Logs go to stderr so that stdout stays clean for results.
//
// USAGE:
// - default: info
// - --verbose: debug
// - RUST_LOG=...: overrides both (e.g. RUST_LOG=squish_core=trace)

use console::style;
use log::LevelFilter;
use std::io::Write;

/// Level used when RUST_LOG is not set.
pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the global logger. Safe to call once per process.
pub fn init(verbose: bool) {
    let level = default_level(verbose);
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            let level_str = match record.level() {
                log::Level::Error => style("ERROR").red().bold(),
                log::Level::Warn => style("WARN ").yellow(),
                log::Level::Info => style("INFO ").green(),
                log::Level::Debug => style("DEBUG").blue(),
                log::Level::Trace => style("TRACE").magenta(),
            };
            writeln!(
                buf,
                "{} {} {}",
                style(get_timestamp()).dim(),
                level_str,
                record.args()
            )
        })
        .try_init();

    if result.is_ok() {
        log::debug!("Logger initialized with level: {}", level);
    }
}

/// Current local time as "HH:MM:SS%.3f" for log lines.
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false), LevelFilter::Info);
        assert_eq!(default_level(true), LevelFilter::Debug);
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = get_timestamp();
        assert_eq!(ts.len(), "12:34:56.789".len());
        assert_eq!(ts.matches(':').count(), 2);
    }
}
