//! Configuration utility functions
//!
//! Helpers for reading typed overrides from environment variables. An unset
//! or unparsable variable falls back to the supplied default.

/// Get a boolean value from an environment variable or use the default
pub fn get_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => val.eq_ignore_ascii_case("true") || val == "1",
        Err(_) => default,
    }
}

/// Get a u32 value from an environment variable or use the default
pub fn get_env_u32(key: &str, default: u32) -> u32 {
    match std::env::var(key) {
        Ok(val) => val.parse().unwrap_or(default),
        Err(_) => default,
    }
}

/// Get a f64 value from an environment variable or use the default
pub fn get_env_f64(key: &str, default: f64) -> f64 {
    match std::env::var(key) {
        Ok(val) => val.parse().unwrap_or(default),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Variables named here are never set by any other test.
    #[test]
    fn test_env_fallbacks() {
        assert_eq!(get_env_u32("SQUISH_TEST_UNSET_U32", 7), 7);
        assert!(get_env_bool("SQUISH_TEST_UNSET_BOOL", true));
        assert_eq!(get_env_f64("SQUISH_TEST_UNSET_F64", 1.5), 1.5);
    }
}
