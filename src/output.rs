//! Output mode shared by the CLI status lines and spinner

use std::sync::OnceLock;

/// Environment switch for quiet mode, for scripts that cannot pass `--quiet`
pub const QUIET_ENV: &str = "DERMSQL_QUIET";

static QUIET: OnceLock<bool> = OnceLock::new();

/// Fix the mode from `--quiet`. Call before any output; later calls are ignored.
pub fn set_quiet(quiet: bool) {
    let _ = QUIET.set(quiet || quiet_from_env());
}

/// Quiet mode drops status lines; warnings, errors and answers still print
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(quiet_from_env)
}

fn quiet_from_env() -> bool {
    std::env::var(QUIET_ENV).map(|v| is_truthy(&v)).unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy(" TRUE "));
        assert!(is_truthy("yes"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("off"));
    }
}
