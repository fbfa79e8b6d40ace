//! Logging utilities with colored output.
//!
//! This module provides the `log!` macro for formatted terminal output with
//! colored prefixes.
//!
//! # Example
//!
//! ```ignore
//! log!("bundle"; "updated {} ({} images)", id, count);
//! log!("warn"; "cache file is corrupt, starting fresh");
//! ```

use colored::{ColoredString, Colorize};
use crossterm::terminal::size;
use std::{
    io::{Write, stdout},
    sync::OnceLock,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Calculate total prefix length for a module name.
///
/// Returns: `module.len() + 3` (for `[`, `]`, and trailing space)
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix.
///
/// Long single-line messages are truncated to the terminal width, except
/// `error` and `warn` lines.
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();
    writeln!(stdout, "{prefix} {}", fit_message(module, &module_lower, message, width)).ok();
    stdout.flush().ok();
}

/// Fit `message` after the prefix of `module` within `width` columns.
///
/// Multi-line messages and failures keep their full text.
fn fit_message<'a>(module: &str, module_lower: &str, message: &'a str, width: usize) -> &'a str {
    if message.contains('\n') || is_problem(module_lower) {
        return message;
    }
    truncate_str(message, width.saturating_sub(calc_prefix_len(module.len())))
}

#[inline]
fn is_problem(module_lower: &str) -> bool {
    matches!(module_lower, "error" | "warn")
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "dry-run" => prefix.bright_cyan().bold(),
        "git" => prefix.bright_green().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_prefix_len() {
        // "bundle" -> "[bundle] " = 6 + 2 + 1 = 9
        assert_eq!(calc_prefix_len(6), 9);
        assert_eq!(calc_prefix_len(0), 3);
    }

    #[test]
    fn test_truncate_str_short_string() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_str_needs_truncation() {
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn test_truncate_str_unicode_boundary() {
        // "€" is 3 bytes; cutting at 4 must back off to 3
        assert_eq!(truncate_str("€€", 4), "€");
        assert_eq!(truncate_str("a€b", 3), "a");
    }

    #[test]
    fn test_fit_message_keeps_failures_whole() {
        let long = "content/galleries/a-very-long-bundle-name: write failed: disk full";
        assert_eq!(fit_message("error", "error", long, 20), long);
        assert_eq!(fit_message("WARN", "warn", long, 20), long);
        assert_eq!(fit_message("bundle", "bundle", long, 20), &long[..11]);
        assert_eq!(fit_message("bundle", "bundle", "a\nb", 2), "a\nb");
    }

    #[test]
    fn test_colorize_prefix_keeps_module_name() {
        let prefix = colorize_prefix("warn", "warn");
        assert!(prefix.to_string().contains("[warn]"));
    }
}
