//! # Utilities Module
//!
//! ## Purpose
//! Common helpers used throughout the citation resolver service for timing,
//! text handling, and lightweight validation.
//!
//! ## Input/Output Specification
//! - **Input**: Various data types requiring common operations
//! - **Output**: Processed data, timing measurements, validity checks

use std::time::Instant;

/// Performance timer for measuring operation duration
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    /// Start a new timer with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Stop timer and log duration
    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!("Timer '{}' completed in {}ms", self.name, elapsed);
        elapsed
    }
}

/// Text processing utilities
pub struct TextUtils;

impl TextUtils {
    /// Truncate text to specified length with ellipsis
    pub fn truncate(text: &str, max_length: usize) -> String {
        if text.len() <= max_length {
            text.to_string()
        } else {
            format!("{}...", &text[..max_length.saturating_sub(3)])
        }
    }

    /// Sanitize text for safe display in logs
    pub fn sanitize(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || c.is_whitespace())
            .collect()
    }
}

/// Validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Whether a configured base URL looks usable: an HTTP(S) URL or an
    /// absolute path a frontend can resolve against its own origin
    pub fn is_valid_base_url(url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_truncate() {
        assert_eq!(TextUtils::truncate("Hello world", 20), "Hello world");
        assert_eq!(TextUtils::truncate("This is a very long text", 10), "This is...");
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(TextUtils::sanitize("abc\u{0007}def\n"), "abcdef\n");
    }

    #[test]
    fn test_base_url_validation() {
        assert!(ValidationUtils::is_valid_base_url("https://cms.example.com"));
        assert!(ValidationUtils::is_valid_base_url("/content"));
        assert!(!ValidationUtils::is_valid_base_url("ftp://example.com"));
        assert!(!ValidationUtils::is_valid_base_url("example.com"));
    }

    #[test]
    fn test_timer_measures_something() {
        let timer = Timer::new("test");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.elapsed_ms() >= 5);
    }
}
