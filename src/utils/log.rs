// src/utils/log.rs

//! Console presentation helpers with server-style formatting.
//!
//! Diagnostic logging goes through the `log` facade; these helpers print the
//! human-facing cycle summaries of the CLI.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;

/// Suppresses console output when set
static QUIET: AtomicBool = AtomicBool::new(false);

/// Enable or disable console output.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn enabled() -> bool {
    !QUIET.load(Ordering::Relaxed)
}

/// Format a line with timestamp and tag
fn format_line(tag: &str, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("[{}] [{}] {}", timestamp, tag, message)
}

/// Print a success message
pub fn success(message: &str) {
    if enabled() {
        println!("{}", format_line("INFO", &format!("✓ {}", message)));
    }
}

/// Print a warning line
pub fn warn(message: &str) {
    if enabled() {
        println!("{}", format_line("WARN", message));
    }
}

/// Print a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    if enabled() {
        let msg = format!("[STEP {}/{}] {}", step_num, total, message);
        println!("{}", format_line("INFO", &msg));
    }
}

/// Print a header
pub fn header(title: &str) {
    if enabled() {
        let border = "═".repeat(60);
        println!("{}", format_line("INFO", &border));
        println!("{}", format_line("INFO", &format!("  {}", title)));
        println!("{}", format_line("INFO", &border));
    }
}

/// Print a sub-item (indented)
pub fn sub_item(message: &str) {
    if enabled() {
        println!("{}", format_line("INFO", &format!("    {}", message)));
    }
}

/// Print a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    if enabled() {
        println!();
        println!("{}", format_line("SUMMARY", title));
        for (key, value) in items {
            println!("    {}: {}", key, value);
        }
    }
}

/// Writes every log line to two outputs, e.g. stderr and a log file.
pub struct TeeWriter<A, B> {
    primary: A,
    secondary: B,
}

impl<A: Write, B: Write> TeeWriter<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: Write, B: Write> Write for TeeWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.primary.write_all(buf)?;
        self.secondary.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        self.secondary.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tee_writes_both_outputs() {
        let mut tee = TeeWriter::new(Vec::new(), Vec::new());
        writeln!(tee, "[INFO] cycle complete").unwrap();
        tee.flush().unwrap();
        assert_eq!(tee.primary, b"[INFO] cycle complete\n");
        assert_eq!(tee.secondary, tee.primary);
    }

    #[test]
    fn test_format_line_contains_tag_and_message() {
        let line = format_line("INFO", "hello");
        assert!(line.ends_with("[INFO] hello"));
    }
}
