use chrono::Utc;
#[cfg(not(test))]
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use std::io;

#[cfg(not(test))]
const LOG_FILENAME: &str = "quizline-debug.log";

/// Append a timestamped line to the shared debug log. Errors are reported to stderr only.
pub fn log_debug(message: &str) {
    let line = format!("[{}] {}", Utc::now().to_rfc3339(), message);
    if let Err(err) = write_line(&line) {
        eprintln!("[quizline::log_util] failed to write debug log: {}", err);
    }
}

#[cfg(not(test))]
fn write_line(line: &str) -> io::Result<()> {
    let path = resolve_log_path()?;
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

#[cfg(not(test))]
fn resolve_log_path() -> io::Result<PathBuf> {
    let mut dir = crate::config::log_directory();
    fs::create_dir_all(&dir)?;
    dir.push(LOG_FILENAME);
    Ok(dir)
}

#[cfg(test)]
thread_local! {
    static CAPTURED: std::cell::RefCell<Vec<String>> = const { std::cell::RefCell::new(Vec::new()) };
}

// Tests keep log lines in memory per thread instead of touching the log directory.
#[cfg(test)]
fn write_line(line: &str) -> io::Result<()> {
    CAPTURED.with(|captured| captured.borrow_mut().push(line.to_string()));
    Ok(())
}

/// Drain the log lines written by the current test thread.
#[cfg(test)]
pub(crate) fn take_captured() -> Vec<String> {
    CAPTURED.with(|captured| std::mem::take(&mut *captured.borrow_mut()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_timestamped_and_kept_in_order() {
        take_captured();

        log_debug("App: first");
        log_debug("App: second");

        let lines = take_captured();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('[') && lines[0].ends_with("] App: first"));
        assert!(lines[1].ends_with("App: second"));
        assert!(take_captured().is_empty());
    }
}
