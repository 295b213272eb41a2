use std::cell::RefCell;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
thread_local! {
    static LOG_PREFIX: RefCell<Option<String>> = const { RefCell::new(None) };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

fn current_prefix() -> Option<String> {
    LOG_PREFIX.with(|slot| slot.borrow().clone())
}

fn render(message: &str) -> String {
    LOG_PREFIX.with(|slot| match slot.borrow().as_deref() {
        Some(prefix) => format!("{prefix}: {message}"),
        None => message.to_owned(),
    })
}

/// Mirrors warnings and errors into `path` in addition to stderr.
///
/// Only the first call installs a file; later calls create their file but
/// leave the installed one in place.
///
/// # Errors
///
/// Returns an error if the file or its parent directory cannot be created.
pub fn set_log_file(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let _ = LOG_FILE.set(Mutex::new(file));
    Ok(())
}

/// Prepends `prefix` (usually the path being read) to messages logged on
/// this thread until the returned guard is dropped.
pub fn set_log_prefix(prefix: impl Into<String>) -> LogPrefixGuard {
    let previous = current_prefix();
    LOG_PREFIX.with(|slot| *slot.borrow_mut() = Some(prefix.into()));
    LogPrefixGuard { previous }
}

/// Restores the previous thread-local prefix on drop.
pub struct LogPrefixGuard {
    previous: Option<String>,
}

impl Drop for LogPrefixGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        LOG_PREFIX.with(|slot| *slot.borrow_mut() = previous);
    }
}

pub fn log_warn(message: &str) {
    emit(Level::Warning, message);
}

pub fn log_error(message: &str) {
    emit(Level::Error, message);
}

fn emit(level: Level, message: &str) {
    let line = format!("{level}: {}", render(message));
    eprintln!("{line}");
    if let Some(file) = LOG_FILE.get()
        && let Ok(mut file) = file.lock()
    {
        let _ = writeln!(file, "{line}");
    }
}
