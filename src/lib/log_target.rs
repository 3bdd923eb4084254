//! Log target for a bootstrap run
//!
//! The log file name is derived from the program base name and the moment
//! logging was enabled: `<program>_<YYYYMMDD>_<HHMMSS>.log`. The file is
//! created once per run and never reopened or rotated.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::config::program_base_name;
use crate::error::{PreflightError, Result};

/// Date and time captured when the bootstrap reaches the logging stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    /// `YYYYMMDD`
    pub date: String,
    /// `HHMMSS`
    pub time: String,
}

impl Timestamp {
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn from_datetime<Tz>(datetime: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            date: datetime.format("%Y%m%d").to_string(),
            time: datetime.format("%H%M%S").to_string(),
        }
    }
}

/// Log file name for a program at a timestamp
pub fn log_file_name(program: &str, timestamp: &Timestamp) -> String {
    format!(
        "{}_{}_{}.log",
        program_base_name(program),
        timestamp.date,
        timestamp.time
    )
}

/// Header written at the top of a fresh log file
pub fn create_log_header(program: &str, timestamp: &Timestamp) -> String {
    let mut content = String::new();
    content.push_str(&format!("=== {} log ===\n", program_base_name(program)));
    content.push_str(&format!("Started: {} {}\n", timestamp.date, timestamp.time));
    content.push_str(&format!("Platform: {}\n", std::env::consts::OS));
    content.push_str(&format!(
        "Working Directory: {}\n",
        std::env::current_dir().unwrap_or_default().display()
    ));
    content.push_str(&format!("{}\n\n", "=".repeat(50)));
    content
}

/// Create the log file in `log_dir` and write its header
pub fn create_log_file(
    log_dir: &Path,
    program: &str,
    timestamp: &Timestamp,
) -> Result<(PathBuf, File)> {
    let path = log_dir.join(log_file_name(program, timestamp));
    let cannot_create = |e: io::Error| {
        PreflightError::validation(format!(
            "Could not create log file {}: {}",
            path.display(),
            e
        ))
    };

    let mut file = File::create(&path).map_err(cannot_create)?;
    file.write_all(create_log_header(program, timestamp).as_bytes())
        .map_err(cannot_create)?;
    tracing::info!(path = %path.display(), "logging to file");
    Ok((path, file))
}

/// Handle on the console stdout that was in place before redirection
#[derive(Debug)]
pub struct Console {
    stdout: File,
}

impl Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdout.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

#[cfg(unix)]
impl std::os::unix::io::AsRawFd for Console {
    fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        self.stdout.as_raw_fd()
    }
}

/// Point the process's stdout and stderr at `log_file` for the rest of its
/// lifetime. Returns a handle to the previous stdout.
#[cfg(unix)]
pub fn redirect_output(log_file: &File) -> Result<Console> {
    use std::os::unix::io::AsRawFd;

    // Anything buffered so far belongs to the console
    io::stdout()
        .flush()
        .map_err(|e| PreflightError::validation(format!("Could not flush stdout: {}", e)))?;

    redirect_fds(log_file.as_raw_fd(), libc::STDOUT_FILENO, libc::STDERR_FILENO)
}

/// Rebind `stdout_fd` and `stderr_fd` to `target`. Either both are
/// rebound or `stdout_fd` is left as it was.
#[cfg(unix)]
fn redirect_fds(
    target: std::os::unix::io::RawFd,
    stdout_fd: std::os::unix::io::RawFd,
    stderr_fd: std::os::unix::io::RawFd,
) -> Result<Console> {
    use std::os::unix::io::{AsRawFd, FromRawFd};

    let failed = |what: &str| {
        PreflightError::validation(format!(
            "Could not redirect {} to log file: {}",
            what,
            io::Error::last_os_error()
        ))
    };

    // SAFETY: plain fd duplication; every return value is checked
    unsafe {
        let saved = libc::dup(stdout_fd);
        if saved < 0 {
            return Err(failed("stdout"));
        }
        let console = Console {
            stdout: File::from_raw_fd(saved),
        };
        if libc::dup2(target, stdout_fd) < 0 {
            return Err(failed("stdout"));
        }
        if libc::dup2(target, stderr_fd) < 0 {
            let error = failed("stderr");
            libc::dup2(console.as_raw_fd(), stdout_fd);
            return Err(error);
        }
        Ok(console)
    }
}

#[cfg(not(unix))]
pub fn redirect_output(_log_file: &File) -> Result<Console> {
    Err(PreflightError::validation(
        "Output redirection is not supported on this platform",
    ))
}
