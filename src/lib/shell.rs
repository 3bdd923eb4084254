//! Shell snippets for `eval "$(preflight "$@")"`
//!
//! A successful run becomes variable assignments plus `set --` for the
//! remaining positional arguments. A failed run becomes a `printf` of the
//! usage or error text followed by `exit`, so the calling script terminates
//! the same way it would had it run the checks itself.

use std::path::Path;

use regex::Regex;
use shell_words::quote;

use crate::bootstrap::Bootstrapped;
use crate::error::PreflightError;

const IDENTIFIER_REGEX: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Whether `name` can be assigned to in a POSIX shell
pub fn is_shell_identifier(name: &str) -> bool {
    Regex::new(IDENTIFIER_REGEX)
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

fn assignment(name: &str, value: &str) -> String {
    format!("{}={}\n", name, quote(value))
}

fn path_assignment(name: &str, path: &Path) -> String {
    assignment(name, &path.to_string_lossy())
}

/// Redirect the calling shell's output to the log file
fn exec_redirect(log_file: &Path) -> String {
    format!("exec >>{} 2>&1\n", quote(&log_file.to_string_lossy()))
}

/// Render a successful run
pub fn render_success(done: &Bootstrapped) -> String {
    let mut script = String::new();
    if let Some(ref log_file) = done.log_file {
        script.push_str(&exec_redirect(log_file));
    }

    script.push_str(&path_assignment("resources_dir", &done.resources_dir));
    script.push_str(&path_assignment("log_dir", &done.log_dir));
    script.push_str(&path_assignment("temp_dir", &done.temp_dir));
    script.push_str(&assignment("start_date", &done.timestamp.date));
    script.push_str(&assignment("start_time", &done.timestamp.time));
    if let Some(ref log_file) = done.log_file {
        script.push_str(&path_assignment("log_file", log_file));
    }
    for (name, path) in done.resources.iter() {
        script.push_str(&path_assignment(&name, path));
    }
    for (name, value) in &done.variables {
        if is_shell_identifier(name) {
            script.push_str(&assignment(name, value));
        } else {
            tracing::warn!(variable = %name, "skipping variable that is not a shell identifier");
        }
    }

    script.push_str("set --");
    for arg in &done.arguments {
        script.push(' ');
        script.push_str(&quote(arg));
    }
    script.push('\n');
    script
}

/// Render a failed run. `log_file` is the log target if the run got far
/// enough to create it; the message then lands in the log like any other
/// output of the calling script.
pub fn render_failure(
    error: &PreflightError,
    program: &str,
    usage_text: &str,
    log_file: Option<&Path>,
) -> String {
    let mut script = String::new();
    if let Some(log_file) = log_file {
        script.push_str(&exec_redirect(log_file));
    }
    script.push_str(&format!(
        "printf '%s\\n' {}\n",
        quote(&error.render(program, usage_text))
    ));
    script.push_str(&format!("exit {}\n", error.exit_code()));
    script
}
