//! preflight CLI
//!
//! Runs the bootstrap checks on behalf of a shell script and prints shell
//! code for the script to evaluate:
//!
//! ```sh
//! export PREFLIGHT_PROGRAM="$0" PREFLIGHT_USAGE="-d data_dir file..."
//! export PREFLIGHT_FLAGS="d:" PREFLIGHT_FLAG_BINDINGS="d=data_dir"
//! export PREFLIGHT_REQUIRE_DIRS="data_dir" PREFLIGHT_ARGS_TYPE="file"
//! eval "$(preflight "$@")"
//! ```
//!
//! All settings come from `PREFLIGHT_*` environment variables; the
//! command-line arguments are the calling script's own arguments.

use std::env;
use std::path::{Path, PathBuf};
use std::process;

use serde_json::json;
use tracing_subscriber::EnvFilter;

use script_preflight::{
    absolutize, find_in_ancestors, program_base_name, render_failure, render_success, split_names,
    Bootstrap, BootstrapConfig, Bootstrapped, PreflightError, VariableBinder,
};

/// Valid values for PREFLIGHT_OUTPUT_FORMAT
const VALID_OUTPUT_FORMATS: [&str; 2] = ["shell", "json"];

/// Marker directory searched for in the ancestors of the working directory
const HOME_MARKER: &str = "resources";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Shell,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Result<Self, PreflightError> {
        match value {
            "" | "shell" => Ok(OutputFormat::Shell),
            "json" => Ok(OutputFormat::Json),
            other => Err(PreflightError::validation(format!(
                "Invalid output format: \"{}\". Valid options are: {}",
                other,
                VALID_OUTPUT_FORMATS.join(", ")
            ))),
        }
    }
}

/// Configuration from environment variables
struct Config {
    /// Bootstrap declaration for the calling script
    bootstrap: BootstrapConfig,
    /// Flag letter to variable name bindings
    flag_bindings: String,
    /// How results are printed
    output_format: OutputFormat,
}

impl Config {
    fn from_env() -> Result<Self, PreflightError> {
        let output_format = OutputFormat::parse(&env_string("PREFLIGHT_OUTPUT_FORMAT"))?;

        let require_dirs = split_names(&env_string("PREFLIGHT_REQUIRE_DIRS"));
        let require_files = split_names(&env_string("PREFLIGHT_REQUIRE_FILES"));

        // Required variables may already be set by the calling script
        let mut bootstrap = BootstrapConfig::new(program_name(), resolve_home());
        for name in require_dirs.iter().chain(require_files.iter()) {
            match env::var(name) {
                Ok(value) => bootstrap.set_variable(name.clone(), value),
                Err(env::VarError::NotPresent) => {}
                Err(env::VarError::NotUnicode(raw)) => {
                    return Err(PreflightError::validation(format!(
                        "Invalid encoding in variable {}: {}",
                        name,
                        raw.to_string_lossy()
                    )));
                }
            }
        }

        bootstrap.usage_text = env_string("PREFLIGHT_USAGE");
        bootstrap.resources_dir = env_path("PREFLIGHT_RESOURCES_DIR");
        bootstrap.log_dir = env_path("PREFLIGHT_LOG_DIR");
        bootstrap.temp_dir = env_path("PREFLIGHT_TEMP_DIR");
        bootstrap.flags = env_string("PREFLIGHT_FLAGS");
        bootstrap.require_root = env_flag("PREFLIGHT_REQUIRE_ROOT");
        bootstrap.enable_log = env_flag("PREFLIGHT_ENABLE_LOG");
        bootstrap.require_dirs = require_dirs;
        bootstrap.require_files = require_files;
        bootstrap.args_type = env::var("PREFLIGHT_ARGS_TYPE").ok();
        bootstrap.resources = split_names(&env_string("PREFLIGHT_RESOURCES"));

        Ok(Self {
            bootstrap,
            flag_bindings: env_string("PREFLIGHT_FLAG_BINDINGS"),
            output_format,
        })
    }
}

fn env_string(name: &str) -> String {
    env::var(name).unwrap_or_default()
}

/// Any non-empty value switches a setting on
fn env_flag(name: &str) -> bool {
    env::var(name).is_ok_and(|v| !v.is_empty())
}

fn env_bool(name: &str) -> bool {
    env::var(name).is_ok_and(|v| v == "1" || v == "true")
}

/// Non-empty path setting, made absolute so emitted assignments survive a
/// later `cd` in the calling script
fn env_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .map(|v| absolutize(Path::new(&v)))
}

/// Name of the calling script, falling back to our own invocation name
fn program_name() -> String {
    env::var("PREFLIGHT_PROGRAM")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| {
            env::args_os()
                .next()
                .map(|argv0| program_base_name(&argv0.to_string_lossy()))
        })
        .unwrap_or_else(|| "preflight".to_string())
}

/// Base path for slot defaults: PREFLIGHT_HOME, else the nearest ancestor
/// of the working directory holding a `resources/` directory, else the
/// user's home directory
fn resolve_home() -> PathBuf {
    if let Some(home) = env_path("PREFLIGHT_HOME") {
        return home;
    }
    env::current_dir()
        .ok()
        .and_then(|cwd| find_in_ancestors(&cwd, HOME_MARKER))
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// The calling script's arguments; anything that is not valid UTF-8 is
/// rejected rather than skipped
fn script_args() -> Result<Vec<String>, PreflightError> {
    env::args_os()
        .skip(1)
        .map(|arg| {
            arg.into_string().map_err(|raw| {
                PreflightError::validation(format!(
                    "Invalid argument encoding: {}",
                    raw.to_string_lossy()
                ))
            })
        })
        .collect()
}

fn init_tracing() {
    let default_level = if env_bool("PREFLIGHT_DEBUG") {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_env("PREFLIGHT_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_success(format: OutputFormat, done: &Bootstrapped) {
    match format {
        OutputFormat::Shell => print!("{}", render_success(done)),
        OutputFormat::Json => match serde_json::to_string_pretty(done) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                let error = PreflightError::validation(format!("Could not encode result: {}", e));
                fail(format, &error, &done.program, "", done.log_file.as_deref());
            }
        },
    }
}

/// Print the failure and exit; the only place the process terminates on error
fn fail(
    format: OutputFormat,
    error: &PreflightError,
    program: &str,
    usage_text: &str,
    log_file: Option<&Path>,
) -> ! {
    match format {
        OutputFormat::Shell => print!("{}", render_failure(error, program, usage_text, log_file)),
        OutputFormat::Json => {
            let value = json!({
                "error": {
                    "kind": error.kind(),
                    "message": error.render(program, usage_text),
                    "exitCode": error.exit_code(),
                    "logFile": log_file,
                }
            });
            println!("{}", value);
        }
    }
    process::exit(error.exit_code());
}

fn main() {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => fail(OutputFormat::Shell, &e, &program_name(), "", None),
    };
    let format = config.output_format;

    let args = match script_args() {
        Ok(args) => args,
        Err(e) => fail(format, &e, &config.bootstrap.program, "", None),
    };

    let mut binder = match VariableBinder::parse(&config.flag_bindings) {
        Ok(binder) => binder,
        Err(e) => fail(format, &e, &config.bootstrap.program, "", None),
    };

    // The calling shell redirects itself with the emitted `exec` line
    let mut bootstrap = Bootstrap::new(config.bootstrap).with_redirect(false);
    match bootstrap.run(&args, Some(&mut binder)) {
        Ok(done) => print_success(format, &done),
        Err(e) => {
            let declared = bootstrap.config();
            fail(
                format,
                &e,
                &declared.program,
                &declared.usage_text,
                bootstrap.log_file(),
            );
        }
    }
}
