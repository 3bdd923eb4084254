//! Bootstrap driver
//!
//! Runs the stages in their fixed order:
//! privilege gate, default resolution, option parsing, timestamp and log
//! target, named resources, prerequisites, positional arguments.
//! The first failing stage ends the run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;

use serde::Serialize;

use crate::arguments::validate_arguments;
use crate::config::BootstrapConfig;
use crate::defaults::{resolve_defaults, slot_path, Slot};
use crate::error::{PreflightError, Result};
use crate::log_target::{create_log_file, redirect_output, Console, Timestamp};
use crate::options::{parse_options, OptionHandler};
use crate::prerequisites::{check_prerequisites, Prerequisites};
use crate::privilege::{check_privilege, effective_uid};
use crate::resources::{expand_resources, ResourceBindings};

/// Everything a successful run resolved
#[derive(Debug, Serialize)]
pub struct Bootstrapped {
    pub program: String,
    pub resources_dir: PathBuf,
    pub log_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub timestamp: Timestamp,
    /// Generated log file, when logging is enabled
    pub log_file: Option<PathBuf>,
    /// Named resources, `resource1` first
    pub resources: ResourceBindings,
    /// Positional arguments left after option parsing
    pub arguments: Vec<String>,
    /// Variables after option handling
    pub variables: BTreeMap<String, String>,
    /// Original stdout, when output was redirected to the log file
    #[serde(skip)]
    pub console: Option<Console>,
}

impl Bootstrapped {
    pub fn slot(&self, slot: Slot) -> &Path {
        match slot {
            Slot::ResourcesDir => &self.resources_dir,
            Slot::LogDir => &self.log_dir,
            Slot::TempDir => &self.temp_dir,
        }
    }

    /// Resource bound to `resource<index>`
    pub fn resource(&self, index: usize) -> Option<&Path> {
        self.resources.get(index)
    }
}

/// One bootstrap run over a configuration
#[derive(Debug)]
pub struct Bootstrap {
    config: BootstrapConfig,
    effective_uid: u32,
    redirect: bool,
    log_file: Option<PathBuf>,
}

impl Bootstrap {
    pub fn new(config: BootstrapConfig) -> Self {
        Self {
            config,
            effective_uid: effective_uid(),
            redirect: true,
            log_file: None,
        }
    }

    /// Use `uid` instead of the process's effective uid for the privilege gate
    pub fn with_effective_uid(mut self, uid: u32) -> Self {
        self.effective_uid = uid;
        self
    }

    /// Whether enabling the log also rebinds this process's stdout and
    /// stderr. When off, the log file is only created.
    pub fn with_redirect(mut self, redirect: bool) -> Self {
        self.redirect = redirect;
        self
    }

    /// Configuration as updated by the stages that have run so far
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Log file created by this run, if the logging stage was reached
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn run(
        &mut self,
        args: &[String],
        handler: Option<&mut dyn OptionHandler>,
    ) -> Result<Bootstrapped> {
        check_privilege(self.config.require_root, self.effective_uid)?;

        self.config = resolve_defaults(self.config.clone())?;
        let resources_dir = slot_path(&self.config, Slot::ResourcesDir);
        let log_dir = slot_path(&self.config, Slot::LogDir);
        let temp_dir = slot_path(&self.config, Slot::TempDir);

        let arguments = parse_options(&mut self.config, args, handler)?;

        let timestamp = Timestamp::now();
        let mut console = None;
        if self.config.enable_log {
            let (path, file) = create_log_file(&log_dir, &self.config.program, &timestamp)?;
            self.log_file = Some(path);
            if self.redirect {
                console = Some(redirect_output(&file)?);
            }
        }

        let resources = expand_resources(&resources_dir, &self.config.resources)?;

        check_prerequisites(&Prerequisites::from_config(&self.config), &self.config)?;

        validate_arguments(self.config.args_type(), &arguments)?;

        tracing::debug!(program = %self.config.program, "bootstrap complete");
        Ok(Bootstrapped {
            program: self.config.program.clone(),
            resources_dir,
            log_dir,
            temp_dir,
            timestamp,
            log_file: self.log_file.clone(),
            resources,
            arguments,
            variables: self.config.variables.clone(),
            console,
        })
    }
}

/// Print a fatal condition the way the calling script expects and end the
/// process: usage text with status 0, or the error message with status 1
pub fn report_and_exit(error: &PreflightError, config: &BootstrapConfig) -> ! {
    println!("{}", error.render(&config.program, &config.usage_text));
    process::exit(error.exit_code());
}

/// Run a bootstrap, terminating the process on the first failure
pub fn bootstrap_or_exit(
    config: BootstrapConfig,
    args: &[String],
    handler: Option<&mut dyn OptionHandler>,
) -> Bootstrapped {
    let mut bootstrap = Bootstrap::new(config);
    match bootstrap.run(args, handler) {
        Ok(done) => done,
        Err(e) => report_and_exit(&e, bootstrap.config()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::VariableBinder;
    use std::fs;
    use tempfile::TempDir;

    fn to_args(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    fn base_config(home: &Path) -> BootstrapConfig {
        BootstrapConfig::new("job.sh", home)
    }

    #[test]
    fn test_minimal_run_resolves_defaults() {
        let home = TempDir::new().unwrap();
        let mut bootstrap = Bootstrap::new(base_config(home.path()));
        let done = bootstrap.run(&to_args(&["a", "b"]), None).unwrap();

        assert_eq!(done.slot(Slot::ResourcesDir), home.path().join("resources"));
        assert_eq!(done.log_dir, home.path().join("log"));
        assert!(done.temp_dir.is_dir());
        assert_eq!(done.arguments, vec!["a", "b"]);
        assert!(done.log_file.is_none());
        assert!(done.console.is_none());
    }

    #[test]
    fn test_root_required_fails_before_defaults() {
        let home = TempDir::new().unwrap();
        let mut config = base_config(home.path());
        config.require_root = true;

        let mut bootstrap = Bootstrap::new(config).with_effective_uid(1000);
        let err = bootstrap.run(&[], None).unwrap_err();
        assert_eq!(err.to_string(), "UID: 1000. This script must be run as root.");
        assert!(!home.path().join("resources").exists());
        assert!(!home.path().join("log").exists());
    }

    #[test]
    fn test_root_required_passes_for_root() {
        let home = TempDir::new().unwrap();
        let mut config = base_config(home.path());
        config.require_root = true;

        let mut bootstrap = Bootstrap::new(config).with_effective_uid(0);
        assert!(bootstrap.run(&[], None).is_ok());
    }

    #[test]
    fn test_flags_feed_prerequisites() {
        let home = TempDir::new().unwrap();
        let data = home.path().join("data");
        fs::create_dir(&data).unwrap();
        let mut config = base_config(home.path());
        config.flags = "d:".to_string();
        config.require_dirs = vec!["data_dir".to_string()];

        let data_arg = data.to_string_lossy().to_string();
        let mut binder = VariableBinder::parse("d=data_dir").unwrap();
        let args = to_args(&["-d", data_arg.as_str(), "rest"]);
        let mut bootstrap = Bootstrap::new(config);
        let done = bootstrap.run(&args, Some(&mut binder)).unwrap();

        assert_eq!(
            done.variables.get("data_dir").map(String::as_str),
            Some(data_arg.as_str())
        );
        assert_eq!(done.arguments, vec!["rest"]);
    }

    #[test]
    fn test_missing_flag_is_usage() {
        let home = TempDir::new().unwrap();
        let mut config = base_config(home.path());
        config.require_dirs = vec!["a".to_string(), "b".to_string()];

        let err = Bootstrap::new(config).run(&[], None).unwrap_err();
        assert_eq!(err.exit_code(), 0);
        assert!(err.is_usage());
    }

    #[test]
    fn test_resources_bind_in_order() {
        let home = TempDir::new().unwrap();
        let resources = home.path().join("resources");
        fs::create_dir(&resources).unwrap();
        fs::write(resources.join("x.conf"), "x").unwrap();
        fs::write(resources.join("y.conf"), "y").unwrap();
        let mut config = base_config(home.path());
        config.resources = vec!["x.conf".to_string(), "y.conf".to_string()];

        let done = Bootstrap::new(config).run(&[], None).unwrap();
        assert_eq!(done.resource(1), Some(resources.join("x.conf").as_path()));
        assert_eq!(done.resource(2), Some(resources.join("y.conf").as_path()));
    }

    #[test]
    fn test_positional_file_required() {
        let home = TempDir::new().unwrap();
        let mut config = base_config(home.path());
        config.args_type = Some("file".to_string());

        let mut bootstrap = Bootstrap::new(config);
        let err = bootstrap.run(&[], None).unwrap_err();
        assert_eq!(err, PreflightError::usage_with("No input file specified."));
        assert_eq!(
            err.render(&bootstrap.config().program, "file..."),
            format!(
                "No input file specified.\n{}\nUsage: job.sh file...",
                "=".repeat(50)
            )
        );
    }

    #[test]
    fn test_log_file_created_without_redirect() {
        let home = TempDir::new().unwrap();
        let mut config = base_config(home.path());
        config.enable_log = true;

        let mut bootstrap = Bootstrap::new(config).with_redirect(false);
        let done = bootstrap.run(&[], None).unwrap();
        let log_file = done.log_file.clone().unwrap();

        assert!(log_file.is_file());
        assert_eq!(log_file.parent(), Some(home.path().join("log").as_path()));
        let name = log_file.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("job.sh_"));
        assert!(name.ends_with(".log"));
        assert!(name.contains(&done.timestamp.date));
        assert_eq!(bootstrap.log_file(), Some(log_file.as_path()));
        assert!(done.console.is_none());
    }

    #[test]
    fn test_log_file_known_after_later_failure() {
        let home = TempDir::new().unwrap();
        let mut config = base_config(home.path());
        config.enable_log = true;
        config.resources = vec!["missing.conf".to_string()];

        let mut bootstrap = Bootstrap::new(config).with_redirect(false);
        let err = bootstrap.run(&[], None).unwrap_err();
        assert!(err.to_string().starts_with("Resource file does not exist:"));
        assert!(bootstrap.log_file().is_some_and(Path::is_file));
    }
}
