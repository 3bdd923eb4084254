//! script-preflight library
//!
//! Bootstrap layer for scripts: resolves default directories, parses
//! short options, validates required directories, files and positional
//! arguments, and optionally sends output to a per-run log file.

pub mod arguments;
pub mod bootstrap;
pub mod config;
pub mod defaults;
pub mod error;
pub mod log_target;
pub mod options;
pub mod paths;
pub mod prerequisites;
pub mod privilege;
pub mod resource;
pub mod resources;
pub mod shell;
pub mod usage;

// Re-export commonly used items
pub use arguments::validate_arguments;
pub use bootstrap::{bootstrap_or_exit, report_and_exit, Bootstrap, Bootstrapped};
pub use config::{program_base_name, split_names, BootstrapConfig};
pub use defaults::{resolve_defaults, Slot};
pub use error::{PreflightError, Result};
pub use log_target::{create_log_file, log_file_name, redirect_output, Console, Timestamp};
pub use options::{parse_options, FlagGrammar, OptionEvent, OptionHandler, VariableBinder};
pub use paths::{absolutize, find_in_ancestors};
pub use prerequisites::{check_prerequisites, Prerequisites};
pub use privilege::{check_privilege, effective_uid, is_root};
pub use resource::{check_resource, ResourceCheck, ResourceKind};
pub use resources::{expand_resources, ResourceBindings};
pub use shell::{render_failure, render_success};
pub use usage::format_usage;
