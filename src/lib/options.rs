//! Option Parser Adapter
//!
//! Walks the short options of a getopts-style flag grammar and hands each
//! one to a caller-supplied handler. The adapter never interprets what a
//! flag means.
//!
//! Grammar syntax:
//! `d:f:v`   `-d` and `-f` take an argument, `-v` does not
//! `:d:v`    same, with silent error reporting (no diagnostics on stderr)

use std::collections::BTreeMap;

use regex::Regex;

use crate::config::BootstrapConfig;
use crate::error::{PreflightError, Result};

const GRAMMAR_REGEX: &str = r"^:?([A-Za-z0-9]:?)*$";
const VARIABLE_NAME_REGEX: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Parsed flag grammar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagGrammar {
    /// Suppress getopts diagnostics
    pub silent: bool,
    /// Flag letters and whether each takes an argument
    flags: BTreeMap<char, bool>,
}

impl FlagGrammar {
    pub fn parse(grammar: &str) -> Result<Self> {
        let valid = Regex::new(GRAMMAR_REGEX)
            .map(|re| re.is_match(grammar))
            .unwrap_or(false);
        if !valid {
            return Err(PreflightError::validation(format!(
                "Invalid option flags: {}",
                grammar
            )));
        }

        let (silent, body) = match grammar.strip_prefix(':') {
            Some(rest) => (true, rest),
            None => (false, grammar),
        };

        let mut flags = BTreeMap::new();
        let chars: Vec<char> = body.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let takes_argument = chars.get(i + 1) == Some(&':');
            flags.insert(chars[i], takes_argument);
            i += if takes_argument { 2 } else { 1 };
        }

        Ok(Self { silent, flags })
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// `None` when the flag is not part of the grammar
    pub fn takes_argument(&self, flag: char) -> Option<bool> {
        self.flags.get(&flag).copied()
    }
}

/// One option occurrence as seen by the handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionEvent {
    /// A recognized flag and its argument, if the grammar gives it one
    Flag { flag: char, argument: Option<String> },
    /// A flag that is not in the grammar
    Unknown(char),
    /// A flag that needs an argument but none was left
    MissingArgument(char),
}

/// Caller hook invoked once per parsed option
pub trait OptionHandler {
    fn handle(&mut self, event: &OptionEvent, config: &mut BootstrapConfig) -> Result<()>;
}

impl<F> OptionHandler for F
where
    F: FnMut(&OptionEvent, &mut BootstrapConfig) -> Result<()>,
{
    fn handle(&mut self, event: &OptionEvent, config: &mut BootstrapConfig) -> Result<()> {
        self(event, config)
    }
}

/// Parse the options in `args` against `config.flags`, calling `handler`
/// for each one, and return the remaining positional arguments.
///
/// With an empty grammar the arguments pass through untouched.
pub fn parse_options(
    config: &mut BootstrapConfig,
    args: &[String],
    handler: Option<&mut dyn OptionHandler>,
) -> Result<Vec<String>> {
    let grammar = FlagGrammar::parse(&config.flags)?;
    if grammar.is_empty() {
        return Ok(args.to_vec());
    }
    let handler = handler.ok_or_else(|| {
        PreflightError::validation("Option flags declared without an options handler")
    })?;
    let program = config.program.clone();

    let mut index = 0;
    while index < args.len() {
        let arg = &args[index];
        if arg == "--" {
            index += 1;
            break;
        }
        if !arg.starts_with('-') || arg == "-" {
            break;
        }
        index += 1;

        let chars: Vec<char> = arg.chars().skip(1).collect();
        let mut pos = 0;
        while pos < chars.len() {
            let flag = chars[pos];
            pos += 1;

            let event = match grammar.takes_argument(flag) {
                None => {
                    if !grammar.silent {
                        eprintln!("{}: illegal option -- {}", program, flag);
                    }
                    OptionEvent::Unknown(flag)
                }
                Some(false) => OptionEvent::Flag {
                    flag,
                    argument: None,
                },
                Some(true) if pos < chars.len() => {
                    // Attached argument: rest of this word
                    let argument: String = chars[pos..].iter().collect();
                    pos = chars.len();
                    OptionEvent::Flag {
                        flag,
                        argument: Some(argument),
                    }
                }
                Some(true) if index < args.len() => {
                    let argument = args[index].clone();
                    index += 1;
                    OptionEvent::Flag {
                        flag,
                        argument: Some(argument),
                    }
                }
                Some(true) => {
                    if !grammar.silent {
                        eprintln!("{}: option requires an argument -- {}", program, flag);
                    }
                    OptionEvent::MissingArgument(flag)
                }
            };

            tracing::debug!(?event, "parsed option");
            handler.handle(&event, config)?;
        }
    }

    Ok(args[index..].to_vec())
}

/// Handler that stores flag values into the configuration's variables.
///
/// Declared as `d=data_dir f=config_file v=verbose`. A flag without an
/// argument stores `1`; a flag with no declared binding stores into
/// `opt_<letter>`. Unknown flags and missing arguments are usage errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableBinder {
    bindings: BTreeMap<char, String>,
}

impl VariableBinder {
    pub fn parse(declaration: &str) -> Result<Self> {
        let name_regex = Regex::new(VARIABLE_NAME_REGEX)
            .map_err(|e| PreflightError::validation(e.to_string()))?;

        let mut bindings = BTreeMap::new();
        for token in declaration.split_whitespace() {
            let invalid =
                || PreflightError::validation(format!("Invalid flag binding: {}", token));
            let (flag, name) = token.split_once('=').ok_or_else(invalid)?;
            let mut flag_chars = flag.chars();
            let flag = match (flag_chars.next(), flag_chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => c,
                _ => return Err(invalid()),
            };
            if !name_regex.is_match(name) {
                return Err(invalid());
            }
            bindings.insert(flag, name.to_string());
        }
        Ok(Self { bindings })
    }

    /// Variable name a flag's value is stored under
    pub fn variable_for(&self, flag: char) -> String {
        self.bindings
            .get(&flag)
            .cloned()
            .unwrap_or_else(|| format!("opt_{}", flag))
    }

    /// Names of every declared binding
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.bindings.values().map(String::as_str)
    }
}

impl OptionHandler for VariableBinder {
    fn handle(&mut self, event: &OptionEvent, config: &mut BootstrapConfig) -> Result<()> {
        match event {
            OptionEvent::Flag { flag, argument } => {
                let value = argument.clone().unwrap_or_else(|| "1".to_string());
                config.set_variable(self.variable_for(*flag), value);
                Ok(())
            }
            OptionEvent::Unknown(flag) => Err(PreflightError::usage_with(format!(
                "Unknown option: -{}",
                flag
            ))),
            OptionEvent::MissingArgument(flag) => Err(PreflightError::usage_with(format!(
                "Option -{} requires an argument.",
                flag
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_args(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    fn config_with_flags(flags: &str) -> BootstrapConfig {
        BootstrapConfig {
            program: "test".to_string(),
            flags: flags.to_string(),
            ..Default::default()
        }
    }

    /// Run the parser with a handler that records every event
    fn collect(flags: &str, args: &[&str]) -> (Vec<OptionEvent>, Vec<String>) {
        let mut config = config_with_flags(flags);
        let mut events = Vec::new();
        let mut handler = |event: &OptionEvent, _: &mut BootstrapConfig| -> Result<()> {
            events.push(event.clone());
            Ok(())
        };
        let rest = parse_options(&mut config, &to_args(args), Some(&mut handler)).unwrap();
        (events, rest)
    }

    #[test]
    fn test_grammar_parse() {
        let grammar = FlagGrammar::parse("d:f:v").unwrap();
        assert!(!grammar.silent);
        assert_eq!(grammar.takes_argument('d'), Some(true));
        assert_eq!(grammar.takes_argument('v'), Some(false));
        assert_eq!(grammar.takes_argument('x'), None);

        assert!(FlagGrammar::parse(":ab:").unwrap().silent);
        assert!(FlagGrammar::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_grammar_rejects_garbage() {
        let err = FlagGrammar::parse("d::-x").unwrap_err();
        assert_eq!(err.to_string(), "Invalid option flags: d::-x");
    }

    #[test]
    fn test_empty_grammar_passes_through() {
        let mut config = config_with_flags("");
        let args = to_args(&["-x", "file"]);
        let rest = parse_options(&mut config, &args, None).unwrap();
        assert_eq!(rest, args);
    }

    #[test]
    fn test_grammar_without_handler() {
        let mut config = config_with_flags("v");
        let err = parse_options(&mut config, &to_args(&["-v"]), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Option flags declared without an options handler"
        );
    }

    #[test]
    fn test_separate_and_attached_arguments() {
        let (events, rest) = collect("d:f:v", &["-d", "/srv", "-f/etc/x.conf", "-v", "a", "b"]);
        assert_eq!(
            events,
            vec![
                OptionEvent::Flag {
                    flag: 'd',
                    argument: Some("/srv".to_string())
                },
                OptionEvent::Flag {
                    flag: 'f',
                    argument: Some("/etc/x.conf".to_string())
                },
                OptionEvent::Flag {
                    flag: 'v',
                    argument: None
                },
            ]
        );
        assert_eq!(rest, vec!["a", "b"]);
    }

    #[test]
    fn test_clustered_flags() {
        let (events, rest) = collect("vqd:", &["-vqd", "out", "in"]);
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[2],
            OptionEvent::Flag {
                flag: 'd',
                argument: Some("out".to_string())
            }
        );
        assert_eq!(rest, vec!["in"]);
    }

    #[test]
    fn test_double_dash_ends_options() {
        let (events, rest) = collect("v", &["-v", "--", "-v", "x"]);
        assert_eq!(events.len(), 1);
        assert_eq!(rest, vec!["-v", "x"]);
    }

    #[test]
    fn test_first_operand_ends_options() {
        let (events, rest) = collect("v", &["x", "-v"]);
        assert!(events.is_empty());
        assert_eq!(rest, vec!["x", "-v"]);

        let (events, rest) = collect("v", &["-", "-v"]);
        assert!(events.is_empty());
        assert_eq!(rest, vec!["-", "-v"]);
    }

    #[test]
    fn test_unknown_and_missing_argument_events() {
        let (events, rest) = collect(":d:", &["-x", "-d"]);
        assert_eq!(
            events,
            vec![OptionEvent::Unknown('x'), OptionEvent::MissingArgument('d')]
        );
        assert!(rest.is_empty());
    }

    #[test]
    fn test_handler_error_stops_parsing() {
        let mut config = config_with_flags("ab");
        let mut seen = 0;
        let mut handler = |_: &OptionEvent, _: &mut BootstrapConfig| -> Result<()> {
            seen += 1;
            Err(PreflightError::usage())
        };
        let result = parse_options(&mut config, &to_args(&["-ab"]), Some(&mut handler));
        assert!(result.unwrap_err().is_usage());
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_variable_binder_parse() {
        let binder = VariableBinder::parse("d=data_dir f=config_file").unwrap();
        assert_eq!(binder.variable_for('d'), "data_dir");
        assert_eq!(binder.variable_for('q'), "opt_q");
        let names: Vec<&str> = binder.variable_names().collect();
        assert_eq!(names, vec!["data_dir", "config_file"]);
    }

    #[test]
    fn test_variable_binder_rejects_bad_tokens() {
        for bad in ["d", "dd=x", "d=1abc", "-=x", "d=a-b"] {
            let err = VariableBinder::parse(bad).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid flag binding: {}", bad));
        }
    }

    #[test]
    fn test_variable_binder_sets_variables() {
        let mut config = config_with_flags("d:v");
        let mut binder = VariableBinder::parse("d=data_dir").unwrap();
        let rest = parse_options(
            &mut config,
            &to_args(&["-d", "/srv/data", "-v", "input"]),
            Some(&mut binder),
        )
        .unwrap();
        assert_eq!(config.variable("data_dir"), Some("/srv/data"));
        assert_eq!(config.variable("opt_v"), Some("1"));
        assert_eq!(rest, vec!["input"]);
    }

    #[test]
    fn test_variable_binder_unknown_option_is_usage() {
        let mut config = config_with_flags(":v");
        let mut binder = VariableBinder::default();
        let err = parse_options(&mut config, &to_args(&["-z"]), Some(&mut binder)).unwrap_err();
        assert_eq!(err, PreflightError::usage_with("Unknown option: -z"));
    }

    #[test]
    fn test_variable_binder_missing_argument_is_usage() {
        let mut config = config_with_flags(":d:");
        let mut binder = VariableBinder::default();
        let err = parse_options(&mut config, &to_args(&["-d"]), Some(&mut binder)).unwrap_err();
        assert_eq!(
            err,
            PreflightError::usage_with("Option -d requires an argument.")
        );
    }
}
