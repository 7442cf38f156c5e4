#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Parses args manually (no external dependencies) to keep the binary lean.
//! Supports environment variable overrides via `PROPWATCH_DEMO_*` prefix.

use std::env;
use std::process;

use crate::scenarios::Scenario;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
propwatch demo: observable attributes printing their changes

USAGE:
    propwatch-demo [OPTIONS]

OPTIONS:
    --scenario=NAME       Scenario to run (default: all)
    --log=FILTER          Tracing filter, e.g. 'propwatch=trace' (default: info)
    --async-delay-ms=N    Delay of the async observer in ms (default: 10)
    --quiet, -q           Do not echo observed changes to stdout
    --help, -h            Show this help message
    --version, -V         Show version

SCENARIOS:
    all         Run every scenario in order
    basic       Free-function observer on a plain type
    facade      Instance-scoped subscription through the Observable trait
    phases      Before/after observers around one write
    computed    Derived attribute notified from a mutating method
    recursion   Observer writing the attribute it observes (rejected)
    async       Async observer driven to completion in place

ENVIRONMENT VARIABLES:
    PROPWATCH_DEMO_SCENARIO        Override --scenario
    PROPWATCH_DEMO_LOG             Override --log
    PROPWATCH_DEMO_ASYNC_DELAY_MS  Override --async-delay-ms
    PROPWATCH_DEMO_QUIET           Override --quiet (1/true to enable)";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Scenario to run.
    pub scenario: Scenario,
    /// Tracing filter directive.
    pub log_filter: String,
    /// Delay of the async observer in milliseconds.
    pub async_delay_ms: u64,
    /// Suppress echoing of observed changes.
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseError {
    Help,
    Version,
    InvalidValue { flag: &'static str, value: String },
    UnknownArg(String),
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            scenario: Scenario::All,
            log_filter: "info".into(),
            async_delay_ms: 10,
            quiet: false,
        }
    }
}

impl Opts {
    /// Parse command-line arguments and environment variables.
    ///
    /// Environment variables take precedence over defaults but are overridden
    /// by explicit command-line flags.
    pub fn parse() -> Self {
        match Self::parse_from_env_and_args(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(opts) => opts,
            Err(ParseError::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Err(ParseError::Version) => {
                println!("propwatch-demo {VERSION}");
                process::exit(0);
            }
            Err(ParseError::InvalidValue { flag, value }) => {
                eprintln!("Invalid {flag} value: {value}");
                process::exit(1);
            }
            Err(ParseError::UnknownArg(arg)) => {
                eprintln!("Unknown argument: {arg}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    fn parse_from_env_and_args<I, S, F>(args: I, get_env: F) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        // Apply environment variable defaults first
        if let Some(val) = get_env("PROPWATCH_DEMO_SCENARIO")
            && let Some(scenario) = Scenario::from_name(&val)
        {
            opts.scenario = scenario;
        }
        if let Some(val) = get_env("PROPWATCH_DEMO_LOG")
            && !val.trim().is_empty()
        {
            opts.log_filter = val;
        }
        if let Some(val) = get_env("PROPWATCH_DEMO_ASYNC_DELAY_MS")
            && let Ok(n) = val.parse()
        {
            opts.async_delay_ms = n;
        }
        if let Some(val) = get_env("PROPWATCH_DEMO_QUIET") {
            opts.quiet = val == "1" || val.eq_ignore_ascii_case("true");
        }

        // Parse command-line args (override env vars)
        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--help" | "-h" => return Err(ParseError::Help),
                "--version" | "-V" => return Err(ParseError::Version),
                "--quiet" | "-q" => opts.quiet = true,
                other => {
                    if let Some(val) = other.strip_prefix("--scenario=") {
                        opts.scenario =
                            Scenario::from_name(val).ok_or_else(|| ParseError::InvalidValue {
                                flag: "--scenario",
                                value: val.to_string(),
                            })?;
                    } else if let Some(val) = other.strip_prefix("--log=") {
                        opts.log_filter = val.to_string();
                    } else if let Some(val) = other.strip_prefix("--async-delay-ms=") {
                        opts.async_delay_ms =
                            val.parse().map_err(|_| ParseError::InvalidValue {
                                flag: "--async-delay-ms",
                                value: val.to_string(),
                            })?;
                    } else {
                        return Err(ParseError::UnknownArg(other.to_string()));
                    }
                }
            }
        }

        Ok(opts)
    }
}
