//! Command-line surface of schema-lister.
//!
//! Exposed as a library so the argument handling can be tested without
//! spawning the binary. `main.rs` only wires these pieces together.

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser};
use schema_lister_core::Configuration;
use schema_lister_core::config::{DEFAULT_PASSWORD, DEFAULT_PORT, DEFAULT_SERVER, DEFAULT_USER};
use std::ffi::OsString;

/// Long options that may also be spelled with a single dash (`-server=db1`)
const LONG_FLAGS: &[&str] = &[
    "debug", "password", "port", "server", "user", "verbose", "quiet", "help", "version",
];

/// Long options that consume the following argument when written without `=`
const VALUE_FLAGS: &[&str] = &["password", "port", "server", "user"];

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "schema-lister")]
#[command(about = "Print every schema on a SQL Server instance")]
#[command(version)]
#[command(long_about = "
Schema Lister - connects to SQL Server and prints the name of every schema
returned by `SELECT name FROM sys.schemas`, one per line, in server order.

Options accept one or two leading dashes: -server=db1 and --server db1 are
equivalent.

SECURITY:
- With -debug the password is printed to standard output
- Logs on standard error never contain the password

EXAMPLES:
  schema-lister
  schema-lister -server=db1 -user=alice -password=secret -port=5555
  schema-lister -debug -server=localhost
")]
pub struct Cli {
    /// Print the configuration and connection descriptor before connecting
    #[arg(
        long,
        env = "SCHEMA_LISTER_DEBUG",
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        action = ArgAction::Set
    )]
    pub debug: bool,

    /// Database password
    #[arg(
        long,
        env = "MSSQL_PASSWORD",
        default_value = DEFAULT_PASSWORD,
        allow_hyphen_values = true,
        hide_default_value = true,
        hide_env_values = true
    )]
    pub password: String,

    /// Database port
    #[arg(
        long,
        env = "MSSQL_PORT",
        default_value_t = DEFAULT_PORT,
        allow_negative_numbers = true
    )]
    pub port: i64,

    /// Database server host
    #[arg(
        long,
        env = "MSSQL_SERVER",
        default_value = DEFAULT_SERVER,
        allow_hyphen_values = true
    )]
    pub server: String,

    /// Database user
    #[arg(
        long,
        env = "MSSQL_USER",
        default_value = DEFAULT_USER,
        allow_hyphen_values = true
    )]
    pub user: String,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Logging flags
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase log verbosity on stderr (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress logs
    #[arg(short, long, help = "Suppress all logs except errors")]
    pub quiet: bool,
}

impl Cli {
    /// Parses the process arguments, accepting single-dash long options
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_single_dash_flags(std::env::args_os()))
    }

    /// Parses `args` (program name first), accepting single-dash long options
    ///
    /// # Errors
    /// Returns clap's error for unknown flags or unparsable values
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_single_dash_flags(args))
    }

    /// Immutable run configuration built from the parsed flags
    pub fn configuration(&self) -> Configuration {
        Configuration::default()
            .with_server(self.server.clone())
            .with_port(self.port)
            .with_user(self.user.clone())
            .with_password(self.password.clone())
            .with_debug(self.debug)
    }
}

/// Rewrites `-name` / `-name=value` to `--name` / `--name=value` for known
/// long options.
///
/// Short flags (`-v`, `-vv`), negative numbers and everything after `--`
/// pass through unchanged, as does the value following `-password`,
/// `-port`, `-server` or `-user` written without `=`.
pub fn normalize_single_dash_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    let mut pending_value = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            if pending_value {
                pending_value = false;
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            let Some(rest) = text.strip_prefix('-') else {
                return arg;
            };
            let doubled = rest.starts_with('-');
            let rest = rest.strip_prefix('-').unwrap_or(rest);
            let (name, inline_value) = rest
                .split_once('=')
                .map_or((rest, false), |(name, _)| (name, true));
            if !LONG_FLAGS.contains(&name) {
                return arg;
            }
            pending_value = !inline_value && VALUE_FLAGS.contains(&name);
            if doubled {
                arg
            } else {
                OsString::from(format!("-{text}"))
            }
        })
        .collect()
}
