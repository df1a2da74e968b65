//! Logging configuration snapshot and its command-line flags

use super::error::{LoggerError, Result};
use super::log_level::Level;
use crate::sinks::{RotationPolicy, STDERR_PATH, STDOUT_PATH};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OUTPUT_PATH: &str = STDOUT_PATH;
pub const DEFAULT_ERROR_OUTPUT_PATH: &str = STDERR_PATH;
pub const DEFAULT_OUTPUT_LEVEL: Level = Level::Info;
pub const DEFAULT_STACK_TRACE_LEVEL: Level = Level::None;
/// Megabytes
pub const DEFAULT_ROTATION_MAX_SIZE: u64 = 100;
/// Days
pub const DEFAULT_ROTATION_MAX_AGE: u64 = 30;
pub const DEFAULT_ROTATION_MAX_BACKUPS: usize = 1000;

pub const FLAG_OUTPUT_PATH: &str = "log_path";
pub const FLAG_ROTATE_OUTPUT_PATH: &str = "log_rotate_path";
pub const FLAG_ROTATION_MAX_AGE: &str = "log_rotate_max_age";
pub const FLAG_ROTATION_MAX_SIZE: &str = "log_rotate_max_size";
pub const FLAG_ROTATION_MAX_BACKUPS: &str = "log_rotate_max_backups";
pub const FLAG_ROTATION_COMPRESS: &str = "log_rotate_compress";
pub const FLAG_JSON_ENCODING: &str = "log_as_json";
pub const FLAG_OUTPUT_LEVEL: &str = "log_output_level";
pub const FLAG_STACK_TRACE_LEVEL: &str = "log_stacktrace_level";
pub const FLAG_LOG_CALLER: &str = "log_caller";

/// Everything [`Registry::configure`](super::Registry::configure) needs.
///
/// Level fields hold names and are only validated when the options are
/// applied, so a bad flag value surfaces as a configuration error rather
/// than a parse-time panic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Where log lines go; `stdout` and `stderr` select the standard streams.
    pub output_path: String,

    /// Where the logger reports its own write failures.
    pub error_output_path: String,

    /// Optional rotating file receiving the same lines as `output_path`.
    pub rotate_output_path: String,

    /// Size in megabytes past which the rotating file is rotated.
    pub rotation_max_size: u64,

    /// Days to keep rotated backups; 0 keeps them regardless of age.
    pub rotation_max_age: u64,

    /// Number of rotated backups to keep; 0 keeps all of them.
    pub rotation_max_backups: usize,

    /// Gzip rotated backups.
    pub rotation_compress: bool,

    /// Encode lines as JSON instead of tab separated console text.
    pub json_encoding: bool,

    /// Name of the minimum level that is written.
    pub output_level: String,

    /// Name of the minimum level that captures a stack trace.
    pub stack_trace_level: String,

    /// Annotate lines with the calling file and line.
    pub log_caller: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            error_output_path: DEFAULT_ERROR_OUTPUT_PATH.to_string(),
            rotate_output_path: String::new(),
            rotation_max_size: DEFAULT_ROTATION_MAX_SIZE,
            rotation_max_age: DEFAULT_ROTATION_MAX_AGE,
            rotation_max_backups: DEFAULT_ROTATION_MAX_BACKUPS,
            rotation_compress: false,
            json_encoding: false,
            output_level: DEFAULT_OUTPUT_LEVEL.to_string(),
            stack_trace_level: DEFAULT_STACK_TRACE_LEVEL.to_string(),
            log_caller: false,
        }
    }
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_output_path(mut self, path: impl Into<String>) -> Self {
        self.output_path = path.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_error_output_path(mut self, path: impl Into<String>) -> Self {
        self.error_output_path = path.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_rotate_output_path(mut self, path: impl Into<String>) -> Self {
        self.rotate_output_path = path.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_json_encoding(mut self, json: bool) -> Self {
        self.json_encoding = json;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_output_level(mut self, level: impl Into<String>) -> Self {
        self.output_level = level.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_stack_trace_level(mut self, level: impl Into<String>) -> Self {
        self.stack_trace_level = level.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_log_caller(mut self, log_caller: bool) -> Self {
        self.log_caller = log_caller;
        self
    }

    /// Parse the output level name.
    pub fn parsed_output_level(&self) -> Result<Level> {
        Level::parse_named("output level", &self.output_level)
    }

    /// Parse the stack trace level name; an empty name means "leave unchanged".
    pub fn parsed_stack_trace_level(&self) -> Result<Option<Level>> {
        if self.stack_trace_level.is_empty() {
            return Ok(None);
        }
        Level::parse_named("stack trace level", &self.stack_trace_level).map(Some)
    }

    /// Rotation limits for the rotating output.
    pub fn rotation_policy(&self) -> RotationPolicy {
        let max_size = if self.rotation_max_size == 0 {
            DEFAULT_ROTATION_MAX_SIZE
        } else {
            self.rotation_max_size
        };
        RotationPolicy::new()
            .with_max_size_mb(max_size)
            .with_max_age_days(self.rotation_max_age)
            .with_max_backups(self.rotation_max_backups)
            .with_compression(self.rotation_compress)
    }

    /// Register one flag per field on `cmd`, using the current values as the
    /// flag defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Command;
    /// use scoped_log::Options;
    ///
    /// let mut options = Options::default();
    /// let cmd = options.bind_flags(Command::new("server"));
    /// let matches = cmd.get_matches_from(["server", "--log_output_level", "debug", "--log_caller"]);
    /// options.update_from_matches(&matches).unwrap();
    ///
    /// assert_eq!(options.output_level, "debug");
    /// assert!(options.log_caller);
    /// ```
    pub fn bind_flags(&self, cmd: Command) -> Command {
        let levels = Level::names();
        cmd.arg(
            Arg::new(FLAG_OUTPUT_PATH)
                .long(FLAG_OUTPUT_PATH)
                .value_name("PATH")
                .default_value(self.output_path.clone())
                .help(
                    "The file path where to output the log. This can be any path as well as \
                     the special values stdout and stderr",
                ),
        )
        .arg(
            Arg::new(FLAG_ROTATE_OUTPUT_PATH)
                .long(FLAG_ROTATE_OUTPUT_PATH)
                .value_name("PATH")
                .default_value(self.rotate_output_path.clone())
                .help("The file path for the optional rotating log file"),
        )
        .arg(
            Arg::new(FLAG_ROTATION_MAX_AGE)
                .long(FLAG_ROTATION_MAX_AGE)
                .value_name("DAYS")
                .value_parser(clap::value_parser!(u64))
                .default_value(self.rotation_max_age.to_string())
                .help(
                    "The maximum age in days of a log file beyond which the file is rotated \
                     (0 indicates no limit)",
                ),
        )
        .arg(
            Arg::new(FLAG_ROTATION_MAX_SIZE)
                .long(FLAG_ROTATION_MAX_SIZE)
                .value_name("MB")
                .value_parser(clap::value_parser!(u64))
                .default_value(self.rotation_max_size.to_string())
                .help("The maximum size in megabytes of a log file beyond which the file is rotated"),
        )
        .arg(
            Arg::new(FLAG_ROTATION_MAX_BACKUPS)
                .long(FLAG_ROTATION_MAX_BACKUPS)
                .value_name("COUNT")
                .value_parser(clap::value_parser!(usize))
                .default_value(self.rotation_max_backups.to_string())
                .help(
                    "The maximum number of log file backups to keep before older files are \
                     deleted (0 indicates no limit)",
                ),
        )
        .arg(bool_flag(
            FLAG_ROTATION_COMPRESS,
            self.rotation_compress,
            "Whether to gzip rotated log file backups",
        ))
        .arg(bool_flag(
            FLAG_JSON_ENCODING,
            self.json_encoding,
            "Whether to format output as JSON or in plain console-friendly format",
        ))
        .arg(
            Arg::new(FLAG_OUTPUT_LEVEL)
                .long(FLAG_OUTPUT_LEVEL)
                .value_name("LEVEL")
                .default_value(self.output_level.clone())
                .help(format!(
                    "The minimum logging level of messages to output, can be one of [{}]",
                    levels
                )),
        )
        .arg(
            Arg::new(FLAG_STACK_TRACE_LEVEL)
                .long(FLAG_STACK_TRACE_LEVEL)
                .value_name("LEVEL")
                .default_value(self.stack_trace_level.clone())
                .help(format!(
                    "The minimum logging level at which stack traces are captured, can be one of [{}]",
                    levels
                )),
        )
        .arg(bool_flag(
            FLAG_LOG_CALLER,
            self.log_caller,
            "Whether to log the caller of a logging function or not",
        ))
    }

    /// Copy parsed flag values into `self`.
    ///
    /// # Errors
    ///
    /// Fails if `matches` was not produced by a command prepared with
    /// [`Options::bind_flags`].
    pub fn update_from_matches(&mut self, matches: &ArgMatches) -> Result<()> {
        if let Some(v) = flag_value::<String>(matches, FLAG_OUTPUT_PATH)? {
            self.output_path = v;
        }
        if let Some(v) = flag_value::<String>(matches, FLAG_ROTATE_OUTPUT_PATH)? {
            self.rotate_output_path = v;
        }
        if let Some(v) = flag_value::<u64>(matches, FLAG_ROTATION_MAX_AGE)? {
            self.rotation_max_age = v;
        }
        if let Some(v) = flag_value::<u64>(matches, FLAG_ROTATION_MAX_SIZE)? {
            self.rotation_max_size = v;
        }
        if let Some(v) = flag_value::<usize>(matches, FLAG_ROTATION_MAX_BACKUPS)? {
            self.rotation_max_backups = v;
        }
        if let Some(v) = flag_value::<bool>(matches, FLAG_ROTATION_COMPRESS)? {
            self.rotation_compress = v;
        }
        if let Some(v) = flag_value::<bool>(matches, FLAG_JSON_ENCODING)? {
            self.json_encoding = v;
        }
        if let Some(v) = flag_value::<String>(matches, FLAG_OUTPUT_LEVEL)? {
            self.output_level = v;
        }
        if let Some(v) = flag_value::<String>(matches, FLAG_STACK_TRACE_LEVEL)? {
            self.stack_trace_level = v;
        }
        if let Some(v) = flag_value::<bool>(matches, FLAG_LOG_CALLER)? {
            self.log_caller = v;
        }
        Ok(())
    }
}

/// `--flag`, `--flag=true` and `--flag=false` all work.
fn bool_flag(name: &'static str, default: bool, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("BOOL")
        .action(ArgAction::Set)
        .num_args(0..=1)
        .require_equals(true)
        .default_missing_value("true")
        .value_parser(clap::value_parser!(bool))
        .default_value(if default { "true" } else { "false" })
        .help(help)
}

fn flag_value<T>(matches: &ArgMatches, id: &str) -> Result<Option<T>>
where
    T: Clone + Send + Sync + 'static,
{
    matches
        .try_get_one::<T>(id)
        .map(|v| v.cloned())
        .map_err(|e| LoggerError::config("flags", format!("flag '{}': {}", id, e)))
}
