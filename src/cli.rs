//! Command-line flags for the `screenblank` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::logging::Verbosity;

/// screenblank - blank every display, toggle each one with a hotkey
///
/// Esc hides all overlays, CmdOrCtrl+Shift+B shows them again and
/// CmdOrCtrl+Shift+1..9 toggles the overlay on the Nth display from the left.
#[derive(Debug, Parser)]
#[command(name = "screenblank")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a custom configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// Write a default configuration file if none exists and exit
    #[arg(long)]
    pub init_config: bool,

    /// List connected displays in shortcut order and exit
    #[arg(long)]
    pub list_displays: bool,
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}

/// Where a fatal error is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSink {
    Stderr,
    /// No console to print to; a GUI launch on Windows.
    Dialog,
}

impl ErrorSink {
    pub fn new(has_console: bool) -> Self {
        if has_console {
            ErrorSink::Stderr
        } else {
            ErrorSink::Dialog
        }
    }

    /// Whether a clap outcome needs reporting here. `--help` and `--version`
    /// are not failures; without a console they are simply dropped.
    pub fn reports(&self, err: &clap::Error) -> bool {
        *self == ErrorSink::Dialog && err.use_stderr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        let cli = Cli::parse_from(["screenblank"]);
        assert_eq!(cli.verbosity(), Verbosity::Normal);

        let cli = Cli::parse_from(["screenblank", "-v"]);
        assert_eq!(cli.verbosity(), Verbosity::Verbose);

        let cli = Cli::parse_from(["screenblank", "-vv"]);
        assert_eq!(cli.verbosity(), Verbosity::Trace);

        let cli = Cli::parse_from(["screenblank", "-q"]);
        assert_eq!(cli.verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["screenblank", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_config_path_flag() {
        let cli = Cli::parse_from(["screenblank", "--config", "/tmp/blank.json", "--print-config"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/blank.json")));
        assert!(cli.print_config);
        assert!(!cli.list_displays);
    }

    #[test]
    fn test_errors_without_console_go_to_a_dialog() {
        assert_eq!(ErrorSink::new(true), ErrorSink::Stderr);
        assert_eq!(ErrorSink::new(false), ErrorSink::Dialog);

        let bad_flag = Cli::try_parse_from(["screenblank", "--bogus"]).unwrap_err();
        let help = Cli::try_parse_from(["screenblank", "--help"]).unwrap_err();

        assert!(ErrorSink::Dialog.reports(&bad_flag));
        assert!(!ErrorSink::Dialog.reports(&help));
        // clap prints it to stderr itself.
        assert!(!ErrorSink::Stderr.reports(&bad_flag));
    }
}
