//! termprobe CLI: end-to-end tests for terminal applications.
//!
//! Runs the registered test cases against a subject program driven through
//! tmux or a PTY, and reports which ones passed.

// CLI-specific lint allowances (CLI binary, not library)
#![allow(missing_docs)]
#![allow(clippy::print_stdout)] // CLI must print to stdout
#![allow(clippy::print_stderr)] // CLI must print to stderr
#![allow(clippy::exit)] // CLI uses exit codes

use clap::builder::FalseyValueParser;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use miette::{IntoDiagnostic, Result};
use std::io;
use std::path::{Path, PathBuf};
use termprobe::{
    BackendKind, CaseStatus, HarnessConfig, NoopProgress, Registry, RunSummary, Runner,
};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

mod progress;

/// Color output mode
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and `NO_COLOR` env
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BackendArg {
    Auto,
    Tmux,
    Pty,
}

impl From<BackendArg> for BackendKind {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Auto => Self::Auto,
            BackendArg::Tmux => Self::Tmux,
            BackendArg::Pty => Self::Pty,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "termprobe",
    version,
    about = "End-to-end tests for terminal applications"
)]
struct Cli {
    /// Control color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    color: ColorMode,

    /// Log every key and backend command
    #[arg(
        long,
        global = true,
        env = "TERMPROBE_DEBUG",
        value_parser = FalseyValueParser::new()
    )]
    debug: bool,

    /// Harness config file (YAML, or JSON with a .json extension)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the test suite against a subject
    Run(RunArgs),
    /// List the registered test cases
    List {
        #[arg(long, help = "Output as JSON")]
        json: bool,
        #[arg(long, help = "Also register the YAML scenarios in this directory")]
        scenarios_dir: Option<PathBuf>,
    },
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        #[arg(value_enum, help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    #[arg(long, env = "TERMPROBE_SUBJECT", help = "Path to the subject executable")]
    subject: Option<PathBuf>,
    #[arg(long, value_enum, env = "TERMPROBE_BACKEND")]
    backend: Option<BackendArg>,
    #[arg(long, env = "TERMPROBE_KEY_DELAY_MS", help = "Delay after each key")]
    key_delay_ms: Option<u64>,
    #[arg(long, help = "Delay between characters of non-atomic text")]
    char_delay_ms: Option<u64>,
    #[arg(
        long,
        env = "TERMPROBE_OPERATION_DELAY_MS",
        help = "Delay after the last key of a case"
    )]
    operation_delay_ms: Option<u64>,
    #[arg(
        long,
        env = "TERMPROBE_CLOSE_DELAY_MS",
        help = "Delay after asking the subject to quit"
    )]
    close_delay_ms: Option<u64>,
    #[arg(long, help = "Bound on waiting for the subject to come up")]
    launch_timeout_ms: Option<u64>,
    #[arg(
        long,
        env = "TERMPROBE_ONLY",
        value_delimiter = ',',
        help = "Run only these cases (comma separated)"
    )]
    only: Vec<String>,
    #[arg(long, help = "Also register the YAML scenarios in this directory")]
    scenarios_dir: Option<PathBuf>,
    #[arg(long, help = "Keep running after a failed case")]
    keep_going: bool,
    #[arg(long, help = "Print the run summary as JSON")]
    json: bool,
    #[arg(long, help = "Show a progress line per case on stderr")]
    verbose: bool,
}

/// Configure color output based on CLI flag and environment
fn configure_colors(mode: ColorMode) {
    let use_color = match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            if std::env::var("NO_COLOR").is_ok() {
                false
            } else {
                supports_color::on(supports_color::Stream::Stderr).is_some()
            }
        }
    };

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .color(use_color)
                .unicode(use_color)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set
}

/// Install the log subscriber. `RUST_LOG` wins over `--debug`.
///
/// Logs go to stdout, except when stdout carries JSON.
fn init_tracing(debug: bool, json_output: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let writer = if json_output {
        BoxMakeWriter::new(io::stderr)
    } else {
        BoxMakeWriter::new(io::stdout)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_colors(cli.color);
    match cli.command {
        Commands::Run(args) => {
            init_tracing(cli.debug, args.json);
            cmd_run(cli.config.as_deref(), args)
        }
        Commands::List {
            json,
            scenarios_dir,
        } => cmd_list(cli.config.as_deref(), json, scenarios_dir),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

// =============================================================================
// Command Handlers
// =============================================================================

/// Handle the run command.
fn cmd_run(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let (json, verbose) = (args.json, args.verbose);
    let config = build_config(config_path, args)?;
    tracing::debug!(?config, "resolved harness config");
    let registry = build_registry(config.scenarios_dir.as_deref())?;
    let runner = Runner::new(config, registry);

    let summary = if verbose {
        runner.run(&progress::VerboseProgress::new())?
    } else {
        runner.run(&NoopProgress)?
    };

    if json {
        let payload = serde_json::to_string(&summary).into_diagnostic()?;
        println!("{payload}");
    } else {
        print_summary(&summary);
    }
    if !summary.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Handle the list command.
fn cmd_list(config_path: Option<&Path>, json: bool, scenarios_dir: Option<PathBuf>) -> Result<()> {
    let from_config = match config_path {
        Some(path) => HarnessConfig::load(path)?.scenarios_dir,
        None => None,
    };
    let registry = build_registry(scenarios_dir.or(from_config).as_deref())?;
    let names = registry.names();
    if json {
        let payload = serde_json::to_string(&names).into_diagnostic()?;
        println!("{payload}");
    } else {
        for name in names {
            println!("{name}");
        }
    }
    Ok(())
}

/// Handle the completions command.
fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Defaults, then the config file, then flags and environment variables.
fn build_config(config_path: Option<&Path>, args: RunArgs) -> Result<HarnessConfig> {
    let mut config = match config_path {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(subject) = args.subject {
        config.subject = subject;
    }
    if let Some(backend) = args.backend {
        config.backend = backend.into();
    }
    if let Some(ms) = args.key_delay_ms {
        config.delays.key_ms = ms;
    }
    if let Some(ms) = args.char_delay_ms {
        config.delays.char_ms = ms;
    }
    if let Some(ms) = args.operation_delay_ms {
        config.delays.operation_ms = ms;
    }
    if let Some(ms) = args.close_delay_ms {
        config.delays.close_ms = ms;
    }
    if let Some(ms) = args.launch_timeout_ms {
        config.launch_timeout_ms = ms;
    }
    if !args.only.is_empty() {
        config.only = args.only;
    }
    if args.scenarios_dir.is_some() {
        config.scenarios_dir = args.scenarios_dir;
    }
    if args.keep_going {
        config.stop_on_fail = false;
    }
    config.validate()?;
    Ok(config)
}

fn build_registry(scenarios_dir: Option<&Path>) -> Result<Registry> {
    let mut registry = Registry::builtin();
    if let Some(dir) = scenarios_dir {
        registry.load_dir(dir)?;
    }
    Ok(registry)
}

fn print_summary(summary: &RunSummary) {
    for case in &summary.cases {
        let status = match case.status {
            CaseStatus::Passed => "PASS",
            CaseStatus::Failed => "FAIL",
            CaseStatus::Errored => "ERROR",
        };
        match &case.error {
            Some(error) => println!("{status} {} ({}ms): {error}", case.name, case.duration_ms),
            None => println!("{status} {} ({}ms)", case.name, case.duration_ms),
        }
    }
    let skipped = summary.selected.saturating_sub(summary.executed);
    println!(
        "{}/{} passed on {} in {}ms{}",
        summary.passed,
        summary.executed,
        summary.backend,
        summary.duration_ms,
        if skipped > 0 {
            format!(", {skipped} skipped after a failure")
        } else {
            String::new()
        }
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["termprobe", "run"];
        full.extend_from_slice(argv);
        let Commands::Run(args) = Cli::try_parse_from(full).unwrap().command else {
            panic!("expected the run subcommand");
        };
        args
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let args = run_args(&[
            "--subject",
            "/usr/bin/fm",
            "--backend",
            "pty",
            "--key-delay-ms",
            "5",
            "--only",
            "copy,rename",
            "--keep-going",
        ]);
        let config = build_config(None, args).unwrap();
        assert_eq!(config.subject, PathBuf::from("/usr/bin/fm"));
        assert_eq!(config.backend, BackendKind::Pty);
        assert_eq!(config.delays.key_ms, 5);
        assert_eq!(config.only, vec!["copy", "rename"]);
        assert!(!config.stop_on_fail);
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("termprobe.yaml");
        std::fs::write(
            &path,
            "subject: /opt/from-file\ndelays:\n  close_ms: 7\n  key_ms: 9\n",
        )
        .unwrap();

        let config = build_config(Some(&path), run_args(&["--key-delay-ms", "1"])).unwrap();

        assert_eq!(config.subject, PathBuf::from("/opt/from-file"));
        assert_eq!(config.delays.close_ms, 7);
        assert_eq!(config.delays.key_ms, 1);
    }

    #[test]
    fn missing_subject_is_rejected() {
        let args = RunArgs {
            subject: None,
            ..run_args(&[])
        };
        let err = build_config(None, args).unwrap_err();
        assert!(err.to_string().contains("no subject"), "{err}");
    }
}
