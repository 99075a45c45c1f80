//! ddt setup CLI entrypoint.
//!
//! This binary installs the ddt toolset by adding its `bin` directory to the
//! user's shell profiles, verifies the result through a login shell, and
//! records the install location in the system configuration.

use camino::Utf8PathBuf;
use clap::Parser;
use ddt_common::{DEFAULT_FILENAME, SystemConfig};
use ddt_setup::backup::BackupPolicy;
use ddt_setup::cli::{Cli, Command, PathArgs};
use ddt_setup::dirs::{BaseDirs, SystemBaseDirs};
use ddt_setup::error::{Result, SetupError};
use ddt_setup::exec::{CommandExecutor, SystemCommandExecutor};
use ddt_setup::logging;
use ddt_setup::setup::{Setup, SetupOptions, TestOutcome, WorkflowReport};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.global.level_filter());
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &SystemBaseDirs, &SystemCommandExecutor, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Runs the selected subcommand. `Ok(false)` means the command completed but
/// did not succeed (a failed `test`).
fn run(
    cli: &Cli,
    dirs: &dyn BaseDirs,
    executor: &dyn CommandExecutor,
    stderr: &mut dyn Write,
) -> Result<bool> {
    let mut setup = build_setup(cli, dirs)?;

    match &cli.command {
        Command::Install(args) => {
            let report = setup.install(&target_path(args)?)?;
            report_workflow(stderr, "Installed", &report);
            Ok(true)
        }
        Command::Uninstall(args) => {
            let report = setup.uninstall(&target_path(args)?)?;
            report_workflow(stderr, "Uninstalled", &report);
            Ok(true)
        }
        Command::Test => {
            let outcome = setup.test(executor);
            report_test(stderr, &outcome);
            Ok(outcome.passed())
        }
        Command::SetPath(args) => {
            setup.set_path(&args.path)?;
            write_stderr_line(stderr, format!("Tools path set to {}", args.path));
            Ok(true)
        }
    }
}

fn build_setup(cli: &Cli, dirs: &dyn BaseDirs) -> Result<Setup> {
    let home = dirs.home_dir().ok_or(SetupError::HomeDirectoryUnavailable)?;
    let config_path = cli
        .global
        .config
        .clone()
        .unwrap_or_else(|| home.join(DEFAULT_FILENAME));
    let config = SystemConfig::load(config_path)?;
    let options = SetupOptions {
        launcher: cli.global.launcher.clone(),
        backup: BackupPolicy {
            max_backups: cli.global.max_backups,
        },
    };
    Ok(Setup::new(config, home, options))
}

fn target_path(args: &PathArgs) -> Result<Utf8PathBuf> {
    if let Some(path) = &args.path {
        return Ok(path.clone());
    }
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::from_path_buf(cwd).map_err(|path| SetupError::NonUtf8Path { path })
}

fn report_workflow(stderr: &mut dyn Write, verb: &str, report: &WorkflowReport) {
    write_stderr_line(
        stderr,
        format!(
            "{verb} {}: {} of {} shell file(s) updated for {}",
            report.root,
            report.changed_count(),
            report.edits.len(),
            report.segment
        ),
    );
}

fn report_test(stderr: &mut dyn Write, outcome: &TestOutcome) {
    let message = match outcome {
        TestOutcome::Passed => "The path was successfully installed, you might need to open a new terminal to see the effects".to_owned(),
        TestOutcome::NotConfigured => "No tools path is configured; run install or set-path first".to_owned(),
        TestOutcome::NotOnPath { segment } => {
            format!("{segment} is not on the login shell PATH")
        }
        TestOutcome::Failed { message } => {
            format!("The launcher could not be run from the shell path: {message}")
        }
    };
    write_stderr_line(stderr, message);
}

fn exit_code_for_run_result(result: Result<bool>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
