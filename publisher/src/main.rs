//! Package publisher CLI entrypoint.
//!
//! This binary builds signed repository archives for the configured
//! platforms and pushes repository metadata updates to YUM and APT hosts.

use camino::Utf8PathBuf;
use clap::Parser;
use pkg_publisher::archive::{ArchiveBuilder, ArchiveRequest, ArchiveServices, SignedArchiver};
use pkg_publisher::cli::{AptArgs, Cli, Command, ResolvedTarget, UpdateRepoArgs, YumArgs};
use pkg_publisher::config::{BuildDefaults, BuildSettings, EnvOverrides};
use pkg_publisher::error::{PublishError, Result};
use pkg_publisher::exec::ShellExecutor;
use pkg_publisher::fanout::RepoFanout;
use pkg_publisher::output::{dry_run_message, fanout_summary, report_outcome, write_stderr_line};
use pkg_publisher::probe::GlobProbe;
use pkg_publisher::publish::RepoPublisher;
use pkg_publisher::remote::{DryRunRemote, SshExecutor};
use pkg_publisher::signing::ConfiguredSigningKey;
use pkg_publisher::tool::PathToolLocator;
use pkg_publisher::version::VersioningMode;
use std::io::Write;
use std::time::Duration;

struct RunContext<'a> {
    cli: &'a Cli,
    defaults: &'a BuildDefaults,
    settings: &'a BuildSettings,
}

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    // Environment overrides are captured once for the whole invocation.
    let overrides = EnvOverrides::from_env();
    let defaults = BuildDefaults::load(&cli.config)?.with_overrides(&overrides);
    let settings = BuildSettings::resolve(&defaults, &overrides);

    let context = RunContext {
        cli,
        defaults: &defaults,
        settings: &settings,
    };

    match &cli.command {
        Command::Archive(args) => {
            let request =
                ArchiveRequest::new(args.source.clone(), args.target.clone(), args.versioning);
            build_archive(&context, &request, stderr)
        }
        Command::ArchiveAll(args) => build_all_archives(&context, args.versioning, stderr),
        Command::UpdateYum(args) => update_yum(&context, args, stderr),
        Command::UpdateApt(args) => update_apt(&context, args, stderr),
        Command::UpdateRepo(args) => update_repo(&context, args, stderr),
    }
}

/// Resolves the directory archives are built relative to.
fn base_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|e| {
        PublishError::Io(std::io::Error::other(format!(
            "current directory is not valid UTF-8: {e}"
        )))
    })
}

fn services(defaults: &BuildDefaults) -> ArchiveServices<'_> {
    ArchiveServices {
        locator: &PathToolLocator,
        versions: defaults,
        probe: &GlobProbe,
        executor: &ShellExecutor,
    }
}

/// Builds one archive and reports it.
fn build_archive(
    context: &RunContext<'_>,
    request: &ArchiveRequest,
    stderr: &mut dyn Write,
) -> Result<()> {
    let builder = ArchiveBuilder::new(base_dir()?, context.settings, services(context.defaults));
    let outcome = builder.create_signed_archive(request)?;
    report_outcome(stderr, &outcome, context.cli.quiet);
    Ok(())
}

/// Builds an archive for every configured platform.
fn build_all_archives(
    context: &RunContext<'_>,
    versioning: VersioningMode,
    stderr: &mut dyn Write,
) -> Result<()> {
    let project = &context.defaults.project;
    if !context.cli.quiet {
        write_stderr_line(
            stderr,
            format!(
                "Archiving {} platform(s) for {project} by {versioning}...",
                context.defaults.platform_repos.len()
            ),
        );
    }

    let builder = ArchiveBuilder::new(base_dir()?, context.settings, services(context.defaults));
    let outcomes =
        RepoFanout::new(&builder, context.defaults).create_all_archives(project, versioning)?;

    for outcome in &outcomes {
        report_outcome(stderr, outcome, context.cli.quiet);
    }
    if !context.cli.quiet {
        write_stderr_line(stderr, fanout_summary(&outcomes, project));
    }
    Ok(())
}

/// Runs `action` against either the ssh executor or a dry-run recorder.
fn with_remote(
    context: &RunContext<'_>,
    dry_run: bool,
    stderr: &mut dyn Write,
    action: impl FnOnce(&RepoPublisher<'_>) -> Result<String>,
) -> Result<()> {
    let signing = ConfiguredSigningKey::new(context.defaults.gpg_key.clone());

    if dry_run {
        let remote = DryRunRemote::new();
        action(&RepoPublisher::new(&signing, &remote, context.defaults))?;
        for call in remote.calls() {
            write_stderr_line(stderr, dry_run_message(&call.host, &call.command));
        }
        return Ok(());
    }

    let remote = SshExecutor::default()
        .with_timeout(context.defaults.remote_timeout_secs.map(Duration::from_secs));
    let command = action(&RepoPublisher::new(&signing, &remote, context.defaults))?;
    if !context.cli.quiet {
        write_stderr_line(stderr, format!("Ran: {command}"));
    }
    Ok(())
}

fn update_yum(context: &RunContext<'_>, args: &YumArgs, stderr: &mut dyn Write) -> Result<()> {
    let target = ResolvedTarget::merge(
        &args.repo,
        None,
        args.command.as_ref(),
        context.defaults.yum.as_ref(),
    );
    with_remote(context, args.repo.dry_run, stderr, |publisher| {
        publisher.update_yum_repo(
            target.repo_name.as_deref(),
            target.repo_path.as_deref(),
            target.repo_host.as_deref(),
            target.command.as_deref(),
        )
    })
}

fn update_apt(context: &RunContext<'_>, args: &AptArgs, stderr: &mut dyn Write) -> Result<()> {
    let target = ResolvedTarget::merge(
        &args.repo,
        args.repo_url.as_ref(),
        args.command.as_ref(),
        context.defaults.apt.as_ref(),
    );
    with_remote(context, args.repo.dry_run, stderr, |publisher| {
        publisher.update_apt_repo(
            target.repo_name.as_deref(),
            target.repo_path.as_deref(),
            target.repo_host.as_deref(),
            target.repo_url.as_deref(),
            target.command.as_deref(),
        )
    })
}

fn update_repo(
    context: &RunContext<'_>,
    args: &UpdateRepoArgs,
    stderr: &mut dyn Write,
) -> Result<()> {
    let target = ResolvedTarget::merge(&args.repo, args.repo_url.as_ref(), None, None);
    with_remote(context, args.repo.dry_run, stderr, |publisher| {
        publisher.update_repo(&args.host, &args.command, &target.params())
    })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
