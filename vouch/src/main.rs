// vouch/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{CheckpointCommands, Cli, Commands, SuiteCommands};

#[tokio::main]
async fn main() -> miette::Result<()> {
    // RUST_LOG=debug vouch run ... to see per-rule details
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // Render VouchError codes and help texts, unwrapped.
    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().wrap_lines(false).build())
    }))
    .into_diagnostic()?;

    let cli = Cli::parse();
    let project_dir = cli.project_dir;
    debug!(project_dir = %project_dir.display(), "Dispatching command");

    match cli.command {
        Commands::Suite { action } => match action {
            SuiteCommands::Create { name, overwrite } => commands::suite::create(&project_dir, &name, overwrite)?,
            SuiteCommands::Add {
                suite,
                rule,
                column,
                params,
                severity,
                tolerance,
                notes,
                source,
                discard_failed,
            } => {
                let args = commands::suite::AddArgs {
                    suite,
                    rule,
                    column,
                    params,
                    severity,
                    tolerance,
                    notes,
                    source,
                    discard_failed,
                };
                commands::suite::add(&project_dir, args).await?
            }
            SuiteCommands::Show { name } => commands::suite::show(&project_dir, &name)?,
            SuiteCommands::List => commands::suite::list(&project_dir)?,
        },
        Commands::Checkpoint { action } => match action {
            CheckpointCommands::Add {
                name,
                suite,
                run_name_template,
                notify_channel,
            } => commands::checkpoint::add(&project_dir, &name, &suite, run_name_template, notify_channel)?,
            CheckpointCommands::List => commands::checkpoint::list(&project_dir)?,
        },
        Commands::Run {
            checkpoint,
            source,
            suite,
            identifiers,
        } => commands::run::execute(&project_dir, &checkpoint, &source, suite, identifiers).await?,
        Commands::Profile { source, save } => commands::profile::execute(&project_dir, &source, save).await?,
        Commands::Docs => commands::docs::execute(&project_dir)?,
        Commands::Clean => commands::clean::execute(&project_dir)?,
    }

    Ok(())
}
