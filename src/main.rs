mod cli;

use crate::cli::{Cli, Command, RootsCommand};
use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use renamarr_cache::{Database, Repository};
use renamarr_config::Config;
use renamarr_library::{Context, RenameFilesTask, RenameStatus, classify, preview};
use renamarr_naming::Pattern;
use renamarr_storage::StorageRoots;
use renamarr_storage::fs::LocalFilesystem;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Turns an error tree into a report, keeping every frame and location.
fn diagnose<E>(err: exn::Exn<E>) -> miette::Report
where
    E: std::error::Error + Send + Sync + 'static,
{
    miette!("{err:?}")
}

fn print(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

async fn load_pattern(repo: &Repository, id: Option<i64>) -> Result<Pattern> {
    let pattern = match id {
        Some(id) => repo.get_pattern(id).await.map_err(diagnose)?.ok_or_else(|| miette!("naming pattern {id} not found"))?,
        None => repo.active_pattern().await.map_err(diagnose)?.ok_or_else(|| miette!("no active naming pattern"))?,
    };
    debug!(id = pattern.id, name = %pattern.name, "using naming pattern");
    Ok(Pattern::new(pattern.pattern))
}

async fn load_roots(repo: &Repository) -> Result<StorageRoots> {
    StorageRoots::new(repo.list_storage_roots().await.map_err(diagnose)?).map_err(diagnose)
}

async fn run(command: Command, repo: &Repository, ctx: &Context) -> Result<()> {
    match command {
        Command::Roots { command: RootsCommand::List } => print(&repo.list_storage_roots().await.map_err(diagnose)?),
        Command::Roots { command: RootsCommand::Add { name, path } } => {
            print(&repo.insert_storage_root(name, path).await.map_err(diagnose)?)
        },
        Command::Patterns => {
            for pattern in repo.list_active_patterns().await.map_err(diagnose)? {
                let marker = if pattern.is_default { "*" } else { "" };
                println!("{}{marker}\t{}\t{}", pattern.id, pattern.name, pattern.pattern);
            }
            Ok(())
        },
        Command::Preview { pattern, files } => {
            let pattern = load_pattern(repo, Some(pattern)).await?;
            let roots = load_roots(repo).await?;
            let files = repo.files_by_ids(&files).await.map_err(diagnose)?;
            print(&preview(&pattern, &files, &roots, &ctx.defaults))
        },
        Command::Analyze { pattern, file } => {
            let pattern = load_pattern(repo, pattern).await?;
            let roots = load_roots(repo).await?;
            let item = repo
                .files_by_ids(&[file])
                .await
                .map_err(diagnose)?
                .into_iter()
                .next()
                .ok_or_else(|| miette!("media file {file} not found"))?;
            print(&classify(&item.track, &pattern, &item.file, &roots, &ctx.defaults))
        },
        Command::Rename { pattern, into, files } => {
            let mut task = RenameFilesTask::new(pattern, files);
            if let Some(directory) = into {
                task = task.into_directory(directory);
            }
            let report = task.run(repo, ctx).await.map_err(diagnose)?;
            eprintln!("{report}");
            print(&report)
        },
        Command::Refresh { track, file, dry_run } => {
            let repo = repo.clone().dry_run(dry_run);
            let status = RenameStatus::new(&repo, ctx);
            let updated = match (track, file) {
                (Some(track), _) => status.refresh_track(track).await,
                (None, Some(file)) => status.refresh_file(file).await.map(u64::from),
                (None, None) => status.refresh_all().await,
            }
            .map_err(diagnose)?;
            let counts = status.counts().await.map_err(diagnose)?;
            print(&serde_json::json!({ "updated": updated, "counts": counts }))
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let directive = if cli.verbose { "renamarr=debug" } else { "renamarr=info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(directive.parse::<Directive>().into_diagnostic()?))
        .init();

    let config = Config::load(cli.config.as_deref()).map_err(diagnose)?;
    let db = Database::connect(&config.library.database).await.map_err(diagnose)?;
    let repo = Repository::from(&db);
    let ctx = Context::new(Arc::new(LocalFilesystem))
        .with_defaults(config.naming.defaults())
        .with_sidecar_extension(config.naming.sidecar_extension.clone())
        .with_page_size(config.library.page_size);

    let result = run(cli.command, &repo, &ctx).await;
    db.close().await;
    result
}
