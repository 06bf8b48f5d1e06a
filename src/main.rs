//! Mergelens - live merge preview for git branches

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use mergelens::config::Config;
use mergelens::git::{self, BranchManager, BranchRef};
use mergelens::preview::{DialogHost, GitBackend, MergePreviewResult, SelectionController};

/// Live merge preview for git branches
#[derive(Parser)]
#[command(name = "mergelens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Repository to inspect (defaults to the current directory)
    #[arg(long)]
    repo: Option<PathBuf>,

    /// Candidate branch to preview (overrides the default selection)
    #[arg(long)]
    branch: Option<String>,

    /// Execute the merge when the preview allows it
    #[arg(long)]
    merge: bool,

    /// List the branches the selector would offer, then exit
    #[arg(long)]
    list: bool,
}

/// Host for the one-shot CLI flow; dismissal is just a log line
#[derive(Debug, Default, Clone, Copy)]
struct CliHost;

impl DialogHost for CliHost {
    fn close_dialog(&self) {
        tracing::debug!("Merge submitted, dismissing preview");
    }
}

fn init_logging() {
    // Log to /tmp/mergelens.log - tail with: tail -f /tmp/mergelens.log
    // Set DEBUG=0-3 to control verbosity (0=off, 1=warn, 2=info, 3=debug)
    let debug_level = std::env::var("DEBUG")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(0);

    if debug_level > 0 {
        let level = match debug_level {
            1 => tracing::Level::WARN,
            2 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        };

        let file_appender = tracing_appender::rolling::never("/tmp", "mergelens.log");
        tracing_subscriber::fmt()
            .with_writer(file_appender)
            .with_max_level(level)
            .with_ansi(false)
            .init();
    }
}

fn describe(branch: &BranchRef) -> String {
    match &branch.remote {
        Some(remote) => format!("{remote}/{}", branch.name),
        None => branch.name.clone(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let repo_path = match cli.repo {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    // All libgit2 access happens up front; the handle is not carried across
    // suspension points.
    let (branches, current, default) = {
        let repo = git::open_repository(&repo_path)?;
        let manager = BranchManager::new(&repo);
        (
            manager.list_for_selector()?,
            manager.current()?,
            manager.default_branch()?,
        )
    };

    if cli.list {
        for branch in &branches {
            println!("{}", describe(branch));
        }
        return Ok(());
    }

    let override_branch = cli
        .branch
        .as_deref()
        .map(|name| {
            branches
                .iter()
                .find(|b| b.name == name)
                .cloned()
                .with_context(|| format!("Branch not found: {name}"))
        })
        .transpose()?;

    let selection =
        SelectionController::initial_selection(current.as_ref(), default.as_ref(), override_branch);
    let Some(selection) = selection else {
        println!("Nothing to preview: no candidate branch selected.");
        return Ok(());
    };

    let config = Config::load()?;
    let backend = Arc::new(GitBackend::new(repo_path, &config));
    let controller = SelectionController::new(backend, Arc::new(CliHost), current.clone(), &config);

    println!(
        "Previewing merge of '{}' into '{}'",
        describe(&selection),
        current.as_ref().map_or("(detached HEAD)", |b| b.name.as_str()),
    );

    if let Some(handle) = controller.on_selection_changed(Some(selection)) {
        handle.finished().await;
    }

    let state = controller.state();
    match state.merge_result {
        Some(MergePreviewResult::Clean { commit_count }) => {
            let count = commit_count.unwrap_or(0);
            println!("Merge would be clean, introducing {count} commit(s).");
        }
        Some(MergePreviewResult::Conflicted {
            commit_count,
            conflicted_files,
        }) => {
            let count = commit_count.unwrap_or(0);
            println!(
                "Merge would conflict in {conflicted_files} file(s), introducing {count} commit(s)."
            );
        }
        Some(MergePreviewResult::Unknown) => {
            println!("Merge outcome could not be determined.");
        }
        Some(MergePreviewResult::Loading) | None => {
            let count = state.commit_count.unwrap_or(0);
            println!("Merge would introduce {count} commit(s).");
        }
    }

    if cli.merge {
        if controller.can_submit_merge() {
            controller.submit_merge().await?;
            println!("Merged.");
        } else {
            println!("Merge is disabled for this selection.");
        }
    }

    Ok(())
}
