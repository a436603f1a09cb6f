use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use api_http::{
    ApiClient, ApiError, NO_TAGS_QUERY, Reconciler, SearchMode, TagAction, run_dedupe_scan,
    run_merge,
};
use engine::session::{MediaKind, Session};

#[derive(Debug, Parser)]
#[command(name = "curate")]
#[command(about = "Curation client for the video library backend", long_about = None)]
struct Cli {
    /// Base URL of the backend.
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List one directory of the source tree
    List {
        path: Option<String>,
    },
    /// Search files by tags
    SearchTags {
        /// Tag terms; empty together with --untagged finds files without tags
        query: Option<String>,
        /// Require all terms (and) or any term (or)
        #[arg(long, default_value = "and")]
        mode: String,
        /// Find files carrying no tags at all
        #[arg(long)]
        untagged: bool,
        /// Rebuild the tag index before searching
        #[arg(long)]
        refresh: bool,
    },
    /// Search files by name substring
    SearchNames {
        query: String,
    },
    /// Show the tag index with usage counts
    Tags {
        #[arg(long)]
        refresh: bool,
    },
    /// Add or remove a tag on one or more files
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Rename one source file
    Rename {
        relpath: String,
        new_name: String,
    },
    /// Delete one source file
    Delete {
        relpath: String,
    },
    /// Cut a source video into clips along marker timestamps
    Clips {
        relpath: String,
        /// Marker timestamps in seconds
        #[arg(required = true)]
        markers: Vec<f64>,
    },
    /// Find duplicate files under a directory
    Scan {
        /// Directory to scan; defaults to the whole tree
        dir: Option<String>,
        /// Show the scannable directories instead of scanning
        #[arg(long)]
        list_dirs: bool,
        /// Move found duplicates away after the scan
        #[arg(long)]
        move_duplicates: bool,
    },
    /// Merge the queued clips into one video
    Merge {
        #[arg(long, default_value = "android_small")]
        profile: String,
    },
    /// Inspect or edit the merge queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
}

#[derive(Debug, Subcommand)]
enum TagCommands {
    /// Add a tag to the given files
    Add {
        tag: String,
        #[arg(required = true)]
        relpaths: Vec<String>,
    },
    /// Remove a tag from the given files
    Remove {
        tag: String,
        #[arg(required = true)]
        relpaths: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum QueueCommands {
    /// Show the current queue order
    Show,
    /// Add a target clip to the queue
    Add {
        target_relpath: String,
        /// Insert at this slot instead of appending
        #[arg(long)]
        at: Option<usize>,
    },
    /// Remove one queue item by id
    Remove {
        id: i64,
    },
    /// Move one queue item to a new slot
    Move {
        id: i64,
        index: usize,
    },
    /// Empty the queue
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

/// Ctrl-C flips this token so poll loops can unwind cleanly.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    cancel
}

async fn run(cli: Cli) -> Result<(), ApiError> {
    let api = ApiClient::new(cli.base_url);
    let reconciler = Reconciler::new(api.clone());
    let mut session = Session::new();

    match cli.command {
        Commands::List { path } => {
            reconciler
                .load_listing(&mut session, path.as_deref().unwrap_or(""))
                .await?;
            let listing = session.listing();
            for folder in &listing.folders {
                println!("{}/", folder.relpath);
            }
            for video in &listing.videos {
                println!("{}", video.relpath);
            }
        }
        Commands::SearchTags {
            query,
            mode,
            untagged,
            refresh,
        } => {
            let query = if untagged {
                NO_TAGS_QUERY.to_string()
            } else {
                query.unwrap_or_default()
            };
            let mode = if mode.eq_ignore_ascii_case("or") {
                SearchMode::Or
            } else {
                SearchMode::And
            };
            let response = api.search_tags(&query, mode, refresh).await?;
            for row in &response.results {
                println!("{}", row.relpath);
            }
            println!("{} match(es)", response.count);
        }
        Commands::SearchNames { query } => {
            let response = api.search_names(&query).await?;
            for row in &response.results {
                println!("{}", row.relpath);
            }
            println!("{} match(es)", response.count);
        }
        Commands::Tags { refresh } => {
            let index = reconciler.tag_index(refresh).await?;
            if let Some(error) = &index.error {
                eprintln!("tag index error: {error}");
            }
            for entry in &index.tags {
                println!("{} ({})", entry.tag, entry.count);
            }
        }
        Commands::Tag { command } => {
            let (action, tag, relpaths) = match command {
                TagCommands::Add { tag, relpaths } => (TagAction::Add, tag, relpaths),
                TagCommands::Remove { tag, relpaths } => (TagAction::Remove, tag, relpaths),
            };
            if let [relpath] = relpaths.as_slice() {
                let response = reconciler
                    .edit_tag(&mut session, relpath, action, &tag)
                    .await?;
                if response.changed {
                    println!("renamed to {}", response.relpath);
                } else {
                    println!("unchanged");
                }
            } else {
                let report = reconciler
                    .edit_tag_bulk(&mut session, action, &tag, &relpaths)
                    .await;
                println!("{} changed, {} failed", report.succeeded, report.failed);
                if !report.all_succeeded() {
                    return Err(ApiError::MutationRejected {
                        operation: "bulk tag edit",
                    });
                }
            }
        }
        Commands::Rename { relpath, new_name } => {
            let response = reconciler
                .rename_file(&mut session, &relpath, &new_name)
                .await?;
            println!("renamed to {}", response.relpath);
        }
        Commands::Delete { relpath } => {
            reconciler.delete_file(&mut session, &relpath).await?;
            println!("deleted {relpath}");
        }
        Commands::Clips { relpath, markers } => {
            session.play(MediaKind::Source, &relpath)?;
            for marker in markers {
                session.add_marker(marker)?;
            }
            let segments = session.segments();
            println!("cutting {} segment(s)", segments.len());
            let created = reconciler.create_clips(&mut session).await?;
            for clip in &created {
                println!("{}", clip.relpath);
            }
        }
        Commands::Scan {
            dir,
            list_dirs,
            move_duplicates,
        } => {
            if list_dirs {
                let response = api.dedupe_dirs().await?;
                for dir in &response.dirs {
                    println!("{}", if dir.is_empty() { "/" } else { dir });
                }
                return Ok(());
            }

            let cancel = cancel_on_ctrl_c();
            let outcome = run_dedupe_scan(
                &api,
                dir.as_deref().unwrap_or(""),
                &cancel,
                |progress| {
                    let stale = if progress.stale { " (stalled?)" } else { "" };
                    println!(
                        "[{}] {} | dirs {} videos {} hashed {}/{} duplicates {}{}",
                        progress.phase,
                        progress.message,
                        progress.counters.dirs,
                        progress.counters.video_files,
                        progress.counters.hashed_files,
                        progress.counters.candidate_files,
                        progress.counters.duplicate_files,
                        stale,
                    );
                },
            )
            .await?;

            for group in &outcome.groups {
                println!("group {} keeps {}", group.group_id, group.keep);
                for file in &group.files {
                    if file != &group.keep {
                        println!("  duplicate {file}");
                    }
                }
            }
            println!("{} duplicate group(s)", outcome.groups.len());

            if move_duplicates && !outcome.groups.is_empty() {
                let moved = api.dedupe_move(&outcome.scan_id, None).await?;
                println!("moved {} file(s)", moved.moved.len());
            }
        }
        Commands::Merge { profile } => {
            let cancel = cancel_on_ctrl_c();
            let outcome = run_merge(&api, &profile, &cancel, |progress| {
                println!(
                    "[{}] {} ({:.0}%)",
                    progress.phase, progress.message, progress.progress_pct
                );
            })
            .await?;
            println!("download ready: {}", outcome.download_url);
        }
        Commands::Queue { command } => {
            api_http::queue::reload(&api, &mut session).await?;
            match command {
                QueueCommands::Show => {}
                QueueCommands::Add { target_relpath, at } => {
                    api_http::queue::add(&api, &mut session, &target_relpath, at).await?;
                }
                QueueCommands::Remove { id } => {
                    api_http::queue::remove(&api, &mut session, id).await?;
                }
                QueueCommands::Move { id, index } => {
                    api_http::queue::move_and_persist(&api, &mut session, id, index).await?;
                }
                QueueCommands::Clear => {
                    api_http::queue::clear(&api, &mut session).await?;
                }
            }
            for item in session.queue() {
                println!("{:>4}  {}", item.id, item.target_relpath);
            }
        }
    }

    Ok(())
}
