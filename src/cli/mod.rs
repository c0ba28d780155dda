//! # CLI Module
//!
//! Command-line interface for photo triage.
//!
//! ## Usage
//! ```bash
//! # Swipe through a folder: ← / d delete, → / k keep, u undo, q quit
//! photo-triage swipe ~/Pictures
//!
//! # Try it without touching any files
//! photo-triage swipe ~/Pictures --dry-run
//!
//! # Space saved this month
//! photo-triage stats --window month
//!
//! # Per-status record counts as JSON
//! photo-triage status --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Key, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_triage::core::index::{DirectoryIndex, IndexConfig, IndexOrder};
use photo_triage::core::media::{MediaItem, ReviewStatus};
use photo_triage::core::reconcile::Reconciler;
use photo_triage::core::review::{
    Deleter, JsonPreferenceStore, RecordingDeleter, ReviewSession, ReviewState, TrashDeleter,
};
use photo_triage::core::stats::{format_bytes, StatsAggregator, TimeWindow};
use photo_triage::core::store::{SqliteStatusStore, StatusStore, StoreWriter};
use photo_triage::core::TriageConfig;
use photo_triage::error::Result;
use photo_triage::events::{Event, EventChannel, EventReceiver, ReviewEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Photo Triage - keep or discard, one photo at a time
#[derive(Parser, Debug)]
#[command(name = "photo-triage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Status database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Review photos interactively
    Swipe {
        /// Directories to review
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Photos per batch
        #[arg(short, long, default_value = "30")]
        batch_size: usize,

        /// Photos loaded before the first one is shown
        #[arg(long, default_value = "2")]
        eager: usize,

        /// Keep the directory order instead of shuffling
        #[arg(long)]
        no_shuffle: bool,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Record decisions but never move files to the trash
        #[arg(long)]
        dry_run: bool,

        /// Preferences file path
        #[arg(long)]
        preferences: Option<PathBuf>,

        /// Initial stats window
        #[arg(short, long, default_value = "week")]
        window: Window,
    },

    /// Show space saved by confirmed deletions
    Stats {
        /// Time window (all windows if omitted)
        #[arg(short, long)]
        window: Option<Window>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Show how many photos have been kept, deleted or left undecided
    Status {
        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Window {
    Day,
    Week,
    Month,
    Year,
}

impl From<Window> for TimeWindow {
    fn from(window: Window) -> Self {
        match window {
            Window::Day => TimeWindow::Day,
            Window::Week => TimeWindow::Week,
            Window::Month => TimeWindow::Month,
            Window::Year => TimeWindow::Year,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Swipe {
            paths,
            batch_size,
            eager,
            no_shuffle,
            include_hidden,
            dry_run,
            preferences,
            window,
        } => {
            let mut builder = TriageConfig::builder()
                .batch_size(batch_size)
                .eager_count(eager)
                .shuffle(!no_shuffle)
                .include_hidden(include_hidden)
                .stats_window(window.into());
            if let Some(db) = cli.db {
                builder = builder.store_path(db);
            }
            if let Some(preferences) = preferences {
                builder = builder.preferences_path(preferences);
            }
            run_swipe(paths, builder.build()?, dry_run)
        }
        Commands::Stats { window, output } => run_stats(cli.db, window.map(Into::into), output),
        Commands::Status { output } => run_status(cli.db, output),
    }
}

fn open_store(db: Option<PathBuf>) -> Result<Arc<SqliteStatusStore>> {
    let path = db.unwrap_or_else(|| TriageConfig::default().store_path);
    Ok(Arc::new(SqliteStatusStore::open(&path)?))
}

fn run_swipe(paths: Vec<PathBuf>, config: TriageConfig, dry_run: bool) -> Result<()> {
    let term = Term::stdout();

    let store = open_store(Some(config.store_path.clone()))?;
    let preferences = Arc::new(JsonPreferenceStore::open(&config.preferences_path)?);
    let (sender, receiver) = EventChannel::new();

    let index = DirectoryIndex::new(
        paths,
        IndexConfig {
            include_hidden: config.include_hidden,
            ..Default::default()
        },
    );
    let order = if config.shuffle {
        IndexOrder::Random
    } else {
        IndexOrder::Natural
    };
    let writer = StoreWriter::spawn_with_events(store.clone(), config.writer_shards, sender.clone());
    let reconciler = Reconciler::new(Arc::new(index), store, writer)
        .with_order(order)
        .with_lookahead(config.lookahead)
        .with_events(sender.clone());

    let deleter: Arc<dyn Deleter> = if dry_run {
        Arc::new(RecordingDeleter::new())
    } else {
        Arc::new(TrashDeleter)
    };

    let mut session = ReviewSession::builder(reconciler)
        .deleter(deleter)
        .preferences(preferences)
        .events(sender)
        .batch_size(config.batch_size)
        .eager_count(config.eager_count)
        .stats_window(config.stats_window)
        .build();

    term.write_line(&format!(
        "{} {}",
        style("Photo Triage").bold().cyan(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    if dry_run {
        term.write_line(&format!("{}", style("Dry run: no files will be moved to the trash").yellow()))
            .ok();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Finding photos to review...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let fetched = session.fetch_photos();
    spinner.finish_and_clear();
    fetched?;

    swipe_loop(&term, &mut session, &receiver);

    session.flush();
    term.write_line("").ok();
    term.write_line(&format!(
        "{} {} saved {}",
        style("✓").green().bold(),
        style(format_bytes(session.space_saved())).yellow(),
        session.stats_window().label()
    ))
    .ok();
    Ok(())
}

fn swipe_loop(term: &Term, session: &mut ReviewSession, receiver: &EventReceiver) {
    loop {
        session.poll_incoming();
        print_notices(term, receiver);

        if session.state() == ReviewState::PendingReview {
            if !review_dialog(term, session) {
                return;
            }
            continue;
        }

        let current = session.current().cloned();
        match current {
            Some(item) if item.status == ReviewStatus::Unset => {
                print_card(term, session, &item);
                let Ok(key) = term.read_key() else {
                    return;
                };
                match key {
                    Key::ArrowLeft | Key::Char('d') => {
                        session.swipe(ReviewStatus::Delete);
                    }
                    Key::ArrowRight | Key::Char('k') => {
                        session.swipe(ReviewStatus::Keep);
                    }
                    Key::Char('u') => {
                        session.undo();
                    }
                    Key::Char('i') => {
                        session.toggle_info();
                    }
                    Key::Char('s') => {
                        session.cycle_stats_time_frame();
                    }
                    Key::Char('q') | Key::Escape => return,
                    _ => {}
                }
            }
            Some(_) => session.find_unset_photo(),
            None if session.is_ingesting() => {
                session.wait_for_ingestion();
            }
            None => {
                if !exhausted_prompt(term, session) {
                    return;
                }
            }
        }
    }
}

/// Nothing left to swipe; returns false to quit
fn exhausted_prompt(term: &Term, session: &mut ReviewSession) -> bool {
    let marked = session.photos_to_delete().len();
    if marked > 0 {
        term.write_line(&format!(
            "{} photos marked for deletion. [r] review  [q] quit",
            style(marked).red().bold()
        ))
        .ok();
    } else {
        term.write_line("No more photos in this batch. [f] fetch more  [q] quit")
            .ok();
    }

    match term.read_key() {
        Ok(Key::Char('r')) if marked > 0 => {
            session.settle();
            true
        }
        Ok(Key::Char('f')) if marked == 0 => match session.fetch_more() {
            Ok(0) if !session.is_ingesting() => {
                term.write_line(&format!("{}", style("Every photo here has been reviewed.").green()))
                    .ok();
                false
            }
            Ok(_) => true,
            Err(e) => {
                term.write_line(&format!("{} {}", style("Error:").red(), e)).ok();
                false
            }
        },
        Ok(Key::Char('q')) | Ok(Key::Escape) | Err(_) => false,
        Ok(_) => true,
    }
}

/// Delete-confirmation dialog; returns false to quit
fn review_dialog(term: &Term, session: &mut ReviewSession) -> bool {
    let marked: Vec<MediaItem> = session.photos_to_delete().into_iter().cloned().collect();
    let total: u64 = marked.iter().map(|i| i.size_bytes).sum();

    term.write_line("").ok();
    term.write_line(&format!(
        "{} ({} photos, {})",
        style("Delete these photos?").bold().underlined(),
        marked.len(),
        format_bytes(total)
    ))
    .ok();
    for (i, item) in marked.iter().enumerate() {
        term.write_line(&format!("  {:>3}. {}", i + 1, item.item_ref)).ok();
    }
    term.write_line(&format!(
        "{}",
        style("[y] delete  [a] delete, don't ask again  [n] cancel  [number] keep reviewing that photo")
            .dim()
    ))
    .ok();

    let Ok(answer) = term.read_line() else {
        return false;
    };
    match answer.trim() {
        "y" => {
            session.on_confirmation(false);
        }
        "a" => {
            session.on_confirmation(true);
        }
        "n" => {
            if let Err(e) = session.on_cancellation() {
                term.write_line(&format!("{} {}", style("Error:").red(), e)).ok();
            }
        }
        "q" => return false,
        other => match other.parse::<usize>() {
            Ok(n) if (1..=marked.len()).contains(&n) => {
                session.on_unset_photo(&marked[n - 1].content_hash);
            }
            _ => {}
        },
    }
    true
}

fn print_card(term: &Term, session: &ReviewSession, item: &MediaItem) {
    term.write_line("").ok();
    term.write_line(&format!(
        "{}  {}",
        style(item.title.as_deref().unwrap_or("(untitled)")).bold(),
        style(item.formatted_date()).dim()
    ))
    .ok();
    term.write_line(&format!("  {}", item.item_ref)).ok();

    if session.info_expanded() {
        if let Some(album) = &item.album {
            term.write_line(&format!("  Album:       {}", album)).ok();
        }
        if let Some(resolution) = &item.resolution {
            term.write_line(&format!("  Resolution:  {}", resolution)).ok();
        }
        term.write_line(&format!("  Size:        {}", format_bytes(item.size_bytes)))
            .ok();
        if let Some(geo) = item.geo_uri() {
            term.write_line(&format!("  Location:    {}", geo)).ok();
        }
        if let Some(description) = &item.description {
            term.write_line(&format!("  Description: {}", description)).ok();
        }
    }

    term.write_line(&format!(
        "  {} left  ·  {} saved {}",
        style(session.unset_count()).cyan(),
        style(format_bytes(session.space_saved())).yellow(),
        session.stats_window().label()
    ))
    .ok();
    term.write_line(&format!(
        "{}",
        style("[←/d] delete  [→/k] keep  [u] undo  [i] info  [s] stats  [q] quit").dim()
    ))
    .ok();
}

fn print_notices(term: &Term, receiver: &EventReceiver) {
    for event in receiver.drain() {
        match event {
            Event::Review(ReviewEvent::Notice(notice)) => {
                term.write_line(&format!("{}", style(notice).yellow())).ok();
            }
            Event::Review(ReviewEvent::Deleted { count, bytes }) => {
                term.write_line(&format!(
                    "{} Deleted {} photos ({})",
                    style("✓").green().bold(),
                    count,
                    format_bytes(bytes)
                ))
                .ok();
            }
            _ => {}
        }
    }
}

fn run_stats(db: Option<PathBuf>, window: Option<TimeWindow>, output: OutputFormat) -> Result<()> {
    let stats = StatsAggregator::new(open_store(db)?);
    let windows: Vec<TimeWindow> = match window {
        Some(window) => vec![window],
        None => TimeWindow::ALL.to_vec(),
    };

    let mut totals = Vec::with_capacity(windows.len());
    for window in windows {
        totals.push((window, stats.space_saved(window)?));
    }

    match output {
        OutputFormat::Pretty => {
            let term = Term::stdout();
            for (window, bytes) in &totals {
                term.write_line(&format!(
                    "  {:<12} {}",
                    window.label(),
                    style(format_bytes(*bytes)).yellow()
                ))
                .ok();
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!(totals
                .iter()
                .map(|(window, bytes)| serde_json::json!({
                    "window": window,
                    "space_saved_bytes": bytes,
                }))
                .collect::<Vec<_>>());
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        }
    }

    Ok(())
}

fn run_status(db: Option<PathBuf>, output: OutputFormat) -> Result<()> {
    let counts = open_store(db)?.counts()?;

    match output {
        OutputFormat::Pretty => {
            let term = Term::stdout();
            term.write_line(&format!("  {} kept", style(counts.keep).green())).ok();
            term.write_line(&format!("  {} deleted", style(counts.delete).red())).ok();
            term.write_line(&format!("  {} undecided", style(counts.unset).cyan())).ok();
            term.write_line(&format!("  {} total", style(counts.total()).bold())).ok();
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&counts).unwrap());
        }
    }

    Ok(())
}
