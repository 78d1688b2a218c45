//! Command-line leaderboard for a Viscosity pour-log snapshot.
//!
//! Run with: cargo run --bin viscosity-rank -- --snapshot pours.json --window 30d

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use viscosity_rank::rankings::core::fields::{FilterField, parse_filter_expr};
use viscosity_rank::rankings::source::EventPredicate;
use viscosity_rank::rankings::{
    AuthorId, JsonSnapshotSource, LeaderboardSummary, RankQuery, RankingsConfig, Scope,
    SnapshotSource, SqliteSnapshotSource, TimeWindow, fetch_and_rank, leaderboard_rows,
    normalize_tag, popular_tags,
};

/// Command-line arguments for viscosity-rank
#[derive(Parser, Debug)]
#[command(name = "viscosity-rank")]
#[command(about = "Rank bottles by mean rating over a pour-log snapshot")]
#[command(version)]
struct Args {
    /// JSON snapshot file
    #[arg(long, env = "VISCOSITY_SNAPSHOT", conflicts_with = "sqlite")]
    snapshot: Option<PathBuf>,

    /// SQLite snapshot database
    #[arg(long, env = "VISCOSITY_SQLITE")]
    sqlite: Option<PathBuf>,

    /// JSON config file supplying query defaults
    #[arg(long, env = "VISCOSITY_CONFIG")]
    config: Option<PathBuf>,

    /// Only count pours logged by this device token
    #[arg(long)]
    author: Option<String>,

    /// Time window: all, 7d, 30d, 90d, or any day count
    #[arg(long)]
    window: Option<TimeWindow>,

    /// Only count pours with this tag (normalized before matching)
    #[arg(long)]
    tag: Option<String>,

    /// Case-insensitive label search
    #[arg(long)]
    search: Option<String>,

    /// Metadata filter as field=value, repeatable
    #[arg(long = "filter", value_parser = parse_filter_arg)]
    filters: Vec<(FilterField, String)>,

    /// Minimum rated pours per bottle
    #[arg(long)]
    min_samples: Option<usize>,

    /// Number of entries
    #[arg(long)]
    limit: Option<usize>,

    /// List the most used tags instead of ranking
    #[arg(long)]
    popular_tags: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_filter_arg(raw: &str) -> Result<(FilterField, String), String> {
    parse_filter_expr(raw).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match rt.block_on(run(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = writeln!(std::io::stderr(), "error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => RankingsConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RankingsConfig::default(),
    };

    let source: Arc<dyn SnapshotSource> = match (&args.sqlite, &args.snapshot) {
        (Some(path), _) => Arc::new(
            SqliteSnapshotSource::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        (None, Some(path)) => Arc::new(JsonSnapshotSource::new(path)),
        (None, None) => bail!("either --snapshot or --sqlite is required"),
    };

    let mut out = std::io::stdout().lock();

    if args.popular_tags {
        let events = source
            .fetch_events(&EventPredicate::default())
            .await
            .context("Failed to fetch rating events")?;
        let tags = popular_tags(&events, args.limit.unwrap_or(config.defaults.limit))?;
        if args.json {
            serde_json::to_writer_pretty(&mut out, &tags)?;
            writeln!(out)?;
        } else {
            for tag in tags {
                writeln!(out, "{tag}")?;
            }
        }
        return Ok(());
    }

    let query = build_query(&args, &config)?;
    let board = fetch_and_rank(source.as_ref(), &query, Utc::now())
        .await
        .context("Failed to rank snapshot")?;
    let summary = LeaderboardSummary::new(&board, &query);

    if args.json {
        let body = serde_json::json!({
            "results": board.results,
            "total_before_limit": board.total_before_limit,
            "rated_events": board.rated_events,
            "summary": summary,
        });
        serde_json::to_writer_pretty(&mut out, &body)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "{} · {} · {} rated bottles · {} rated pours",
        summary.scope, summary.window, summary.rated_items, summary.rated_events
    )?;
    if let Some(tag) = &summary.tag {
        writeln!(out, "Tag: {tag}")?;
    }
    let rows = leaderboard_rows(&board);
    if rows.is_empty() {
        writeln!(out, "No rated pours match these filters.")?;
    }
    for row in rows {
        writeln!(out, "{}", row.caption())?;
    }
    Ok(())
}

fn build_query(args: &Args, config: &RankingsConfig) -> Result<RankQuery> {
    let mut query = config.defaults.query();

    if let Some(author) = &args.author {
        query = query.with_scope(Scope::Author(AuthorId::new(author.clone())));
    }
    if let Some(window) = args.window {
        query = query.with_window(window);
    }
    if let Some(tag) = &args.tag {
        let tag = normalize_tag(tag)?;
        if !tag.is_empty() {
            query = query.with_tag(tag);
        }
    }
    if let Some(search) = &args.search {
        query = query.with_search(search.clone());
    }
    for (field, value) in &args.filters {
        query = query.with_filter(*field, value.clone());
    }
    if let Some(min) = args.min_samples {
        query = query.with_min_sample_count(min);
    }
    if let Some(limit) = args.limit {
        query = query.with_limit(limit);
    }

    query.validate()?;
    Ok(query)
}
