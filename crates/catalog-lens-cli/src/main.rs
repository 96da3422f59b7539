mod commands;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use catalog_lens_core::classify::{CategoryCounts, CategorySelection, Classifier};
use catalog_lens_core::diff::{
    can_open_entry, format_checksum, present, status_counts, DiffItem, DiffStatus, SnapshotRecord,
};
use catalog_lens_core::format::{format_bytes, format_timestamp};
use catalog_lens_core::listing::{page_window, PageButton};
use catalog_lens_core::session::{ExplorerSession, LoadState, SessionSettings};
use catalog_lens_core::taxonomy::{DisplayText, RuleGroup};
use catalog_lens_core::versions::DiffSelection;
use catalog_lens_core::{AppConfig, DirSource, SearchField, SelectionHint, TaxonomyStore};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, DiffArgs, SearchArgs};
use dotenv::dotenv;
use tracing::{error, info};

/// `_guard` must drop before the process ends or buffered file log lines are
/// lost; exit by returning, never through `process::exit`.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    let _guard = logging::init_logger();

    let mut config = match catalog_lens_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let args = Cli::parse();
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    let outcome = match args.command {
        Some(Commands::Search(search)) => run_search(&config, search).await,
        Some(Commands::Classify { labels }) => run_classify(&config, &labels).await,
        Some(Commands::Categories { group }) => run_categories(&config, group).await,
        Some(Commands::Versions) => run_versions(&config).await,
        Some(Commands::Diff(diff)) => run_diff(&config, diff).await,
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn open_session(config: &AppConfig, settings: SessionSettings) -> ExplorerSession {
    info!("Reading catalog data from {}", config.data_dir);
    let source = Arc::new(DirSource::new(&config.data_dir));
    ExplorerSession::new(source, Arc::new(TaxonomyStore::builtin()), settings)
}

async fn run_search(config: &AppConfig, args: SearchArgs) -> Result<()> {
    let mut settings = SessionSettings::from(config);
    if let Some(page_size) = args.page_size {
        settings.page_size = page_size.max(1);
    }
    if let Some(mode) = args.mode {
        settings.match_mode = mode;
    }
    let session = open_session(config, settings);
    session.prepare_taxonomy().await;

    let query = args.query.join(" ");
    if let LoadState::Failed(reason) = session.search(&query, args.field).await {
        bail!("search failed: {}", reason);
    }

    let selection = CategorySelection {
        entry_type: args.entry_type,
        media: args.media,
        characters: args.characters,
        tags: args.tags,
    };
    let list = session
        .result_list(&selection, args.sort, args.direction, args.page)
        .ok_or_else(|| anyhow!("search results are not loaded"))?;

    if list.is_empty() {
        println!("{}", "No entries match.".yellow());
        return Ok(());
    }

    let page = list.page();
    let classifier = session.classifier();
    for (offset, entry) in page.items.iter().enumerate() {
        let classes = classifier.classify(&entry.label);
        let mut tags: Vec<String> = classes.media;
        tags.extend(classes.characters);
        tags.extend(classes.tags);
        println!(
            "{:>5}  {}  {}  {}  {}  {}",
            page.first_index() + offset,
            entry.label.bold(),
            entry.entry_type.cyan(),
            format_bytes(entry.size),
            format_timestamp(entry.modified_at()),
            tags.join(",").dimmed(),
        );
    }

    let strip: Vec<String> = page_window(page.page, page.total_pages)
        .into_iter()
        .map(|button| match button {
            PageButton::Page(n) if n == page.page => format!("[{}]", n).green().to_string(),
            PageButton::Page(n) => n.to_string(),
            PageButton::Gap => "...".to_string(),
        })
        .collect();
    println!(
        "Page {} of {} ({} entries)  {}",
        page.page,
        page.total_pages,
        page.total_items,
        strip.join(" ")
    );
    Ok(())
}

async fn run_classify(config: &AppConfig, labels: &[String]) -> Result<()> {
    let session = open_session(config, SessionSettings::from(config));
    session.prepare_taxonomy().await;
    let classifier = session.classifier();

    for label in labels {
        let classes = classifier.classify(label);
        println!("{}", label.bold());
        println!("  media:      {}", classes.media.join(", "));
        println!("  characters: {}", classes.characters.join(", "));
        println!("  tags:       {}", classes.tags.join(", "));
    }
    Ok(())
}

async fn run_categories(config: &AppConfig, group: Option<RuleGroup>) -> Result<()> {
    let session = open_session(config, SessionSettings::from(config));
    session.prepare_taxonomy().await;

    let counts = match session.search("", SearchField::All).await {
        LoadState::Loaded(entries) => Some(session.classifier().category_counts(&entries)),
        _ => None,
    };

    let groups: Vec<RuleGroup> = match group {
        Some(group) => vec![group],
        None => RuleGroup::ALL.to_vec(),
    };
    for group in groups {
        println!("{}", group.as_str().bold());
        print_shortcuts(session.classifier(), group, counts.as_ref());
    }
    Ok(())
}

fn print_shortcuts(
    classifier: &Classifier,
    group: RuleGroup,
    counts: Option<&CategoryCounts>,
) {
    for shortcut in classifier.shortcuts(group, counts) {
        let display = match &shortcut.display {
            DisplayText::Label(label) => label.clone(),
            DisplayText::LookupKey(key) => key.dimmed().to_string(),
        };
        let count = shortcut
            .count
            .map(|c| format!("({})", c))
            .unwrap_or_default();
        println!("  {:<12} {:<28} {} {}", shortcut.key, display, shortcut.query(), count);
    }
}

async fn run_versions(config: &AppConfig) -> Result<()> {
    let session = open_session(config, SessionSettings::from(config));
    let catalog = match session.load_versions().await {
        LoadState::Loaded(catalog) => catalog,
        LoadState::Failed(reason) => bail!("version list failed: {}", reason),
        _ => bail!("version list did not load"),
    };

    if catalog.versions.is_empty() {
        println!("{}", "No versions found.".yellow());
        return Ok(());
    }
    for version in &catalog.versions {
        if version.current {
            println!("{} {}", version.version.green(), "(live)".green());
        } else {
            println!("{}", version.version);
        }
    }
    if !catalog.diff_available() {
        println!("{}", SelectionHint::Unavailable.to_string().yellow());
    }
    Ok(())
}

async fn run_diff(config: &AppConfig, args: DiffArgs) -> Result<()> {
    let mut settings = SessionSettings::from(config);
    if let Some(limit) = args.limit.filter(|l| *l > 0) {
        settings.diff_limit = limit;
    }
    let session = open_session(config, settings);

    let catalog = match session.load_versions().await {
        LoadState::Loaded(catalog) => catalog,
        LoadState::Failed(reason) => bail!("version list failed: {}", reason),
        _ => bail!("version list did not load"),
    };
    let selection: DiffSelection = catalog.default_pair(args.from.as_deref(), args.to.as_deref());

    let result = match session.load_diff(&selection).await {
        Err(hint) => {
            println!("{}", hint.to_string().yellow());
            return Ok(());
        }
        Ok(LoadState::Loaded(result)) => result,
        Ok(LoadState::Failed(reason)) => bail!("diff failed: {}", reason),
        Ok(_) => bail!("diff did not load"),
    };

    let from = selection.from.unwrap_or_default();
    let to = selection.to.unwrap_or_default();
    let view = present(&result, args.status, &args.keyword);
    println!(
        "{} -> {}  total {}  added {}  removed {}  modified {}",
        from.bold(),
        to.bold(),
        view.summary.total,
        format!("{}", view.summary.added).green(),
        format!("{}", view.summary.removed).red(),
        format!("{}", view.summary.modified).yellow(),
    );

    let live = catalog.live();
    for item in &view.items {
        print_diff_item(item, can_open_entry(item, &to, live));
    }

    let shown = status_counts(view.items.iter().copied());
    info!(
        "Shown: {} added, {} removed, {} modified, {} unchanged",
        shown.added, shown.removed, shown.modified, shown.unchanged
    );
    println!("{}", view.hint.to_string().dimmed());
    Ok(())
}

fn print_diff_item(item: &DiffItem, openable: bool) {
    let status = match item.status {
        DiffStatus::Added => item.status.as_str().green(),
        DiffStatus::Removed => item.status.as_str().red(),
        DiffStatus::Modified => item.status.as_str().yellow(),
        _ => item.status.as_str().normal(),
    };
    let side = |record: Option<&SnapshotRecord>| match record {
        Some(r) => format!("{} {} {}", r.entry_type, format_bytes(r.size), format_checksum(r.checksum.as_deref())),
        None => "-".to_string(),
    };
    let marker = if openable { "*" } else { " " };
    println!(
        "{} {:<9} {}  [{}] -> [{}]",
        marker,
        status,
        item.label,
        side(item.from.as_ref()),
        side(item.to.as_ref()),
    );
}
