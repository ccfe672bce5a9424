//! tabsort CLI: plan tab groups for a recorded browser inventory.
//!
//! ```text
//! main() -> init_tracing() -> plan | check
//!                               |
//!                               v
//!        SimulatedHost(inventory) <- ReconciliationEngine -> layout + host calls
//! ```
//!
//! `plan` replays an optional event script after bootstrap: each event is
//! first applied to the simulated host (a navigation, a closed tab, a removed
//! group) and then handed to the engine, the same order a browser would
//! deliver it.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tabsort_config::{FileConfigSource, TabsortConfig};
use tabsort_core::RuleSet;
use tabsort_engine::{Inventory, ReconciliationEngine, SimulatedHost, TabHost, WindowLayout};
use tabsort_types::HostEvent;

#[derive(Parser)]
#[command(name = "tabsort")]
#[command(about = "Group browser tabs by rule and domain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap against an inventory snapshot and print the resulting layout
    Plan {
        /// JSON inventory of windows, tabs, and groups
        #[arg(long)]
        inventory: PathBuf,
        /// JSON array of host events to replay after bootstrap
        #[arg(long)]
        events: Option<PathBuf>,
        /// Config file (defaults to $TABSORT_CONFIG or ~/.tabsort/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate the configuration and report rules that cannot match
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    fn config_source(&self) -> FileConfigSource {
        let explicit = match self {
            Commands::Plan { config, .. } | Commands::Check { config } => config.clone(),
        };
        explicit.map_or_else(FileConfigSource::default_location, FileConfigSource::at)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let source = cli.command.config_source();

    let log_filter = source
        .path()
        .and_then(|path| TabsortConfig::load_from(&path).ok().flatten())
        .and_then(|config| config.log_filter().map(str::to_string));
    init_tracing(log_filter.as_deref());

    match cli.command {
        Commands::Plan {
            inventory, events, ..
        } => plan(source, &inventory, events.as_deref()).await,
        Commands::Check { .. } => check(&source),
    }
}

fn init_tracing(config_filter: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_tabsort_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Stdout carries the plan; no log file means no logs.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_tabsort_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in tabsort_log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn tabsort_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.tabsort/logs/tabsort.log
    if let Some(config_path) = TabsortConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("tabsort.log"));
    }

    candidates.push(PathBuf::from(".tabsort").join("logs").join("tabsort.log"));

    candidates
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {what} {}", path.display()))
}

async fn plan(source: FileConfigSource, inventory: &Path, events: Option<&Path>) -> Result<()> {
    let inventory: Inventory = read_json(inventory, "inventory")?;
    let events: Vec<HostEvent> = match events {
        Some(path) => read_json(path, "event script")?,
        None => Vec::new(),
    };

    let host = Arc::new(SimulatedHost::from_inventory(&inventory).context("invalid inventory")?);
    let mut engine = ReconciliationEngine::new(Arc::clone(&host), source);

    let report = engine.bootstrap().await.context("bootstrap failed")?;
    for failure in &report.failures {
        println!("bootstrap: {failure}");
    }

    for event in events {
        let kind = event.kind();
        replay_on_host(&host, &event).await;
        match engine.handle(event).await {
            Ok(outcome) => tracing::debug!(kind, ?outcome, "Event replayed"),
            Err(err) => println!("event {kind}: {err}"),
        }
    }

    for window in engine.layout() {
        print_window(&window, &host);
    }
    println!("host calls:");
    for call in host.calls() {
        println!("  {}", serde_json::to_string(&call)?);
    }
    Ok(())
}

/// Make the simulated host reflect what the event reports happened.
async fn replay_on_host(host: &SimulatedHost, event: &HostEvent) {
    match event {
        HostEvent::TabAdded {
            tab_id,
            url: Some(url),
        } => {
            if host.navigate(*tab_id, url).is_err() {
                tracing::debug!(tab = %tab_id, "Event names a tab missing from the inventory");
            }
        }
        HostEvent::TabRemoved { tab_id, .. } => {
            host.close_tab(*tab_id);
        }
        HostEvent::GroupRemoved { window_id, title } => {
            let Ok(groups) = host.groups(*window_id).await else {
                return;
            };
            for group in groups
                .iter()
                .filter(|group| group.title.as_deref() == Some(title.as_str()))
            {
                host.remove_group(group.id);
            }
        }
        HostEvent::TabAdded { url: None, .. }
        | HostEvent::GroupUpdated { .. }
        | HostEvent::ReloadRequested => {}
    }
}

fn print_window(window: &WindowLayout, host: &SimulatedHost) {
    println!("window {} ({:?})", window.window, window.phase);
    for group in &window.groups {
        let host_id = group
            .host_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let tabs: Vec<String> = group.tab_ids.iter().map(ToString::to_string).collect();
        println!(
            "  {:<24} {:<12} group {:<6} tabs [{}]",
            group.title,
            group.rank.to_string(),
            host_id,
            tabs.join(", ")
        );
    }
    let strip: Vec<String> = host
        .strip(window.window)
        .into_iter()
        .map(|(tab, title)| match title {
            Some(title) => format!("{tab}:{title}"),
            None => tab.to_string(),
        })
        .collect();
    println!("  strip: {}", strip.join(" | "));
}

fn check(source: &FileConfigSource) -> Result<()> {
    let Some(path) = source.path() else {
        bail!("no config location; pass --config or set TABSORT_CONFIG");
    };
    let Some(config) = TabsortConfig::load_from(&path)? else {
        println!(
            "{}: no config file; every tab uses domain grouping",
            path.display()
        );
        return Ok(());
    };

    let configuration = config.into_configuration();
    let rules = RuleSet::new(&configuration.rules);
    println!(
        "{}: {} rules, {} aliases, {} keywords",
        path.display(),
        rules.len(),
        configuration.aliases.len(),
        configuration.settings.remove_keyword_list.len()
    );

    for rule in rules.iter() {
        println!(
            "  [{:>4}] {:<6} {:<32} -> {}",
            rule.priority(),
            rule.match_type().as_str(),
            rule.match_content(),
            rule.group_title()
        );
    }

    let malformed: Vec<_> = rules.malformed().collect();
    for (rule, err) in &malformed {
        println!("  {} ({}): {err}", rule.id(), rule.match_content());
    }
    if !malformed.is_empty() {
        bail!("{} rule pattern(s) do not compile", malformed.len());
    }
    Ok(())
}
