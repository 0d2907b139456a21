//! A2A Stage - command-line front end
//!
//! Browse the catalog, play scenarios step by step or on a timer, scrub
//! through them with scroll ratios, and edit authored step lists.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::config::Config;
use crate::observability::telemetry::{init_tracing, scenario_span};
use crate::player::{
    AutoPlay, AutoPlayExit, DriverKind, FrameThrottle, PanelLayout, ScrollOutcome, SharedStage,
    Stage, StepPlayer,
};
use crate::scenario::{editor, Human, PhoneState, ScenarioCatalog, Server, Step};
use crate::store::ScenarioStore;

#[derive(Parser)]
#[command(name = "a2a-stage")]
#[command(about = "Play scripted agent-to-agent scenarios step by step")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Scenario catalog (JSON); overrides the configured one
    #[arg(long, value_name = "FILE", global = true)]
    catalog: Option<PathBuf>,

    /// Verbose logging (info level unless RUST_LOG is set)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

/// Output format for playback commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the scenarios in the catalog
    #[command(alias = "ls")]
    List,

    /// Show the step list of a scenario
    Steps {
        /// Scenario index or id (default: the configured start scenario)
        scenario: Option<String>,
    },

    /// Play a scenario forward
    #[command(alias = "p")]
    Play {
        /// Scenario index or id (default: the configured start scenario)
        scenario: Option<String>,

        /// Number of steps to advance (default: the whole script)
        #[arg(short = 'n', long, conflicts_with = "auto")]
        steps: Option<usize>,

        /// Advance on a timer instead of immediately
        #[arg(long)]
        auto: bool,

        /// Auto-play interval in milliseconds (raised to 200 if lower)
        #[arg(long, value_name = "MS", requires = "auto")]
        interval: Option<u64>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Drive a scenario through successive scroll ratios
    #[command(alias = "s")]
    Scrub {
        /// Scenario index or id (default: the configured start scenario)
        #[arg(short, long)]
        scenario: Option<String>,

        /// Ratios between 0 and 1, applied in order
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        ratios: Vec<f64>,

        /// Number of panels sharing the scroll range
        #[arg(long, requires = "panel")]
        panels: Option<usize>,

        /// Panel the scenario is bound to
        #[arg(long, requires = "panels")]
        panel: Option<usize>,

        /// Simulated time between samples in milliseconds (default: one frame)
        #[arg(long, value_name = "MS")]
        spacing: Option<u64>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Insert a step into a catalog file
    AddStep {
        /// Catalog file to edit
        #[arg(short, long)]
        file: PathBuf,

        /// Scenario index or id
        #[arg(short, long, default_value = "0")]
        scenario: String,

        /// Step as JSON: {"type": "...", "action": {...}}
        #[arg(long)]
        step: String,

        /// Position to insert at (default: append)
        #[arg(long)]
        insert_at: Option<usize>,
    },

    /// Remove a step from a catalog file
    RemoveStep {
        /// Catalog file to edit
        #[arg(short, long)]
        file: PathBuf,

        /// Scenario index or id
        #[arg(short, long, default_value = "0")]
        scenario: String,

        /// Index of the step to remove
        #[arg(long)]
        index: usize,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color || std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    init_tracing(&config.log.filter, cli.verbose);

    match cli.command {
        Commands::List => {
            let catalog = load_catalog(cli.catalog.as_deref(), &config)?;
            for (index, entry) in catalog.entries().iter().enumerate() {
                let s = &entry.scenario;
                println!(
                    "{:2}. {} {} ({} steps)",
                    index,
                    s.id.bold(),
                    s.title.dimmed(),
                    s.step_count()
                );
            }
        }

        Commands::Steps { scenario } => {
            let catalog = load_catalog(cli.catalog.as_deref(), &config)?;
            let index = catalog.select(scenario.as_deref(), config.player.start_index)?;
            let template = &catalog.entries()[index].scenario;
            println!("{}", template.title.bold());
            for summary in editor::list_steps(template) {
                println!("{}", summary);
            }
        }

        Commands::Play {
            scenario,
            steps,
            auto,
            interval,
            format,
        } => {
            let catalog = load_catalog(cli.catalog.as_deref(), &config)?;
            let index = catalog.select(scenario.as_deref(), config.player.start_index)?;
            let id = catalog.entries()[index].scenario.id.clone();
            let player = StepPlayer::with_start(catalog, index)?;

            if auto {
                let interval = interval
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| config.effective_interval());
                let shared = play_auto(Stage::new(player), interval, format)
                    .instrument(scenario_span(&id))
                    .await?;
                let stage = shared.lock();
                render_snapshot(&stage, format)?;
            } else {
                let _span = scenario_span(&id).entered();
                let stage = play_manual(Stage::new(player), steps, format)?;
                render_snapshot(&stage, format)?;
            }
        }

        Commands::Scrub {
            scenario,
            ratios,
            panels,
            panel,
            spacing,
            format,
        } => {
            let catalog = load_catalog(cli.catalog.as_deref(), &config)?;
            let index = catalog.select(scenario.as_deref(), config.player.start_index)?;
            let id = catalog.entries()[index].scenario.id.clone();
            let _span = scenario_span(&id).entered();

            let mut stage = Stage::new(StepPlayer::with_start(catalog, index)?);
            let binding = panels.zip(panel).map(|(n, i)| (PanelLayout::new(n), i));
            let spacing = spacing
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.frame_interval());
            scrub(&mut stage, &ratios, binding, spacing, config.frame_interval(), format)?;
            render_snapshot(&stage, format)?;
        }

        Commands::AddStep {
            file,
            scenario,
            step,
            insert_at,
        } => {
            let mut catalog = ScenarioCatalog::load(&file)?;
            let index = catalog.require(&scenario)?;
            let step = editor::parse_step(&step)?;
            let template = catalog
                .get_mut(index)
                .with_context(|| format!("Scenario #{} vanished from catalog", index))?;
            let at = editor::insert_step(template, step, insert_at)?;
            let id = template.id.clone();
            catalog.save(&file)?;
            println!("{} Inserted step {} into '{}'", "✓".green(), at, id);
        }

        Commands::RemoveStep {
            file,
            scenario,
            index: step_index,
        } => {
            let mut catalog = ScenarioCatalog::load(&file)?;
            let index = catalog.require(&scenario)?;
            let template = catalog
                .get_mut(index)
                .with_context(|| format!("Scenario #{} vanished from catalog", index))?;
            let removed = editor::remove_step(template, step_index)?;
            let id = template.id.clone();
            catalog.save(&file)?;
            println!(
                "{} Removed step {} ({}) from '{}'",
                "✓".green(),
                step_index,
                removed.kind(),
                id
            );
        }
    }

    Ok(())
}

/// `--catalog` wins over the configured catalog; the built-in one is the fallback.
fn load_catalog(flag: Option<&Path>, config: &Config) -> Result<ScenarioCatalog> {
    let catalog = match flag.or(config.catalog.as_deref()) {
        Some(path) => ScenarioCatalog::load(path)?,
        None => ScenarioCatalog::builtin()?,
    };
    Ok(catalog)
}

fn play_manual(mut stage: Stage, steps: Option<usize>, format: OutputFormat) -> Result<Stage> {
    let token = stage.claim(DriverKind::Manual)?;
    let count = steps.unwrap_or_else(|| stage.player().total_steps());

    for _ in 0..count {
        if !stage.advance(&token)? {
            break;
        }
        if format == OutputFormat::Text {
            if let Some(step) = stage.player().store().applied_steps().last() {
                print_step(stage.player().store(), stage.player().applied_count() - 1, step);
            }
        }
    }

    stage.release(token);
    Ok(stage)
}

async fn play_auto(stage: Stage, interval: Duration, format: OutputFormat) -> Result<SharedStage> {
    let shared = stage.shared();
    let auto = AutoPlay::start(shared.clone(), interval)?;
    if format == OutputFormat::Text {
        println!(
            "{} every {} ms",
            "Auto-play".bold(),
            auto.interval().as_millis()
        );
    }

    let exit = auto.wait().await;
    if exit != AutoPlayExit::Completed {
        eprintln!("{} auto-play ended early: {:?}", "!".yellow(), exit);
    }

    if format == OutputFormat::Text {
        let stage = shared.lock();
        let store = stage.player().store();
        for (index, step) in store.applied_steps().iter().enumerate() {
            print_step(store, index, step);
        }
    }
    Ok(shared)
}

fn scrub(
    stage: &mut Stage,
    ratios: &[f64],
    binding: Option<(PanelLayout, usize)>,
    spacing: Duration,
    frame: Duration,
    format: OutputFormat,
) -> Result<()> {
    let token = stage.claim(DriverKind::Scroll)?;
    let samples = FrameThrottle::new(frame).coalesce(ratios, spacing, Instant::now());
    if samples.len() < ratios.len() && format == OutputFormat::Text {
        println!(
            "{} {} of {} samples coalesced",
            "~".dimmed(),
            ratios.len() - samples.len(),
            ratios.len()
        );
    }

    for ratio in samples {
        let outcome = match binding {
            Some((layout, panel)) => stage.scrub_panel(&token, ratio, &layout, panel)?,
            None => stage.scrub(&token, ratio)?,
        };
        if format == OutputFormat::Text {
            println!(
                "{:>6.3} -> {:<28} applied {}/{}",
                ratio,
                describe_outcome(&outcome),
                stage.player().applied_count(),
                stage.player().total_steps()
            );
        }
    }

    stage.release(token);
    Ok(())
}

fn describe_outcome(outcome: &ScrollOutcome) -> String {
    match outcome {
        ScrollOutcome::Unchanged { index } => format!("unchanged at {}", index),
        ScrollOutcome::Advanced { to, applied } => format!("advanced to {} (+{})", to, applied),
        ScrollOutcome::Replayed { to, applied } => format!("replayed to {} ({})", to, applied),
        ScrollOutcome::OutsidePanel => "outside panel".to_string(),
    }
}

fn print_step(store: &ScenarioStore, index: usize, step: &Step) {
    let sender = step.sender();
    println!(
        "{:>3} {:12} {} ({}) -> {} | {}",
        format!("[{}]", index).as_str().dimmed(),
        step.kind().to_string().as_str().cyan(),
        sender.bold(),
        store.sender_type(sender),
        step.recipient().bold(),
        step.detail()
    );
}

fn phone_label(state: PhoneState) -> colored::ColoredString {
    match state {
        PhoneState::Message => "message".normal(),
        PhoneState::Call => "call".green(),
        PhoneState::Ring => "ring".yellow(),
    }
}

fn render_human(human: &Human) {
    println!(
        "  {} [{}] {} messages",
        human.name.bold(),
        phone_label(human.phone_state),
        human.message_count()
    );
    for (sender, messages) in &human.message_box {
        for message in messages {
            println!("      {} {}: {}", "<".dimmed(), sender, message.content);
        }
    }
}

fn render_snapshot(stage: &Stage, format: OutputFormat) -> Result<()> {
    let player = stage.player();
    let store = player.store();
    let Some(live) = store.state() else {
        return Ok(());
    };

    if format == OutputFormat::Json {
        let active = store.active();
        let snapshot = serde_json::json!({
            "scenario": live.id,
            "progress": player.progress(),
            "applied": player.applied_count(),
            "total": player.total_steps(),
            "complete": player.is_complete(),
            "active": {
                "agent": active.agent.map(|a| a.name.as_str()),
                "server": active.server.map(Server::name),
            },
            "state": live,
        });
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!(
        "\n{} {}/{} steps",
        live.title.bold(),
        player.applied_count(),
        player.total_steps()
    );
    render_human(&live.customer);
    for server in &live.servers {
        match server {
            Server::Human(human) => render_human(human),
            Server::Ai(agent) => println!("  {} [ai] {} steps", agent.name.bold(), agent.steps.len()),
        }
    }
    for agent in &live.agents {
        println!("  {} [agent] {} steps", agent.name.bold(), agent.steps.len());
    }
    for session in &live.call_sessions {
        let status = match (session.accepted, session.end) {
            (_, Some(end)) => format!("ended at {}", end),
            (true, None) => "in progress".green().to_string(),
            (false, None) => "ringing".yellow().to_string(),
        };
        println!(
            "  call #{} {} {}",
            session.id,
            session.participants.join(" <-> "),
            status
        );
    }

    let active = store.active();
    println!(
        "  active: agent={} server={}",
        active.agent.map(|a| a.name.as_str()).unwrap_or("-"),
        active.server.map(Server::name).unwrap_or("-")
    );
    Ok(())
}
