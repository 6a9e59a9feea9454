use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use roomcast_core::{viewpoint_names, HeadlessSurface, LoadOutcome, RoomSession};
use roomcast_engine::cli::{self, Args};
use roomcast_engine::commands::{HostCommand, HELP};
use roomcast_engine::orchestrator::ServiceReply;
use roomcast_engine::{
    EngineConfig, GeminiClient, GltfAssetLoader, OfflineService, Orchestrator, ReasoningService,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};

type Session = RoomSession<HeadlessSurface>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = cli::parse();
    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let config = EngineConfig::from_args(&args).context("loading configuration")?;
    let catalog = config.load_catalog()?;

    let service: Arc<dyn ReasoningService> = match GeminiClient::new(&config, &catalog) {
        Ok(client) => {
            log::info!("reasoning requests go to {}", client.url());
            Arc::new(client)
        }
        Err(err) => {
            log::warn!("{err}; instructions will fail until a key is configured");
            Arc::new(OfflineService)
        }
    };

    let mut session = RoomSession::new(catalog, HeadlessSurface::new(), config.timing())
        .context("building the room")?;
    let mut orchestrator = Orchestrator::new(service);
    let loader = GltfAssetLoader::new(&config.assets_root);

    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ServiceReply>();
    let (asset_tx, mut asset_rx) = mpsc::unbounded_channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut frames = interval(config.frame_period());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();
    let mut stdin_open = true;

    println!("{HELP}");
    loop {
        for request in session.take_asset_requests() {
            log::debug!("loading {} for {}", request.model, request.item_id);
            loader.spawn(request, asset_tx.clone());
        }

        tokio::select! {
            _ = frames.tick() => {
                session.tick(started.elapsed());
            }
            Some(reply) = reply_rx.recv() => {
                let report = orchestrator.complete(reply, &mut session);
                println!("{}", report.message());
            }
            Some(completion) = asset_rx.recv() => {
                let outcome = session.complete_asset_load(completion.ticket, completion.result);
                if outcome == LoadOutcome::Applied {
                    log::info!("model ready for {}", completion.item_id);
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("reading stdin")? {
                    Some(line) => {
                        if !handle_line(&line, &mut session, &mut orchestrator, &reply_tx)? {
                            break;
                        }
                    }
                    None => stdin_open = false,
                }
            }
        }

        if !stdin_open && orchestrator.in_flight() == 0 {
            break;
        }
    }

    session.tick(started.elapsed() + config.timing().animation);
    if let Some(path) = &args.state_json {
        let json = serde_json::to_string_pretty(&session.state().describe())?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

/// Returns `false` when the host should exit.
fn handle_line(
    line: &str,
    session: &mut Session,
    orchestrator: &mut Orchestrator,
    replies: &mpsc::UnboundedSender<ServiceReply>,
) -> Result<bool> {
    let command = match HostCommand::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return Ok(true),
        Err(err) => {
            println!("{err}");
            return Ok(true);
        }
    };

    match command {
        HostCommand::Instruction(text) => {
            if let Some(pending) = orchestrator.begin(&text, session) {
                println!("Thinking...");
                orchestrator.spawn(pending, replies.clone());
            }
        }
        HostCommand::Undo(id) => {
            if !session.state().contains(&id) {
                println!("no item named {id}");
            } else if session.undo(&id) {
                println!("restored {id}");
            } else {
                println!("nothing to undo for {id}");
            }
        }
        HostCommand::Swap(id) => match session.swap(&id) {
            Some(variant) => println!(
                "{id} is now {} ({} x {} x {} m)",
                variant.label, variant.width, variant.depth, variant.height
            ),
            None => println!("{id} has no other variants"),
        },
        HostCommand::View(name) => {
            if !session.transition_to_view(&name) {
                let names: Vec<&str> = viewpoint_names().collect();
                println!("unknown view {name}; try {}", names.join(", "));
            }
        }
        HostCommand::Pick { x, z } => match session.pick(x, z) {
            Some(id) => println!("{id}"),
            None => println!("nothing at {x}, {z}"),
        },
        HostCommand::Describe => {
            if session.room_description().is_empty() {
                println!("(no description yet)");
            } else {
                println!("{}", session.room_description());
            }
        }
        HostCommand::State => {
            println!("{}", serde_json::to_string_pretty(&session.state().describe())?);
        }
        HostCommand::Help => println!("{HELP}"),
        HostCommand::Quit => return Ok(false),
    }
    Ok(true)
}
