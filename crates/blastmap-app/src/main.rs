use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use reqwest::Client;
use tokio::runtime::Handle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use blastmap_app::config::{Cli, Command, SimulateArgs};
use blastmap_app::report::SimulationReport;
use blastmap_app::sources::{OpenTopoDataSource, OverpassClient};
use blastmap_app::state::{AppState, GameLoopCommand};
use blastmap_core::commands::SimCommand;
use blastmap_core::events::SimEvent;
use blastmap_core::types::BoundingBox;
use blastmap_features::{classify, ClassifiedFeatures, ElementCollection, FeatureQuery};
use blastmap_terrain::ElevationSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let client = Client::new();

    match &cli.command {
        Command::Classify { input } => classify_file(input)?,
        Command::Fetch { bbox, timeout } => {
            let features = fetch_features(&client, &cli.overpass_url(), *bbox, *timeout).await?;
            println!("{}", serde_json::to_string_pretty(&features.counts())?);
        }
        Command::Simulate(args) => simulate(&client, &cli, args).await?,
    }

    Ok(())
}

fn classify_file(input: &Path) -> Result<(), Box<dyn Error>> {
    let text = std::fs::read_to_string(input)?;
    let elements = ElementCollection::from_json(&text)?;
    let features = classify(&elements);
    info!(
        elements = elements.len(),
        features = features.len(),
        "classified {}",
        input.display()
    );
    println!("{}", serde_json::to_string_pretty(&features)?);
    Ok(())
}

async fn fetch_features(
    client: &Client,
    overpass_url: &str,
    bbox: BoundingBox,
    timeout: u32,
) -> Result<ClassifiedFeatures, Box<dyn Error>> {
    let overpass = OverpassClient::new(client.clone(), overpass_url);
    let query = FeatureQuery::for_bbox(bbox).with_timeout(timeout);
    let elements = overpass.fetch(&query).await?;
    let features = classify(&elements);
    info!(
        elements = elements.len(),
        features = features.len(),
        "fetched region features"
    );
    Ok(features)
}

async fn simulate(client: &Client, cli: &Cli, args: &SimulateArgs) -> Result<(), Box<dyn Error>> {
    let features = fetch_features(client, &cli.overpass_url(), args.bbox, 25).await?;
    let elevation: Arc<dyn ElevationSource> =
        Arc::new(OpenTopoDataSource::new(client.clone(), cli.elevation_url()));

    let state = AppState::new();
    state.start(args.sim_config(), Handle::current(), elevation)?;
    let send = |command: GameLoopCommand| -> Result<(), Box<dyn Error>> {
        if state.send(command) {
            Ok(())
        } else {
            Err("game loop is not running".into())
        }
    };

    send(GameLoopCommand::SetScene(args.bbox))?;
    send(GameLoopCommand::LoadFeatures(features.clone()))?;
    if !args.flat {
        send(GameLoopCommand::BuildTerrain(args.terrain_config()))?;
        wait_for_terrain(&state, Duration::from_secs(args.terrain_timeout)).await;
    }

    let target = args.target();
    send(GameLoopCommand::Sim(SimCommand::SimulateImpact {
        weapon: args.weapon(),
        lat: target.lat,
        lon: target.lon,
    }))?;
    tokio::time::sleep(Duration::from_secs_f64(args.duration.max(0.0))).await;

    let snapshot = state.snapshot().unwrap_or_default();
    state.stop();

    let report = SimulationReport::new(&features, snapshot, state.events());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Wait until the terrain build was applied or rejected. On timeout the
/// simulation continues on whatever terrain is live.
async fn wait_for_terrain(state: &AppState, timeout: Duration) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        let settled = state.events().iter().any(|e| {
            matches!(
                e,
                SimEvent::TerrainApplied { .. } | SimEvent::TerrainRejected { .. }
            )
        });
        if settled {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    warn!(?timeout, "terrain build did not finish, simulating on current terrain");
}
