//! Inspect command - fetch route files and report what they contain.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use flowlayer::config::FlowConfig;
use flowlayer::route::{ReqwestClient, RouteLoader};
use flowlayer::telemetry::FlowMetrics;
use flowlayer::trip::build_trips;

use crate::error::CliError;

/// Arguments for the inspect command.
pub struct InspectArgs {
    /// Route file URLs; falls back to the configured ones when empty.
    pub routes: Vec<String>,
}

/// Run the inspect command.
pub fn run(args: InspectArgs) -> Result<(), CliError> {
    let config = super::resolve_flow_config(args.routes)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(inspect(config))
}

async fn inspect(config: FlowConfig) -> Result<(), CliError> {
    let metrics = Arc::new(FlowMetrics::new());
    let http = Arc::new(ReqwestClient::with_timeout(config.http_timeout)?);
    let loader = RouteLoader::new(http, Arc::clone(&metrics));

    let paths = loader
        .load_routes(&config.route_files, &CancellationToken::new())
        .await?;

    let mut per_source: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for path in &paths {
        let entry = per_source.entry(path.source_index).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += path.vertices.len();
    }

    for (index, url) in config.route_files.iter().enumerate() {
        match per_source.get(&index) {
            Some((path_count, vertex_count)) => println!(
                "{}: {} paths, {} vertices",
                url, path_count, vertex_count
            ),
            None => println!("{}: no usable paths", url),
        }
    }

    let trips = build_trips(
        &paths,
        config.particles_per_route,
        config.trip_duration_ms,
        &config.palette,
    );
    let clock = config.loop_clock();
    println!();
    println!(
        "{} trips ({} particles per route), loop duration {:.0} ms",
        trips.len(),
        config.particles_per_route,
        clock.loop_duration_ms()
    );

    let snapshot = metrics.snapshot();
    if snapshot.route_files_failed > 0 {
        println!(
            "{} of {} files failed to load",
            snapshot.route_files_failed,
            config.route_files.len()
        );
    }
    Ok(())
}
