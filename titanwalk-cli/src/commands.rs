//! CLI command handlers.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use titanwalk::auth::{Credentials, OperatingMode, StaticVerifier};
use titanwalk::campus::CAMPUS_SEED;
use titanwalk::coord::GeoPoint;
use titanwalk::engine::{EngineConfig, EngineEvent, Mutation, MutationOutcome, NavigationEngine};
use titanwalk::position::{FixedSource, PositionSource, ScriptedSource};
use titanwalk::route::{OsrmDirections, ReqwestClient, RouteSnapshot};

use crate::error::CliError;
use crate::{Cli, Command};

/// The observed system's map center; placeholder position for commands
/// that never consume a fix.
const CAMPUS_CENTER: GeoPoint = GeoPoint {
    latitude: 33.883121,
    longitude: -117.886101,
};

/// How long to wait for the first position fix.
const FIRST_FIX_TIMEOUT: Duration = Duration::from_secs(10);

type Engine<S> = NavigationEngine<OsrmDirections<ReqwestClient>, S>;

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List { username, password } => list(&cli.router_url, username.zip(password)),
        Command::Search { query } => search(&cli.router_url, &query),
        Command::Route { name, from } => route(&cli.router_url, &name, &from).await,
        Command::Walk {
            name,
            path,
            interval_ms,
        } => walk(&cli.router_url, &name, &path, interval_ms).await,
        Command::Toggle {
            name,
            username,
            password,
        } => toggle(&cli.router_url, &name, username, password),
    }
}

fn build_engine<S: PositionSource>(router_url: &str, source: S) -> Result<Engine<S>, CliError> {
    let client = ReqwestClient::new().map_err(CliError::HttpClient)?;
    let provider = OsrmDirections::with_base_url(client, router_url);
    Ok(NavigationEngine::new(
        EngineConfig::default(),
        Box::new(StaticVerifier::default()),
        provider,
        source,
        &CAMPUS_SEED,
    ))
}

fn list(router_url: &str, credentials: Option<(String, String)>) -> Result<(), CliError> {
    let engine = build_engine(router_url, FixedSource::new(CAMPUS_CENTER))?;
    if let Some((username, password)) = credentials {
        engine.login(Credentials::new(username, password))?;
    }

    let locations = engine.locations();
    println!("{} locations:", locations.len());
    for location in locations {
        let status = if location.accessible { "open" } else { "closed" };
        println!(
            "  {:<30} {}  [{}] {}",
            location.name, location.position, location.category, status
        );
    }
    Ok(())
}

fn search(router_url: &str, query: &str) -> Result<(), CliError> {
    let engine = build_engine(router_url, FixedSource::new(CAMPUS_CENTER))?;
    let location = engine.search_by_name(query)?;
    println!("{} ({})", location.name, location.position);
    Ok(())
}

async fn route(router_url: &str, name: &str, from: &str) -> Result<(), CliError> {
    let origin = parse_point(from)?;
    let engine = build_engine(router_url, FixedSource::new(origin))?;
    let mut events = engine.subscribe();
    engine.start();
    wait_for_first_fix(&mut events).await?;

    let location = engine.search_by_name(name)?;
    engine.select_destination(location.id).await?;

    if let Some(route) = engine.route() {
        println!("Walking route to {}:", location.name);
        print_route(&route);
    }
    Ok(())
}

async fn walk(
    router_url: &str,
    name: &str,
    path: &str,
    interval_ms: u64,
) -> Result<(), CliError> {
    let waypoints = parse_path(path)?;
    let source = ScriptedSource::new(waypoints.clone(), Duration::from_millis(interval_ms));
    let engine = build_engine(router_url, source)?;
    let mut events = engine.subscribe();
    engine.start();
    wait_for_first_fix(&mut events).await?;

    let location = engine.search_by_name(name)?;
    engine.select_destination(location.id).await?;
    println!("Walking to {} along {} waypoints", location.name, waypoints.len());

    // Follow published state until the scripted walk runs out.
    let mut fixes_seen = 1;
    let idle_limit = Duration::from_millis(interval_ms * 4 + 2000);
    while fixes_seen < waypoints.len() {
        match timeout(idle_limit, events.recv()).await {
            Ok(Ok(EngineEvent::PositionUpdated(fix))) => {
                fixes_seen += 1;
                println!("Position: {}", fix.point);
            }
            Ok(Ok(EngineEvent::RouteUpdated(Some(route)))) => {
                println!(
                    "Route updated: {:.0} {}, {:.0} min remaining",
                    route.distance, route.unit, route.duration_minutes
                );
            }
            Ok(Ok(EngineEvent::RouteUpdated(None))) => println!("Route cleared"),
            Ok(Ok(EngineEvent::Notice(message))) => println!("! {message}"),
            Ok(Ok(EngineEvent::LocationsChanged)) => {}
            _ => break,
        }
    }

    engine.clear_route();
    Ok(())
}

fn toggle(
    router_url: &str,
    name: &str,
    username: String,
    password: String,
) -> Result<(), CliError> {
    let engine = build_engine(router_url, FixedSource::new(CAMPUS_CENTER))?;
    engine.login(Credentials::new(username, password))?;
    let location = engine.search_by_name(name)?;
    engine.set_mode(OperatingMode::Edit)?;

    let outcome = engine.mutate(Mutation::ToggleAccessible(location.id))?;
    if let MutationOutcome::Toggled { accessible } = outcome {
        let status = if accessible { "open" } else { "closed" };
        println!("{} is now {status}", location.name);
    }
    Ok(())
}

fn print_route(route: &RouteSnapshot) {
    println!("  Distance: {:.0} {}", route.distance, route.unit);
    println!("  Expected travel time: {:.0} min", route.duration_minutes);
    if route.steps.is_empty() {
        println!("  No directions available.");
        return;
    }
    println!("  Directions:");
    for step in &route.steps {
        println!(
            "    -> {} ({:.0} {})",
            step.instruction, step.distance, route.unit
        );
    }
}

async fn wait_for_first_fix(events: &mut broadcast::Receiver<EngineEvent>) -> Result<(), CliError> {
    loop {
        match timeout(FIRST_FIX_TIMEOUT, events.recv()).await {
            Ok(Ok(EngineEvent::PositionUpdated(_))) => return Ok(()),
            Ok(Ok(EngineEvent::Notice(message))) => println!("! {message}"),
            Ok(Ok(_)) => continue,
            _ => return Err(CliError::NoPositionFix),
        }
    }
}

/// Parse a "lat,lon" pair.
fn parse_point(input: &str) -> Result<GeoPoint, CliError> {
    let (lat, lon) = input
        .split_once(',')
        .ok_or_else(|| CliError::InvalidArgument(format!("expected \"lat,lon\", got {input:?}")))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("bad latitude {lat:?}")))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("bad longitude {lon:?}")))?;
    Ok(GeoPoint::new(latitude, longitude)?)
}

/// Parse a "lat,lon;lat,lon;..." waypoint list.
fn parse_path(input: &str) -> Result<Vec<GeoPoint>, CliError> {
    let waypoints: Vec<GeoPoint> = input
        .split(';')
        .filter(|s| !s.trim().is_empty())
        .map(parse_point)
        .collect::<Result<_, _>>()?;
    if waypoints.is_empty() {
        return Err(CliError::InvalidArgument(
            "path must contain at least one waypoint".into(),
        ));
    }
    Ok(waypoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        let point = parse_point("33.8800, -117.8850").unwrap();
        assert_eq!(point.latitude, 33.8800);
        assert_eq!(point.longitude, -117.8850);

        assert!(parse_point("33.88").is_err());
        assert!(parse_point("north,west").is_err());
        assert!(parse_point("91.0,0.0").is_err());
    }

    #[test]
    fn test_parse_path() {
        let waypoints = parse_path("33.88,-117.88;33.881,-117.885").unwrap();
        assert_eq!(waypoints.len(), 2);

        assert!(parse_path("").is_err());
        assert!(parse_path(";;").is_err());
    }
}
