mod config;

use std::fs;
use std::path::PathBuf;

use catalog::{PlaceCatalog, PlaceId, classify};
use clap::{Parser, Subcommand, ValueEnum};
use enrichment::{EnrichmentCache, JsonFileStore, PopupRequests, Summary, WikipediaSource};
use formats::CountrySet;
use foundation::{Clock, LatLng, SystemClock};
use layers::{Choropleth, ChoroplethMode, ResultsList};
use runtime::{Input, MapSession, SessionConfig, to_query_string};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "snowmap", about = "Explore year-round snow locations")]
struct Cli {
    /// Place catalog (JSON array of {name, lat, lng}).
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    /// Country boundaries (GeoJSON FeatureCollection).
    #[arg(long, global = true)]
    countries: Option<PathBuf>,
    /// Summary cache file.
    #[arg(long, global = true)]
    cache: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the places visible for a shareable query string.
    Visible {
        /// Query string, e.g. `q=mont&regions=Europe`.
        #[arg(long)]
        url: Option<String>,
        /// Reference point for distance sorting, as LAT,LNG.
        #[arg(long, allow_hyphen_values = true)]
        near: Option<String>,
        #[arg(long, value_enum, default_value_t = ModeArg::Filtered)]
        mode: ModeArg,
        #[arg(long)]
        json: bool,
    },
    /// Alphabetical starting points.
    Suggestions {
        #[arg(long, default_value_t = 12)]
        limit: usize,
    },
    /// Classify a coordinate into a region.
    Region {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Look up a place summary through the local cache.
    Lookup {
        /// Free-form place name.
        #[arg(required_unless_present = "place")]
        name: Option<String>,
        /// Catalog id (as printed by `suggestions`); resolves like a marker popup.
        #[arg(long, conflicts_with = "name")]
        place: Option<u32>,
    },
    /// Remove expired summary cache entries.
    PurgeCache,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Filtered,
    Catalog,
}

impl From<ModeArg> for ChoroplethMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Filtered => ChoroplethMode::Filtered,
            ModeArg::Catalog => ChoroplethMode::Catalog,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(path) = cli.catalog {
        config.catalog_path = path;
    }
    if let Some(path) = cli.countries {
        config.countries_path = Some(path);
    }
    if let Some(path) = cli.cache {
        config.cache_path = path;
    }
    tracing::debug!(?config, "configuration");

    match cli.command {
        Command::Visible {
            url,
            near,
            mode,
            json,
        } => cmd_visible(&config, url.as_deref(), near.as_deref(), mode.into(), json),
        Command::Suggestions { limit } => cmd_suggestions(&config, limit),
        Command::Region { lat, lng } => cmd_region(lat, lng),
        Command::Lookup { name, place } => cmd_lookup(&config, name.as_deref(), place),
        Command::PurgeCache => cmd_purge_cache(&config),
    }
}

fn load_catalog(config: &Config) -> Result<PlaceCatalog, String> {
    PlaceCatalog::load(&config.catalog_path).map_err(|e| e.to_string())
}

fn load_countries(config: &Config) -> Option<Result<CountrySet, String>> {
    let path = config.countries_path.as_ref()?;
    Some(
        fs::read_to_string(path)
            .map_err(|e| format!("read {}: {e}", path.display()))
            .and_then(|text| CountrySet::from_geojson_str(&text).map_err(|e| e.to_string())),
    )
}

#[derive(Debug, Serialize)]
struct VisibleReport<'a> {
    results: &'a ResultsList,
    choropleth: Option<&'a Choropleth>,
    url: String,
    notices: Vec<String>,
}

fn cmd_visible(
    config: &Config,
    url: Option<&str>,
    near: Option<&str>,
    mode: ChoroplethMode,
    json: bool,
) -> Result<(), String> {
    let reference = near.map(parse_lat_lng).transpose()?;
    let catalog = load_catalog(config)?;

    let session_config = SessionConfig {
        url_debounce_ms: config.url_debounce_ms,
        choropleth_mode: mode,
        ..SessionConfig::default()
    };
    let clock = SystemClock;
    let mut session = MapSession::new(catalog, session_config);
    let mut pass = session.start(url, clock.now_ms());

    match load_countries(config) {
        Some(Ok(set)) => pass = session.apply(Input::CountriesLoaded(set), clock.now_ms()),
        Some(Err(reason)) => pass = session.apply(Input::CountriesFailed(reason), clock.now_ms()),
        None => {}
    }
    if let Some(p) = reference {
        pass = session.apply(Input::Geolocated(p), clock.now_ms());
    }

    let url = to_query_string(&session.state().url_state());
    let notices: Vec<String> = session
        .drain_events()
        .into_iter()
        .map(|e| e.message)
        .collect();

    if json {
        let report = VisibleReport {
            results: &pass.results,
            choropleth: pass.choropleth.as_ref(),
            url,
            notices,
        };
        let text = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{text}");
        return Ok(());
    }

    for notice in &notices {
        eprintln!("note: {notice}");
    }
    println!("{}", pass.results.summary());
    for entry in &pass.results.entries {
        println!("  {}", entry.label());
    }
    if let Some(choropleth) = &pass.choropleth {
        println!("countries:");
        for entry in choropleth.entries.iter().filter(|e| e.count > 0) {
            println!("  {:<32} {:>4}  {}", entry.name, entry.count, entry.style().color);
        }
    }
    println!("?{url}");
    Ok(())
}

fn cmd_suggestions(config: &Config, limit: usize) -> Result<(), String> {
    let catalog = load_catalog(config)?;
    for id in catalog.suggestions(limit) {
        if let Some(place) = catalog.get(id) {
            println!("{:>4}  {}", id.0, place.name);
        }
    }
    Ok(())
}

fn cmd_region(lat: f64, lng: f64) -> Result<(), String> {
    let p = LatLng::new(lat, lng);
    if !p.is_valid() {
        return Err(format!("coordinate out of range: {lat},{lng}"));
    }
    println!("{}", classify(lat, lng));
    Ok(())
}

fn cmd_lookup(config: &Config, name: Option<&str>, place: Option<u32>) -> Result<(), String> {
    let source = WikipediaSource::new(&config.summary_url, config.http_timeout())
        .map_err(|e| e.to_string())?;
    let store = JsonFileStore::open(&config.cache_path).map_err(|e| e.to_string())?;
    let mut cache =
        EnrichmentCache::new(source, store, SystemClock).with_ttl_ms(config.cache_ttl_ms());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| e.to_string())?;

    let (label, summary) = match (place, name) {
        (Some(raw), _) => {
            let catalog = load_catalog(config)?;
            let id = PlaceId(raw);
            let place = catalog
                .get(id)
                .ok_or_else(|| format!("no place with id {raw}"))?;

            let mut requests = PopupRequests::new();
            let token = requests.begin(id);
            let summary = rt
                .block_on(cache.lookup(&place.name))
                .and_then(|summary| requests.accept(token, summary))
                .map(|(_, summary)| summary);
            (place.name.clone(), summary)
        }
        (None, Some(name)) => (name.to_string(), rt.block_on(cache.lookup(name))),
        (None, None) => return Err("lookup needs a NAME or --place ID".to_string()),
    };

    match summary {
        Some(summary) => print_summary(&summary),
        None => println!("no summary for {label:?}"),
    }
    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("{}", summary.title);
    if let Some(blurb) = summary.blurb() {
        println!("{blurb}");
    }
    if let Some(url) = &summary.page_url {
        println!("{url}");
    }
}

fn cmd_purge_cache(config: &Config) -> Result<(), String> {
    let store = JsonFileStore::open(&config.cache_path).map_err(|e| e.to_string())?;
    let source = WikipediaSource::new(&config.summary_url, config.http_timeout())
        .map_err(|e| e.to_string())?;
    let mut cache =
        EnrichmentCache::new(source, store, SystemClock).with_ttl_ms(config.cache_ttl_ms());
    let removed = cache.purge_expired().map_err(|e| e.to_string())?;
    println!("removed {removed} expired entries");
    Ok(())
}

fn parse_lat_lng(s: &str) -> Result<LatLng, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got {s:?}"))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("bad latitude: {lat:?}"))?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("bad longitude: {lng:?}"))?;
    let p = LatLng::new(lat, lng);
    if !p.is_valid() {
        return Err(format!("coordinate out of range: {s}"));
    }
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, parse_lat_lng};
    use clap::Parser;
    use foundation::LatLng;

    #[test]
    fn parses_reference_points() {
        assert_eq!(parse_lat_lng("-33.4, -70.6").unwrap(), LatLng::new(-33.4, -70.6));
        assert!(parse_lat_lng("91,0").is_err());
        assert!(parse_lat_lng("north").is_err());
    }

    #[test]
    fn region_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["snowmap", "region", "-77.8", "166.7"]).unwrap();
        match cli.command {
            Command::Region { lat, lng } => assert_eq!((lat, lng), (-77.8, 166.7)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn lookup_takes_a_name_or_a_place_id() {
        let cli = Cli::try_parse_from(["snowmap", "lookup", "--place", "3"]).unwrap();
        match cli.command {
            Command::Lookup { name, place } => assert_eq!((name, place), (None, Some(3))),
            other => panic!("unexpected command: {other:?}"),
        }
        let cli = Cli::try_parse_from(["snowmap", "lookup", "Denali"]).unwrap();
        match cli.command {
            Command::Lookup { name, place } => {
                assert_eq!((name.as_deref(), place), (Some("Denali"), None))
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["snowmap", "lookup"]).is_err());
        assert!(Cli::try_parse_from(["snowmap", "lookup", "Denali", "--place", "1"]).is_err());
    }
}
