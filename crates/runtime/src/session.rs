//! Map session: one explicit state value and a single update-and-render step.
//!
//! Every input mutates `SessionState` and is followed by exactly one render
//! pass. A pass computes the visible set once and builds every view (markers,
//! results, choropleth, URL) from that same sequence, so no view can lag
//! behind another.

use std::collections::BTreeSet;
use std::fmt;

use catalog::{PlaceCatalog, PlaceId, Region};
use formats::{CountryId, CountrySet};
use foundation::{GeoBounds, LatLng, TimestampMs};
use layers::{
    Choropleth, ChoroplethMode, FilterState, MarkerLayer, ResultsList, VisiblePlace,
    compute_visible,
};
use tracing::debug;

use crate::debounce::Debouncer;
use crate::event_bus::{Event, EventBus, NoticeKind};
use crate::url_state::{MapView, UrlState, parse_query_string, to_query_string};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period before a search-text change reaches the URL.
    pub url_debounce_ms: u64,
    /// Zoom used when focusing a place from the results or suggestions.
    pub focus_zoom: u8,
    /// Zoom used when centering on the user's location.
    pub locate_zoom: u8,
    pub default_view: MapView,
    pub choropleth_mode: ChoroplethMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url_debounce_ms: 300,
            focus_zoom: 6,
            locate_zoom: 5,
            default_view: MapView::default(),
            choropleth_mode: ChoroplethMode::Filtered,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub regions: BTreeSet<Region>,
    pub query: String,
    pub view: MapView,
    /// Last bounds reported by the map; only filters when `within_viewport`.
    pub map_bounds: Option<GeoBounds>,
    pub within_viewport: bool,
    pub reference_point: Option<LatLng>,
    pub country: Option<CountryId>,
    pub choropleth_mode: ChoroplethMode,
}

impl SessionState {
    fn new(config: &SessionConfig) -> Self {
        Self {
            regions: Region::ALL.into_iter().collect(),
            query: String::new(),
            view: config.default_view,
            map_bounds: None,
            within_viewport: false,
            reference_point: None,
            country: None,
            choropleth_mode: config.choropleth_mode,
        }
    }

    pub fn filter_state(&self) -> FilterState {
        FilterState {
            active_regions: self.regions.clone(),
            query: self.query.clone(),
            viewport_bounds: if self.within_viewport {
                self.map_bounds
            } else {
                None
            },
            reference_point: self.reference_point,
            country: self.country.clone(),
        }
    }

    pub fn url_state(&self) -> UrlState {
        UrlState {
            query: self.query.trim().to_string(),
            regions: self.regions.clone(),
            view: self.view,
            within_viewport: self.within_viewport,
            country: self.country.clone(),
        }
    }

    fn apply_url_state(&mut self, url: UrlState) {
        self.query = url.query;
        self.regions = url.regions;
        self.view = url.view;
        self.within_viewport = url.within_viewport;
        self.country = url.country;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unsupported,
}

impl fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeolocationError::PermissionDenied => write!(f, "location access was denied"),
            GeolocationError::PositionUnavailable => {
                write!(f, "your location could not be determined")
            }
            GeolocationError::Timeout => write!(f, "locating timed out"),
            GeolocationError::Unsupported => {
                write!(f, "geolocation is not supported by this browser")
            }
        }
    }
}

impl std::error::Error for GeolocationError {}

/// User or loader input; each one triggers exactly one render pass.
#[derive(Debug, Clone)]
pub enum Input {
    SetRegion(Region, bool),
    SetRegions(BTreeSet<Region>),
    SetQuery(String),
    MapMoved {
        center: LatLng,
        zoom: u8,
        bounds: GeoBounds,
    },
    SetWithinViewport(bool),
    /// Selects the country under the click; clicking the selected country
    /// again, or clicking outside every country, clears the selection.
    CountryClicked(LatLng),
    ClearCountry,
    Geolocated(LatLng),
    GeolocationFailed(GeolocationError),
    ClearReferencePoint,
    CountriesLoaded(CountrySet),
    CountriesFailed(String),
    SetChoroplethMode(ChoroplethMode),
    /// Replaces the URL-backed fields with a query string (e.g. history
    /// navigation); fields the string omits return to their defaults.
    ApplyUrl(String),
}

/// New query string for the host to put in place of the current history
/// entry (`history.replaceState`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlUpdate {
    pub query: String,
}

impl UrlUpdate {
    pub fn as_search(&self) -> String {
        if self.query.is_empty() {
            String::new()
        } else {
            format!("?{}", self.query)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderPass {
    pub generation: u64,
    pub filter: FilterState,
    pub visible: Vec<VisiblePlace>,
    pub markers: MarkerLayer,
    pub results: ResultsList,
    /// `None` while country boundaries are unavailable.
    pub choropleth: Option<Choropleth>,
    pub url_update: Option<UrlUpdate>,
}

/// Map command produced by focusing a place.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Focus {
    pub id: PlaceId,
    pub view: MapView,
    /// Whether the place has a marker in the latest pass to open a popup on.
    pub open_popup: bool,
}

#[derive(Debug)]
struct UrlSync {
    debounce: Debouncer<String>,
    last_written: Option<String>,
}

impl UrlSync {
    fn new(debounce_ms: u64) -> Self {
        Self {
            debounce: Debouncer::new(debounce_ms),
            last_written: None,
        }
    }

    fn on_change(&mut self, query: String, debounced: bool, now: TimestampMs) -> Option<UrlUpdate> {
        if debounced {
            if self.last_written.as_deref() == Some(query.as_str()) {
                self.debounce.cancel();
            } else {
                self.debounce.schedule(query, now);
            }
            return None;
        }
        // The fresh string already carries any pending text change.
        self.debounce.cancel();
        self.write(query)
    }

    fn poll(&mut self, now: TimestampMs) -> Option<UrlUpdate> {
        let query = self.debounce.poll(now)?;
        self.write(query)
    }

    fn write(&mut self, query: String) -> Option<UrlUpdate> {
        if self.last_written.as_deref() == Some(query.as_str()) {
            return None;
        }
        self.last_written = Some(query.clone());
        Some(UrlUpdate { query })
    }
}

pub struct MapSession {
    catalog: PlaceCatalog,
    countries: Option<CountrySet>,
    config: SessionConfig,
    state: SessionState,
    generation: u64,
    last_visible: BTreeSet<PlaceId>,
    url: UrlSync,
    bus: EventBus,
}

impl MapSession {
    pub fn new(catalog: PlaceCatalog, config: SessionConfig) -> Self {
        let state = SessionState::new(&config);
        let url = UrlSync::new(config.url_debounce_ms);
        Self {
            catalog,
            countries: None,
            config,
            state,
            generation: 0,
            last_visible: BTreeSet::new(),
            url,
            bus: EventBus::new(),
        }
    }

    /// Initial paint. The page URL, when given, is applied once first.
    pub fn start(&mut self, initial_query: Option<&str>, now: TimestampMs) -> RenderPass {
        if let Some(query) = initial_query {
            let url = parse_query_string(query, &self.url_defaults());
            self.state.apply_url_state(url);
        }
        self.render(false, now)
    }

    pub fn apply(&mut self, input: Input, now: TimestampMs) -> RenderPass {
        let debounced = matches!(input, Input::SetQuery(_));
        self.reduce(input);
        self.render(debounced, now)
    }

    /// Flushes a debounced URL update whose quiet period has elapsed.
    pub fn poll_url(&mut self, now: TimestampMs) -> Option<UrlUpdate> {
        self.url.poll(now)
    }

    /// Centers on a place by id. The resulting pan comes back as `MapMoved`.
    pub fn focus(&self, id: PlaceId) -> Option<Focus> {
        let place = self.catalog.get(id)?;
        Some(Focus {
            id,
            view: MapView::new(place.position(), self.config.focus_zoom),
            open_popup: self.last_visible.contains(&id),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn catalog(&self) -> &PlaceCatalog {
        &self.catalog
    }

    pub fn countries(&self) -> Option<&CountrySet> {
        self.countries.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn events(&self) -> &[Event] {
        self.bus.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.bus.drain()
    }

    /// Base that parsed URLs are read onto.
    fn url_defaults(&self) -> UrlState {
        UrlState {
            view: self.config.default_view,
            ..UrlState::default()
        }
    }

    fn reduce(&mut self, input: Input) {
        let next_generation = self.generation + 1;
        match input {
            Input::SetRegion(region, on) => {
                if on {
                    self.state.regions.insert(region);
                } else {
                    self.state.regions.remove(&region);
                }
            }
            Input::SetRegions(regions) => self.state.regions = regions,
            Input::SetQuery(text) => self.state.query = text,
            Input::MapMoved {
                center,
                zoom,
                bounds,
            } => {
                self.state.view = MapView::new(center, zoom);
                self.state.map_bounds = Some(bounds);
            }
            Input::SetWithinViewport(on) => self.state.within_viewport = on,
            Input::CountryClicked(p) => {
                let Some(countries) = &self.countries else {
                    return;
                };
                let hit = countries.locate(p).map(|c| c.id.clone());
                self.state.country = match hit {
                    Some(id) if self.state.country.as_ref() == Some(&id) => None,
                    other => other,
                };
            }
            Input::ClearCountry => self.state.country = None,
            Input::Geolocated(p) => {
                self.state.reference_point = Some(p);
                self.state.view = MapView::new(p, self.config.locate_zoom);
            }
            Input::GeolocationFailed(err) => {
                self.bus.emit(
                    next_generation,
                    NoticeKind::Alert,
                    format!("Unable to sort by distance: {err}."),
                );
            }
            Input::ClearReferencePoint => self.state.reference_point = None,
            Input::CountriesLoaded(set) => self.countries = Some(set),
            Input::CountriesFailed(reason) => {
                self.countries = None;
                self.bus.emit(
                    next_generation,
                    NoticeKind::Degraded,
                    format!("country boundaries unavailable: {reason}"),
                );
            }
            Input::SetChoroplethMode(mode) => self.state.choropleth_mode = mode,
            Input::ApplyUrl(query) => {
                let url = parse_query_string(&query, &self.url_defaults());
                self.state.apply_url_state(url);
            }
        }
    }

    fn render(&mut self, debounced: bool, now: TimestampMs) -> RenderPass {
        self.generation += 1;

        let filter = self.state.filter_state();
        let visible = compute_visible(&self.catalog, &filter, self.countries.as_ref());
        let markers = MarkerLayer::build(&self.catalog, &visible);
        let results = ResultsList::build(&self.catalog, &visible);
        let choropleth = self.countries.as_ref().map(|set| {
            Choropleth::build(&self.catalog, &visible, set, self.state.choropleth_mode)
        });
        self.last_visible = visible.iter().map(|v| v.id).collect();

        let url_update = self
            .url
            .on_change(to_query_string(&self.state.url_state()), debounced, now);

        debug!(
            generation = self.generation,
            visible = visible.len(),
            url_changed = url_update.is_some(),
            "render pass"
        );

        RenderPass {
            generation: self.generation,
            filter,
            visible,
            markers,
            results,
            choropleth,
            url_update,
        }
    }
}
