use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use scroll_uuid::{Direction, ScrollError, UuidIndex};

mod config;

use config::ServerConfig;

type ApiError = (StatusCode, String);

/// Application state shared across REST API handlers
#[derive(Clone)]
struct AppState {
    config: ServerConfig,
}

/// Health status of the service
#[derive(Debug, Serialize, Deserialize, ToSchema)]
struct HealthRes {
    ok: bool,
    message: String,
}

/// One position in the enumeration
///
/// Indexes are decimal strings because they exceed the precision of JSON numbers.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
struct UuidEntry {
    index: String,
    uuid: String,
}

impl UuidEntry {
    fn new(index: UuidIndex, uuid: String) -> Self {
        Self {
            index: index.to_string(),
            uuid,
        }
    }

    fn at(index: UuidIndex) -> Self {
        Self::new(index, scroll_uuid::index_to_uuid(index))
    }
}

/// Consecutive UUIDs starting at the requested index
#[derive(Debug, Serialize, Deserialize, ToSchema)]
struct PageRes {
    items: Vec<UuidEntry>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct PageQuery {
    /// First index (decimal, default 0)
    start: Option<String>,
    /// Number of UUIDs (default 20)
    count: Option<usize>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct SearchQuery {
    /// Fragment to look for: hex digits and hyphens
    q: String,
    /// Index to search from, exclusive (decimal, default 0)
    from: Option<String>,
    /// `forward` (default) or `backward`
    direction: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, uuid_page, uuid_at, index_of, search, random),
    components(schemas(HealthRes, UuidEntry, PageRes))
)]
struct ApiDoc;

const DEFAULT_PAGE: usize = 20;

/// Main entry point for the UUID scroll service
///
/// Serves the REST API on `UUID_SCROLL_REST_ADDR` (default "0.0.0.0:3000"). See
/// [`ServerConfig::from_env`] for the other environment variables.
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scroll_run=info".parse()?)
                .add_directive("scroll_uuid=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Derive the key matrix before serving so no request pays for it.
    scroll_uuid::init();

    tracing::info!("++ Starting UUID scroll REST on {}", config.rest_addr());

    let listener = tokio::net::TcpListener::bind(config.rest_addr()).await?;
    axum::serve(listener, app(AppState { config })).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/uuids", get(uuid_page))
        .route("/uuids/:index", get(uuid_at))
        .route("/indexes/:uuid", get(index_of))
        .route("/search", get(search))
        .route("/random", get(random))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn bad_request(error: ScrollError) -> ApiError {
    (StatusCode::BAD_REQUEST, error.to_string())
}

fn parse_index(value: Option<&str>) -> Result<UuidIndex, ApiError> {
    value
        .map(str::parse::<UuidIndex>)
        .transpose()
        .map(Option::unwrap_or_default)
        .map_err(bad_request)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "UUID scroll is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/uuids",
    params(PageQuery),
    responses(
        (status = 200, description = "Consecutive UUIDs", body = PageRes),
        (status = 400, description = "Invalid start index or page size")
    )
)]
/// List consecutive UUIDs
///
/// Returns `count` UUIDs starting at `start`, wrapping past the last index back to 0.
async fn uuid_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageRes>, ApiError> {
    let start = parse_index(query.start.as_deref())?;
    let count = query.count.unwrap_or(DEFAULT_PAGE);
    if count > state.config.max_page() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("count must be at most {}", state.config.max_page()),
        ));
    }

    let items = scroll_uuid::uuid_page(start, count)
        .into_iter()
        .map(|(index, uuid)| UuidEntry::new(index, uuid))
        .collect();
    Ok(Json(PageRes { items }))
}

#[utoipa::path(
    get,
    path = "/uuids/{index}",
    params(("index" = String, Path, description = "Decimal index in [0, 2^122)")),
    responses(
        (status = 200, description = "UUID at the index", body = UuidEntry),
        (status = 400, description = "Invalid index")
    )
)]
/// Get the UUID at an index
async fn uuid_at(Path(index): Path<String>) -> Result<Json<UuidEntry>, ApiError> {
    let index = parse_index(Some(&index))?;
    Ok(Json(UuidEntry::at(index)))
}

#[utoipa::path(
    get,
    path = "/indexes/{uuid}",
    params(("uuid" = String, Path, description = "Version 4 UUID in 8-4-4-4-12 form")),
    responses(
        (status = 200, description = "Index of the UUID", body = UuidEntry),
        (status = 400, description = "Invalid UUID")
    )
)]
/// Get the index of a UUID
async fn index_of(Path(uuid): Path<String>) -> Result<Json<UuidEntry>, ApiError> {
    let index = scroll_uuid::uuid_to_index(&uuid).map_err(bad_request)?;
    Ok(Json(UuidEntry::at(index)))
}

#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Nearest matching UUID", body = UuidEntry),
        (status = 400, description = "Invalid start index or direction"),
        (status = 404, description = "No UUID can contain the query"),
        (status = 422, description = "Scan limit reached before a match")
    )
)]
/// Find the next UUID containing a fragment
///
/// Searches strictly after (`forward`) or before (`backward`) the `from` index.
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<UuidEntry>, ApiError> {
    let from = parse_index(query.from.as_deref())?;
    let direction = query
        .direction
        .as_deref()
        .map(str::parse::<Direction>)
        .transpose()
        .map_err(bad_request)?
        .unwrap_or_default();

    match scroll_uuid::find_next_index_with(&query.q, from, direction, state.config.search()) {
        Ok(Some(index)) => Ok(Json(UuidEntry::at(index))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            format!("no UUID can contain '{}'", query.q),
        )),
        Err(e @ ScrollError::ScanLimitExceeded { .. }) => {
            tracing::warn!("Search error: {:?}", e);
            Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
        Err(e) => Err(bad_request(e)),
    }
}

#[utoipa::path(
    get,
    path = "/random",
    responses(
        (status = 200, description = "UUID at a random index", body = UuidEntry)
    )
)]
/// Jump to a random index
async fn random() -> Json<UuidEntry> {
    let index = scroll_uuid::random_index(&mut rand::thread_rng());
    Json(UuidEntry::at(index))
}
