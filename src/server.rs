// src/server.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, convert::Infallible, net::SocketAddr, sync::Arc};
use tracing::{debug, info, warn};
use warp::{
    http::StatusCode,
    reject::Rejection,
    reply::{Reply, Response},
    Filter,
};

use crate::{
    chart::ChartSettings,
    config::{DashboardConfig, DashboardDefaults, YearRange},
    data::ContractTable,
    query::Filters,
    view::{compute_view, Controls},
};

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<ContractTable>,
    pub defaults: DashboardDefaults,
    pub chart: ChartSettings,
    pub years: YearRange,
}

impl AppState {
    pub fn new(table: Arc<ContractTable>, cfg: &DashboardConfig) -> Self {
        Self {
            table,
            defaults: cfg.defaults.clone(),
            chart: cfg.chart.clone(),
            years: cfg.year_range.clone(),
        }
    }
}

/// Body of `POST /api/view`. Absent fields fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ViewRequest {
    pub city: Option<String>,
    pub min_year: Option<i32>,
    pub entities: Option<Vec<String>>,
}

impl ViewRequest {
    fn into_filters(self, defaults: &DashboardDefaults) -> Filters {
        Filters::new(
            self.city.unwrap_or_else(|| defaults.city.clone()),
            self.min_year.unwrap_or(defaults.min_year),
            self.entities.unwrap_or_else(|| defaults.entities.clone()),
        )
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    details: Option<String>,
}

/// Parse `city=..&min_year=..&entity=..&entity=..`. Repeated `entity` keys
/// build the set; a lone empty `entity=` selects nothing; no `entity` key at
/// all keeps the default selection.
pub fn filters_from_query(raw: &str, defaults: &DashboardDefaults) -> Result<Filters> {
    let mut req = ViewRequest::default();
    let mut entities: Option<BTreeSet<String>> = None;

    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        match &*key {
            "city" => req.city = Some(value.into_owned()),
            "min_year" | "year" => {
                let year = value
                    .trim()
                    .parse::<i32>()
                    .with_context(|| format!("min_year `{}` is not an integer", value))?;
                req.min_year = Some(year);
            }
            "entity" => {
                let set = entities.get_or_insert_with(BTreeSet::new);
                if !value.trim().is_empty() {
                    set.insert(value.into_owned());
                }
            }
            other => debug!(key = other, "ignoring query parameter"),
        }
    }
    req.entities = entities.map(|s| s.into_iter().collect());
    Ok(req.into_filters(defaults))
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn view_reply(state: &AppState, filters: &Filters) -> Response {
    let view = compute_view(&state.table, filters, &state.chart);
    debug!(city = %filters.city, rows = view.rows.len(), "view computed");
    warp::reply::json(&view).into_response()
}

fn error_reply(status: StatusCode, error: &str, details: Option<String>) -> Response {
    warp::reply::with_status(
        warp::reply::json(&ErrorResponse {
            error: error.to_string(),
            details,
        }),
        status,
    )
    .into_response()
}

async fn health_check() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "agrodash"
    })))
}

async fn controls(state: AppState) -> Result<impl Reply, Rejection> {
    let controls = Controls::new(&state.table, &state.defaults, &state.years);
    Ok(warp::reply::json(&controls))
}

async fn view_from_query(raw: String, state: AppState) -> Result<Response, Rejection> {
    match filters_from_query(&raw, &state.defaults) {
        Ok(filters) => Ok(view_reply(&state, &filters)),
        Err(e) => {
            warn!("bad view query `{}`: {:#}", raw, e);
            Ok(error_reply(
                StatusCode::BAD_REQUEST,
                "invalid filters",
                Some(format!("{:#}", e)),
            ))
        }
    }
}

async fn view_from_body(req: ViewRequest, state: AppState) -> Result<Response, Rejection> {
    let filters = req.into_filters(&state.defaults);
    Ok(view_reply(&state, &filters))
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "not found", None));
    }
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            "invalid request body",
            Some(e.to_string()),
        ));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            "method not allowed",
            None,
        ));
    }
    warn!("unhandled rejection: {:?}", err);
    Ok(error_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal error",
        Some(format!("{:?}", err)),
    ))
}

/// All dashboard routes.
pub fn routes(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML));

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let controls = warp::path!("api" / "controls")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(controls);

    // no query string at all is the same as an empty one
    let raw_query = warp::query::raw()
        .or(warp::any().map(String::new))
        .unify();
    let view_get = warp::path!("api" / "view")
        .and(warp::get())
        .and(raw_query)
        .and(with_state(state.clone()))
        .and_then(view_from_query);

    let view_post = warp::path!("api" / "view")
        .and(warp::post())
        .and(warp::body::content_length_limit(64 * 1024))
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(view_from_body);

    index
        .or(health)
        .or(controls)
        .or(view_get)
        .or(view_post)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

/// Serve the dashboard until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) {
    info!(
        rows = state.table.len(),
        "dashboard listening on http://{}",
        addr
    );
    warp::serve(routes(state)).run(addr).await;
}
