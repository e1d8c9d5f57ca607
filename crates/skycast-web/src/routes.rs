use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use skycast_core::{AppError, Config};
use skycast_weather::{Archive, ForecastService, RetryConfig, WeatherClient};
use warp::http::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE, LOCATION, SET_COOKIE};
use warp::http::StatusCode;
use warp::path::Tail;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::session::{Session, SessionStore, SESSION_COOKIE};
use crate::views;

/// Query parameter carrying the location on `/results`.
pub const LOCATION_PARAM: &str = "Country_Name";

/// Shared state for all handlers.
#[derive(Debug)]
pub struct AppState {
    pub service: ForecastService,
    pub sessions: SessionStore,
    pub background_color: String,
}

impl AppState {
    pub fn new(service: ForecastService, background_color: impl Into<String>) -> Self {
        Self {
            service,
            sessions: SessionStore::new(),
            background_color: background_color.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let client = WeatherClient::with_options(
            &config.upstream.base_url,
            Duration::from_secs(config.upstream.timeout_secs),
            RetryConfig::with_retries(config.upstream.max_retries),
        )
        .map_err(|e| AppError::Server(format!("Failed to build HTTP client: {}", e)))?;

        let service = ForecastService::new(
            client,
            Archive::new(&config.archive.directory),
            config.upstream.api_key.clone(),
        );

        Ok(Self::new(service, config.server.background_color.clone()))
    }
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// All SkyCast routes.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let home_route = warp::get()
        .and(warp::path::end())
        .and(warp::query::<HashMap<String, String>>())
        .and(with_state(state.clone()))
        .and_then(home);

    let results_route = warp::get()
        .and(warp::path("results"))
        .and(warp::path::end())
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .and(with_state(state.clone()))
        .and_then(results);

    let history_route = warp::get()
        .and(warp::path("history"))
        .and(warp::path::end())
        .and(with_state(state.clone()))
        .and_then(history);

    let download_route = warp::get()
        .and(warp::path("download"))
        .and(warp::path::tail())
        .and(with_state(state))
        .and_then(download);

    home_route
        .or(results_route)
        .or(history_route)
        .or(download_route)
        .with(warp::trace::request())
}

async fn home(
    params: HashMap<String, String>,
    state: Arc<AppState>,
) -> Result<Response, Rejection> {
    let error = params.get("error").map(String::as_str);
    Ok(warp::reply::html(views::render_home(&state.background_color, error)).into_response())
}

async fn results(
    params: HashMap<String, String>,
    cookie: Option<String>,
    state: Arc<AppState>,
) -> Result<Response, Rejection> {
    let location = params
        .get(LOCATION_PARAM)
        .map(|s| s.trim())
        .unwrap_or_default();

    // No session for requests that never reach the cache
    if location.is_empty() {
        return Ok(redirect("/"));
    }

    let session = state.sessions.resolve(cookie.as_deref());
    let response = match state.service.results(session.cache.as_ref(), location).await {
        Ok(view) => warp::reply::html(views::render_results(&view)).into_response(),
        Err(e) => {
            tracing::warn!("Failed to get forecast for {}: {}", location, e);
            redirect(&format!("/?error={}", urlencoding::encode(e.user_message())))
        }
    };

    Ok(with_session_cookie(response, &session))
}

async fn history(state: Arc<AppState>) -> Result<Response, Rejection> {
    let entries = state.service.archive().list().unwrap_or_else(|e| {
        tracing::error!("Failed to list archive: {}", e);
        Vec::new()
    });
    Ok(warp::reply::html(views::render_history(&entries)).into_response())
}

async fn download(tail: Tail, state: Arc<AppState>) -> Result<Response, Rejection> {
    let filename = match urlencoding::decode(tail.as_str()) {
        Ok(name) => name.into_owned(),
        Err(e) => {
            tracing::warn!("Undecodable download path {}: {}", tail.as_str(), e);
            return Ok(redirect("/history"));
        }
    };

    match state.service.archive().read(&filename) {
        Ok(contents) => Ok(attachment(&filename, contents)),
        Err(e) => {
            tracing::warn!("Download of {} refused: {}", filename, e);
            Ok(redirect("/history"))
        }
    }
}

fn redirect(location: &str) -> Response {
    let mut response = StatusCode::SEE_OTHER.into_response();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
        }
        Err(e) => tracing::error!("Invalid redirect target {}: {}", location, e),
    }
    response
}

fn with_session_cookie(mut response: Response, session: &Session) -> Response {
    if session.is_new {
        if let Ok(value) = HeaderValue::from_str(&session.cookie()) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}

fn attachment(filename: &str, contents: Vec<u8>) -> Response {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    let mut response = Response::new(contents.into());
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&name)) {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    response
}

/// `attachment` header with an ASCII fallback name plus the RFC 5987 UTF-8 form.
fn content_disposition(name: &str) -> String {
    let ascii: String = name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(name)
    )
}
