use std::{io, net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tokio::{net::TcpListener, signal, task};

use timetable_parser::{convert_xlsx, Calendar, Error, Options};

const CONVERT_PATH: &str = "/convert";
const MAX_UPLOAD: usize = 16 * 1024 * 1024;
const SKIPPED_ROWS: HeaderName = HeaderName::from_static("x-skipped-rows");

pub fn router(defaults: Options) -> Router {
    Router::new()
        .route(CONVERT_PATH, post(handle_convert).fallback(not_found))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD))
        .fallback(not_found)
        .with_state(Arc::new(defaults))
}

async fn not_found() -> (StatusCode, &'static str) {
    (
        StatusCode::NOT_FOUND,
        "POST an .xlsx timetable to /convert\n",
    )
}

pub async fn serve(address: SocketAddr, defaults: Options) -> io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    log::info!("Listening at http://{address}");

    axum::serve(listener, router(defaults))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    log::info!("Shutting down");
}

#[derive(Deserialize)]
struct ConvertQuery {
    tz: Option<String>,
    lang: Option<String>,
    #[serde(default)]
    json: bool,
}

impl ConvertQuery {
    fn options(&self, defaults: &Options) -> Result<Options, Error> {
        let mut options = defaults.clone();
        if let Some(tz) = &self.tz {
            options.time_zone = tz.parse()?;
        }
        if let Some(lang) = &self.lang {
            options.language = lang.parse()?;
        }
        Ok(options)
    }
}

struct ApiError(Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_schema_error() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::BAD_REQUEST
        };
        log::warn!("Rejected upload: {}", self.0);
        (status, format!("{}\n", self.0)).into_response()
    }
}

async fn handle_convert(
    State(defaults): State<Arc<Options>>,
    Query(query): Query<ConvertQuery>,
    body: Bytes,
) -> Response {
    let options = match query.options(&defaults) {
        Ok(options) => options,
        Err(err) => return ApiError(err).into_response(),
    };

    let converted = {
        let options = options.clone();
        task::spawn_blocking(move || convert_xlsx(&body, &options)).await
    };

    let calendar = match converted {
        Ok(Ok(calendar)) => calendar,
        Ok(Err(err)) => return ApiError(err).into_response(),
        Err(err) => {
            log::error!("Conversion task failed: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log::info!(
        "Converted upload into {} events ({} rows skipped)",
        calendar.events.len(),
        calendar.skipped.len()
    );

    render(&calendar, &options, query.json)
}

fn render(calendar: &Calendar, options: &Options, json: bool) -> Response {
    let skipped = [(SKIPPED_ROWS, calendar.skipped.len().to_string())];

    if json {
        return (skipped, Json(calendar)).into_response();
    }

    (
        skipped,
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"timetable.ics\"",
            ),
        ],
        calendar.to_ics(&options.time_zone),
    )
        .into_response()
}
