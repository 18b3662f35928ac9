//! Result file download.

use axum::Router;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio_util::io::ReaderStream;

use seedscan_common::error::AppError;

use crate::state::AppState;

/// Content type the result files are served with.
pub const DOWNLOAD_CONTENT_TYPE: &str = "application/vnd.ms-excel";

pub fn router() -> Router<AppState> {
    Router::new().route("/download/{filename}", get(download_file))
}

/// GET /download/:filename - Stream a file from the media root.
///
/// Missing files get a bare 404 with an empty body.
async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let Some(path) = state.storage.resolve_download(&filename).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(StatusCode::NOT_FOUND.into_response());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(file = %filename, "Serving download");

    Ok((
        [
            (header::CONTENT_TYPE, DOWNLOAD_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename={}", filename),
            ),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
