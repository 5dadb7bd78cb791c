use super::handler::{IndexRequest, IndexResponse, Indexer};
use crate::error::{IndexerError, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::signal;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

const HTML: &str = "text/html; charset=utf-8";
const LOGIN_REALM: &str = r#"Basic realm="Protected""#;

/// Every path is handled by the indexer, so the router is a single fallback.
pub fn router(indexer: Arc<Indexer>) -> Router {
    Router::new().fallback(handle).with_state(indexer)
}

/// Binds `address` and serves until Ctrl+C or SIGTERM.
pub async fn serve(indexer: Arc<Indexer>, address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(
        address = %listener.local_addr()?,
        root = %indexer.root().display(),
        "serving directory index"
    );
    axum::serve(listener, router(indexer))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("received termination signal, shutting down");
}

async fn handle(State(indexer): State<Arc<Indexer>>, request: Request<Body>) -> Response {
    let method = request.method().clone();
    if method != Method::GET && method != Method::HEAD {
        return (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET, HEAD")]).into_response();
    }

    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let worker = Arc::clone(&indexer);
    let request_path = path.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        worker.handle(&IndexRequest {
            path: &request_path,
            query: query.as_deref(),
            authorization: authorization.as_deref(),
        })
    })
    .await;

    let response = match outcome {
        Ok(response) => response,
        Err(err) => {
            error!(path = %path, error = %err, "request handler panicked");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    debug!(%method, path = %path, status = response.status(), "request");

    match into_response(response).await {
        Ok(response) => response,
        Err(err) => {
            error!(path = %path, error = %err, "cannot send response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn into_response(response: IndexResponse) -> Result<Response> {
    Ok(match response {
        IndexResponse::Listing { body } => html(StatusCode::OK, body),
        IndexResponse::NotFound { body } => html(StatusCode::NOT_FOUND, body),
        IndexResponse::AccessDenied { body } => html(StatusCode::FORBIDDEN, body),
        IndexResponse::LoginRequired => (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, LOGIN_REALM)],
            "Login required",
        )
            .into_response(),
        IndexResponse::ServerError { message } => {
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
        IndexResponse::File { path, content_type } => stream_file(&path, &content_type).await?,
        IndexResponse::Thumbnail { path } => stream_file(&path, "image/jpeg").await?,
    })
}

fn html(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, HTML)], body).into_response()
}

async fn stream_file(path: &Path, content_type: &str) -> Result<Response> {
    let file = File::open(path).await?;
    let length = file.metadata().await?.len();
    let content_type = HeaderValue::from_str(content_type)
        .map_err(|err| IndexerError::Other(format!("Invalid content type: {}", err)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_LENGTH, HeaderValue::from(length)),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
