use std::time::Duration;

use axum::{debug_handler, Router};
use axum::body::Body;
use axum::extract::State;
use axum::error_handling::HandleErrorLayer;
use axum::http::{Method, Uri};
use axum::response::Response;
use axum::routing::{get, post, put};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::net;
use crate::net::error;
use crate::net::layer;
use crate::path;
use crate::state::ArcShared;

mod handle;

#[debug_handler]
async fn serve_file(
    State(state): State<ArcShared>,
    method: Method,
    uri: Uri
) -> error::Result<Response<Body>> {
    let Some(assets) = state.assets() else {
        return Err(error::Error::api(error::GeneralKind::NotFound));
    };

    if method != Method::GET {
        return Err(error::Error::api(error::GeneralKind::InvalidMethod));
    }

    let mut working = assets.to_path_buf();

    for part in uri.path().split('/') {
        if part == ".." || part == "." {
            return Err(error::Error::api(error::GeneralKind::InvalidUri));
        } else if !part.is_empty() {
            working.push(part);
        }
    }

    let Some(metadata) = path::metadata(&working)? else {
        return Err(error::Error::api(error::GeneralKind::NotFound));
    };

    if !metadata.is_file() {
        return Err(error::Error::api(error::GeneralKind::NotFound));
    }

    net::fs::stream_file(working).await
}

pub fn routes(state: &ArcShared, timeout: Duration) -> Router {
    Router::new()
        .route(
            "/auth/login",
            post(handle::auth::login::post)
        )
        .route(
            "/auth/register",
            post(handle::auth::register::post)
        )
        .route(
            "/auth/logout",
            post(handle::auth::logout::post)
        )
        .route(
            "/auth/session",
            get(handle::auth::session::get)
        )
        .route(
            "/browse",
            get(handle::browse::get)
        )
        .route(
            "/browse/*path",
            get(handle::browse::path::get)
        )
        .route(
            "/download/file/*path",
            get(handle::download::file::get)
        )
        .route(
            "/download/folder",
            get(handle::download::folder::get)
        )
        .route(
            "/download/folder/*path",
            get(handle::download::folder::path::get)
        )
        .route(
            "/delete/*path",
            post(handle::delete::post)
        )
        .route(
            "/suggest",
            post(handle::suggest::post)
        )
        .route(
            "/upload",
            put(handle::upload::put)
        )
        .route(
            "/uploads/mine",
            get(handle::upload::mine::get)
        )
        .route(
            "/admin/uploads",
            get(handle::admin::uploads::get)
        )
        .route(
            "/admin/uploads/:filename/move",
            post(handle::admin::uploads::filename::move_to::post)
        )
        .route(
            "/admin/uploads/:filename/decline",
            post(handle::admin::uploads::filename::decline::post)
        )
        .route(
            "/admin/users",
            get(handle::admin::users::get)
        )
        .route(
            "/admin/pending",
            get(handle::admin::users::pending)
        )
        .route(
            "/admin/denied",
            get(handle::admin::users::denied)
        )
        .route(
            "/admin/users/:email/:action",
            post(handle::admin::users::email::post)
        )
        .route(
            "/admin/metrics",
            get(handle::admin::metrics::get)
        )
        .route(
            "/admin/metrics/:kind",
            get(handle::admin::metrics::kind::get)
        )
        .route("/ping", get(handle::ping))
        .fallback(serve_file)
        .layer(ServiceBuilder::new()
            .layer(layer::RIDLayer::new())
            .layer(TraceLayer::new_for_http()
                .make_span_with(layer::trace::make_span_with)
                .on_request(layer::trace::on_request)
                .on_response(layer::trace::on_response)
                .on_failure(layer::trace::on_failure))
            .layer(HandleErrorLayer::new(error::handle_error))
            .layer(layer::TimeoutLayer::new(timeout)))
        .with_state(state.clone())
}
