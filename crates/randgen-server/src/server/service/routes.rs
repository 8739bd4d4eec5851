use crate::server::{
    generation::source::RandSource,
    service::handler::{GeneratorService, generator, random},
};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
};

/// Largest accepted `POST /random` body.
pub const FORM_LIMIT_BYTES: usize = 1 << 10;

/// Builds the complete application router around `service`.
pub fn router<R: RandSource>(service: GeneratorService<R>) -> Router {
    let public_dir = service.config().public_dir.clone();

    let assets = ServiceBuilder::new()
        .layer(middleware::from_fn(hide_listings))
        .service(ServeDir::new(&public_dir));

    Router::new()
        .route(
            "/random",
            post(random::<R>).layer(DefaultBodyLimit::max(FORM_LIMIT_BYTES)),
        )
        .route("/generator", get(generator::<R>))
        .nest_service("/static", assets)
        .fallback_service(ServeFile::new(public_dir.join("index.html")))
        .layer(cors_layer())
        .with_state(service)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Answers directory paths with 404 so the public directory is never listed.
async fn hide_listings(request: Request, next: Next) -> Response {
    if request.uri().path().ends_with('/') {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}
