use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

const LOCAL_FRONTEND: &str = "http://localhost:3000";

/// Allows the configured frontend plus the local dev server.
pub fn frontend_cors(frontend_url: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = [frontend_url, LOCAL_FRONTEND]
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin.trim_end_matches('/')).ok())
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(origins)
}
