//! HTTP API for docent.
//!
//! Thin transport over the [`Controller`](docent_controller::Controller):
//! decode and validate the request body, call `process`, encode the
//! response. Only validation failures become non-2xx responses.
//!
//! # Routes
//!
//! - `POST /mcp/query` - answer a question
//! - `GET /mcp/sessions/{id}` - session snapshot
//! - `DELETE /mcp/sessions/{id}` - end a session
//! - `GET /health` - liveness
//!
//! # Example
//!
//! ```ignore
//! use docent_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:8080".parse()?);
//! Server::new(controller, config).run().await?;
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ErrorResponse, Result, ServerError};
pub use routes::{HealthResponse, SessionDetail};
pub use state::AppState;

use std::net::SocketAddr;

use axum::Router;
use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use docent_controller::Controller;

/// The docent HTTP server.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server around a controller.
    pub fn new(controller: Controller, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(controller, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        use axum::routing::{get, post};

        let mut router = Router::new()
            .merge(routes::health_routes())
            .route("/mcp/query", post(routes::query_handler))
            .route(
                "/mcp/sessions/{id}",
                get(routes::get_session_handler).delete(routes::delete_session_handler),
            )
            .layer(RequestBodyLimitLayer::new(self.state.config.max_body_size))
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = cors_layer(&self.state.config.cors_origins) {
            router = router.layer(cors);
        }

        router.with_state(self.state.clone())
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address.
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        info!("Starting server on {}", addr);

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return Some(layer.allow_origin(Any));
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(layer.allow_origin(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use docent_backends::{MockClassifier, MockGenerator, MockVectorIndex};
    use docent_session::{SessionStore, StoreConfig};
    use docent_tools::{IntentDetectionTool, SearchLimits, ToolRegistry, VectorSearchTool};
    use tower::ServiceExt;

    fn create_test_server(config: ServerConfig) -> Server {
        let registry = ToolRegistry::builder()
            .register(IntentDetectionTool::new(Arc::new(MockClassifier::with_intent(
                "coverage",
                "policy_info",
                0.9,
            ))))
            .register(VectorSearchTool::new(
                Arc::new(MockVectorIndex::with_documents(&[(
                    "travel.pdf",
                    "Travel Insurance",
                    "Covers medical expenses abroad.",
                )])),
                SearchLimits::default(),
            ))
            .build();
        let sessions = SessionStore::new(StoreConfig::default().with_cleanup_task(false));
        let controller = Controller::new(registry, sessions, Arc::new(MockGenerator::new()));
        Server::new(controller, config)
    }

    #[tokio::test]
    async fn test_server_health_endpoint() {
        let app = create_test_server(ServerConfig::new()).router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_body_limit_rejects_large_payload() {
        let app = create_test_server(ServerConfig::new().with_max_body_size(64)).router();
        let question = "x".repeat(512);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp/query")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(format!(r#"{{"question":"{}"}}"#, question)))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_cors_header_for_allowed_origin() {
        let config = ServerConfig::new().with_cors_origins(vec!["http://localhost:3000".to_string()]);
        let app = create_test_server(config).router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_cors_layer_disabled_without_origins() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["*".to_string()]).is_some());
    }
}
