use std::net::SocketAddr;
use std::sync::Arc;

use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use super::BuiltSchema;
use crate::config::ServerConfig;

#[derive(Debug, Deserialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Option<serde_json::Value>,
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GraphQLResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<serde_json::Value>,
}

struct AppState {
    schema: BuiltSchema,
    path: String,
}

/// Serves a compiled schema over HTTP.
pub struct GraphQLServer {
    schema: BuiltSchema,
    config: ServerConfig,
}

impl GraphQLServer {
    pub fn new(schema: BuiltSchema) -> Self {
        Self {
            schema,
            config: ServerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the configured listen address and serves until the task is
    /// cancelled.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.listen.parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid address: {}", e),
            )
        })?;
        let path = self.config.path.clone();
        let playground = self.config.playground;

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);
        let app = self.router().layer(cors);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, path = %path, playground, "GraphQL server listening");
        axum::serve(listener, app).await
    }

    pub fn router(self) -> Router {
        let path = self.config.path.clone();
        let state = Arc::new(AppState {
            schema: self.schema,
            path: path.clone(),
        });

        let route = if self.config.playground {
            get(playground_handler).post(graphql_post_handler)
        } else {
            post(graphql_post_handler)
        };

        Router::new()
            .route(&path, route)
            .route("/health", get(health_handler))
            .with_state(state)
    }
}

async fn playground_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new(&state.path)))
}

async fn graphql_post_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GraphQLRequest>,
) -> impl IntoResponse {
    let mut gql_request = async_graphql::Request::new(&request.query);

    if let Some(vars) = request.variables {
        match serde_json::from_value(vars) {
            Ok(variables) => gql_request = gql_request.variables(variables),
            Err(err) => {
                tracing::debug!(error = %err, "rejected request variables");
                let errors = vec![serde_json::json!({
                    "message": format!("Invalid variables: {}", err),
                })];
                return (
                    StatusCode::BAD_REQUEST,
                    Json(GraphQLResponse { data: None, errors }),
                );
            }
        }
    }

    if let Some(op_name) = request.operation_name {
        gql_request = gql_request.operation_name(op_name);
    }

    let response = state.schema.execute(gql_request).await;

    let data = if response.data != async_graphql::Value::Null {
        Some(response.data.into_json().unwrap_or(serde_json::Value::Null))
    } else {
        None
    };

    let errors: Vec<serde_json::Value> = response
        .errors
        .into_iter()
        .map(|e| {
            serde_json::json!({
                "message": e.message,
                "locations": e.locations,
                "path": e.path,
                "extensions": e.extensions,
            })
        })
        .collect();

    if !errors.is_empty() {
        tracing::debug!(count = errors.len(), "request completed with errors");
    }

    let status = if errors.is_empty() || data.is_some() {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };

    (status, Json(GraphQLResponse { data, errors }))
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
