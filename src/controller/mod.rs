use axum::{http, response::IntoResponse, Router};
use maintenance::create_maintenance_router;
use tower_http::catch_panic::CatchPanicLayer;

use crate::{database::Database, utils::HttpResult};

mod error;
mod maintenance;

pub use error::BaseError;
use error::handle_panic;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

pub type StateRouter = Router<AppState>;

pub fn create_state_router() -> StateRouter {
    Router::new()
}

pub fn create_router() -> StateRouter {
    create_state_router().merge(create_maintenance_router())
}

/// Builds the served application: routes under `base_path`, a JSON 404 and
/// the panic boundary wrapping everything.
pub fn create_app(base_path: &str, state: AppState) -> Router {
    let base_path = base_path.trim_matches('/');
    let router = if base_path.is_empty() {
        create_router()
    } else {
        create_state_router().nest(&format!("/{base_path}"), create_router())
    };

    router
        .fallback(handle_404)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

pub async fn handle_404() -> impl IntoResponse {
    (
        http::StatusCode::NOT_FOUND,
        HttpResult::failure("Recurso não encontrado."),
    )
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
        routing::get,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::database::{test_support::sqlite_database, DbResult};

    async fn send(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn exploding_handler(
        axum::extract::State(state): axum::extract::State<AppState>,
    ) -> HttpResult {
        let _: DbResult<()> = state
            .db
            .run(|_conn| panic!("storage exploded"))
            .await;
        HttpResult::success("unreachable")
    }

    async fn panicking_handler() -> HttpResult {
        panic!("handler exploded")
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (_dir, db) = sqlite_database();
        let (status, body) = send(create_app("/backend", AppState { db }), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"success": false, "message": "Recurso não encontrado."})
        );
    }

    #[tokio::test]
    async fn test_root_base_path_serves_routes_directly() {
        let (_dir, db) = sqlite_database();
        let (status, body) = send(create_app("/", AppState { db }), "/read_manutencao").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("Nenhum registro encontrado."));
    }

    #[tokio::test]
    async fn test_panic_during_storage_work_becomes_500_envelope() {
        let (_dir, db) = sqlite_database();
        let app = Router::new()
            .route("/boom", get(exploding_handler))
            .layer(CatchPanicLayer::custom(handle_panic))
            .with_state(AppState { db });

        let (status, body) = send(app, "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"success": false, "message": "Exception: storage exploded"})
        );
    }

    #[tokio::test]
    async fn test_panic_in_handler_becomes_500_envelope() {
        let app = Router::new()
            .route("/boom", get(panicking_handler))
            .layer(CatchPanicLayer::custom(handle_panic));

        let (status, body) = send(app, "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"success": false, "message": "Exception: handler exploded"})
        );
    }
}
