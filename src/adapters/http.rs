//! HTTP adapter: the chat widget's two JSON endpoints.
//!
//! - `POST /get_response` `{"message": string}` -> `{"response": string}`
//! - `POST /store_lead` `{"name"?, "email"?, "message"?}` -> `{"message": "Lead saved successfully!"}`
//!
//! Both routes always answer 200. Bodies are decoded by hand so that a
//! non-JSON or mistyped body degrades to an empty request rather than an
//! extractor rejection.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::application::ChatService;
use crate::domain::Ack;
use crate::ports::LeadSink;
use crate::ClinicError;

#[derive(Debug, Default, Deserialize)]
struct ChatRequest {
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Default, Deserialize)]
struct LeadRequest {
    name: Option<String>,
    email: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct LeadResponse {
    message: &'static str,
}

/// Build the router serving the chat endpoints.
pub fn router<L>(chat: Arc<ChatService<L>>) -> Router
where
    L: LeadSink + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/get_response", post(get_response::<L>))
        .route("/store_lead", post(store_lead::<L>))
        .layer(cors)
        .with_state(chat)
}

/// Decode a JSON body, falling back to the empty request.
fn decode<T>(body: &[u8]) -> T
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => {
            let err = ClinicError::MalformedInput(e.to_string());
            tracing::debug!("{err}; treating as empty request");
            T::default()
        }
    }
}

async fn get_response<L>(State(chat): State<Arc<ChatService<L>>>, body: Bytes) -> Json<ChatResponse>
where
    L: LeadSink + 'static,
{
    let request: ChatRequest = decode(&body);
    let response = chat.answer_faq(request.message.as_deref().unwrap_or_default());
    Json(ChatResponse { response })
}

async fn store_lead<L>(State(chat): State<Arc<ChatService<L>>>, body: Bytes) -> Json<LeadResponse>
where
    L: LeadSink + 'static,
{
    let LeadRequest {
        name,
        email,
        message,
    } = decode(&body);

    // Lead capture hits the database; keep it off the async workers.
    let ack = tokio::task::spawn_blocking(move || chat.capture_lead(name, email, message))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Lead capture task failed: {e}");
            Ack
        });

    Json(LeadResponse {
        message: ack.message(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStore;
    use crate::domain::faq;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> (Router, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().expect("Should create db"));
        let chat = Arc::new(ChatService::new(Arc::clone(&store)));
        (router(chat), store)
    }

    async fn post_json(app: Router, uri: &str, body: &'static str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("Should build request");

        let response = app.oneshot(request).await.expect("Should respond");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        let json = serde_json::from_slice(&bytes).expect("Should be JSON");
        (status, json)
    }

    #[tokio::test]
    async fn test_get_response_known_question() {
        let (app, _) = app();
        let (status, json) = post_json(
            app,
            "/get_response",
            r#"{"message": "  What services do you offer? "}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], faq::answer_faq("What services do you offer?"));
    }

    #[tokio::test]
    async fn test_get_response_fallback_on_bad_input() {
        for body in [r#"{"message": "gibberish"}"#, "{}", "not json", ""] {
            let (app, _) = app();
            let (status, json) = post_json(app, "/get_response", body).await;

            assert_eq!(status, StatusCode::OK, "{body}");
            assert_eq!(json["response"], faq::FALLBACK_ANSWER, "{body}");
        }
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_any_method() {
        let (app, _) = app();
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/store_lead")
            .header("origin", "https://clinic.example")
            .header("access-control-request-method", "PUT")
            .body(Body::empty())
            .expect("Should build request");

        let response = app.oneshot(request).await.expect("Should respond");
        let headers = response.headers();

        assert_eq!(
            headers
                .get("access-control-allow-methods")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert_eq!(
            headers
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    #[tokio::test]
    async fn test_store_lead() {
        let (app, store) = app();
        let (status, json) = post_json(
            app,
            "/store_lead",
            r#"{"name": "Alice", "email": "a@x.com", "message": "hello"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Lead saved successfully!");

        let leads = store.leads().expect("Should load");
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].message.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_store_lead_accepts_missing_fields() {
        for body in ["{}", r#"{"name": null}"#, "garbage"] {
            let (app, store) = app();
            let (status, json) = post_json(app, "/store_lead", body).await;

            assert_eq!(status, StatusCode::OK, "{body}");
            assert_eq!(json["message"], Ack::MESSAGE, "{body}");
            assert_eq!(store.count_leads().expect("Should count"), 1, "{body}");
        }
    }
}
