use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use futures::stream;
use serde_json::{json, Value};
use tower::ServiceExt;

use stylist_api::{build_router, AppState, Config};
use stylist_assets::{RequestSigner, SignMethod, SignedUrlProvider};
use stylist_llm::buffer_utils::parse_sse_stream;
use stylist_llm::{
    spawn_text_pipeline, CancellationToken, CompletionHandler, LLMClient, LLMError, LLMInput,
    OutputContent, ResponseEventParser, TextStream,
};
use stylist_persist::{SessionStore, SqliteSessionStore};

const HOST: &str = "r2.cloudflarestorage.com";

/// Scripted stand-in for the model provider
#[derive(Default)]
struct FakeLlm {
    deltas: Vec<&'static str>,
    title: Option<&'static str>,
    reject_status: Option<u16>,
    streamed_inputs: Mutex<Vec<Vec<LLMInput>>>,
}

#[async_trait]
impl LLMClient for FakeLlm {
    async fn generate_response(
        &self,
        _input: Vec<LLMInput>,
        _cancel: Option<CancellationToken>,
    ) -> stylist_llm::error::Result<Vec<OutputContent>> {
        Ok(self.title.map(OutputContent::output_text).into_iter().collect())
    }

    async fn generate_streaming_response(
        &self,
        input: Vec<LLMInput>,
        on_complete: Option<CompletionHandler>,
        cancel: Option<CancellationToken>,
    ) -> stylist_llm::error::Result<TextStream> {
        if let Some(status) = self.reject_status {
            return Err(LLMError::Request {
                status,
                body: "invalid input".to_string(),
            });
        }
        self.streamed_inputs.lock().unwrap().push(input);

        let mut lines: Vec<String> = self
            .deltas
            .iter()
            .map(|d| format!("data: {}\n\n", json!({"type": "response.output_text.delta", "delta": d})))
            .collect();
        lines.push("data: {\"type\":\"response.output_text.done\"}\n\n".to_string());
        lines.push("data: [DONE]\n\n".to_string());

        let body = stream::iter(lines.into_iter().map(|l| Ok::<_, std::io::Error>(Bytes::from(l))));

        Ok(spawn_text_pipeline(
            parse_sse_stream(body, ResponseEventParser),
            on_complete,
            cancel.unwrap_or_default(),
            8,
        ))
    }
}

struct FakeSigner;

#[async_trait]
impl RequestSigner for FakeSigner {
    async fn presign(
        &self,
        method: SignMethod,
        key: &str,
        _expires_in: Duration,
    ) -> stylist_assets::Result<String> {
        Ok(format!("https://outfits.acc.{HOST}/{key}?sig=fresh&method={method}"))
    }
}

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    llm: Arc<FakeLlm>,
}

async fn test_app(llm: FakeLlm) -> TestApp {
    let store: Arc<dyn SessionStore> = Arc::new(SqliteSessionStore::in_memory().await.unwrap());
    let llm = Arc::new(llm);
    let assets = Arc::new(SignedUrlProvider::new(
        Arc::new(FakeSigner),
        "outfits",
        HOST,
        Duration::from_secs(3600),
    ));

    let state = Arc::new(AppState::new(Config::default(), store, llm.clone(), assets));

    TestApp {
        router: build_router(state.clone()),
        state,
        llm,
    }
}

impl TestApp {
    async fn call(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self.call(Request::get(uri).body(Body::empty()).unwrap()).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn post_json(&self, uri: &str, payload: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let (status, body) = self.call(request).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self.call(Request::delete(uri).body(Body::empty()).unwrap()).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn create_session(&self, user_id: &str, messages: Value) -> String {
        let (status, body) = self
            .post_json(
                "/style-analysis/sessions",
                json!({"userId": user_id, "title": "Fixed", "messages": messages}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["sessionId"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_create_session_with_title() {
    let app = test_app(FakeLlm::default()).await;

    let (status, body) = app
        .post_json(
            "/style-analysis/sessions",
            json!({
                "userId": "u1",
                "title": "Wedding outfit",
                "messages": [
                    {"role": "system", "prompt": "What is the occasion?"},
                    {"role": "user", "prompt": "A summer wedding"}
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Wedding outfit");
    assert_eq!(body["messageIds"].as_array().unwrap().len(), 2);
    assert!(body["sessionId"].as_str().is_some());
    assert!(app.state.tasks.is_empty());
}

#[tokio::test]
async fn test_create_session_without_title_assigns_generated_one() {
    let app = test_app(FakeLlm {
        title: Some("Summer Wedding Look"),
        ..Default::default()
    })
    .await;

    let (status, body) = app
        .post_json(
            "/style-analysis/sessions",
            json!({"userId": "u1", "messages": [{"role": "user", "prompt": "hello"}]}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "New Style Analysis");

    app.state.tasks.shutdown().await;

    let session_id = body["sessionId"].as_str().unwrap();
    let session = app.state.store.get_session(session_id, "u1").await.unwrap().unwrap();
    assert_eq!(session.title, "Summer Wedding Look");
}

#[tokio::test]
async fn test_title_failure_keeps_default() {
    let app = test_app(FakeLlm::default()).await;

    let (_, body) = app
        .post_json(
            "/style-analysis/sessions",
            json!({"userId": "u1", "messages": [{"role": "user", "prompt": "hello"}]}),
        )
        .await;
    app.state.tasks.shutdown().await;

    let session_id = body["sessionId"].as_str().unwrap();
    let session = app.state.store.get_session(session_id, "u1").await.unwrap().unwrap();
    assert_eq!(session.title, "New Style Analysis");
}

#[tokio::test]
async fn test_create_session_validation() {
    let app = test_app(FakeLlm::default()).await;

    let cases = [
        json!({"userId": "u1", "messages": []}),
        json!({"userId": "u1"}),
        json!({"userId": "u1", "messages": [{"role": "assistant", "prompt": "hi"}]}),
        json!({"userId": "u1", "messages": [{"role": "user", "prompt": ""}]}),
        json!({"userId": "", "messages": [{"role": "user", "prompt": "hi"}]}),
        json!({"userId": "u1", "messages": [{"role": "critic", "prompt": "hi"}]}),
    ];

    for payload in cases {
        let (status, body) = app.post_json("/style-analysis/sessions", payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {}", payload);
        assert!(body["error"].as_str().is_some());
    }

    let malformed = Request::post("/style-analysis/sessions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    assert_eq!(app.call(malformed).await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_sessions_paginates_and_refreshes_thumbnails() {
    let app = test_app(FakeLlm::default()).await;

    for i in 0..3 {
        app.create_session(
            "u1",
            json!([{
                "role": "user",
                "prompt": format!("look {}", i),
                "remoteImage": {"url": format!("https://outfits.acc.{HOST}/img-{i}.jpg?sig=old"), "key": format!("img-{i}.jpg")}
            }]),
        )
        .await;
    }
    app.create_session("someone-else", json!([{"role": "user", "prompt": "hi"}])).await;

    let (status, body) = app
        .get_json("/style-analysis/sessions?userId=u1&page=1&pageSize=2")
        .await;

    assert_eq!(status, StatusCode::OK);
    let sessions = body["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(body["pagination"]["totalItems"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["pagination"]["hasNextPage"], true);

    for session in sessions {
        assert_eq!(session["userId"], "u1");
        assert!(session["thumbnailImageUrl"].as_str().unwrap().contains("sig=fresh"));
    }
}

#[tokio::test]
async fn test_list_sessions_rejects_bad_query() {
    let app = test_app(FakeLlm::default()).await;

    for uri in [
        "/style-analysis/sessions",
        "/style-analysis/sessions?userId=u1&page=0",
        "/style-analysis/sessions?userId=u1&pageSize=0",
        "/style-analysis/sessions?userId=u1&page=abc",
    ] {
        assert_eq!(app.get_json(uri).await.0, StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn test_session_messages_in_order_for_owner_only() {
    let app = test_app(FakeLlm::default()).await;
    let session_id = app
        .create_session(
            "u1",
            json!([
                {"role": "user", "prompt": "first"},
                {"role": "user", "remoteImage": {"url": format!("https://outfits.acc.{HOST}/a.jpg?sig=old"), "key": "a.jpg"}}
            ]),
        )
        .await;

    let (status, body) = app
        .get_json(&format!("/style-analysis/sessions/{session_id}/messages?userId=u1"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], session_id.as_str());
    assert_eq!(body["sessionTitle"], "Fixed");
    assert_eq!(body["userId"], "u1");
    assert_eq!(body["pagination"]["totalItems"], 2);

    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages[0]["content"], "first");
    assert_eq!(messages[1]["remoteImage"]["key"], "a.jpg");
    assert!(messages[1]["remoteImage"]["url"].as_str().unwrap().contains("sig=fresh"));

    let (status, _) = app
        .get_json(&format!("/style-analysis/sessions/{session_id}/messages?userId=intruder"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .get_json("/style-analysis/sessions/missing/messages?userId=u1")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_session_twice() {
    let app = test_app(FakeLlm::default()).await;
    let session_id = app.create_session("u1", json!([{"role": "user", "prompt": "hi"}])).await;
    let uri = format!("/style-analysis/sessions/{session_id}?userId=u1");

    let (status, body) = app.delete(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session deleted successfully");
    assert_eq!(body["sessionId"], session_id.as_str());

    assert_eq!(app.delete(&uri).await.0, StatusCode::NOT_FOUND);

    let (_, listing) = app.get_json("/style-analysis/sessions?userId=u1").await;
    assert!(listing["sessions"].as_array().unwrap().is_empty());

    // Still present for the owner, only hidden
    assert!(app.state.store.session_exists(&session_id, "u1").await.unwrap());
}

#[tokio::test]
async fn test_delete_requires_user_id() {
    let app = test_app(FakeLlm::default()).await;
    assert_eq!(app.delete("/style-analysis/sessions/s1").await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_message() {
    let app = test_app(FakeLlm::default()).await;
    let session_id = app.create_session("u1", json!([{"role": "user", "prompt": "hi"}])).await;
    let uri = format!("/style-analysis/sessions/{session_id}/messages");

    let (status, body) = app
        .post_json(&uri, json!({"userId": "u1", "message": {"role": "user", "prompt": "and shoes?"}}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], session_id.as_str());
    assert!(body["messageId"].as_str().is_some());

    let (status, _) = app.post_json(&uri, json!({"userId": "u1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(&uri, json!({"userId": "u1", "message": {"role": "user"}}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(&uri, json!({"userId": "intruder", "message": {"role": "user", "prompt": "x"}}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let messages = app.state.store.list_all_session_messages(&session_id).await.unwrap();
    assert_eq!(messages.len(), 2);
}

#[tokio::test]
async fn test_stream_forwards_deltas_and_stores_reply() {
    let app = test_app(FakeLlm {
        deltas: vec!["Try ", "a camel", " coat."],
        ..Default::default()
    })
    .await;
    let session_id = app
        .create_session(
            "u1",
            json!([
                {"role": "user", "prompt": "What should I wear?"},
                {"role": "system", "prompt": "What is the weather?"},
                {"role": "user", "prompt": "Cold"}
            ]),
        )
        .await;

    let request = Request::get(format!(
        "/style-analysis/sessions/{session_id}/stream?userId=u1&contextMode=all"
    ))
    .body(Body::empty())
    .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(response.headers()[header::CONNECTION], "keep-alive");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body, "Try a camel coat.");

    let inputs = app.llm.streamed_inputs.lock().unwrap().clone();
    let sent = serde_json::to_string(&inputs[0]).unwrap();
    assert!(sent.contains("What should I wear?"));
    assert!(sent.contains("Here is the response to \\\"What is the weather?\\\": Cold."));

    let messages = app.state.store.list_all_session_messages(&session_id).await.unwrap();
    let last = messages.last().unwrap();
    assert_eq!(last.role, stylist_types::MessageRole::Assistant);
    assert_eq!(last.content.as_deref(), Some("Try a camel coat."));
}

#[tokio::test]
async fn test_stream_context_modes() {
    let app = test_app(FakeLlm {
        deltas: vec!["ok"],
        ..Default::default()
    })
    .await;
    let session_id = app
        .create_session(
            "u1",
            json!([
                {"role": "user", "prompt": "one"},
                {"role": "assistant", "prompt": "two"},
                {"role": "user", "prompt": "three"},
                {"role": "assistant", "prompt": "four"}
            ]),
        )
        .await;

    // Each call stores its reply, so the recent window is checked first
    for query in ["contextMode=recent&recentCount=2", "contextMode=last"] {
        let (status, _) = app
            .call(
                Request::get(format!("/style-analysis/sessions/{session_id}/stream?userId=u1&{query}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let inputs = app.llm.streamed_inputs.lock().unwrap().clone();
    assert_eq!(inputs[0].len(), 2);
    let recent = serde_json::to_string(&inputs[0]).unwrap();
    assert!(recent.contains("three") && recent.contains("four"));

    assert_eq!(inputs[1].len(), 1);
    assert!(serde_json::to_string(&inputs[1]).unwrap().contains("three"));
}

#[tokio::test]
async fn test_stream_errors() {
    let app = test_app(FakeLlm {
        reject_status: Some(422),
        ..Default::default()
    })
    .await;
    let session_id = app.create_session("u1", json!([{"role": "user", "prompt": "hi"}])).await;

    let (status, _) = app
        .get_json("/style-analysis/sessions/missing/stream?userId=u1")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .get_json(&format!("/style-analysis/sessions/{session_id}/stream"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .get_json(&format!("/style-analysis/sessions/{session_id}/stream?userId=u1"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "LLM request failed");
}

#[tokio::test]
async fn test_asset_url_shapes() {
    let app = test_app(FakeLlm::default()).await;

    let (status, body) = app.get_json("/assets/upload-url?filename=look.jpg").await;
    assert_eq!(status, StatusCode::OK);
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.ends_with("-look.jpg"));
    assert!(body["uploadUrl"].as_str().unwrap().ends_with("method=PUT"));
    assert!(body["downloadUrl"].as_str().unwrap().ends_with("method=GET"));

    let (status, text) = app
        .call(Request::get("/assets/download-url?filename=abc-look.jpg").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        text,
        format!("https://outfits.acc.{HOST}/abc-look.jpg?sig=fresh&method=GET")
    );

    assert_eq!(app.get_json("/assets/upload-url").await.0, StatusCode::BAD_REQUEST);
    assert_eq!(app.get_json("/assets/download-url?filename=").await.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_root_docs_and_fallback() {
    let app = test_app(FakeLlm::default()).await;

    let (status, text) = app.call(Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "Style Analysis API is running");

    let (status, health) = app.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["services"]["database"], "connected");

    let (status, docs) = app.get_json("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(docs["paths"]["/style-analysis/sessions/{sessionId}/stream"].is_object());

    let (status, body) = app.get_json("/no/such/route").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}
