use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use stylist_llm::{
    CancellationToken, LLMClient, LLMError, LLMInput, ResponsesClient, ResponsesConfig,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ResponsesClient {
    let config = ResponsesConfig::new("test-key", "gpt-test").with_endpoint(server.uri());
    ResponsesClient::new(config).unwrap()
}

fn sse(records: &[serde_json::Value]) -> String {
    records
        .iter()
        .map(|r| format!("data: {}\n\n", r))
        .collect::<String>()
        + "data: [DONE]\n\n"
}

#[tokio::test]
async fn test_generate_response_flattens_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "gpt-test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "resp_1",
            "status": "completed",
            "output": [
                {"type": "reasoning", "id": "rs_1"},
                {"type": "message", "content": [{"type": "output_text", "text": "Linen Summer Looks"}]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outputs = client_for(&server)
        .generate_response(vec![LLMInput::user("name this")], None)
        .await
        .unwrap();

    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].as_output_text(), Some("Linen Summer Looks"));
}

#[tokio::test]
async fn test_provider_error_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate_response(vec![LLMInput::user("hi")], None)
        .await
        .unwrap_err();

    match err {
        LLMError::Request { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelling_pending_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"output": []}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = client_for(&server)
        .generate_response(vec![LLMInput::user("hi")], Some(cancel))
        .await
        .unwrap_err();

    assert!(err.is_cancellation());
}

#[tokio::test]
async fn test_streaming_response_over_http() {
    let server = MockServer::start().await;
    let body = sse(&[
        json!({"type": "response.created", "response": {"id": "resp_1"}}),
        json!({"type": "response.output_text.delta", "delta": "Pair it "}),
        json!({"type": "response.output_text.delta", "delta": "with white sneakers."}),
        json!({"type": "response.output_text.done", "text": "Pair it with white sneakers."}),
        json!({"type": "response.completed"}),
    ]);
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let on_complete = stylist_llm::completion_handler(move |text| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(text);
            Ok(())
        }
    });

    let stream = client_for(&server)
        .generate_streaming_response(vec![LLMInput::user("shoes?")], Some(on_complete), None)
        .await
        .unwrap();

    let chunks: Vec<_> = stream.map(|c| c.unwrap()).collect().await;
    let text: String = chunks
        .iter()
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect();

    assert_eq!(chunks.len(), 2);
    assert_eq!(text, "Pair it with white sneakers.");
    assert_eq!(rx.recv().await.unwrap(), "Pair it with white sneakers.");
}

#[tokio::test]
async fn test_streaming_rejection_fails_before_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad input"))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .generate_streaming_response(vec![LLMInput::user("hi")], None, None)
        .await;

    assert!(matches!(result, Err(LLMError::Request { status: 400, .. })));
}

#[tokio::test]
async fn test_pre_cancelled_stream_is_empty_and_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let stream = client_for(&server)
        .generate_streaming_response(vec![LLMInput::user("hi")], None, Some(cancel))
        .await
        .unwrap();

    assert_eq!(stream.count().await, 0);
}
