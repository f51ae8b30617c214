use serde_json::json;
use stylist_llm::{InputItem, LLMInput, OutputContent, ResponsesResponse};

#[test]
fn test_text_input_serializes_as_bare_string() {
    let input = LLMInput::developer("Be concise");
    assert_eq!(
        serde_json::to_value(&input).unwrap(),
        json!({"role": "developer", "content": "Be concise"})
    );
}

#[test]
fn test_item_input_serializes_typed_parts() {
    let input = LLMInput::user_items(vec![
        InputItem::text("Does this match?"),
        InputItem::image("https://cdn.example/look.png"),
    ]);

    assert_eq!(
        serde_json::to_value(&input).unwrap(),
        json!({
            "role": "user",
            "content": [
                {"type": "input_text", "text": "Does this match?"},
                {"type": "input_image", "image_url": "https://cdn.example/look.png"}
            ]
        })
    );
}

#[test]
fn test_response_keeps_only_message_items() {
    let raw = json!({
        "id": "resp_1",
        "status": "completed",
        "output": [
            {"type": "reasoning", "id": "rs_1", "summary": []},
            {
                "type": "message",
                "role": "assistant",
                "content": [
                    {"type": "output_text", "text": "Navy works.", "annotations": []},
                    {"type": "refusal", "refusal": "no"}
                ]
            },
            {
                "type": "message",
                "role": "assistant",
                "content": [{"type": "output_text", "text": "So does grey."}]
            }
        ]
    });

    let response: ResponsesResponse = serde_json::from_value(raw).unwrap();
    let content = response.into_message_content();

    assert_eq!(content.len(), 3);
    assert_eq!(content[0], OutputContent::output_text("Navy works."));
    assert_eq!(content[1].as_output_text(), None);
    assert_eq!(content[2].as_output_text(), Some("So does grey."));
}

#[test]
fn test_response_without_output_is_empty() {
    let response: ResponsesResponse = serde_json::from_value(json!({"id": "resp_2"})).unwrap();
    assert!(response.into_message_content().is_empty());
}
