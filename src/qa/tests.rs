use super::*;

fn answer_config(api_key: Option<&str>) -> AnswerConfig {
    AnswerConfig {
        api_key: api_key.map(str::to_string),
        base_url: Url::parse("https://openrouter.ai/api/v1").expect("url should parse"),
        model: "openai/gpt-4o-mini".to_string(),
        temperature: 0.0,
        top_k: 4,
    }
}

#[test]
fn missing_api_key_is_fatal_at_construction() {
    let result = AnswerClient::new(&answer_config(None));
    assert!(matches!(result, Err(ConfigError::MissingApiKey)));
}

#[test]
fn client_carries_configured_settings() {
    let client = AnswerClient::new(&answer_config(Some("sk-test"))).expect("Failed to create client");

    assert_eq!(client.api_key, "sk-test");
    assert_eq!(client.model, "openai/gpt-4o-mini");
    assert_eq!(client.temperature, 0.0);
}

#[test]
fn chat_request_serialization() {
    let request = ChatRequest {
        model: "test-model".to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: "context".to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: "question".to_string(),
            },
        ],
        temperature: 0.5,
    };

    let json = serde_json::to_value(&request).expect("Failed to serialize request");
    assert_eq!(json["model"], "test-model");
    assert_eq!(json["messages"][0]["role"], "system");
    assert_eq!(json["messages"][1]["content"], "question");
    assert_eq!(json["temperature"], 0.5);
}

#[test]
fn chat_response_parsing() {
    let raw = r#"{
        "id": "gen-123",
        "choices": [
            {"message": {"role": "assistant", "content": "The answer."}, "finish_reason": "stop"}
        ]
    }"#;

    let response: ChatResponse = serde_json::from_str(raw).expect("Failed to parse response");
    assert_eq!(response.choices.len(), 1);
    assert_eq!(response.choices[0].message.content, "The answer.");
}

#[test]
fn heading_path_joins_outermost_first() {
    let chunk = Chunk {
        text: "body".to_string(),
        heading_path: vec![
            ("Header 1".to_string(), "Guide".to_string()),
            ("Header 2".to_string(), "Install".to_string()),
        ],
    };

    assert_eq!(
        joined_heading_path(&chunk).as_deref(),
        Some("Guide > Install")
    );
}

#[test]
fn unlabeled_chunk_has_no_heading_path() {
    let chunk = Chunk {
        text: "body".to_string(),
        heading_path: Vec::new(),
    };
    assert_eq!(joined_heading_path(&chunk), None);
}

#[test]
fn context_block_labels_chunks_with_their_paths() {
    let results = vec![
        SearchResult {
            chunk_metadata: ChunkMetadata {
                heading_path: Some("Guide > Install".to_string()),
                content: "Run the installer.".to_string(),
                chunk_index: 0,
                created_at: "2024-01-01T00:00:00Z".to_string(),
            },
            similarity_score: 0.9,
            distance: 0.1,
        },
        SearchResult {
            chunk_metadata: ChunkMetadata {
                heading_path: None,
                content: "Preamble text.".to_string(),
                chunk_index: 1,
                created_at: "2024-01-01T00:00:00Z".to_string(),
            },
            similarity_score: 0.8,
            distance: 0.2,
        },
    ];

    let context = format_context(&results);
    assert_eq!(
        context,
        "[Guide > Install]\nRun the installer.\n\n---\n\nPreamble text."
    );
}

#[test]
fn empty_retrieval_formats_to_empty_context() {
    assert_eq!(format_context(&[]), "");
}
