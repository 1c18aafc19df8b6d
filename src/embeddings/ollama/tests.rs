use super::*;

fn test_config() -> EmbeddingConfig {
    EmbeddingConfig {
        base_url: Url::parse("http://test-host:1234").expect("url should parse"),
        model: "test-model".to_string(),
        batch_size: 128,
    }
}

#[test]
fn client_configuration() {
    let client = OllamaClient::new(&test_config());

    assert_eq!(client.model, "test-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
}

#[test]
fn client_timeout_builder() {
    // Timeout lives inside the agent configuration; this just exercises
    // the builder path.
    let _client = OllamaClient::new(&test_config()).with_timeout(Duration::from_secs(60));
}

#[test]
fn empty_batch_short_circuits() {
    let client = OllamaClient::new(&test_config());
    let results = client.embed_batch(&[]).expect("Empty batch should succeed");
    assert!(results.is_empty());
}

#[test]
fn request_uses_input_list_for_any_count() {
    let single = EmbedRequest {
        model: "test-model".to_string(),
        input: vec!["hello".to_string()],
    };
    let json = serde_json::to_value(&single).expect("Failed to serialize request");
    assert_eq!(json["model"], "test-model");
    assert_eq!(json["input"], serde_json::json!(["hello"]));
    assert!(json.get("prompt").is_none());

    let batch = EmbedRequest {
        model: "test-model".to_string(),
        input: vec!["a".to_string(), "b".to_string()],
    };
    let json = serde_json::to_value(&batch).expect("Failed to serialize request");
    assert_eq!(json["input"][0], "a");
    assert_eq!(json["input"][1], "b");
}

#[test]
fn response_parsing() {
    let response: EmbedResponse =
        serde_json::from_str(r#"{"embeddings": [[1.0, 2.0], [3.0, 4.0]]}"#)
            .expect("Failed to parse response");
    assert_eq!(response.embeddings.len(), 2);
    assert_eq!(response.embeddings[1], vec![3.0, 4.0]);
}
