use std::sync::Arc;

use serde_json::json;
use teller_core::{
    namespace, Embedder, Gpt4oMini, IndexConfig, InMemoryStore, Message, ModelProvider,
    OpenAiCompatProvider, OpenAiEmbedder, ProviderError, RetryConfig, StopReason, Store,
};
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> OpenAiCompatProvider {
    OpenAiCompatProvider::new(Gpt4oMini, Some("test-key".to_string()))
        .unwrap()
        .with_base_url(server.uri())
        .with_retry_config(RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
        })
}

#[tokio::test]
async fn test_chat_completion_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token("test-key"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .generate(vec![Message::user("hi")], vec![], Some("Be brief.".to_string()))
        .await
        .unwrap();

    assert_eq!(response.message.text(), "Hello!");
    assert_eq!(response.stop_reason, StopReason::EndTurn);
    let usage = response.usage.unwrap();
    assert_eq!(usage.input_tokens, 12);
    assert_eq!(usage.output_tokens, 3);
}

#[tokio::test]
async fn test_chat_completion_tool_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "transfer_to_customer_details_agent",
                            "arguments": "{}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .mount(&server)
        .await;

    let response = provider(&server)
        .generate(vec![Message::user("Who is C004?")], vec![], None)
        .await
        .unwrap();

    assert_eq!(response.stop_reason, StopReason::ToolUse);
    let uses = response.message.tool_uses();
    assert_eq!(uses.len(), 1);
    assert_eq!(uses[0].id, "call_1");
    assert_eq!(uses[0].name, "transfer_to_customer_details_agent");
    assert_eq!(uses[0].input, json!({}));
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server)
        .generate(vec![Message::user("hi")], vec![], None)
        .await
        .unwrap_err();
    match err {
        ProviderError::Authentication(msg) => assert!(msg.contains("Incorrect API key")),
        other => panic!("expected auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "recovered"},
                "finish_reason": "stop"
            }]
        })))
        .mount(&server)
        .await;

    let response = provider(&server)
        .generate(vec![Message::user("hi")], vec![], None)
        .await
        .unwrap();
    assert_eq!(response.message.text(), "recovered");
}

#[tokio::test]
async fn test_missing_key_fails_without_request() {
    let server = MockServer::start().await;
    let provider = OpenAiCompatProvider::new(Gpt4oMini, None)
        .unwrap()
        .with_base_url(server.uri());

    let err = provider
        .generate(vec![Message::user("hi")], vec![], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Authentication(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_embeddings_batch_order_is_restored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0, 0.0]},
                {"index": 0, "embedding": [1.0, 0.0, 0.0]}
            ]
        })))
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::new(Some("test-key".to_string()))
        .unwrap()
        .with_base_url(server.uri())
        .with_model("text-embedding-3-small", 3);

    let vectors = embedder
        .embed_documents(&["Cash ISA rate".to_string(), "Pending transfer".to_string()])
        .await
        .unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
}

#[tokio::test]
async fn test_embeddings_back_semantic_search() {
    let server = MockServer::start().await;
    for (input, vector) in [
        ("Cash ISA rate is 4.5%", json!([1.0, 0.0, 0.0])),
        ("Pending transfer to savings", json!([0.0, 1.0, 0.0])),
        ("isa", json!([0.9, 0.1, 0.0])),
    ] {
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(json!({"input": [input]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": vector}]
            })))
            .mount(&server)
            .await;
    }

    let embedder = OpenAiEmbedder::new(Some("test-key".to_string()))
        .unwrap()
        .with_base_url(server.uri())
        .with_model("text-embedding-3-small", 3);
    assert_eq!(embedder.dimensions(), 3);

    let store = InMemoryStore::with_index(IndexConfig::new(Arc::new(embedder)));
    let ns = namespace(["agent_memories"]);
    store
        .put(&ns, "a", json!({"content": "Cash ISA rate is 4.5%"}))
        .await
        .unwrap();
    store
        .put(&ns, "b", json!({"content": "Pending transfer to savings"}))
        .await
        .unwrap();

    let hits = store.search(&ns, Some("isa"), 10, 0).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].item.key, "a");
    assert!(hits[0].score.unwrap() > hits[1].score.unwrap());
}

#[tokio::test]
async fn test_retry_callback_sees_each_failed_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token("late-key"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let retries = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = retries.clone();
    let provider = OpenAiCompatProvider::new(Gpt4oMini, None)
        .unwrap()
        .with_api_key("late-key")
        .with_base_url(server.uri())
        .with_max_retries(2)
        .with_retry_callback(move |info| seen.lock().unwrap().push(info.attempt));

    let err = provider
        .generate(vec![Message::user("hi")], vec![], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::ServiceUnavailable(_)));
    assert_eq!(*retries.lock().unwrap(), vec![1]);
}
