mod common;

use std::sync::Arc;

use common::{BalanceTool, EventCollector, MockProvider, NoteTool};
use teller_core::{
    namespace, Agent, Checkpointer, InMemoryCheckpointer, InMemoryStore, InvokeConfig, Message,
    Store, Supervisor, Workflow,
};

async fn banking_app(
    supervisor_llm: MockProvider,
    worker_llm: MockProvider,
    checkpointer: Arc<InMemoryCheckpointer>,
) -> teller_core::App {
    let balance_expert = Agent::builder()
        .name("balance_expert")
        .provider(worker_llm)
        .add_tool(BalanceTool)
        .build()
        .await
        .unwrap();

    Supervisor::builder()
        .add_worker(balance_expert)
        .provider(supervisor_llm)
        .with_system_prompt("You are a bank supervisor.")
        .build()
        .await
        .unwrap()
        .compile(None, Some(checkpointer))
}

#[tokio::test]
async fn test_chat_returns_last_message_text() {
    let app = banking_app(
        MockProvider::new().with_text("Hello! How can I help?"),
        MockProvider::new(),
        Arc::new(InMemoryCheckpointer::new()),
    )
    .await;

    let answer = app.chat("hi", "thread-1").await.unwrap();
    assert_eq!(answer, "Hello! How can I help?");
}

#[tokio::test]
async fn test_thread_history_is_resumed() {
    let supervisor_llm = MockProvider::new()
        .with_text("Nice to meet you, Holly.")
        .with_text("Your name is Holly.");
    let checkpointer = Arc::new(InMemoryCheckpointer::new());
    let app = banking_app(supervisor_llm.clone(), MockProvider::new(), checkpointer.clone()).await;

    app.chat("My name is Holly", "thread-1").await.unwrap();
    let answer = app.chat("What is my name?", "thread-1").await.unwrap();
    assert_eq!(answer, "Your name is Holly.");

    // Second call carried the first exchange
    let second = supervisor_llm.messages(1);
    assert_eq!(second.len(), 3);
    assert_eq!(second[0].text(), "My name is Holly");
    assert_eq!(second[1].text(), "Nice to meet you, Holly.");

    let checkpoint = checkpointer.load("thread-1").await.unwrap().unwrap();
    assert_eq!(checkpoint.step, 2);
    assert_eq!(checkpoint.messages.len(), 4);
}

#[tokio::test]
async fn test_threads_are_isolated() {
    let supervisor_llm = MockProvider::new().with_text("a").with_text("b");
    let app = banking_app(
        supervisor_llm.clone(),
        MockProvider::new(),
        Arc::new(InMemoryCheckpointer::new()),
    )
    .await;

    app.chat("first", "thread-1").await.unwrap();
    app.chat("second", "thread-2").await.unwrap();

    assert_eq!(supervisor_llm.messages(1).len(), 1);
    let state = app.state("thread-2").await.unwrap().unwrap();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.text(), "b");
}

#[tokio::test]
async fn test_missing_thread_id_is_config_error() {
    let supervisor_llm = MockProvider::new().with_text("unused");
    let app = banking_app(
        supervisor_llm.clone(),
        MockProvider::new(),
        Arc::new(InMemoryCheckpointer::new()),
    )
    .await;

    let err = app
        .invoke(vec![Message::user("hi")], &InvokeConfig::default())
        .await
        .unwrap_err();
    assert!(err.is_config());
    assert_eq!(supervisor_llm.call_count(), 0);
}

#[tokio::test]
async fn test_failed_turn_is_not_checkpointed() {
    let checkpointer = Arc::new(InMemoryCheckpointer::new());
    let app = banking_app(
        MockProvider::new().with_text("first"),
        MockProvider::new(),
        checkpointer.clone(),
    )
    .await;

    app.chat("one", "t").await.unwrap();
    // No responses left: the model call fails
    assert!(app.chat("two", "t").await.is_err());

    let checkpoint = checkpointer.load("t").await.unwrap().unwrap();
    assert_eq!(checkpoint.messages.len(), 2);
    assert_eq!(checkpoint.step, 1);
}

#[tokio::test]
async fn test_app_without_checkpointer_is_stateless() {
    let provider = MockProvider::new().with_text("one").with_text("two");
    let app = Agent::builder()
        .provider(provider.clone())
        .build()
        .await
        .unwrap()
        .compile(None, None);

    app.invoke(vec![Message::user("a")], &InvokeConfig::default())
        .await
        .unwrap();
    app.invoke(vec![Message::user("b")], &InvokeConfig::default())
        .await
        .unwrap();
    assert_eq!(provider.messages(1).len(), 1);
    assert!(app.state("anything").await.unwrap().is_none());
}

#[tokio::test]
async fn test_store_is_passed_to_tools() {
    let store = Arc::new(InMemoryStore::new());
    let app = Agent::builder()
        .name("note_taker")
        .provider(
            MockProvider::new()
                .with_tool_use("save_note", serde_json::json!({"note": "prefers email"}))
                .with_text("ok"),
        )
        .add_tool(NoteTool)
        .build()
        .await
        .unwrap()
        .compile(Some(store.clone()), Some(Arc::new(InMemoryCheckpointer::new())));

    app.chat("remember I prefer email", "thread-9").await.unwrap();

    let item = store
        .get(&namespace(["notes", "thread-9"]), "latest")
        .await
        .unwrap();
    assert_eq!(item.unwrap().value["content"], "prefers email");
}

#[tokio::test]
async fn test_checkpoint_events_and_recursion_limit_override() {
    let checkpointer = Arc::new(InMemoryCheckpointer::new());
    let app = banking_app(
        MockProvider::new()
            .with_tool_use("transfer_to_balance_expert", serde_json::json!({}))
            .with_text("unused"),
        MockProvider::new().with_text("1000.0"),
        checkpointer,
    )
    .await;

    let collector = EventCollector::new();
    app.add_hook(collector.clone());

    let err = app
        .invoke(
            vec![Message::user("balance")],
            &InvokeConfig::thread("t").with_recursion_limit(1),
        )
        .await
        .unwrap_err();
    assert!(err.is_model());

    let events = collector.events();
    assert_eq!(events.first().map(String::as_str), Some("checkpoint_loaded"));
    assert!(!events.contains(&"checkpoint_saved".to_string()));
}
