mod common;

use std::sync::Arc;

use common::{BalanceTool, ErrorTool, EventCollector, MockProvider, NoteTool};
use teller_core::{
    namespace, Agent, InMemoryStore, LastN, Message, Prompt, Role, RunContext, Store,
};

#[tokio::test]
async fn test_agent_simple_text_response() {
    let provider = MockProvider::new().with_text("Hello, world!");

    let agent = Agent::builder().provider(provider).build().await.unwrap();

    let response = agent.run("Say hello").await.unwrap();
    assert_eq!(response, "Hello, world!");
}

#[tokio::test]
async fn test_agent_with_tool_use() {
    let provider = MockProvider::new()
        .with_tool_use("check_balance", serde_json::json!({"customer_id": "C001"}))
        .with_text("The balance is 1000.0");

    let agent = Agent::builder()
        .name("balance_expert")
        .provider(provider.clone())
        .add_tool(BalanceTool)
        .with_system_prompt("You are a balance expert.")
        .build()
        .await
        .unwrap();

    let response = agent.run("What is my balance?").await.unwrap();
    assert_eq!(response, "The balance is 1000.0");
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].output, "1000.0");
    assert_eq!(response.tool_calls[0].agent, "balance_expert");
    assert_eq!(response.model_calls, 2);

    // Second call sees the tool result
    let second = provider.messages(1);
    assert_eq!(second.len(), 3);
    assert!(second[2].is_tool_result());
    assert_eq!(
        provider.system_prompt(0).as_deref(),
        Some("You are a balance expert.")
    );
    assert_eq!(provider.tools(0), vec!["check_balance"]);
}

#[tokio::test]
async fn test_agent_invoke_extends_conversation() {
    let provider = MockProvider::new()
        .with_tool_use("check_balance", serde_json::json!({"customer_id": "C001"}))
        .with_text("1000.0");

    let agent = Agent::builder()
        .name("balance_expert")
        .provider(provider)
        .add_tool(BalanceTool)
        .build()
        .await
        .unwrap();

    let history = vec![Message::user("hi"), Message::assistant("hello")];
    let mut input = history.clone();
    input.push(Message::user("balance?"));

    let run = agent.invoke(&input, &RunContext::new()).await.unwrap();

    assert_eq!(run.messages.len(), 6);
    assert_eq!(&run.messages[..2], &history[..]);
    assert_eq!(run.new_messages().len(), 3);
    let last = run.last_message().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.name.as_deref(), Some("balance_expert"));
    assert_eq!(run.text(), "1000.0");
}

#[tokio::test]
async fn test_tool_error_is_reported_to_model() {
    let provider = MockProvider::new()
        .with_tool_use("error_tool", serde_json::json!({"customer_id": "x"}))
        .with_text("Sorry, something went wrong");

    let agent = Agent::builder()
        .provider(provider.clone())
        .add_tool(ErrorTool)
        .build()
        .await
        .unwrap();

    let response = agent.run("Try it").await.unwrap();
    assert_eq!(response, "Sorry, something went wrong");
    assert!(!response.tool_calls[0].success);

    let result_text = provider.messages(1)[2]
        .tool_results_iter()
        .next()
        .unwrap()
        .content
        .as_text();
    assert!(result_text.starts_with("Error:"), "got {}", result_text);
}

#[tokio::test]
async fn test_unknown_tool_does_not_abort_run() {
    let provider = MockProvider::new()
        .with_tool_use("nonexistent_tool", serde_json::json!({}))
        .with_text("Fallback response");

    let agent = Agent::builder().provider(provider).build().await.unwrap();

    let response = agent.run("Use a tool").await.unwrap();
    assert_eq!(response, "Fallback response");
}

#[tokio::test]
async fn test_recursion_limit() {
    let mut provider = MockProvider::new();
    for _ in 0..5 {
        provider = provider.with_tool_use("check_balance", serde_json::json!({"customer_id": "C001"}));
    }

    let agent = Agent::builder()
        .provider(provider.clone())
        .add_tool(BalanceTool)
        .build()
        .await
        .unwrap();

    let ctx = RunContext::new().with_recursion_limit(3);
    let err = agent
        .invoke(&[Message::user("loop")], &ctx)
        .await
        .unwrap_err();
    assert!(err.to_string().contains('3'));
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_stored_prompt_is_read_each_invocation() {
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let ns = namespace(["instructions"]);
    store
        .put(&ns, "email_agent", serde_json::json!({"prompt": "Write good emails."}))
        .await
        .unwrap();

    let provider = MockProvider::new().with_text("one").with_text("two");
    let agent = Agent::builder()
        .name("email_assistant")
        .provider(provider.clone())
        .with_stored_prompt(ns.clone(), "email_agent")
        .build()
        .await
        .unwrap();

    let ctx = RunContext::new().with_store(store.clone());
    agent.invoke(&[Message::user("a")], &ctx).await.unwrap();

    store
        .put(&ns, "email_agent", serde_json::json!({"prompt": "Sign off as William."}))
        .await
        .unwrap();
    agent.invoke(&[Message::user("b")], &ctx).await.unwrap();

    assert_eq!(
        provider.system_prompt(0).as_deref(),
        Some("## Instructions\n\nWrite good emails.")
    );
    assert_eq!(
        provider.system_prompt(1).as_deref(),
        Some("## Instructions\n\nSign off as William.")
    );
}

#[tokio::test]
async fn test_stored_prompt_fallback_and_missing() {
    let provider = MockProvider::new().with_text("ok");
    let agent = Agent::builder()
        .provider(provider.clone())
        .with_prompt(Prompt::stored(namespace(["instructions"]), "missing").or_else("Default."))
        .build()
        .await
        .unwrap();

    let ctx = RunContext::new().with_store(Arc::new(InMemoryStore::new()));
    agent.invoke(&[Message::user("a")], &ctx).await.unwrap();
    assert_eq!(
        provider.system_prompt(0).as_deref(),
        Some("## Instructions\n\nDefault.")
    );

    let strict = Agent::builder()
        .provider(MockProvider::new().with_text("never"))
        .with_stored_prompt(namespace(["instructions"]), "missing")
        .build()
        .await
        .unwrap();
    assert!(strict.invoke(&[Message::user("a")], &ctx).await.is_err());
}

#[tokio::test]
async fn test_tools_receive_thread_and_store() {
    let store = Arc::new(InMemoryStore::new());
    let provider = MockProvider::new()
        .with_tool_use("save_note", serde_json::json!({"note": "likes savings"}))
        .with_text("noted");

    let agent = Agent::builder()
        .name("note_taker")
        .provider(provider)
        .add_tool(NoteTool)
        .build()
        .await
        .unwrap();

    let ctx = RunContext::new()
        .with_thread_id("thread-1")
        .with_store(store.clone());
    agent.invoke(&[Message::user("remember")], &ctx).await.unwrap();

    let item = store
        .get(&namespace(["notes", "thread-1"]), "latest")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.value["content"], "likes savings");
    assert_eq!(item.value["agent"], "note_taker");
}

#[tokio::test]
async fn test_agent_events() {
    let provider = MockProvider::new()
        .with_tool_use("check_balance", serde_json::json!({"customer_id": "C001"}))
        .with_text("done");

    let agent = Agent::builder()
        .name("balance_expert")
        .provider(provider)
        .add_tool(BalanceTool)
        .build()
        .await
        .unwrap();

    let collector = EventCollector::new();
    agent.add_hook(collector.clone());
    agent.run("balance").await.unwrap();

    let events = collector.events();
    assert_eq!(events.first().map(String::as_str), Some("run_started:balance_expert"));
    assert_eq!(events.last().map(String::as_str), Some("run_completed:balance_expert"));
    assert!(events.contains(&"tool_completed".to_string()));
    assert_eq!(
        events.iter().filter(|e| *e == "model_call_started").count(),
        2
    );
}

#[tokio::test]
async fn test_build_without_provider_fails() {
    let err = Agent::builder().build().await.unwrap_err();
    assert!(err.is_config());
}

#[tokio::test]
async fn test_context_policy_limits_what_the_model_sees() {
    let provider = MockProvider::new()
        .with_tool_use("check_balance", serde_json::json!({"customer_id": "C003"}))
        .with_text("Holly's balance is 1000.0");

    let agent = Agent::builder()
        .provider(provider.clone())
        .add_tool(BalanceTool)
        .with_max_concurrent_tools(1)
        .with_context_policy(LastN(2))
        .build()
        .await
        .unwrap();

    agent.run("What is the account balance of Holly Owen?").await.unwrap();

    // The second call only carries the tool call and its result
    let second = provider.messages(1);
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].role, Role::Assistant);
    assert_eq!(second[0].tool_uses().len(), 1);
    assert!(second.iter().all(|m| m.text() != "What is the account balance of Holly Owen?"));
}
