mod common;

use std::sync::Arc;

use common::{banking_app, in_memory_banking_app, FakeBank};
use serde_json::json;
use teller_cli::assistant::{self, DEFAULT_THREAD_ID};
use teller_cli::repl::EMPTY_QUERY_WARNING;
use teller_cli::{respond, Reply, SqliteCheckpointer};
use teller_core::test_utils::MockProvider;
use teller_core::{InMemoryCheckpointer, ProviderError, Role};

#[tokio::test]
async fn test_empty_query_warns_without_calling_models() {
    let supervisor = MockProvider::new();
    let worker = MockProvider::new();
    let app = in_memory_banking_app(&supervisor, &worker).await;

    for blank in ["", "   ", "\n\t"] {
        let reply = respond(&app, blank, DEFAULT_THREAD_ID).await;
        assert!(matches!(reply, Reply::Warning(w) if w == EMPTY_QUERY_WARNING));
    }
    assert_eq!(supervisor.call_count(), 0);
    assert_eq!(worker.call_count(), 0);
    assert!(app.state(DEFAULT_THREAD_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn test_query_is_sent_trimmed() {
    let supervisor = MockProvider::new().with_text("Hello!");
    let app = in_memory_banking_app(&supervisor, &MockProvider::new()).await;

    let reply = respond(&app, "  hi there \n", DEFAULT_THREAD_ID).await;
    assert!(matches!(reply, Reply::Answer(ref a) if a == "Hello!"));
    assert_eq!(supervisor.requests()[0].messages[0].text(), "hi there");
}

#[tokio::test]
async fn test_chat_returns_last_message() {
    let supervisor = MockProvider::new().with_text("Hello! How can I help with your banking today?");
    let app = in_memory_banking_app(&supervisor, &MockProvider::new()).await;

    let answer = assistant::chat(&app, "hi", DEFAULT_THREAD_ID).await.unwrap();
    assert_eq!(answer, "Hello! How can I help with your banking today?");

    let state = app.state(DEFAULT_THREAD_ID).await.unwrap().unwrap();
    assert_eq!(state.text(), answer);
}

#[tokio::test]
async fn test_pending_tx_question_is_routed_and_passed_through() {
    let supervisor = MockProvider::new()
        .with_tool_use("transfer_to_pending_tx_agent", json!({}))
        .with_text("Customer C004 has 200.00 pending.");
    let worker = MockProvider::new()
        .with_tool_use(
            "get_pending_tx_details_from_pandas_agent",
            json!({"query": "total pending for c004"}),
        )
        .with_text("C004 has 2 pending transactions totalling 200.00.");
    let bank = Arc::new(FakeBank::default());
    let app = banking_app(
        &supervisor,
        &worker,
        bank.clone(),
        Arc::new(InMemoryCheckpointer::new()),
    )
    .await;

    let reply = respond(
        &app,
        "What is the total amount of pending transactions for customer c004?",
        DEFAULT_THREAD_ID,
    )
    .await;
    let Reply::Answer(answer) = reply else {
        panic!("expected an answer, got {:?}", reply);
    };
    assert_eq!(answer, "Customer C004 has 200.00 pending.");

    // The collaborator saw exactly the model's query
    assert_eq!(*bank.queries.lock(), vec!["total pending for c004"]);

    // ...and its answer reached the worker model unchanged
    let requests = worker.requests();
    let tool_output = requests[1]
        .messages
        .last()
        .unwrap()
        .tool_results_iter()
        .next()
        .unwrap()
        .content
        .as_text();
    assert_eq!(
        tool_output,
        "Customer C004 has 2 pending transactions totalling 200.00"
    );

    // The worker has its domain tool and the memory tools, nothing else
    let mut tools: Vec<String> = requests[0].tools.iter().map(|t| t.name.clone()).collect();
    tools.sort();
    assert_eq!(
        tools,
        vec![
            "get_pending_tx_details_from_pandas_agent",
            "manage_memory",
            "search_memory",
        ]
    );

    // The supervisor can hand off to all three workers
    let supervisor_tools: Vec<String> = supervisor.requests()[0]
        .tools
        .iter()
        .map(|t| t.name.clone())
        .collect();
    for worker in ["interest_rate_agent", "pending_tx_agent", "customer_details_agent"] {
        assert!(supervisor_tools.contains(&format!("transfer_to_{}", worker)));
    }
}

#[tokio::test]
async fn test_two_turns_share_a_thread() {
    let supervisor = MockProvider::new()
        .with_text("Nice to meet you, boo.")
        .with_text("Your name is boo.");
    let app = in_memory_banking_app(&supervisor, &MockProvider::new()).await;

    assistant::chat(&app, "my name is boo", DEFAULT_THREAD_ID)
        .await
        .unwrap();
    let answer = assistant::chat(&app, "What is my name?", DEFAULT_THREAD_ID)
        .await
        .unwrap();
    assert_eq!(answer, "Your name is boo.");

    // The second call saw the first turn
    let second = &supervisor.requests()[1].messages;
    assert_eq!(second.len(), 3);
    assert_eq!(second[0].text(), "my name is boo");
    assert_eq!(second[1].role, Role::Assistant);
    assert_eq!(second[2].text(), "What is my name?");

    // Other threads are untouched
    assert!(app.state("thread-2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_turn_reports_error_and_keeps_thread() {
    let supervisor = MockProvider::new()
        .with_text("Hello.")
        .with_error(ProviderError::Network("connection reset".into()));
    let app = in_memory_banking_app(&supervisor, &MockProvider::new()).await;

    assistant::chat(&app, "hi", DEFAULT_THREAD_ID).await.unwrap();
    let reply = respond(&app, "What is the account balance of Holly Owen?", DEFAULT_THREAD_ID).await;
    let Reply::Failed(error) = reply else {
        panic!("expected a failure, got {:?}", reply);
    };
    assert!(error.is_network());

    let state = app.state(DEFAULT_THREAD_ID).await.unwrap().unwrap();
    assert_eq!(state.messages.len(), 2);
}

#[tokio::test]
async fn test_sqlite_checkpoints_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threads.db");

    let supervisor = MockProvider::new().with_text("Noted, boo.");
    let app = banking_app(
        &supervisor,
        &MockProvider::new(),
        Arc::new(FakeBank::default()),
        Arc::new(SqliteCheckpointer::new(&path).unwrap()),
    )
    .await;
    assistant::chat(&app, "my name is boo", DEFAULT_THREAD_ID)
        .await
        .unwrap();
    drop(app);

    let supervisor = MockProvider::new().with_text("Your name is boo.");
    let app = banking_app(
        &supervisor,
        &MockProvider::new(),
        Arc::new(FakeBank::default()),
        Arc::new(SqliteCheckpointer::new(&path).unwrap()),
    )
    .await;
    assistant::chat(&app, "What is my name?", DEFAULT_THREAD_ID)
        .await
        .unwrap();

    let seen = &supervisor.requests()[0].messages;
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].text(), "my name is boo");
    assert_eq!(seen[1].text(), "Noted, boo.");
}

#[tokio::test]
async fn test_bundled_data_loads() {
    use teller_core::HashEmbedder;
    use teller_tools::banking::{DocumentRetriever, PendingTransactions};

    let data_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../data");
    let table_model = MockProvider::new()
        .with_tool_use(
            "sql_query",
            json!({"query": "SELECT SUM(pending_amount) AS total FROM pending_transactions WHERE customer_id = 'C004'"}),
        )
        .with_text("C004 has 510.0 pending.");
    let collaborators = assistant::Collaborators::from_data_dir(
        &data_dir,
        Arc::new(HashEmbedder::default()),
        Arc::new(table_model.clone()),
    )
    .await
    .unwrap();

    let documents = collaborators
        .retriever
        .retrieve("Cash ISA Saver opened after 18/02/25")
        .await
        .unwrap();
    assert!(!documents.is_empty());
    assert!(documents.iter().any(|d| d.contains("4.25% AER")));

    let answer = collaborators
        .pending
        .pending_tx("total pending for c004")
        .await
        .unwrap();
    assert_eq!(answer, "C004 has 510.0 pending.");

    let tool_output = table_model.requests()[1]
        .messages
        .last()
        .unwrap()
        .tool_results_iter()
        .next()
        .unwrap()
        .content
        .as_text();
    assert!(tool_output.contains("510"));
}
