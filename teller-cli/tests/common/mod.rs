//! Fake collaborators and app builders shared across test files.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use teller_cli::assistant::{self, BankingModels, Collaborators};
use teller_core::test_utils::MockProvider;
use teller_core::{App, Checkpointer, InMemoryCheckpointer, InMemoryStore, Store, ToolError};
use teller_tools::banking::{CustomerDirectory, DocumentRetriever, PendingTransactions};

/// Answers every collaborator call from fixed data and records the queries
#[derive(Default)]
pub struct FakeBank {
    pub queries: Mutex<Vec<String>>,
}

#[async_trait]
impl DocumentRetriever for FakeBank {
    async fn retrieve(&self, query: &str) -> Result<Vec<String>, ToolError> {
        self.queries.lock().push(query.to_string());
        Ok(vec![
            "Cash ISA Saver, accounts opened on or after 18/02/25: 4.25% AER variable".to_string(),
        ])
    }
}

#[async_trait]
impl PendingTransactions for FakeBank {
    async fn pending_tx(&self, query: &str) -> Result<String, ToolError> {
        self.queries.lock().push(query.to_string());
        Ok("Customer C004 has 2 pending transactions totalling 200.00".to_string())
    }
}

#[async_trait]
impl CustomerDirectory for FakeBank {
    async fn customer_details(&self, query: &str) -> Result<String, ToolError> {
        self.queries.lock().push(query.to_string());
        Ok("Holly Owen has an account balance of 5230.10".to_string())
    }
}

pub fn collaborators(bank: Arc<FakeBank>) -> Collaborators {
    Collaborators {
        retriever: bank.clone(),
        pending: bank.clone(),
        customers: bank,
    }
}

/// The banking app over scripted models and the fake bank
pub async fn banking_app(
    supervisor: &MockProvider,
    worker: &MockProvider,
    bank: Arc<FakeBank>,
    checkpointer: Arc<dyn Checkpointer>,
) -> App {
    let models = BankingModels {
        worker: Arc::new(worker.clone()),
        supervisor: Arc::new(supervisor.clone()),
    };
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    assistant::compile(&models, &collaborators(bank), store, checkpointer)
        .await
        .unwrap()
}

pub async fn in_memory_banking_app(supervisor: &MockProvider, worker: &MockProvider) -> App {
    banking_app(
        supervisor,
        worker,
        Arc::new(FakeBank::default()),
        Arc::new(InMemoryCheckpointer::new()),
    )
    .await
}
