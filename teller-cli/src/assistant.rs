//! The banking assistant: three worker agents behind a supervisor
//!
//! Each worker owns one banking lookup tool plus the shared memory tools.
//! The supervisor routes every turn to the worker whose topic matches, based
//! only on its prompt.

use std::path::Path;
use std::sync::Arc;

use teller_core::{
    Agent, App, Checkpointer, Embedder, Gemini2Flash, HashEmbedder, IndexConfig, InMemoryStore,
    ModelProvider, O3Mini, OpenAiCompatProvider, OpenAiEmbedder, Store, Supervisor, Workflow,
};
use teller_tools::banking::{
    CustomerDetailsTool, CustomerDirectory, DocumentRetriever, InterestRatesTool,
    PendingTransactions, PendingTransactionsTool,
};
use teller_tools::memory::{memory_tools, MemoryNamespace};
use teller_tools::retrieval::StoreRetriever;
use teller_tools::sqlite::{SqliteDatabase, TableAgent};

use crate::config::{EmbeddingBackend, Settings};
use crate::error::CliError;

/// Thread used by the shell unless the user starts a new one
pub const DEFAULT_THREAD_ID: &str = "thread-1";

/// Namespace shared by every worker's memory tools
pub const MEMORY_NAMESPACE: &str = "agent_memories";

/// Vector length of `text-embedding-3-small`
pub const EMBEDDING_DIMS: usize = 1536;

/// Supervisor temperature; the reasoning model only accepts 1.0
pub const SUPERVISOR_TEMPERATURE: f32 = 1.0;

pub const INTEREST_RATE_AGENT: &str = "interest_rate_agent";
pub const PENDING_TX_AGENT: &str = "pending_tx_agent";
pub const CUSTOMER_DETAILS_AGENT: &str = "customer_details_agent";

pub const INTEREST_RATE_PROMPT: &str = "You are an interest rate agent. Use the tools provided to retrieve the interest rates from the vector store.";

pub const PENDING_TX_PROMPT: &str = "You are a pending transactions agent. Use the tools provided to retrieve the pending transactions details from the pandas agent.";

pub const CUSTOMER_DETAILS_PROMPT: &str = "You are a customer details agent. Use the tools provided to retrieve the customer details from the sql agent.";

/// Routing prompt; the column lists are descriptive only and not checked against the data
pub const SUPERVISOR_PROMPT: &str = concat!(
    "You are a bank supervisor managing an interest rate agent, pending transactions agent and customer details agent.",
    "For interest rate related queries, use interest_rate_agent. ",
    "For pending transactions related queries, use pending_tx_agent. Pending transaction Pandas DF has the following columns: pending_tx_id,customer_id,pending_date,pending_amount.",
    "For customer details related queries, use customer_details_agent. Customer table has the following columns: id,first_name,last_name,address,account_balance,income,gender,date_of_birth",
);

/// Shown when the shell starts
pub const SAMPLE_QUESTIONS: [&str; 5] = [
    "What is the current interest rate for a Cash ISA Saver's account opened after 18/02/25?",
    "What is the total amount of pending transactions for customer c004?",
    "List all the details of Olivia Stephenson?",
    "What is the account balance of Holly Owen?",
    "What is the total amount of pending transactions for Lewis Morley?",
];

/// The two model handles the assistant uses
#[derive(Clone)]
pub struct BankingModels {
    /// Drives the workers and the table agents
    pub worker: Arc<dyn ModelProvider>,
    /// Drives the supervisor
    pub supervisor: Arc<dyn ModelProvider>,
}

impl BankingModels {
    /// Gemini 2.0 Flash for workers, o3-mini for the supervisor
    pub fn from_settings(settings: &Settings) -> Result<Self, CliError> {
        let mut worker = OpenAiCompatProvider::new(Gemini2Flash, settings.google_api_key.clone())?;
        if let Some(url) = &settings.google_base_url {
            worker = worker.with_base_url(url);
        }

        let mut supervisor = OpenAiCompatProvider::new(O3Mini, settings.openai_api_key.clone())?
            .with_temperature(SUPERVISOR_TEMPERATURE);
        if let Some(url) = &settings.openai_base_url {
            supervisor = supervisor.with_base_url(url);
        }

        Ok(Self {
            worker: Arc::new(worker),
            supervisor: Arc::new(supervisor),
        })
    }
}

/// Where the banking tools get their answers
#[derive(Clone)]
pub struct Collaborators {
    pub retriever: Arc<dyn DocumentRetriever>,
    pub pending: Arc<dyn PendingTransactions>,
    pub customers: Arc<dyn CustomerDirectory>,
}

impl Collaborators {
    /// Load the bundled data from `data_dir`
    ///
    /// - `interest_rates/` documents are chunked into an indexed document store
    /// - `pending_transactions.csv` is loaded into SQLite behind a table agent
    /// - `customers.db` is opened if present, otherwise `customers.csv` is
    ///   loaded, behind a second table agent
    pub async fn from_data_dir(
        data_dir: &Path,
        embedder: Arc<dyn Embedder>,
        provider: Arc<dyn ModelProvider>,
    ) -> Result<Self, CliError> {
        let documents: Arc<dyn Store> = Arc::new(InMemoryStore::with_index(
            IndexConfig::new(embedder).with_fields(["text"]),
        ));
        let retriever = StoreRetriever::new(documents, teller_core::namespace(["interest_rates"]));
        retriever.add_dir(data_dir.join("interest_rates")).await?;

        let pending_db = SqliteDatabase::open_in_memory()?;
        pending_db
            .load_csv("pending_transactions", data_dir.join("pending_transactions.csv"))
            .await?;
        let pending = TableAgent::with_instructions(
            "pandas_agent",
            pending_db,
            provider.clone(),
            "Customer ids are stored in upper case, e.g. C004.",
        )
        .await?;

        let customers_db = match data_dir.join("customers.db") {
            path if path.is_file() => SqliteDatabase::open(path)?,
            _ => {
                let db = SqliteDatabase::open_in_memory()?;
                db.load_csv("customers", data_dir.join("customers.csv")).await?;
                db
            }
        };
        let customers = TableAgent::with_instructions(
            "sql_agent",
            customers_db,
            provider,
            "Match names case-insensitively.",
        )
        .await?;

        Ok(Self {
            retriever: Arc::new(retriever),
            pending: Arc::new(pending),
            customers: Arc::new(customers),
        })
    }
}

/// Embedder for the memory and document stores
pub fn embedder(settings: &Settings) -> Result<Arc<dyn Embedder>, CliError> {
    let embedder: Arc<dyn Embedder> = match settings.embeddings {
        EmbeddingBackend::Hash => Arc::new(HashEmbedder::default()),
        EmbeddingBackend::OpenAi => {
            let mut embedder = OpenAiEmbedder::new(settings.openai_api_key.clone())?
                .with_model("text-embedding-3-small", EMBEDDING_DIMS);
            if let Some(url) = &settings.openai_base_url {
                embedder = embedder.with_base_url(url);
            }
            Arc::new(embedder)
        }
    };
    Ok(embedder)
}

/// Long-term memory store with a semantic index
pub fn memory_store(embedder: Arc<dyn Embedder>) -> Arc<dyn Store> {
    Arc::new(InMemoryStore::with_index(IndexConfig::new(embedder)))
}

async fn worker(
    name: &str,
    prompt: &str,
    provider: Arc<dyn ModelProvider>,
    domain_tool: impl teller_core::Tool + 'static,
) -> teller_core::Result<Agent> {
    Agent::builder()
        .name(name)
        .shared_provider(provider)
        .add_tool(domain_tool)
        .add_tools(memory_tools(MemoryNamespace::new([MEMORY_NAMESPACE])))
        .with_system_prompt(prompt)
        .build()
        .await
}

/// The supervisor over the three banking workers
pub async fn build_supervisor(
    models: &BankingModels,
    collaborators: &Collaborators,
) -> teller_core::Result<Supervisor> {
    let interest_rate_agent = worker(
        INTEREST_RATE_AGENT,
        INTEREST_RATE_PROMPT,
        models.worker.clone(),
        InterestRatesTool::new(collaborators.retriever.clone()),
    )
    .await?;
    let pending_tx_agent = worker(
        PENDING_TX_AGENT,
        PENDING_TX_PROMPT,
        models.worker.clone(),
        PendingTransactionsTool::new(collaborators.pending.clone()),
    )
    .await?;
    let customer_details_agent = worker(
        CUSTOMER_DETAILS_AGENT,
        CUSTOMER_DETAILS_PROMPT,
        models.worker.clone(),
        CustomerDetailsTool::new(collaborators.customers.clone()),
    )
    .await?;

    Supervisor::builder()
        .add_workers([interest_rate_agent, pending_tx_agent, customer_details_agent])
        .shared_provider(models.supervisor.clone())
        .with_system_prompt(SUPERVISOR_PROMPT)
        .build()
        .await
}

/// Build the supervisor and bind it to `store` and `checkpointer`
pub async fn compile(
    models: &BankingModels,
    collaborators: &Collaborators,
    store: Arc<dyn Store>,
    checkpointer: Arc<dyn Checkpointer>,
) -> teller_core::Result<App> {
    let supervisor = build_supervisor(models, collaborators).await?;
    Ok(supervisor.compile(Some(store), Some(checkpointer)))
}

/// Send `query` on `thread_id` and return the answer text
pub async fn chat(app: &App, query: &str, thread_id: &str) -> teller_core::Result<String> {
    app.chat(query, thread_id).await
}
