pub mod banking;
pub mod memory;
pub mod retrieval;
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export tool grouping functions at crate root for convenience
pub use banking::{banking_tools, CustomerDirectory, DocumentRetriever, PendingTransactions};
pub use memory::{memory_tools, MemoryNamespace};
pub use retrieval::StoreRetriever;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use schemars::JsonSchema;
    pub use serde::{Deserialize, Serialize};
    pub use teller_core::{Tool, ToolContext, ToolError, ToolResult};
}
