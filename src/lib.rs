//! # Reconciliation Core
//!
//! A library for reconciling inbound bank transactions against
//! outstanding sales invoices across multiple companies, deciding
//! automatically when a transaction and an invoice are the same economic
//! event and routing everything else to a human reviewer.
//!
//! ## Features
//!
//! - **Structured references**: extraction and modulo-97 validation of
//!   Belgian payment references embedded in remittance text
//! - **Two-phase matching**: exact structured-reference lookup, then
//!   amount-tolerant fuzzy matching on counterpart names
//! - **Idempotent ingestion**: raw provider batches become durable
//!   records exactly once, safe against overlapping pages and retries
//! - **Lifecycle state machines**: checked status transitions for
//!   transactions and proposed matches, terminal states kept for audit
//! - **Collaborator injection**: invoice data, storage, and payment
//!   creation are supplied by the host through async traits
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::{
//!     MatchConfig, ReconciliationEngine,
//!     utils::{MemoryInvoices, MemoryStore, RecordingGateway},
//! };
//!
//! // Supply your own InvoiceLookup / ReconciliationStore / PaymentGateway
//! // implementations; the in-memory ones are for testing.
//! let engine = ReconciliationEngine::new(
//!     MemoryStore::new(),
//!     MemoryInvoices::new(),
//!     RecordingGateway::new(),
//! );
//! let _ = (engine, MatchConfig::default());
//! ```

pub mod engine;
pub mod ingest;
pub mod matching;
pub mod reference;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use engine::{CompanyBatch, ManualMatchOutcome, ReconciliationEngine};
pub use matching::{MatchCandidate, MatchOutcome, Suggestion};
pub use traits::*;
pub use types::*;
