//! Traits for collaborator injection
//!
//! The engine performs no I/O of its own: invoice data, durable storage,
//! and payment creation are all supplied by the host application through
//! these traits. The engine never retries a failed call; retry policy
//! belongs to the implementations.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::types::*;

/// Read access to the open sales invoices of a company
///
/// The engine fetches one snapshot per reconciliation pass and resolves
/// every transaction in that pass against it; outstanding-amount changes
/// from concurrent approvals show up in the next pass.
#[async_trait]
pub trait InvoiceLookup: Send + Sync {
    /// List invoices with an outstanding balance for a company
    async fn open_invoices(&self, company: &str) -> ReconcileResult<Vec<Invoice>>;
}

/// Storage abstraction for transactions and proposed matches
///
/// Allows the reconciliation core to work with any storage backend
/// (PostgreSQL, SQLite, in-memory, etc.) by implementing these methods.
#[async_trait]
pub trait ReconciliationStore: Send + Sync {
    /// Whether a transaction with this external identifier is already known
    async fn transaction_exists(&self, company: &str, external_id: &str) -> ReconcileResult<bool>;

    /// Save a new transaction record
    async fn save_transaction(&mut self, transaction: &BankTransaction) -> ReconcileResult<()>;

    /// Get a transaction by internal id
    async fn get_transaction(&self, id: Uuid) -> ReconcileResult<Option<BankTransaction>>;

    /// Update an existing transaction record
    async fn update_transaction(&mut self, transaction: &BankTransaction) -> ReconcileResult<()>;

    /// Credit transactions still in `Pending` for a company
    async fn unmatched_transactions(&self, company: &str) -> ReconcileResult<Vec<BankTransaction>>;

    /// All transactions for a company dated on or after `since`
    async fn transactions_since(
        &self,
        company: &str,
        since: NaiveDate,
    ) -> ReconcileResult<Vec<BankTransaction>>;

    /// Save a new proposed match
    async fn save_match(&mut self, proposed: &ProposedMatch) -> ReconcileResult<()>;

    /// Get a proposed match by id
    async fn get_match(&self, id: Uuid) -> ReconcileResult<Option<ProposedMatch>>;

    /// Update an existing proposed match
    async fn update_match(&mut self, proposed: &ProposedMatch) -> ReconcileResult<()>;

    /// Proposed matches awaiting review for a company
    async fn pending_matches(&self, company: &str) -> ReconcileResult<Vec<ProposedMatch>>;
}

/// Payment creation delegated to the external ledger
///
/// Creating a payment is the only way this core affects invoice state;
/// the ledger marks the invoice paid as a consequence.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment settling `amount` of `invoice_id` from the given
    /// transaction; returns the ledger's payment reference
    async fn create_payment(
        &mut self,
        transaction_id: Uuid,
        invoice_id: &str,
        amount: &BigDecimal,
    ) -> ReconcileResult<String>;
}
