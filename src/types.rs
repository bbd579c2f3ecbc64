//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Direction of a bank movement as seen from the account holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Incoming payment
    Credit,
    /// Outgoing payment
    Debit,
}

impl Direction {
    /// Derive the direction from a signed provider amount.
    /// Positive and zero amounts are treated as credits.
    pub fn from_signed_amount(amount: &BigDecimal) -> Self {
        if *amount < BigDecimal::from(0) {
            Direction::Debit
        } else {
            Direction::Credit
        }
    }
}

/// Lifecycle status of a bank transaction
///
/// `Reconciled`, `Ignored`, and `Error` are terminal: no transition leaves
/// them. `Matched -> Pending` exists so a rejected match re-enters future
/// matching runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Newly ingested or awaiting (re-)matching
    Pending,
    /// One or more proposed matches awaiting review
    Matched,
    /// Payment created, invoice settled
    Reconciled,
    /// Manually excluded from matching
    Ignored,
    /// Processing failed (e.g. payment creation)
    Error,
}

impl TransactionStatus {
    /// Check a status transition, returning the new status or an error
    /// for transitions the lifecycle does not allow.
    pub fn transition(self, next: TransactionStatus) -> ReconcileResult<TransactionStatus> {
        use TransactionStatus::*;
        let allowed = matches!(
            (self, next),
            (Pending, Matched)
                | (Matched, Reconciled)
                // Manual match settles a transaction without a review step
                | (Pending, Reconciled)
                | (Pending, Ignored)
                | (Pending, Error)
                | (Matched, Error)
                // Rejected match resets the transaction for future runs
                | (Matched, Pending)
        );
        if allowed {
            Ok(next)
        } else {
            Err(ReconcileError::InvalidTransition(format!(
                "transaction cannot move from {self:?} to {next:?}"
            )))
        }
    }

    /// Whether no transition leaves this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Reconciled | TransactionStatus::Ignored | TransactionStatus::Error
        )
    }
}

/// Algorithm stage that produced a proposed match; fixed at proposal time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    /// Structured reference hit, amount equals outstanding
    Exact,
    /// Structured reference hit, amount below outstanding
    Partial,
    /// Structured reference hit, amount above outstanding
    Overpayment,
    /// Amount-tolerance plus name-similarity match
    Fuzzy,
    /// Operator-selected pairing
    Manual,
}

/// Disposition status of a proposed match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Awaiting human disposition
    PendingReview,
    /// Approved by a reviewer, payment created
    Approved,
    /// Rejected by a reviewer
    Rejected,
    /// Settled by the engine without review; set only at creation
    AutoReconciled,
}

impl MatchStatus {
    /// Check a disposition transition. Only `PendingReview` may move, and
    /// only to `Approved` or `Rejected`; everything else is terminal.
    pub fn transition(self, next: MatchStatus) -> ReconcileResult<MatchStatus> {
        use MatchStatus::*;
        match (self, next) {
            (PendingReview, Approved) | (PendingReview, Rejected) => Ok(next),
            _ => Err(ReconcileError::StaleState(format!(
                "match cannot move from {self:?} to {next:?}"
            ))),
        }
    }

    /// Whether no transition leaves this status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MatchStatus::PendingReview)
    }
}

/// One bank movement fetched from the provider, normalized but not yet
/// turned into a durable record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Provider-assigned identifier, globally unique per company
    pub external_id: String,
    /// Date the movement was executed
    pub execution_date: NaiveDate,
    /// Value date, when the provider reports one
    pub value_date: Option<NaiveDate>,
    /// Signed amount; the sign carries the direction
    pub amount: BigDecimal,
    /// ISO currency code
    pub currency: String,
    /// Name of the other party
    pub counterpart_name: String,
    /// Account identifier of the other party
    pub counterpart_iban: String,
    /// Free-text remittance information
    pub remittance_information: String,
}

/// Durable record of one bank movement
///
/// Core fields are immutable after creation; only `status`,
/// `matched_invoice`, and `payment_entry` change over the lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransaction {
    /// Internal identifier
    pub id: uuid::Uuid,
    /// Owning company
    pub company: String,
    /// Provider-assigned identifier; (company, external_id) is unique
    pub external_id: String,
    /// Date the movement was executed
    pub transaction_date: NaiveDate,
    /// Value date, when known
    pub value_date: Option<NaiveDate>,
    /// Absolute amount
    pub amount: BigDecimal,
    /// ISO currency code
    pub currency: String,
    /// Credit or debit
    pub direction: Direction,
    /// Name of the other party
    pub counterpart_name: String,
    /// Account identifier of the other party
    pub counterpart_iban: String,
    /// Free-text remittance information
    pub remittance_information: String,
    /// Canonical 12-digit structured reference, if one was extracted
    pub structured_reference: Option<String>,
    /// Lifecycle status
    pub status: TransactionStatus,
    /// Invoice this transaction settled or is proposed against
    pub matched_invoice: Option<String>,
    /// Reference of the payment created for this transaction
    pub payment_entry: Option<String>,
    /// When the record was created
    pub created_at: NaiveDateTime,
}

impl BankTransaction {
    /// Apply a status transition, rejecting illegal moves
    pub fn set_status(&mut self, next: TransactionStatus) -> ReconcileResult<()> {
        self.status = self.status.transition(next)?;
        Ok(())
    }
}

/// Read-only view of a sales invoice owned by the external ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice identifier in the external ledger
    pub id: String,
    /// Customer identifier
    pub customer: String,
    /// Primary customer name
    pub customer_name: String,
    /// Alternate names the customer pays under
    pub alternate_names: Vec<String>,
    /// Invoice total
    pub grand_total: BigDecimal,
    /// Amount still open
    pub outstanding_amount: BigDecimal,
    /// The invoice's own structured reference, if assigned
    pub structured_reference: Option<String>,
}

impl Invoice {
    /// All names this invoice's customer is known under (primary + aliases)
    pub fn all_names(&self) -> Vec<&str> {
        let mut names = vec![self.customer_name.as_str()];
        names.extend(self.alternate_names.iter().map(String::as_str));
        names
    }
}

/// A candidate pairing between a transaction and an invoice awaiting
/// human or automatic disposition; terminal matches are kept for audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedMatch {
    /// Internal identifier
    pub id: uuid::Uuid,
    /// Owning company
    pub company: String,
    /// The transaction side of the pairing
    pub transaction_id: uuid::Uuid,
    /// The invoice side of the pairing
    pub invoice: String,
    /// Algorithm stage that produced this match; never recomputed
    pub kind: MatchKind,
    /// Confidence in 0..=100, fixed at proposal time
    pub confidence: u8,
    /// Invoice total at proposal time
    pub invoice_amount: BigDecimal,
    /// Invoice outstanding amount at proposal time
    pub outstanding_amount: BigDecimal,
    /// Transaction amount
    pub transaction_amount: BigDecimal,
    /// Disposition status
    pub status: MatchStatus,
    /// Free-form audit notes
    pub notes: Vec<String>,
    /// Who disposed of this match
    pub processed_by: Option<String>,
    /// When it was disposed of
    pub processed_at: Option<NaiveDateTime>,
    /// Reference of the payment created from this match
    pub payment_entry: Option<String>,
    /// When the proposal was created
    pub created_at: NaiveDateTime,
}

impl ProposedMatch {
    /// Apply a disposition transition, rejecting illegal moves
    pub fn set_status(&mut self, next: MatchStatus) -> ReconcileResult<()> {
        self.status = self.status.transition(next)?;
        Ok(())
    }
}

/// Per-company matching configuration, consumed as an immutable snapshot
/// for one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Allowed deviation between transaction amount and invoice
    /// outstanding, as a percentage of the outstanding amount
    pub amount_tolerance_percent: BigDecimal,
    /// Minimum similarity score for a fuzzy candidate, 0..=100
    pub fuzzy_threshold: u8,
    /// Whether phase-2 fuzzy matching runs at all
    pub fuzzy_enabled: bool,
    /// Whether exact structured-reference matches settle without review
    pub auto_reconcile_exact: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            amount_tolerance_percent: BigDecimal::from(5),
            fuzzy_threshold: 80,
            fuzzy_enabled: true,
            auto_reconcile_exact: false,
        }
    }
}

impl MatchConfig {
    /// Validate configuration bounds
    pub fn validate(&self) -> ReconcileResult<()> {
        crate::utils::validation::validate_match_config(self)
    }
}

/// Counters accumulated over one per-company reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Raw transactions presented to the run
    pub fetched: usize,
    /// Transactions not previously known
    pub new: usize,
    /// New credit transactions that produced at least one candidate
    pub matched: usize,
    /// Exact matches settled without review
    pub auto_reconciled: usize,
    /// Transactions whose match proposals await human review, including
    /// errored transactions whose proposal was kept
    pub pending_review: usize,
    /// New credit transactions with no candidate at all
    pub no_match: usize,
    /// Transactions that hit a processing failure (e.g. payment creation)
    pub errors: usize,
}

/// Reconciliation activity over a trailing window, for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Length of the window in days
    pub period_days: i64,
    /// All transactions in the window
    pub total_transactions: usize,
    /// Settled transactions
    pub reconciled: usize,
    /// Transactions awaiting review
    pub matched_pending_review: usize,
    /// Transactions with no match
    pub unmatched: usize,
    /// Transactions in error
    pub errors: usize,
    /// Proposed matches still open, regardless of window
    pub pending_matches: usize,
    /// Sum of settled amounts in the window
    pub reconciled_amount: BigDecimal,
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Stale state: {0}")]
    StaleState(String),
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),
    #[error("Payment creation failed: {0}")]
    PaymentCreation(String),
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Match not found: {0}")]
    MatchNotFound(String),
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_status_happy_path() {
        let status = TransactionStatus::Pending;
        let status = status.transition(TransactionStatus::Matched).unwrap();
        let status = status.transition(TransactionStatus::Reconciled).unwrap();
        assert!(status.is_terminal());
    }

    #[test]
    fn test_transaction_status_rejection_reset() {
        let status = TransactionStatus::Matched;
        assert_eq!(
            status.transition(TransactionStatus::Pending).unwrap(),
            TransactionStatus::Pending
        );
    }

    #[test]
    fn test_no_transition_leaves_terminal_statuses() {
        for terminal in [
            TransactionStatus::Reconciled,
            TransactionStatus::Ignored,
            TransactionStatus::Error,
        ] {
            for next in [
                TransactionStatus::Pending,
                TransactionStatus::Matched,
                TransactionStatus::Reconciled,
                TransactionStatus::Ignored,
                TransactionStatus::Error,
            ] {
                assert!(terminal.transition(next).is_err());
            }
        }
    }

    #[test]
    fn test_match_status_transitions() {
        assert!(MatchStatus::PendingReview
            .transition(MatchStatus::Approved)
            .is_ok());
        assert!(MatchStatus::PendingReview
            .transition(MatchStatus::Rejected)
            .is_ok());
        // Approved and Rejected are terminal
        assert!(MatchStatus::Approved
            .transition(MatchStatus::Rejected)
            .is_err());
        assert!(MatchStatus::Rejected
            .transition(MatchStatus::PendingReview)
            .is_err());
        // AutoReconciled is never entered by transition and never left
        assert!(MatchStatus::PendingReview
            .transition(MatchStatus::AutoReconciled)
            .is_err());
        assert!(MatchStatus::AutoReconciled
            .transition(MatchStatus::Approved)
            .is_err());
    }

    #[test]
    fn test_direction_from_signed_amount() {
        assert_eq!(
            Direction::from_signed_amount(&BigDecimal::from(250)),
            Direction::Credit
        );
        assert_eq!(
            Direction::from_signed_amount(&BigDecimal::from(-250)),
            Direction::Debit
        );
    }

    #[test]
    fn test_match_config_reads_from_json() {
        // Hosts typically keep the per-company configuration as JSON
        let config: MatchConfig = serde_json::from_str(
            r#"{
                "amount_tolerance_percent": "2.5",
                "fuzzy_threshold": 90,
                "fuzzy_enabled": true,
                "auto_reconcile_exact": true
            }"#,
        )
        .unwrap();
        assert_eq!(config.fuzzy_threshold, 90);
        assert!(config.auto_reconcile_exact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invoice_all_names() {
        let invoice = Invoice {
            id: "SINV-2024-0001".to_string(),
            customer: "CUST-0001".to_string(),
            customer_name: "ACME NV".to_string(),
            alternate_names: vec!["ACME Corp".to_string(), "ACME Belgium".to_string()],
            grand_total: BigDecimal::from(1000),
            outstanding_amount: BigDecimal::from(1000),
            structured_reference: None,
        };
        assert_eq!(
            invoice.all_names(),
            vec!["ACME NV", "ACME Corp", "ACME Belgium"]
        );
    }
}
