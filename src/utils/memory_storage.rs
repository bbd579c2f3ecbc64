//! In-memory collaborator implementations for testing and development

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// In-memory reconciliation store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    transactions: Arc<RwLock<HashMap<Uuid, BankTransaction>>>,
    matches: Arc<RwLock<HashMap<Uuid, ProposedMatch>>>,
}

impl MemoryStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.transactions.write().unwrap().clear();
        self.matches.write().unwrap().clear();
    }

    /// All transaction records for a company, for test assertions
    pub fn transactions_for(&self, company: &str) -> Vec<BankTransaction> {
        let mut records: Vec<BankTransaction> = self
            .transactions
            .read()
            .unwrap()
            .values()
            .filter(|txn| txn.company == company)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records
    }

    /// All match records for a company, for test assertions
    pub fn matches_for(&self, company: &str) -> Vec<ProposedMatch> {
        let mut records: Vec<ProposedMatch> = self
            .matches
            .read()
            .unwrap()
            .values()
            .filter(|m| m.company == company)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records
    }
}

#[async_trait]
impl ReconciliationStore for MemoryStore {
    async fn transaction_exists(&self, company: &str, external_id: &str) -> ReconcileResult<bool> {
        Ok(self
            .transactions
            .read()
            .unwrap()
            .values()
            .any(|txn| txn.company == company && txn.external_id == external_id))
    }

    async fn save_transaction(&mut self, transaction: &BankTransaction) -> ReconcileResult<()> {
        self.transactions
            .write()
            .unwrap()
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn get_transaction(&self, id: Uuid) -> ReconcileResult<Option<BankTransaction>> {
        Ok(self.transactions.read().unwrap().get(&id).cloned())
    }

    async fn update_transaction(&mut self, transaction: &BankTransaction) -> ReconcileResult<()> {
        let mut transactions = self.transactions.write().unwrap();
        if transactions.contains_key(&transaction.id) {
            transactions.insert(transaction.id, transaction.clone());
            Ok(())
        } else {
            Err(ReconcileError::TransactionNotFound(
                transaction.id.to_string(),
            ))
        }
    }

    async fn unmatched_transactions(&self, company: &str) -> ReconcileResult<Vec<BankTransaction>> {
        let mut records: Vec<BankTransaction> = self
            .transactions
            .read()
            .unwrap()
            .values()
            .filter(|txn| {
                txn.company == company
                    && txn.status == TransactionStatus::Pending
                    && txn.direction == Direction::Credit
            })
            .cloned()
            .collect();
        records.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
        Ok(records)
    }

    async fn transactions_since(
        &self,
        company: &str,
        since: NaiveDate,
    ) -> ReconcileResult<Vec<BankTransaction>> {
        let records: Vec<BankTransaction> = self
            .transactions
            .read()
            .unwrap()
            .values()
            .filter(|txn| txn.company == company && txn.transaction_date >= since)
            .cloned()
            .collect();
        Ok(records)
    }

    async fn save_match(&mut self, proposed: &ProposedMatch) -> ReconcileResult<()> {
        self.matches
            .write()
            .unwrap()
            .insert(proposed.id, proposed.clone());
        Ok(())
    }

    async fn get_match(&self, id: Uuid) -> ReconcileResult<Option<ProposedMatch>> {
        Ok(self.matches.read().unwrap().get(&id).cloned())
    }

    async fn update_match(&mut self, proposed: &ProposedMatch) -> ReconcileResult<()> {
        let mut matches = self.matches.write().unwrap();
        if matches.contains_key(&proposed.id) {
            matches.insert(proposed.id, proposed.clone());
            Ok(())
        } else {
            Err(ReconcileError::MatchNotFound(proposed.id.to_string()))
        }
    }

    async fn pending_matches(&self, company: &str) -> ReconcileResult<Vec<ProposedMatch>> {
        let mut records: Vec<ProposedMatch> = self
            .matches
            .read()
            .unwrap()
            .values()
            .filter(|m| m.company == company && m.status == MatchStatus::PendingReview)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

/// In-memory invoice lookup with switchable per-company outages
#[derive(Debug, Clone, Default)]
pub struct MemoryInvoices {
    invoices: Arc<RwLock<HashMap<String, Vec<Invoice>>>>,
    unavailable: Arc<RwLock<HashSet<String>>>,
}

impl MemoryInvoices {
    /// Create a new invoice lookup instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open invoice for a company
    pub fn add_invoice(&self, company: &str, invoice: Invoice) {
        self.invoices
            .write()
            .unwrap()
            .entry(company.to_string())
            .or_default()
            .push(invoice);
    }

    /// Make lookups for a company fail, to exercise outage handling
    pub fn set_unavailable(&self, company: &str, unavailable: bool) {
        let mut set = self.unavailable.write().unwrap();
        if unavailable {
            set.insert(company.to_string());
        } else {
            set.remove(company);
        }
    }
}

#[async_trait]
impl InvoiceLookup for MemoryInvoices {
    async fn open_invoices(&self, company: &str) -> ReconcileResult<Vec<Invoice>> {
        if self.unavailable.read().unwrap().contains(company) {
            return Err(ReconcileError::CollaboratorUnavailable(format!(
                "invoice lookup for {company} is unavailable"
            )));
        }
        Ok(self
            .invoices
            .read()
            .unwrap()
            .get(company)
            .cloned()
            .unwrap_or_default())
    }
}

/// One payment created through [`RecordingGateway`]
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub reference: String,
    pub transaction_id: Uuid,
    pub invoice_id: String,
    pub amount: BigDecimal,
}

/// Payment gateway that records every created payment and can be
/// switched into a failing mode
#[derive(Debug, Clone, Default)]
pub struct RecordingGateway {
    payments: Arc<RwLock<Vec<PaymentRecord>>>,
    counter: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

impl RecordingGateway {
    /// Create a new recording gateway
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent payment attempt fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Payments created so far
    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.payments.read().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_payment(
        &mut self,
        transaction_id: Uuid,
        invoice_id: &str,
        amount: &BigDecimal,
    ) -> ReconcileResult<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReconcileError::PaymentCreation(format!(
                "payment for invoice {invoice_id} refused"
            )));
        }
        let sequence = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = format!("PAY-{sequence:04}");
        self.payments.write().unwrap().push(PaymentRecord {
            reference: reference.clone(),
            transaction_id,
            invoice_id: invoice_id.to_string(),
            amount: amount.clone(),
        });
        Ok(reference)
    }
}
