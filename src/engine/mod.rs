//! Reconciliation engine orchestrating ingestion, matching, and
//! disposition
//!
//! One engine instance serves many companies; each call to
//! [`ReconciliationEngine::reconcile_company`] is an independent pass
//! over one company's raw batch against one snapshot of that company's
//! open invoices. Passes for different companies share no mutable state
//! and a failing company never aborts the others.

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ingest;
use crate::matching::{self, MatchCandidate, MatchOutcome, Suggestion};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_company;

/// Raw batch plus configuration for one company, for multi-company runs
#[derive(Debug, Clone)]
pub struct CompanyBatch {
    pub company: String,
    pub batch: Vec<RawTransaction>,
    pub config: MatchConfig,
}

/// Result of a manual match: the audit record and the created payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualMatchOutcome {
    pub match_id: Uuid,
    pub payment_entry: String,
}

/// Reconciliation engine over injected storage, invoice lookup, and
/// payment creation collaborators
pub struct ReconciliationEngine<S, L, P>
where
    S: ReconciliationStore,
    L: InvoiceLookup,
    P: PaymentGateway,
{
    store: S,
    invoices: L,
    payments: P,
}

impl<S, L, P> ReconciliationEngine<S, L, P>
where
    S: ReconciliationStore,
    L: InvoiceLookup,
    P: PaymentGateway,
{
    /// Create a new engine with the given collaborators
    pub fn new(store: S, invoices: L, payments: P) -> Self {
        Self {
            store,
            invoices,
            payments,
        }
    }

    /// Run one reconciliation pass for a company.
    ///
    /// Ingests the raw batch idempotently, matches every new credit
    /// transaction against a single snapshot of the company's open
    /// invoices, and applies the decision table: exact matches settle
    /// automatically when configured, everything else waits for review.
    /// A payment failure moves only that transaction to `Error`; the
    /// rest of the batch keeps going.
    pub async fn reconcile_company(
        &mut self,
        company: &str,
        batch: &[RawTransaction],
        config: &MatchConfig,
    ) -> ReconcileResult<RunSummary> {
        validate_company(company)?;
        config.validate()?;

        let snapshot = self
            .invoices
            .open_invoices(company)
            .await
            .map_err(|e| ReconcileError::CollaboratorUnavailable(e.to_string()))?;

        let mut summary = RunSummary {
            fetched: batch.len(),
            ..RunSummary::default()
        };

        let (new_records, skipped) = ingest::ingest(company, batch, &self.store).await?;
        summary.new = new_records.len();
        info!(
            company,
            fetched = summary.fetched,
            new = summary.new,
            skipped,
            open_invoices = snapshot.len(),
            "starting reconciliation pass"
        );

        for mut transaction in new_records {
            // Debit records are stored for completeness but never matched
            if transaction.direction == Direction::Debit {
                self.store.save_transaction(&transaction).await?;
                continue;
            }

            match matching::resolve(&transaction, &snapshot, config) {
                MatchOutcome::NoMatch => {
                    debug!(external_id = %transaction.external_id, "no candidate invoice");
                    self.store.save_transaction(&transaction).await?;
                    summary.no_match += 1;
                }
                MatchOutcome::Single(candidate)
                    if candidate.kind == MatchKind::Exact && config.auto_reconcile_exact =>
                {
                    self.store.save_transaction(&transaction).await?;
                    self.auto_reconcile(&mut transaction, &candidate, &mut summary)
                        .await?;
                }
                MatchOutcome::Single(candidate) => {
                    debug!(
                        external_id = %transaction.external_id,
                        invoice = %candidate.invoice.id,
                        kind = ?candidate.kind,
                        confidence = candidate.confidence,
                        "candidate proposed for review"
                    );
                    transaction.set_status(TransactionStatus::Matched)?;
                    transaction.matched_invoice = Some(candidate.invoice.id.clone());
                    self.store.save_transaction(&transaction).await?;
                    let proposed = build_match(&transaction, &candidate, MatchStatus::PendingReview);
                    self.store.save_match(&proposed).await?;
                    summary.matched += 1;
                    summary.pending_review += 1;
                }
                MatchOutcome::Multiple(candidates) => {
                    debug!(
                        external_id = %transaction.external_id,
                        candidates = candidates.len(),
                        "ambiguous candidates proposed for review"
                    );
                    transaction.set_status(TransactionStatus::Matched)?;
                    self.store.save_transaction(&transaction).await?;
                    for candidate in &candidates {
                        let proposed =
                            build_match(&transaction, candidate, MatchStatus::PendingReview);
                        self.store.save_match(&proposed).await?;
                    }
                    summary.matched += 1;
                    summary.pending_review += 1;
                }
            }
        }

        info!(
            company,
            matched = summary.matched,
            auto_reconciled = summary.auto_reconciled,
            pending_review = summary.pending_review,
            no_match = summary.no_match,
            errors = summary.errors,
            "reconciliation pass finished"
        );
        Ok(summary)
    }

    /// Settle an exact match without review. On payment failure the
    /// transaction moves to `Error` and the match is kept for review.
    async fn auto_reconcile(
        &mut self,
        transaction: &mut BankTransaction,
        candidate: &MatchCandidate,
        summary: &mut RunSummary,
    ) -> ReconcileResult<()> {
        match self
            .payments
            .create_payment(transaction.id, &candidate.invoice.id, &transaction.amount)
            .await
        {
            Ok(payment_ref) => {
                transaction.set_status(TransactionStatus::Reconciled)?;
                transaction.matched_invoice = Some(candidate.invoice.id.clone());
                transaction.payment_entry = Some(payment_ref.clone());
                self.store.update_transaction(transaction).await?;

                // Recorded for audit even though no review happened
                let mut proposed = build_match(transaction, candidate, MatchStatus::AutoReconciled);
                proposed.payment_entry = Some(payment_ref);
                proposed.processed_at = Some(Utc::now().naive_utc());
                self.store.save_match(&proposed).await?;

                summary.matched += 1;
                summary.auto_reconciled += 1;
            }
            Err(e) => {
                warn!(
                    external_id = %transaction.external_id,
                    invoice = %candidate.invoice.id,
                    error = %e,
                    "auto-reconcile payment failed"
                );
                let mut proposed = build_match(transaction, candidate, MatchStatus::PendingReview);
                proposed
                    .notes
                    .push(format!("Auto-reconcile failed: {e}"));
                self.store.save_match(&proposed).await?;

                transaction.set_status(TransactionStatus::Error)?;
                self.store.update_transaction(transaction).await?;
                // The candidate still awaits a human, so it counts as
                // matched work pending review alongside the error
                summary.matched += 1;
                summary.pending_review += 1;
                summary.errors += 1;
            }
        }
        Ok(())
    }

    /// Reconcile a sequence of companies, isolating failures: one
    /// company's error never aborts the others.
    pub async fn reconcile_companies(
        &mut self,
        batches: Vec<CompanyBatch>,
    ) -> Vec<(String, ReconcileResult<RunSummary>)> {
        let mut results = Vec::with_capacity(batches.len());
        for CompanyBatch {
            company,
            batch,
            config,
        } in batches
        {
            let result = self.reconcile_company(&company, &batch, &config).await;
            if let Err(e) = &result {
                warn!(company = %company, error = %e, "company pass failed");
            }
            results.push((company, result));
        }
        results
    }

    /// Approve a pending match: create the payment, mark the match
    /// `Approved`, and settle the linked transaction.
    ///
    /// Fails with `StaleState` if the match was already disposed of, or
    /// if the linked transaction reached a terminal status through a
    /// sibling match.
    pub async fn approve(&mut self, match_id: Uuid, actor: &str) -> ReconcileResult<String> {
        let mut proposed = self
            .store
            .get_match(match_id)
            .await?
            .ok_or_else(|| ReconcileError::MatchNotFound(match_id.to_string()))?;
        if proposed.status != MatchStatus::PendingReview {
            return Err(ReconcileError::StaleState(format!(
                "match {match_id} is already {:?}",
                proposed.status
            )));
        }

        let mut transaction = self
            .store
            .get_transaction(proposed.transaction_id)
            .await?
            .ok_or_else(|| {
                ReconcileError::TransactionNotFound(proposed.transaction_id.to_string())
            })?;
        // A sibling candidate may have settled the transaction already
        if transaction.status.is_terminal() {
            return Err(ReconcileError::StaleState(format!(
                "transaction {} is already {:?}",
                transaction.external_id, transaction.status
            )));
        }

        match self
            .payments
            .create_payment(transaction.id, &proposed.invoice, &proposed.transaction_amount)
            .await
        {
            Ok(payment_ref) => {
                proposed.set_status(MatchStatus::Approved)?;
                proposed.processed_by = Some(actor.to_string());
                proposed.processed_at = Some(Utc::now().naive_utc());
                proposed.payment_entry = Some(payment_ref.clone());
                self.store.update_match(&proposed).await?;

                transaction.set_status(TransactionStatus::Reconciled)?;
                transaction.matched_invoice = Some(proposed.invoice.clone());
                transaction.payment_entry = Some(payment_ref.clone());
                self.store.update_transaction(&transaction).await?;

                info!(match_id = %match_id, actor, payment = %payment_ref, "match approved");
                Ok(payment_ref)
            }
            Err(e) => {
                warn!(match_id = %match_id, error = %e, "payment creation failed on approval");
                transaction.set_status(TransactionStatus::Error)?;
                self.store.update_transaction(&transaction).await?;
                Err(e)
            }
        }
    }

    /// Reject a pending match and reset the linked transaction to
    /// `Pending` so it stays eligible for future runs.
    pub async fn reject(&mut self, match_id: Uuid, actor: &str, reason: &str) -> ReconcileResult<()> {
        let mut proposed = self
            .store
            .get_match(match_id)
            .await?
            .ok_or_else(|| ReconcileError::MatchNotFound(match_id.to_string()))?;
        if proposed.status != MatchStatus::PendingReview {
            return Err(ReconcileError::StaleState(format!(
                "match {match_id} is already {:?}",
                proposed.status
            )));
        }

        proposed.set_status(MatchStatus::Rejected)?;
        proposed.processed_by = Some(actor.to_string());
        proposed.processed_at = Some(Utc::now().naive_utc());
        proposed.notes.push(format!("Rejected: {reason}"));
        self.store.update_match(&proposed).await?;

        let mut transaction = self
            .store
            .get_transaction(proposed.transaction_id)
            .await?
            .ok_or_else(|| {
                ReconcileError::TransactionNotFound(proposed.transaction_id.to_string())
            })?;
        // A sibling match may have settled the transaction; leave it alone
        if transaction.status == TransactionStatus::Matched {
            transaction.set_status(TransactionStatus::Pending)?;
            transaction.matched_invoice = None;
            self.store.update_transaction(&transaction).await?;
        }

        info!(match_id = %match_id, actor, reason, "match rejected");
        Ok(())
    }

    /// Pair a transaction with an invoice by operator decision,
    /// bypassing both matching phases, and create the payment
    /// immediately. An audit match record is kept either way.
    pub async fn manual_match(
        &mut self,
        transaction_id: Uuid,
        invoice_id: &str,
        actor: &str,
    ) -> ReconcileResult<ManualMatchOutcome> {
        let mut transaction = self
            .store
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| ReconcileError::TransactionNotFound(transaction_id.to_string()))?;
        match transaction.status {
            TransactionStatus::Reconciled | TransactionStatus::Ignored => {
                return Err(ReconcileError::AlreadyProcessed(format!(
                    "transaction {} is already {:?}",
                    transaction.external_id, transaction.status
                )));
            }
            TransactionStatus::Error => {
                return Err(ReconcileError::InvalidTransition(format!(
                    "transaction {} is in Error and cannot be matched",
                    transaction.external_id
                )));
            }
            TransactionStatus::Pending | TransactionStatus::Matched => {}
        }

        let snapshot = self
            .invoices
            .open_invoices(&transaction.company)
            .await
            .map_err(|e| ReconcileError::CollaboratorUnavailable(e.to_string()))?;
        let invoice = snapshot
            .iter()
            .find(|invoice| invoice.id == invoice_id)
            .ok_or_else(|| ReconcileError::InvoiceNotFound(invoice_id.to_string()))?;

        let candidate = MatchCandidate {
            invoice: invoice.clone(),
            kind: MatchKind::Manual,
            confidence: 100,
        };
        let mut proposed = build_match(&transaction, &candidate, MatchStatus::PendingReview);
        proposed.notes.push(format!("Manually matched by {actor}"));
        self.store.save_match(&proposed).await?;

        match self
            .payments
            .create_payment(transaction.id, invoice_id, &transaction.amount)
            .await
        {
            Ok(payment_ref) => {
                proposed.set_status(MatchStatus::Approved)?;
                proposed.processed_by = Some(actor.to_string());
                proposed.processed_at = Some(Utc::now().naive_utc());
                proposed.payment_entry = Some(payment_ref.clone());
                self.store.update_match(&proposed).await?;

                transaction.set_status(TransactionStatus::Reconciled)?;
                transaction.matched_invoice = Some(invoice_id.to_string());
                transaction.payment_entry = Some(payment_ref.clone());
                self.store.update_transaction(&transaction).await?;

                info!(transaction = %transaction_id, invoice = invoice_id, actor, "manual match settled");
                Ok(ManualMatchOutcome {
                    match_id: proposed.id,
                    payment_entry: payment_ref,
                })
            }
            Err(e) => {
                // Payment failed; the match stays open for later approval
                warn!(transaction = %transaction_id, invoice = invoice_id, error = %e, "manual match payment failed");
                if transaction.status == TransactionStatus::Pending {
                    transaction.set_status(TransactionStatus::Matched)?;
                }
                transaction.matched_invoice = Some(invoice_id.to_string());
                self.store.update_transaction(&transaction).await?;
                Err(e)
            }
        }
    }

    /// Manually exclude a pending transaction from matching
    pub async fn ignore_transaction(
        &mut self,
        transaction_id: Uuid,
        actor: &str,
    ) -> ReconcileResult<()> {
        let mut transaction = self
            .store
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| ReconcileError::TransactionNotFound(transaction_id.to_string()))?;
        transaction.set_status(TransactionStatus::Ignored)?;
        self.store.update_transaction(&transaction).await?;
        info!(transaction = %transaction_id, actor, "transaction ignored");
        Ok(())
    }

    /// Ranked invoice suggestions for a transaction, for an operator
    /// picking a manual match after automatic matching found nothing.
    /// Looser than the matching phases; weak suggestions are the
    /// operator's to dismiss.
    pub async fn potential_matches(
        &self,
        transaction_id: Uuid,
        max_results: usize,
    ) -> ReconcileResult<Vec<Suggestion>> {
        let transaction = self
            .store
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| ReconcileError::TransactionNotFound(transaction_id.to_string()))?;
        let snapshot = self
            .invoices
            .open_invoices(&transaction.company)
            .await
            .map_err(|e| ReconcileError::CollaboratorUnavailable(e.to_string()))?;
        Ok(matching::suggest(&transaction, &snapshot, max_results))
    }

    /// Proposed matches awaiting review for a company
    pub async fn pending_matches(&self, company: &str) -> ReconcileResult<Vec<ProposedMatch>> {
        self.store.pending_matches(company).await
    }

    /// Credit transactions still unmatched for a company
    pub async fn unmatched_transactions(
        &self,
        company: &str,
    ) -> ReconcileResult<Vec<BankTransaction>> {
        self.store.unmatched_transactions(company).await
    }

    /// Reconciliation activity over the trailing `days` window
    pub async fn summary(&self, company: &str, days: i64) -> ReconcileResult<ReconciliationSummary> {
        let since = Utc::now().date_naive() - Duration::days(days);
        let transactions = self.store.transactions_since(company, since).await?;

        let mut reconciled = 0;
        let mut matched_pending_review = 0;
        let mut unmatched = 0;
        let mut errors = 0;
        let mut reconciled_amount = bigdecimal::BigDecimal::from(0);
        for transaction in &transactions {
            match transaction.status {
                TransactionStatus::Reconciled => {
                    reconciled += 1;
                    reconciled_amount += &transaction.amount;
                }
                TransactionStatus::Matched => matched_pending_review += 1,
                TransactionStatus::Pending => unmatched += 1,
                TransactionStatus::Error => errors += 1,
                TransactionStatus::Ignored => {}
            }
        }

        let pending_matches = self.store.pending_matches(company).await?.len();

        Ok(ReconciliationSummary {
            period_days: days,
            total_transactions: transactions.len(),
            reconciled,
            matched_pending_review,
            unmatched,
            errors,
            pending_matches,
            reconciled_amount,
        })
    }
}

/// Build a proposed-match record from a transaction and a resolved
/// candidate, freezing the amounts and confidence at proposal time
fn build_match(
    transaction: &BankTransaction,
    candidate: &MatchCandidate,
    status: MatchStatus,
) -> ProposedMatch {
    ProposedMatch {
        id: Uuid::new_v4(),
        company: transaction.company.clone(),
        transaction_id: transaction.id,
        invoice: candidate.invoice.id.clone(),
        kind: candidate.kind,
        confidence: candidate.confidence,
        invoice_amount: candidate.invoice.grand_total.clone(),
        outstanding_amount: candidate.invoice.outstanding_amount.clone(),
        transaction_amount: transaction.amount.clone(),
        status,
        notes: Vec::new(),
        processed_by: None,
        processed_at: None,
        payment_entry: None,
        created_at: Utc::now().naive_utc(),
    }
}
