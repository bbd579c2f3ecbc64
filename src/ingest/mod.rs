//! Idempotent ingestion of raw transaction batches
//!
//! Providers return overlapping pages and a crashed run is recovered by
//! simply re-invoking ingestion, so the same raw batch must be safe to
//! feed in any number of times: known external identifiers are skipped,
//! and duplicates within one batch collapse to their first occurrence.

use std::collections::HashSet;

use crate::reference;
use crate::traits::ReconciliationStore;
use crate::types::*;

/// Turn one raw provider record into a durable `Pending` record
pub fn normalize(company: &str, raw: &RawTransaction) -> BankTransaction {
    let direction = Direction::from_signed_amount(&raw.amount);
    BankTransaction {
        id: uuid::Uuid::new_v4(),
        company: company.to_string(),
        external_id: raw.external_id.clone(),
        transaction_date: raw.execution_date,
        value_date: raw.value_date,
        amount: raw.amount.abs(),
        currency: raw.currency.clone(),
        direction,
        counterpart_name: raw.counterpart_name.clone(),
        counterpart_iban: raw.counterpart_iban.clone(),
        remittance_information: raw.remittance_information.clone(),
        structured_reference: reference::extract(&raw.remittance_information),
        status: TransactionStatus::Pending,
        matched_invoice: None,
        payment_entry: None,
        created_at: chrono::Utc::now().naive_utc(),
    }
}

/// Filter a raw batch down to transactions not yet known and normalize
/// them, preserving input order.
///
/// Returns the new records and the number of skipped raw entries
/// (intra-batch duplicates plus already-known identifiers). The injected
/// existence check is the only collaborator touched; a failure there maps
/// to `CollaboratorUnavailable`.
pub async fn ingest<S: ReconciliationStore>(
    company: &str,
    batch: &[RawTransaction],
    store: &S,
) -> ReconcileResult<(Vec<BankTransaction>, usize)> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut new_records = Vec::new();
    let mut skipped = 0usize;

    for raw in batch {
        // First occurrence wins within the batch
        if !seen.insert(raw.external_id.as_str()) {
            skipped += 1;
            continue;
        }

        let known = store
            .transaction_exists(company, &raw.external_id)
            .await
            .map_err(|e| ReconcileError::CollaboratorUnavailable(e.to_string()))?;
        if known {
            skipped += 1;
            continue;
        }

        new_records.push(normalize(company, raw));
    }

    Ok((new_records, skipped))
}
