//! Two-phase candidate resolution
//!
//! Phase 1 looks for an invoice carrying the transaction's structured
//! reference and classifies the pairing by amount. Phase 2 falls back to
//! amount-tolerance filtering plus name similarity. Ambiguity is a
//! first-class outcome, not an error: multiple candidates always go to a
//! human.

use bigdecimal::BigDecimal;

use crate::matching::similarity;
use crate::reference;
use crate::types::{BankTransaction, Invoice, MatchConfig, MatchKind};

/// One resolved invoice candidate with its classification
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub invoice: Invoice,
    pub kind: MatchKind,
    pub confidence: u8,
}

/// Outcome of resolving one transaction against an invoice snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// No invoice qualifies
    NoMatch,
    /// Exactly one invoice qualifies
    Single(MatchCandidate),
    /// Several invoices qualify equally; never auto-selected
    Multiple(Vec<MatchCandidate>),
}

/// Two amounts are considered equal within one cent
fn amount_epsilon() -> BigDecimal {
    BigDecimal::from(1) / BigDecimal::from(100)
}

/// Classify a structured-reference hit by comparing the transaction
/// amount to the invoice's outstanding amount
fn classify_by_amount(transaction_amount: &BigDecimal, invoice: &Invoice) -> (MatchKind, u8) {
    let difference = (transaction_amount - &invoice.outstanding_amount).abs();
    if difference < amount_epsilon() {
        (MatchKind::Exact, 100)
    } else if *transaction_amount < invoice.outstanding_amount {
        (MatchKind::Partial, 85)
    } else {
        (MatchKind::Overpayment, 70)
    }
}

/// Whether the transaction amount is within `tolerance_percent` of the
/// invoice's outstanding amount (relative to the outstanding amount)
fn within_amount_tolerance(
    transaction_amount: &BigDecimal,
    outstanding: &BigDecimal,
    tolerance_percent: &BigDecimal,
) -> bool {
    if *outstanding <= BigDecimal::from(0) {
        return false;
    }
    // |txn - outstanding| / outstanding * 100 <= tolerance, rearranged to
    // avoid division
    let difference = (transaction_amount - outstanding).abs();
    difference * BigDecimal::from(100) <= tolerance_percent * outstanding
}

/// Resolve a transaction against a consistent snapshot of a company's
/// open invoices
pub fn resolve(
    transaction: &BankTransaction,
    invoices: &[Invoice],
    config: &MatchConfig,
) -> MatchOutcome {
    if let Some(outcome) = resolve_by_reference(transaction, invoices) {
        return outcome;
    }
    if config.fuzzy_enabled {
        return resolve_fuzzy(transaction, invoices, config);
    }
    MatchOutcome::NoMatch
}

/// Phase 1: exact structured-reference lookup.
///
/// Returns `None` when the transaction carries no valid reference or no
/// invoice shares it, so resolution falls through to phase 2.
fn resolve_by_reference(
    transaction: &BankTransaction,
    invoices: &[Invoice],
) -> Option<MatchOutcome> {
    let extracted = transaction.structured_reference.as_deref()?;
    if !reference::validate(extracted) {
        return None;
    }

    let hits: Vec<&Invoice> = invoices
        .iter()
        .filter(|invoice| invoice.structured_reference.as_deref() == Some(extracted))
        .collect();

    match hits.as_slice() {
        [] => None,
        [invoice] => {
            let (kind, confidence) = classify_by_amount(&transaction.amount, invoice);
            Some(MatchOutcome::Single(MatchCandidate {
                invoice: (*invoice).clone(),
                kind,
                confidence,
            }))
        }
        several => Some(MatchOutcome::Multiple(
            several
                .iter()
                .map(|invoice| {
                    let (kind, confidence) = classify_by_amount(&transaction.amount, invoice);
                    MatchCandidate {
                        invoice: (*invoice).clone(),
                        kind,
                        confidence,
                    }
                })
                .collect(),
        )),
    }
}

/// One ranked invoice suggestion for operator review
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub invoice: Invoice,
    pub score: u8,
    pub reasons: Vec<String>,
}

/// Rank a company's open invoices as manual-review suggestions for a
/// transaction.
///
/// Deliberately looser than [`resolve`]: amount proximity and name
/// similarity each contribute to a composite score, anything above zero
/// qualifies, and the top `max_results` come back ranked. Meant for an
/// operator picking a manual match, never for automatic decisions.
pub fn suggest(
    transaction: &BankTransaction,
    invoices: &[Invoice],
    max_results: usize,
) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = invoices
        .iter()
        .filter_map(|invoice| {
            let mut score = 0u8;
            let mut reasons = Vec::new();

            let difference = (&transaction.amount - &invoice.outstanding_amount).abs();
            if difference < amount_epsilon() {
                score += 50;
                reasons.push("Amount matches outstanding exactly".to_string());
            } else if within_amount_tolerance(
                &transaction.amount,
                &invoice.outstanding_amount,
                &BigDecimal::from(5),
            ) {
                score += 30;
                reasons.push(format!("Amount within 5%: difference {difference}"));
            } else if within_amount_tolerance(
                &transaction.amount,
                &invoice.outstanding_amount,
                &BigDecimal::from(10),
            ) {
                score += 15;
                reasons.push("Amount within 10%".to_string());
            }

            let name_score =
                similarity::score_against(&transaction.counterpart_name, &invoice.all_names());
            if name_score > 0 {
                // Name similarity contributes up to 30 points
                score += (u16::from(name_score) * 30 / 100) as u8;
                reasons.push(format!("Name similarity {name_score}"));
            }

            if score == 0 {
                return None;
            }
            Some(Suggestion {
                invoice: invoice.clone(),
                score,
                reasons,
            })
        })
        .collect();

    suggestions.sort_by(|a, b| b.score.cmp(&a.score));
    suggestions.truncate(max_results);
    suggestions
}

/// Phase 2: amount-tolerance filter, then name similarity against the
/// customer's primary name and aliases.
fn resolve_fuzzy(
    transaction: &BankTransaction,
    invoices: &[Invoice],
    config: &MatchConfig,
) -> MatchOutcome {
    let mut scored: Vec<(&Invoice, u8)> = invoices
        .iter()
        .filter(|invoice| {
            within_amount_tolerance(
                &transaction.amount,
                &invoice.outstanding_amount,
                &config.amount_tolerance_percent,
            )
        })
        .map(|invoice| {
            let names = invoice.all_names();
            (
                invoice,
                similarity::score_against(&transaction.counterpart_name, &names),
            )
        })
        .filter(|(_, score)| *score >= config.fuzzy_threshold)
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));

    match scored.as_slice() {
        [] => MatchOutcome::NoMatch,
        [(invoice, score)] => MatchOutcome::Single(MatchCandidate {
            invoice: (*invoice).clone(),
            kind: MatchKind::Fuzzy,
            confidence: *score,
        }),
        [(top, top_score), (_, runner_up), ..] if top_score > runner_up => {
            // A strictly better score is decisive
            MatchOutcome::Single(MatchCandidate {
                invoice: (*top).clone(),
                kind: MatchKind::Fuzzy,
                confidence: *top_score,
            })
        }
        scored => {
            // Tied top scores are genuinely ambiguous
            let top_score = scored[0].1;
            MatchOutcome::Multiple(
                scored
                    .iter()
                    .take_while(|(_, score)| *score == top_score)
                    .map(|(invoice, score)| MatchCandidate {
                        invoice: (*invoice).clone(),
                        kind: MatchKind::Fuzzy,
                        confidence: *score,
                    })
                    .collect(),
            )
        }
    }
}
