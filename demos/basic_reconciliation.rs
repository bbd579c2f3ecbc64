//! Basic reconciliation usage example

use bigdecimal::BigDecimal;
use chrono::Utc;
use reconciliation_core::utils::{MemoryInvoices, MemoryStore, RecordingGateway};
use reconciliation_core::{Invoice, MatchConfig, RawTransaction, ReconciliationEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🏦 Reconciliation Core - Basic Example\n");

    // Create an engine over in-memory collaborators
    let store = MemoryStore::new();
    let invoices = MemoryInvoices::new();
    let gateway = RecordingGateway::new();
    let mut engine =
        ReconciliationEngine::new(store.clone(), invoices.clone(), gateway.clone());

    // 1. Register some open invoices for the company
    println!("📄 Registering Open Invoices...");
    let company = "Betoled";
    invoices.add_invoice(
        company,
        Invoice {
            id: "SINV-2024-0001".to_string(),
            customer: "CUST-0001".to_string(),
            customer_name: "ACME NV".to_string(),
            alternate_names: vec!["ACME Corp".to_string()],
            grand_total: BigDecimal::from(1000),
            outstanding_amount: BigDecimal::from(1000),
            // 1234567890 % 97 == 2
            structured_reference: Some("123456789002".to_string()),
        },
    );
    invoices.add_invoice(
        company,
        Invoice {
            id: "SINV-2024-0002".to_string(),
            customer: "CUST-0002".to_string(),
            customer_name: "Jansen Holding NV".to_string(),
            alternate_names: Vec::new(),
            grand_total: BigDecimal::from(2500),
            outstanding_amount: BigDecimal::from(2500),
            structured_reference: None,
        },
    );
    println!("  ✓ SINV-2024-0001: ACME NV, €1000 outstanding");
    println!("  ✓ SINV-2024-0002: Jansen Holding NV, €2500 outstanding\n");

    // 2. Feed in a raw bank batch
    println!("💳 Reconciling a Bank Batch...");
    let batch = vec![
        // Carries the structured reference of SINV-2024-0001
        raw_transaction("txn-001", 1000, "ACME Corp", "+++123/4567/89002+++"),
        // No reference, but the counterpart name matches a customer
        raw_transaction("txn-002", 2500, "Jansen Holding NV", "invoice february"),
        // Nothing to go on
        raw_transaction("txn-003", 740, "Unknown Sender", "???"),
    ];

    let config = MatchConfig {
        auto_reconcile_exact: true,
        ..MatchConfig::default()
    };
    let summary = engine.reconcile_company(company, &batch, &config).await?;

    println!("  Fetched:          {}", summary.fetched);
    println!("  New:              {}", summary.new);
    println!("  Matched:          {}", summary.matched);
    println!("  Auto-reconciled:  {}", summary.auto_reconciled);
    println!("  Pending review:   {}", summary.pending_review);
    println!("  No match:         {}\n", summary.no_match);

    // 3. Review the proposed matches
    println!("🔍 Reviewing Proposed Matches...");
    let pending = engine.pending_matches(company).await?;
    for proposed in &pending {
        println!(
            "  {} -> {} ({:?}, confidence {})",
            proposed.transaction_id, proposed.invoice, proposed.kind, proposed.confidence
        );
    }

    if let Some(first) = pending.first() {
        let payment_ref = engine.approve(first.id, "demo-reviewer").await?;
        println!("  ✓ Approved, payment {payment_ref} created\n");
    }

    // 4. Inspect the results
    println!("📈 Reconciliation Summary (last 30 days):");
    let report = engine.summary(company, 30).await?;
    println!("  Total transactions: {}", report.total_transactions);
    println!("  Reconciled:         {}", report.reconciled);
    println!("  Unmatched:          {}", report.unmatched);
    println!("  Reconciled amount:  €{}", report.reconciled_amount);

    println!("\n💸 Payments Created:");
    for payment in gateway.payments() {
        println!(
            "  {} settles {} with €{}",
            payment.reference, payment.invoice_id, payment.amount
        );
    }

    println!("\n🎉 Example completed successfully!");
    Ok(())
}

fn raw_transaction(
    external_id: &str,
    amount: i64,
    counterpart: &str,
    remittance: &str,
) -> RawTransaction {
    RawTransaction {
        external_id: external_id.to_string(),
        execution_date: Utc::now().date_naive(),
        value_date: None,
        amount: BigDecimal::from(amount),
        currency: "EUR".to_string(),
        counterpart_name: counterpart.to_string(),
        counterpart_iban: "BE68539007547034".to_string(),
        remittance_information: remittance.to_string(),
    }
}
