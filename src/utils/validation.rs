//! Validation utilities

use bigdecimal::BigDecimal;

use crate::types::*;

/// Validate a company identifier
pub fn validate_company(company: &str) -> ReconcileResult<()> {
    if company.trim().is_empty() {
        return Err(ReconcileError::Validation(
            "Company cannot be empty".to_string(),
        ));
    }

    if company.len() > 140 {
        return Err(ReconcileError::Validation(
            "Company cannot exceed 140 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate matching configuration bounds
pub fn validate_match_config(config: &MatchConfig) -> ReconcileResult<()> {
    if config.amount_tolerance_percent < BigDecimal::from(0)
        || config.amount_tolerance_percent > BigDecimal::from(100)
    {
        return Err(ReconcileError::Validation(format!(
            "Amount tolerance must be between 0 and 100 percent, got {}",
            config.amount_tolerance_percent
        )));
    }

    if config.fuzzy_threshold > 100 {
        return Err(ReconcileError::Validation(format!(
            "Fuzzy threshold must be between 0 and 100, got {}",
            config.fuzzy_threshold
        )));
    }

    Ok(())
}
