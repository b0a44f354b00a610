use validator::ValidationError;

use crate::constants::FLAIR_TIERS;

pub fn validate_investment(investment: f64) -> Result<(), ValidationError> {
    if !investment.is_finite() {
        return Err(ValidationError::new("malformed_investment"));
    }
    if investment < 0.0 {
        return Err(ValidationError::new("negative_investment"));
    }
    Ok(())
}

pub fn validate_flair_pct(flair_pct: f64) -> Result<(), ValidationError> {
    if !FLAIR_TIERS.contains(&flair_pct) {
        return Err(ValidationError::new("invalid_flair_tier"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_investment_bounds() {
        assert!(validate_investment(0.0).is_ok());
        assert!(validate_investment(100.0).is_ok());
        assert!(validate_investment(-1.0).is_err());
        assert!(validate_investment(f64::NAN).is_err());
    }

    #[test]
    fn test_flair_tiers() {
        assert!(validate_flair_pct(5.0).is_ok());
        assert!(validate_flair_pct(10.0).is_ok());
        assert!(validate_flair_pct(15.0).is_ok());
        assert!(validate_flair_pct(7.5).is_err());
        assert!(validate_flair_pct(-5.0).is_err());
    }
}
