use crate::core::types::UnitId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CouncilError {
    #[error("no directive recorded for unit {0}")]
    UnitNotFound(UnitId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CouncilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CouncilError::UnitNotFound(UnitId::from("U7"));
        assert_eq!(err.to_string(), "no directive recorded for unit U7");

        let err = CouncilError::InvalidConfig("decision_timeout must be nonzero".into());
        assert!(err.to_string().starts_with("invalid configuration:"));
    }
}
