//! Participant identities.

use serde::{Deserialize, Serialize};

/// Address - identity of a federation participant (owner, airline,
/// passenger, or oracle). Authentication happens in the calling context;
/// the ledger treats addresses as opaque, already-verified identities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_creation() {
        let addr = Address::new("airline:AL1");
        assert_eq!(addr.as_str(), "airline:AL1");
        assert_eq!(addr.to_string(), "airline:AL1");
    }
}
