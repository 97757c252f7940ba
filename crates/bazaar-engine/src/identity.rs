//! # Identity Seam
//!
//! Authentication lives outside the engine. The presentation layer hands
//! the engine an opaque token; an [`IdentityResolver`] turns it into a
//! [`Principal`] and the engine only ever sees seller and buyer ids.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Who is calling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Principal {
    Seller(String),
    Buyer(String),
}

impl Principal {
    pub fn id(&self) -> &str {
        match self {
            Principal::Seller(id) | Principal::Buyer(id) => id,
        }
    }

    /// The seller id, or `Unauthorized` for a buyer.
    pub fn require_seller(&self) -> EngineResult<&str> {
        match self {
            Principal::Seller(id) => Ok(id),
            Principal::Buyer(_) => Err(EngineError::Unauthorized(
                "seller account required".into(),
            )),
        }
    }

    /// The buyer id, or `Unauthorized` for a seller.
    pub fn require_buyer(&self) -> EngineResult<&str> {
        match self {
            Principal::Buyer(id) => Ok(id),
            Principal::Seller(_) => Err(EngineError::Unauthorized(
                "buyer account required".into(),
            )),
        }
    }
}

/// Resolves a session token to the principal behind it.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, token: &str) -> EngineResult<Principal>;
}

/// Fixed token table for tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    tokens: HashMap<String, Principal>,
}

impl StaticIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seller(mut self, token: impl Into<String>, seller_id: impl Into<String>) -> Self {
        self.tokens
            .insert(token.into(), Principal::Seller(seller_id.into()));
        self
    }

    pub fn with_buyer(mut self, token: impl Into<String>, buyer_id: impl Into<String>) -> Self {
        self.tokens
            .insert(token.into(), Principal::Buyer(buyer_id.into()));
        self
    }
}

impl IdentityResolver for StaticIdentity {
    fn resolve(&self, token: &str) -> EngineResult<Principal> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| EngineError::Unauthorized("unknown session token".into()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::ErrorKind;

    fn identities() -> StaticIdentity {
        StaticIdentity::new()
            .with_seller("tok-seller", "seller-1")
            .with_buyer("tok-buyer", "buyer-1")
    }

    #[test]
    fn test_resolve_known_tokens() {
        let ids = identities();
        assert_eq!(
            ids.resolve("tok-seller").unwrap(),
            Principal::Seller("seller-1".into())
        );
        assert_eq!(ids.resolve("tok-buyer").unwrap().id(), "buyer-1");
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let err = identities().resolve("forged").unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_role_guards() {
        let seller = Principal::Seller("seller-1".into());
        assert_eq!(seller.require_seller().unwrap(), "seller-1");
        assert!(seller.require_buyer().is_err());

        let buyer = Principal::Buyer("buyer-1".into());
        assert_eq!(buyer.require_buyer().unwrap(), "buyer-1");
        assert!(buyer.require_seller().is_err());
    }

    #[test]
    fn test_principal_json_shape() {
        let json = serde_json::to_string(&Principal::Seller("s1".into())).unwrap();
        assert_eq!(json, r#"{"role":"seller","id":"s1"}"#);
    }
}
