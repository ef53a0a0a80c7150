use serde::Serialize;

use eventposter_core::AccountId;

use crate::{JwtClaims, Role};

/// A resolved caller identity.
///
/// Produced from a verified bearer token and passed explicitly to every
/// operation that needs to know who is acting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub account_id: AccountId,
    pub display_name: String,
    pub role: Role,
}

impl Identity {
    pub fn new(account_id: AccountId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            account_id,
            display_name: display_name.into(),
            role,
        }
    }
}

impl From<JwtClaims> for Identity {
    fn from(claims: JwtClaims) -> Self {
        Self {
            account_id: claims.sub,
            display_name: claims.username,
            role: claims.role,
        }
    }
}
