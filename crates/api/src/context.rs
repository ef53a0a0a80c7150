use eventposter_auth::Identity;
use eventposter_core::AccountId;

/// Caller context for a request (authenticated identity).
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    identity: Identity,
}

impl CallerContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn account_id(&self) -> AccountId {
        self.identity.account_id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}
