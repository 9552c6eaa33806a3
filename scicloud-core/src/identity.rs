//! Caller identity.

use std::sync::{PoisonError, RwLock};

use crate::event::OwnerId;

/// Supplies the authenticated caller, if any.
pub trait IdentityProvider: Send + Sync {
    fn current_owner(&self) -> Option<OwnerId>;
}

/// A fixed identity (or none), e.g. one per HTTP request.
#[derive(Debug, Clone)]
pub struct StaticIdentity(Option<OwnerId>);

impl StaticIdentity {
    pub fn new(owner: Option<OwnerId>) -> Self {
        StaticIdentity(owner)
    }

    pub fn owner(owner: impl Into<String>) -> Self {
        StaticIdentity(Some(OwnerId::new(owner)))
    }

    pub fn anonymous() -> Self {
        StaticIdentity(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_owner(&self) -> Option<OwnerId> {
        self.0.clone()
    }
}

/// A switchable sign-in session shared between tasks.
#[derive(Debug, Default)]
pub struct Session {
    owner: RwLock<Option<OwnerId>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, owner: OwnerId) {
        *self.owner.write().unwrap_or_else(PoisonError::into_inner) = Some(owner);
    }

    pub fn sign_out(&self) {
        *self.owner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl IdentityProvider for Session {
    fn current_owner(&self) -> Option<OwnerId> {
        self.owner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_sign_in_and_out() {
        let session = Session::new();
        assert_eq!(session.current_owner(), None);

        session.sign_in(OwnerId::new("ada"));
        assert_eq!(session.current_owner(), Some(OwnerId::new("ada")));

        session.sign_out();
        assert_eq!(session.current_owner(), None);
    }
}
