//! Authorization policies for privileged entry points
//!
//! Every guarded component receives its policies at construction time, so
//! tests can swap identities without a live signing system.

use crate::{types::Address, Error, Result};
use serde::{Deserialize, Serialize};

/// Who may call a privileged operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationPolicy {
    /// Exactly one identity is authorized
    Identity(Address),
    /// Nobody is authorized yet
    Unassigned,
}

impl AuthorizationPolicy {
    /// Policy authorizing a single identity
    pub fn identity(address: impl Into<Address>) -> Self {
        AuthorizationPolicy::Identity(address.into())
    }

    /// Check whether `caller` passes this policy
    pub fn permits(&self, caller: &Address) -> bool {
        match self {
            AuthorizationPolicy::Identity(authorized) => authorized == caller,
            AuthorizationPolicy::Unassigned => false,
        }
    }

    /// Fail with [`Error::Unauthorized`] unless `caller` passes
    pub fn authorize(&self, caller: &Address) -> Result<()> {
        if self.permits(caller) {
            Ok(())
        } else {
            Err(Error::Unauthorized {
                caller: caller.clone(),
            })
        }
    }

    /// Authorized identity, if any
    pub fn holder(&self) -> Option<&Address> {
        match self {
            AuthorizationPolicy::Identity(authorized) => Some(authorized),
            AuthorizationPolicy::Unassigned => None,
        }
    }
}

impl From<Address> for AuthorizationPolicy {
    fn from(address: Address) -> Self {
        AuthorizationPolicy::Identity(address)
    }
}
