use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The authenticated user as reported by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
}

/// Seam over the external identity provider. The core consumes it only to
/// suggest a fallback inspector name at submission time.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<CurrentUser>;
}

/// Fixed identity, for tests and for shells that resolve the user up front.
pub struct StaticIdentity {
    user: Option<CurrentUser>,
}

impl StaticIdentity {
    pub fn anonymous() -> Self {
        StaticIdentity { user: None }
    }

    pub fn signed_in(id: impl Into<String>, email: impl Into<String>) -> Self {
        StaticIdentity {
            user: Some(CurrentUser {
                id: id.into(),
                email: email.into(),
            }),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<CurrentUser> {
        self.user.clone()
    }
}
