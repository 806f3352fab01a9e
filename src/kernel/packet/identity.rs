use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Who the activity belongs to, pulled at emission time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub lesson_id: Option<String>,
}

impl IdentityContext {
    /// `user_id`, if present and non-blank.
    pub fn resolved_user(&self) -> Option<&str> {
        self.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }
}

/// Supplied by the host application. A missing `user_id` means "not yet
/// authenticated".
pub trait IdentityProvider: Send + Sync {
    fn identity(&self) -> IdentityContext;
}

/// Identity the host can swap on login/logout.
#[derive(Debug, Default)]
pub struct SharedIdentity {
    inner: RwLock<IdentityContext>,
}

impl SharedIdentity {
    pub fn new(context: IdentityContext) -> Self {
        Self {
            inner: RwLock::new(context),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn set(&self, context: IdentityContext) {
        let mut guard = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = context;
    }

    pub fn clear(&self) {
        self.set(IdentityContext::default());
    }
}

impl IdentityProvider for SharedIdentity {
    fn identity(&self) -> IdentityContext {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
