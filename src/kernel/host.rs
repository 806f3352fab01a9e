use std::sync::Arc;

use super::event::Visibility;
use crate::error::PranaError;

/// Reports whether the host surface currently holds input focus.
pub trait FocusSource: Send + Sync {
    fn has_focus(&self) -> bool;
}

/// Reports the host surface's page visibility.
pub trait VisibilitySource: Send + Sync {
    fn visibility(&self) -> Visibility;
}

/// The capabilities the Signal Source needs from the host. Either may be
/// absent (headless host); construction then fails fast.
#[derive(Clone, Default)]
pub struct HostCapabilities {
    pub focus: Option<Arc<dyn FocusSource>>,
    pub visibility: Option<Arc<dyn VisibilitySource>>,
}

impl HostCapabilities {
    pub fn new(focus: Arc<dyn FocusSource>, visibility: Arc<dyn VisibilitySource>) -> Self {
        Self {
            focus: Some(focus),
            visibility: Some(visibility),
        }
    }

    /// Host without a window/document equivalent.
    pub fn headless() -> Self {
        Self::default()
    }

    /// Initial (focus, visibility) as reported by the host.
    pub(crate) fn initial(&self) -> Result<(bool, Visibility), PranaError> {
        let focus = self.focus.as_ref().ok_or(PranaError::MissingCapability("focus"))?;
        let visibility = self
            .visibility
            .as_ref()
            .ok_or(PranaError::MissingCapability("visibility"))?;
        Ok((focus.has_focus(), visibility.visibility()))
    }
}

/// Fixed host state. Used by the console harness and by tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticHost {
    pub focused: bool,
    pub visibility: Visibility,
}

impl StaticHost {
    pub fn focused_visible() -> Self {
        Self {
            focused: true,
            visibility: Visibility::Visible,
        }
    }

    pub fn capabilities(self) -> HostCapabilities {
        let shared = Arc::new(self);
        HostCapabilities::new(shared.clone(), shared)
    }
}

impl FocusSource for StaticHost {
    fn has_focus(&self) -> bool {
        self.focused
    }
}

impl VisibilitySource for StaticHost {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
}
