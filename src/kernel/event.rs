use serde::{Deserialize, Serialize};

/// Browser-style page visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Visible
    }
}

/// Host activity entering the core. Carries no content: no key identity,
/// no text, no click targets beyond the task-relevance bit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    Focus,
    Blur,
    Visibility { state: Visibility },
    /// Focus entering/leaving the task panel while the window keeps focus.
    PanelFocus { focused: bool },
    KeyDown,
    PointerMove { x: f64, y: f64 },
    Scroll { offset: f64, max_offset: f64 },
    Click { task_relevant: bool },
    Online,
    Offline,
}

impl HostEvent {
    /// Connectivity events are routed to the Delivery Bridge, everything
    /// else to the Signal Source.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, HostEvent::Online | HostEvent::Offline)
    }
}
