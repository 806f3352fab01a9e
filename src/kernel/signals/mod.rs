//! Signal Source: host events in, content-free behavioral metrics out.

pub mod pointer;
pub mod snapshot;
pub mod source;

pub use snapshot::SignalSnapshot;
pub use source::SignalSource;
