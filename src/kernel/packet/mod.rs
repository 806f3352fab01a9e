//! Packet Builder: per-tick time accounting, exact-sum window partition,
//! focus score, packet assembly.

pub mod builder;
pub mod identity;
pub mod normalize;
#[allow(clippy::module_inception)]
pub mod packet;
pub mod score;

pub use builder::{PacketBuilder, PacketSink, TimeBucket, WindowAccumulator};
pub use identity::{IdentityContext, IdentityProvider, SharedIdentity};
pub use normalize::{normalize, WindowPartition};
pub use packet::{Tenths, TelemetryPacket};
pub use score::focus_score;
