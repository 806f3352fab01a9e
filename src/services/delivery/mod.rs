//! Delivery Bridge: batching, retry with exponential backoff, durable
//! offline queue with replay on reconnect.

pub mod bridge;
pub mod queue;
pub mod store;
pub mod transport;

pub use bridge::DeliveryBridge;
pub use queue::{DeliveryStats, OfflineQueue, QueueEntry};
pub use store::{FileStore, MemoryStore, PersistentStore};
pub use transport::{HttpTransport, NetworkTransport, SendFuture};
