//! The deterministic core. Nothing under `kernel` sleeps, spawns or does
//! I/O; time comes from a `Clock` and progress from the `Scheduler`.

pub mod classifier;
pub mod event;
pub mod host;
pub mod packet;
pub mod reactor;
pub mod scheduler;
pub mod signals;
pub mod time;
