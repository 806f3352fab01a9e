pub mod config;
pub mod error;
pub mod kernel;
pub mod runtime;
pub mod services;

// Re-export the assembly surface for convenient access
pub use config::PranaConfig;
pub use error::PranaError;
pub use kernel::reactor::Reactor;
pub use runtime::{Prana, PranaHandle};
