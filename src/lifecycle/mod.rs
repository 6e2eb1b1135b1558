//! Process lifecycle: startup sequencing and graceful shutdown.

pub mod shutdown;

pub use shutdown::Shutdown;
