//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → prepare on-chain accounts → spawn tasks
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C or action loop completion → broadcast → tasks drain and exit
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
