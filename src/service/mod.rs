//! Service registration and start-up.
//!
//! # Module Structure
//!
//! - `service_control` - systemctl / service / OpenRC invocations
//! - `unit` - systemd unit generation and registration
//! - `xinetd` - per-connection fallback through xinetd
//! - `starter` - primary start with fallback

pub mod service_control;
pub mod starter;
pub mod unit;
pub mod xinetd;

pub use starter::{StartOutcome, start_service};
pub use unit::{RegistrationOutcome, register_service};
