//! Identity Bridge: the only place that maps between persona profiles and
//! their shadow accounts.

pub mod bridge;
pub mod provision;

pub use bridge::IdentityBridge;
pub use provision::{PersonaProvisioner, check_human_handle};
