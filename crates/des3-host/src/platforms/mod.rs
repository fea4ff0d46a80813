//! TEE backends
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

#[cfg(feature = "tz")]
pub mod optee;
#[cfg(feature = "sim")]
pub mod simulator;

/// A type capturing which TEE backend drives the trusted application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum BackendKind {
    /// OP-TEE on Arm TrustZone.
    Optee,
    /// The in-process simulator.
    Simulator,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(feature = "tz") {
            BackendKind::Optee
        } else {
            BackendKind::Simulator
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Optee => write!(f, "optee"),
            BackendKind::Simulator => write!(f, "simulator"),
        }
    }
}
