//! DES3 host
//!
//! Drives the DES3-CBC trusted application from the normal world: opens a
//! session, issues PREPARE / SET_KEY / SET_IV / CIPHER, and checks that an
//! encode followed by a decode gives back the clear text.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

pub mod error;
pub use self::error::*;

pub mod tee;

pub mod session;
pub use self::session::{Des3Context, Des3Session};

pub mod client;
pub use self::client::Des3Client;

pub mod config;
pub mod demo;
pub mod platforms;
