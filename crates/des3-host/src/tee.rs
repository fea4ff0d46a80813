//! The TEE client seam
//!
//! A small model of the TEE client API: result codes and their origin, the
//! four-slot operation passed with every command, and the traits a backend
//! implements to provide contexts and sessions.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use std::fmt;
use uuid::Uuid;

////////////////////////////////////////////////////////////////////////////////
// Result codes and origins.
////////////////////////////////////////////////////////////////////////////////

/// A TEE client API result code, as returned by the TEE client library or the
/// trusted application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResultCode(pub u32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0x0000_0000);
    pub const GENERIC: ResultCode = ResultCode(0xFFFF_0000);
    pub const ACCESS_DENIED: ResultCode = ResultCode(0xFFFF_0001);
    pub const BAD_FORMAT: ResultCode = ResultCode(0xFFFF_0005);
    pub const BAD_PARAMETERS: ResultCode = ResultCode(0xFFFF_0006);
    pub const BAD_STATE: ResultCode = ResultCode(0xFFFF_0007);
    pub const ITEM_NOT_FOUND: ResultCode = ResultCode(0xFFFF_0008);
    pub const NOT_SUPPORTED: ResultCode = ResultCode(0xFFFF_000A);
    pub const COMMUNICATION: ResultCode = ResultCode(0xFFFF_000E);
    pub const SHORT_BUFFER: ResultCode = ResultCode(0xFFFF_0010);
    pub const TARGET_DEAD: ResultCode = ResultCode(0xFFFF_3024);

    pub fn is_success(&self) -> bool {
        *self == ResultCode::SUCCESS
    }

    /// Symbolic name of a well-known code, if there is one.
    pub fn name(&self) -> Option<&'static str> {
        let name = match *self {
            ResultCode::SUCCESS => "SUCCESS",
            ResultCode::GENERIC => "GENERIC",
            ResultCode::ACCESS_DENIED => "ACCESS_DENIED",
            ResultCode::BAD_FORMAT => "BAD_FORMAT",
            ResultCode::BAD_PARAMETERS => "BAD_PARAMETERS",
            ResultCode::BAD_STATE => "BAD_STATE",
            ResultCode::ITEM_NOT_FOUND => "ITEM_NOT_FOUND",
            ResultCode::NOT_SUPPORTED => "NOT_SUPPORTED",
            ResultCode::COMMUNICATION => "COMMUNICATION",
            ResultCode::SHORT_BUFFER => "SHORT_BUFFER",
            ResultCode::TARGET_DEAD => "TARGET_DEAD",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "0x{:x} ({})", self.0, name),
            None => write!(f, "0x{:x}", self.0),
        }
    }
}

/// The software layer that produced a result code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// The TEE client library.
    Api,
    /// The communication stack between the normal and secure worlds.
    Comms,
    /// The TEE core.
    Tee,
    /// The trusted application itself.
    TrustedApp,
    Unknown(u32),
}

impl From<u32> for Origin {
    fn from(value: u32) -> Self {
        match value {
            1 => Origin::Api,
            2 => Origin::Comms,
            3 => Origin::Tee,
            4 => Origin::TrustedApp,
            other => Origin::Unknown(other),
        }
    }
}

impl From<Origin> for u32 {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Api => 1,
            Origin::Comms => 2,
            Origin::Tee => 3,
            Origin::TrustedApp => 4,
            Origin::Unknown(other) => other,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", u32::from(*self))
    }
}

/// A failed call into the TEE, before it is attributed to a host operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeeError {
    pub code: ResultCode,
    pub origin: Origin,
}

impl TeeError {
    pub fn new(code: ResultCode, origin: Origin) -> Self {
        TeeError { code, origin }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Operations.
////////////////////////////////////////////////////////////////////////////////

/// One positional parameter of an operation.
///
/// Buffers are borrowed from the caller for the duration of the call only.
#[derive(Debug)]
pub enum Param<'a> {
    None,
    /// A pair of scalar inputs.
    ValueInput { a: u32, b: u32 },
    /// A buffer read by the trusted application.
    TmpRefInput(&'a [u8]),
    /// A buffer written by the trusted application. `updated_size` holds the
    /// number of bytes it reported writing once the call returns.
    TmpRefOutput {
        buffer: &'a mut [u8],
        updated_size: usize,
    },
}

impl<'a> Param<'a> {
    pub fn value_input(a: u32, b: u32) -> Self {
        Param::ValueInput { a, b }
    }

    pub fn tmpref_input(buffer: &'a [u8]) -> Self {
        Param::TmpRefInput(buffer)
    }

    pub fn tmpref_output(buffer: &'a mut [u8]) -> Self {
        Param::TmpRefOutput {
            buffer,
            updated_size: 0,
        }
    }

    pub fn updated_size(&self) -> Option<usize> {
        match self {
            Param::TmpRefOutput { updated_size, .. } => Some(*updated_size),
            _ => None,
        }
    }
}

/// The parameters of one command invocation: always four slots, unused ones
/// set to `Param::None`.
#[derive(Debug)]
pub struct Operation<'a> {
    params: [Param<'a>; 4],
}

impl<'a> Operation<'a> {
    pub fn new(p0: Param<'a>, p1: Param<'a>, p2: Param<'a>, p3: Param<'a>) -> Self {
        Operation {
            params: [p0, p1, p2, p3],
        }
    }

    pub fn parameters(&self) -> &[Param<'a>; 4] {
        &self.params
    }

    pub fn parameters_mut(&mut self) -> &mut [Param<'a>; 4] {
        &mut self.params
    }
}

////////////////////////////////////////////////////////////////////////////////
// Backend traits.
////////////////////////////////////////////////////////////////////////////////

/// A way of reaching a TEE: produces contexts.
pub trait TeeBackend {
    type Context: TeeContext;

    fn initialize_context(&self) -> Result<Self::Context, TeeError>;
}

/// A connection to the TEE, from which sessions with trusted applications
/// are opened.
///
/// A session borrows its context mutably for as long as it is open, so the
/// context cannot be finalized under a live session.
pub trait TeeContext {
    type Session<'ctx>: TeeSession
    where
        Self: 'ctx;

    fn open_session<'ctx>(&'ctx mut self, uuid: &Uuid) -> Result<Self::Session<'ctx>, TeeError>;
}

/// An open session with one trusted application. Closed when dropped.
pub trait TeeSession {
    /// Blocks until the trusted application has processed the command.
    fn invoke_command(
        &mut self,
        command_id: u32,
        operation: &mut Operation<'_>,
    ) -> Result<(), TeeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_code_display() {
        assert_eq!(
            ResultCode::BAD_STATE.to_string(),
            "0xffff0007 (BAD_STATE)"
        );
        assert_eq!(ResultCode(0x1234).to_string(), "0x1234");
        assert!(ResultCode::SUCCESS.is_success());
        assert!(!ResultCode::GENERIC.is_success());
    }

    #[test]
    fn origins_round_trip_through_raw_values() {
        for raw in 1..=4u32 {
            assert_eq!(u32::from(Origin::from(raw)), raw);
        }
        assert_eq!(Origin::from(9), Origin::Unknown(9));
        assert_eq!(Origin::TrustedApp.to_string(), "0x4");
    }

    #[test]
    fn only_output_buffers_report_a_size() {
        let input = [0u8; 8];
        let mut output = [0u8; 8];
        let operation = Operation::new(
            Param::tmpref_input(&input),
            Param::tmpref_output(&mut output),
            Param::value_input(1, 0),
            Param::None,
        );
        let params = operation.parameters();
        assert_eq!(params[0].updated_size(), None);
        assert_eq!(params[1].updated_size(), Some(0));
        assert_eq!(params[2].updated_size(), None);
    }
}
