//! DES3 host error
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use crate::tee::{Origin, ResultCode};
use des3_utils::Des3Opcode;
use err_derive::Error;

#[derive(Debug, Error)]
pub enum Des3HostError {
    #[error(
        display = "Des3Host: TEEC_InitializeContext failed with code {}.",
        _0
    )]
    ContextInitError(ResultCode),
    #[error(
        display = "Des3Host: TEEC_OpenSession failed with code {} origin {}.",
        code,
        origin
    )]
    SessionOpenError { code: ResultCode, origin: Origin },
    #[error(
        display = "Des3Host: TEEC_InvokeCommand({}) failed {} origin {}.",
        command,
        code,
        origin
    )]
    InvocationError {
        command: Des3Opcode,
        code: ResultCode,
        origin: Origin,
    },
    #[error(
        display = "Des3Host: Invalid length of variable `{}`, expected {}",
        _0,
        _1
    )]
    InvalidLengthError(&'static str, usize),
    #[error(
        display = "Des3Host: LengthMismatchError: input is {} bytes but output is {} bytes.",
        input,
        output
    )]
    LengthMismatchError { input: usize, output: usize },
    #[error(
        display = "Des3Host: ShortOutputError: expected {} bytes back, got {}.",
        expected,
        received
    )]
    ShortOutputError { expected: usize, received: usize },
    #[error(display = "Des3Host: Backend `{}` is not available in this build.", _0)]
    BackendUnavailable(&'static str),
    #[error(display = "Des3Host: Invalid configuration: {}.", _0)]
    InvalidConfigError(String),
    #[error(display = "Des3Host: IOError: {:?}.", _0)]
    IOError(#[error(source)] std::io::Error),
    #[error(display = "Des3Host: HexError: {:?}.", _0)]
    HexError(#[error(source)] hex::FromHexError),
    #[error(display = "Des3Host: SerdeJsonError: {:?}.", _0)]
    SerdeJsonError(#[error(source)] serde_json::Error),
    #[error(display = "Des3Host: UuidError: {:?}.", _0)]
    UuidError(#[error(source)] uuid::Error),
}

impl Des3HostError {
    /// The TEE result code behind this error, if it came from the TEE.
    pub fn result_code(&self) -> Option<ResultCode> {
        match self {
            Des3HostError::ContextInitError(code)
            | Des3HostError::SessionOpenError { code, .. }
            | Des3HostError::InvocationError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Des3HostResult<T> = Result<T, Des3HostError>;
