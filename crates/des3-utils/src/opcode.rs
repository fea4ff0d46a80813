//! Protocol operation-codes for the DES3 trusted application
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use std::{convert::TryFrom, fmt, string::String};

/// Opcodes, or messages, that are passed to the DES3 trusted application and
/// interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Des3Opcode {
    /// Allocate a cipher operation: algorithm, key size and direction.
    Prepare,
    /// Load the key material into the prepared operation.
    SetKey,
    /// Provide the initialization vector and restart CBC chaining.
    SetIv,
    /// Run the cipher over an input buffer, into an output buffer.
    Cipher,
}

/// The direction selected by a PREPARE command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Des3Mode {
    Decode,
    Encode,
}

////////////////////////////////////////////////////////////////////////////////
// Trait implementations.
////////////////////////////////////////////////////////////////////////////////

impl TryFrom<u32> for Des3Opcode {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Des3Opcode::Prepare),
            1 => Ok(Des3Opcode::SetKey),
            2 => Ok(Des3Opcode::SetIv),
            3 => Ok(Des3Opcode::Cipher),
            _ => Err(format!(
                "Des3Opcode could not be converted from: {}",
                value
            )),
        }
    }
}

impl From<Des3Opcode> for u32 {
    fn from(opcode: Des3Opcode) -> Self {
        match opcode {
            Des3Opcode::Prepare => 0,
            Des3Opcode::SetKey => 1,
            Des3Opcode::SetIv => 2,
            Des3Opcode::Cipher => 3,
        }
    }
}

impl fmt::Display for Des3Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Des3Opcode::Prepare => "PREPARE",
            Des3Opcode::SetKey => "SET_KEY",
            Des3Opcode::SetIv => "SET_IV",
            Des3Opcode::Cipher => "CIPHER",
        };
        write!(f, "{}", name)
    }
}

impl TryFrom<u32> for Des3Mode {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Des3Mode::Decode),
            1 => Ok(Des3Mode::Encode),
            _ => Err(format!("Des3Mode could not be converted from: {}", value)),
        }
    }
}

impl From<Des3Mode> for u32 {
    fn from(mode: Des3Mode) -> Self {
        match mode {
            Des3Mode::Decode => 0,
            Des3Mode::Encode => 1,
        }
    }
}
