//! Command dispatch to the DES3 trusted application
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use crate::{
    error::{Des3HostError, Des3HostResult},
    session::Des3Session,
    tee::{Operation, Param, TeeSession},
};
use des3_utils::{Des3Mode, Des3Opcode, DES3_BLOCK_SIZE, DES3_KEY_SIZE_192, TA_DES3_ALGO_CBC};
use log::debug;

/// Issues the four DES3 commands over a borrowed session.
///
/// Lengths are checked here before anything is sent. Ordering (key and IV
/// before CIPHER) is left to the trusted application, and its refusal comes
/// back as an `InvocationError`.
pub struct Des3Client<'s, S: TeeSession> {
    session: &'s mut Des3Session<S>,
}

impl<'s, S: TeeSession> Des3Client<'s, S> {
    pub fn new(session: &'s mut Des3Session<S>) -> Self {
        Self { session }
    }

    /// Allocate a CBC operation with a 192-bit key in direction `mode`.
    pub fn prepare(&mut self, mode: Des3Mode) -> Des3HostResult<()> {
        debug!("des3_client::prepare {:?}", mode);
        let mut operation = Operation::new(
            Param::value_input(TA_DES3_ALGO_CBC, 0),
            Param::value_input(DES3_KEY_SIZE_192 as u32, 0),
            Param::value_input(mode.into(), 0),
            Param::None,
        );
        self.session.invoke(Des3Opcode::Prepare, &mut operation)
    }

    pub fn set_key(&mut self, key: &[u8]) -> Des3HostResult<()> {
        if key.len() != DES3_KEY_SIZE_192 {
            return Err(Des3HostError::InvalidLengthError("key", DES3_KEY_SIZE_192));
        }
        let mut operation = Operation::new(
            Param::tmpref_input(key),
            Param::None,
            Param::None,
            Param::None,
        );
        self.session.invoke(Des3Opcode::SetKey, &mut operation)
    }

    /// Provide the IV; the trusted application restarts CBC chaining from it.
    pub fn set_iv(&mut self, iv: &[u8]) -> Des3HostResult<()> {
        if iv.len() != DES3_BLOCK_SIZE {
            return Err(Des3HostError::InvalidLengthError("iv", DES3_BLOCK_SIZE));
        }
        let mut operation = Operation::new(
            Param::tmpref_input(iv),
            Param::None,
            Param::None,
            Param::None,
        );
        self.session.invoke(Des3Opcode::SetIv, &mut operation)
    }

    /// Cipher `input` into `output`, which must be the same length.
    pub fn cipher(&mut self, input: &[u8], output: &mut [u8]) -> Des3HostResult<()> {
        if input.len() != output.len() {
            return Err(Des3HostError::LengthMismatchError {
                input: input.len(),
                output: output.len(),
            });
        }
        let expected = input.len();
        let written = {
            let mut operation = Operation::new(
                Param::tmpref_input(input),
                Param::tmpref_output(output),
                Param::None,
                Param::None,
            );
            self.session.invoke(Des3Opcode::Cipher, &mut operation)?;
            operation.parameters()[1].updated_size().unwrap_or(0)
        };
        if written != expected {
            return Err(Des3HostError::ShortOutputError {
                expected,
                received: written,
            });
        }
        debug!("des3_client::cipher {} bytes", written);
        Ok(())
    }
}
