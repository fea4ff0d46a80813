//! In-process stand-in for the TEE and the DES3 trusted application
//!
//! Lets the host be driven and tested on machines without OP-TEE. The
//! simulated trusted application follows the command contract of the real
//! one: PREPARE, then SET_KEY, then SET_IV, then any number of CIPHER calls
//! that carry the CBC chain forward.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use crate::tee::{
    Operation, Origin, Param, ResultCode, TeeBackend, TeeContext, TeeError, TeeSession,
};
use des::{
    cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit},
    TdesEde3,
};
use des3_utils::{
    Des3Mode, Des3Opcode, DES3_BLOCK_SIZE, DES3_KEY_SIZE_192, DES3_TA_UUID, TA_DES3_ALGO_CBC,
};
use log::debug;
use std::{
    convert::TryFrom,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use uuid::Uuid;

////////////////////////////////////////////////////////////////////////////////
// The simulated TEE.
////////////////////////////////////////////////////////////////////////////////

/// Failures the simulated TEE can be told to produce.
#[derive(Clone, Debug, Default)]
struct Faults {
    context_init: Option<ResultCode>,
    open_session: Option<ResultCode>,
    commands: Vec<(Des3Opcode, ResultCode)>,
}

/// A simulated TEE hosting a single DES3 trusted application.
///
/// Counts live contexts and sessions so tests can check that everything
/// opened is released.
#[derive(Clone, Debug)]
pub struct SimulatedTee {
    ta_uuid: Uuid,
    faults: Arc<Faults>,
    live_contexts: Arc<AtomicUsize>,
    live_sessions: Arc<AtomicUsize>,
}

impl Default for SimulatedTee {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTee {
    pub fn new() -> Self {
        SimulatedTee {
            ta_uuid: DES3_TA_UUID,
            faults: Arc::new(Faults::default()),
            live_contexts: Arc::new(AtomicUsize::new(0)),
            live_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make context initialization fail with `code`.
    pub fn fail_context_init(mut self, code: ResultCode) -> Self {
        Arc::make_mut(&mut self.faults).context_init = Some(code);
        self
    }

    /// Make opening a session fail with `code`, reported by the TEE core.
    pub fn fail_open_session(mut self, code: ResultCode) -> Self {
        Arc::make_mut(&mut self.faults).open_session = Some(code);
        self
    }

    /// Make every invocation of `command` fail with `code`, reported by the
    /// trusted application.
    pub fn fail_command(mut self, command: Des3Opcode, code: ResultCode) -> Self {
        Arc::make_mut(&mut self.faults)
            .commands
            .push((command, code));
        self
    }

    pub fn live_contexts(&self) -> usize {
        self.live_contexts.load(Ordering::SeqCst)
    }

    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::SeqCst)
    }
}

impl TeeBackend for SimulatedTee {
    type Context = SimulatedContext;

    fn initialize_context(&self) -> Result<SimulatedContext, TeeError> {
        if let Some(code) = self.faults.context_init {
            return Err(TeeError::new(code, Origin::Api));
        }
        self.live_contexts.fetch_add(1, Ordering::SeqCst);
        Ok(SimulatedContext { tee: self.clone() })
    }
}

pub struct SimulatedContext {
    tee: SimulatedTee,
}

impl TeeContext for SimulatedContext {
    type Session<'ctx> = SimulatedSession
    where
        Self: 'ctx;

    fn open_session<'ctx>(&'ctx mut self, uuid: &Uuid) -> Result<SimulatedSession, TeeError> {
        if let Some(code) = self.tee.faults.open_session {
            return Err(TeeError::new(code, Origin::Tee));
        }
        if *uuid != self.tee.ta_uuid {
            debug!("simulator::open_session no trusted application {}", uuid);
            return Err(TeeError::new(ResultCode::ITEM_NOT_FOUND, Origin::Tee));
        }
        self.tee.live_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(SimulatedSession {
            tee: self.tee.clone(),
            ta: Des3Ta::default(),
        })
    }
}

impl Drop for SimulatedContext {
    fn drop(&mut self) {
        self.tee.live_contexts.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct SimulatedSession {
    tee: SimulatedTee,
    ta: Des3Ta,
}

impl TeeSession for SimulatedSession {
    fn invoke_command(
        &mut self,
        command_id: u32,
        operation: &mut Operation<'_>,
    ) -> Result<(), TeeError> {
        let command = Des3Opcode::try_from(command_id).map_err(|err| {
            debug!("simulator::invoke_command {}", err);
            ta_error(ResultCode::BAD_PARAMETERS)
        })?;
        if let Some((_, code)) = self
            .tee
            .faults
            .commands
            .iter()
            .find(|(faulty, _)| *faulty == command)
        {
            return Err(ta_error(*code));
        }
        self.ta.invoke(command, operation)
    }
}

impl Drop for SimulatedSession {
    fn drop(&mut self) {
        self.tee.live_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

////////////////////////////////////////////////////////////////////////////////
// The simulated trusted application.
////////////////////////////////////////////////////////////////////////////////

fn ta_error(code: ResultCode) -> TeeError {
    TeeError::new(code, Origin::TrustedApp)
}

/// Per-direction state, created by PREPARE.
struct CipherOperation {
    mode: Des3Mode,
    key_size: usize,
    cipher: Option<TdesEde3>,
    chain: Option<[u8; DES3_BLOCK_SIZE]>,
}

#[derive(Default)]
struct Des3Ta {
    operation: Option<CipherOperation>,
}

impl Des3Ta {
    fn invoke(
        &mut self,
        command: Des3Opcode,
        operation: &mut Operation<'_>,
    ) -> Result<(), TeeError> {
        debug!("simulator::des3_ta {}", command);
        match command {
            Des3Opcode::Prepare => self.prepare(operation),
            Des3Opcode::SetKey => self.set_key(operation),
            Des3Opcode::SetIv => self.set_iv(operation),
            Des3Opcode::Cipher => self.cipher(operation),
        }
    }

    fn prepare(&mut self, operation: &mut Operation<'_>) -> Result<(), TeeError> {
        let (algorithm, key_size, mode) = match operation.parameters() {
            [
                Param::ValueInput { a: algorithm, .. },
                Param::ValueInput { a: key_size, .. },
                Param::ValueInput { a: mode, .. },
                Param::None,
            ] => (*algorithm, *key_size as usize, *mode),
            _ => return Err(ta_error(ResultCode::BAD_PARAMETERS)),
        };
        if algorithm != TA_DES3_ALGO_CBC || key_size != DES3_KEY_SIZE_192 {
            return Err(ta_error(ResultCode::NOT_SUPPORTED));
        }
        let mode = Des3Mode::try_from(mode).map_err(|_| ta_error(ResultCode::BAD_PARAMETERS))?;

        // A new PREPARE discards whatever the previous direction had loaded.
        self.operation = Some(CipherOperation {
            mode,
            key_size,
            cipher: None,
            chain: None,
        });
        Ok(())
    }

    fn set_key(&mut self, operation: &mut Operation<'_>) -> Result<(), TeeError> {
        let key = match operation.parameters() {
            [Param::TmpRefInput(key), Param::None, Param::None, Param::None] => *key,
            _ => return Err(ta_error(ResultCode::BAD_PARAMETERS)),
        };
        let state = self
            .operation
            .as_mut()
            .ok_or_else(|| ta_error(ResultCode::BAD_STATE))?;
        if key.len() != state.key_size {
            return Err(ta_error(ResultCode::BAD_PARAMETERS));
        }
        let cipher =
            TdesEde3::new_from_slice(key).map_err(|_| ta_error(ResultCode::BAD_PARAMETERS))?;
        state.cipher = Some(cipher);
        state.chain = None;
        Ok(())
    }

    fn set_iv(&mut self, operation: &mut Operation<'_>) -> Result<(), TeeError> {
        let iv = match operation.parameters() {
            [Param::TmpRefInput(iv), Param::None, Param::None, Param::None] => *iv,
            _ => return Err(ta_error(ResultCode::BAD_PARAMETERS)),
        };
        let state = self
            .operation
            .as_mut()
            .filter(|state| state.cipher.is_some())
            .ok_or_else(|| ta_error(ResultCode::BAD_STATE))?;
        if iv.len() != DES3_BLOCK_SIZE {
            return Err(ta_error(ResultCode::BAD_PARAMETERS));
        }
        let mut chain = [0u8; DES3_BLOCK_SIZE];
        chain.copy_from_slice(iv);
        state.chain = Some(chain);
        Ok(())
    }

    fn cipher(&mut self, operation: &mut Operation<'_>) -> Result<(), TeeError> {
        let state = match self.operation.as_mut() {
            Some(state) => state,
            None => return Err(ta_error(ResultCode::BAD_STATE)),
        };
        let (cipher, chain) = match (state.cipher.as_ref(), state.chain.as_mut()) {
            (Some(cipher), Some(chain)) => (cipher, chain),
            _ => return Err(ta_error(ResultCode::BAD_STATE)),
        };
        match operation.parameters_mut() {
            [
                Param::TmpRefInput(input),
                Param::TmpRefOutput {
                    buffer,
                    updated_size,
                },
                Param::None,
                Param::None,
            ] => {
                if input.len() % DES3_BLOCK_SIZE != 0 {
                    return Err(ta_error(ResultCode::BAD_PARAMETERS));
                }
                if buffer.len() < input.len() {
                    *updated_size = input.len();
                    return Err(ta_error(ResultCode::SHORT_BUFFER));
                }
                let output = &mut buffer[..input.len()];
                output.copy_from_slice(&input[..]);
                match state.mode {
                    Des3Mode::Encode => cbc_encrypt(cipher, chain, output),
                    Des3Mode::Decode => cbc_decrypt(cipher, chain, output),
                }
                *updated_size = input.len();
                Ok(())
            }
            _ => Err(ta_error(ResultCode::BAD_PARAMETERS)),
        }
    }
}

fn cbc_encrypt(cipher: &TdesEde3, chain: &mut [u8; DES3_BLOCK_SIZE], data: &mut [u8]) {
    for block in data.chunks_exact_mut(DES3_BLOCK_SIZE) {
        for (byte, previous) in block.iter_mut().zip(chain.iter()) {
            *byte ^= previous;
        }
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        chain.copy_from_slice(block);
    }
}

fn cbc_decrypt(cipher: &TdesEde3, chain: &mut [u8; DES3_BLOCK_SIZE], data: &mut [u8]) {
    for block in data.chunks_exact_mut(DES3_BLOCK_SIZE) {
        let mut ciphertext = [0u8; DES3_BLOCK_SIZE];
        ciphertext.copy_from_slice(block);
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        for (byte, previous) in block.iter_mut().zip(chain.iter()) {
            *byte ^= previous;
        }
        *chain = ciphertext;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SimulatedSession {
        let mut context = SimulatedTee::new().initialize_context().unwrap();
        context.open_session(&DES3_TA_UUID).unwrap()
    }

    fn invoke(
        session: &mut SimulatedSession,
        command: Des3Opcode,
        mut op: Operation<'_>,
    ) -> Result<(), TeeError> {
        session.invoke_command(command.into(), &mut op)
    }

    fn prepare(session: &mut SimulatedSession, mode: Des3Mode) -> Result<(), TeeError> {
        invoke(
            session,
            Des3Opcode::Prepare,
            Operation::new(
                Param::value_input(TA_DES3_ALGO_CBC, 0),
                Param::value_input(DES3_KEY_SIZE_192 as u32, 0),
                Param::value_input(mode.into(), 0),
                Param::None,
            ),
        )
    }

    fn load(session: &mut SimulatedSession, key: &[u8], iv: &[u8]) {
        invoke(
            session,
            Des3Opcode::SetKey,
            Operation::new(Param::tmpref_input(key), Param::None, Param::None, Param::None),
        )
        .unwrap();
        invoke(
            session,
            Des3Opcode::SetIv,
            Operation::new(Param::tmpref_input(iv), Param::None, Param::None, Param::None),
        )
        .unwrap();
    }

    fn cipher(session: &mut SimulatedSession, input: &[u8]) -> Result<Vec<u8>, TeeError> {
        let mut output = vec![0u8; input.len()];
        invoke(
            session,
            Des3Opcode::Cipher,
            Operation::new(
                Param::tmpref_input(input),
                Param::tmpref_output(&mut output),
                Param::None,
                Param::None,
            ),
        )?;
        Ok(output)
    }

    const KEY: [u8; 24] = [
        0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23,
    ];
    const IV: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

    #[test]
    /// DES-EDE3-CBC with key 0..23, IV 0..7, clear text 0..31, no padding.
    fn known_answer() {
        let expected = hex::decode(concat!(
            "894bc3085426a441",
            "f27f73ae26abbf74",
            "bd8aed47a8d26334",
            "ef7fb5aa2551c31f",
        ))
        .unwrap();
        let plaintext: Vec<u8> = (0..32).collect();

        let mut session = session();
        prepare(&mut session, Des3Mode::Encode).unwrap();
        load(&mut session, &KEY, &IV);
        assert_eq!(cipher(&mut session, &plaintext).unwrap(), expected);

        prepare(&mut session, Des3Mode::Decode).unwrap();
        load(&mut session, &KEY, &IV);
        assert_eq!(cipher(&mut session, &expected).unwrap(), plaintext);
    }

    #[test]
    fn identical_blocks_chain_to_different_ciphertext() {
        let mut session = session();
        prepare(&mut session, Des3Mode::Encode).unwrap();
        load(&mut session, &KEY, &IV);
        let ciphertext = cipher(&mut session, &[0x5a; 16]).unwrap();
        assert_ne!(ciphertext[..8], ciphertext[8..]);
    }

    #[test]
    fn chaining_carries_across_cipher_calls() {
        let plaintext: Vec<u8> = (0..32).collect();

        let mut whole = session();
        prepare(&mut whole, Des3Mode::Encode).unwrap();
        load(&mut whole, &KEY, &IV);
        let in_one_call = cipher(&mut whole, &plaintext).unwrap();

        let mut split = session();
        prepare(&mut split, Des3Mode::Encode).unwrap();
        load(&mut split, &KEY, &IV);
        let mut in_two_calls = cipher(&mut split, &plaintext[..16]).unwrap();
        in_two_calls.extend(cipher(&mut split, &plaintext[16..]).unwrap());

        assert_eq!(in_one_call, in_two_calls);
    }

    #[test]
    fn set_iv_restarts_the_chain() {
        let mut session = session();
        prepare(&mut session, Des3Mode::Encode).unwrap();
        load(&mut session, &KEY, &IV);
        let first = cipher(&mut session, &[7; 8]).unwrap();
        let chained = cipher(&mut session, &[7; 8]).unwrap();
        load(&mut session, &KEY, &IV);
        let restarted = cipher(&mut session, &[7; 8]).unwrap();
        assert_ne!(first, chained);
        assert_eq!(first, restarted);
    }

    #[test]
    fn commands_out_of_order_are_bad_state() {
        let mut session = session();
        assert_eq!(
            cipher(&mut session, &[0; 8]).unwrap_err(),
            ta_error(ResultCode::BAD_STATE)
        );
        let iv = invoke(
            &mut session,
            Des3Opcode::SetIv,
            Operation::new(Param::tmpref_input(&IV), Param::None, Param::None, Param::None),
        );
        assert_eq!(iv.unwrap_err().code, ResultCode::BAD_STATE);
    }

    #[test]
    fn partial_blocks_and_short_outputs_are_rejected() {
        let mut session = session();
        prepare(&mut session, Des3Mode::Encode).unwrap();
        load(&mut session, &KEY, &IV);
        assert_eq!(
            cipher(&mut session, &[0; 12]).unwrap_err().code,
            ResultCode::BAD_PARAMETERS
        );

        let input = [0u8; 16];
        let mut output = [0u8; 8];
        let result = invoke(
            &mut session,
            Des3Opcode::Cipher,
            Operation::new(
                Param::tmpref_input(&input),
                Param::tmpref_output(&mut output),
                Param::None,
                Param::None,
            ),
        );
        assert_eq!(result.unwrap_err().code, ResultCode::SHORT_BUFFER);
    }

    #[test]
    fn unsupported_prepare_arguments() {
        let mut session = session();
        let result = invoke(
            &mut session,
            Des3Opcode::Prepare,
            Operation::new(
                Param::value_input(2, 0),
                Param::value_input(DES3_KEY_SIZE_192 as u32, 0),
                Param::value_input(1, 0),
                Param::None,
            ),
        );
        assert_eq!(result.unwrap_err().code, ResultCode::NOT_SUPPORTED);

        let result = invoke(
            &mut session,
            Des3Opcode::Prepare,
            Operation::new(
                Param::value_input(TA_DES3_ALGO_CBC, 0),
                Param::value_input(DES3_KEY_SIZE_192 as u32, 0),
                Param::value_input(7, 0),
                Param::None,
            ),
        );
        assert_eq!(result.unwrap_err().code, ResultCode::BAD_PARAMETERS);
    }

    #[test]
    fn unknown_command_is_rejected() {
        let mut session = session();
        let mut op = Operation::new(Param::None, Param::None, Param::None, Param::None);
        let err = session.invoke_command(42, &mut op).unwrap_err();
        assert_eq!(err, ta_error(ResultCode::BAD_PARAMETERS));
    }

    #[test]
    fn unknown_trusted_application() {
        let mut context = SimulatedTee::new().initialize_context().unwrap();
        let err = context.open_session(&Uuid::nil()).err().unwrap();
        assert_eq!(err, TeeError::new(ResultCode::ITEM_NOT_FOUND, Origin::Tee));
    }
}
