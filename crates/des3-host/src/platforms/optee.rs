//! OP-TEE backend, through the TEE client library (`libteec`)
//!
//! Contexts and operations come from `optee-teec`. Sessions are opened and
//! invoked through `optee-teec-sys` directly, because `optee_teec::Error`
//! does not carry the return origin and every failure here must name the
//! layer that produced it.
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
use log::debug;
use optee_teec::{Context, ParamNone, ParamTmpRef, ParamType, ParamValue};
use optee_teec_sys as raw;
use std::{marker::PhantomData, ptr};
use uuid::Uuid;

fn check(code: raw::TEEC_Result, origin: u32) -> Result<(), TeeError> {
    match code {
        raw::TEEC_SUCCESS => Ok(()),
        code => Err(TeeError::new(ResultCode(code), Origin::from(origin))),
    }
}

/// Reaches the secure world through `/dev/tee*`.
pub struct OpteeBackend;

impl TeeBackend for OpteeBackend {
    type Context = OpteeContext;

    fn initialize_context(&self) -> Result<OpteeContext, TeeError> {
        // TEEC_InitializeContext has no origin out-parameter: failures come
        // from the client API.
        Context::new()
            .map(OpteeContext)
            .map_err(|err| TeeError::new(ResultCode(err.raw_code()), Origin::Api))
    }
}

pub struct OpteeContext(Context);

impl TeeContext for OpteeContext {
    type Session<'ctx> = OpteeSession<'ctx>
    where
        Self: 'ctx;

    fn open_session<'ctx>(&'ctx mut self, uuid: &Uuid) -> Result<OpteeSession<'ctx>, TeeError> {
        let destination = optee_teec::Uuid::from_bytes(*uuid.as_bytes());
        let mut session = raw::TEEC_Session {
            ctx: self.0.as_mut_raw_ptr(),
            session_id: 0,
        };
        let mut origin = 0u32;
        let code = unsafe {
            raw::TEEC_OpenSession(
                self.0.as_mut_raw_ptr(),
                &mut session,
                destination.as_raw_ptr(),
                raw::TEEC_LOGIN_PUBLIC,
                ptr::null(),
                ptr::null_mut(),
                &mut origin,
            )
        };
        check(code, origin)?;
        debug!("optee::open_session session {} open", session.session_id);
        Ok(OpteeSession {
            raw: session,
            _context: PhantomData,
        })
    }
}

/// A session that keeps its context mutably borrowed until it is closed.
pub struct OpteeSession<'ctx> {
    raw: raw::TEEC_Session,
    _context: PhantomData<&'ctx mut Context>,
}

impl OpteeSession<'_> {
    fn invoke<A, B, C, D>(
        &mut self,
        command_id: u32,
        operation: &mut optee_teec::Operation<A, B, C, D>,
    ) -> Result<(), TeeError>
    where
        A: optee_teec::Param,
        B: optee_teec::Param,
        C: optee_teec::Param,
        D: optee_teec::Param,
    {
        let mut origin = 0u32;
        let code = unsafe {
            raw::TEEC_InvokeCommand(
                &mut self.raw,
                command_id,
                operation.as_mut_raw_ptr(),
                &mut origin,
            )
        };
        check(code, origin)
    }
}

impl TeeSession for OpteeSession<'_> {
    fn invoke_command(
        &mut self,
        command_id: u32,
        operation: &mut Operation<'_>,
    ) -> Result<(), TeeError> {
        // `optee_teec::Operation` is typed by its parameter layout, so each
        // layout the DES3 commands use gets its own arm.
        match operation.parameters_mut() {
            [Param::None, Param::None, Param::None, Param::None] => {
                let mut raw_op =
                    optee_teec::Operation::new(0, ParamNone, ParamNone, ParamNone, ParamNone);
                self.invoke(command_id, &mut raw_op)
            }
            [
                Param::ValueInput { a: a0, b: b0 },
                Param::ValueInput { a: a1, b: b1 },
                Param::ValueInput { a: a2, b: b2 },
                Param::None,
            ] => {
                let p0 = ParamValue::new(*a0, *b0, ParamType::ValueInput);
                let p1 = ParamValue::new(*a1, *b1, ParamType::ValueInput);
                let p2 = ParamValue::new(*a2, *b2, ParamType::ValueInput);
                let mut raw_op = optee_teec::Operation::new(0, p0, p1, p2, ParamNone);
                self.invoke(command_id, &mut raw_op)
            }
            [Param::TmpRefInput(input), Param::None, Param::None, Param::None] => {
                let p0 = ParamTmpRef::new_input(*input);
                let mut raw_op = optee_teec::Operation::new(0, p0, ParamNone, ParamNone, ParamNone);
                self.invoke(command_id, &mut raw_op)
            }
            [
                Param::TmpRefInput(input),
                Param::TmpRefOutput {
                    buffer,
                    updated_size,
                },
                Param::None,
                Param::None,
            ] => {
                let p0 = ParamTmpRef::new_input(*input);
                let p1 = ParamTmpRef::new_output(&mut buffer[..]);
                let mut raw_op = optee_teec::Operation::new(0, p0, p1, ParamNone, ParamNone);
                let result = self.invoke(command_id, &mut raw_op);
                *updated_size = raw_op.parameters().1.updated_size();
                result
            }
            _ => {
                debug!("optee::invoke_command unsupported parameter layout");
                Err(TeeError::new(ResultCode::BAD_PARAMETERS, Origin::Api))
            }
        }
    }
}

impl Drop for OpteeSession<'_> {
    fn drop(&mut self) {
        unsafe {
            raw::TEEC_CloseSession(&mut self.raw);
        }
    }
}
