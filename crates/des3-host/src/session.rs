//! Session management
//!
//! A `Des3Context` owns the connection to the TEE. A `Des3Session` opened on
//! it borrows the context for as long as the session is open, so the
//! session is always closed before the context is finalized.
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
    tee::{Operation, TeeBackend, TeeContext, TeeSession},
};
use des3_utils::Des3Opcode;
use log::{debug, info};
use uuid::Uuid;

/// An initialized TEE context.
pub struct Des3Context<C: TeeContext> {
    context: C,
}

impl<C: TeeContext> Des3Context<C> {
    /// Initialize a context with the TEE reached through `backend`.
    pub fn initialize<B>(backend: &B) -> Des3HostResult<Self>
    where
        B: TeeBackend<Context = C>,
    {
        let context = backend
            .initialize_context()
            .map_err(|err| Des3HostError::ContextInitError(err.code))?;
        debug!("des3_context::initialize context initialized");
        Ok(Self { context })
    }

    /// Open a session with the trusted application `uuid`.
    pub fn open_session(&mut self, uuid: &Uuid) -> Des3HostResult<Des3Session<C::Session<'_>>> {
        let session = self.context.open_session(uuid).map_err(|err| {
            Des3HostError::SessionOpenError {
                code: err.code,
                origin: err.origin,
            }
        })?;
        info!("Opened session with trusted application {}", uuid);
        Ok(Des3Session {
            session,
            uuid: *uuid,
        })
    }

    /// Finalize the context. Any session opened on it has been closed
    /// already, since it borrowed the context.
    pub fn finalize(self) {
        drop(self.context);
        debug!("des3_context::finalize context finalized");
    }
}

/// An open session with a trusted application.
pub struct Des3Session<S: TeeSession> {
    session: S,
    uuid: Uuid,
}

impl<S: TeeSession> Des3Session<S> {
    /// Invoke `command` and attribute any failure to it.
    pub fn invoke(
        &mut self,
        command: Des3Opcode,
        operation: &mut Operation<'_>,
    ) -> Des3HostResult<()> {
        debug!("des3_session::invoke {}", command);
        self.session
            .invoke_command(command.into(), operation)
            .map_err(|err| Des3HostError::InvocationError {
                command,
                code: err.code,
                origin: err.origin,
            })
    }

    /// Close the session. Taking `self` makes a second close impossible.
    pub fn close(self) {
        let Des3Session { session, uuid } = self;
        drop(session);
        debug!("des3_session::close session with {} closed", uuid);
    }
}
