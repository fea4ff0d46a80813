//! The encode/decode demo
//!
//! One encrypt pass and one decrypt pass through the trusted application,
//! followed by a comparison of the recovered clear text with the original.
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
    client::Des3Client,
    config::DemoConfig,
    error::Des3HostResult,
    session::Des3Context,
    tee::{TeeBackend, TeeSession},
};
use des3_utils::{Des3Mode, DES3_BLOCK_SIZE};
use log::{debug, info};
use std::io::Write;

/// Where the demo has got to. The sequence is strictly linear.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemoState {
    SessionOpen,
    EncodePrepared,
    KeyLoaded,
    IvLoaded,
    Ciphered,
    DecodePrepared,
    Deciphered,
    Verified,
    SessionClosed,
}

/// The outcome of a completed run.
#[derive(Clone, Debug)]
pub struct DemoReport {
    pub ciphertext: Vec<u8>,
    pub decrypted: Vec<u8>,
    /// Whether the decrypted buffer matched the clear text. A mismatch is
    /// reported here and in the transcript, it is not an error.
    pub verified: bool,
    /// Every state the run went through, in order.
    pub states: Vec<DemoState>,
}

struct StateTrace(Vec<DemoState>);

impl StateTrace {
    fn enter(&mut self, state: DemoState) {
        if let Some(previous) = self.0.last() {
            debug!("demo: {:?} -> {:?}", previous, state);
        }
        self.0.push(state);
    }
}

/// Format `buffer` eight bytes per line, as lower-case hex pairs separated by
/// spaces.
pub fn hex_dump(buffer: &[u8]) -> String {
    buffer
        .chunks(DES3_BLOCK_SIZE)
        .map(|line| {
            line.iter()
                .map(|byte| format!("{:02x}", byte))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prepare `mode`, load key and IV, and cipher `input` into a new buffer.
fn cipher_pass<S: TeeSession, W: Write>(
    client: &mut Des3Client<'_, S>,
    config: &DemoConfig,
    mode: Des3Mode,
    input: &[u8],
    trace: &mut StateTrace,
    out: &mut W,
) -> Des3HostResult<Vec<u8>> {
    let (prepared, verb, done) = match mode {
        Des3Mode::Encode => (DemoState::EncodePrepared, "Encode", DemoState::Ciphered),
        Des3Mode::Decode => (DemoState::DecodePrepared, "Decode", DemoState::Deciphered),
    };

    writeln!(out, "Prepare {} operation", verb.to_lowercase())?;
    client.prepare(mode)?;
    trace.enter(prepared);

    writeln!(out, "Load key in TA")?;
    client.set_key(&config.key)?;
    trace.enter(DemoState::KeyLoaded);

    writeln!(
        out,
        "Reset ciphering operation in TA (provides the initial vector)"
    )?;
    client.set_iv(&config.iv)?;
    trace.enter(DemoState::IvLoaded);

    writeln!(out, "{} buffer from TA", verb)?;
    let mut output = vec![0u8; input.len()];
    client.cipher(input, &mut output)?;
    trace.enter(done);

    Ok(output)
}

/// Run the demo against `backend`, writing the transcript to `out`.
///
/// Any failure aborts the run; the session and the context are still
/// released on the way out.
pub fn run<B: TeeBackend, W: Write>(
    backend: &B,
    config: &DemoConfig,
    out: &mut W,
) -> Des3HostResult<DemoReport> {
    config.validate()?;
    let clear = config.plaintext();
    let mut trace = StateTrace(Vec::new());

    writeln!(out, "Prepare session with the TA")?;
    let mut context = Des3Context::initialize(backend)?;
    let mut session = context.open_session(&config.uuid)?;
    trace.enter(DemoState::SessionOpen);

    let (ciphertext, decrypted) = {
        let mut client = Des3Client::new(&mut session);

        let ciphertext =
            cipher_pass(&mut client, config, Des3Mode::Encode, &clear, &mut trace, out)?;
        writeln!(
            out,
            "===== Encrypted buffer (buflen = {}) =====",
            ciphertext.len()
        )?;
        writeln!(out, "{}", hex_dump(&ciphertext))?;

        let decrypted =
            cipher_pass(&mut client, config, Des3Mode::Decode, &ciphertext, &mut trace, out)?;
        writeln!(
            out,
            "===== Decrypted buffer (buflen = {}) =====",
            decrypted.len()
        )?;
        writeln!(out, "{}", hex_dump(&decrypted))?;

        (ciphertext, decrypted)
    };

    let verified = decrypted == clear;
    trace.enter(DemoState::Verified);
    if verified {
        writeln!(out, "Clear text and decoded text match")?;
    } else {
        writeln!(out, "Clear text and decoded text differ => ERROR")?;
    }
    info!("demo: round trip verified: {}", verified);

    session.close();
    context.finalize();
    trace.enter(DemoState::SessionClosed);

    Ok(DemoReport {
        ciphertext,
        decrypted,
        verified,
        states: trace.0,
    })
}
