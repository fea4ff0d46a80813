//! Shared helpers for the DES3 host integration tests
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

#![allow(dead_code)]

use des3_host::{
    platforms::simulator::{SimulatedContext, SimulatedSession, SimulatedTee},
    Des3Client, Des3Context, Des3HostResult, Des3Session,
};
use des3_utils::{Des3Mode, DES3_BLOCK_SIZE, DES3_KEY_SIZE_192, DES3_TA_UUID};
use rand::Rng;
use std::{env, path::PathBuf};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Path of `filename` in the test collateral directory, read from
/// `$DES3_TEST_COLLATERAL` or defaulting to `test-collateral` at the
/// workspace root.
pub fn collateral<T: AsRef<str>>(filename: T) -> PathBuf {
    let default = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-collateral");
    env::var("DES3_TEST_COLLATERAL")
        .map(PathBuf::from)
        .unwrap_or(default)
        .join(filename.as_ref())
}

pub fn initialize(tee: &SimulatedTee) -> Des3Context<SimulatedContext> {
    Des3Context::initialize(tee).unwrap()
}

pub fn open(context: &mut Des3Context<SimulatedContext>) -> Des3Session<SimulatedSession> {
    context.open_session(&DES3_TA_UUID).unwrap()
}

pub fn random_key() -> Vec<u8> {
    let mut key = vec![0u8; DES3_KEY_SIZE_192];
    rand::thread_rng().fill(&mut key[..]);
    key
}

pub fn random_iv() -> Vec<u8> {
    let mut iv = vec![0u8; DES3_BLOCK_SIZE];
    rand::thread_rng().fill(&mut iv[..]);
    iv
}

/// Random data of between one and `max_blocks` whole blocks.
pub fn random_blocks(max_blocks: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let blocks = rng.gen_range(1..=max_blocks);
    let mut data = vec![0u8; blocks * DES3_BLOCK_SIZE];
    rng.fill(&mut data[..]);
    data
}

/// PREPARE, SET_KEY, SET_IV and CIPHER for one direction.
pub fn cipher_pass(
    client: &mut Des3Client<'_, SimulatedSession>,
    mode: Des3Mode,
    key: &[u8],
    iv: &[u8],
    input: &[u8],
) -> Des3HostResult<Vec<u8>> {
    client.prepare(mode)?;
    client.set_key(key)?;
    client.set_iv(iv)?;
    let mut output = vec![0u8; input.len()];
    client.cipher(input, &mut output)?;
    Ok(output)
}
