//! Demo configuration
//!
//! Defaults reproduce the fixed demo: key bytes `0..24`, IV bytes `0..8` and
//! a 128-byte buffer of bytes `0..128`. A JSON file and command-line flags
//! can override any of them.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use crate::error::{Des3HostError, Des3HostResult};
use des3_utils::{DES3_BLOCK_SIZE, DES3_KEY_SIZE_192, DES3_TA_UUID, DES3_TEST_BUFFER_SIZE};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoConfig {
    pub uuid: Uuid,
    pub key: Vec<u8>,
    pub iv: Vec<u8>,
    pub buffer_size: usize,
}

/// The on-disk form. Every field is optional; key and IV are hex strings.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DemoConfigFile {
    uuid: Option<String>,
    key: Option<String>,
    iv: Option<String>,
    buffer_size: Option<usize>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            uuid: DES3_TA_UUID,
            key: (0..DES3_KEY_SIZE_192).map(|i| i as u8).collect(),
            iv: (0..DES3_BLOCK_SIZE).map(|i| i as u8).collect(),
            buffer_size: DES3_TEST_BUFFER_SIZE,
        }
    }
}

impl DemoConfig {
    /// Parse a JSON configuration on top of the defaults.
    pub fn from_json(json: &str) -> Des3HostResult<Self> {
        let file: DemoConfigFile = serde_json::from_str(json)?;
        DemoConfig::default().with_overrides(
            file.uuid.as_deref(),
            file.key.as_deref(),
            file.iv.as_deref(),
            file.buffer_size,
        )
    }

    /// Replace the fields that are given, then validate the result.
    pub fn with_overrides(
        mut self,
        uuid: Option<&str>,
        key: Option<&str>,
        iv: Option<&str>,
        buffer_size: Option<usize>,
    ) -> Des3HostResult<Self> {
        if let Some(uuid) = uuid {
            self.uuid = Uuid::parse_str(uuid.trim())?;
        }
        if let Some(key) = key {
            self.key = hex::decode(key.trim())?;
        }
        if let Some(iv) = iv {
            self.iv = hex::decode(iv.trim())?;
        }
        if let Some(buffer_size) = buffer_size {
            self.buffer_size = buffer_size;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Des3HostResult<()> {
        if self.key.len() != DES3_KEY_SIZE_192 {
            return Err(Des3HostError::InvalidLengthError("key", DES3_KEY_SIZE_192));
        }
        if self.iv.len() != DES3_BLOCK_SIZE {
            return Err(Des3HostError::InvalidLengthError("iv", DES3_BLOCK_SIZE));
        }
        if self.buffer_size == 0 || self.buffer_size % DES3_BLOCK_SIZE != 0 {
            return Err(Des3HostError::InvalidConfigError(format!(
                "buffer size {} is not a non-zero multiple of {}",
                self.buffer_size, DES3_BLOCK_SIZE
            )));
        }
        Ok(())
    }

    /// The clear text the demo encodes: byte `i` is `i mod 256`.
    pub fn plaintext(&self) -> Vec<u8> {
        (0..self.buffer_size).map(|i| i as u8).collect()
    }
}
