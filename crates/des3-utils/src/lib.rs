//! The DES3 trusted application's shared constants
//!
//! Everything both sides of the TEE boundary must agree on: the UUID of the
//! trusted application, the command opcodes, and the values carried in the
//! PREPARE parameters.
//!
//! ## Authors
//!
//! The Veracruz Development Team.
//!
//! ## Licensing and copyright notice
//!
//! See the `LICENSE.markdown` file in the Veracruz root directory for
//! information on licensing and copyright.

use uuid::Uuid;

/// Protocol operation-codes and cipher modes.
pub mod opcode;
pub use self::opcode::*;

/// The unique ID of the DES3 trusted application,
/// `df05b8c4-35aa-4921-abc5-759a77940087`.
pub const DES3_TA_UUID: Uuid = Uuid::from_u128(0xdf05b8c4_35aa_4921_abc5_759a77940087);

/// Size of a DES block, and therefore of the CBC initialization vector.
pub const DES3_BLOCK_SIZE: usize = 8;

/// Size of a three-key Triple-DES key (3 x 64 bits).
pub const DES3_KEY_SIZE_192: usize = 24;

/// Size of the buffer encoded and decoded by the demo.
pub const DES3_TEST_BUFFER_SIZE: usize = 128;

/// The only chaining mode the trusted application supports.
pub const TA_DES3_ALGO_CBC: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_matches_the_trusted_application() {
        assert_eq!(
            DES3_TA_UUID.to_string(),
            "df05b8c4-35aa-4921-abc5-759a77940087"
        );
    }

    #[test]
    fn key_is_three_blocks() {
        assert_eq!(DES3_KEY_SIZE_192, 3 * DES3_BLOCK_SIZE);
        assert_eq!(DES3_TEST_BUFFER_SIZE % DES3_BLOCK_SIZE, 0);
    }
}
