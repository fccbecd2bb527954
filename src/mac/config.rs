use crate::error::CoreError;

/// Maximum number of transmission retries for a single frame
pub const MAX_FRAME_RETRIES: u8 = 4;

/// Upper bound on the backoff exponent (macMaxBE range 3..=8)
pub const MAX_BE_LIMIT: u8 = 8;

/// PHY timing mode, selects the acknowledgement frame length
/// used in computing macAckWaitDuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhyMode {
    /// O-QPSK / legacy PHYs
    Standard,
    /// IEEE 802.15.4g MR-FSK (SUN) PHY
    MrFsk,
}

impl PhyMode {
    /// Octets of acknowledgement frame (including PHY header) in the ack wait duration
    pub fn ack_octets(&self) -> u32 {
        match self {
            PhyMode::Standard => 6,
            PhyMode::MrFsk => 9,
        }
    }
}

/// Configuration for the CSMA/CA MAC
#[derive(Clone, PartialEq, Debug)]
pub struct Config {
    /// Minimum backoff exponent
    pub min_be: u8,
    /// Maximum backoff exponent
    pub max_be: u8,
    /// Maximum number of backoffs before declaring channel access failure
    pub max_csma_backoffs: u8,
    /// PHY timing mode
    pub phy_mode: PhyMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_be: 3,
            max_be: 5,
            max_csma_backoffs: 4,
            phy_mode: PhyMode::Standard,
        }
    }
}

impl Config {
    /// Check configuration values are within range
    pub fn validate<E>(&self) -> Result<(), CoreError<E>> {
        if self.max_be > MAX_BE_LIMIT || self.min_be > self.max_be {
            return Err(CoreError::InvalidArgument);
        }

        Ok(())
    }
}
