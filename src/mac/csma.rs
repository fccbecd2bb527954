//! Unslotted CSMA/CA channel access
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

use core::cmp::min;

use log::{trace, debug, warn};

use rand_core::RngCore;

use crate::{error::CoreError, phy::{Phy, PhyCommand}, timer::Delay};

use super::config::Config;

/// CSMA/CA state for a single channel access sequence
#[derive(Debug, Clone, PartialEq)]
pub struct CsmaState {
    /// Number of backoffs performed (NB), wider than the configured
    /// limit so the sequence always terminates
    pub nb: u16,
    /// Backoff exponent (BE)
    pub be: u8,
}

impl CsmaState {
    pub fn new(config: &Config) -> Self {
        Self {
            nb: 0,
            be: config.min_be,
        }
    }

    /// Generate a random backoff in unit backoff periods, in [0, 2^BE - 1]
    pub fn backoff_periods<G: RngCore>(&self, rng: &mut G) -> u32 {
        let r = rng.next_u32();

        // Exponents of 32 or more cover the full u32 range
        match 1u32.checked_shl(self.be as u32) {
            Some(window) => r % window,
            None => r,
        }
    }

    /// Update state following a busy channel
    pub fn busy(&mut self, config: &Config) {
        self.nb = self.nb.saturating_add(1);
        self.be = min(self.be.saturating_add(1), config.max_be);
    }

    /// Whether the backoff budget has been used up
    pub fn exhausted(&self, config: &Config) -> bool {
        self.nb > u16::from(config.max_csma_backoffs)
    }
}

/// Run an unslotted CSMA/CA sequence, returning the number of backoffs
/// prior to finding the channel clear or [`CoreError::ChannelAccessFailure`]
/// once the backoff budget is exhausted.
///
/// Each iteration delays for a random number of unit backoff periods
/// (`unit_backoff_us`) prior to a single clear channel assessment.
/// Invalid configurations are rejected with [`CoreError::InvalidArgument`].
pub fn channel_access<P, G, D>(phy: &mut P, rng: &mut G, delay: &mut D, config: &Config, unit_backoff_us: u32) -> Result<u16, CoreError<P::Error>>
where
    P: Phy,
    G: RngCore,
    D: Delay,
{
    config.validate::<P::Error>()?;

    let mut state = CsmaState::new(config);

    while !state.exhausted(config) {
        // Delay for random (2^BE - 1) unit backoff periods
        let backoff_us = state.backoff_periods(rng).saturating_mul(unit_backoff_us);

        trace!("CSMA NB: {} BE: {} backoff {} us", state.nb, state.be, backoff_us);

        delay.delay_us(backoff_us);

        // Assess the channel
        match phy.ioctl(PhyCommand::CcaGet) {
            Ok(_) => {
                trace!("Channel clear after {} backoffs", state.nb);
                return Ok(state.nb);
            },
            Err(CoreError::ChannelBusy) => (),
            Err(e) => {
                warn!("CCA error: {:?}, treating channel as busy", e);
            },
        }

        state.busy(config);
    }

    debug!("Channel access failure (NB: {})", state.nb);

    Err(CoreError::ChannelAccessFailure)
}
