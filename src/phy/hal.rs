//! PHY implementation over `radio` HAL devices
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

use core::fmt::Debug;

use log::{trace, debug, error};

use radio::{State, Transmit, Receive, Rssi, RadioState};

use crate::{error::CoreError, timer::Delay};
use super::{Phy, PhyCommand, CmdValue};

/// Configuration for radio backed PHYs
#[derive(Clone, PartialEq, Debug)]
pub struct RadioConfig {
    /// RSSI threshold for a channel to be determined to be clear
    pub channel_clear_threshold: i16,

    /// Interval between transmit completion polls in microseconds
    pub tx_poll_interval_us: u32,

    /// Number of polls prior to declaring a transmit timeout
    pub tx_poll_limit: u32,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            channel_clear_threshold: -90,
            tx_poll_interval_us: 100,
            tx_poll_limit: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BaseState {
    Idle,
    Listening,
    Transmitting,
    Sleeping,
}

/// Blocking PHY over a `radio` device.
///
/// Transmissions are polled to completion, after which the radio is
/// returned to receive mode. Clear channel assessment compares the
/// RSSI in receive mode against the configured threshold.
///
/// Acknowledgements are not awaited, radios with hardware ACK support
/// should implement [`Phy`] directly to report [`CoreError::NoAck`].
pub struct RadioPhy<R, D> {
    radio: R,
    delay: D,
    config: RadioConfig,
    state: BaseState,
}

impl <R, D> RadioPhy<R, D> {
    /// Create a new PHY using the provided radio
    pub fn new(radio: R, delay: D, config: RadioConfig) -> Self {
        Self {
            radio,
            delay,
            config,
            state: BaseState::Idle,
        }
    }

    pub fn state(&self) -> BaseState {
        self.state.clone()
    }

    /// Release the underlying radio
    pub fn free(self) -> (R, D) {
        (self.radio, self.delay)
    }
}

impl <R, S, E, D> RadioPhy<R, D>
where
    R: State<State=S, Error=E> + Transmit<Error=E> + Receive<Error=E> + Rssi<Error=E>,
    S: RadioState,
    E: Debug,
    D: Delay,
{
    /// Enter receive mode if not already
    fn listen(&mut self) -> Result<(), CoreError<E>> {
        if self.state != BaseState::Listening {
            trace!("Start receive");

            self.radio.start_receive().map_err(CoreError::Radio)?;
            self.state = BaseState::Listening;
        }

        Ok(())
    }
}

impl <R, S, E, D> Phy for RadioPhy<R, D>
where
    R: State<State=S, Error=E> + Transmit<Error=E> + Receive<Error=E> + Rssi<Error=E>,
    S: RadioState,
    E: Debug,
    D: Delay,
{
    type Error = E;

    fn on(&mut self) -> Result<(), CoreError<E>> {
        debug!("Radio on");

        self.radio.set_state(S::idle()).map_err(CoreError::Radio)?;
        self.state = BaseState::Idle;

        Ok(())
    }

    fn off(&mut self) -> Result<(), CoreError<E>> {
        debug!("Radio off");

        self.radio.set_state(S::sleep()).map_err(CoreError::Radio)?;
        self.state = BaseState::Sleeping;

        Ok(())
    }

    fn transmit(&mut self, data: &[u8]) -> Result<(), CoreError<E>> {
        trace!("Transmit {} bytes", data.len());

        // Start the transmission
        self.radio.start_transmit(data).map_err(CoreError::Radio)?;
        self.state = BaseState::Transmitting;

        // Poll for completion
        for _ in 0..self.config.tx_poll_limit {
            if self.radio.check_transmit().map_err(CoreError::Radio)? {
                trace!("Transmit complete");

                // Re-enter receive mode
                self.listen()?;

                return Ok(());
            }

            self.delay.delay_us(self.config.tx_poll_interval_us);
        }

        error!("Transmit timeout after {} polls", self.config.tx_poll_limit);

        // Abort the transmission
        self.radio.set_state(S::idle()).map_err(CoreError::Radio)?;
        self.state = BaseState::Idle;

        Err(CoreError::Timeout)
    }

    fn ioctl(&mut self, cmd: PhyCommand) -> Result<CmdValue, CoreError<E>> {
        match cmd {
            PhyCommand::CcaGet => {
                self.listen()?;

                // Check that we can't hear anyone else using the channel
                let rssi = self.radio.poll_rssi().map_err(CoreError::Radio)?;
                if rssi > self.config.channel_clear_threshold {
                    debug!("Channel busy (rssi: {})", rssi);
                    return Err(CoreError::ChannelBusy);
                }

                Ok(CmdValue::None)
            },
            PhyCommand::RssiGet => {
                self.listen()?;

                let rssi = self.radio.poll_rssi().map_err(CoreError::Radio)?;

                Ok(CmdValue::Rssi(rssi))
            },
            _ => {
                debug!("Unsupported PHY command: {:?}", cmd);
                Err(CoreError::Unsupported)
            },
        }
    }
}
