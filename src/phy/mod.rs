//! Physical layer (PHY) interface
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

use core::fmt::Debug;

use crate::error::CoreError;

pub mod hal;
pub use hal::{RadioPhy, RadioConfig, BaseState};

/// Control commands understood by the PHY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhyCommand {
    /// Perform a clear channel assessment, `Ok` indicates a clear channel
    /// and [`CoreError::ChannelBusy`] a busy one
    CcaGet,
    /// Sample the current RSSI
    RssiGet,
    /// Fetch the current RF channel
    ChannelGet,
    /// Set the RF channel
    ChannelSet(u8),
    /// Fetch the transmit power in dBm
    TxPowerGet,
    /// Set the transmit power in dBm
    TxPowerSet(i8),
}

/// Values returned by control commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CmdValue {
    None,
    Rssi(i16),
    Channel(u8),
    TxPower(i8),
}

/// PHY capability surface consumed by the MAC
pub trait Phy {
    type Error: Debug;

    /// Power on the radio
    fn on(&mut self) -> Result<(), CoreError<Self::Error>>;

    /// Power off the radio
    fn off(&mut self) -> Result<(), CoreError<Self::Error>>;

    /// Transmit a frame, blocking until complete.
    ///
    /// Returns [`CoreError::Collision`] where a collision was detected
    /// and [`CoreError::NoAck`] where an acknowledgement was requested
    /// but not received.
    fn transmit(&mut self, data: &[u8]) -> Result<(), CoreError<Self::Error>>;

    /// Issue a control command
    fn ioctl(&mut self, cmd: PhyCommand) -> Result<CmdValue, CoreError<Self::Error>>;
}

impl <T: Phy> Phy for &mut T {
    type Error = T::Error;

    fn on(&mut self) -> Result<(), CoreError<Self::Error>> {
        (**self).on()
    }

    fn off(&mut self) -> Result<(), CoreError<Self::Error>> {
        (**self).off()
    }

    fn transmit(&mut self, data: &[u8]) -> Result<(), CoreError<Self::Error>> {
        (**self).transmit(data)
    }

    fn ioctl(&mut self, cmd: PhyCommand) -> Result<CmdValue, CoreError<Self::Error>> {
        (**self).ioctl(cmd)
    }
}
