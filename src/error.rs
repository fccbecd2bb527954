//! Network stack error types
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

use crate::dllc::DllcError;

/// Stack errors, shared between the PHY surface and the MAC
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoreError<E> {
    /// Bad caller input, detected prior to any side effect
    InvalidArgument,

    /// Malformed or oversized inbound frame
    InvalidFrame,

    /// Transmission collided with another
    Collision,

    /// Acknowledgement requested but not received
    NoAck,

    /// CSMA/CA exhausted the backoff budget without a clear channel
    ChannelAccessFailure,

    /// Clear channel assessment reported a busy channel
    ChannelBusy,

    /// Command not supported by the underlying layer
    Unsupported,

    /// Radio did not complete an operation in time
    Timeout,

    /// Upper layer refused a received frame
    Dllc(DllcError),

    /// Wrapper for unhandled / underlying radio errors
    Radio(E),
}

impl <E> CoreError<E> {
    /// Whether the error reports a transmission collision
    pub fn is_collision(&self) -> bool {
        matches!(self, CoreError::Collision)
    }
}

impl <E> From<DllcError> for CoreError<E> {
    fn from(e: DllcError) -> Self {
        CoreError::Dllc(e)
    }
}
