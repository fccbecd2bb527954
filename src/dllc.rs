//! Data link control (DLLC) interface
//!
//! The DLLC sits above the MAC, handling header decompression and
//! fragment reassembly for received frames.
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

/// Reasons an upper layer may refuse a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DllcError {
    /// Frame could not be decoded by the upper layer
    InvalidFrame,
    /// No space to hold the frame
    BufferFull,
    /// Frame was not addressed to / wanted by this node
    Rejected,
}

/// Receive entry point of the data link control layer
pub trait Dllc {
    /// Hand a received frame to the upper layer.
    ///
    /// The frame still carries the MAC header, stripping this is the
    /// responsibility of the DLLC.
    fn recv(&mut self, frame: &[u8]) -> Result<(), DllcError>;
}

impl <T: Dllc> Dllc for &mut T {
    fn recv(&mut self, frame: &[u8]) -> Result<(), DllcError> {
        (**self).recv(frame)
    }
}
