//! IEEE 802.15.4 CSMA/CA MAC layer
//!
//! Provides a non-beacon MAC driver sitting between a [`phy::Phy`] and a
//! data link control ([`dllc::Dllc`]) layer, with unslotted CSMA/CA channel
//! access, bounded retransmission and receive frame dispatch.
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

#![no_std]

#[cfg(any(test, feature="std"))]
extern crate std;

pub mod error;

pub mod timer;

pub mod pib;

pub mod phy;

pub mod dllc;

pub mod framer;

pub mod packet;

pub mod mac;

#[cfg(any(test, feature="mocks"))]
pub mod mock;

pub mod prelude;

pub use mac::{Mac, MacCommand, MacStats, NetStack, TxCallback};
