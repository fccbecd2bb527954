//! MAC crate prelude
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

pub use crate::{Mac, MacCommand, MacStats, NetStack, TxCallback};

pub use crate::mac::{Config as MacConfig, PhyMode, MAX_FRAME_RETRIES};

pub use crate::error::CoreError;
pub use crate::timer::Delay;

pub use crate::pib::{Attr, AttributeStore, Pib};

pub use crate::phy::{Phy, PhyCommand, CmdValue, RadioPhy, RadioConfig};

pub use crate::dllc::{Dllc, DllcError};

pub use crate::framer::{Framer, FrameInfo, FrameKind, Ieee802154Framer};

pub use ieee802154::mac::ExtendedAddress;
