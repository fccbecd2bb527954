//! PAN Information Base (PIB) attribute store
//!
//! The store is shared between layers: the PHY publishes its timing
//! attributes, the MAC derives and publishes its own from these, and upper
//! layers set per-frame options (such as acknowledgement requests) prior to
//! transmission.
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

use core::cell::RefCell;

use strum::{EnumCount, EnumIter, IntoStaticStr};

use crate::mac::config::PhyMode;

/// Number of symbols forming the basic CSMA/CA time period (aUnitBackoffPeriod)
pub const UNIT_BACKOFF_SYMBOLS: u32 = 20;

/// Numeric PIB attribute keys, durations are in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumCount, EnumIter, IntoStaticStr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attr {
    /// Duration of one modulation symbol
    PhySymbolPeriod,
    /// Symbols per octet for the current PHY
    PhySymbolsPerOctet,
    /// Duration of the synchronisation header
    PhyShrDuration,
    /// RX-to-TX or TX-to-RX turnaround time
    PhyTurnaroundTime,
    /// CSMA/CA unit backoff period, published by the MAC
    MacUnitBackoffPeriod,
    /// Maximum wait for an acknowledgement, published by the MAC
    MacAckWaitDuration,
}

impl Attr {
    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Attribute store shared between stack layers
pub trait AttributeStore {
    /// Fetch a numeric attribute
    fn get(&self, attr: Attr) -> u32;

    /// Write a numeric attribute
    fn set(&mut self, attr: Attr, value: u32);

    /// Whether the frame being transmitted requests an acknowledgement
    fn ack_request(&self) -> bool;

    /// Set the acknowledgement request flag for the next transmission
    fn set_ack_request(&mut self, ack: bool);

    /// RSSI of the most recently received frame (read-only for the MAC)
    fn rssi(&self) -> i16;
}

/// Default attribute store
#[derive(Debug, Clone, PartialEq)]
pub struct Pib {
    values: [u32; Attr::COUNT],
    ack_request: bool,
    rssi: i16,
}

impl Default for Pib {
    /// Defaults for the 2.45 GHz O-QPSK PHY
    fn default() -> Self {
        Self::with_phy(16, 2, 160, 192)
    }
}

impl Pib {
    /// Create a store populated with the provided PHY timing attributes
    pub fn with_phy(symbol_period: u32, symbols_per_octet: u32, shr_duration: u32, turnaround_time: u32) -> Self {
        let mut p = Self {
            values: [0u32; Attr::COUNT],
            ack_request: false,
            rssi: 0,
        };

        p.set(Attr::PhySymbolPeriod, symbol_period);
        p.set(Attr::PhySymbolsPerOctet, symbols_per_octet);
        p.set(Attr::PhyShrDuration, shr_duration);
        p.set(Attr::PhyTurnaroundTime, turnaround_time);

        p
    }

    /// Update the RSSI of the last received frame (PHY side)
    pub fn set_rssi(&mut self, rssi: i16) {
        self.rssi = rssi;
    }
}

impl AttributeStore for Pib {
    fn get(&self, attr: Attr) -> u32 {
        self.values[attr.index()]
    }

    fn set(&mut self, attr: Attr, value: u32) {
        self.values[attr.index()] = value;
    }

    fn ack_request(&self) -> bool {
        self.ack_request
    }

    fn set_ack_request(&mut self, ack: bool) {
        self.ack_request = ack;
    }

    fn rssi(&self) -> i16 {
        self.rssi
    }
}

impl <T: AttributeStore> AttributeStore for &RefCell<T> {
    fn get(&self, attr: Attr) -> u32 {
        self.borrow().get(attr)
    }

    fn set(&mut self, attr: Attr, value: u32) {
        self.borrow_mut().set(attr, value)
    }

    fn ack_request(&self) -> bool {
        self.borrow().ack_request()
    }

    fn set_ack_request(&mut self, ack: bool) {
        self.borrow_mut().set_ack_request(ack)
    }

    fn rssi(&self) -> i16 {
        self.borrow().rssi()
    }
}

#[cfg(feature = "std")]
impl <T: AttributeStore> AttributeStore for std::rc::Rc<RefCell<T>> {
    fn get(&self, attr: Attr) -> u32 {
        self.borrow().get(attr)
    }

    fn set(&mut self, attr: Attr, value: u32) {
        self.borrow_mut().set(attr, value)
    }

    fn ack_request(&self) -> bool {
        self.borrow().ack_request()
    }

    fn set_ack_request(&mut self, ack: bool) {
        self.borrow_mut().set_ack_request(ack)
    }

    fn rssi(&self) -> i16 {
        self.borrow().rssi()
    }
}

#[cfg(feature = "std")]
impl <T: AttributeStore> AttributeStore for std::sync::Arc<std::sync::Mutex<T>> {
    fn get(&self, attr: Attr) -> u32 {
        lock_store(self).get(attr)
    }

    fn set(&mut self, attr: Attr, value: u32) {
        lock_store(self).set(attr, value)
    }

    fn ack_request(&self) -> bool {
        lock_store(self).ack_request()
    }

    fn set_ack_request(&mut self, ack: bool) {
        lock_store(self).set_ack_request(ack)
    }

    fn rssi(&self) -> i16 {
        lock_store(self).rssi()
    }
}

/// Lock a shared store, recovering the values held by a poisoned lock
#[cfg(feature = "std")]
fn lock_store<T>(store: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    store.lock().unwrap_or_else(|e| {
        log::warn!("Recovering poisoned attribute store");
        e.into_inner()
    })
}

/// Compute the CSMA/CA unit backoff period from the PHY symbol period,
/// `None` where this overflows
pub fn unit_backoff_period(symbol_period: u32) -> Option<u32> {
    UNIT_BACKOFF_SYMBOLS.checked_mul(symbol_period)
}

/// Compute macAckWaitDuration as defined in IEEE 802.15.4(g),
/// `None` where this overflows
pub fn ack_wait_duration(mode: PhyMode, symbol_period: u32, symbols_per_octet: u32, shr_duration: u32, turnaround_time: u32) -> Option<u32> {
    let ack_symbols = mode.ack_octets().checked_mul(symbols_per_octet)?;

    unit_backoff_period(symbol_period)?
        .checked_add(turnaround_time)?
        .checked_add(shr_duration)?
        .checked_add(ack_symbols.checked_mul(symbol_period)?)
}

/// Derive MAC timing attributes from the PHY attributes held in the store
/// and publish them, returning (unit backoff period, ack wait duration).
///
/// Returns `None` without modifying the store where the PHY attributes
/// are out of range.
pub fn derive_mac_attributes<S: AttributeStore>(pib: &mut S, mode: PhyMode) -> Option<(u32, u32)> {
    let symbol_period = pib.get(Attr::PhySymbolPeriod);
    let symbols_per_octet = pib.get(Attr::PhySymbolsPerOctet);
    let shr_duration = pib.get(Attr::PhyShrDuration);
    let turnaround_time = pib.get(Attr::PhyTurnaroundTime);

    let unit_backoff = unit_backoff_period(symbol_period)?;
    let ack_wait = ack_wait_duration(mode, symbol_period, symbols_per_octet, shr_duration, turnaround_time)?;

    pib.set(Attr::MacUnitBackoffPeriod, unit_backoff);
    pib.set(Attr::MacAckWaitDuration, ack_wait);

    Some((unit_backoff, ack_wait))
}
