//! Mock stack layers to assist with testing
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

use std::vec::Vec;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rand_core::{RngCore, impls};

use crate::dllc::{Dllc, DllcError};
use crate::error::CoreError;
use crate::phy::{Phy, PhyCommand, CmdValue};

/// Error type for the mock PHY
#[derive(Debug, Clone, PartialEq)]
pub struct MockError(pub u8);

#[derive(Debug, Default)]
struct PhyInner {
    powered: bool,
    channel: u8,
    tx_results: VecDeque<Result<(), CoreError<MockError>>>,
    cca_results: VecDeque<Result<(), CoreError<MockError>>>,
    transmitted: Vec<Vec<u8>>,
    cca_count: usize,
    commands: Vec<PhyCommand>,
}

/// Mock PHY with scripted transmit and CCA outcomes.
///
/// Transmissions succeed and channels are clear once the scripts are exhausted.
#[derive(Clone, Debug)]
pub struct MockPhy(Arc<Mutex<PhyInner>>);

impl MockPhy {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(PhyInner{ channel: 11, ..Default::default() })))
    }

    /// Queue results for subsequent transmit calls
    pub fn expect_tx(&self, results: &[Result<(), CoreError<MockError>>]) {
        self.0.lock().unwrap().tx_results.extend(results.iter().cloned());
    }

    /// Queue channel states for subsequent CCA commands
    pub fn expect_cca(&self, clear: &[bool]) {
        let results = clear.iter().map(|c| match c {
            true => Ok(()),
            false => Err(CoreError::ChannelBusy),
        });
        self.0.lock().unwrap().cca_results.extend(results);
    }

    /// Queue raw CCA results (for injecting radio faults)
    pub fn expect_cca_results(&self, results: &[Result<(), CoreError<MockError>>]) {
        self.0.lock().unwrap().cca_results.extend(results.iter().cloned());
    }

    /// Frames passed to transmit
    pub fn transmitted(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap().transmitted.clone()
    }

    pub fn tx_count(&self) -> usize {
        self.0.lock().unwrap().transmitted.len()
    }

    pub fn cca_count(&self) -> usize {
        self.0.lock().unwrap().cca_count
    }

    /// Commands received through ioctl
    pub fn commands(&self) -> Vec<PhyCommand> {
        self.0.lock().unwrap().commands.clone()
    }

    pub fn powered(&self) -> bool {
        self.0.lock().unwrap().powered
    }
}

impl Phy for MockPhy {
    type Error = MockError;

    fn on(&mut self) -> Result<(), CoreError<MockError>> {
        self.0.lock().unwrap().powered = true;
        Ok(())
    }

    fn off(&mut self) -> Result<(), CoreError<MockError>> {
        self.0.lock().unwrap().powered = false;
        Ok(())
    }

    fn transmit(&mut self, data: &[u8]) -> Result<(), CoreError<MockError>> {
        let mut i = self.0.lock().unwrap();
        i.transmitted.push(data.to_vec());
        i.tx_results.pop_front().unwrap_or(Ok(()))
    }

    fn ioctl(&mut self, cmd: PhyCommand) -> Result<CmdValue, CoreError<MockError>> {
        let mut i = self.0.lock().unwrap();
        i.commands.push(cmd);

        match cmd {
            PhyCommand::CcaGet => {
                i.cca_count += 1;
                i.cca_results.pop_front().unwrap_or(Ok(())).map(|_| CmdValue::None)
            },
            PhyCommand::ChannelGet => Ok(CmdValue::Channel(i.channel)),
            PhyCommand::ChannelSet(c) => {
                i.channel = c;
                Ok(CmdValue::None)
            },
            _ => Err(CoreError::Unsupported),
        }
    }
}

#[derive(Debug, Default)]
struct DllcInner {
    received: Vec<Vec<u8>>,
    results: VecDeque<Result<(), DllcError>>,
}

/// Mock DLLC recording received frames
#[derive(Clone, Debug)]
pub struct MockDllc(Arc<Mutex<DllcInner>>);

impl MockDllc {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(DllcInner::default())))
    }

    /// Queue results for subsequent receive calls
    pub fn expect(&self, results: &[Result<(), DllcError>]) {
        self.0.lock().unwrap().results.extend(results.iter().cloned());
    }

    pub fn received(&self) -> Vec<Vec<u8>> {
        self.0.lock().unwrap().received.clone()
    }
}

impl Dllc for MockDllc {
    fn recv(&mut self, frame: &[u8]) -> Result<(), DllcError> {
        let mut i = self.0.lock().unwrap();
        i.received.push(frame.to_vec());
        i.results.pop_front().unwrap_or(Ok(()))
    }
}

/// Mock RNG returning a scripted sequence of values, repeating once exhausted
#[derive(Clone, Debug)]
pub struct MockRng {
    values: Vec<u32>,
    index: usize,
}

impl MockRng {
    pub fn new(values: &[u32]) -> Self {
        Self {
            values: values.to_vec(),
            index: 0,
        }
    }

    /// Always select the longest backoff
    pub fn max() -> Self {
        Self::new(&[u32::MAX])
    }

    /// Always select the shortest backoff
    pub fn zero() -> Self {
        Self::new(&[0])
    }
}

impl RngCore for MockRng {
    fn next_u32(&mut self) -> u32 {
        let v = self.values.get(self.index % self.values.len().max(1)).cloned().unwrap_or(0);
        self.index = self.index.wrapping_add(1);
        v
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Raw IEEE 802.15.4 (2006) frames for testing
pub mod frames {
    use std::vec::Vec;

    /// PAN ID used in test frames
    pub const PAN_ID: u16 = 0x1234;

    // Frame control: short addressing, PAN ID compression, 2006 frame version
    const FCF_SHORT_ADDRS: u16 = (0b10 << 10) | (0b01 << 12) | (0b10 << 14) | (1 << 6);

    fn addressed(frame_type: u16, ack_request: bool, seq: u8, body: &[u8]) -> Vec<u8> {
        let mut fcf = FCF_SHORT_ADDRS | frame_type;
        if ack_request {
            fcf |= 1 << 5;
        }

        let mut f = Vec::new();
        f.extend_from_slice(&fcf.to_le_bytes());
        f.push(seq);
        f.extend_from_slice(&PAN_ID.to_le_bytes());
        // Destination short address
        f.extend_from_slice(&0x0002u16.to_le_bytes());
        // Source short address
        f.extend_from_slice(&0x0001u16.to_le_bytes());
        f.extend_from_slice(body);
        f
    }

    /// Data frame without acknowledgement request
    pub fn data(seq: u8, payload: &[u8]) -> Vec<u8> {
        addressed(0b001, false, seq, payload)
    }

    /// Data frame requesting acknowledgement
    pub fn data_ack_request(seq: u8, payload: &[u8]) -> Vec<u8> {
        addressed(0b001, true, seq, payload)
    }

    /// MAC command frame
    pub fn command(seq: u8, command_id: u8) -> Vec<u8> {
        addressed(0b011, true, seq, &[command_id])
    }

    /// Immediate acknowledgement
    pub fn ack(seq: u8) -> Vec<u8> {
        let fcf: u16 = 0b010;
        let mut f = Vec::new();
        f.extend_from_slice(&fcf.to_le_bytes());
        f.push(seq);
        f
    }

    /// Beacon with a short source address and empty superframe
    pub fn beacon(seq: u8) -> Vec<u8> {
        let fcf: u16 = (0b10 << 14) | (0b01 << 12);
        let mut f = Vec::new();
        f.extend_from_slice(&fcf.to_le_bytes());
        f.push(seq);
        f.extend_from_slice(&PAN_ID.to_le_bytes());
        f.extend_from_slice(&0x0001u16.to_le_bytes());
        // Superframe, GTS and pending address fields
        f.extend_from_slice(&[0xff, 0xcf, 0x00, 0x00]);
        f
    }
}
