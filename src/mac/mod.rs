//! Medium Access Control (MAC) layer module.
//!
//! Non-beacon IEEE 802.15.4 MAC driver, providing unslotted CSMA/CA channel
//! access with bounded retransmission on the transmit path and frame type
//! dispatch on the receive path.
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

use log::{trace, debug, info, warn, error};

use ieee802154::mac::ExtendedAddress;
use rand_core::RngCore;

use crate::dllc::Dllc;
use crate::error::CoreError;
use crate::framer::{Framer, FrameKind};
use crate::packet::{Frame, MAX_FRAME_LEN};
use crate::phy::{Phy, PhyCommand, CmdValue};
use crate::pib::{self, Attr, AttributeStore};
use crate::timer::Delay;

pub mod config;
pub use config::{Config, PhyMode, MAX_FRAME_RETRIES};

pub mod csma;

/// Transmit completion callback, called with the registered argument
/// and the final result of each transmission
pub type TxCallback<E> = fn(usize, &Result<(), CoreError<E>>);

/// MAC control commands
#[derive(Clone)]
pub enum MacCommand<E> {
    /// Register the transmit completion callback
    SetTxCallback(Option<TxCallback<E>>),
    /// Register the argument passed to the transmit completion callback
    SetTxCallbackArg(usize),
    /// Forward a command to the PHY
    Phy(PhyCommand),
}

impl <E> core::fmt::Debug for MacCommand<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MacCommand::SetTxCallback(cb) => write!(f, "SetTxCallback(set: {})", cb.is_some()),
            MacCommand::SetTxCallbackArg(arg) => write!(f, "SetTxCallbackArg({:#x})", arg),
            MacCommand::Phy(cmd) => write!(f, "Phy({:?})", cmd),
        }
    }
}

/// Handles to the layers and services surrounding the MAC
pub struct NetStack<P, U, F, S, G, D> {
    /// Physical layer below the MAC
    pub phy: P,
    /// Data link control layer above the MAC
    pub dllc: U,
    /// Frame header decoder
    pub framer: F,
    /// Shared attribute store
    pub pib: S,
    /// Random source for CSMA/CA backoff
    pub rng: G,
    /// Delay for CSMA/CA backoff
    pub delay: D,
    /// Device link layer address
    pub address: ExtendedAddress,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MacStats {
    /// Channel access sequences run
    pub csma_sequences: u32,
    /// Channel access sequences failing to find a clear channel
    pub csma_fail: u32,
    /// Frames passed to the PHY for transmission
    pub tx_attempts: u32,
    /// Retransmissions following a collision or missing ACK
    pub tx_retries: u32,
    pub tx_ok: u32,
    pub tx_fail: u32,
    /// Frames delivered to the DLLC
    pub rx_ok: u32,
    /// Acknowledgements discarded on receipt
    pub rx_acks: u32,
    /// Malformed, oversized or unhandled frames
    pub rx_invalid: u32,
}

/// CSMA/CA MAC driver.
///
/// Generic over the PHY (P), DLLC (U), framer (F), attribute store (S),
/// random source (G) and delay (D).
pub struct Mac<P: Phy, U, F, S, G, D> {
    config: Config,
    stack: NetStack<P, U, F, S, G, D>,

    tx_cb: Option<TxCallback<P::Error>>,
    tx_cb_arg: usize,

    /// Buffer for received frames
    rx_buff: Frame,

    stats: MacStats,
}

impl <P, U, F, S, G, D> Mac<P, U, F, S, G, D>
where
    P: Phy,
    U: Dllc,
    F: Framer,
    S: AttributeStore,
    G: RngCore,
    D: Delay,
{
    /// Initialise the MAC, binding the surrounding stack and publishing
    /// derived MAC attributes to the attribute store
    pub fn init(stack: Option<NetStack<P, U, F, S, G, D>>, config: Config) -> Result<Self, CoreError<P::Error>> {
        let mut stack = match stack {
            Some(s) => s,
            None => {
                error!("MAC init without network stack");
                return Err(CoreError::InvalidArgument);
            },
        };

        config.validate::<P::Error>()?;

        let (unit_backoff, ack_wait) = match pib::derive_mac_attributes(&mut stack.pib, config.phy_mode) {
            Some(v) => v,
            None => {
                error!("PHY timing attributes out of range");
                return Err(CoreError::InvalidArgument);
            },
        };
        if unit_backoff == 0 {
            warn!("PHY symbol period unset, CSMA backoff disabled");
        }

        debug!("Setup MAC with address {:?} (unit backoff: {} us, ack wait: {} us)",
            stack.address, unit_backoff, ack_wait);

        Ok(Self {
            config,
            stack,
            tx_cb: None,
            tx_cb_arg: 0,
            rx_buff: Frame::new(),
            stats: MacStats::default(),
        })
    }

    /// Create a new MAC over the provided stack
    pub fn new(stack: NetStack<P, U, F, S, G, D>, config: Config) -> Result<Self, CoreError<P::Error>> {
        Self::init(Some(stack), config)
    }

    /// Turn the radio on
    pub fn on(&mut self) -> Result<(), CoreError<P::Error>> {
        self.stack.phy.on()
    }

    /// Turn the radio off
    pub fn off(&mut self) -> Result<(), CoreError<P::Error>> {
        self.stack.phy.off()
    }

    /// Transmit a frame, retrying on collisions (and on any failure where
    /// an acknowledgement is requested) up to [`MAX_FRAME_RETRIES`] attempts.
    ///
    /// The final result is passed to the transmit completion callback
    /// (if registered) prior to being returned.
    pub fn send(&mut self, data: &[u8]) -> Result<(), CoreError<P::Error>> {
        if data.is_empty() {
            return Err(CoreError::InvalidArgument);
        }

        let ack_required = self.stack.pib.ack_request();
        let mut attempts = 0;

        trace!("MAC TX {} bytes (ack: {}, max attempts: {})", data.len(), ack_required, MAX_FRAME_RETRIES);

        let result = loop {
            let attempt = self.attempt(data);
            attempts += 1;

            debug!("TX attempt {}: {:?}", attempts, attempt);

            // Retry collisions, or any failure for acknowledged frames
            let retry = match &attempt {
                Ok(_) => false,
                Err(e) => e.is_collision() || ack_required,
            };
            if !retry || attempts >= MAX_FRAME_RETRIES {
                break attempt;
            }

            self.stats.tx_retries = self.stats.tx_retries.saturating_add(1);
        };

        match &result {
            Ok(_) => {
                info!("TX complete after {} attempts", attempts);
                self.stats.tx_ok = self.stats.tx_ok.saturating_add(1);
            },
            Err(e) => {
                warn!("TX failed after {} attempts: {:?}", attempts, e);
                self.stats.tx_fail = self.stats.tx_fail.saturating_add(1);
            },
        }

        // Signal the upper layer of the transmission result
        if let Some(cb) = self.tx_cb {
            cb(self.tx_cb_arg, &result);
        }

        result
    }

    /// Single transmission attempt, following successful channel access
    fn attempt(&mut self, data: &[u8]) -> Result<(), CoreError<P::Error>> {
        let unit_backoff = self.stack.pib.get(Attr::MacUnitBackoffPeriod);

        self.stats.csma_sequences = self.stats.csma_sequences.saturating_add(1);

        let s = &mut self.stack;
        if let Err(e) = csma::channel_access(&mut s.phy, &mut s.rng, &mut s.delay, &self.config, unit_backoff) {
            self.stats.csma_fail = self.stats.csma_fail.saturating_add(1);
            return Err(e);
        }

        self.stats.tx_attempts = self.stats.tx_attempts.saturating_add(1);

        self.stack.phy.transmit(data)
    }

    /// Handle a frame received by the PHY, forwarding data and command
    /// frames to the DLLC
    pub fn recv(&mut self, data: &[u8]) -> Result<(), CoreError<P::Error>> {
        if data.is_empty() {
            return Err(CoreError::InvalidArgument);
        }

        // Discard oversized frames prior to buffering
        if data.len() > MAX_FRAME_LEN {
            error!("MAC RX invalid length ({} bytes)", data.len());
            self.stats.rx_invalid = self.stats.rx_invalid.saturating_add(1);
            return Err(CoreError::InvalidFrame);
        }

        self.rx_buff.set::<P::Error>(data)?;

        // Parse but don't strip the header, this is handled by the DLLC
        let info = match self.stack.framer.parse(self.rx_buff.data()) {
            Some(i) => i,
            None => {
                error!("MAC RX bad format");
                self.stats.rx_invalid = self.stats.rx_invalid.saturating_add(1);
                return Err(CoreError::InvalidFrame);
            },
        };

        match info.kind {
            FrameKind::Data | FrameKind::Command => {
                info!("MAC RX {} bytes (seq: {}, rssi: {})", data.len(), info.seq, self.stack.pib.rssi());

                if let Err(e) = self.stack.dllc.recv(self.rx_buff.data()) {
                    warn!("DLLC rejected frame {}: {:?}", info.seq, e);
                    return Err(e.into());
                }

                self.stats.rx_ok = self.stats.rx_ok.saturating_add(1);
                Ok(())
            },
            FrameKind::Ack => {
                // ACK timing is handled by the PHY during transmission
                debug!("Discarding ACK for packet {}", info.seq);
                self.stats.rx_acks = self.stats.rx_acks.saturating_add(1);
                Ok(())
            },
            FrameKind::Other => {
                warn!("Unhandled frame type for packet {}", info.seq);
                self.stats.rx_invalid = self.stats.rx_invalid.saturating_add(1);
                Err(CoreError::InvalidFrame)
            },
        }
    }

    /// Issue a control command, commands not handled by the MAC
    /// are forwarded to the PHY
    pub fn ioctl(&mut self, cmd: MacCommand<P::Error>) -> Result<CmdValue, CoreError<P::Error>> {
        match cmd {
            MacCommand::SetTxCallback(Some(cb)) => {
                self.tx_cb = Some(cb);
                Ok(CmdValue::None)
            },
            MacCommand::SetTxCallback(None) => Err(CoreError::InvalidArgument),
            MacCommand::SetTxCallbackArg(arg) => {
                self.tx_cb_arg = arg;
                Ok(CmdValue::None)
            },
            MacCommand::Phy(cmd) => self.stack.phy.ioctl(cmd),
        }
    }

    /// Fetch the device link layer address
    pub fn address(&self) -> ExtendedAddress {
        self.stack.address
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch MAC layer statistics
    pub fn stats(&self) -> MacStats {
        self.stats.clone()
    }

    pub fn pib(&self) -> &S {
        &self.stack.pib
    }

    pub fn pib_mut(&mut self) -> &mut S {
        &mut self.stack.pib
    }

    /// Release the surrounding stack
    pub fn free(self) -> NetStack<P, U, F, S, G, D> {
        self.stack
    }
}


#[cfg(test)]
mod test {
    use std::vec;
    use std::vec::Vec;
    use std::cell::RefCell;

    use crate::dllc::DllcError;
    use crate::framer::Ieee802154Framer;
    use crate::mock::{frames, MockDllc, MockError, MockPhy, MockRng};
    use crate::pib::Pib;
    use crate::timer::mock::MockDelay;
    use super::*;

    type TestMac = Mac<MockPhy, MockDllc, Ieee802154Framer, Pib, MockRng, MockDelay>;

    struct Harness {
        phy: MockPhy,
        dllc: MockDllc,
        delay: MockDelay,
    }

    fn setup(ack: bool) -> (TestMac, Harness) {
        let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, simplelog::Config::default());

        let phy = MockPhy::new();
        let dllc = MockDllc::new();
        let delay = MockDelay::new();

        let mut pib = Pib::with_phy(16, 2, 160, 192);
        pib.set_ack_request(ack);

        let stack = NetStack {
            phy: phy.clone(),
            dllc: dllc.clone(),
            framer: Ieee802154Framer,
            pib,
            rng: MockRng::zero(),
            delay: delay.clone(),
            address: ExtendedAddress(0x0011_2233_4455_6677),
        };

        let mac = Mac::new(stack, Config::default()).unwrap();

        (mac, Harness{ phy, dllc, delay })
    }

    std::thread_local! {
        static TX_RESULTS: RefCell<Vec<(usize, Result<(), CoreError<MockError>>)>> = RefCell::new(Vec::new());
    }

    fn record_tx(arg: usize, res: &Result<(), CoreError<MockError>>) {
        TX_RESULTS.with(|r| r.borrow_mut().push((arg, res.clone())));
    }

    fn take_tx_results() -> Vec<(usize, Result<(), CoreError<MockError>>)> {
        TX_RESULTS.with(|r| r.borrow_mut().drain(..).collect())
    }

    #[test]
    fn init_publishes_attributes() {
        let (mac, _h) = setup(false);

        assert_eq!(mac.pib().get(Attr::MacUnitBackoffPeriod), 320);
        assert_eq!(mac.pib().get(Attr::MacAckWaitDuration), 864);
        assert_eq!(mac.address(), ExtendedAddress(0x0011_2233_4455_6677));
    }

    #[test]
    fn init_without_stack() {
        let res = TestMac::init(None, Config::default());

        assert!(matches!(res, Err(CoreError::InvalidArgument)));
    }

    #[test]
    fn init_invalid_config() {
        let stack = NetStack {
            phy: MockPhy::new(),
            dllc: MockDllc::new(),
            framer: Ieee802154Framer,
            pib: Pib::default(),
            rng: MockRng::zero(),
            delay: MockDelay::new(),
            address: ExtendedAddress(1),
        };

        let config = Config{ min_be: 5, max_be: 3, ..Default::default() };
        let res = Mac::new(stack, config);

        assert!(matches!(res, Err(CoreError::InvalidArgument)));
    }

    #[test]
    fn init_out_of_range_phy() {
        let stack = NetStack {
            phy: MockPhy::new(),
            dllc: MockDllc::new(),
            framer: Ieee802154Framer,
            pib: Pib::with_phy(u32::MAX / 16, 2, 160, 192),
            rng: MockRng::zero(),
            delay: MockDelay::new(),
            address: ExtendedAddress(1),
        };

        let res = Mac::new(stack, Config::default());

        assert!(matches!(res, Err(CoreError::InvalidArgument)));
    }

    #[test]
    fn send_max_backoff_budget() {
        let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, simplelog::Config::default());

        let phy = MockPhy::new();
        let stack = NetStack {
            phy: phy.clone(),
            dllc: MockDllc::new(),
            framer: Ieee802154Framer,
            pib: Pib::default(),
            rng: MockRng::zero(),
            delay: MockDelay::new(),
            address: ExtendedAddress(1),
        };

        let config = Config{ max_csma_backoffs: u8::MAX, ..Default::default() };
        let mut mac = Mac::new(stack, config).unwrap();

        phy.expect_cca(&[false; 300]);

        assert_eq!(mac.send(&frames::data(1, &[1])), Err(CoreError::ChannelAccessFailure));
        assert_eq!(phy.cca_count(), u8::MAX as usize + 1);
    }

    #[test]
    fn shared_attribute_store() {
        let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, simplelog::Config::default());

        let pib = RefCell::new(Pib::with_phy(10, 1, 100, 120));
        let mut phy = MockPhy::new();

        let stack = NetStack {
            phy: &mut phy,
            dllc: MockDllc::new(),
            framer: Ieee802154Framer,
            pib: &pib,
            rng: MockRng::zero(),
            delay: MockDelay::new(),
            address: ExtendedAddress(1),
        };

        let mut mac = Mac::new(stack, Config::default()).unwrap();

        // Published to the shared store
        assert_eq!(pib.borrow().get(Attr::MacUnitBackoffPeriod), 200);

        // Upper layer requests ACKs via the shared store
        pib.borrow_mut().set_ack_request(true);
        assert_eq!(mac.pib().ack_request(), true);

        mac.send(&frames::data_ack_request(1, &[1])).unwrap();
    }

    #[test]
    fn power_passthrough() {
        let (mut mac, h) = setup(false);

        mac.on().unwrap();
        assert!(h.phy.powered());

        mac.off().unwrap();
        assert!(!h.phy.powered());
    }

    #[test]
    fn send_rejects_empty_frame() {
        let (mut mac, h) = setup(false);

        assert_eq!(mac.send(&[]), Err(CoreError::InvalidArgument));

        assert_eq!(h.phy.cca_count(), 0);
        assert_eq!(h.phy.tx_count(), 0);
        assert_eq!(mac.stats(), MacStats::default());
    }

    #[test]
    fn send_first_attempt() {
        let (mut mac, h) = setup(false);
        let frame = frames::data(1, &[0, 1, 2, 3]);

        mac.ioctl(MacCommand::SetTxCallback(Some(record_tx))).unwrap();
        mac.ioctl(MacCommand::SetTxCallbackArg(0xabcd)).unwrap();

        assert_eq!(mac.send(&frame), Ok(()));

        // One channel access sequence, one transmission
        assert_eq!(h.phy.cca_count(), 1);
        assert_eq!(h.phy.transmitted(), vec![frame.clone()]);

        let stats = mac.stats();
        assert_eq!(stats.csma_sequences, 1);
        assert_eq!(stats.tx_attempts, 1);
        assert_eq!(stats.tx_retries, 0);
        assert_eq!(stats.tx_ok, 1);

        assert_eq!(take_tx_results(), vec![(0xabcd, Ok(()))]);
    }

    #[test]
    fn send_retries_missing_ack() {
        let (mut mac, h) = setup(true);
        let frame = frames::data_ack_request(2, &[0xaa, 0xbb]);

        mac.ioctl(MacCommand::SetTxCallback(Some(record_tx))).unwrap();

        h.phy.expect_tx(&[
            Err(CoreError::NoAck),
            Err(CoreError::NoAck),
            Err(CoreError::NoAck),
            Ok(()),
        ]);

        assert_eq!(mac.send(&frame), Ok(()));

        assert_eq!(h.phy.cca_count(), 4);
        assert_eq!(h.phy.tx_count(), 4);
        assert!(h.phy.transmitted().iter().all(|f| f == &frame));

        let stats = mac.stats();
        assert_eq!(stats.csma_sequences, 4);
        assert_eq!(stats.tx_retries, 3);
        assert_eq!(stats.tx_ok, 1);

        assert_eq!(take_tx_results(), vec![(0, Ok(()))]);
    }

    #[test]
    fn send_exhausts_retries() {
        let (mut mac, h) = setup(true);
        let frame = frames::data_ack_request(3, &[0xaa]);

        mac.ioctl(MacCommand::SetTxCallback(Some(record_tx))).unwrap();

        h.phy.expect_tx(&[
            Err(CoreError::NoAck),
            Err(CoreError::Collision),
            Err(CoreError::NoAck),
            Err(CoreError::Collision),
            Ok(()),
        ]);

        // Last observed failure is reported
        assert_eq!(mac.send(&frame), Err(CoreError::Collision));

        assert_eq!(h.phy.tx_count(), MAX_FRAME_RETRIES as usize);

        // Retransmissions follow the first attempt
        let stats = mac.stats();
        assert_eq!(stats.tx_attempts, MAX_FRAME_RETRIES as u32);
        assert_eq!(stats.tx_retries, MAX_FRAME_RETRIES as u32 - 1);
        assert_eq!(stats.tx_fail, 1);
        assert_eq!(stats.tx_ok, 0);

        assert_eq!(take_tx_results(), vec![(0, Err(CoreError::Collision))]);
    }

    #[test]
    fn send_retries_collisions_without_ack() {
        let (mut mac, h) = setup(false);

        h.phy.expect_tx(&[Err(CoreError::Collision), Ok(())]);

        assert_eq!(mac.send(&frames::data(4, &[1])), Ok(()));

        assert_eq!(h.phy.tx_count(), 2);
        assert_eq!(mac.stats().tx_retries, 1);
    }

    #[test]
    fn send_surfaces_radio_faults() {
        let (mut mac, h) = setup(false);

        h.phy.expect_tx(&[Err(CoreError::Radio(MockError(7))), Ok(())]);

        assert_eq!(mac.send(&frames::data(5, &[1])), Err(CoreError::Radio(MockError(7))));

        // Not retried without an ACK request
        assert_eq!(h.phy.tx_count(), 1);
    }

    #[test]
    fn send_channel_access_failure() {
        let (mut mac, h) = setup(false);
        let max_cca = Config::default().max_csma_backoffs as usize + 1;

        h.phy.expect_cca(&[false; 64]);

        assert_eq!(mac.send(&frames::data(6, &[1])), Err(CoreError::ChannelAccessFailure));

        // No transmission, no retry without ACK request
        assert_eq!(h.phy.tx_count(), 0);
        assert_eq!(h.phy.cca_count(), max_cca);
        assert_eq!(mac.stats().csma_fail, 1);
    }

    #[test]
    fn send_channel_access_failure_with_ack() {
        let (mut mac, h) = setup(true);
        let max_cca = Config::default().max_csma_backoffs as usize + 1;

        h.phy.expect_cca(&[false; 64]);

        assert_eq!(mac.send(&frames::data_ack_request(7, &[1])), Err(CoreError::ChannelAccessFailure));

        // Every attempt runs a full channel access sequence
        assert_eq!(h.phy.tx_count(), 0);
        assert_eq!(h.phy.cca_count(), max_cca * MAX_FRAME_RETRIES as usize);
        assert_eq!(mac.stats().csma_fail, MAX_FRAME_RETRIES as u32);
    }

    #[test]
    fn send_backoff_uses_unit_period() {
        let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, simplelog::Config::default());

        let phy = MockPhy::new();
        let mut delay = MockDelay::new();

        let stack = NetStack {
            phy: phy.clone(),
            dllc: MockDllc::new(),
            framer: Ieee802154Framer,
            pib: Pib::default(),
            rng: MockRng::new(&[3]),
            delay: delay.clone(),
            address: ExtendedAddress(1),
        };

        let mut mac = Mac::new(stack, Config::default()).unwrap();

        phy.expect_cca(&[false, true]);
        mac.send(&frames::data(8, &[1])).unwrap();

        assert_eq!(delay.delays(), vec![3 * 320, 3 * 320]);

        // Unit backoff retuned through the attribute store
        delay.clear();
        mac.pib_mut().set(Attr::MacUnitBackoffPeriod, 100);
        mac.send(&frames::data(9, &[1])).unwrap();

        assert_eq!(delay.delays(), vec![3 * 100]);
    }

    #[test]
    fn callback_registration() {
        let (mut mac, h) = setup(false);

        mac.ioctl(MacCommand::SetTxCallback(Some(record_tx))).unwrap();
        mac.ioctl(MacCommand::SetTxCallbackArg(1)).unwrap();

        // Null callbacks are rejected, leaving the existing registration
        assert_eq!(mac.ioctl(MacCommand::SetTxCallback(None)), Err(CoreError::InvalidArgument));

        mac.send(&frames::data(9, &[1])).unwrap();
        assert_eq!(take_tx_results(), vec![(1, Ok(()))]);

        // Argument is overwritten
        mac.ioctl(MacCommand::SetTxCallbackArg(2)).unwrap();
        mac.send(&frames::data(10, &[1])).unwrap();
        assert_eq!(take_tx_results(), vec![(2, Ok(()))]);

        assert_eq!(h.phy.tx_count(), 2);
    }

    #[test]
    fn ioctl_passthrough() {
        let (mut mac, h) = setup(false);

        assert_eq!(mac.ioctl(MacCommand::Phy(PhyCommand::ChannelSet(15))), Ok(CmdValue::None));
        assert_eq!(mac.ioctl(MacCommand::Phy(PhyCommand::ChannelGet)), Ok(CmdValue::Channel(15)));
        assert_eq!(mac.ioctl(MacCommand::Phy(PhyCommand::TxPowerSet(3))), Err(CoreError::Unsupported));

        assert_eq!(h.phy.commands(), vec![
            PhyCommand::ChannelSet(15),
            PhyCommand::ChannelGet,
            PhyCommand::TxPowerSet(3),
        ]);
    }

    #[test]
    fn recv_data_and_command() {
        let (mut mac, h) = setup(false);

        let data = frames::data(11, &[1, 2, 3, 4, 5]);
        let cmd = frames::command(12, 0x04);

        assert_eq!(mac.recv(&data), Ok(()));
        assert_eq!(mac.recv(&cmd), Ok(()));

        // Forwarded untouched, header included
        assert_eq!(h.dllc.received(), vec![data, cmd]);
        assert_eq!(mac.stats().rx_ok, 2);
    }

    #[test]
    fn recv_discards_ack() {
        let (mut mac, h) = setup(false);

        assert_eq!(mac.recv(&frames::ack(13)), Ok(()));

        assert!(h.dllc.received().is_empty());
        assert_eq!(mac.stats().rx_acks, 1);
    }

    #[test]
    fn recv_rejects_oversized() {
        let (mut mac, h) = setup(false);

        let mut frame = frames::data(14, &[]);
        frame.resize(MAX_FRAME_LEN + 1, 0xaa);

        assert_eq!(mac.recv(&frame), Err(CoreError::InvalidFrame));
        assert!(h.dllc.received().is_empty());

        // Frames at capacity are accepted
        frame.truncate(MAX_FRAME_LEN);
        assert_eq!(mac.recv(&frame), Ok(()));
        assert_eq!(h.dllc.received().len(), 1);
    }

    #[test]
    fn recv_rejects_malformed() {
        let (mut mac, h) = setup(false);

        assert_eq!(mac.recv(&[]), Err(CoreError::InvalidArgument));
        assert_eq!(mac.recv(&[0x41]), Err(CoreError::InvalidFrame));
        assert_eq!(mac.recv(&[0x05, 0x10, 0x01]), Err(CoreError::InvalidFrame));

        // Beacons are not handled by this MAC
        assert_eq!(mac.recv(&frames::beacon(15)), Err(CoreError::InvalidFrame));

        assert!(h.dllc.received().is_empty());
        assert_eq!(mac.stats().rx_invalid, 3);
    }

    #[test]
    fn recv_dllc_error() {
        let (mut mac, h) = setup(false);

        h.dllc.expect(&[Err(DllcError::BufferFull)]);

        assert_eq!(mac.recv(&frames::data(16, &[1])), Err(CoreError::Dllc(DllcError::BufferFull)));
        assert_eq!(h.dllc.received().len(), 1);
        assert_eq!(mac.stats().rx_ok, 0);
    }

    #[test]
    fn recv_does_not_touch_transmit_path() {
        let (mut mac, h) = setup(true);

        mac.recv(&frames::data_ack_request(17, &[1])).unwrap();

        assert_eq!(h.phy.tx_count(), 0);
        assert_eq!(h.phy.cca_count(), 0);
        assert_eq!(h.delay.delays().len(), 0);
    }
}
