//! Simulated MAC link example
//!
//! Runs a pair of MACs over a lossy simulated channel, reporting
//! transmit and receive statistics on completion.
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info, warn};

use structopt::StructOpt;
use humantime::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};

use lpwan_mac::prelude::*;
use lpwan_mac::timer::StdDelay;


#[derive(Debug, StructOpt)]
struct Options {
    #[structopt(long, default_value = "20")]
    /// Number of frames to send
    pub count: usize,

    #[structopt(long, default_value = "16")]
    /// Payload length in bytes
    pub payload_len: usize,

    #[structopt(long)]
    /// Request acknowledgements for transmitted frames
    pub ack: bool,

    #[structopt(long, default_value = "0.3")]
    /// Probability of a clear channel assessment reporting busy
    pub busy_prob: f64,

    #[structopt(long, default_value = "0.1")]
    /// Probability of a transmission colliding
    pub collision_prob: f64,

    #[structopt(long, default_value = "0.2")]
    /// Probability of a requested acknowledgement being lost
    pub ack_loss_prob: f64,

    #[structopt(long, default_value = "10ms")]
    /// Interval between transmissions
    pub interval: Duration,

    #[structopt(long)]
    /// Sleep for backoff periods rather than only accounting for them
    pub realtime: bool,

    #[structopt(long)]
    /// Seed for the simulation RNG
    pub seed: Option<u64>,

    #[structopt(long, default_value = "info")]
    /// Configure log level
    pub log_level: simplelog::LevelFilter,
}

/// Error type for the simulated radio
#[derive(Debug, Clone, PartialEq)]
pub struct SimError;

/// Shared channel state
struct Channel {
    rng: StdRng,
    busy_prob: f64,
    collision_prob: f64,
    ack_loss_prob: f64,
    /// Frames in flight, addressed by receiving node index
    in_flight: VecDeque<(usize, Vec<u8>)>,
}

/// Simulated PHY attached to a shared channel
struct SimPhy {
    index: usize,
    peer: usize,
    powered: bool,
    channel_num: u8,
    channel: Rc<RefCell<Channel>>,
}

impl Phy for SimPhy {
    type Error = SimError;

    fn on(&mut self) -> Result<(), CoreError<SimError>> {
        self.powered = true;
        Ok(())
    }

    fn off(&mut self) -> Result<(), CoreError<SimError>> {
        self.powered = false;
        Ok(())
    }

    fn transmit(&mut self, data: &[u8]) -> Result<(), CoreError<SimError>> {
        if !self.powered {
            return Err(CoreError::Radio(SimError));
        }

        let mut c = self.channel.borrow_mut();

        let p = c.collision_prob;
        if c.rng.gen_bool(p) {
            return Err(CoreError::Collision);
        }

        c.in_flight.push_back((self.peer, data.to_vec()));

        // Frame control ACK request bit
        let ack_request = data.first().map(|fc| fc & (1 << 5) != 0).unwrap_or(false);
        let p = c.ack_loss_prob;
        if ack_request && c.rng.gen_bool(p) {
            return Err(CoreError::NoAck);
        }

        Ok(())
    }

    fn ioctl(&mut self, cmd: PhyCommand) -> Result<CmdValue, CoreError<SimError>> {
        match cmd {
            PhyCommand::CcaGet => {
                let mut c = self.channel.borrow_mut();
                let p = c.busy_prob;
                match c.rng.gen_bool(p) {
                    true => Err(CoreError::ChannelBusy),
                    false => Ok(CmdValue::None),
                }
            },
            PhyCommand::RssiGet => Ok(CmdValue::Rssi(-95)),
            PhyCommand::ChannelGet => Ok(CmdValue::Channel(self.channel_num)),
            PhyCommand::ChannelSet(c) => {
                debug!("Node {} channel {}", self.index, c);
                self.channel_num = c;
                Ok(CmdValue::None)
            },
            _ => Err(CoreError::Unsupported),
        }
    }
}

/// DLLC counting received frames
#[derive(Default)]
struct CountingDllc {
    received: usize,
    bytes: usize,
}

impl Dllc for CountingDllc {
    fn recv(&mut self, frame: &[u8]) -> Result<(), DllcError> {
        debug!("DLLC RX: {:02x?}", frame);

        self.received += 1;
        self.bytes += frame.len();

        Ok(())
    }
}

/// Delay accounting for backoff periods, sleeping where configured
struct SimDelay {
    total_us: u64,
    sleep: Option<StdDelay>,
}

impl Delay for SimDelay {
    fn delay_us(&mut self, us: u32) {
        self.total_us += us as u64;

        if let Some(d) = &mut self.sleep {
            d.delay_us(us);
        }
    }
}

static TX_DONE: AtomicUsize = AtomicUsize::new(0);
static TX_FAILED: AtomicUsize = AtomicUsize::new(0);

fn tx_complete(node: usize, res: &Result<(), CoreError<SimError>>) {
    match res {
        Ok(_) => TX_DONE.fetch_add(1, Ordering::SeqCst),
        Err(e) => {
            warn!("Node {} TX failed: {:?}", node, e);
            TX_FAILED.fetch_add(1, Ordering::SeqCst)
        },
    };
}

/// Build a data frame with short addressing and PAN ID compression
fn data_frame(seq: u8, ack: bool, pan_id: u16, dst: u16, src: u16, payload: &[u8]) -> Vec<u8> {
    let mut fcf: u16 = 0b001 | (1 << 6) | (0b10 << 10) | (0b01 << 12) | (0b10 << 14);
    if ack {
        fcf |= 1 << 5;
    }

    let mut f = Vec::with_capacity(9 + payload.len());
    f.extend_from_slice(&fcf.to_le_bytes());
    f.push(seq);
    f.extend_from_slice(&pan_id.to_le_bytes());
    f.extend_from_slice(&dst.to_le_bytes());
    f.extend_from_slice(&src.to_le_bytes());
    f.extend_from_slice(payload);
    f
}

type SimMac = Mac<SimPhy, CountingDllc, Ieee802154Framer, Pib, StdRng, SimDelay>;

fn node(index: usize, peer: usize, seed: u64, channel: Rc<RefCell<Channel>>, realtime: bool) -> anyhow::Result<SimMac> {
    let stack = NetStack {
        phy: SimPhy{ index, peer, powered: false, channel_num: 11, channel },
        dllc: CountingDllc::default(),
        framer: Ieee802154Framer,
        pib: Pib::default(),
        rng: StdRng::seed_from_u64(seed),
        delay: SimDelay{ total_us: 0, sleep: match realtime { true => Some(StdDelay), false => None } },
        address: ExtendedAddress(0x1000 + index as u64),
    };

    let mut mac = match Mac::new(stack, MacConfig::default()) {
        Ok(m) => m,
        Err(e) => {
            return Err(anyhow::anyhow!("Error initialising MAC: {:?}", e));
        }
    };

    if let Err(e) = mac.ioctl(MacCommand::SetTxCallback(Some(tx_complete))) {
        return Err(anyhow::anyhow!("Error binding callback: {:?}", e));
    }
    if let Err(e) = mac.ioctl(MacCommand::SetTxCallbackArg(index)) {
        return Err(anyhow::anyhow!("Error binding callback arg: {:?}", e));
    }
    if let Err(e) = mac.on() {
        return Err(anyhow::anyhow!("Error starting radio: {:?}", e));
    }

    Ok(mac)
}

fn main() -> anyhow::Result<()> {
    // Load options
    let opts = Options::from_args();

    // Initialise logging
    let _ = simplelog::SimpleLogger::init(opts.log_level, simplelog::Config::default());

    info!("Starting mac-sim");

    for p in &[opts.busy_prob, opts.collision_prob, opts.ack_loss_prob] {
        if !(0.0..=1.0).contains(p) {
            return Err(anyhow::anyhow!("Probability {} out of range (0.0..=1.0)", p));
        }
    }

    let seed = opts.seed.unwrap_or_else(rand::random);
    debug!("Using seed: {}", seed);

    let channel = Rc::new(RefCell::new(Channel {
        rng: StdRng::seed_from_u64(seed),
        busy_prob: opts.busy_prob,
        collision_prob: opts.collision_prob,
        ack_loss_prob: opts.ack_loss_prob,
        in_flight: VecDeque::new(),
    }));

    let mut nodes = vec![
        node(0, 1, seed.wrapping_add(1), channel.clone(), opts.realtime)?,
        node(1, 0, seed.wrapping_add(2), channel.clone(), opts.realtime)?,
    ];

    nodes[0].pib_mut().set_ack_request(opts.ack);

    let payload: Vec<u8> = (0..opts.payload_len).map(|i| i as u8).collect();

    for i in 0..opts.count {
        let frame = data_frame(i as u8, opts.ack, 0x1234, 0x0002, 0x0001, &payload);

        // TX errors are reported via the completion callback
        let _ = nodes[0].send(&frame);

        // Deliver frames in flight
        loop {
            let next = channel.borrow_mut().in_flight.pop_front();
            let (to, data) = match next {
                Some(v) => v,
                None => break,
            };

            if let Err(e) = nodes[to].recv(&data) {
                warn!("Node {} RX error: {:?}", to, e);
            }
        }

        std::thread::sleep(*opts.interval);
    }

    for (i, n) in nodes.iter().enumerate() {
        info!("Node {} ({:?}) stats: {:?}", i, n.address(), n.stats());
    }

    let rx = nodes.remove(1).free();
    let tx = nodes.remove(0).free();

    info!("TX ok: {} failed: {}, RX: {} frames ({} bytes), backoff: {} us",
        TX_DONE.load(Ordering::SeqCst), TX_FAILED.load(Ordering::SeqCst),
        rx.dllc.received, rx.dllc.bytes, tx.delay.total_us);

    Ok(())
}
