//! Frame header parsing
//
// https://github.com/rust-iot/rust-lpwan
// Copyright 2021 Ryan Kurte

use log::trace;

use ieee802154::mac::{FrameType, Header};

/// Frame type discriminant used for receive dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameKind {
    Data,
    Command,
    Ack,
    Other,
}

/// Parsed frame descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    /// Length of the MAC header in bytes
    pub header_len: usize,
    pub kind: FrameKind,
    pub seq: u8,
    pub ack_request: bool,
}

/// Frame header decoder
pub trait Framer {
    /// Parse the header of a received frame, returning `None` where
    /// the frame is malformed
    fn parse(&self, data: &[u8]) -> Option<FrameInfo>;
}

/// IEEE 802.15.4 header decoder
#[derive(Debug, Clone, Default)]
pub struct Ieee802154Framer;

impl Framer for Ieee802154Framer {
    fn parse(&self, data: &[u8]) -> Option<FrameInfo> {
        let (header, header_len) = match Header::decode(data) {
            Ok(v) => v,
            Err(e) => {
                trace!("Header decode failed: {:?}", e);
                return None;
            }
        };

        if header_len == 0 {
            return None;
        }

        let kind = match header.frame_type {
            FrameType::Data => FrameKind::Data,
            FrameType::MacCommand => FrameKind::Command,
            FrameType::Acknowledgement => FrameKind::Ack,
            _ => FrameKind::Other,
        };

        Some(FrameInfo {
            header_len,
            kind,
            seq: header.seq,
            ack_request: header.ack_request,
        })
    }
}
