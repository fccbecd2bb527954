
use heapless::Vec;

use crate::error::CoreError;

/// Capacity of frame buffers, frames exceeding this are rejected
pub const MAX_FRAME_LEN: usize = 128;

/// Statically sized frame buffer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    data: Vec<u8, MAX_FRAME_LEN>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy a frame into a new buffer
    pub fn from_slice<E>(data: &[u8]) -> Result<Self, CoreError<E>> {
        let mut f = Self::new();
        f.set::<E>(data)?;
        Ok(f)
    }

    /// Replace the buffer contents, frames larger than [`MAX_FRAME_LEN`]
    /// are rejected without modifying the buffer
    pub fn set<E>(&mut self, data: &[u8]) -> Result<(), CoreError<E>> {
        if data.len() > MAX_FRAME_LEN {
            return Err(CoreError::InvalidFrame);
        }

        self.data.clear();
        self.data.extend_from_slice(data).map_err(|_| CoreError::InvalidFrame)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
