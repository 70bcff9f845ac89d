//! Frame ring - CPU/GPU overlap through N frame slots
//!
//! Each slot owns a command list and the fence that signals when the GPU has
//! finished the work last submitted from it. A slot is only re-recorded after
//! its fence signaled.

use std::time::Duration;
use crate::error::{Error, Result};
use crate::renderer::CommandList;

/// One frame-in-flight slot
pub trait FrameSlot {
    /// Command list recorded from this slot
    type CommandList: CommandList;

    /// Block until the work last submitted from this slot has completed
    ///
    /// # Errors
    ///
    /// - `Timeout` if the fence did not signal within `timeout`
    /// - `DeviceLost` if the device was lost while waiting
    fn wait_ready(&self, timeout: Duration) -> Result<()>;

    /// Unsignal the fence and recycle the command memory
    ///
    /// Only valid after `wait_ready` succeeded.
    fn reset(&mut self) -> Result<()>;

    /// Command list of this slot
    fn command_list(&mut self) -> &mut Self::CommandList;
}

/// Ring of frame slots advanced once per presented frame
pub struct FrameRing<S> {
    slots: Vec<S>,
    current: usize,
    timeout: Duration,
}

impl<S: FrameSlot> FrameRing<S> {
    /// Create a ring over `slots`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `slots` is empty.
    pub fn new(slots: Vec<S>, timeout: Duration) -> Result<Self> {
        if slots.is_empty() {
            return Err(Error::InvalidArgument("frame ring needs at least one slot".to_string()));
        }
        Ok(Self { slots, current: 0, timeout })
    }

    /// Wait for the current slot's fence
    pub fn wait_current(&self) -> Result<()> {
        self.slots[self.current].wait_ready(self.timeout)
    }

    /// Reset the current slot and begin recording into it
    pub fn begin_current(&mut self) -> Result<()> {
        let slot = &mut self.slots[self.current];
        slot.reset()?;
        slot.command_list().begin()
    }

    /// `wait_current` followed by `begin_current`
    pub fn wait_frame(&mut self) -> Result<()> {
        self.wait_current()?;
        self.begin_current()
    }

    /// Move to the next slot after the current one was submitted
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.slots.len();
    }

    /// Index of the current slot
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Current slot
    pub fn current(&self) -> &S {
        &self.slots[self.current]
    }

    /// Current slot (mutable)
    pub fn current_mut(&mut self) -> &mut S {
        &mut self.slots[self.current]
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a ring holds at least one slot
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slots, in index order
    pub fn slots(&self) -> &[S] {
        &self.slots
    }
}

#[cfg(test)]
#[path = "frame_ring_tests.rs"]
mod tests;
