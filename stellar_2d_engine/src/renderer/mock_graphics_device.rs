//! Mock graphics device for unit tests (no GPU required)
//!
//! Tracks live allocations, records command streams and simulates a GPU that
//! finishes submitted work only when the CPU waits on the fence.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::renderer::{
    check_write_range, Buffer, BufferDesc, BufferUsage, CommandList, FrameSlot,
    GraphicsDevice, IndexType,
};

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub id: u64,
    pub usage: BufferUsage,
    pub data: Mutex<Vec<u8>>,
    live: Arc<AtomicUsize>,
}

impl MockBuffer {
    /// Copy of the buffer contents
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.data.lock().unwrap().len() as u64
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut storage = self.data.lock().unwrap();
        check_write_range(storage.len() as u64, offset, data)?;
        let start = offset as usize;
        storage[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    live: Arc<AtomicUsize>,
    created: AtomicUsize,
    next_id: AtomicU64,
    wait_idle_calls: AtomicUsize,
    /// Number of further allocations that succeed before `OutOfMemory`
    allocation_budget: Mutex<Option<usize>>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicUsize::new(0)),
            created: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
            wait_idle_calls: AtomicUsize::new(0),
            allocation_budget: Mutex::new(None),
        }
    }

    /// Buffers created and not yet dropped
    pub fn live_allocations(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Buffers created over the device lifetime
    pub fn total_allocations(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn wait_idle_calls(&self) -> usize {
        self.wait_idle_calls.load(Ordering::SeqCst)
    }

    /// Let `count` more allocations succeed, then fail with `OutOfMemory`
    pub fn set_allocation_budget(&self, count: Option<usize>) {
        *self.allocation_budget.lock().unwrap() = count;
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    type Buffer = MockBuffer;

    fn create_buffer(&self, desc: &BufferDesc) -> Result<MockBuffer> {
        desc.validate()?;

        let mut budget = self.allocation_budget.lock().unwrap();
        if let Some(remaining) = budget.as_mut() {
            if *remaining == 0 {
                return Err(Error::OutOfMemory);
            }
            *remaining -= 1;
        }

        self.live.fetch_add(1, Ordering::SeqCst);
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(MockBuffer {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            usage: desc.usage,
            data: Mutex::new(vec![0; desc.size as usize]),
            live: self.live.clone(),
        })
    }

    fn wait_idle(&self) -> Result<()> {
        self.wait_idle_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCommand {
    Begin,
    End,
    BindVertexBuffers { first_binding: u32, buffer_ids: Vec<u64> },
    BindIndexBuffer { buffer_id: u64, index_type: IndexType },
    DrawIndexed { index_count: u32, instance_count: u32 },
}

#[derive(Debug, Default)]
pub struct MockCommandList {
    pub commands: Vec<MockCommand>,
}

impl MockCommandList {
    pub fn new() -> Self {
        Self { commands: Vec::new() }
    }

    /// `(index_count, instance_count)` of every recorded draw, in order
    pub fn draws(&self) -> Vec<(u32, u32)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                MockCommand::DrawIndexed { index_count, instance_count } => {
                    Some((*index_count, *instance_count))
                }
                _ => None,
            })
            .collect()
    }
}

impl CommandList for MockCommandList {
    type Buffer = MockBuffer;

    fn begin(&mut self) -> Result<()> {
        self.commands.clear();
        self.commands.push(MockCommand::Begin);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.commands.push(MockCommand::End);
        Ok(())
    }

    fn bind_vertex_buffers(&mut self, first_binding: u32, buffers: &[&MockBuffer]) -> Result<()> {
        self.commands.push(MockCommand::BindVertexBuffers {
            first_binding,
            buffer_ids: buffers.iter().map(|buffer| buffer.id).collect(),
        });
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &MockBuffer, index_type: IndexType) -> Result<()> {
        self.commands.push(MockCommand::BindIndexBuffer { buffer_id: buffer.id, index_type });
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, instance_count: u32) -> Result<()> {
        self.commands.push(MockCommand::DrawIndexed { index_count, instance_count });
        Ok(())
    }
}

// ============================================================================
// Mock FrameSlot (slow GPU)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceState {
    /// Work finished (fences are created signaled)
    Signaled,
    /// Reset by the CPU, nothing submitted yet
    Unsignaled,
    /// Submitted, the GPU has not finished
    Pending,
}

/// Frame slot whose GPU work completes only when the CPU waits for it
pub struct MockFrameSlot {
    pub index: usize,
    pub fence: Cell<FenceState>,
    /// Simulated GPU execution time of one frame
    pub gpu_latency: Duration,
    pub command_list: MockCommandList,
    pub events: Rc<RefCell<Vec<String>>>,
}

impl MockFrameSlot {
    pub fn new(index: usize, gpu_latency: Duration, events: Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            index,
            fence: Cell::new(FenceState::Signaled),
            gpu_latency,
            command_list: MockCommandList::new(),
            events,
        }
    }

    /// Hand the recorded commands to the simulated GPU
    pub fn submit(&mut self) -> Result<()> {
        if self.fence.get() != FenceState::Unsignaled {
            return Err(Error::BackendError(format!(
                "slot {} submitted with fence in state {:?}",
                self.index,
                self.fence.get()
            )));
        }
        self.fence.set(FenceState::Pending);
        self.events.borrow_mut().push(format!("submit {}", self.index));
        Ok(())
    }
}

impl FrameSlot for MockFrameSlot {
    type CommandList = MockCommandList;

    fn wait_ready(&self, timeout: Duration) -> Result<()> {
        match self.fence.get() {
            FenceState::Signaled => Ok(()),
            FenceState::Pending if self.gpu_latency <= timeout => {
                self.fence.set(FenceState::Signaled);
                self.events.borrow_mut().push(format!("signaled {}", self.index));
                Ok(())
            }
            // Pending work slower than the timeout, or a fence nobody will signal
            _ => Err(Error::Timeout),
        }
    }

    fn reset(&mut self) -> Result<()> {
        if self.fence.get() == FenceState::Pending {
            return Err(Error::BackendError(format!(
                "slot {} reset while its work is in flight",
                self.index
            )));
        }
        self.fence.set(FenceState::Unsignaled);
        self.events.borrow_mut().push(format!("begin {}", self.index));
        Ok(())
    }

    fn command_list(&mut self) -> &mut MockCommandList {
        &mut self.command_list
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
