//! Backing storage of frame buffers.
//!
//! A [StorageProvider] owns the allocations a frame buffer renders into. The frame
//! buffer only holds the [Allocation] handle between `allocate` and `release`.

use std::sync::{Arc, Mutex};

use glam::{UVec2, Vec4};

use super::{FrameBufferChannels, FrameBufferFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageDesc {
    pub size: UVec2,
    pub format: FrameBufferFormat,
    pub channels: FrameBufferChannels,
}

impl StorageDesc {
    pub fn pixel_count(&self) -> usize {
        self.size.x as usize * self.size.y as usize
    }

    pub fn color_len(&self) -> usize {
        if self.channels.contains(FrameBufferChannels::COLOR) {
            self.pixel_count() * self.format.bytes_per_pixel()
        } else {
            0
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("could not allocate {bytes} bytes: {reason}")]
pub struct StorageError {
    pub bytes: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct Allocation {
    pub handle: u64,
    pub color: Vec<u8>,
    pub depth: Vec<f32>,
    /// Running sums of linear RGBA samples, empty without [FrameBufferChannels::ACCUM]
    pub accum: Vec<Vec4>,
}

pub trait StorageProvider: Send {
    fn allocate(&mut self, desc: &StorageDesc) -> Result<Allocation, StorageError>;
    fn release(&mut self, allocation: Allocation);
    fn map(&mut self, allocation: &Allocation);
    fn unmap(&mut self, allocation: &Allocation);
}

fn host_allocation(handle: u64, desc: &StorageDesc) -> Result<Allocation, StorageError> {
    let pixels = desc.pixel_count();
    let color_len = desc.color_len();
    let bytes = color_len + pixels * std::mem::size_of::<f32>();

    let mut color = Vec::new();
    let mut depth = Vec::new();
    let mut accum = Vec::new();
    let reserve = |e: std::collections::TryReserveError| StorageError {
        bytes,
        reason: e.to_string(),
    };
    color.try_reserve_exact(color_len).map_err(reserve)?;
    depth.try_reserve_exact(pixels).map_err(reserve)?;
    if desc.channels.contains(FrameBufferChannels::ACCUM) {
        accum.try_reserve_exact(pixels).map_err(reserve)?;
        accum.resize(pixels, Vec4::ZERO);
    }
    color.resize(color_len, 0);
    depth.resize(pixels, f32::INFINITY);

    Ok(Allocation {
        handle,
        color,
        depth,
        accum,
    })
}

/// Plain host memory
#[derive(Debug, Default)]
pub struct HostStorage {
    next_handle: u64,
}

impl StorageProvider for HostStorage {
    fn allocate(&mut self, desc: &StorageDesc) -> Result<Allocation, StorageError> {
        self.next_handle += 1;
        host_allocation(self.next_handle, desc)
    }

    fn release(&mut self, allocation: Allocation) {
        drop(allocation);
    }

    fn map(&mut self, _allocation: &Allocation) {}

    fn unmap(&mut self, _allocation: &Allocation) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEvent {
    Allocate(u64),
    Release(u64),
    Map(u64),
    Unmap(u64),
}

/// Host memory recording every call in a shared event log. Allocation fails once
/// `fail_after` allocations succeeded.
#[derive(Debug, Default, Clone)]
pub struct CountingStorage {
    pub events: Arc<Mutex<Vec<StorageEvent>>>,
    pub fail_after: Option<usize>,
    next_handle: u64,
}

impl CountingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(allocations: usize) -> Self {
        Self {
            fail_after: Some(allocations),
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<StorageEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Allocations not yet released
    pub fn live_allocations(&self) -> usize {
        let events = self.events();
        let allocated = events
            .iter()
            .filter(|e| matches!(e, StorageEvent::Allocate(_)))
            .count();
        let released = events
            .iter()
            .filter(|e| matches!(e, StorageEvent::Release(_)))
            .count();
        allocated - released
    }

    fn record(&self, event: StorageEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl StorageProvider for CountingStorage {
    fn allocate(&mut self, desc: &StorageDesc) -> Result<Allocation, StorageError> {
        if let Some(remaining) = self.fail_after.as_mut() {
            if *remaining == 0 {
                return Err(StorageError {
                    bytes: desc.color_len(),
                    reason: "allocation limit reached".to_owned(),
                });
            }
            *remaining -= 1;
        }
        self.next_handle += 1;
        let allocation = host_allocation(self.next_handle, desc)?;
        self.record(StorageEvent::Allocate(allocation.handle));
        Ok(allocation)
    }

    fn release(&mut self, allocation: Allocation) {
        self.record(StorageEvent::Release(allocation.handle));
    }

    fn map(&mut self, allocation: &Allocation) {
        self.record(StorageEvent::Map(allocation.handle));
    }

    fn unmap(&mut self, allocation: &Allocation) {
        self.record(StorageEvent::Unmap(allocation.handle));
    }
}
