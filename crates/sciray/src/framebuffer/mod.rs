//! Render targets.
//!
//! A [FrameBuffer] owns a color buffer of `width * height * bytes_per_pixel` bytes and
//! a depth buffer of `width * height` floats. Its backing storage comes from a
//! [StorageProvider]. CPU reads go through the [MappedFrame] guard returned by
//! [FrameBuffer::map], which unmaps when dropped.
//!
//! With accumulation on, successive renders are averaged until [FrameBuffer::clear].
//! With accumulation off, every render overwrites the previous one.

pub mod storage;

use bitflags::bitflags;
use glam::{UVec2, Vec4};

use crate::color::Rgb;
pub use storage::{
    Allocation, CountingStorage, HostStorage, StorageDesc, StorageError, StorageEvent,
    StorageProvider,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameBufferFormat {
    /// No color output, depth only
    None,
    #[default]
    RgbaI8,
    BgraI8,
    RgbI8,
    RgbaF32,
}

impl FrameBufferFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            FrameBufferFormat::None => 0,
            FrameBufferFormat::RgbaI8 | FrameBufferFormat::BgraI8 => 4,
            FrameBufferFormat::RgbI8 => 3,
            FrameBufferFormat::RgbaF32 => 16,
        }
    }

    /// Writes one linear RGBA pixel. 8-bit formats are sRGB encoded.
    fn encode(self, pixel: Vec4, out: &mut [u8]) {
        let srgb = |rgba: Vec4| {
            let [r, g, b] = Rgb::from_array([rgba.x, rgba.y, rgba.z])
                .to_srgb()
                .to_byte_array();
            let a = (rgba.w.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
            [r, g, b, a]
        };
        match self {
            FrameBufferFormat::None => (),
            FrameBufferFormat::RgbaI8 => out.copy_from_slice(&srgb(pixel)),
            FrameBufferFormat::BgraI8 => {
                let [r, g, b, a] = srgb(pixel);
                out.copy_from_slice(&[b, g, r, a]);
            }
            FrameBufferFormat::RgbI8 => out.copy_from_slice(&srgb(pixel)[..3]),
            FrameBufferFormat::RgbaF32 => out.copy_from_slice(bytemuck::bytes_of(&pixel.to_array())),
        }
    }
}

bitflags! {
    /// Buffers backing a frame buffer allocation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FrameBufferChannels: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const ACCUM = 1 << 2;
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameBufferError {
    #[error("frame buffer size must be non zero, got {0}x{1}")]
    ZeroSize(u32, u32),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("frame buffer has no backing storage")]
    NotAllocated,
    #[error("expected {expected} samples, got {got}")]
    SampleCount { expected: usize, got: usize },
}

pub type Result<T, E = FrameBufferError> = std::result::Result<T, E>;

/// One rendered pixel: linear RGBA and the distance to the first hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub color: Vec4,
    pub depth: f32,
}

impl Default for PixelSample {
    fn default() -> Self {
        Self {
            color: Vec4::ZERO,
            depth: f32::INFINITY,
        }
    }
}

pub struct FrameBuffer {
    size: UVec2,
    format: FrameBufferFormat,
    accumulation: bool,
    storage: Box<dyn StorageProvider>,
    allocation: Option<Allocation>,
    mapped: bool,
    accumulation_frames: u32,
    max_accumulation_frames: Option<u32>,
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("size", &self.size)
            .field("format", &self.format)
            .field("accumulation", &self.accumulation)
            .field("allocated", &self.allocation.is_some())
            .field("mapped", &self.mapped)
            .field("accumulation_frames", &self.accumulation_frames)
            .finish()
    }
}

impl FrameBuffer {
    /// Frame buffer in host memory
    pub fn new(size: UVec2, format: FrameBufferFormat, accumulation: bool) -> Result<Self> {
        Self::with_storage(size, format, accumulation, Box::<HostStorage>::default())
    }

    pub fn with_storage(
        size: UVec2,
        format: FrameBufferFormat,
        accumulation: bool,
        storage: Box<dyn StorageProvider>,
    ) -> Result<Self> {
        let mut this = Self {
            size,
            format,
            accumulation,
            storage,
            allocation: None,
            mapped: false,
            accumulation_frames: 0,
            max_accumulation_frames: None,
        };
        this.resize(size)?;
        Ok(this)
    }

    fn channels(&self) -> FrameBufferChannels {
        let mut channels = FrameBufferChannels::DEPTH;
        if self.format != FrameBufferFormat::None {
            channels |= FrameBufferChannels::COLOR;
        }
        if self.accumulation {
            channels |= FrameBufferChannels::ACCUM;
        }
        channels
    }

    fn release(&mut self) {
        self.unmap();
        if let Some(allocation) = self.allocation.take() {
            self.storage.release(allocation);
        }
    }

    /// Releases the current storage, then allocates storage for `size` and clears.
    ///
    /// On failure the frame buffer is left without storage.
    pub fn resize(&mut self, size: UVec2) -> Result<()> {
        self.release();
        self.size = size;
        if size.x == 0 || size.y == 0 {
            return Err(FrameBufferError::ZeroSize(size.x, size.y));
        }

        let desc = StorageDesc {
            size,
            format: self.format,
            channels: self.channels(),
        };
        match self.storage.allocate(&desc) {
            Ok(allocation) => {
                self.allocation = Some(allocation);
                log::debug!("frame buffer resized to {}x{}", size.x, size.y);
                self.clear();
                Ok(())
            }
            Err(err) => {
                log::error!("frame buffer allocation failed: {err}");
                Err(err.into())
            }
        }
    }

    /// Resets accumulation. Storage is kept.
    pub fn clear(&mut self) {
        self.accumulation_frames = 0;
        if let Some(allocation) = self.allocation.as_mut() {
            allocation.color.fill(0);
            allocation.depth.fill(f32::INFINITY);
            allocation.accum.fill(Vec4::ZERO);
        }
    }

    /// Exposes the buffers for CPU reads until the guard is dropped
    pub fn map(&mut self) -> Result<MappedFrame<'_>> {
        let Some(allocation) = self.allocation.as_ref() else {
            return Err(FrameBufferError::NotAllocated);
        };
        if !self.mapped {
            self.storage.map(allocation);
            self.mapped = true;
        }
        Ok(MappedFrame {
            frame_buffer: self,
            released: false,
        })
    }

    /// No-op when not mapped
    pub fn unmap(&mut self) {
        if !self.mapped {
            return;
        }
        if let Some(allocation) = self.allocation.as_ref() {
            self.storage.unmap(allocation);
        }
        self.mapped = false;
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    pub fn is_allocated(&self) -> bool {
        self.allocation.is_some()
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn format(&self) -> FrameBufferFormat {
        self.format
    }

    pub fn color_len(&self) -> usize {
        self.allocation.as_ref().map_or(0, |a| a.color.len())
    }

    pub fn depth_len(&self) -> usize {
        self.allocation.as_ref().map_or(0, |a| a.depth.len())
    }

    pub fn accumulation(&self) -> bool {
        self.accumulation
    }

    /// Switching accumulation reallocates the storage
    pub fn set_accumulation(&mut self, accumulation: bool) -> Result<()> {
        if self.accumulation == accumulation {
            return Ok(());
        }
        self.accumulation = accumulation;
        self.resize(self.size)
    }

    /// Number of renders combined since the last clear
    pub fn accumulation_frames(&self) -> u32 {
        self.accumulation_frames
    }

    pub fn set_max_accumulation_frames(&mut self, max: Option<u32>) {
        self.max_accumulation_frames = max;
    }

    /// Whether another render would change the contents
    pub fn needs_render(&self) -> bool {
        match self.max_accumulation_frames {
            Some(max) if self.accumulation => self.accumulation_frames < max,
            _ => true,
        }
    }

    /// Combines one rendered frame into the buffers.
    ///
    /// Returns `false` when the accumulation limit is reached and nothing changed.
    pub fn accumulate(&mut self, samples: &[PixelSample]) -> Result<bool> {
        if self.allocation.is_none() {
            return Err(FrameBufferError::NotAllocated);
        }
        let expected = self.size.x as usize * self.size.y as usize;
        if samples.len() != expected {
            return Err(FrameBufferError::SampleCount {
                expected,
                got: samples.len(),
            });
        }
        if !self.needs_render() {
            return Ok(false);
        }
        if self.mapped {
            crate::warn_once!("rendering into a mapped frame buffer, unmapping it first");
            self.unmap();
        }

        let format = self.format;
        let bpp = format.bytes_per_pixel();
        let accumulation = self.accumulation;
        let Some(allocation) = self.allocation.as_mut() else {
            return Err(FrameBufferError::NotAllocated);
        };

        let frames = if accumulation {
            self.accumulation_frames + 1
        } else {
            1
        };
        let inv_frames = 1.0 / frames as f32;

        for (i, sample) in samples.iter().enumerate() {
            let pixel = if accumulation {
                allocation.accum[i] += sample.color;
                allocation.accum[i] * inv_frames
            } else {
                sample.color
            };
            if bpp > 0 {
                format.encode(pixel, &mut allocation.color[i * bpp..(i + 1) * bpp]);
            }
            allocation.depth[i] = sample.depth;
        }
        self.accumulation_frames = frames;
        Ok(true)
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

/// Scoped CPU view of a frame buffer. Dropping it unmaps.
pub struct MappedFrame<'a> {
    frame_buffer: &'a mut FrameBuffer,
    released: bool,
}

impl MappedFrame<'_> {
    fn allocation(&self) -> &Allocation {
        // A guard only exists for an allocated frame buffer, and resize needs `&mut`.
        match self.frame_buffer.allocation.as_ref() {
            Some(allocation) => allocation,
            None => unreachable!("mapped frame buffer without storage"),
        }
    }

    pub fn color(&self) -> &[u8] {
        &self.allocation().color
    }

    pub fn depth(&self) -> &[f32] {
        &self.allocation().depth
    }

    pub fn size(&self) -> UVec2 {
        self.frame_buffer.size
    }

    pub fn format(&self) -> FrameBufferFormat {
        self.frame_buffer.format
    }

    pub fn accumulation_frames(&self) -> u32 {
        self.frame_buffer.accumulation_frames
    }

    pub fn unmap(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.frame_buffer.unmap();
        }
    }
}

impl Drop for MappedFrame<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMATS: [FrameBufferFormat; 5] = [
        FrameBufferFormat::None,
        FrameBufferFormat::RgbaI8,
        FrameBufferFormat::BgraI8,
        FrameBufferFormat::RgbI8,
        FrameBufferFormat::RgbaF32,
    ];

    fn flat_frame(size: UVec2, color: Vec4) -> Vec<PixelSample> {
        vec![PixelSample { color, depth: 1.0 }; (size.x * size.y) as usize]
    }

    #[test]
    fn buffer_lengths_follow_format() {
        for format in FORMATS {
            for (w, h) in [(1, 1), (3, 7), (64, 48)] {
                let fb = FrameBuffer::new(UVec2::new(w, h), format, true).unwrap();
                let pixels = (w * h) as usize;
                assert_eq!(fb.color_len(), pixels * format.bytes_per_pixel());
                assert_eq!(fb.depth_len(), pixels);
            }
        }
    }

    #[test]
    fn accumulation_counter_scenario() {
        let size = UVec2::new(800, 600);
        let mut fb = FrameBuffer::new(size, FrameBufferFormat::RgbaI8, true).unwrap();
        assert_eq!(fb.color_len(), 1_920_000);

        fb.clear();
        assert_eq!(fb.accumulation_frames(), 0);
        let frame = flat_frame(size, Vec4::ONE);
        assert!(fb.accumulate(&frame).unwrap());
        assert_eq!(fb.accumulation_frames(), 1);
        assert!(fb.accumulate(&frame).unwrap());
        assert_eq!(fb.accumulation_frames(), 2);
    }

    #[test]
    fn accumulation_averages_and_overwrite_does_not() {
        let size = UVec2::new(2, 2);
        let white = flat_frame(size, Vec4::ONE);
        let black = flat_frame(size, Vec4::new(0.0, 0.0, 0.0, 1.0));

        let mut fb = FrameBuffer::new(size, FrameBufferFormat::RgbaF32, true).unwrap();
        fb.accumulate(&white).unwrap();
        fb.accumulate(&black).unwrap();
        {
            let mapped = fb.map().unwrap();
            let pixels: &[f32] = bytemuck::cast_slice(mapped.color());
            assert_eq!(&pixels[..4], &[0.5, 0.5, 0.5, 1.0]);
        }

        let mut fb = FrameBuffer::new(size, FrameBufferFormat::RgbaF32, false).unwrap();
        fb.accumulate(&white).unwrap();
        fb.accumulate(&black).unwrap();
        assert_eq!(fb.accumulation_frames(), 1);
        let mapped = fb.map().unwrap();
        let pixels: &[f32] = bytemuck::cast_slice(mapped.color());
        assert_eq!(&pixels[..4], &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn map_unmap_map_yields_same_view() {
        let mut fb = FrameBuffer::new(UVec2::new(10, 5), FrameBufferFormat::RgbI8, false).unwrap();
        let first = fb.map().unwrap();
        let (color_len, depth_len) = (first.color().len(), first.depth().len());
        first.unmap();
        assert!(!fb.is_mapped());

        let second = fb.map().unwrap();
        assert_eq!(second.color().len(), color_len);
        assert_eq!(second.depth().len(), depth_len);
    }

    #[test]
    fn unmap_when_not_mapped_is_noop() {
        let storage = CountingStorage::new();
        let mut fb = FrameBuffer::with_storage(
            UVec2::new(4, 4),
            FrameBufferFormat::RgbaI8,
            false,
            Box::new(storage.clone()),
        )
        .unwrap();
        fb.unmap();
        fb.unmap();
        assert!(!fb.is_mapped());
        assert!(!storage
            .events()
            .iter()
            .any(|e| matches!(e, StorageEvent::Unmap(_))));
    }

    #[test]
    fn dropping_the_guard_unmaps_once() {
        let storage = CountingStorage::new();
        let mut fb = FrameBuffer::with_storage(
            UVec2::new(4, 4),
            FrameBufferFormat::RgbaI8,
            false,
            Box::new(storage.clone()),
        )
        .unwrap();
        {
            let _mapped = fb.map().unwrap();
        }
        assert!(!fb.is_mapped());
        fb.unmap();
        assert_eq!(
            storage.events(),
            vec![
                StorageEvent::Allocate(1),
                StorageEvent::Map(1),
                StorageEvent::Unmap(1)
            ]
        );
    }

    #[test]
    fn resize_releases_before_allocating() {
        let storage = CountingStorage::new();
        let mut fb = FrameBuffer::with_storage(
            UVec2::new(4, 4),
            FrameBufferFormat::RgbaI8,
            true,
            Box::new(storage.clone()),
        )
        .unwrap();
        std::mem::forget(fb.map().unwrap());
        assert!(fb.is_mapped());

        fb.resize(UVec2::new(8, 2)).unwrap();
        assert!(!fb.is_mapped());
        assert_eq!(fb.color_len(), 8 * 2 * 4);
        assert_eq!(
            storage.events(),
            vec![
                StorageEvent::Allocate(1),
                StorageEvent::Map(1),
                StorageEvent::Unmap(1),
                StorageEvent::Release(1),
                StorageEvent::Allocate(2),
            ]
        );
        assert_eq!(storage.live_allocations(), 1);

        drop(fb);
        assert_eq!(storage.live_allocations(), 0);
    }

    #[test]
    fn failed_resize_leaves_no_storage() {
        let storage = CountingStorage::failing_after(1);
        let mut fb = FrameBuffer::with_storage(
            UVec2::new(4, 4),
            FrameBufferFormat::RgbaI8,
            true,
            Box::new(storage.clone()),
        )
        .unwrap();
        assert!(matches!(
            fb.resize(UVec2::new(8, 8)),
            Err(FrameBufferError::Storage(_))
        ));
        assert!(!fb.is_allocated());
        assert_eq!(storage.live_allocations(), 0);
        assert_eq!(
            fb.accumulate(&flat_frame(UVec2::new(8, 8), Vec4::ONE)),
            Err(FrameBufferError::NotAllocated)
        );
        assert!(matches!(fb.map(), Err(FrameBufferError::NotAllocated)));
    }

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(
            FrameBuffer::new(UVec2::new(0, 4), FrameBufferFormat::RgbaI8, false).err(),
            Some(FrameBufferError::ZeroSize(0, 4))
        );
    }

    #[test]
    fn cleared_buffer_matches_fresh_buffer() {
        let size = UVec2::new(3, 3);
        let mut used = FrameBuffer::new(size, FrameBufferFormat::RgbaI8, true).unwrap();
        used.accumulate(&flat_frame(size, Vec4::new(1.0, 0.0, 0.0, 1.0)))
            .unwrap();
        used.clear();
        let frame = flat_frame(size, Vec4::new(0.2, 0.4, 0.6, 1.0));
        used.accumulate(&frame).unwrap();

        let mut fresh = FrameBuffer::new(size, FrameBufferFormat::RgbaI8, true).unwrap();
        fresh.accumulate(&frame).unwrap();

        let a = used.map().unwrap().color().to_vec();
        let b = fresh.map().unwrap().color().to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn accumulation_limit_freezes_the_buffer() {
        let size = UVec2::new(2, 1);
        let mut fb = FrameBuffer::new(size, FrameBufferFormat::RgbaI8, true).unwrap();
        fb.set_max_accumulation_frames(Some(1));
        assert!(fb.accumulate(&flat_frame(size, Vec4::ONE)).unwrap());
        assert!(!fb.accumulate(&flat_frame(size, Vec4::ZERO)).unwrap());
        assert_eq!(fb.accumulation_frames(), 1);
    }

    #[test]
    fn bgra_swaps_channels() {
        let size = UVec2::new(1, 1);
        let mut fb = FrameBuffer::new(size, FrameBufferFormat::BgraI8, false).unwrap();
        fb.accumulate(&flat_frame(size, Vec4::new(1.0, 0.0, 0.0, 1.0)))
            .unwrap();
        assert_eq!(fb.map().unwrap().color(), &[0, 0, 255, 255]);
    }
}
