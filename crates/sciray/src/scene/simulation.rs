//! Time varying per primitive values.
//!
//! A [SimulationHandler] provides one frame of scalar values per timestamp, one value
//! per primitive in commit order.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TimestampMode {
    /// Timestamps past the last frame have no data
    #[default]
    Unchanged,
    /// Timestamps wrap around
    Modulo,
    /// Timestamps are clamped to the last frame
    Bounded,
}

impl TimestampMode {
    pub fn frame_index(self, timestamp: f32, frame_count: usize) -> Option<usize> {
        if frame_count == 0 || !timestamp.is_finite() || timestamp < 0.0 {
            return None;
        }
        let frame = timestamp as usize;
        match self {
            TimestampMode::Unchanged => (frame < frame_count).then_some(frame),
            TimestampMode::Modulo => Some(frame % frame_count),
            TimestampMode::Bounded => Some(frame.min(frame_count - 1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub values: Vec<u64>,
    pub range: (f32, f32),
    pub timestamp: f32,
}

impl Histogram {
    pub fn compute(data: &[f32], bins: usize, timestamp: f32) -> Self {
        let finite = data.iter().copied().filter(|v| v.is_finite());
        let (min, max) = finite.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let mut values = vec![0; bins];
        if bins == 0 || min > max {
            return Self {
                values,
                range: (0.0, 0.0),
                timestamp,
            };
        }
        let span = max - min;
        for v in data.iter().copied().filter(|v| v.is_finite()) {
            let bin = if span > 0.0 {
                (((v - min) / span) * bins as f32) as usize
            } else {
                0
            };
            values[bin.min(bins - 1)] += 1;
        }
        Self {
            values,
            range: (min, max),
            timestamp,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|v| *v == 0)
    }
}

pub trait SimulationHandler: Send + Sync {
    fn frame_count(&self) -> usize;

    /// Number of values per frame
    fn frame_size(&self) -> usize;

    fn timestamp_mode(&self) -> TimestampMode;

    fn frame(&self, index: usize) -> Option<&[f32]>;

    fn frame_at(&self, timestamp: f32) -> Option<&[f32]> {
        let index = self
            .timestamp_mode()
            .frame_index(timestamp, self.frame_count())?;
        self.frame(index)
    }
}

/// Frames held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySimulation {
    frames: Vec<Vec<f32>>,
    frame_size: usize,
    mode: TimestampMode,
}

impl InMemorySimulation {
    /// Frames shorter than the first one are padded with zeros, longer ones truncated
    pub fn new(frames: Vec<Vec<f32>>, mode: TimestampMode) -> Self {
        let frame_size = frames.first().map_or(0, Vec::len);
        let frames = frames
            .into_iter()
            .map(|mut f| {
                if f.len() != frame_size {
                    log::warn!(
                        "simulation frame of {} values resized to {frame_size}",
                        f.len()
                    );
                    f.resize(frame_size, 0.0);
                }
                f
            })
            .collect();
        Self {
            frames,
            frame_size,
            mode,
        }
    }
}

impl SimulationHandler for InMemorySimulation {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn timestamp_mode(&self) -> TimestampMode {
        self.mode
    }

    fn frame(&self, index: usize) -> Option<&[f32]> {
        self.frames.get(index).map(Vec::as_slice)
    }
}
