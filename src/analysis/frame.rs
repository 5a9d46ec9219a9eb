// Frame buffer adapter - raw PCM chunks to fixed-length analysis frames
//
// Capture backends hand over whatever they managed to read (possibly less
// than a full frame, possibly more). The adapter normalizes int16 samples to
// [-1, 1) and always produces exactly N samples, zero-filling short reads.

/// Divisor mapping the int16 range onto [-1, 1)
pub const PCM_I16_SCALE: f32 = 32768.0;

/// Fixed-length frame of normalized samples
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFrame {
    samples: Vec<f32>,
}

impl AnalysisFrame {
    fn zeroed(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Converts raw int16 reads into [`AnalysisFrame`]s of a fixed size.
///
/// The frame buffer is allocated once and overwritten on every call so
/// the worker loop stays allocation-free.
#[derive(Debug)]
pub struct FrameBufferAdapter {
    frame: AnalysisFrame,
}

impl FrameBufferAdapter {
    pub fn new(frame_size: usize) -> Self {
        Self {
            frame: AnalysisFrame::zeroed(frame_size),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame.len()
    }

    /// Fill the frame from `raw`; samples beyond the frame size are ignored.
    pub fn ingest(&mut self, raw: &[i16]) -> &AnalysisFrame {
        let count = raw.len().min(self.frame.samples.len());
        let (filled, padding) = self.frame.samples.split_at_mut(count);

        for (dst, &src) in filled.iter_mut().zip(raw) {
            *dst = normalize(src);
        }
        padding.fill(0.0);

        &self.frame
    }
}

#[inline]
pub fn normalize(sample: i16) -> f32 {
    sample as f32 / PCM_I16_SCALE
}
