//! Fixed-capacity circular delay line
//!
//! One write cursor; reads are either the oldest sample (plain delay, comb
//! and all-pass filters) or a linearly interpolated tap at a time-varying
//! offset (chorus, flanger, vibrato-style modulation).

/// Ring buffer with a single write cursor and index arithmetic modulo
/// capacity. Capacity is fixed at construction.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Create a delay line whose full delay is `delay_samples`.
    ///
    /// A zero-length request is rounded up to one sample so the ring is
    /// never empty.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
        }
    }

    /// Full delay of the line in samples
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Read the sample delayed by the full capacity (the oldest sample)
    pub fn read(&self) -> f32 {
        self.buffer[self.write_pos]
    }

    /// Read a tap delayed by `delay` samples with linear interpolation.
    ///
    /// `delay` is clamped to `[1, capacity]`; modulated callers size the
    /// line for their maximum excursion up front.
    pub fn read_fractional(&self, delay: f32) -> f32 {
        let cap = self.buffer.len();
        let delay = delay.clamp(1.0, cap as f32);
        let int_delay = delay.floor() as usize;
        let frac = delay - int_delay as f32;

        let a = self.buffer[(self.write_pos + cap - int_delay) % cap];
        // One sample older than `a`, saturating at the oldest slot
        let older = (int_delay + 1).min(cap);
        let b = self.buffer[(self.write_pos + cap - older) % cap];
        a * (1.0 - frac) + b * frac
    }

    /// Write a sample at the cursor and advance
    pub fn write_and_advance(&mut self, value: f32) {
        self.buffer[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }
}
