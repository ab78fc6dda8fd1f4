//! Shared named audio arrays: random-access tables and circular delay lines.
//!
//! Both are owned by the routing fabric and referenced by symbol from reader
//! and writer objects. Writers and readers are interleaved deterministically
//! by the DSP order, so no locking happens on the audio path.

/// A named random-access sample array.
#[derive(Debug, Clone)]
pub struct Table {
    data: Vec<f32>,
}

impl Table {
    pub fn new(len: usize) -> Self {
        Table {
            data: vec![0.0; len.max(1)],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn buffer(&self) -> &[f32] {
        &self.data
    }

    pub fn buffer_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Resize and copy from the given samples.
    pub fn set_buffer(&mut self, samples: &[f32]) {
        self.data.clear();
        self.data.extend_from_slice(samples);
        if self.data.is_empty() {
            self.data.push(0.0);
        }
    }

    /// Linear-interpolated read at a fractional index, clamped to the array.
    pub fn read_interpolated(&self, index: f32) -> f32 {
        if !index.is_finite() || index <= 0.0 {
            return self.data[0];
        }
        let last = (self.data.len() - 1) as f32;
        if index >= last {
            return self.data[self.data.len() - 1];
        }
        let lower = index as usize;
        let fraction = index - lower as f32;
        self.data[lower] * (1.0 - fraction) + self.data[lower + 1] * fraction
    }
}

/// A circular signal buffer written block by block and read with a
/// fractional-sample delay.
///
/// `head` is the ring index where the current block's offset 0 lands, so the
/// writer and any readers can process the same `[from, to)` sub-range
/// independently; the head only advances at block end.
#[derive(Debug)]
pub struct DelayLine {
    buffer: Vec<f32>,
    head: usize,
    block_size: usize,
}

impl DelayLine {
    /// A delay line holding at least `len_ms` of signal. Capacity is rounded
    /// up to block alignment with one block of headroom so a full-length
    /// delay never collides with the block currently being written.
    pub fn new(len_ms: f32, sample_rate: f32, block_size: usize) -> Self {
        let wanted = (len_ms.max(0.0) as f64 * sample_rate as f64 / 1000.0).ceil() as usize;
        let aligned = wanted.div_ceil(block_size).max(1) * block_size;
        DelayLine {
            buffer: vec![0.0; aligned + block_size],
            head: 0,
            block_size,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Longest delay (in samples) that reads fully written history.
    pub fn max_delay_samples(&self) -> f32 {
        (self.buffer.len() - self.block_size) as f32
    }

    /// Write `input[from..to]` at the current block position.
    pub fn write_range(&mut self, input: &[f32], from: usize, to: usize) {
        let capacity = self.buffer.len();
        for i in from..to {
            self.buffer[(self.head + i) % capacity] = input[i];
        }
    }

    /// Read `[from, to)` delayed by `delay_samples`, linear-interpolated.
    pub fn read_range(&self, output: &mut [f32], from: usize, to: usize, delay_samples: f32) {
        let capacity = self.buffer.len() as f64;
        let delay = delay_samples.clamp(0.0, self.max_delay_samples()) as f64;
        for i in from..to {
            let position = ((self.head + i) as f64 - delay).rem_euclid(capacity);
            let lower = position as usize;
            let fraction = (position - lower as f64) as f32;
            let a = self.buffer[lower];
            let b = self.buffer[(lower + 1) % self.buffer.len()];
            output[i] = a * (1.0 - fraction) + b * fraction;
        }
    }

    /// Advance the write head past the finished block.
    pub fn end_block(&mut self) {
        self.head = (self.head + self.block_size) % self.buffer.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_read_interpolates() {
        let mut table = Table::new(4);
        table.set_buffer(&[0.0, 1.0, 2.0, 3.0]);

        assert_eq!(table.read_interpolated(0.0), 0.0);
        assert_eq!(table.read_interpolated(1.5), 1.5);
        assert_eq!(table.read_interpolated(3.0), 3.0);
        // Out of range clamps to the edges.
        assert_eq!(table.read_interpolated(-2.0), 0.0);
        assert_eq!(table.read_interpolated(99.0), 3.0);
    }

    #[test]
    fn table_set_buffer_resizes() {
        let mut table = Table::new(8);
        table.set_buffer(&[1.0, 2.0]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.buffer(), &[1.0, 2.0]);
    }

    #[test]
    fn delay_capacity_is_block_aligned() {
        let line = DelayLine::new(100.0, 44100.0, 64);
        // 4410 samples rounded up to 4416, plus one block of headroom.
        assert_eq!(line.capacity(), 4416 + 64);
        assert_eq!(line.max_delay_samples(), 4416.0);
    }

    #[test]
    fn integer_delay_round_trip() {
        let block = 64;
        let mut line = DelayLine::new(10.0, 44100.0, block);
        // Impulse at absolute sample 3, read back 100 samples later.
        let mut written = 0usize;
        let mut found = None;
        for block_index in 0..8 {
            let mut input = vec![0.0; block];
            if block_index == 0 {
                input[3] = 1.0;
            }
            line.write_range(&input, 0, block);
            let mut output = vec![0.0; block];
            line.read_range(&mut output, 0, block, 100.0);
            for (i, &sample) in output.iter().enumerate() {
                if sample > 0.5 {
                    found = Some(written + i);
                }
            }
            line.end_block();
            written += block;
        }
        assert_eq!(found, Some(103));
    }

    #[test]
    fn fractional_delay_interpolates() {
        let block = 4;
        let mut line = DelayLine::new(1.0, 1000.0, block);
        line.write_range(&[0.0, 1.0, 0.0, 0.0], 0, block);
        line.end_block();
        let mut output = vec![0.0; block];
        // Delay of 3.5 samples lands halfway between the impulse and silence.
        line.read_range(&mut output, 0, block, 3.5);
        assert!((output[0] - 0.5).abs() < 1e-6);
        assert!((output[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn partial_ranges_compose() {
        let block = 8;
        let mut line = DelayLine::new(1.0, 1000.0, block);
        let input: Vec<f32> = (0..block).map(|i| i as f32).collect();
        line.write_range(&input, 0, 3);
        line.write_range(&input, 3, block);
        let mut output = vec![0.0; block];
        line.read_range(&mut output, 0, block, 0.0);
        assert_eq!(output, input);
    }
}
