/// Fixed-capacity window over the most recent values, backed by a ring buffer.
///
/// Statistics are recomputed from the window contents in chronological order,
/// so results do not drift and are identical run to run.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    buffer: Vec<f64>,
    head: usize,
    count: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be > 0");
        Self {
            capacity,
            buffer: vec![0.0; capacity],
            head: 0,
            count: 0,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.buffer[self.head] = value;
        self.head = (self.head + 1) % self.capacity;
        if self.count < self.capacity {
            self.count += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let start = (self.head + self.capacity - self.count) % self.capacity;
        (0..self.count).map(move |i| self.buffer[(start + i) % self.capacity])
    }

    pub fn oldest(&self) -> Option<f64> {
        self.iter().next()
    }

    pub fn newest(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.buffer[(self.head + self.capacity - 1) % self.capacity])
    }

    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.iter().sum::<f64>() / self.count as f64)
    }

    /// Sample standard deviation (n - 1 denominator); needs two values.
    pub fn std(&self) -> Option<f64> {
        let mean = self.mean()?;
        if self.count < 2 {
            return None;
        }
        let ss: f64 = self.iter().map(|v| (v - mean) * (v - mean)).sum();
        Some((ss / (self.count - 1) as f64).sqrt())
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation of a slice; `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}
