/// Pearson correlation of two equally long series.
///
/// Returns 0.0 when either side has no variance or fewer than two points, so
/// callers never see NaN.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= f64::EPSILON * f64::EPSILON || syy <= f64::EPSILON * f64::EPSILON {
        return 0.0;
    }
    let corr = sxy / (sxx.sqrt() * syy.sqrt());
    if corr.is_finite() {
        corr.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Running Pearson correlation over every pair seen so far (Welford co-moments).
#[derive(Debug, Clone, Default)]
pub struct ExpandingCorrelation {
    count: usize,
    mean_x: f64,
    mean_y: f64,
    m2_x: f64,
    m2_y: f64,
    c_xy: f64,
}

impl ExpandingCorrelation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.count += 1;
        let n = self.count as f64;
        let dx = x - self.mean_x;
        self.mean_x += dx / n;
        let dy = y - self.mean_y;
        self.mean_y += dy / n;
        self.m2_x += dx * (x - self.mean_x);
        self.m2_y += dy * (y - self.mean_y);
        self.c_xy += dx * (y - self.mean_y);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// `None` below two observations or with a constant side.
    pub fn value(&self) -> Option<f64> {
        if self.count < 2 || self.m2_x <= 0.0 || self.m2_y <= 0.0 {
            return None;
        }
        let corr = self.c_xy / (self.m2_x.sqrt() * self.m2_y.sqrt());
        corr.is_finite().then(|| corr.clamp(-1.0, 1.0))
    }
}
