//! Linear and band scales plus "nice" tick generation.

use crate::foundation::math::format_grouped_decimals;

/// Continuous linear mapping from a value domain to pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Rescale to `[0, max]`. A non-positive or non-finite max falls back to `[0, 1]`.
    pub fn set_domain_max(&mut self, max: f64) {
        let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };
        self.domain = (0.0, max);
    }

    pub fn apply(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Round tick values spanning the domain, roughly `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (start, stop) = self.domain;
        if count == 0 || !start.is_finite() || !stop.is_finite() {
            return Vec::new();
        }
        if start == stop {
            return vec![start];
        }
        let (lo, hi) = if start < stop {
            (start, stop)
        } else {
            (stop, start)
        };
        let Some(step) = TickStep::for_span(lo, hi, count) else {
            return Vec::new();
        };
        let i0 = step.first_index(lo);
        let i1 = step.last_index(hi);
        if i1 < i0 {
            return Vec::new();
        }
        (i0..=i1).map(|i| step.value(i)).collect()
    }

    /// Decimal places needed to print ticks for `count` without loss.
    pub fn tick_decimals(&self, count: usize) -> usize {
        let (start, stop) = self.domain;
        let lo = start.min(stop);
        let hi = start.max(stop);
        match TickStep::for_span(lo, hi, count) {
            Some(TickStep::Multiple(_)) | None => 0,
            Some(TickStep::Fraction(inv)) => inv.log10().ceil().max(0.0) as usize,
        }
    }

    pub fn tick_format(&self, v: f64, decimals: usize) -> String {
        format_grouped_decimals(v, decimals)
    }
}

/// A 1/2/5 x 10^k step, stored so fractional steps divide instead of multiply (exact decimals).
#[derive(Clone, Copy, Debug, PartialEq)]
enum TickStep {
    Multiple(f64),
    Fraction(f64),
}

impl TickStep {
    fn for_span(lo: f64, hi: f64, count: usize) -> Option<Self> {
        let raw = (hi - lo) / count as f64;
        if !(raw.is_finite() && raw > 0.0) {
            return None;
        }
        let power = raw.log10().floor();
        let error = raw / 10f64.powf(power);
        let factor = if error >= 50f64.sqrt() {
            10.0
        } else if error >= 10f64.sqrt() {
            5.0
        } else if error >= 2f64.sqrt() {
            2.0
        } else {
            1.0
        };
        if power >= 0.0 {
            Some(Self::Multiple(factor * 10f64.powf(power)))
        } else {
            Some(Self::Fraction(10f64.powf(-power) / factor))
        }
    }

    fn first_index(self, lo: f64) -> i64 {
        match self {
            Self::Multiple(s) => (lo / s).ceil() as i64,
            Self::Fraction(inv) => (lo * inv).ceil() as i64,
        }
    }

    fn last_index(self, hi: f64) -> i64 {
        match self {
            Self::Multiple(s) => (hi / s).floor() as i64,
            Self::Fraction(inv) => (hi * inv).floor() as i64,
        }
    }

    fn value(self, i: i64) -> f64 {
        match self {
            Self::Multiple(s) => i as f64 * s,
            Self::Fraction(inv) => i as f64 / inv,
        }
    }
}

/// Discrete band scale over ranks `0..=n`, rounded to whole pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandScale {
    start: f64,
    step: f64,
    bandwidth: f64,
    bands: usize,
}

impl BandScale {
    /// `bands` evenly padded bands inside `range` (inner and outer padding both `padding`).
    pub fn new(bands: usize, range: (f64, f64), padding: f64) -> Self {
        let (r0, r1) = range;
        let n = bands as f64;
        let mut step = (r1 - r0) / (n - padding + padding * 2.0).max(1.0);
        step = step.floor();
        let start = r0 + (r1 - r0 - step * (n - padding)) * 0.5;
        let bandwidth = step * (1.0 - padding);
        Self {
            start: start.round(),
            step,
            bandwidth: bandwidth.round(),
            bands,
        }
    }

    /// Top edge of band `i` (ranks past the last band clamp to it).
    pub fn position(&self, i: usize) -> f64 {
        let i = i.min(self.bands.saturating_sub(1));
        self.start + self.step * i as f64
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn step(&self) -> f64 {
        self.step
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/scale.rs"]
mod tests;
