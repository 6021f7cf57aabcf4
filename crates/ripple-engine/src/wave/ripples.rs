use serde::{Deserialize, Serialize};

use super::WaveError;

/// Periodic random impulses that keep the surface moving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisturbanceConfig {
    pub enabled: bool,
    /// Seconds between impulses.
    pub interval: f32,
    /// Cells kept clear along every edge.
    pub margin: u32,
    pub min_magnitude: f32,
    pub max_magnitude: f32,
    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for DisturbanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 0.25,
            margin: 4,
            min_magnitude: 1.0,
            max_magnitude: 2.0,
            seed: None,
        }
    }
}

impl DisturbanceConfig {
    pub fn validate(&self) -> Result<(), WaveError> {
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return Err(WaveError::InvalidParameter {
                name: "interval",
                value: self.interval,
            });
        }
        if !(self.min_magnitude.is_finite() && self.max_magnitude.is_finite())
            || self.min_magnitude > self.max_magnitude
        {
            return Err(WaveError::InvalidParameter {
                name: "max_magnitude",
                value: self.max_magnitude,
            });
        }
        Ok(())
    }
}

/// One impulse at an interior cell.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Disturbance {
    pub row: u32,
    pub col: u32,
    pub magnitude: f32,
}

pub struct DisturbanceSchedule {
    config: DisturbanceConfig,
    acc: f32,
    rng: fastrand::Rng,
}

impl DisturbanceSchedule {
    pub fn new(config: DisturbanceConfig) -> Result<Self, WaveError> {
        config.validate()?;
        let rng = config.seed.map(fastrand::Rng::with_seed).unwrap_or_default();
        Ok(Self { config, acc: 0.0, rng })
    }

    pub fn config(&self) -> &DisturbanceConfig {
        &self.config
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        self.acc = 0.0;
    }

    /// Advances the schedule by `elapsed` seconds and returns an impulse when one is due.
    ///
    /// At most one impulse is produced per call.
    pub fn poll(&mut self, elapsed: f32, rows: u32, cols: u32) -> Option<Disturbance> {
        if !self.config.enabled || !(elapsed > 0.0) {
            return None;
        }

        self.acc += elapsed;
        if self.acc < self.config.interval {
            return None;
        }
        self.acc = (self.acc - self.config.interval) % self.config.interval;

        Some(self.sample(rows, cols))
    }

    /// Random impulse inside the margin. Always at least one cell from the edge.
    pub fn sample(&mut self, rows: u32, cols: u32) -> Disturbance {
        let row = self.interior(rows);
        let col = self.interior(cols);
        let span = self.config.max_magnitude - self.config.min_magnitude;
        Disturbance {
            row,
            col,
            magnitude: self.config.min_magnitude + self.rng.f32() * span,
        }
    }

    fn interior(&mut self, extent: u32) -> u32 {
        debug_assert!(extent >= 3);
        let margin = self.config.margin.clamp(1, (extent - 1) / 2);
        self.rng.u32(margin..=extent - 1 - margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(interval: f32) -> DisturbanceSchedule {
        DisturbanceSchedule::new(DisturbanceConfig {
            interval,
            seed: Some(7),
            ..DisturbanceConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn fires_once_per_interval() {
        let mut s = seeded(0.25);
        assert!(s.poll(0.1, 64, 64).is_none());
        assert!(s.poll(0.1, 64, 64).is_none());
        assert!(s.poll(0.1, 64, 64).is_some());
        assert!(s.poll(0.1, 64, 64).is_none());
    }

    #[test]
    fn impulses_respect_margin_and_magnitude() {
        let mut s = seeded(0.25);
        for _ in 0..500 {
            let d = s.sample(32, 48);
            assert!((4..=27).contains(&d.row), "row {}", d.row);
            assert!((4..=43).contains(&d.col), "col {}", d.col);
            assert!((1.0..=2.0).contains(&d.magnitude));
        }
    }

    #[test]
    fn margin_is_clamped_on_small_grids() {
        let mut s = DisturbanceSchedule::new(DisturbanceConfig {
            margin: 40,
            seed: Some(1),
            ..DisturbanceConfig::default()
        })
        .unwrap();
        for _ in 0..100 {
            let d = s.sample(16, 16);
            assert!((1..=14).contains(&d.row));
            assert!((1..=14).contains(&d.col));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = seeded(0.25);
        let mut b = seeded(0.25);
        for _ in 0..10 {
            assert_eq!(a.sample(64, 64), b.sample(64, 64));
        }
    }

    #[test]
    fn disabled_schedule_never_fires() {
        let mut s = DisturbanceSchedule::new(DisturbanceConfig {
            enabled: false,
            ..DisturbanceConfig::default()
        })
        .unwrap();
        assert!(s.poll(10.0, 64, 64).is_none());
    }

    #[test]
    fn rejects_inverted_magnitude_range() {
        let cfg = DisturbanceConfig {
            min_magnitude: 3.0,
            max_magnitude: 1.0,
            ..DisturbanceConfig::default()
        };
        assert!(DisturbanceSchedule::new(cfg).is_err());
    }
}
