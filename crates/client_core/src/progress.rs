//! Cosmetic progress reveal played after the upload response has arrived.

use std::time::Duration;

pub const DEFAULT_PROGRESS_STEP: u8 = 10;
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressAnimation {
    step: u8,
    interval: Duration,
    enabled: bool,
}

impl Default for ProgressAnimation {
    fn default() -> Self {
        Self {
            step: DEFAULT_PROGRESS_STEP,
            interval: DEFAULT_PROGRESS_INTERVAL,
            enabled: true,
        }
    }
}

impl ProgressAnimation {
    pub fn new(step: u8, interval: Duration) -> Self {
        Self {
            step: step.clamp(1, 100),
            interval,
            enabled: true,
        }
    }

    /// Skips the ticks and jumps straight to 100%.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Values reported on each tick, ending at exactly 100.
    pub fn steps(&self) -> Vec<u8> {
        if !self.enabled {
            return vec![100];
        }
        let mut values = Vec::new();
        let mut progress = 0u8;
        while progress < 100 {
            progress = progress.saturating_add(self.step).min(100);
            values.push(progress);
        }
        values
    }

    /// Sleeps one interval before each reported value and returns once 100 has been
    /// reported.
    pub async fn run(&self, mut on_tick: impl FnMut(u8)) {
        for value in self.steps() {
            if self.enabled {
                tokio::time::sleep(self.interval).await;
            }
            on_tick(value);
        }
    }
}
