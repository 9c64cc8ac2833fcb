use std::time::Duration;

/// What an external visual surface (typically the chart container) reports
/// when polled: how many loading indicators are still up and how many drawn
/// primitives exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    pub loading_indicators: usize,
    pub visual_primitives: usize,
}

impl SurfaceSnapshot {
    pub fn is_stable(&self) -> bool {
        self.loading_indicators == 0 && self.visual_primitives > 0
    }
}

/// Anything the gate can poll. Closures work directly, so callers can wrap
/// whatever DOM/canvas inspection their host environment offers.
pub trait VisualSurface {
    fn snapshot(&mut self) -> SurfaceSnapshot;
}

impl<F> VisualSurface for F
where
    F: FnMut() -> SurfaceSnapshot,
{
    fn snapshot(&mut self) -> SurfaceSnapshot {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    Ready { attempts: u32 },
    TimedOut { attempts: u32 },
}

/// Bounded best-effort wait before raster capture. Polls at a fixed interval
/// up to a maximum attempt count; exhausting the cap is not an error, the
/// caller proceeds with whatever is rendered after one extra settle delay.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessGate {
    pub interval: Duration,
    pub max_attempts: u32,
    pub settle_delay: Duration,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
            max_attempts: 20,
            settle_delay: Duration::from_millis(400),
        }
    }
}

impl ReadinessGate {
    pub async fn wait(&self, surface: &mut impl VisualSurface) -> ReadinessOutcome {
        let max_attempts = self.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            if surface.snapshot().is_stable() {
                return ReadinessOutcome::Ready { attempts: attempt };
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }
        log::debug!(
            "visual surface not stable after {} attempts; settling and proceeding",
            max_attempts
        );
        tokio::time::sleep(self.settle_delay).await;
        ReadinessOutcome::TimedOut {
            attempts: max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ReadinessGate {
        ReadinessGate {
            interval: Duration::from_millis(100),
            max_attempts: 5,
            settle_delay: Duration::from_millis(200),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn immediately_stable_surface_is_ready_first_attempt() {
        let mut surface = || SurfaceSnapshot {
            loading_indicators: 0,
            visual_primitives: 4,
        };
        let outcome = gate().wait(&mut surface).await;
        assert_eq!(outcome, ReadinessOutcome::Ready { attempts: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn surface_becoming_stable_is_detected() {
        let mut polls = 0u32;
        let mut surface = move || {
            polls += 1;
            SurfaceSnapshot {
                loading_indicators: if polls >= 3 { 0 } else { 1 },
                visual_primitives: 6,
            }
        };
        let outcome = gate().wait(&mut surface).await;
        assert_eq!(outcome, ReadinessOutcome::Ready { attempts: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn spinner_that_never_clears_times_out_after_cap() {
        let mut surface = || SurfaceSnapshot {
            loading_indicators: 2,
            visual_primitives: 6,
        };
        let started = tokio::time::Instant::now();
        let outcome = gate().wait(&mut surface).await;
        assert_eq!(outcome, ReadinessOutcome::TimedOut { attempts: 5 });
        // 4 intervals between 5 attempts, then the settle delay
        assert_eq!(started.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_surface_is_not_stable() {
        // no spinner but nothing drawn either: keep waiting
        let mut surface = || SurfaceSnapshot {
            loading_indicators: 0,
            visual_primitives: 0,
        };
        let outcome = gate().wait(&mut surface).await;
        assert_eq!(outcome, ReadinessOutcome::TimedOut { attempts: 5 });
    }
}
