use std::time::Duration;

const WINDOW_LEN: usize = 120;

/// Rolling frame-time statistics over the last frames.
#[derive(Debug)]
pub struct FrameStats {
    samples_ms: [f32; WINDOW_LEN],
    head: usize,
    count: usize,
    sum_ms: f32,
    since_report: Duration,
    report_every: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSnapshot {
    pub fps: f32,
    pub avg_ms: f32,
    pub max_ms: f32,
}

impl FrameStats {
    pub fn new(report_every: Duration) -> Self {
        Self {
            samples_ms: [0.0; WINDOW_LEN],
            head: 0,
            count: 0,
            sum_ms: 0.0,
            since_report: Duration::ZERO,
            report_every,
        }
    }

    /// Records one frame. Returns a snapshot when a report is due.
    pub fn record(&mut self, frame: Duration) -> Option<StatsSnapshot> {
        let ms = frame.as_secs_f32() * 1000.0;
        if self.count == WINDOW_LEN {
            self.sum_ms -= self.samples_ms[self.head];
        } else {
            self.count += 1;
        }
        self.samples_ms[self.head] = ms;
        self.sum_ms += ms;
        self.head = (self.head + 1) % WINDOW_LEN;

        self.since_report += frame;
        if self.since_report >= self.report_every {
            self.since_report = Duration::ZERO;
            Some(self.snapshot())
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        if self.count == 0 {
            return StatsSnapshot::default();
        }
        let avg_ms = self.sum_ms / self.count as f32;
        let max_ms = self.samples_ms[..self.count]
            .iter()
            .copied()
            .fold(0.0, f32::max);
        StatsSnapshot {
            fps: if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 },
            avg_ms,
            max_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        let s = FrameStats::new(Duration::from_secs(1));
        assert_eq!(s.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn average_and_fps() {
        let mut s = FrameStats::new(Duration::from_secs(60));
        for _ in 0..10 {
            s.record(Duration::from_millis(20));
        }
        let snap = s.snapshot();
        assert!((snap.avg_ms - 20.0).abs() < 1e-3);
        assert!((snap.fps - 50.0).abs() < 1e-2);
    }

    #[test]
    fn window_drops_old_frames() {
        let mut s = FrameStats::new(Duration::from_secs(600));
        s.record(Duration::from_millis(500));
        for _ in 0..WINDOW_LEN {
            s.record(Duration::from_millis(10));
        }
        let snap = s.snapshot();
        assert!((snap.max_ms - 10.0).abs() < 1e-3);
        assert!((snap.avg_ms - 10.0).abs() < 1e-2);
    }

    #[test]
    fn reports_on_interval() {
        let mut s = FrameStats::new(Duration::from_millis(100));
        assert!(s.record(Duration::from_millis(60)).is_none());
        assert!(s.record(Duration::from_millis(60)).is_some());
        assert!(s.record(Duration::from_millis(60)).is_none());
    }
}
