use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TrackerStatus {
    #[default]
    Stopped,
    Started,
}

/// Progress tracker backing one open detail screen: `stopped → started →
/// stopped`. Start/stop cycles fold real elapsed wall-clock time into
/// `pending_ms`, which stays UI state until the screen's save flow appends
/// it as a persisted session. Abandoning the screen without stopping
/// records nothing.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    pub status: TrackerStatus,
    pub project_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    /// Duration accumulated from earlier start/stop cycles on this screen,
    /// not yet persisted as a session.
    pub pending_ms: u64,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a work interval. Returns false when one is already running.
    /// Pending time carried for a different project is dropped; the save
    /// flow persists it before another detail screen can start tracking.
    pub fn start(&mut self, project_id: String, now: DateTime<Utc>) -> bool {
        if self.status == TrackerStatus::Started {
            return false;
        }

        if self.project_id.as_deref() != Some(project_id.as_str()) {
            self.pending_ms = 0;
        }

        self.status = TrackerStatus::Started;
        self.project_id = Some(project_id);
        self.started_at = Some(now);
        true
    }

    /// End the running interval, folding `now − started_at` into the
    /// pending duration. An end before the start counts as zero.
    pub fn stop(&mut self, now: DateTime<Utc>) {
        if self.status != TrackerStatus::Started {
            return;
        }

        if let Some(started_at) = self.started_at.take() {
            let elapsed = (now - started_at).num_milliseconds().max(0) as u64;
            self.pending_ms = self.pending_ms.saturating_add(elapsed);
        }
        self.status = TrackerStatus::Stopped;
    }

    /// Elapsed milliseconds of the currently running interval, zero when
    /// stopped.
    pub fn live_ms(&self, now: DateTime<Utc>) -> u64 {
        match (self.status, self.started_at) {
            (TrackerStatus::Started, Some(started_at)) => {
                (now - started_at).num_milliseconds().max(0) as u64
            }
            _ => 0,
        }
    }

    /// Pending plus running milliseconds for a project, when this tracker
    /// is attached to it. This is the live addend the aggregation engine
    /// accepts on top of persisted sessions.
    pub fn live_for(&self, project_id: &str, now: DateTime<Utc>) -> Option<u64> {
        if self.project_id.as_deref() == Some(project_id) {
            Some(self.pending_ms.saturating_add(self.live_ms(now)))
        } else {
            None
        }
    }

    /// Drain the pending duration for a project on save/dismiss. A still
    /// running interval is forced to stop first so it is never lost. The
    /// tracker resets afterwards; tracking state for any other project is
    /// left alone.
    pub fn finalize_for(&mut self, project_id: &str, now: DateTime<Utc>) -> u64 {
        if self.project_id.as_deref() != Some(project_id) {
            return 0;
        }

        self.stop(now);
        let pending = self.pending_ms;
        *self = Self::default();
        pending
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn stop_folds_real_elapsed_time() {
        let now = Utc::now();
        let mut tracker = TrackerState::new();

        assert!(tracker.start("swift".into(), now));
        tracker.stop(now + Duration::minutes(30));

        assert_eq!(tracker.status, TrackerStatus::Stopped);
        assert_eq!(tracker.pending_ms, 30 * 60 * 1000);
    }

    #[test]
    fn start_while_started_is_rejected() {
        let now = Utc::now();
        let mut tracker = TrackerState::new();

        assert!(tracker.start("swift".into(), now));
        assert!(!tracker.start("swift".into(), now + Duration::minutes(5)));
        assert_eq!(tracker.started_at, Some(now));
    }

    #[test]
    fn stop_without_start_does_nothing() {
        let mut tracker = TrackerState::new();
        tracker.stop(Utc::now());
        assert_eq!(tracker.pending_ms, 0);
    }

    #[test]
    fn clock_going_backwards_clamps_to_zero() {
        let now = Utc::now();
        let mut tracker = TrackerState::new();

        tracker.start("swift".into(), now);
        tracker.stop(now - Duration::minutes(5));

        assert_eq!(tracker.pending_ms, 0);
    }

    #[test]
    fn cycles_accumulate_into_pending() {
        let now = Utc::now();
        let mut tracker = TrackerState::new();

        tracker.start("swift".into(), now);
        tracker.stop(now + Duration::minutes(10));
        tracker.start("swift".into(), now + Duration::minutes(20));
        tracker.stop(now + Duration::minutes(30));

        assert_eq!(tracker.pending_ms, 20 * 60 * 1000);
    }

    #[test]
    fn live_addend_combines_pending_and_running() {
        let now = Utc::now();
        let mut tracker = TrackerState::new();

        tracker.start("swift".into(), now);
        tracker.stop(now + Duration::minutes(10));
        tracker.start("swift".into(), now + Duration::minutes(20));

        let live = tracker.live_for("swift", now + Duration::minutes(25));
        assert_eq!(live, Some(15 * 60 * 1000));
        assert_eq!(tracker.live_for("python", now), None);
    }

    #[test]
    fn finalize_forces_a_running_interval_to_stop() {
        let now = Utc::now();
        let mut tracker = TrackerState::new();

        tracker.start("swift".into(), now);
        let pending = tracker.finalize_for("swift", now + Duration::hours(1));

        assert_eq!(pending, 60 * 60 * 1000);
        assert_eq!(tracker.status, TrackerStatus::Stopped);
        assert_eq!(tracker.project_id, None);
        assert_eq!(tracker.pending_ms, 0);
    }

    #[test]
    fn finalize_for_another_project_leaves_state_alone() {
        let now = Utc::now();
        let mut tracker = TrackerState::new();

        tracker.start("swift".into(), now);
        assert_eq!(tracker.finalize_for("python", now + Duration::hours(1)), 0);
        assert_eq!(tracker.status, TrackerStatus::Started);
    }

    #[test]
    fn switching_projects_drops_stale_pending() {
        let now = Utc::now();
        let mut tracker = TrackerState::new();

        tracker.start("swift".into(), now);
        tracker.stop(now + Duration::minutes(10));

        tracker.start("python".into(), now + Duration::hours(1));
        assert_eq!(tracker.pending_ms, 0);
    }
}
