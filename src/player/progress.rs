use std::time::Duration;

/// Position bookkeeping for the bound track.
///
/// While a drag is active the shadow position follows the pointer and
/// output time updates are dropped. A debounced seek that has not reached
/// the output yet also masks time updates, so a stale report cannot undo
/// the position the user just picked.
#[derive(Debug, Clone, Default)]
pub struct TrackProgress {
    position: Duration,
    drag_position: Option<Duration>,
    pending_seek: Option<Duration>,
    duration: Option<Duration>,
}

impl TrackProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn drag_position(&self) -> Option<Duration> {
        self.drag_position
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_position.is_some()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn pending_seek(&self) -> Option<Duration> {
        self.pending_seek
    }

    /// What a progress bar should show.
    pub fn displayed(&self) -> Duration {
        self.drag_position.unwrap_or(self.position)
    }

    pub fn set_duration(&mut self, duration: Option<Duration>) {
        self.duration = duration.filter(|d| !d.is_zero());
    }

    pub fn clamp(&self, position: Duration) -> Duration {
        match self.duration {
            Some(total) => position.min(total),
            None => position,
        }
    }

    /// Mirrors an output time report. Returns whether it was applied.
    pub fn mirror(&mut self, position: Duration) -> bool {
        if self.is_dragging() || self.pending_seek.is_some() {
            return false;
        }
        self.position = position;
        true
    }

    pub fn begin_drag(&mut self) {
        if self.drag_position.is_none() {
            self.drag_position = Some(self.position);
        }
    }

    /// Updates the shadow position. Returns `false` when no drag is active.
    pub fn update_drag(&mut self, position: Duration) -> bool {
        match self.drag_position.as_mut() {
            Some(shadow) => {
                *shadow = position;
                true
            }
            None => false,
        }
    }

    /// Ends the drag and commits the shadow position.
    pub fn end_drag(&mut self) -> Option<Duration> {
        let committed = self.drag_position.take()?;
        self.position = committed;
        self.pending_seek = None;
        Some(committed)
    }

    /// Commits a position that will reach the output after a delay.
    pub fn commit_deferred(&mut self, position: Duration) {
        self.position = position;
        self.pending_seek = Some(position);
    }

    /// Clears the pending marker once the output got `position`.
    pub fn seek_applied(&mut self, position: Duration) {
        if self.pending_seek == Some(position) {
            self.pending_seek = None;
        }
    }

    /// Back to zero. An active drag is abandoned so its release cannot
    /// move the track again.
    pub fn rewind(&mut self) {
        self.position = Duration::ZERO;
        self.drag_position = None;
        self.pending_seek = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn drag_shadows_committed_position() {
        let mut progress = TrackProgress::new();
        progress.mirror(secs(10));

        progress.begin_drag();
        assert!(progress.update_drag(secs(40)));
        assert!(progress.update_drag(secs(55)));
        assert!(!progress.mirror(secs(11)));

        assert_eq!(progress.position(), secs(10));
        assert_eq!(progress.displayed(), secs(55));

        assert_eq!(progress.end_drag(), Some(secs(55)));
        assert_eq!(progress.position(), secs(55));
        assert!(!progress.is_dragging());
    }

    #[test]
    fn end_drag_without_start_is_noop() {
        let mut progress = TrackProgress::new();
        progress.mirror(secs(3));
        assert_eq!(progress.end_drag(), None);
        assert_eq!(progress.position(), secs(3));
    }

    #[test]
    fn pending_seek_masks_time_updates_until_applied() {
        let mut progress = TrackProgress::new();
        progress.commit_deferred(secs(90));
        assert!(!progress.mirror(secs(2)));
        assert_eq!(progress.position(), secs(90));

        progress.seek_applied(secs(90));
        assert!(progress.mirror(secs(91)));
        assert_eq!(progress.position(), secs(91));
    }

    #[test]
    fn clamp_respects_known_duration() {
        let mut progress = TrackProgress::new();
        assert_eq!(progress.clamp(secs(500)), secs(500));

        progress.set_duration(Some(secs(200)));
        assert_eq!(progress.clamp(secs(500)), secs(200));

        progress.set_duration(Some(Duration::ZERO));
        assert_eq!(progress.duration(), None);
    }

    #[test]
    fn rewind_abandons_drag() {
        let mut progress = TrackProgress::new();
        progress.mirror(secs(30));
        progress.begin_drag();
        progress.update_drag(secs(120));

        progress.rewind();

        assert_eq!(progress.position(), Duration::ZERO);
        assert!(!progress.is_dragging());
        assert_eq!(progress.end_drag(), None);
    }
}
