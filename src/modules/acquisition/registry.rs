use crate::core::models::TrackRef;
use crate::modules::acquisition::{AcquisitionProgress, AcquisitionTicket};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Where the result of an acquisition goes, captured when it was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionContext {
    /// Add to the library
    Library,
    /// Add to a playlist, as long as it is the same playlist instance
    Playlist { name: String, epoch: u64 },
    /// Re-download for a queue entry; only valid while the queue generation
    /// is unchanged
    Queue { generation: u64, identity: TrackRef },
}

#[derive(Debug)]
pub struct PendingAcquisition {
    pub url: String,
    pub context: AcquisitionContext,
    /// Start playback once acquired
    pub play: bool,
    pub progress: AcquisitionProgress,
    cancel: Arc<AtomicBool>,
}

/// In-flight acquisitions, owned by the control thread.
///
/// A ticket that is no longer registered (dismissed, finished) makes any late
/// message for it irrelevant.
#[derive(Debug, Default)]
pub struct AcquisitionRegistry {
    pending: BTreeMap<AcquisitionTicket, PendingAcquisition>,
    next_ticket: u64,
}

impl AcquisitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request. Returns its ticket and the cancel flag the worker
    /// should watch.
    pub fn register(
        &mut self,
        url: impl Into<String>,
        context: AcquisitionContext,
        play: bool,
    ) -> (AcquisitionTicket, Arc<AtomicBool>) {
        self.next_ticket += 1;
        let ticket = AcquisitionTicket(self.next_ticket);
        let cancel = Arc::new(AtomicBool::new(false));

        self.pending.insert(
            ticket,
            PendingAcquisition {
                url: url.into(),
                context,
                play,
                progress: AcquisitionProgress::new(0, "Starting download..."),
                cancel: Arc::clone(&cancel),
            },
        );
        (ticket, cancel)
    }

    /// Returns false for unknown tickets.
    pub fn update_progress(&mut self, ticket: AcquisitionTicket, progress: AcquisitionProgress) -> bool {
        match self.pending.get_mut(&ticket) {
            Some(pending) => {
                pending.progress = progress;
                true
            }
            None => false,
        }
    }

    /// Take the entry for a finished ticket.
    pub fn finish(&mut self, ticket: AcquisitionTicket) -> Option<PendingAcquisition> {
        self.pending.remove(&ticket)
    }

    /// Flag the worker to stop and forget the ticket.
    pub fn dismiss(&mut self, ticket: AcquisitionTicket) -> bool {
        match self.pending.remove(&ticket) {
            Some(pending) => {
                pending.cancel.store(true, Ordering::Relaxed);
                debug!(%ticket, url = %pending.url, "acquisition dismissed");
                true
            }
            None => false,
        }
    }

    /// Dismiss the most recent request, if any.
    pub fn dismiss_latest(&mut self) -> Option<AcquisitionTicket> {
        let ticket = *self.pending.keys().next_back()?;
        self.dismiss(ticket);
        Some(ticket)
    }

    /// Cancel everything (shutdown).
    pub fn dismiss_all(&mut self) {
        for (_, pending) in std::mem::take(&mut self.pending) {
            pending.cancel.store(true, Ordering::Relaxed);
        }
    }

    /// A queue re-acquisition for this track is already running.
    pub fn is_requeue_pending(&self, generation: u64, identity: &TrackRef) -> bool {
        self.pending.values().any(|p| {
            matches!(&p.context, AcquisitionContext::Queue { generation: g, identity: i }
                if *g == generation && i == identity)
        })
    }

    pub fn latest(&self) -> Option<(AcquisitionTicket, &PendingAcquisition)> {
        self.pending.iter().next_back().map(|(t, p)| (*t, p))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_are_unique_and_tracked() {
        let mut registry = AcquisitionRegistry::new();
        let (a, _) = registry.register("u1", AcquisitionContext::Library, false);
        let (b, _) = registry.register("u2", AcquisitionContext::Library, true);
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.latest().map(|(t, _)| t), Some(b));

        let finished = registry.finish(a).unwrap();
        assert_eq!(finished.url, "u1");
        assert!(registry.finish(a).is_none());
    }

    #[test]
    fn dismiss_sets_cancel_flag_and_forgets() {
        let mut registry = AcquisitionRegistry::new();
        let (ticket, cancel) = registry.register("u", AcquisitionContext::Library, false);

        assert!(registry.dismiss(ticket));
        assert!(cancel.load(Ordering::Relaxed));
        assert!(registry.is_empty());
        assert!(!registry.update_progress(ticket, AcquisitionProgress::new(10, "late")));
        assert!(!registry.dismiss(ticket));
    }

    #[test]
    fn dismiss_latest_picks_newest() {
        let mut registry = AcquisitionRegistry::new();
        let (first, _) = registry.register("u1", AcquisitionContext::Library, false);
        let (second, _) = registry.register("u2", AcquisitionContext::Library, false);

        assert_eq!(registry.dismiss_latest(), Some(second));
        assert_eq!(registry.latest().map(|(t, _)| t), Some(first));
        registry.dismiss_all();
        assert_eq!(registry.dismiss_latest(), None);
    }

    #[test]
    fn progress_updates_known_ticket() {
        let mut registry = AcquisitionRegistry::new();
        let (ticket, _) = registry.register("u", AcquisitionContext::Library, false);
        assert!(registry.update_progress(ticket, AcquisitionProgress::new(40, "downloading")));
        assert_eq!(registry.latest().unwrap().1.progress.percent, 40);
    }

    #[test]
    fn requeue_lookup_matches_generation_and_identity() {
        let mut registry = AcquisitionRegistry::new();
        let track = TrackRef::remote("https://youtu.be/x");
        registry.register(
            track.identity(),
            AcquisitionContext::Queue {
                generation: 3,
                identity: track.clone(),
            },
            false,
        );
        assert!(registry.is_requeue_pending(3, &track));
        assert!(!registry.is_requeue_pending(4, &track));
        assert!(!registry.is_requeue_pending(3, &TrackRef::remote("https://youtu.be/y")));
    }
}
