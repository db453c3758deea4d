use crate::core::error::AcquisitionError;
use crate::core::events::{AcquisitionEvent, AppEvent, EventSender};
use crate::core::traits::Acquirer;
use crate::modules::acquisition::{AcquisitionProgress, AcquisitionTicket};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Run one acquisition on its own thread. The thread only sends messages.
pub fn spawn_acquisition(
    acquirer: Arc<dyn Acquirer>,
    ticket: AcquisitionTicket,
    url: String,
    cancel: Arc<AtomicBool>,
    event_tx: EventSender,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("acquire-{ticket}"))
        .spawn(move || {
            info!(%ticket, %url, "acquisition started");

            let progress_tx = event_tx.clone();
            let mut report = |progress: AcquisitionProgress| {
                let _ = progress_tx.send(AppEvent::Acquisition(AcquisitionEvent::Progress {
                    ticket,
                    progress,
                }));
            };

            let event = match acquirer.acquire(&url, &cancel, &mut report) {
                Ok(location) => {
                    info!(%ticket, location = %location.display(), "acquisition finished");
                    AcquisitionEvent::Completed {
                        ticket,
                        url,
                        location,
                    }
                }
                Err(AcquisitionError::Cancelled) => {
                    debug!(%ticket, "acquisition cancelled");
                    AcquisitionEvent::Failed {
                        ticket,
                        url,
                        message: AcquisitionError::Cancelled.to_string(),
                    }
                }
                Err(e) => {
                    warn!(%ticket, "acquisition failed: {e}");
                    AcquisitionEvent::Failed {
                        ticket,
                        url,
                        message: e.to_string(),
                    }
                }
            };

            // The receiver is gone only during shutdown.
            let _ = event_tx.send(AppEvent::Acquisition(event));
        })
}


#[cfg(test)]
mod tests {
    use super::testing::StubAcquirer;
    use super::*;
    use crate::modules::acquisition::{AcquisitionContext, AcquisitionRegistry};
    use crossbeam_channel::unbounded;
    use std::path::PathBuf;

    fn drain(rx: &crossbeam_channel::Receiver<AppEvent>) -> Vec<AcquisitionEvent> {
        rx.iter()
            .filter_map(|e| match e {
                AppEvent::Acquisition(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn worker_reports_progress_then_completion() {
        let (tx, rx) = unbounded();
        let mut registry = AcquisitionRegistry::new();
        let (ticket, cancel) = registry.register("https://u", AcquisitionContext::Library, false);

        let acquirer = Arc::new(StubAcquirer::succeeding("/cache/u.wav"));
        let handle = spawn_acquisition(acquirer, ticket, "https://u".into(), cancel, tx).unwrap();
        handle.join().unwrap();

        let events = drain(&rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], AcquisitionEvent::Progress { progress, .. } if progress.percent == 50));
        match &events[1] {
            AcquisitionEvent::Completed { ticket: t, url, location } => {
                assert_eq!(*t, ticket);
                assert_eq!(url, "https://u");
                assert_eq!(location, &PathBuf::from("/cache/u.wav"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn worker_reports_failure() {
        let (tx, rx) = unbounded();
        let mut registry = AcquisitionRegistry::new();
        let (ticket, cancel) = registry.register("https://u", AcquisitionContext::Library, false);

        let acquirer = Arc::new(StubAcquirer::failing(AcquisitionError::Failed {
            tool: "yt-dlp".into(),
            status: "exit status: 1".into(),
            detail: "ERROR: unavailable".into(),
        }));
        spawn_acquisition(acquirer, ticket, "https://u".into(), cancel, tx)
            .unwrap()
            .join()
            .unwrap();

        let events = drain(&rx);
        assert!(matches!(events.last(), Some(AcquisitionEvent::Failed { message, .. }) if message.contains("unavailable")));
    }

    #[test]
    fn cancelled_before_start_reports_cancelled() {
        let (tx, rx) = unbounded();
        let mut registry = AcquisitionRegistry::new();
        let (ticket, cancel) = registry.register("https://u", AcquisitionContext::Library, false);
        registry.dismiss(ticket);

        let acquirer = Arc::new(StubAcquirer::succeeding("/cache/u.wav"));
        spawn_acquisition(acquirer, ticket, "https://u".into(), cancel, tx)
            .unwrap()
            .join()
            .unwrap();

        let events = drain(&rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], AcquisitionEvent::Failed { .. }));
    }
}
