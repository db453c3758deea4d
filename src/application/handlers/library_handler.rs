use crate::application::handlers::HandlerContext;
use crate::core::events::{AcquisitionEvent, PlaySource};
use crate::core::models::TrackRef;
use crate::modules::acquisition::{AcquisitionContext, PendingAcquisition};
use crate::modules::library::LibraryStore;
use crate::modules::playback::PlaybackState;
use crate::utils::remove_quietly;
use anyhow::Result;
use std::path::Path;
use tracing::{debug, info};

/// Handles [`AcquisitionEvent`]s: progress bookkeeping and injecting
/// acquired tracks into the library.
///
/// Results are applied only if the context captured at request time is still
/// valid. A dropped result's file is deleted, since nothing refers to it.
pub struct LibraryHandler;

impl LibraryHandler {
    pub fn handle(&self, event: &AcquisitionEvent, ctx: &mut HandlerContext) -> Result<()> {
        match event {
            AcquisitionEvent::Progress { ticket, progress } => {
                if !ctx.acquisitions.update_progress(*ticket, progress.clone()) {
                    debug!(%ticket, "progress for unknown acquisition ignored");
                }
                Ok(())
            }

            AcquisitionEvent::Failed { ticket, url, message } => {
                if ctx.acquisitions.finish(*ticket).is_none() {
                    debug!(%ticket, %url, "late failure ignored");
                    return Ok(());
                }
                ctx.report_error(format!("Failed to download/convert audio: {message}"))
            }

            AcquisitionEvent::Completed {
                ticket,
                url,
                location,
            } => {
                let Some(pending) = ctx.acquisitions.finish(*ticket) else {
                    debug!(%ticket, %url, "late completion ignored");
                    remove_quietly(location);
                    return Ok(());
                };
                self.apply_completion(pending, location, ctx)
            }
        }
    }

    fn apply_completion(
        &self,
        pending: PendingAcquisition,
        location: &Path,
        ctx: &mut HandlerContext,
    ) -> Result<()> {
        let track = TrackRef::remote(&pending.url).with_resolved(location);

        match pending.context {
            AcquisitionContext::Library => {
                ctx.store.add_tracks([track.clone()]);
                Self::attach(&track, location, ctx);
                ctx.notify(format!("Added {}", track.display_name()))?;

                if pending.play {
                    return match LibraryStore::position_of(ctx.store.tracks(), &track) {
                        Some(index) => ctx.play_list(&PlaySource::Library, index),
                        None => Ok(()),
                    };
                }
                Ok(())
            }

            AcquisitionContext::Playlist { name, epoch } => {
                if ctx.store.playlist_epoch(&name) != Some(epoch) {
                    info!(playlist = %name, "playlist changed during download, result dropped");
                    remove_quietly(location);
                    return Ok(());
                }
                ctx.store.add_tracks_to_playlist(&name, [track.clone()])?;
                Self::attach(&track, location, ctx);
                ctx.notify(format!("Added {} to {name}", track.display_name()))?;

                if pending.play {
                    let index = ctx
                        .store
                        .playlist(&name)
                        .and_then(|list| LibraryStore::position_of(list, &track));
                    if let Some(index) = index {
                        return ctx.play_list(&PlaySource::Playlist(name), index);
                    }
                }
                Ok(())
            }

            AcquisitionContext::Queue {
                generation,
                identity,
            } => {
                if ctx.sequencer.queue_generation() != generation {
                    info!(url = %pending.url, "queue replaced during download, result dropped");
                    remove_quietly(location);
                    return Ok(());
                }
                Self::attach(&identity, location, ctx);

                let still_current = ctx.sequencer.current_track() == Some(&identity);
                let waiting = ctx.sequencer.state() == PlaybackState::Ready
                    && ctx.sequencer.session().active_id().is_none();
                if still_current && waiting {
                    let result = ctx.sequencer.retry_current();
                    return ctx.report_playback(result);
                }
                Ok(())
            }
        }
    }

    fn attach(track: &TrackRef, location: &Path, ctx: &mut HandlerContext) {
        ctx.store.attach_resolved(track, location);
        ctx.sequencer.attach_resolved(track, location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::testing::Harness;
    use crate::core::error::AcquisitionError;
    use crate::modules::acquisition::AcquisitionProgress;
    use crate::modules::acquisition::worker::testing::StubAcquirer;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    const URL: &str = "https://youtu.be/x";

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn harness() -> Harness {
        Harness::new(Arc::new(StubAcquirer::succeeding("/cache/x.wav")))
    }

    fn completed(h: &mut Harness, context: AcquisitionContext, play: bool) -> AcquisitionEvent {
        let (ticket, _) = h.acquisitions.register(URL, context, play);
        AcquisitionEvent::Completed {
            ticket,
            url: URL.to_string(),
            location: PathBuf::from("/cache/x.wav"),
        }
    }

    /// A real file standing in for a worker's output.
    fn produced(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("x.wav");
        std::fs::write(&path, b"RIFF").unwrap();
        path
    }

    fn completed_at(
        h: &mut Harness,
        context: AcquisitionContext,
        location: &Path,
    ) -> AcquisitionEvent {
        let (ticket, _) = h.acquisitions.register(URL, context, false);
        AcquisitionEvent::Completed {
            ticket,
            url: URL.to_string(),
            location: location.to_path_buf(),
        }
    }

    fn remote() -> TrackRef {
        TrackRef::remote(URL)
    }

    // ── Library / playlist targets ───────────────────────────────────────────

    #[test]
    fn completion_adds_resolved_track_to_library() {
        let mut h = harness();
        let event = completed(&mut h, AcquisitionContext::Library, false);
        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();

        assert_eq!(h.store.tracks(), &[remote()]);
        assert_eq!(
            h.store.tracks()[0].resolved_location(),
            Some(Path::new("/cache/x.wav"))
        );
        assert!(h.acquisitions.is_empty());
        assert_eq!(h.sequencer.state(), PlaybackState::Idle);
    }

    #[test]
    fn completion_with_play_starts_the_library_at_the_track() {
        let mut h = harness();
        h.store.add_tracks([TrackRef::from_persisted("/music/a.mp3")]);
        let event = completed(&mut h, AcquisitionContext::Library, true);
        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();

        assert_eq!(h.sequencer.current_index(), Some(1));
        assert_eq!(
            h.backend.script.lock().unwrap().opened().last(),
            Some(&PathBuf::from("/cache/x.wav"))
        );
    }

    #[test]
    fn completion_for_live_playlist_adds_to_it() {
        let mut h = harness();
        h.store.create_playlist("Gym").unwrap();
        let epoch = h.store.playlist_epoch("Gym").unwrap();

        let event = completed(
            &mut h,
            AcquisitionContext::Playlist {
                name: "Gym".into(),
                epoch,
            },
            false,
        );
        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();

        assert_eq!(h.store.playlist("Gym").unwrap(), &[remote()]);
        assert!(h.store.tracks().is_empty());
    }

    #[test]
    fn completion_for_recreated_playlist_is_ignored() {
        let mut h = harness();
        h.store.create_playlist("Gym").unwrap();
        let epoch = h.store.playlist_epoch("Gym").unwrap();
        let event = completed(
            &mut h,
            AcquisitionContext::Playlist {
                name: "Gym".into(),
                epoch,
            },
            true,
        );

        h.store.delete_playlist("Gym").unwrap();
        h.store.create_playlist("Gym").unwrap();
        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();

        assert!(h.store.playlist("Gym").unwrap().is_empty());
        assert_eq!(h.sequencer.state(), PlaybackState::Idle);
    }

    #[test]
    fn completion_for_deleted_playlist_is_ignored() {
        let mut h = harness();
        h.store.create_playlist("Gym").unwrap();
        let epoch = h.store.playlist_epoch("Gym").unwrap();
        let event = completed(
            &mut h,
            AcquisitionContext::Playlist {
                name: "Gym".into(),
                epoch,
            },
            false,
        );
        h.store.delete_playlist("Gym").unwrap();

        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();
        assert!(h.store.tracks().is_empty());
        assert!(Harness::errors(&h.drain()).is_empty());
    }

    #[test]
    fn completion_after_dismiss_is_ignored() {
        let mut h = harness();
        let event = completed(&mut h, AcquisitionContext::Library, false);
        h.acquisitions.dismiss_latest();

        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();
        assert!(h.store.tracks().is_empty());
    }

    // ── Dropped results ─────────────────────────────────────────────────────

    #[test]
    fn dismissed_result_file_is_deleted() {
        let dir = TempDir::new().unwrap();
        let mut h = harness();
        let location = produced(&dir);
        let event = completed_at(&mut h, AcquisitionContext::Library, &location);
        h.acquisitions.dismiss_latest();

        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();
        assert!(!location.exists());
    }

    #[test]
    fn result_for_deleted_playlist_is_deleted() {
        let dir = TempDir::new().unwrap();
        let mut h = harness();
        h.store.create_playlist("Gym").unwrap();
        let epoch = h.store.playlist_epoch("Gym").unwrap();
        let location = produced(&dir);
        let event = completed_at(
            &mut h,
            AcquisitionContext::Playlist {
                name: "Gym".into(),
                epoch,
            },
            &location,
        );
        h.store.delete_playlist("Gym").unwrap();

        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();
        assert!(!location.exists());
    }

    #[test]
    fn result_for_replaced_queue_is_deleted() {
        let dir = TempDir::new().unwrap();
        let mut h = harness();
        let _ = h.sequencer.start(&[remote()], 0);
        let generation = h.sequencer.queue_generation();
        let location = produced(&dir);
        let event = completed_at(
            &mut h,
            AcquisitionContext::Queue {
                generation,
                identity: remote(),
            },
            &location,
        );
        h.sequencer
            .start(&[TrackRef::from_persisted("/music/a.mp3")], 0)
            .unwrap();

        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();
        assert!(!location.exists());
    }

    #[test]
    fn applied_result_file_is_kept() {
        let dir = TempDir::new().unwrap();
        let mut h = harness();
        let location = produced(&dir);
        let event = completed_at(&mut h, AcquisitionContext::Library, &location);

        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();
        assert!(location.exists());
        assert_eq!(h.store.tracks()[0].resolved_location(), Some(location.as_path()));
    }

    // ── Re-acquisition for the queue ─────────────────────────────────────────

    #[test]
    fn requeue_completion_retries_current_track() {
        let mut h = harness();
        let queue = vec![remote()];
        let _ = h.sequencer.start(&queue, 0);
        assert_eq!(h.sequencer.session().active_id(), None);

        let generation = h.sequencer.queue_generation();
        let event = completed(
            &mut h,
            AcquisitionContext::Queue {
                generation,
                identity: remote(),
            },
            false,
        );
        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();

        assert!(h.sequencer.session().active_id().is_some());
        assert_eq!(
            h.backend.script.lock().unwrap().opened(),
            vec![PathBuf::from("/cache/x.wav")]
        );
    }

    #[test]
    fn requeue_completion_for_replaced_queue_is_ignored() {
        let mut h = harness();
        let _ = h.sequencer.start(&[remote()], 0);
        let generation = h.sequencer.queue_generation();
        let event = completed(
            &mut h,
            AcquisitionContext::Queue {
                generation,
                identity: remote(),
            },
            false,
        );

        h.sequencer
            .start(&[TrackRef::from_persisted("/music/a.mp3")], 0)
            .unwrap();
        LibraryHandler.handle(&event, &mut h.ctx()).unwrap();

        assert_eq!(
            h.backend.script.lock().unwrap().opened(),
            vec![PathBuf::from("/music/a.mp3")]
        );
    }

    // ── Progress / failure ───────────────────────────────────────────────────

    #[test]
    fn progress_and_failure_are_tracked() {
        let mut h = harness();
        let (ticket, _) = h.acquisitions.register(URL, AcquisitionContext::Library, false);

        LibraryHandler
            .handle(
                &AcquisitionEvent::Progress {
                    ticket,
                    progress: AcquisitionProgress::new(20, "[download] 20%"),
                },
                &mut h.ctx(),
            )
            .unwrap();
        assert_eq!(h.acquisitions.latest().unwrap().1.progress.percent, 20);

        LibraryHandler
            .handle(
                &AcquisitionEvent::Failed {
                    ticket,
                    url: URL.into(),
                    message: AcquisitionError::Cancelled.to_string(),
                },
                &mut h.ctx(),
            )
            .unwrap();
        assert!(h.acquisitions.is_empty());
        assert!(h.store.tracks().is_empty());

        let errors = Harness::errors(&h.drain());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to download/convert audio"));
    }
}
