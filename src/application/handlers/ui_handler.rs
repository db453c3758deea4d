use crate::application::handlers::HandlerContext;
use crate::core::events::{AppEvent, UiEvent};
use crate::modules::acquisition::AcquisitionContext;
use crate::modules::library::TrackSelector;
use crate::modules::playback::playback_progress::PlaybackProgress;
use anyhow::Result;
use std::time::Duration;

/// Handles all [`UiEvent`] variants that require side effects.
///
/// Translates user intent into sequencer, store and acquisition calls.
/// `ShowMessage` and `ShowError` only change the view and are applied by
/// `PlayerView::apply_event`.
pub struct UiHandler;

impl UiHandler {
    pub fn handle(&self, event: &UiEvent, ctx: &mut HandlerContext) -> Result<()> {
        match event {
            UiEvent::PlayListRequested {
                source,
                start_index,
            } => ctx.play_list(source, *start_index),

            UiEvent::TogglePauseRequested => {
                let result = ctx.sequencer.toggle_play_pause(ctx.store.tracks());
                ctx.report_playback(result)
            }

            UiEvent::NextTrackRequested => {
                let result = ctx.sequencer.next();
                ctx.report_playback(result)
            }

            UiEvent::PreviousTrackRequested => {
                let result = ctx.sequencer.prev();
                ctx.report_playback(result)
            }

            UiEvent::ShuffleToggleRequested => {
                let enabled = ctx.sequencer.toggle_shuffle();
                ctx.notify(if enabled { "Shuffle on" } else { "Shuffle off" })
            }

            UiEvent::RepeatCycleRequested => {
                let mode = ctx.sequencer.cycle_repeat();
                ctx.notify(mode.label())
            }

            UiEvent::SeekRequested { position } => {
                ctx.sequencer.seek(*position);
                Ok(())
            }

            UiEvent::SeekByRequested { offset_secs } => {
                let session = ctx.sequencer.session();
                if session.active_id().is_none() {
                    return Ok(());
                }
                let position = session.position();
                let target = match PlaybackProgress::new(position, session.duration()) {
                    Some(progress) => progress.offset_by(*offset_secs),
                    None if *offset_secs < 0 => {
                        position.saturating_sub(Duration::from_secs(offset_secs.unsigned_abs()))
                    }
                    None => position.saturating_add(Duration::from_secs(*offset_secs as u64)),
                };
                ctx.sequencer.seek(target);
                Ok(())
            }

            UiEvent::VolumeByRequested { delta } => {
                let volume = ((ctx.sequencer.volume() + delta) * 100.0).round() / 100.0;
                ctx.sequencer.set_volume(volume.clamp(0.0, 1.0));
                let percent = (ctx.sequencer.volume() * 100.0).round() as u8;
                ctx.notify(format!("Volume {percent}%"))
            }

            UiEvent::AcquireRequested {
                url,
                playlist,
                play,
            } => {
                let url = url.trim();
                if url.is_empty() {
                    return ctx.report_error("URL is empty");
                }
                let context = match playlist {
                    None => AcquisitionContext::Library,
                    Some(name) => match ctx.store.playlist_epoch(name) {
                        Some(epoch) => AcquisitionContext::Playlist {
                            name: name.clone(),
                            epoch,
                        },
                        None => return ctx.report_error(format!("Playlist not found: {name}")),
                    },
                };
                ctx.start_acquisition(url, context, *play)
            }

            UiEvent::AcquisitionDismissed => match ctx.acquisitions.dismiss_latest() {
                Some(_) => ctx.notify("Download cancelled"),
                None => Ok(()),
            },

            UiEvent::RemoveCurrentRequested => {
                let Some(track) = ctx.sequencer.current_track().cloned() else {
                    return Ok(());
                };
                match ctx.store.remove_track(&TrackSelector::Identity(track.clone())) {
                    Ok(removed) => {
                        ctx.sequencer.remove_from_queue(&removed);
                        ctx.notify(format!("Removed {}", removed.display_name()))
                    }
                    Err(e) => ctx.report_error(e.to_string()),
                }
            }

            UiEvent::QuitRequested => {
                ctx.event_tx.send(AppEvent::Shutdown)?;
                Ok(())
            }

            UiEvent::ShowMessage { .. } | UiEvent::ShowError { .. } => Ok(()),
        }
    }
}
