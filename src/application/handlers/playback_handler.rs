use crate::application::handlers::HandlerContext;
use crate::core::events::MediaSignal;
use crate::modules::playback::SessionId;
use anyhow::Result;

/// Handles signals coming back from the media session.
///
/// The sequencer decides what they mean (advance, repeat, stop); this handler
/// only forwards them and surfaces failures.
pub struct PlaybackHandler;

impl PlaybackHandler {
    pub fn handle(
        &self,
        session: SessionId,
        signal: &MediaSignal,
        ctx: &mut HandlerContext,
    ) -> Result<()> {
        let result = ctx.sequencer.on_media_signal(session, signal.clone());
        ctx.report_playback(result)
    }
}
