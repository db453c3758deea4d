use crate::application::handlers::library_handler::LibraryHandler;
use crate::application::handlers::playback_handler::PlaybackHandler;
use crate::application::handlers::ui_handler::UiHandler;
use crate::application::handlers::HandlerContext;
use crate::application::state::PlayerView;
use crate::core::events::*;
use crate::core::traits::*;
use crate::modules::acquisition::AcquisitionRegistry;
use crate::modules::library::LibraryStore;
use crate::modules::playback::Sequencer;
use anyhow::Result;
use crossbeam_channel::unbounded;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const FRAME: Duration = Duration::from_millis(16);

/// Main application orchestrator.
///
/// Owns the library, the sequencer and the acquisition registry; every
/// change to them happens here, on the thread that calls [`run`].
///
/// [`run`]: Application::run
pub struct Application {
    event_tx: EventSender,
    event_rx: EventReceiver,

    store: LibraryStore,
    sequencer: Sequencer,
    acquisitions: AcquisitionRegistry,
    acquirer: Arc<dyn Acquirer>,

    view: PlayerView,
    ui_renderer: Option<Box<dyn UiRenderer>>,

    // Event handlers
    playback_handler: PlaybackHandler,
    library_handler: LibraryHandler,
    ui_handler: UiHandler,

    running: bool,
    exit_when_idle: bool,
}

impl Application {
    pub fn new(store: LibraryStore, sequencer: Sequencer, acquirer: Arc<dyn Acquirer>) -> Self {
        // Unbounded: handlers post follow-up events to their own queue.
        let (tx, rx) = unbounded();

        Self {
            event_tx: tx,
            event_rx: rx,
            store,
            sequencer,
            acquisitions: AcquisitionRegistry::new(),
            acquirer,
            view: PlayerView::default(),
            ui_renderer: None,
            playback_handler: PlaybackHandler,
            library_handler: LibraryHandler,
            ui_handler: UiHandler,
            running: false,
            exit_when_idle: false,
        }
    }

    /// Set the UI renderer
    pub fn with_ui_renderer(mut self, renderer: Box<dyn UiRenderer>) -> Self {
        self.ui_renderer = Some(renderer);
        self
    }

    /// Leave the loop as soon as no acquisition is pending.
    pub fn exit_when_idle(mut self) -> Self {
        self.exit_when_idle = true;
        self
    }

    /// Get event sender (for modules to emit events)
    pub fn event_sender(&self) -> EventSender {
        self.event_tx.clone()
    }

    pub fn view(&self) -> &PlayerView {
        &self.view
    }

    pub fn store(&self) -> &LibraryStore {
        &self.store
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Initialize the application
    pub fn init(&mut self) -> Result<()> {
        if let Some(ui) = &mut self.ui_renderer {
            ui.init()?;
        }
        self.view.sync(&self.sequencer, &self.acquisitions);
        Ok(())
    }

    /// Run the main event loop
    pub fn run(&mut self) -> Result<()> {
        self.running = true;
        info!("event loop started");

        while self.running {
            self.process_events()?;

            if self.exit_when_idle && self.acquisitions.is_empty() {
                debug!("no pending acquisitions, leaving event loop");
                self.process_events()?;
                self.running = false;
                break;
            }

            // Poll UI for input
            if let Some(ui) = &mut self.ui_renderer {
                for event in ui.poll_input()? {
                    self.event_tx.send(AppEvent::Ui(event))?;
                }
            }

            self.poll_media()?;

            self.view.sync(&self.sequencer, &self.acquisitions);
            if let Some(ui) = &mut self.ui_renderer {
                ui.render(&self.view)?;
            }

            // Small sleep to prevent CPU spinning
            std::thread::sleep(FRAME);
        }

        info!("event loop stopped");
        Ok(())
    }

    /// Process events once without entering the main loop (useful for one-off commands)
    pub fn run_once(&mut self) -> Result<()> {
        self.poll_media()?;
        self.process_events()?;
        self.view.sync(&self.sequencer, &self.acquisitions);
        Ok(())
    }

    /// Forward backend signals into the event queue, tagged with their session.
    fn poll_media(&mut self) -> Result<()> {
        for (session, signal) in self.sequencer.session_mut().poll() {
            self.event_tx.send(AppEvent::Media { session, signal })?;
        }
        Ok(())
    }

    /// Process all pending events in the queue
    fn process_events(&mut self) -> Result<()> {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event)?;
        }
        Ok(())
    }

    /// Handle a single event
    fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        self.view.apply_event(&event);

        let mut ctx = HandlerContext {
            event_tx: &self.event_tx,
            store: &mut self.store,
            sequencer: &mut self.sequencer,
            acquisitions: &mut self.acquisitions,
            acquirer: &self.acquirer,
        };

        match &event {
            AppEvent::Media { session, signal } => {
                self.playback_handler.handle(*session, signal, &mut ctx)?
            }
            AppEvent::Acquisition(ae) => self.library_handler.handle(ae, &mut ctx)?,
            AppEvent::Ui(ue) => self.ui_handler.handle(ue, &mut ctx)?,
            AppEvent::Shutdown => {
                self.running = false;
            }
        }

        Ok(())
    }

    /// Cleanup resources
    pub fn cleanup(&mut self) -> Result<()> {
        self.acquisitions.dismiss_all();
        self.sequencer.session_mut().dispose();

        if let Some(ui) = &mut self.ui_renderer {
            ui.cleanup()?;
        }

        Ok(())
    }
}
