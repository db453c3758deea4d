mod library;
mod play;
mod playlist;
mod url;

pub use library::{AddCommand, ListCommand, RemoveCommand};
pub use play::PlayCommand;
pub use playlist::PlaylistCommand;
pub use url::UrlCommand;

use crate::application::app::Application;
use crate::cli::Commands;
use crate::config::{AppConfig, AppPaths};
use crate::core::events::{AppEvent, UiEvent};
use crate::core::models::{RepeatMode, TrackRef};
use crate::core::traits::Acquirer;
use crate::modules::acquisition::YtDlpAcquirer;
use crate::modules::library::{LibraryStore, TrackSelector};
use crate::modules::playback::rodio_backend::RodioBackend;
use crate::modules::playback::{MediaSession, Sequencer};
use crate::modules::storage::JsonStorageBackend;
use crate::modules::ui::terminal::TerminalRenderer;
use crate::utils::URL_MARKER;
use anyhow::{Result, bail};
use std::sync::Arc;

/// Every CLI command implements this trait.
///
/// Commands own their arguments and are consumed on execution; each runs exactly once.
pub trait CliCommand {
    fn execute(self: Box<Self>, env: &Environment) -> Result<()>;
}

/// Converts a parsed [`Commands`] variant into a boxed [`CliCommand`] ready to execute.
pub fn from_cli(cmd: Commands) -> Box<dyn CliCommand> {
    match cmd {
        Commands::Add { paths, playlist } => Box::new(AddCommand { paths, playlist }),
        Commands::Remove { entry } => Box::new(RemoveCommand { entry }),
        Commands::List => Box::new(ListCommand),
        Commands::Playlist { action } => Box::new(PlaylistCommand { action }),
        Commands::Play {
            playlist,
            start,
            shuffle,
            repeat,
        } => Box::new(PlayCommand {
            playlist,
            start,
            shuffle,
            repeat,
        }),
        Commands::Url {
            url,
            playlist,
            play,
        } => Box::new(UrlCommand {
            url,
            playlist,
            play,
        }),
    }
}

/// Resolved configuration shared by all commands.
pub struct Environment {
    pub config: AppConfig,
    pub paths: AppPaths,
}

impl Environment {
    pub fn new(config: AppConfig, paths: AppPaths) -> Self {
        Self { config, paths }
    }

    pub fn open_store(&self) -> LibraryStore {
        LibraryStore::load(Box::new(JsonStorageBackend::new(
            self.paths.data_file.clone(),
        )))
    }

    pub fn acquirer(&self) -> Arc<dyn Acquirer> {
        Arc::new(YtDlpAcquirer::new(
            self.config.downloader.clone(),
            self.config.transcoder.clone(),
            self.paths.cache_dir.clone(),
        ))
    }

    pub fn renderer(&self) -> TerminalRenderer {
        TerminalRenderer::new(self.config.seek_step_secs)
    }
}

/// Modes the interactive player starts with.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerOptions {
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

/// Run the interactive player until the user quits (or, with `exit_when_idle`,
/// until no acquisition is left). `first` is queued before the loop starts.
pub fn run_player(
    env: &Environment,
    store: LibraryStore,
    options: PlayerOptions,
    first: UiEvent,
    exit_when_idle: bool,
) -> Result<Application> {
    let mut sequencer = Sequencer::new(MediaSession::new(Box::new(RodioBackend::new())));
    sequencer.set_volume(env.config.effective_volume());
    sequencer.set_shuffle(options.shuffle);
    sequencer.set_repeat(options.repeat);

    let mut app = Application::new(store, sequencer, env.acquirer())
        .with_ui_renderer(Box::new(env.renderer()));
    if exit_when_idle {
        app = app.exit_when_idle();
    }

    app.init()?;
    app.event_sender().send(AppEvent::Ui(first))?;
    let outcome = app.run();
    app.cleanup()?;
    outcome?;

    Ok(app)
}

/// Interpret a user-supplied entry: a 1-based number, a URL or a file path.
pub fn parse_entry(entry: &str) -> Result<TrackSelector> {
    let entry = entry.trim();
    if entry.is_empty() {
        bail!("Empty entry");
    }

    if let Ok(number) = entry.parse::<usize>() {
        if number == 0 {
            bail!("Track numbers start at 1");
        }
        return Ok(TrackSelector::Index(number - 1));
    }

    let track = if entry.starts_with(URL_MARKER) {
        TrackRef::from_persisted(entry)
    } else if entry.contains("://") {
        TrackRef::remote(entry)
    } else {
        TrackRef::local(entry)
    };
    Ok(TrackSelector::Identity(track))
}
