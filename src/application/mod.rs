pub mod app;
pub mod handlers;
pub mod state;

pub use app::Application;
pub use state::PlayerView;
