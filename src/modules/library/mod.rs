pub mod scanner;
pub mod store;

pub use store::{LibraryStore, TrackSelector};
