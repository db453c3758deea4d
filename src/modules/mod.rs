pub mod acquisition;
pub mod library;
pub mod playback;
pub mod storage;
pub mod ui;
