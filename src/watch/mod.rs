pub mod poll;
pub mod watcher;
