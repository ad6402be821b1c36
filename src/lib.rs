pub mod bridge;
pub mod config;
pub mod error;
pub mod feed;
pub mod formatter;
pub mod item;
pub mod pipeline;
pub mod selection;
pub mod store;
pub mod trello;
pub mod tui;
