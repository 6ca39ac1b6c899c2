pub mod config;
pub mod editor;
pub mod render;
pub mod theme;
