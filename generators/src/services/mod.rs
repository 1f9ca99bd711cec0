//! Generator service implementations

pub mod cloud_tts;
pub mod http;
pub mod offline;
pub mod vertex_image;
pub mod vertex_text;

#[cfg(test)]
pub mod tests;

pub use cloud_tts::*;
pub use offline::*;
pub use vertex_image::*;
pub use vertex_text::*;
