pub mod cli;
pub mod errors;
pub mod map;

pub use cli::{ConvertOptions, EpsgOptions, PreviewOptions, run_convert, run_epsg, run_preview};
pub use errors::FrontendError;
pub use map::{MapOptions, default_map_path, render_map, write_map};
