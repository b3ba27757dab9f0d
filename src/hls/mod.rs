// HLS packaging output
//
// - Manifest: master playlist over the rendition ladder
// - Artifacts: flat upload list of everything under the output directory

pub mod artifacts;
pub mod manifest;

pub use artifacts::*;
pub use manifest::*;

/// Master playlist file name at the root of the output directory
pub const MASTER_PLAYLIST: &str = "manifest.m3u8";

/// Thumbnail subdirectory of the output directory
pub const THUMBS_DIR: &str = "thumbs";
