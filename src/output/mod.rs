//! Output module for presenting the video library
//!
//! This module handles:
//! - Computing and printing library statistics
//! - Rendering video listings and channel lists

mod listing;
pub mod stats;

pub use listing::{format_duration, format_video, print_channels, print_videos};
pub use stats::{format_statistics, load_statistics, print_statistics, LibraryStatistics};
