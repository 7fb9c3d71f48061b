//! Processing stages, from raw text to band RMS, plus export and sample data.
pub mod bands;
pub mod classifier;
pub mod diagnostics;
pub mod export;
pub mod parser;
pub mod rss;
pub mod sample;
pub mod scale;
