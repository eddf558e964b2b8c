//! PPTX (Office Open XML) output for generated slide decks.
//!
//! Writes decks as .pptx packages (ZIP archives of XML parts), reads them
//! back for inspection, and persists a deck with its notes transcript
//! atomically.

pub mod generator;
pub mod persist;
pub mod reader;
pub mod writer;
mod xml;

pub use generator::{GenerationReport, PresentationGenerator};
pub use persist::transcript_path;
pub use reader::PptxReader;
pub use writer::PptxWriter;
