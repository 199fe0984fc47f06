mod accumulator;

pub use accumulator::{ConsoleDisplay, DisplaySink, TranscriptAccumulator};
