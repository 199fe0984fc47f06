use crate::transport::TranscriptFragment;

/// Write-only display surface for the running transcript.
pub trait DisplaySink: Send {
    /// Full accumulated transcript, republished after every fragment.
    fn render(&mut self, transcript: &str);

    /// Per-participant fragment, fired when the wire form carries
    /// attribution.
    fn render_attributed(&mut self, participant: &str, text: &str) {
        let _ = (participant, text);
    }
}

/// Renders incremental transcript output to stdout.
pub struct ConsoleDisplay;

impl DisplaySink for ConsoleDisplay {
    fn render(&mut self, transcript: &str) {
        print!("\r{transcript}");
        let _ = std::io::Write::flush(&mut std::io::stdout());
    }

    fn render_attributed(&mut self, participant: &str, text: &str) {
        println!("\n[{participant}] {text}");
    }
}

/// Folds inbound fragments into the session transcript.
///
/// The buffer is append-only and grows by concatenation in arrival
/// order; it is never rewritten or truncated while the session lives.
/// No deduplication and no validation: the remote service is trusted
/// to send well-formed incremental text.
pub struct TranscriptAccumulator {
    buffer: String,
    fragments: u64,
    sink: Box<dyn DisplaySink>,
}

impl TranscriptAccumulator {
    pub fn new(sink: Box<dyn DisplaySink>) -> Self {
        Self {
            buffer: String::new(),
            fragments: 0,
            sink,
        }
    }

    /// Append in arrival order and republish the whole buffer.
    pub fn on_fragment(&mut self, fragment: TranscriptFragment) {
        self.buffer.push_str(&fragment.text);
        self.fragments += 1;
        self.sink.render(&self.buffer);
        if let Some(participant) = &fragment.participant {
            self.sink.render_attributed(participant, &fragment.text);
        }
    }

    pub fn transcript(&self) -> &str {
        &self.buffer
    }

    pub fn fragment_count(&self) -> u64 {
        self.fragments
    }
}
