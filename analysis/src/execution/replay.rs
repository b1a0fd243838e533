use std::io::BufRead;

use tracing::{info, instrument, trace};

use super::Analyzer;
use crate::{
    config::ReplayConfig,
    event::{EventSink, TraceEvent, Vocabulary},
    memory::EntityTables,
    AnalysisError, ReplayError,
};

/// Offline driver feeding a text trace into an [`EventSink`], one line at a
/// time.
#[derive(Debug, Clone, Copy)]
pub struct Replayer<'v> {
    vocab: &'v Vocabulary,
    strict_addresses: bool,
}

impl Default for Replayer<'static> {
    fn default() -> Self {
        Self::new(Vocabulary::standard())
    }
}

impl<'v> Replayer<'v> {
    pub fn new(vocab: &'v Vocabulary) -> Self {
        Self {
            vocab,
            strict_addresses: false,
        }
    }

    pub fn strict_addresses(mut self, strict: bool) -> Self {
        self.strict_addresses = strict;
        self
    }

    /// Feeds every line of `input` to `sink`. Returns the number of lines
    /// read.
    pub fn feed<R, S>(&self, mut input: R, sink: &mut S) -> Result<usize, ReplayError>
    where
        R: BufRead,
        S: EventSink + ?Sized,
    {
        let mut buf = String::new();
        let mut line_number = 0;
        loop {
            buf.clear();
            let read = input.read_line(&mut buf).map_err(|e| ReplayError {
                line_number: line_number + 1,
                line: String::new(),
                error: AnalysisError::Io(e),
            })?;
            if read == 0 {
                return Ok(line_number);
            }
            line_number += 1;

            let line = buf.trim_end_matches(['\n', '\r']);
            trace!(line_number, "{line}");
            self.feed_line(line, sink).map_err(|error| ReplayError {
                line_number,
                line: line.to_string(),
                error,
            })?;
        }
    }

    /// Parses and dispatches a single line.
    pub fn feed_line<S>(&self, line: &str, sink: &mut S) -> Result<(), AnalysisError>
    where
        S: EventSink + ?Sized,
    {
        match TraceEvent::parse(line, self.vocab, self.strict_addresses)? {
            Some(event) => event.dispatch(sink, self.vocab),
            None => Ok(()),
        }
    }
}

/// Replays a whole trace through a fresh [`Analyzer`] and returns the
/// reconstructed tables.
#[instrument(level = "info", skip_all)]
pub fn replay<R: BufRead>(input: R, config: &ReplayConfig) -> Result<EntityTables, ReplayError> {
    let replayer = Replayer::default().strict_addresses(config.strict_addresses);
    let mut analyzer = Analyzer::new(config.clone());
    let lines = replayer.feed(input, &mut analyzer)?;

    let tables = analyzer.finish().map_err(|error| ReplayError {
        line_number: lines,
        line: "<end of trace>".to_string(),
        error,
    })?;
    info!(
        lines,
        functions = tables.functions.len(),
        engines = tables.engines.constructed(),
        live_values = tables.values.live_count(),
        "replayed trace"
    );
    Ok(tables)
}
