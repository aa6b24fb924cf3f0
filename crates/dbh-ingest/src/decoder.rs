//! Incremental gzip line decoder
//!
//! Feeds of zone-file data arrive as gzip-compressed byte streams whose
//! transport chunking is arbitrary: a line may be split across two physical
//! chunks, and a multi-byte deflate symbol may be split across chunk
//! boundaries too. [`GzipLineDecoder`] owns a persistent decompression
//! context and a pending-tail buffer so that chunk boundaries are invisible
//! in the output: for any chunking of the same stream, the emitted hostname
//! sequence is identical to decoding the whole stream at once.

use dbh_common::Hostname;
use flate2::{Decompress, FlushDecompress, Status};
use std::collections::HashSet;

use crate::error::{IngestError, Result};

const INFLATE_BUF_SIZE: usize = 64 * 1024;

/// Incremental decoder turning gzip-compressed chunks into batches of
/// normalized hostnames.
///
/// One decoder instance belongs to exactly one stream; it is not seekable
/// and cannot be reused after [`finish`](Self::finish).
pub struct GzipLineDecoder {
    inflater: Decompress,
    /// Tail of the last chunk that did not end on a line boundary
    pending: Vec<u8>,
    /// Whether the gzip stream reached its end marker
    finished: bool,
}

impl Default for GzipLineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GzipLineDecoder {
    pub fn new() -> Self {
        Self {
            inflater: Decompress::new_gzip(15),
            pending: Vec::new(),
            finished: false,
        }
    }

    /// Decode one transport chunk and return the hostnames of every line
    /// completed by it.
    ///
    /// The final (possibly incomplete) line fragment is held back until the
    /// next chunk or [`finish`](Self::finish). The returned batch is
    /// deduplicated within itself; lines that normalize to an empty token
    /// are discarded.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Hostname>> {
        let decompressed = self.inflate(chunk)?;
        self.pending.extend_from_slice(&decompressed);
        Ok(self.drain_complete_lines())
    }

    /// Signal end of stream and flush the pending tail as one final line.
    ///
    /// Returns `StreamCorrupt` if the transport ended before the gzip
    /// stream did (truncated transfer). Batches already emitted by `feed`
    /// remain valid either way.
    pub fn finish(mut self) -> Result<Vec<Hostname>> {
        if !self.finished && self.inflater.total_in() > 0 {
            return Err(IngestError::StreamCorrupt(
                "gzip stream truncated before end marker".to_string(),
            ));
        }

        let mut batch = Vec::new();
        if !self.pending.is_empty() {
            let line = String::from_utf8_lossy(&self.pending);
            if let Some(host) = Hostname::parse(&line) {
                batch.push(host);
            }
        }
        Ok(batch)
    }

    /// Run the decompression context over one input chunk.
    fn inflate(&mut self, mut input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while !input.is_empty() && !self.finished {
            let before_in = self.inflater.total_in();
            let before_out = self.inflater.total_out();

            let mut buf = vec![0u8; INFLATE_BUF_SIZE];
            let status = self
                .inflater
                .decompress(input, &mut buf, FlushDecompress::None)
                .map_err(|e| IngestError::StreamCorrupt(e.to_string()))?;

            let consumed = (self.inflater.total_in() - before_in) as usize;
            let produced = (self.inflater.total_out() - before_out) as usize;
            out.extend_from_slice(&buf[..produced]);
            input = &input[consumed..];

            match status {
                Status::StreamEnd => self.finished = true,
                // No progress means the inflater needs more input
                Status::Ok | Status::BufError if consumed == 0 && produced == 0 => break,
                Status::Ok | Status::BufError => {}
            }
        }
        Ok(out)
    }

    /// Split the pending buffer on line boundaries, holding back the final
    /// fragment, and normalize each completed line.
    fn drain_complete_lines(&mut self) -> Vec<Hostname> {
        let mut batch = Vec::new();
        let mut seen: HashSet<Hostname> = HashSet::new();

        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]);
            if let Some(host) = Hostname::parse(&text) {
                if seen.insert(host.clone()) {
                    batch.push(host);
                }
            }
        }

        batch
    }
}
