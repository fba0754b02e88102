//! Append-only change-event store — binary protobuf log.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only, existing frames are never rewritten
//!   - fsync after every append call (a commit batch is one call)
//!   - Sequence strictly increasing and frames within `MAX_FRAME_LEN`
//!     (validated before anything is written)
//!   - Zero-length, oversized, truncated or undecodable frames are `InvalidData`

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::{debug, warn};

use taxonomy_engine::EventEnvelope;

use crate::error::Result;
use crate::proto_bridge::{event_to_proto, proto_to_event};
use crate::proto_types::ProtoEventEnvelope;

/// Upper bound on a single frame.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Append-only event log backed by a binary file.
#[derive(Debug)]
pub struct EventStore {
    path: PathBuf,
    last_sequence: u64,
}

impl EventStore {
    /// Open or create an event log at the given path.
    /// Reads existing frames to determine the last sequence number.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let last_sequence = if path.exists() {
            let frames = Self::read_all_from_file(path)?;
            frames.last().map(|e| e.sequence).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            path: path.to_path_buf(),
            last_sequence,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the last sequence number in the log.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Append a single frame.
    pub fn append_frame(&mut self, frame: &ProtoEventEnvelope) -> io::Result<()> {
        self.append_frames(std::slice::from_ref(frame))
    }

    /// Append frames with one fsync at the end.
    ///
    /// Sequence continuity and frame sizes are checked for the whole batch
    /// before the file is opened, and a failed write truncates the file back
    /// to its previous length, so a rejected batch leaves the log untouched.
    pub fn append_frames(&mut self, frames: &[ProtoEventEnvelope]) -> io::Result<()> {
        let mut expected = self.last_sequence + 1;
        let mut batch = Vec::new();
        for frame in frames {
            if frame.sequence != expected {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "Sequence violation in event store: expected {}, got {}",
                        expected, frame.sequence
                    ),
                ));
            }
            let buf = frame.encode_to_vec();
            if buf.len() > MAX_FRAME_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Frame too large: {} bytes (sequence {})", buf.len(), frame.sequence),
                ));
            }
            batch.extend_from_slice(&(buf.len() as u32).to_le_bytes());
            batch.extend_from_slice(&buf);
            expected += 1;
        }
        if frames.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let start_len = file.metadata()?.len();

        if let Err(e) = file.write_all(&batch).and_then(|()| file.sync_all()) {
            warn!(error = %e, path = %self.path.display(), "append failed, truncating partial batch");
            file.set_len(start_len)?;
            file.sync_all()?;
            return Err(e);
        }

        self.last_sequence = expected - 1;
        debug!(
            frames = frames.len(),
            bytes = batch.len(),
            last_sequence = self.last_sequence,
            "events appended"
        );
        Ok(())
    }

    /// Append engine envelopes.
    pub fn append(&mut self, envelopes: &[EventEnvelope]) -> Result<()> {
        let frames: Vec<ProtoEventEnvelope> = envelopes.iter().map(event_to_proto).collect();
        self.append_frames(&frames)?;
        Ok(())
    }

    /// Load all raw frames from the log in sequence order.
    pub fn load_frames(&self) -> io::Result<Vec<ProtoEventEnvelope>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Self::read_all_from_file(&self.path)
    }

    /// Load and decode all envelopes.
    pub fn load_all(&self) -> Result<Vec<EventEnvelope>> {
        self.load_frames()?.iter().map(proto_to_event).collect()
    }

    /// Read all frames from a file, validating frame integrity.
    fn read_all_from_file(path: &Path) -> io::Result<Vec<ProtoEventEnvelope>> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut frames = Vec::new();
        let mut len_buf = [0u8; 4];

        loop {
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len == 0 || len > MAX_FRAME_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid frame length: {}", len),
                ));
            }

            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Truncated frame #{}: {}", frames.len() + 1, e),
                )
            })?;

            let frame = ProtoEventEnvelope::decode(buf.as_slice()).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Protobuf decode error: {}", e),
                )
            })?;

            frames.push(frame);
        }

        Ok(frames)
    }
}
