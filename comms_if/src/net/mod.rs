//! # Network Module
//!
//! This module provides the framing used to carry [`AngleCommand`]s over a stream socket between
//! the ground station and the arm.
//!
//! Two wire formats are supported:
//! - [`WireFormat::Raw`]: [`NUM_JOINTS`] little-endian `i32` values per frame, in
//!   [`JointId::ALL`] order.
//! - [`WireFormat::Json`]: one JSON object per line keyed by joint name, for example
//!   `{"axe_0": 120, "axe_1": 200}`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    io::{self, BufRead, BufReader, Read, Write},
    str::FromStr,
};

use crate::eqpt::arm::{AngleCommand, AngleCommandError, JointId, NUM_JOINTS};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of bytes in a single raw frame.
pub const RAW_FRAME_LEN: usize = NUM_JOINTS * std::mem::size_of::<i32>();

/// Longest JSON line accepted before the frame is rejected.
pub const MAX_JSON_FRAME_LEN: usize = 256;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The encoding used for angle commands on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    Raw,
    Json,
}

/// Errors raised while decoding a single frame.
///
/// A frame error leaves the stream synchronised, so the reader can carry on with the next frame.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("Expected a {expected} byte frame, found {found} bytes")]
    WrongLength { expected: usize, found: usize },

    #[error("Frame is not valid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("JSON frame exceeds {max} bytes", max = MAX_JSON_FRAME_LEN)]
    TooLong,

    #[error("Frame is missing a joint: {0}")]
    Incomplete(AngleCommandError),
}

/// Errors raised by a [`FrameReader`].
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("The peer closed the connection")]
    Closed,

    #[error("Could not read from the stream: {0}")]
    Io(io::Error),

    #[error("Received a malformed frame: {0}")]
    Frame(FrameError),
}

/// Error returned when parsing a [`WireFormat`] from a string.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Unknown wire format \"{0}\", expected \"raw\" or \"json\"")]
pub struct UnknownWireFormat(pub String);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Reads [`AngleCommand`]s from a byte stream in a given [`WireFormat`].
pub struct FrameReader<R: Read> {
    inner: BufReader<R>,

    format: WireFormat,

    line: String,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FromStr for WireFormat {
    type Err = UnknownWireFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(WireFormat::Raw),
            "json" => Ok(WireFormat::Json),
            _ => Err(UnknownWireFormat(s.to_string())),
        }
    }
}

impl ReadError {
    /// Returns `true` if the stream can no longer be used after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ReadError::Frame(_))
    }
}

impl<R: Read> FrameReader<R> {
    /// Wrap a stream in a frame reader.
    pub fn new(stream: R, format: WireFormat) -> Self {
        Self {
            inner: BufReader::new(stream),
            format,
            line: String::with_capacity(MAX_JSON_FRAME_LEN),
        }
    }

    /// Block until the next frame arrives and decode it.
    ///
    /// Blank lines in JSON streams are skipped.
    pub fn read_command(&mut self) -> Result<AngleCommand, ReadError> {
        match self.format {
            WireFormat::Raw => {
                let mut buf = [0u8; RAW_FRAME_LEN];
                self.inner.read_exact(&mut buf).map_err(|e| match e.kind() {
                    io::ErrorKind::UnexpectedEof => ReadError::Closed,
                    _ => ReadError::Io(e),
                })?;

                decode_raw(&buf).map_err(ReadError::Frame)
            }
            WireFormat::Json => loop {
                self.line.clear();

                let num_bytes = self
                    .inner
                    .by_ref()
                    .take(MAX_JSON_FRAME_LEN as u64 + 1)
                    .read_line(&mut self.line)
                    .map_err(ReadError::Io)?;

                if num_bytes == 0 {
                    return Err(ReadError::Closed);
                }

                if num_bytes > MAX_JSON_FRAME_LEN {
                    // Discard the rest of the oversized line so the next read starts on a frame
                    let mut num_discarded = num_bytes;
                    if !self.line.ends_with('\n') {
                        let mut rest = Vec::new();
                        num_discarded += self
                            .inner
                            .read_until(b'\n', &mut rest)
                            .map_err(ReadError::Io)?;
                    }
                    debug!("Discarded {} bytes of an oversized JSON frame", num_discarded);
                    return Err(ReadError::Frame(FrameError::TooLong));
                }

                if self.line.trim().is_empty() {
                    trace!("Skipping blank line");
                    continue;
                }

                return decode_json(&self.line).map_err(ReadError::Frame);
            },
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Encode a command as a raw frame.
pub fn encode_raw(cmd: &AngleCommand) -> [u8; RAW_FRAME_LEN] {
    let mut buf = [0u8; RAW_FRAME_LEN];
    LittleEndian::write_i32_into(&cmd.angles_deg(), &mut buf);
    buf
}

/// Decode a raw frame into a command.
pub fn decode_raw(frame: &[u8]) -> Result<AngleCommand, FrameError> {
    if frame.len() != RAW_FRAME_LEN {
        return Err(FrameError::WrongLength {
            expected: RAW_FRAME_LEN,
            found: frame.len(),
        });
    }

    let mut angles_deg = [0i32; NUM_JOINTS];
    LittleEndian::read_i32_into(frame, &mut angles_deg);

    Ok(AngleCommand::new(angles_deg))
}

/// Encode a command as a single line of JSON, without the trailing newline.
pub fn encode_json(cmd: &AngleCommand) -> String {
    // A map of enum keys to integers always serialises
    serde_json::to_string(&cmd.to_map()).unwrap_or_default()
}

/// Decode a JSON object keyed by joint name into a command.
///
/// Unknown joints and missing joints are both rejected.
pub fn decode_json(frame: &str) -> Result<AngleCommand, FrameError> {
    let map: BTreeMap<JointId, i32> =
        serde_json::from_str(frame.trim()).map_err(FrameError::InvalidJson)?;

    AngleCommand::from_map(&map).map_err(FrameError::Incomplete)
}

/// Write a command to the stream in the given format.
pub fn write_command<W: Write>(
    stream: &mut W,
    format: WireFormat,
    cmd: &AngleCommand,
) -> io::Result<()> {
    match format {
        WireFormat::Raw => stream.write_all(&encode_raw(cmd))?,
        WireFormat::Json => {
            stream.write_all(encode_json(cmd).as_bytes())?;
            stream.write_all(b"\n")?;
        }
    }

    stream.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn raw_frame_is_little_endian_i32() {
        let frame = encode_raw(&AngleCommand::new([120, -1]));
        assert_eq!(frame, [120, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(decode_raw(&frame).unwrap(), AngleCommand::new([120, -1]));
    }

    #[test]
    fn raw_frame_wrong_length() {
        match decode_raw(&[1, 2, 3]) {
            Err(FrameError::WrongLength { expected, found }) => {
                assert_eq!(expected, RAW_FRAME_LEN);
                assert_eq!(found, 3);
            }
            r => panic!("Unexpected result {:?}", r),
        }
    }

    #[test]
    fn json_frame_by_joint_name() {
        let cmd = decode_json("{\"axe_1\": 200, \"axe_0\": 120}\n").unwrap();
        assert_eq!(cmd, AngleCommand::new([120, 200]));
        assert_eq!(encode_json(&cmd), "{\"axe_0\":120,\"axe_1\":200}");
    }

    #[test]
    fn json_frame_rejects_bad_payloads() {
        assert!(matches!(
            decode_json("{\"axe_0\": 120}"),
            Err(FrameError::Incomplete(AngleCommandError::MissingJoint(JointId::Axe1)))
        ));
        assert!(matches!(
            decode_json("{\"axe_0\": 1, \"axe_1\": 2, \"gripper\": 3}"),
            Err(FrameError::InvalidJson(_))
        ));
        assert!(matches!(
            decode_json("{\"axe_0\": 1.5, \"axe_1\": 2}"),
            Err(FrameError::InvalidJson(_))
        ));
        assert!(matches!(decode_json("axe_0=1"), Err(FrameError::InvalidJson(_))));
    }

    #[test]
    fn wire_format_from_str() {
        assert_eq!("raw".parse::<WireFormat>(), Ok(WireFormat::Raw));
        assert_eq!("JSON".parse::<WireFormat>(), Ok(WireFormat::Json));
        assert_eq!(
            "xml".parse::<WireFormat>(),
            Err(UnknownWireFormat("xml".into()))
        );
    }

    #[test]
    fn reader_raw_stream() {
        let mut bytes = Vec::new();
        write_command(&mut bytes, WireFormat::Raw, &AngleCommand::new([1, 2])).unwrap();
        write_command(&mut bytes, WireFormat::Raw, &AngleCommand::new([3, 4])).unwrap();
        // Trailing partial frame
        bytes.extend_from_slice(&[5, 0]);

        let mut reader = FrameReader::new(Cursor::new(bytes), WireFormat::Raw);
        assert_eq!(reader.read_command().unwrap(), AngleCommand::new([1, 2]));
        assert_eq!(reader.read_command().unwrap(), AngleCommand::new([3, 4]));
        assert!(matches!(reader.read_command(), Err(ReadError::Closed)));
    }

    #[test]
    fn reader_json_stream_recovers_after_bad_frame() {
        let text = "{\"axe_0\": 10, \"axe_1\": 20}\n\nnot json\n{\"axe_0\": 30, \"axe_1\": 40}\n";
        let mut reader = FrameReader::new(Cursor::new(text), WireFormat::Json);

        assert_eq!(reader.read_command().unwrap(), AngleCommand::new([10, 20]));

        let err = reader.read_command().unwrap_err();
        assert!(matches!(err, ReadError::Frame(FrameError::InvalidJson(_))));
        assert!(!err.is_fatal());

        assert_eq!(reader.read_command().unwrap(), AngleCommand::new([30, 40]));

        let err = reader.read_command().unwrap_err();
        assert!(matches!(err, ReadError::Closed));
        assert!(err.is_fatal());
    }

    #[test]
    fn reader_json_rejects_oversized_line() {
        let mut text = format!("{{\"axe_0\": 1, \"axe_1\": 2{}}}\n", " ".repeat(MAX_JSON_FRAME_LEN));
        text.push_str("{\"axe_0\": 3, \"axe_1\": 4}\n");
        let mut reader = FrameReader::new(Cursor::new(text), WireFormat::Json);

        assert!(matches!(
            reader.read_command(),
            Err(ReadError::Frame(FrameError::TooLong))
        ));
        assert_eq!(reader.read_command().unwrap(), AngleCommand::new([3, 4]));
    }
}
