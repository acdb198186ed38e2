//! Binary input log: everything needed to re-drive a session frame by frame.
//!
//! ```text
//! header : magic u32 | version u8 | reserved [u8; 3] | sentinel frame
//! body   : frame*
//! footer : frame_count u32 | crc32 u32
//!
//! frame  : flags u8 | elapsed_ms u16 | [width u16, height u16] | buttons u8
//!          | [analog_mask u8, value u8 per mask bit]
//! ```
//!
//! All integers are little-endian. The sentinel frame has zero elapsed time
//! and always carries the initial world size. The CRC covers every byte
//! before it.

use serde::{Deserialize, Serialize};

use crate::{
    error::LogError,
    geometry::WorldSize,
    input::{dequantize, quantize, Control, InputState, CONTROL_COUNT},
};

pub const LOG_MAGIC: u32 = 0x4C54_5341; // "ASTL"
pub const LOG_VERSION: u8 = 1;
pub const LOG_PREFIX_SIZE: usize = 8;
pub const LOG_FOOTER_SIZE: usize = 8;
const SENTINEL_SIZE: usize = 8;
pub const LOG_MIN_SIZE: usize = LOG_PREFIX_SIZE + SENTINEL_SIZE + LOG_FOOTER_SIZE;

pub const FLAG_SIZE: u8 = 0x01;
pub const FLAG_ANALOG: u8 = 0x02;
const FLAG_RESERVED: u8 = !(FLAG_SIZE | FLAG_ANALOG);
const CONTROL_BITS: u8 = (1 << CONTROL_COUNT) - 1;
const ANALOG_BITS: u8 =
    (1 << Control::Left as u8) | (1 << Control::Right as u8) | (1 << Control::Thrust as u8);

/// One decoded body frame. Index 0 is the header sentinel, so body frames
/// count from 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogFrame {
    pub index: u32,
    pub elapsed_ms: u16,
    pub width: u16,
    pub height: u16,
    pub input: InputState,
}

impl LogFrame {
    pub fn elapsed_seconds(&self) -> f64 {
        f64::from(self.elapsed_ms) / 1000.0
    }

    pub fn world_size(&self) -> WorldSize {
        WorldSize::new(f64::from(self.width), f64::from(self.height))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogHeader {
    pub version: u8,
    pub width: u16,
    pub height: u16,
    pub frame_count: u32,
    pub checksum: u32,
}

/// Records frames as the live session produces them.
#[derive(Clone, Debug)]
pub struct InputLogWriter {
    bytes: Vec<u8>,
    frames: u32,
    width: u16,
    height: u16,
}

impl InputLogWriter {
    pub fn new(width: u16, height: u16) -> Result<Self, LogError> {
        if width == 0 || height == 0 {
            return Err(LogError::ZeroWorldSize {
                frame: 0,
                width,
                height,
            });
        }
        let mut bytes = Vec::with_capacity(4096);
        bytes.extend_from_slice(&LOG_MAGIC.to_le_bytes());
        bytes.push(LOG_VERSION);
        bytes.extend_from_slice(&[0; 3]);
        encode_frame(&mut bytes, 0, Some((width, height)), &InputState::new());
        Ok(Self {
            bytes,
            frames: 0,
            width,
            height,
        })
    }

    /// Appends a frame and returns it as a replay will decode it. The live
    /// session must tick with the returned frame, not the raw input.
    pub fn record(
        &mut self,
        elapsed_ms: u32,
        width: u16,
        height: u16,
        input: &InputState,
    ) -> Result<LogFrame, LogError> {
        let index = self.frames + 1;
        if width == 0 || height == 0 {
            return Err(LogError::ZeroWorldSize {
                frame: index,
                width,
                height,
            });
        }
        let elapsed_ms = elapsed_ms.clamp(1, u32::from(u16::MAX)) as u16;
        let resized = (width, height) != (self.width, self.height);
        encode_frame(&mut self.bytes, elapsed_ms, resized.then_some((width, height)), input);
        self.frames = index;
        self.width = width;
        self.height = height;
        Ok(LogFrame {
            index,
            elapsed_ms,
            width,
            height,
            input: input.quantized(),
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.frames
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.bytes.extend_from_slice(&self.frames.to_le_bytes());
        let checksum = crc32(&self.bytes);
        self.bytes.extend_from_slice(&checksum.to_le_bytes());
        self.bytes
    }
}

fn encode_frame(out: &mut Vec<u8>, elapsed_ms: u16, size: Option<(u16, u16)>, input: &InputState) {
    let mut buttons = 0u8;
    let mut mask = 0u8;
    let mut analog = [0u8; CONTROL_COUNT];
    let mut analog_len = 0;
    for control in Control::ALL {
        match quantize(input.get(control)) {
            0 => {}
            255 => buttons |= 1 << control.index(),
            value => {
                mask |= 1 << control.index();
                analog[analog_len] = value;
                analog_len += 1;
            }
        }
    }

    let mut flags = 0;
    if size.is_some() {
        flags |= FLAG_SIZE;
    }
    if mask != 0 {
        flags |= FLAG_ANALOG;
    }
    out.push(flags);
    out.extend_from_slice(&elapsed_ms.to_le_bytes());
    if let Some((width, height)) = size {
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
    }
    out.push(buttons);
    if mask != 0 {
        out.push(mask);
        out.extend_from_slice(&analog[..analog_len]);
    }
}

struct RawFrame {
    elapsed_ms: u16,
    size: Option<(u16, u16)>,
    input: InputState,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
    end: usize,
    frame: u32,
}

impl Cursor<'_> {
    fn u8(&mut self) -> Result<u8, LogError> {
        if self.offset >= self.end {
            return Err(LogError::Truncated {
                frame: self.frame,
                offset: self.offset,
            });
        }
        let byte = self.bytes[self.offset];
        self.offset += 1;
        Ok(byte)
    }

    fn u16(&mut self) -> Result<u16, LogError> {
        Ok(u16::from_le_bytes([self.u8()?, self.u8()?]))
    }

    fn frame(&mut self) -> Result<RawFrame, LogError> {
        let frame = self.frame;
        let flags = self.u8()?;
        if flags & FLAG_RESERVED != 0 {
            return Err(LogError::ReservedBits { frame, byte: flags });
        }
        let elapsed_ms = self.u16()?;
        let size = if flags & FLAG_SIZE != 0 {
            Some((self.u16()?, self.u16()?))
        } else {
            None
        };

        let buttons = self.u8()?;
        if buttons & !CONTROL_BITS != 0 {
            return Err(LogError::ReservedBits { frame, byte: buttons });
        }
        let mut input = InputState::new();
        for control in Control::ALL {
            if buttons & (1 << control.index()) != 0 {
                input.set(control, 1.0);
            }
        }

        if flags & FLAG_ANALOG != 0 {
            let mask = self.u8()?;
            if mask == 0 || mask & !ANALOG_BITS != 0 || mask & buttons != 0 {
                return Err(LogError::ReservedBits { frame, byte: mask });
            }
            for control in Control::ALL {
                if mask & (1 << control.index()) != 0 {
                    input.set(control, dequantize(self.u8()?));
                }
            }
        }

        Ok(RawFrame {
            elapsed_ms,
            size,
            input,
        })
    }
}

/// Frame-by-frame decoder. Construction validates the envelope (magic,
/// version, CRC, frame limit, sentinel); iteration yields body frames and
/// stops after the first error.
#[derive(Clone, Debug)]
pub struct LogReader<'a> {
    bytes: &'a [u8],
    header: LogHeader,
    offset: usize,
    body_end: usize,
    decoded: u32,
    width: u16,
    height: u16,
    finished: bool,
}

impl<'a> LogReader<'a> {
    pub fn new(bytes: &'a [u8], max_frames: u32) -> Result<Self, LogError> {
        if bytes.is_empty() {
            return Err(LogError::Empty);
        }
        if bytes.len() < LOG_MIN_SIZE {
            return Err(LogError::TooShort {
                actual: bytes.len(),
                min: LOG_MIN_SIZE,
            });
        }

        let magic = read_u32_le(bytes, 0);
        if magic != LOG_MAGIC {
            return Err(LogError::InvalidMagic { found: magic });
        }
        let version = bytes[4];
        if version != LOG_VERSION {
            return Err(LogError::UnsupportedVersion { found: version });
        }
        if bytes[5..8].iter().any(|byte| *byte != 0) {
            return Err(LogError::HeaderReservedNonZero);
        }

        let checksum_offset = bytes.len() - 4;
        let stored = read_u32_le(bytes, checksum_offset);
        let computed = crc32(&bytes[..checksum_offset]);
        if stored != computed {
            return Err(LogError::CrcMismatch { stored, computed });
        }

        let body_end = bytes.len() - LOG_FOOTER_SIZE;
        let frame_count = read_u32_le(bytes, body_end);
        if frame_count > max_frames {
            return Err(LogError::TooManyFrames {
                frame_count,
                max_frames,
            });
        }

        if bytes[LOG_PREFIX_SIZE] & FLAG_SIZE == 0 {
            return Err(LogError::InvalidHeader {
                reason: "sentinel frame has no world size",
            });
        }
        let mut cursor = Cursor {
            bytes,
            offset: LOG_PREFIX_SIZE,
            end: body_end,
            frame: 0,
        };
        let sentinel = cursor.frame()?;
        let (width, height) = sentinel.size.unwrap_or_default();
        if sentinel.elapsed_ms != 0 {
            return Err(LogError::InvalidHeader {
                reason: "sentinel frame has non-zero elapsed time",
            });
        }
        if width == 0 || height == 0 {
            return Err(LogError::InvalidHeader {
                reason: "sentinel frame has a zero world dimension",
            });
        }
        if !sentinel.input.is_idle() {
            return Err(LogError::InvalidHeader {
                reason: "sentinel frame carries input",
            });
        }

        Ok(Self {
            bytes,
            header: LogHeader {
                version,
                width,
                height,
                frame_count,
                checksum: stored,
            },
            offset: cursor.offset,
            body_end,
            decoded: 0,
            width,
            height,
            finished: false,
        })
    }

    pub fn header(&self) -> LogHeader {
        self.header
    }

    pub fn initial_world(&self) -> WorldSize {
        WorldSize::new(f64::from(self.header.width), f64::from(self.header.height))
    }

    pub fn frames_decoded(&self) -> u32 {
        self.decoded
    }

    fn decode_next(&mut self) -> Result<Option<LogFrame>, LogError> {
        if self.offset == self.body_end {
            if self.decoded != self.header.frame_count {
                return Err(LogError::FrameCountMismatch {
                    declared: self.header.frame_count,
                    decoded: self.decoded,
                });
            }
            return Ok(None);
        }
        if self.decoded == self.header.frame_count {
            return Err(LogError::TrailingBytes {
                frame: self.decoded,
                count: self.body_end - self.offset,
            });
        }

        let index = self.decoded + 1;
        let mut cursor = Cursor {
            bytes: self.bytes,
            offset: self.offset,
            end: self.body_end,
            frame: index,
        };
        let raw = cursor.frame()?;
        if raw.elapsed_ms == 0 {
            return Err(LogError::ZeroElapsed { frame: index });
        }
        if let Some((width, height)) = raw.size {
            if width == 0 || height == 0 {
                return Err(LogError::ZeroWorldSize {
                    frame: index,
                    width,
                    height,
                });
            }
            self.width = width;
            self.height = height;
        }

        self.offset = cursor.offset;
        self.decoded = index;
        Ok(Some(LogFrame {
            index,
            elapsed_ms: raw.elapsed_ms,
            width: self.width,
            height: self.height,
            input: raw.input,
        }))
    }
}

impl Iterator for LogReader<'_> {
    type Item = Result<LogFrame, LogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.decode_next();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result.transpose()
    }
}

/// Decodes a whole log up front.
pub fn read_log(bytes: &[u8], max_frames: u32) -> Result<(LogHeader, Vec<LogFrame>), LogError> {
    let reader = LogReader::new(bytes, max_frames)?;
    let header = reader.header();
    let frames = reader.collect::<Result<Vec<_>, _>>()?;
    Ok((header, frames))
}

#[inline]
fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;

    while i < 256 {
        let mut c = i as u32;
        let mut j = 0;

        while j < 8 {
            c = if (c & 1) != 0 {
                0xEDB8_8320u32 ^ (c >> 1)
            } else {
                c >> 1
            };
            j += 1;
        }

        table[i] = c;
        i += 1;
    }

    table
}

/// IEEE CRC-32.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;

    for byte in data {
        let idx = ((crc ^ (*byte as u32)) & 0xFF) as usize;
        crc = CRC_TABLE[idx] ^ (crc >> 8);
    }

    crc ^ 0xFFFF_FFFFu32
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u32 = 1_000;

    fn fire() -> InputState {
        InputState::new().with(Control::Fire, 1.0)
    }

    fn sample_log() -> Vec<u8> {
        let mut writer = InputLogWriter::new(800, 600).unwrap();
        writer.record(16, 800, 600, &fire()).unwrap();
        writer
            .record(17, 800, 600, &InputState::new().with(Control::Thrust, 0.4))
            .unwrap();
        writer.record(16, 1024, 768, &InputState::new()).unwrap();
        writer.finish()
    }

    /// Recomputes the trailing CRC after a deliberate edit.
    fn reseal(bytes: &mut Vec<u8>) {
        let end = bytes.len() - 4;
        let checksum = crc32(&bytes[..end]);
        bytes[end..].copy_from_slice(&checksum.to_le_bytes());
    }

    #[test]
    fn crc_matches_known_vector() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn writer_returns_what_the_reader_decodes() {
        let mut writer = InputLogWriter::new(800, 600).unwrap();
        let inputs = [
            fire(),
            InputState::new()
                .with(Control::Left, 0.61)
                .with(Control::Thrust, 1.0),
            InputState::new().with(Control::Right, 0.001),
            InputState::new().with(Control::Hyperspace, 1.0),
        ];
        let recorded: Vec<LogFrame> = inputs
            .iter()
            .map(|input| writer.record(16, 800, 600, input).unwrap())
            .collect();
        let bytes = writer.finish();

        let (header, decoded) = read_log(&bytes, MAX).unwrap();
        assert_eq!(header.frame_count, 4);
        assert_eq!((header.width, header.height), (800, 600));
        assert_eq!(decoded, recorded);
        assert_eq!(decoded[2].input.get(Control::Right), 0.0);
    }

    #[test]
    fn size_changes_carry_forward() {
        let (_, frames) = read_log(&sample_log(), MAX).unwrap();
        let sizes: Vec<(u16, u16)> = frames
            .iter()
            .map(|frame| (frame.width, frame.height))
            .collect();
        assert_eq!(sizes, vec![(800, 600), (800, 600), (1024, 768)]);
        assert_eq!(frames[1].index, 2);
        assert_eq!(frames[1].elapsed_seconds(), 0.017);
    }

    #[test]
    fn recorder_clamps_elapsed() {
        let mut writer = InputLogWriter::new(10, 10).unwrap();
        assert_eq!(writer.record(0, 10, 10, &InputState::new()).unwrap().elapsed_ms, 1);
        assert_eq!(
            writer.record(100_000, 10, 10, &InputState::new()).unwrap().elapsed_ms,
            u16::MAX
        );
    }

    #[test]
    fn empty_body_is_valid() {
        let bytes = InputLogWriter::new(320, 240).unwrap().finish();
        assert_eq!(bytes.len(), LOG_MIN_SIZE);
        let mut reader = LogReader::new(&bytes, MAX).unwrap();
        assert_eq!(reader.initial_world(), WorldSize::new(320.0, 240.0));
        assert!(reader.next().is_none());
    }

    #[test]
    fn rejects_empty_log() {
        assert_eq!(LogReader::new(&[], MAX).err(), Some(LogError::Empty));
    }

    #[test]
    fn rejects_log_too_short() {
        let bytes = [0u8; LOG_MIN_SIZE - 1];
        assert!(matches!(
            LogReader::new(&bytes, MAX),
            Err(LogError::TooShort { .. })
        ));
    }

    #[test]
    fn rejects_invalid_magic() {
        let mut bytes = sample_log();
        bytes[0] ^= 0x01;
        assert!(matches!(
            LogReader::new(&bytes, MAX),
            Err(LogError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = sample_log();
        bytes[4] = LOG_VERSION + 1;
        assert_eq!(
            LogReader::new(&bytes, MAX).err(),
            Some(LogError::UnsupportedVersion {
                found: LOG_VERSION + 1
            })
        );
    }

    #[test]
    fn rejects_nonzero_header_reserved_bytes() {
        let mut bytes = sample_log();
        bytes[6] = 1;
        assert_eq!(
            LogReader::new(&bytes, MAX).err(),
            Some(LogError::HeaderReservedNonZero)
        );
    }

    #[test]
    fn rejects_crc_mismatch() {
        let mut bytes = sample_log();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        assert!(matches!(
            LogReader::new(&bytes, MAX),
            Err(LogError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn single_byte_tampering_is_rejected() {
        let bytes = sample_log();
        for offset in LOG_PREFIX_SIZE..bytes.len() - 4 {
            let mut tampered = bytes.clone();
            tampered[offset] ^= 0x40;
            assert!(
                matches!(
                    LogReader::new(&tampered, MAX),
                    Err(LogError::CrcMismatch { .. })
                ),
                "tampering at byte {offset} went unnoticed"
            );
        }
    }

    #[test]
    fn rejects_frame_count_above_max() {
        assert_eq!(
            LogReader::new(&sample_log(), 2).err(),
            Some(LogError::TooManyFrames {
                frame_count: 3,
                max_frames: 2
            })
        );
    }

    #[test]
    fn rejects_sentinel_with_elapsed_time() {
        let mut bytes = sample_log();
        bytes[LOG_PREFIX_SIZE + 1] = 5;
        reseal(&mut bytes);
        assert!(matches!(
            LogReader::new(&bytes, MAX),
            Err(LogError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn rejects_sentinel_without_size() {
        let mut bytes = sample_log();
        bytes[LOG_PREFIX_SIZE] = 0;
        reseal(&mut bytes);
        assert!(matches!(
            LogReader::new(&bytes, MAX),
            Err(LogError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn rejects_zero_world_in_header() {
        let mut bytes = sample_log();
        bytes[LOG_PREFIX_SIZE + 3] = 0;
        bytes[LOG_PREFIX_SIZE + 4] = 0;
        reseal(&mut bytes);
        assert!(matches!(
            LogReader::new(&bytes, MAX),
            Err(LogError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn rejects_zero_elapsed_body_frame() {
        let mut bytes = sample_log();
        let first = LOG_MIN_SIZE - LOG_FOOTER_SIZE;
        bytes[first + 1] = 0;
        bytes[first + 2] = 0;
        reseal(&mut bytes);
        let mut reader = LogReader::new(&bytes, MAX).unwrap();
        assert_eq!(reader.next(), Some(Err(LogError::ZeroElapsed { frame: 1 })));
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn rejects_zero_world_in_body() {
        let mut writer = InputLogWriter::new(800, 600).unwrap();
        writer.record(16, 640, 480, &InputState::new()).unwrap();
        let mut bytes = writer.finish();
        let first = LOG_MIN_SIZE - LOG_FOOTER_SIZE;
        bytes[first + 3] = 0;
        bytes[first + 4] = 0;
        reseal(&mut bytes);
        let frames: Vec<_> = LogReader::new(&bytes, MAX).unwrap().collect();
        assert_eq!(
            frames,
            vec![Err(LogError::ZeroWorldSize {
                frame: 1,
                width: 0,
                height: 480
            })]
        );
    }

    #[test]
    fn rejects_reserved_flag_bits() {
        let mut bytes = sample_log();
        let first = LOG_MIN_SIZE - LOG_FOOTER_SIZE;
        bytes[first] |= 0x80;
        reseal(&mut bytes);
        let mut reader = LogReader::new(&bytes, MAX).unwrap();
        assert!(matches!(
            reader.next(),
            Some(Err(LogError::ReservedBits { frame: 1, .. }))
        ));
    }

    #[test]
    fn rejects_truncated_frame() {
        let mut writer = InputLogWriter::new(800, 600).unwrap();
        writer
            .record(16, 800, 600, &InputState::new().with(Control::Left, 0.5))
            .unwrap();
        let mut bytes = writer.finish();
        // Drop the analog value byte, keep the footer.
        let value_offset = bytes.len() - LOG_FOOTER_SIZE - 1;
        bytes.remove(value_offset);
        reseal(&mut bytes);
        let mut reader = LogReader::new(&bytes, MAX).unwrap();
        assert!(matches!(
            reader.next(),
            Some(Err(LogError::Truncated { frame: 1, .. }))
        ));
    }

    #[test]
    fn rejects_frame_count_mismatch() {
        let mut bytes = sample_log();
        let footer = bytes.len() - LOG_FOOTER_SIZE;
        bytes[footer..footer + 4].copy_from_slice(&4u32.to_le_bytes());
        reseal(&mut bytes);
        let results: Vec<_> = LogReader::new(&bytes, MAX).unwrap().collect();
        assert_eq!(results.len(), 4);
        assert_eq!(
            results[3],
            Err(LogError::FrameCountMismatch {
                declared: 4,
                decoded: 3
            })
        );
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = sample_log();
        let footer = bytes.len() - LOG_FOOTER_SIZE;
        bytes[footer..footer + 4].copy_from_slice(&2u32.to_le_bytes());
        reseal(&mut bytes);
        assert!(matches!(
            read_log(&bytes, MAX),
            Err(LogError::TrailingBytes { frame: 2, .. })
        ));
    }
}
