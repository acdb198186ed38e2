use thiserror::Error;

/// Reasons an input log cannot be (fully) decoded.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LogError {
    #[error("input log is empty")]
    Empty,
    #[error("input log too short: {actual} bytes, need at least {min}")]
    TooShort { actual: usize, min: usize },
    #[error("invalid input log magic: 0x{found:08x}")]
    InvalidMagic { found: u32 },
    #[error("unsupported input log version: {found}")]
    UnsupportedVersion { found: u8 },
    #[error("header reserved bytes are non-zero")]
    HeaderReservedNonZero,
    #[error("invalid header frame: {reason}")]
    InvalidHeader { reason: &'static str },
    #[error("frame {frame}: reserved bits set in 0x{byte:02x}")]
    ReservedBits { frame: u32, byte: u8 },
    #[error("frame {frame}: elapsed time is zero")]
    ZeroElapsed { frame: u32 },
    #[error("frame {frame}: world size {width}x{height} has a zero dimension")]
    ZeroWorldSize { frame: u32, width: u16, height: u16 },
    #[error("frame {frame}: truncated at byte {offset}")]
    Truncated { frame: u32, offset: usize },
    #[error("frame count mismatch: footer={declared}, decoded={decoded}")]
    FrameCountMismatch { declared: u32, decoded: u32 },
    #[error("frame count {frame_count} exceeds limit {max_frames}")]
    TooManyFrames { frame_count: u32, max_frames: u32 },
    #[error("crc mismatch: stored=0x{stored:08x}, computed=0x{computed:08x}")]
    CrcMismatch { stored: u32, computed: u32 },
    #[error("{count} trailing bytes after frame {frame}")]
    TrailingBytes { frame: u32, count: usize },
}

/// Why a claimed result was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("replay did not complete: {0}")]
    Replay(#[from] LogError),
    #[error("score mismatch: claimed={claimed}, computed={computed}")]
    ScoreMismatch { claimed: u32, computed: u32 },
}
