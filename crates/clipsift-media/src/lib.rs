//! Media operations for clipsift: probing, audio extraction, whisper
//! transcription, and clip assembly, all via external ffmpeg/ffprobe and
//! whisper.cpp processes.

pub mod assemble;
pub mod command;
pub mod error;
pub mod probe;
pub mod transcribe;

pub use assemble::assemble;
pub use command::{check_ffmpeg, check_ffprobe, check_whisper, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_media, MediaInfo};
pub use transcribe::{transcribe, TranscribeOptions};
