//! Audio plumbing: decoding files, generating the test tone, driving the
//! output device and analysing what is played.

pub mod analyser;
pub mod decode;
pub mod device;
pub mod ffmpeg;
pub mod output;
pub mod source;

pub use analyser::{AnalyserConfig, SampleTap, SpectrumAnalyser, FFT_SIZE_MENU};
pub use decode::{decode_file, DecodeError, DecodedAudio};
pub use output::{CpalBackend, MixSettings};
pub use source::{SourceRequest, DEFAULT_TONE_HZ};
