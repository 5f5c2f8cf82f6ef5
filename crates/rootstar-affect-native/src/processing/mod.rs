//! Signal processing
//!
//! - [`fft`]: Spectral analysis and band power
//! - [`resample`]: Fourier-domain resampling to a fixed model input length

pub mod fft;
pub mod resample;

pub use fft::{BandPowers, SpectralAnalyzer};
pub use resample::FourierResampler;
