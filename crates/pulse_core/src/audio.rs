//! Audio analysis for the visualizer.
//!
//! The analyzer pulls raw samples from a [`SampleSource`], runs a
//! Hann-windowed FFT once per tick, and publishes an [`AudioFrame`]:
//! per-bin magnitudes, the raw waveform, and eight named band
//! aggregates. Frames are ephemeral — recomputed every tick and never
//! queued.

use bevy::log::warn;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// FFT window size in samples.
pub const FFT_SIZE: usize = 512;

/// Number of usable frequency bins (half the FFT size).
pub const BIN_COUNT: usize = FFT_SIZE / 2;

/// Number of named frequency bands.
pub const NUM_BANDS: usize = 8;

/// Band boundaries in Hz for a 44.1 kHz sample rate.
const BAND_EDGES: [f32; NUM_BANDS + 1] = [
    20.0, 60.0, 250.0, 500.0, 2000.0, 4000.0, 6000.0, 12000.0, 20000.0,
];

/// Names matching [`BAND_EDGES`], lowest to highest.
pub const BAND_NAMES: [&str; NUM_BANDS] = [
    "sub_bass",
    "bass",
    "low_mid",
    "mid",
    "upper_mid",
    "presence",
    "brilliance",
    "air",
];

/// Errors surfaced by a sample source. None of these are fatal: the
/// analyzer degrades to a silent frame and the tick continues.
#[derive(Debug)]
pub enum AudioError {
    /// The underlying stream or device has gone away.
    SourceClosed,
    /// The source produced data it could not decode.
    Decode(String),
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::SourceClosed => write!(f, "audio source closed"),
            AudioError::Decode(msg) => write!(f, "audio decode error: {}", msg),
        }
    }
}

impl std::error::Error for AudioError {}

/// Boundary to the host's audio input. URL/stream handling lives
/// outside the core; anything that can fill a buffer with samples in
/// [-1, 1] can drive the visualizer.
pub trait SampleSource: Send + Sync {
    /// Fill `buf` with the most recent samples, returning how many
    /// were written. Shorter fills are zero-padded by the analyzer.
    fn fill(&mut self, buf: &mut [f32]) -> Result<usize, AudioError>;
}

/// Deterministic synthetic source: a bass sine plus two harmonics.
/// Used by the demo binary and by tests.
pub struct OscillatorSource {
    sample_rate: f32,
    phase: f32,
    /// Fundamental frequency in Hz.
    pub frequency: f32,
    /// Output amplitude in [0, 1].
    pub amplitude: f32,
}

impl OscillatorSource {
    pub fn new(frequency: f32) -> Self {
        Self {
            sample_rate: 44_100.0,
            phase: 0.0,
            frequency,
            amplitude: 0.8,
        }
    }
}

impl SampleSource for OscillatorSource {
    fn fill(&mut self, buf: &mut [f32]) -> Result<usize, AudioError> {
        let step = std::f32::consts::TAU * self.frequency / self.sample_rate;
        for sample in buf.iter_mut() {
            let s = self.phase.sin()
                + 0.4 * (self.phase * 2.0).sin()
                + 0.2 * (self.phase * 3.0).sin();
            *sample = s * self.amplitude / 1.6;
            self.phase = (self.phase + step) % std::f32::consts::TAU;
        }
        Ok(buf.len())
    }
}

/// Named band aggregates, each in roughly [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandLevels {
    levels: [f32; NUM_BANDS],
}

impl BandLevels {
    pub fn from_levels(levels: [f32; NUM_BANDS]) -> Self {
        Self { levels }
    }

    /// Look up a band aggregate by name ("bass", "mid", ...).
    pub fn get(&self, name: &str) -> Option<f32> {
        BAND_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.levels[i])
    }

    pub fn level(&self, index: usize) -> f32 {
        self.levels.get(index).copied().unwrap_or(0.0)
    }

    /// Low end: sub_bass and bass combined.
    pub fn bass(&self) -> f32 {
        (self.levels[0] + self.levels[1]) / 2.0
    }

    /// Midrange: low_mid through upper_mid.
    pub fn mid(&self) -> f32 {
        (self.levels[2] + self.levels[3] + self.levels[4]) / 3.0
    }

    /// High end: presence through air.
    pub fn presence(&self) -> f32 {
        (self.levels[5] + self.levels[6] + self.levels[7]) / 3.0
    }

    /// Mean level across all bands.
    pub fn energy(&self) -> f32 {
        self.levels.iter().sum::<f32>() / NUM_BANDS as f32
    }
}

/// One tick's worth of audio analysis. Immutable for the duration of
/// the tick that produced it; never persisted.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Per-bin magnitudes scaled to 0..255, length [`BIN_COUNT`].
    pub frequencies: Vec<f32>,
    /// Raw time-domain samples, length [`BIN_COUNT`].
    pub waveform: Vec<f32>,
    /// Named band aggregates.
    pub bands: BandLevels,
}

impl AudioFrame {
    /// The degraded frame used when the audio source errors out.
    pub fn silent() -> Self {
        Self {
            frequencies: vec![0.0; BIN_COUNT],
            waveform: vec![0.0; BIN_COUNT],
            bands: BandLevels::default(),
        }
    }

    /// Frame with every bin at `magnitude` (test fixture).
    pub fn uniform(magnitude: f32) -> Self {
        let band = (magnitude / 255.0).clamp(0.0, 1.0);
        Self {
            frequencies: vec![magnitude; BIN_COUNT],
            waveform: vec![0.0; BIN_COUNT],
            bands: BandLevels::from_levels([band; NUM_BANDS]),
        }
    }

    /// Mean of the lowest four frequency bins, normalized to [0, 1].
    /// Drives the global bass attractor.
    pub fn bass_bin_average(&self) -> f32 {
        let count = self.frequencies.len().min(4);
        if count == 0 {
            return 0.0;
        }
        self.frequencies[..count].iter().sum::<f32>() / count as f32 / 255.0
    }
}

/// Runs the FFT and band aggregation once per tick.
pub struct AudioAnalyzer {
    source: Box<dyn SampleSource>,
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex<f32>>,
    window: Vec<f32>,
    samples: Vec<f32>,
    band_bins: [(usize, usize); NUM_BANDS],
    smoothed_bands: [f32; NUM_BANDS],
    degraded: bool,
}

impl AudioAnalyzer {
    pub fn new(source: Box<dyn SampleSource>) -> Self {
        Self::with_sample_rate(source, 44_100.0)
    }

    pub fn with_sample_rate(source: Box<dyn SampleSource>, sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        let window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / FFT_SIZE as f32).cos()))
            .collect();

        let bin_width = sample_rate / FFT_SIZE as f32;
        let mut band_bins = [(0usize, 0usize); NUM_BANDS];
        for i in 0..NUM_BANDS {
            let low = (BAND_EDGES[i] / bin_width).floor() as usize;
            let high = (BAND_EDGES[i + 1] / bin_width).ceil() as usize;
            band_bins[i] = (low.max(1), high.min(BIN_COUNT));
        }

        Self {
            source,
            fft,
            fft_buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            window,
            samples: vec![0.0; FFT_SIZE],
            band_bins,
            smoothed_bands: [0.0; NUM_BANDS],
            degraded: false,
        }
    }

    /// Produce this tick's [`AudioFrame`]. A source error yields a
    /// silent frame instead of propagating.
    pub fn sample(&mut self) -> AudioFrame {
        let filled = match self.source.fill(&mut self.samples) {
            Ok(n) => {
                self.degraded = false;
                n.min(FFT_SIZE)
            }
            Err(err) => {
                if !self.degraded {
                    warn!("audio source degraded, producing silence: {}", err);
                    self.degraded = true;
                }
                return AudioFrame::silent();
            }
        };
        self.samples[filled..].fill(0.0);

        for i in 0..FFT_SIZE {
            self.fft_buffer[i] = Complex::new(self.samples[i] * self.window[i], 0.0);
        }
        self.fft.process(&mut self.fft_buffer);

        // Per-bin magnitudes mapped from roughly -60..0 dB to 0..255.
        let mut frequencies = Vec::with_capacity(BIN_COUNT);
        for bin in &self.fft_buffer[..BIN_COUNT] {
            let norm = bin.norm() / (FFT_SIZE as f32 / 4.0);
            let db = 20.0 * (norm + 1e-10).log10();
            frequencies.push(((db + 60.0) / 60.0).clamp(0.0, 1.0) * 255.0);
        }

        // Band aggregates with fast attack, slower decay.
        let attack = 0.7;
        let decay = 0.15;
        for (i, &(low, high)) in self.band_bins.iter().enumerate() {
            let raw = if high > low {
                let sum: f32 = frequencies[low..high].iter().sum();
                sum / (high - low) as f32 / 255.0
            } else {
                0.0
            };
            let rate = if raw > self.smoothed_bands[i] {
                attack
            } else {
                decay
            };
            self.smoothed_bands[i] = self.smoothed_bands[i] * (1.0 - rate) + raw * rate;
        }

        AudioFrame {
            waveform: self.samples[..BIN_COUNT].to_vec(),
            frequencies,
            bands: BandLevels::from_levels(self.smoothed_bands),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource;

    impl SampleSource for FailingSource {
        fn fill(&mut self, _buf: &mut [f32]) -> Result<usize, AudioError> {
            Err(AudioError::SourceClosed)
        }
    }

    #[test]
    fn test_silent_frame_shape() {
        let frame = AudioFrame::silent();
        assert_eq!(frame.frequencies.len(), BIN_COUNT);
        assert_eq!(frame.waveform.len(), BIN_COUNT);
        assert!(frame.frequencies.iter().all(|&f| f == 0.0));
        assert_eq!(frame.bands.energy(), 0.0);
    }

    #[test]
    fn test_band_lookup_by_name() {
        let bands = BandLevels::from_levels([0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]);
        assert_eq!(bands.get("bass"), Some(0.2));
        assert_eq!(bands.get("mid"), Some(0.4));
        assert_eq!(bands.get("air"), Some(0.8));
        assert_eq!(bands.get("nonexistent"), None);
    }

    #[test]
    fn test_band_aggregates() {
        let bands = BandLevels::from_levels([0.2, 0.4, 0.0, 0.0, 0.0, 0.9, 0.9, 0.9]);
        assert!((bands.bass() - 0.3).abs() < 1e-6);
        assert!((bands.presence() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_source_error_degrades_to_silence() {
        let mut analyzer = AudioAnalyzer::new(Box::new(FailingSource));
        let frame = analyzer.sample();
        assert!(frame.frequencies.iter().all(|&f| f == 0.0));
        assert_eq!(frame.bands.energy(), 0.0);
    }

    #[test]
    fn test_oscillator_excites_matching_band() {
        // 1 kHz fundamental sits in the 500-2000 Hz "mid" band.
        let mut analyzer = AudioAnalyzer::new(Box::new(OscillatorSource::new(1000.0)));
        // A few frames so the attack smoothing catches up.
        let mut frame = analyzer.sample();
        for _ in 0..10 {
            frame = analyzer.sample();
        }
        let mid = frame.bands.get("mid").unwrap_or(0.0);
        let air = frame.bands.get("air").unwrap_or(0.0);
        assert!(mid > 0.1, "mid band should carry energy, got {}", mid);
        assert!(mid > air, "mid ({}) should dominate air ({})", mid, air);
    }

    #[test]
    fn test_bass_bin_average() {
        let mut frame = AudioFrame::silent();
        frame.frequencies[0] = 255.0;
        frame.frequencies[1] = 255.0;
        frame.frequencies[2] = 0.0;
        frame.frequencies[3] = 0.0;
        assert!((frame.bass_bin_average() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_frame_helper() {
        let frame = AudioFrame::uniform(255.0);
        assert!(frame.frequencies.iter().all(|&f| f == 255.0));
        assert!((frame.bands.energy() - 1.0).abs() < 1e-6);
    }
}
