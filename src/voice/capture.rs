//! Audio capture from microphone
//!
//! One phrase per [`Listen::listen`] call: the input device is acquired,
//! calibrated against ambient noise, and released when the call returns,
//! on every exit path.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::SampleRate;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::config::AssistantConfig;
use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16_000;

/// Poll interval while watching the capture buffer
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Floor for the calibrated speech threshold
const MIN_ENERGY_THRESHOLD: f32 = 0.01;

/// Headroom applied to the measured ambient level
const AMBIENT_HEADROOM: f32 = 1.8;

/// One recorded utterance (mono f32 samples)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    /// Encode the clip as 16-bit WAV bytes for STT APIs
    ///
    /// # Errors
    ///
    /// Returns error if WAV encoding fails
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        samples_to_wav(&self.samples, self.sample_rate)
    }

    /// Duration of the clip in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Per-listen tunables, lifted straight from the assistant configuration
#[derive(Debug, Clone, Copy)]
pub struct ListenOptions {
    /// How long to sample background noise before recording
    pub ambient_noise_duration: Duration,
    /// Trailing silence that ends the phrase
    pub pause_threshold: Duration,
    /// How long to wait for speech to start (None = forever)
    pub listen_timeout: Option<Duration>,
    /// Cap on the recorded phrase length (None = unbounded)
    pub phrase_time_limit: Option<Duration>,
}

impl ListenOptions {
    /// Build listen options from the assistant configuration
    #[must_use]
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self {
            ambient_noise_duration: Duration::from_secs_f32(config.ambient_noise_duration),
            pause_threshold: Duration::from_secs_f32(config.pause_threshold),
            listen_timeout: config.listen_timeout.map(Duration::from_secs_f32),
            phrase_time_limit: config.phrase_time_limit.map(Duration::from_secs_f32),
        }
    }
}

/// Capability: record one spoken phrase
pub trait Listen {
    /// Calibrate for ambient noise, then record until the speaker pauses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Audio`] if the capture device is unavailable and
    /// [`Error::ListenTimeout`] if no speech starts within the timeout.
    fn listen(&mut self, opts: &ListenOptions) -> Result<AudioClip>;
}

/// Records phrases from the default input device
#[derive(Debug, Default)]
pub struct Microphone;

impl Microphone {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Listen for Microphone {
    fn listen(&mut self, opts: &ListenOptions) -> Result<AudioClip> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "input device acquired"
        );

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let callback_buffer = Arc::clone(&buffer);

        // The stream is a local, so it is dropped (and the device released)
        // on every exit path, including calibration and timeout errors.
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = callback_buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Calibrate: measure ambient energy for the configured duration
        std::thread::sleep(opts.ambient_noise_duration);
        let ambient = calculate_energy(&take_buffer(&buffer));
        let threshold = (ambient * AMBIENT_HEADROOM).max(MIN_ENERGY_THRESHOLD);
        tracing::debug!(ambient, threshold, "calibrated for ambient noise");

        let started = Instant::now();
        let mut phrase: Vec<f32> = Vec::new();
        let mut silence = Duration::ZERO;

        loop {
            std::thread::sleep(POLL_INTERVAL);
            let chunk = take_buffer(&buffer);
            let speaking = calculate_energy(&chunk) > threshold;

            if phrase.is_empty() {
                if speaking {
                    tracing::trace!("speech started");
                    phrase.extend_from_slice(&chunk);
                } else if opts.listen_timeout.is_some_and(|t| started.elapsed() >= t) {
                    return Err(Error::ListenTimeout);
                }
                continue;
            }

            phrase.extend_from_slice(&chunk);

            if speaking {
                silence = Duration::ZERO;
            } else {
                silence += POLL_INTERVAL;
            }

            if silence >= opts.pause_threshold {
                tracing::trace!("end of phrase (silence)");
                break;
            }

            #[allow(clippy::cast_precision_loss)]
            let clip_secs = phrase.len() as f32 / SAMPLE_RATE as f32;
            if opts
                .phrase_time_limit
                .is_some_and(|limit| clip_secs >= limit.as_secs_f32())
            {
                tracing::trace!("end of phrase (time limit)");
                break;
            }
        }

        drop(stream);

        tracing::debug!(samples = phrase.len(), "phrase recorded");
        Ok(AudioClip {
            samples: phrase,
            sample_rate: SAMPLE_RATE,
        })
    }
}

/// Drain the shared capture buffer
fn take_buffer(buffer: &Arc<Mutex<Vec<f32>>>) -> Vec<f32> {
    buffer
        .lock()
        .map(|mut buf| std::mem::take(&mut *buf))
        .unwrap_or_default()
}

/// Calculate RMS energy of audio samples
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
