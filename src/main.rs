use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use genie::voice::{
    AudioPlayback, Listen, ListenOptions, Microphone, SpeechToText, Speak, Speaker, TextToSpeech,
    calculate_energy,
};
use genie::{AssistantConfig, CompletionClient, VoiceAssistant, resolve_api_key};

/// Genie - voice assistant that listens for a wake word and answers with OpenAI
#[derive(Parser)]
#[command(name = "genie", version, about)]
struct Cli {
    /// Wake word that activates recording
    #[arg(long, default_value = "genius")]
    wake_word: String,

    /// OpenAI API key; falls back to the OPENAI_API_KEY environment variable
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat model to request
    #[arg(long, default_value = "gpt-3.5-turbo")]
    model: String,

    /// Sampling temperature for the model
    #[arg(long, default_value = "0.7")]
    temperature: f32,

    /// Maximum number of tokens in the reply
    #[arg(long, default_value = "400")]
    max_output_tokens: u32,

    /// Seconds to wait for speech before timing out
    #[arg(long)]
    listen_timeout: Option<f32>,

    /// Maximum number of seconds to record once speech starts
    #[arg(long)]
    phrase_time_limit: Option<f32>,

    /// Seconds to sample background noise before each recording
    #[arg(long, default_value = "0.5")]
    ambient_noise_duration: f32,

    /// Seconds of silence that mark the end of a phrase
    #[arg(long, default_value = "0.8")]
    pause_threshold: f32,

    /// STT model for transcription
    #[arg(long, default_value = "whisper-1")]
    stt_model: String,

    /// TTS model for synthesis
    #[arg(long, default_value = "tts-1")]
    tts_model: String,

    /// TTS voice identifier
    #[arg(long, default_value = "alloy")]
    tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    #[arg(long, default_value = "1.0")]
    tts_speed: f32,

    /// Exit after answering a single question
    #[arg(long)]
    once: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input by recording one phrase
    TestMic {
        /// Seconds to wait for speech
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output with a sine tone
    TestSpeaker,
    /// Speak a line of text through the TTS pipeline
    Say {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,genie=info",
        1 => "info,genie=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AssistantConfig {
        wake_word: cli.wake_word.clone(),
        model: cli.model.clone(),
        temperature: cli.temperature,
        max_output_tokens: cli.max_output_tokens,
        pause_threshold: cli.pause_threshold,
        ambient_noise_duration: cli.ambient_noise_duration,
        listen_timeout: cli.listen_timeout,
        phrase_time_limit: cli.phrase_time_limit,
        stt_model: cli.stt_model.clone(),
        tts_model: cli.tts_model.clone(),
        tts_voice: cli.tts_voice.clone(),
        tts_speed: cli.tts_speed,
    };
    config.validate()?;

    // Handle subcommands
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration),
            Command::TestSpeaker => test_speaker(),
            Command::Say { text } => say(cli.api_key, &config, &text).await,
        };
    }

    // A missing credential must fail here, before the loop starts
    let api_key = resolve_api_key(cli.api_key)?;

    let microphone = Microphone::new();
    let transcriber = SpeechToText::new(api_key.clone(), config.stt_model.clone())?;
    let completions = CompletionClient::new(api_key.clone(), &config)?;
    let tts = TextToSpeech::new(
        api_key,
        config.tts_model.clone(),
        config.tts_voice.clone(),
        config.tts_speed,
    )?;
    let speaker = Speaker::new(tts)?;

    tracing::info!(
        model = %config.model,
        wake_word = %config.wake_word,
        once = cli.once,
        "genie ready"
    );

    let mut assistant = VoiceAssistant::new(&config, microphone, transcriber, completions, speaker);
    assistant.run(cli.once).await;

    Ok(())
}

/// Test microphone input by recording a single phrase
fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Listening for up to {duration} seconds...");
    println!("Speak into your microphone!\n");

    let opts = ListenOptions {
        ambient_noise_duration: std::time::Duration::from_millis(500),
        pause_threshold: std::time::Duration::from_millis(800),
        listen_timeout: Some(std::time::Duration::from_secs(duration)),
        phrase_time_limit: Some(std::time::Duration::from_secs(duration)),
    };

    let mut microphone = Microphone::new();
    match microphone.listen(&opts) {
        Ok(clip) => {
            let energy = calculate_energy(&clip.samples);
            println!("Recorded {} samples ({:.2}s)", clip.samples.len(), clip.duration_secs());
            println!("RMS energy: {energy:.4}");
            println!("\nIf the numbers above are non-zero, your mic is working!");
        }
        Err(genie::Error::ListenTimeout) => {
            println!("No speech detected.");
            println!("If you were speaking, check:");
            println!("  1. Is your mic plugged in?");
            println!("  2. Run: pactl info | grep 'Default Source'");
            println!("  3. Run: arecord -l (to list devices)");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let mut playback = AudioPlayback::new()?;

    // Generate 2 seconds of 440Hz sine wave at 24kHz sample rate
    let sample_rate = 24000_f32;
    let frequency = 440.0_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate * 2.0) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    playback.play(&samples)?;

    println!("If you heard the tone, your speakers are working!");
    Ok(())
}

/// Speak a line of text through the TTS pipeline
async fn say(api_key: Option<String>, config: &AssistantConfig, text: &str) -> anyhow::Result<()> {
    println!("Speaking: \"{text}\"");

    let api_key = resolve_api_key(api_key)?;
    let tts = TextToSpeech::new(
        api_key,
        config.tts_model.clone(),
        config.tts_voice.clone(),
        config.tts_speed,
    )?;
    let mut speaker = Speaker::new(tts)?;
    speaker.speak(text).await?;

    println!("If you heard the speech, TTS is working!");
    Ok(())
}
