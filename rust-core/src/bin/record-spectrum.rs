use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use record_spectrum::audio::input::list_input_devices;
use record_spectrum::audio::output::list_output_devices;
use record_spectrum::audio::tap::FrameAssembler;
use record_spectrum::audio::types::format_clock;
use record_spectrum::audio::wav::read_wav;
use record_spectrum::audio::{
    join_wav_files, AudioPlayer, AudioRecorder, PlaybackState, PlayerCommand, PlayerEvent,
    RecorderEvent, RecorderState,
};
use record_spectrum::config::AppConfig;
use record_spectrum::spectrum::{RealtimeAnalyzer, Spectra};
use record_spectrum::view::{BarStyle, TerminalRenderer};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const SEEK_STEP_SECS: f64 = 5.0;
// Rows kept below the bars for the status line
const STATUS_ROWS: u16 = 2;

#[derive(Parser)]
#[command(name = "record-spectrum")]
#[command(about = "Record and play audio with a live spectrum analyzer")]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of frequency bands (overrides the config file)
    #[arg(long, global = true)]
    bands: Option<usize>,

    /// FFT size in samples (overrides the config file)
    #[arg(long, global = true)]
    fft_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audio input and output devices
    Devices,

    /// Record from the default input into <dir>/<name>.wav
    Record {
        name: String,

        /// Stop after this many seconds (otherwise press q)
        #[arg(long)]
        seconds: Option<f64>,

        /// Output directory
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Channels to write
        #[arg(long)]
        channels: Option<u16>,
    },

    /// Play a WAV file with a live spectrum
    Play {
        file: PathBuf,

        /// Start position in seconds
        #[arg(long)]
        start: Option<f64>,
    },

    /// Concatenate WAV files
    Join {
        output: PathBuf,

        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Print the spectrum of a WAV file frame by frame
    Analyze {
        file: PathBuf,

        /// Emit one JSON object per line
        #[arg(long)]
        json: bool,

        /// Only print every Nth frame
        #[arg(long, default_value = "10")]
        every: usize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(bands) = cli.bands {
        config.analyzer.frequency_bands = bands;
    }
    if let Some(fft_size) = cli.fft_size {
        config.analyzer.fft_size = fft_size;
    }
    config.validate().context("Invalid analyzer settings")?;

    match cli.command {
        Commands::Devices => devices(),
        Commands::Record {
            name,
            seconds,
            dir,
            channels,
        } => {
            config.recorder.file_name = name;
            if let Some(dir) = dir {
                config.recorder.directory = dir;
            }
            if let Some(channels) = channels {
                config.recorder.channels = channels;
            }
            record(&config, seconds)
        }
        Commands::Play { file, start } => play(&config, &file, start),
        Commands::Join { output, inputs } => {
            let (path, frames) = join_wav_files(inputs.as_slice(), &output)?;
            let audio = read_wav(&path)?;
            println!(
                "Joined {} file(s) into {} ({} frames, {})",
                inputs.len(),
                path.display(),
                frames,
                format_clock(audio.duration_secs())
            );
            Ok(())
        }
        Commands::Analyze { file, json, every } => analyze(&config, &file, json, every),
    }
}

fn devices() -> Result<()> {
    println!("Input devices:");
    for d in list_input_devices()? {
        println!("  {} ({} Hz, {} ch)", d.name, d.sample_rate, d.channels);
    }
    println!("Output devices:");
    for d in list_output_devices()? {
        println!("  {} ({} Hz, {} ch)", d.name, d.sample_rate, d.channels);
    }
    Ok(())
}

fn record(config: &AppConfig, seconds: Option<f64>) -> Result<()> {
    let mut recorder = AudioRecorder::new(config.recorder.clone(), config.analyzer.clone())?;
    let events = recorder.events();

    recorder.record().context("Failed to start recording")?;
    log::info!("Recording to {}", recorder.output_path().display());

    let started = Instant::now();
    let mut screen = Screen::enter(config)?;

    loop {
        match screen.poll_key(FRAME_INTERVAL)? {
            Some(KeyCode::Char(' ')) => {
                let toggled = match recorder.state() {
                    RecorderState::Recording => recorder.pause(),
                    _ => recorder.record(),
                };
                if let Err(e) = toggled {
                    log::warn!("Pause/resume failed: {}", e);
                }
            }
            Some(KeyCode::Char('q') | KeyCode::Char('s') | KeyCode::Esc | KeyCode::Enter) => break,
            _ => {}
        }
        if seconds.is_some_and(|limit| started.elapsed().as_secs_f64() >= limit) {
            break;
        }

        let mut failed = false;
        for event in events.try_iter() {
            if let RecorderEvent::Error(message) = event {
                log::error!("Recorder error: {}", message);
                failed = true;
            }
        }
        if failed {
            break;
        }

        if let Some(spectra) = recorder.latest_spectrum() {
            let status = format!(
                "{} {}  space: pause  q: stop",
                recorder.state(),
                format_clock(started.elapsed().as_secs_f64())
            );
            screen.draw(&spectra, &status)?;
        }
    }

    drop(screen);
    let path = recorder.stop()?;
    println!("Saved {}", path.display());
    Ok(())
}

fn play(config: &AppConfig, file: &Path, start: Option<f64>) -> Result<()> {
    let mut player = AudioPlayer::new(config.player.clone(), config.analyzer.clone())?;
    let events = player.events();

    player
        .load(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    match start {
        Some(secs) => player.play_at(secs)?,
        None => player.play()?,
    }
    log::info!("Playing {}", file.display());

    let mut screen = Screen::enter(config)?;
    let mut progress = player.progress();

    'outer: loop {
        let command = match screen.poll_key(FRAME_INTERVAL)? {
            Some(KeyCode::Char(' ')) => Some(PlayerCommand::TogglePlayPause),
            Some(KeyCode::Char('s')) => Some(PlayerCommand::Stop),
            Some(KeyCode::Left) => Some(PlayerCommand::Seek(
                (progress.current_secs - SEEK_STEP_SECS).max(0.0),
            )),
            Some(KeyCode::Right) => Some(PlayerCommand::Seek(progress.current_secs + SEEK_STEP_SECS)),
            Some(KeyCode::Char('q') | KeyCode::Esc) => break 'outer,
            _ => None,
        };
        if let Some(command) = command {
            if let Err(e) = player.handle(command) {
                log::warn!("{:?} failed: {}", command, e);
            }
        }

        for event in events.try_iter() {
            match event {
                PlayerEvent::Progress(p) => {
                    progress = p;
                    if p.ended {
                        break 'outer;
                    }
                }
                PlayerEvent::Error(message) => log::error!("Playback error: {}", message),
                PlayerEvent::StateChanged(state) => log::debug!("Player is {}", state),
            }
        }

        if let Some(spectra) = player.latest_spectrum() {
            let now = player.now_playing();
            let status = format!(
                "{} {} {}  space: pause  s: stop  ←/→: seek  q: quit",
                now.title,
                player.state(),
                progress
            );
            screen.draw(&spectra, &status)?;
        }
    }

    drop(screen);
    if player.state() != PlaybackState::Stopped {
        player.stop()?;
    }
    Ok(())
}

#[derive(Serialize)]
struct AnalyzedFrame<'a> {
    time_secs: f64,
    spectra: &'a Spectra,
}

fn analyze(config: &AppConfig, file: &Path, json: bool, every: usize) -> Result<()> {
    let audio = read_wav(file).with_context(|| format!("Failed to read {}", file.display()))?;
    if audio.sample_rate == 0 {
        bail!("{} has a sample rate of 0", file.display());
    }

    let mut analyzer = RealtimeAnalyzer::new(config.analyzer.clone())?;
    let bands = analyzer.bands().to_vec();
    let fft_size = analyzer.fft_size();
    let rate = audio.sample_rate as f64;
    let every = every.max(1);

    let mut assembler = FrameAssembler::new(audio.channels as usize, fft_size);
    let mut index = 0usize;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut result = Ok(());

    assembler.push(&audio.samples, |frame| {
        let spectra = analyzer.analyse(frame, rate);
        let time_secs = (index * fft_size) as f64 / rate;
        index += 1;
        if (index - 1) % every != 0 || result.is_err() {
            return;
        }

        result = if json {
            serde_json::to_string(&AnalyzedFrame {
                time_secs,
                spectra: &spectra,
            })
            .map_err(anyhow::Error::from)
            .and_then(|line| writeln!(out, "{}", line).map_err(anyhow::Error::from))
        } else {
            let (band, level) = spectra
                .left()
                .iter()
                .copied()
                .enumerate()
                .fold((0, 0.0_f32), |best, (i, v)| if v > best.1 { (i, v) } else { best });
            let centre = bands.get(band).map_or(0.0, |b| b.center_hz());
            writeln!(
                out,
                "{:>8.3}s  peak band {:>3} ({:>7.0} Hz)  level {:.2}",
                time_secs, band, centre, level
            )
            .map_err(anyhow::Error::from)
        };
    });
    result?;

    log::info!("Analysed {} frame(s) of {}", index, file.display());
    Ok(())
}

/// Alternate-screen spectrum view in raw mode; restores the terminal when dropped
struct Screen {
    renderer: TerminalRenderer,
    bands: usize,
    view: BarStyle,
    size: (u16, u16),
}

impl Screen {
    fn enter(config: &AppConfig) -> Result<Self> {
        let size = terminal::size().unwrap_or((80, 24));
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(Hide)?;

        let bands = config.analyzer.frequency_bands;
        Ok(Self {
            renderer: renderer_for(size, bands, &config.view),
            bands,
            view: config.view.clone(),
            size,
        })
    }

    /// Wait up to `timeout` for a key press
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<KeyCode>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key.code)),
            Event::Resize(columns, rows) => {
                self.size = (columns, rows);
                self.renderer = renderer_for(self.size, self.bands, &self.view);
                io::stdout().execute(Clear(ClearType::All))?;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn draw(&mut self, spectra: &Spectra, status: &str) -> Result<()> {
        let frame = self.renderer.render(spectra);
        let mut out = io::stdout().lock();
        // Raw mode does not return the carriage on newline
        let mut row = 0u16;
        for line in frame.lines().chain(std::iter::once(status)) {
            out.queue(MoveTo(0, row))?;
            out.queue(Clear(ClearType::CurrentLine))?;
            write!(out, "{}", line)?;
            row += 1;
        }
        out.flush()?;
        Ok(())
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout.execute(Show);
        let _ = stdout.execute(LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn renderer_for((columns, rows): (u16, u16), bands: usize, view: &BarStyle) -> TerminalRenderer {
    let rows = rows.saturating_sub(STATUS_ROWS).max(1);
    TerminalRenderer::new(columns.max(1) as usize, rows as usize, bands, view.clone())
}
