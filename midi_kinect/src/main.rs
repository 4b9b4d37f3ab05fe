//! midi_kinect — play a 5 × 4 grid of notes with your hands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use midi_kinect::app::run;
use midi_kinect::output::list_ports;
use midi_kinect::AppConfig;

#[derive(Parser)]
#[command(name = "midi_kinect")]
#[command(about = "Depth-camera grid controller: blob detections in, MIDI out")]
#[command(version)]
struct Cli {
    /// JSON config file (missing file means defaults)
    #[arg(short, long, default_value = "midi_kinect.json")]
    config: PathBuf,

    /// Replay detection frames from a JSON-lines file instead of stdin
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Scale preset (chromatic, major, minor, pentatonic-minor, …)
    #[arg(short, long)]
    mode: Option<String>,

    /// Semitones added to every pitch
    #[arg(short, long, allow_hyphen_values = true)]
    transpose: Option<i32>,

    /// MIDI channel 1–16
    #[arg(long)]
    channel: Option<u8>,

    /// Distance (mm) that gives full velocity
    #[arg(long)]
    near: Option<f32>,

    /// Distance (mm) that gives zero velocity
    #[arg(long)]
    far: Option<f32>,

    /// Replay frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Loop the replay file
    #[arg(long)]
    repeat: bool,

    /// Output port name (substring match)
    #[arg(short, long)]
    port: Option<String>,

    /// List MIDI output ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(mode) = &self.mode       { config.scale.mode = mode.clone(); }
        if let Some(t) = self.transpose      { config.scale.transpose = t; }
        if let Some(ch) = self.channel       { config.midi.channel = ch; }
        if let Some(mm) = self.near          { config.velocity.near_mm = mm; }
        if let Some(mm) = self.far           { config.velocity.far_mm = mm; }
        if let Some(fps) = self.fps          { config.replay.frame_rate = fps; }
        if let Some(port) = &self.port       { config.midi.port = Some(port.clone()); }
        if self.repeat                       { config.replay.repeat = true; }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.list_ports {
        let ports = list_ports().context("listing MIDI ports")?;
        if ports.is_empty() {
            println!("no MIDI output ports");
        }
        for (i, name) in ports.iter().enumerate() {
            println!("{:>2}: {}", i, name);
        }
        return Ok(());
    }

    let mut config = AppConfig::load_or_default(&cli.config)?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    if cli.dump_config {
        println!("{}", config.to_json());
        return Ok(());
    }

    info!("midi_kinect {}", env!("CARGO_PKG_VERSION"));
    run(&config, cli.replay.as_deref()).context("midi_kinect stopped")?;
    Ok(())
}
