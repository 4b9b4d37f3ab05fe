//! Input sources: detection frames and live commands.
//!
//! Every source runs on its own thread and delivers [`InputEvent`]s over an
//! `mpsc` channel, so the run loop does not care whether frames come from a
//! replay file or a sensor process piping into stdin.

use std::fs;
use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use blob_tracker::Detection;
use log::{info, warn};

use crate::error::AppError;

// ════════════════════════════════════════════════════════════════════════════
// InputEvent / Command
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// One camera frame, largest blob first.
    Frame(Vec<Detection>),
    Command(Command),
    /// Release everything and stop.
    Quit,
}

/// A runtime control typed by the performer.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Switch scale preset by name.
    Mode(String),
    /// Transpose by whole octaves.
    Octave(i32),
    /// Transpose by semitones.
    Transpose(i32),
    Near(f32),
    Far(f32),
    /// 1-based MIDI channel.
    Channel(u8),
    /// Release every sounding note.
    Panic,
    Status,
}

impl Command {
    /// Parse one command line.  `quit` is not a command but an
    /// [`InputEvent::Quit`]; see [`parse_line`].
    pub fn parse(line: &str) -> Result<Command, AppError> {
        let unknown = || AppError::UnknownCommand(line.trim().to_string());
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(unknown)?.to_lowercase();
        let arg = words.next();
        if words.next().is_some() {
            return Err(unknown());
        }

        let cmd = match (verb.as_str(), arg) {
            ("mode", Some(name))           => Command::Mode(name.to_string()),
            ("up" | "+", None)             => Command::Octave(1),
            ("down" | "-", None)           => Command::Octave(-1),
            ("transpose", Some(n))         => Command::Transpose(n.parse().map_err(|_| unknown())?),
            ("near", Some(mm))             => Command::Near(mm.parse().map_err(|_| unknown())?),
            ("far", Some(mm))              => Command::Far(mm.parse().map_err(|_| unknown())?),
            ("channel", Some(n))           => Command::Channel(n.parse().map_err(|_| unknown())?),
            ("panic", None)                => Command::Panic,
            ("status", None)               => Command::Status,
            _ => return Err(unknown()),
        };
        Ok(cmd)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Line parsing
// ════════════════════════════════════════════════════════════════════════════

/// Parse one line of interactive input.
///
/// Lines starting with `[` are detection frames; blank lines and `#`
/// comments yield nothing; anything else is a command.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<InputEvent>, AppError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    if line.starts_with('[') {
        return parse_frame(line_no, line).map(|f| Some(InputEvent::Frame(f)));
    }
    match line.to_lowercase().as_str() {
        "quit" | "q" | "exit" => Ok(Some(InputEvent::Quit)),
        _ => Command::parse(line).map(|c| Some(InputEvent::Command(c))),
    }
}

fn parse_frame(line_no: usize, line: &str) -> Result<Vec<Detection>, AppError> {
    serde_json::from_str(line).map_err(|source| AppError::FrameParse { line: line_no, source })
}

/// Parse a whole replay file.  Blank lines are empty frames (everything
/// left the field of view); `#` lines are comments.
pub fn parse_frames(text: &str) -> Result<Vec<Vec<Detection>>, AppError> {
    let mut frames = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if line.is_empty() {
            frames.push(Vec::new());
        } else {
            frames.push(parse_frame(i + 1, line)?);
        }
    }
    Ok(frames)
}

// ════════════════════════════════════════════════════════════════════════════
// InputSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`InputEvent`]s over a channel.
pub trait InputSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<InputEvent>);
}

/// Run a source on its own thread, feeding `tx`.
pub fn spawn_input_source<S: InputSource>(source: S, tx: Sender<InputEvent>) -> JoinHandle<()> {
    thread::spawn(move || Box::new(source).run(tx))
}

// ════════════════════════════════════════════════════════════════════════════
// ReplaySource — recorded frames at a fixed rate
// ════════════════════════════════════════════════════════════════════════════

pub struct ReplaySource {
    frames:   Vec<Vec<Detection>>,
    interval: Duration,
    repeat:   bool,
}

impl ReplaySource {
    pub fn new(frames: Vec<Vec<Detection>>, frame_rate: u32, repeat: bool) -> Self {
        ReplaySource {
            frames,
            interval: Duration::from_secs(1) / frame_rate.max(1),
            repeat,
        }
    }

    pub fn from_path(path: &Path, frame_rate: u32, repeat: bool) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let frames = parse_frames(&text)?;
        info!("replaying {} frame(s) from {} at {} fps", frames.len(), path.display(), frame_rate);
        Ok(Self::new(frames, frame_rate, repeat))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl InputSource for ReplaySource {
    fn run(self: Box<Self>, tx: Sender<InputEvent>) {
        loop {
            for frame in &self.frames {
                if tx.send(InputEvent::Frame(frame.clone())).is_err() {
                    return;
                }
                thread::sleep(self.interval);
            }
            if !self.repeat || self.frames.is_empty() {
                break;
            }
        }
        info!("replay finished");
        let _ = tx.send(InputEvent::Quit);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CommandSource — line-oriented input (stdin)
// ════════════════════════════════════════════════════════════════════════════

/// Reads commands, and optionally frames, one per line.
///
/// Malformed lines are logged and skipped.  At end of input a `Quit` is sent
/// only if `quit_on_eof` is set, so a closed stdin does not cut a replay
/// short.
pub struct CommandSource<R> {
    reader:      R,
    quit_on_eof: bool,
}

impl<R: BufRead + Send + 'static> CommandSource<R> {
    pub fn new(reader: R, quit_on_eof: bool) -> Self {
        CommandSource { reader, quit_on_eof }
    }
}

impl CommandSource<std::io::BufReader<std::io::Stdin>> {
    pub fn stdin(quit_on_eof: bool) -> Self {
        Self::new(std::io::BufReader::new(std::io::stdin()), quit_on_eof)
    }
}

impl<R: BufRead + Send + 'static> InputSource for CommandSource<R> {
    fn run(self: Box<Self>, tx: Sender<InputEvent>) {
        let CommandSource { reader, quit_on_eof } = *self;
        for (i, line) in reader.lines().enumerate() {
            let line = match line {
                Ok(l)  => l,
                Err(e) => {
                    warn!("input read error: {}", e);
                    break;
                }
            };
            match parse_line(i + 1, &line) {
                Ok(Some(event)) => {
                    let quit = event == InputEvent::Quit;
                    if tx.send(event).is_err() || quit {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e)   => warn!("{}", e),
            }
        }
        if quit_on_eof {
            let _ = tx.send(InputEvent::Quit);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;

    #[test]
    fn parses_every_command() {
        assert_eq!(Command::parse("mode dorian").unwrap(), Command::Mode("dorian".into()));
        assert_eq!(Command::parse("up").unwrap(), Command::Octave(1));
        assert_eq!(Command::parse("-").unwrap(), Command::Octave(-1));
        assert_eq!(Command::parse("transpose -5").unwrap(), Command::Transpose(-5));
        assert_eq!(Command::parse("near 450").unwrap(), Command::Near(450.0));
        assert_eq!(Command::parse("FAR 700.5").unwrap(), Command::Far(700.5));
        assert_eq!(Command::parse("channel 10").unwrap(), Command::Channel(10));
        assert_eq!(Command::parse("panic").unwrap(), Command::Panic);
        assert_eq!(Command::parse("status").unwrap(), Command::Status);
    }

    #[test]
    fn rejects_malformed_commands() {
        for bad in ["", "mode", "up 2", "transpose x", "channel 300", "jump"] {
            assert!(
                matches!(Command::parse(bad), Err(AppError::UnknownCommand(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn line_kinds() {
        assert_eq!(parse_line(1, "   ").unwrap(), None);
        assert_eq!(parse_line(1, "# comment").unwrap(), None);
        assert_eq!(parse_line(1, "quit").unwrap(), Some(InputEvent::Quit));
        assert_eq!(
            parse_line(1, r#"[{"x": 10, "y": 20, "distance_mm": 500}]"#).unwrap(),
            Some(InputEvent::Frame(vec![Detection::new(10.0, 20.0, 500.0)]))
        );
        assert_eq!(parse_line(1, "[]").unwrap(), Some(InputEvent::Frame(vec![])));
        assert!(matches!(parse_line(7, "[{"), Err(AppError::FrameParse { line: 7, .. })));
    }

    #[test]
    fn blank_replay_lines_are_empty_frames() {
        let text = "# two hands then nothing\n\
                    [{\"x\":1,\"y\":2,\"distance_mm\":500},{\"x\":600,\"y\":400,\"distance\":640}]\n\
                    \n\
                    []\n";
        let frames = parse_frames(text).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].len(), 2);
        assert_eq!(frames[0][1].distance_mm, 640.0);
        assert!(frames[1].is_empty() && frames[2].is_empty());
    }

    #[test]
    fn replay_error_names_the_line() {
        let err = parse_frames("[]\n\nnot json\n").unwrap_err();
        assert!(matches!(err, AppError::FrameParse { line: 3, .. }));
    }

    #[test]
    fn replay_source_sends_frames_then_quit() {
        let frames = vec![vec![Detection::new(1.0, 1.0, 500.0)], vec![]];
        let (tx, rx) = mpsc::channel();
        spawn_input_source(ReplaySource::new(frames.clone(), 1000, false), tx)
            .join()
            .unwrap();
        let got: Vec<_> = rx.iter().collect();
        assert_eq!(
            got,
            vec![
                InputEvent::Frame(frames[0].clone()),
                InputEvent::Frame(vec![]),
                InputEvent::Quit,
            ]
        );
    }

    #[test]
    fn command_source_skips_bad_lines() {
        let input = Cursor::new("mode major\nbogus\n\nup\nquit\nmode minor\n");
        let (tx, rx) = mpsc::channel();
        spawn_input_source(CommandSource::new(input, false), tx).join().unwrap();
        let got: Vec<_> = rx.iter().collect();
        assert_eq!(
            got,
            vec![
                InputEvent::Command(Command::Mode("major".into())),
                InputEvent::Command(Command::Octave(1)),
                InputEvent::Quit,
            ]
        );
    }

    #[test]
    fn command_source_quit_on_eof_is_optional() {
        let (tx, rx) = mpsc::channel();
        spawn_input_source(CommandSource::new(Cursor::new("status\n"), false), tx)
            .join()
            .unwrap();
        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![InputEvent::Command(Command::Status)]);

        let (tx, rx) = mpsc::channel();
        spawn_input_source(CommandSource::new(Cursor::new("status\n"), true), tx)
            .join()
            .unwrap();
        assert_eq!(rx.iter().last(), Some(InputEvent::Quit));
    }
}
