/// Alert sound played by an external audio player process.
///
/// The first player found on `PATH` is used. Playback is spawned and left to
/// run; a helper thread reaps the child so finished players do not linger.
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::alerting::domain::alert_sound::{AlertSound, AlertSounds, SilentSound};
use crate::shared::constants::{ANIMAL_ALERT_FILE, BIRD_ALERT_FILE, HUMAN_ALERT_FILE};

/// Players tried in order, with the arguments placed before the file path.
const PLAYERS: &[(&str, &[&str])] = &[
    ("paplay", &[]),
    ("aplay", &["-q"]),
    ("afplay", &[]),
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
];

/// A resolved player binary plus its leading arguments.
#[derive(Clone, Debug)]
pub struct AudioPlayer {
    program: PathBuf,
    args: Vec<String>,
}

impl AudioPlayer {
    pub fn new(program: impl Into<PathBuf>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Finds the first known player on `PATH`.
    pub fn detect() -> Option<Self> {
        PLAYERS.iter().find_map(|(name, args)| {
            which::which(name)
                .ok()
                .map(|program| Self::new(program, args))
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

pub struct CommandAlertSound {
    path: PathBuf,
    player: AudioPlayer,
}

impl CommandAlertSound {
    pub fn new(path: impl Into<PathBuf>, player: AudioPlayer) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.into();
        if !path.is_file() {
            return Err(format!("sound file not found: {}", path.display()).into());
        }
        Ok(Self { path, player })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AlertSound for CommandAlertSound {
    fn play(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut child = Command::new(&self.player.program)
            .args(&self.player.args)
            .arg(&self.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }

    fn duration(&self) -> Result<Duration, Box<dyn std::error::Error>> {
        probe_duration(&self.path)
    }
}

/// Reads the container duration with ffmpeg.
pub fn probe_duration(path: &Path) -> Result<Duration, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;
    let ictx = ffmpeg_next::format::input(path)?;
    let micros = ictx.duration();
    if micros < 0 {
        return Err(format!("{} has no known duration", path.display()).into());
    }
    // Container duration is expressed in AV_TIME_BASE (microsecond) units.
    Ok(Duration::from_micros(micros as u64))
}

/// Loads the human/animal/bird sounds from `sounds_dir`.
///
/// Any sound that cannot be loaded, or every sound when no player exists,
/// becomes silent with a warning.
pub fn load_alert_sounds(sounds_dir: &Path) -> AlertSounds {
    let player = AudioPlayer::detect();
    match &player {
        Some(p) => log::debug!("Using audio player {}", p.program().display()),
        None => log::warn!("No audio player found on PATH; alerts will be silent"),
    }

    let load = |file_name: &str| -> Box<dyn AlertSound> {
        let Some(player) = player.clone() else {
            return Box::new(SilentSound);
        };
        match CommandAlertSound::new(sounds_dir.join(file_name), player) {
            Ok(sound) => {
                log::info!("Loaded alert sound {}", sound.path().display());
                Box::new(sound)
            }
            Err(e) => {
                log::warn!("{e}; using a silent alert");
                Box::new(SilentSound)
            }
        }
    };

    AlertSounds {
        human: load(HUMAN_ALERT_FILE),
        animal: load(ANIMAL_ALERT_FILE),
        bird: load(BIRD_ALERT_FILE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 16-bit mono PCM WAV of `millis` of silence.
    fn write_wav(path: &Path, millis: u32) {
        let sample_rate: u32 = 8000;
        let samples = sample_rate * millis / 1000;
        let data_len = samples * 2;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        std::fs::write(path, bytes).unwrap();
    }

    fn noop_player() -> AudioPlayer {
        AudioPlayer::new(which::which("true").unwrap(), &[])
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CommandAlertSound::new(dir.path().join("nope.wav"), noop_player()).is_err());
    }

    #[test]
    fn test_play_spawns_player() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("human_alert.wav");
        write_wav(&path, 200);
        let sound = CommandAlertSound::new(&path, noop_player()).unwrap();
        assert!(sound.play().is_ok());
    }

    #[test]
    fn test_play_with_missing_player_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bird_alert.wav");
        write_wav(&path, 200);
        let sound =
            CommandAlertSound::new(&path, AudioPlayer::new("/nonexistent/player", &[])).unwrap();
        assert!(sound.play().is_err());
    }

    #[test]
    fn test_duration_is_probed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("animal_alert.wav");
        write_wav(&path, 500);
        let sound = CommandAlertSound::new(&path, noop_player()).unwrap();
        assert_relative_eq!(sound.duration().unwrap().as_secs_f64(), 0.5, epsilon = 0.05);
    }

    #[test]
    fn test_load_alert_sounds_falls_back_to_silent() {
        let dir = tempfile::tempdir().unwrap();
        let sounds = load_alert_sounds(dir.path());
        assert_eq!(sounds.human.duration().unwrap(), Duration::ZERO);
        assert!(sounds.bird.play().is_ok());
    }
}
