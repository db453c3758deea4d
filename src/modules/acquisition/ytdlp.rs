use crate::core::error::AcquisitionError;
use crate::core::traits::Acquirer;
use crate::modules::acquisition::AcquisitionProgress;
use crate::utils::remove_quietly;
use crossbeam_channel::{RecvTimeoutError, unbounded};
use std::collections::VecDeque;
use std::collections::hash_map::DefaultHasher;
use std::ffi::OsString;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Output lines kept for the error message of a failed tool run.
const ERROR_TAIL_LINES: usize = 5;

const CANCEL_POLL: Duration = Duration::from_millis(100);

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Downloads the best audio stream with `yt-dlp` as mp3, then converts it to
/// 44.1 kHz stereo wav with `ffmpeg`. Tool names are configurable.
pub struct YtDlpAcquirer {
    downloader: String,
    transcoder: String,
    cache_dir: PathBuf,
}

/// Progress window of one tool run, in percent.
#[derive(Debug, Clone, Copy)]
struct Phase {
    tool_label: &'static str,
    min: u8,
    max: u8,
}

const DOWNLOAD: Phase = Phase {
    tool_label: "download",
    min: 0,
    max: 50,
};

const CONVERT: Phase = Phase {
    tool_label: "conversion",
    min: 50,
    max: 100,
};

impl Phase {
    /// Each output line moves progress by two points, never past `max`.
    fn percent(self, lines: usize) -> u8 {
        let span = usize::from(self.max - self.min);
        self.min + lines.saturating_mul(2).min(span) as u8
    }
}

impl YtDlpAcquirer {
    pub fn new(
        downloader: impl Into<String>,
        transcoder: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            downloader: downloader.into(),
            transcoder: transcoder.into(),
            cache_dir: cache_dir.into(),
        }
    }

    fn download_args(url: &str, mp3: &Path) -> Vec<OsString> {
        vec![
            "-f".into(),
            "bestaudio".into(),
            "--extract-audio".into(),
            "--audio-format".into(),
            "mp3".into(),
            "-o".into(),
            mp3.into(),
            url.into(),
        ]
    }

    fn convert_args(mp3: &Path, wav: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-i".into(),
            mp3.into(),
            "-ar".into(),
            "44100".into(),
            "-ac".into(),
            "2".into(),
            wav.into(),
        ]
    }

    /// Unique file stem per request; the URL hash keeps names recognizable.
    fn output_stem(url: &str) -> String {
        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!(
            "aurora_{:016x}_{}_{}",
            hasher.finish(),
            std::process::id(),
            sequence
        )
    }

    fn download_and_convert(
        &self,
        url: &str,
        mp3: &Path,
        wav: &Path,
        cancel: &AtomicBool,
        progress: &mut dyn FnMut(AcquisitionProgress),
    ) -> Result<(), AcquisitionError> {
        let args = Self::download_args(url, mp3);
        self.run_phase(&self.downloader, &args, mp3, DOWNLOAD, cancel, progress)?;

        if cancel.load(Ordering::Relaxed) {
            return Err(AcquisitionError::Cancelled);
        }
        progress(AcquisitionProgress::new(CONVERT.min, "Converting to WAV..."));

        let args = Self::convert_args(mp3, wav);
        self.run_phase(&self.transcoder, &args, wav, CONVERT, cancel, progress)
    }

    fn run_phase(
        &self,
        tool: &str,
        args: &[OsString],
        output: &Path,
        phase: Phase,
        cancel: &AtomicBool,
        progress: &mut dyn FnMut(AcquisitionProgress),
    ) -> Result<(), AcquisitionError> {
        debug!(tool, ?args, "running {}", phase.tool_label);
        let mut child = Command::new(tool)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AcquisitionError::Spawn {
                tool: tool.to_string(),
                source,
            })?;

        // Both streams feed one line channel, like a merged stderr.
        let (line_tx, line_rx) = unbounded::<String>();
        let mut readers = Vec::new();
        let streams: [Option<Box<dyn Read + Send>>; 2] = [
            child.stdout.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
            child.stderr.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
        ];
        for stream in streams.into_iter().flatten() {
            let tx = line_tx.clone();
            readers.push(thread::spawn(move || {
                for chunk in BufReader::new(stream).split(b'\n') {
                    let Ok(chunk) = chunk else { break };
                    if tx.send(String::from_utf8_lossy(&chunk).into_owned()).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(line_tx);

        let mut lines = 0usize;
        let mut tail: VecDeque<String> = VecDeque::with_capacity(ERROR_TAIL_LINES);
        loop {
            match line_rx.recv_timeout(CANCEL_POLL) {
                Ok(line) => {
                    let line = line.trim().to_string();
                    lines += 1;
                    progress(AcquisitionProgress::new(phase.percent(lines), line.clone()));
                    if tail.len() == ERROR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if cancel.load(Ordering::Relaxed) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AcquisitionError::Cancelled);
            }
        }

        for reader in readers {
            let _ = reader.join();
        }
        let status = child.wait()?;
        if !status.success() {
            return Err(AcquisitionError::Failed {
                tool: tool.to_string(),
                status: status.to_string(),
                detail: Vec::from(tail).join("\n"),
            });
        }

        let produced = fs::metadata(output).map(|m| m.len() > 0).unwrap_or(false);
        if !produced {
            return Err(AcquisitionError::EmptyOutput {
                tool: tool.to_string(),
                path: output.to_path_buf(),
            });
        }
        Ok(())
    }
}

impl Acquirer for YtDlpAcquirer {
    fn acquire(
        &self,
        url: &str,
        cancel: &AtomicBool,
        progress: &mut dyn FnMut(AcquisitionProgress),
    ) -> Result<PathBuf, AcquisitionError> {
        fs::create_dir_all(&self.cache_dir)?;
        let stem = Self::output_stem(url);
        let mp3 = self.cache_dir.join(format!("{stem}.mp3"));
        let wav = self.cache_dir.join(format!("{stem}.wav"));

        if cancel.load(Ordering::Relaxed) {
            return Err(AcquisitionError::Cancelled);
        }
        progress(AcquisitionProgress::new(DOWNLOAD.min, "Starting download..."));

        let result = self.download_and_convert(url, &mp3, &wav, cancel, progress);

        remove_quietly(&mp3);
        match result {
            Ok(()) => {
                progress(AcquisitionProgress::new(CONVERT.max, "Done"));
                Ok(wav)
            }
            Err(e) => {
                remove_quietly(&wav);
                Err(e)
            }
        }
    }
}
