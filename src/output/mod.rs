use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow, bail};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Numbered PNG files under the output directory.
    Frames,
    /// Raw RGBA piped to an ffmpeg child process. Falls back to the
    /// PNG sequence when ffmpeg cannot be spawned.
    Mp4,
}

enum WriterCommand {
    Frame { index: usize, rgba: Vec<u8> },
    Finish,
}

/// Background frame encoder. Rendering continues while PNG compression
/// or the ffmpeg pipe runs on this thread.
pub struct FrameWriter {
    tx: Sender<WriterCommand>,
    handle: Option<JoinHandle<()>>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl FrameWriter {
    pub fn spawn(
        format: OutputFormat,
        out_dir: PathBuf,
        scene_name: &str,
        width: u32,
        height: u32,
        frame_rate: u32,
    ) -> Result<Self> {
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("creating output directory {}", out_dir.display()))?;

        let (tx, rx) = channel::bounded::<WriterCommand>(4);
        let last_error = Arc::new(Mutex::new(None));
        let last_error_clone = Arc::clone(&last_error);

        let mut sink = Sink::open(format, &out_dir, scene_name, width, height, frame_rate);
        let handle = thread::spawn(move || {
            writer_thread(rx, &mut sink, width, height, last_error_clone);
        });

        Ok(Self {
            tx,
            handle: Some(handle),
            last_error,
        })
    }

    pub fn push_frame(&self, index: usize, rgba: Vec<u8>) -> Result<()> {
        if self.tx.send(WriterCommand::Frame { index, rgba }).is_err() {
            let detail = self.last_error.lock().clone();
            bail!(
                "frame writer stopped: {}",
                detail.unwrap_or_else(|| "unknown error".into())
            );
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        let _ = self.tx.send(WriterCommand::Finish);
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| anyhow!("frame writer panicked"))?;
        }
        if let Some(error) = self.last_error.lock().take() {
            bail!("frame writing failed: {error}");
        }
        Ok(())
    }
}

impl Drop for FrameWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(WriterCommand::Finish);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

enum Sink {
    Png {
        dir: PathBuf,
    },
    Ffmpeg {
        child: Child,
        stdin: Option<ChildStdin>,
    },
}

impl Sink {
    fn open(
        format: OutputFormat,
        out_dir: &Path,
        scene_name: &str,
        width: u32,
        height: u32,
        frame_rate: u32,
    ) -> Sink {
        let png = Sink::Png {
            dir: out_dir.to_path_buf(),
        };
        if format == OutputFormat::Frames {
            return png;
        }

        let out_file = out_dir.join(format!("{scene_name}.mp4"));
        let spawned = Command::new("ffmpeg")
            .args(ffmpeg_args(width, height, frame_rate, &out_file))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn();

        match spawned {
            Ok(mut child) => {
                let stdin = child.stdin.take();
                log::info!("encoding {} via ffmpeg", out_file.display());
                Sink::Ffmpeg { child, stdin }
            }
            Err(e) => {
                log::warn!("ffmpeg unavailable ({e}); falling back to PNG frames");
                png
            }
        }
    }

    fn write_frame(&mut self, index: usize, rgba: &[u8], width: u32, height: u32) -> Result<()> {
        match self {
            Sink::Png { dir } => {
                let image = image::RgbaImage::from_raw(width, height, rgba.to_vec())
                    .ok_or_else(|| anyhow!("frame {index} byte count mismatch"))?;
                let path = dir.join(format!("frame_{index:04}.png"));
                image
                    .save(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            Sink::Ffmpeg { stdin, .. } => {
                stdin
                    .as_mut()
                    .ok_or_else(|| anyhow!("ffmpeg stdin already closed"))?
                    .write_all(rgba)
                    .context("writing frame to ffmpeg")?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Sink::Ffmpeg { child, stdin } = self {
            drop(stdin.take());
            let status = child.wait().context("waiting for ffmpeg")?;
            if !status.success() {
                bail!("ffmpeg exited with {status}");
            }
        }
        Ok(())
    }
}

fn writer_thread(
    rx: Receiver<WriterCommand>,
    sink: &mut Sink,
    width: u32,
    height: u32,
    last_error: Arc<Mutex<Option<String>>>,
) {
    let mut failed = false;
    loop {
        let cmd = match rx.recv() {
            Ok(c) => c,
            Err(_) => break,
        };

        match cmd {
            WriterCommand::Frame { index, rgba } => {
                if failed {
                    continue;
                }
                if let Err(e) = sink.write_frame(index, &rgba, width, height) {
                    *last_error.lock() = Some(e.to_string());
                    failed = true;
                }
            }
            WriterCommand::Finish => break,
        }
    }

    if let Err(e) = sink.finish() {
        let mut slot = last_error.lock();
        if slot.is_none() {
            *slot = Some(e.to_string());
        }
    }
}

fn ffmpeg_args(width: u32, height: u32, frame_rate: u32, out_file: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgba".into(),
        "-s".into(),
        format!("{width}x{height}"),
        "-r".into(),
        frame_rate.to_string(),
        "-i".into(),
        "-".into(),
        "-an".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        out_file.display().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ffmpeg_args_describe_raw_rgba_input() {
        let args = ffmpeg_args(1280, 720, 30, Path::new("out/gaussian.mp4"));
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo"));
        assert!(joined.contains("-pix_fmt rgba"));
        assert!(joined.contains("-s 1280x720"));
        assert!(joined.contains("-r 30"));
        assert!(joined.ends_with("out/gaussian.mp4"));
    }

    #[test]
    fn png_writer_round_trips_to_disk() {
        let dir = std::env::temp_dir().join("surfanim-writer-test");
        let _ = std::fs::remove_dir_all(&dir);
        let writer = FrameWriter::spawn(OutputFormat::Frames, dir.clone(), "test", 4, 4, 15)
            .expect("spawn writer");
        writer.push_frame(0, vec![255u8; 4 * 4 * 4]).expect("push");
        writer.finish().expect("finish");
        assert!(dir.join("frame_0000.png").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn mismatched_frame_size_is_reported() {
        let dir = std::env::temp_dir().join("surfanim-writer-badframe");
        let _ = std::fs::remove_dir_all(&dir);
        let writer = FrameWriter::spawn(OutputFormat::Frames, dir.clone(), "test", 4, 4, 15)
            .expect("spawn writer");
        let _ = writer.push_frame(0, vec![0u8; 3]);
        assert!(writer.finish().is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
