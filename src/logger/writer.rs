//! Rotating file writer plugged into `tracing_subscriber::fmt`.

use crate::logger::config::FileConfig;
use crate::logger::rotation::RotationManager;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

pub struct RotatingFileWriter {
    state: Arc<Mutex<WriterState>>,
    path: PathBuf,
}

struct WriterState {
    file: BufWriter<File>,
    current_size: u64,
    rotation: RotationManager,
    /// Set after an unrecoverable write failure; output goes to stderr.
    fallback_mode: bool,
}

impl RotatingFileWriter {
    pub fn new(config: &FileConfig) -> anyhow::Result<Self> {
        if let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = open_log_file(&config.path, config.append)?;
        let current_size = if config.append {
            std::fs::metadata(&config.path).map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            state: Arc::new(Mutex::new(WriterState {
                file,
                current_size,
                rotation: RotationManager::new(config.max_size, config.max_files),
                fallback_mode: false,
            })),
            path: config.path.clone(),
        })
    }

    pub fn is_in_fallback_mode(&self) -> bool {
        self.state.lock().map(|s| s.fallback_mode).unwrap_or(false)
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriterGuard {
            state: self.state.clone(),
            path: self.path.clone(),
        }
    }
}

pub struct RotatingWriterGuard {
    state: Arc<Mutex<WriterState>>,
    path: PathBuf,
}

impl Write for RotatingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire writer lock"))?;

        if state.fallback_mode {
            return io::stderr().write(buf);
        }

        if state.rotation.should_rotate(state.current_size) {
            if let Err(e) = state.file.flush() {
                return self.handle_write_error(&mut state, buf, e);
            }
            if let Err(e) = state.rotation.rotate(&self.path) {
                return self.handle_write_error(&mut state, buf, io::Error::other(e.to_string()));
            }
            match open_log_file(&self.path, false) {
                Ok(file) => {
                    state.file = file;
                    state.current_size = 0;
                }
                Err(e) => return self.handle_write_error(&mut state, buf, e),
            }
        }

        match state.file.write(buf) {
            Ok(written) => {
                state.current_size += written as u64;
                Ok(written)
            }
            Err(e) => self.handle_write_error(&mut state, buf, e),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire writer lock"))?;

        if state.fallback_mode {
            return io::stderr().flush();
        }
        state.file.flush()
    }
}

impl RotatingWriterGuard {
    /// On a full disk, prune rotated files and retry once; otherwise switch to stderr.
    fn handle_write_error(
        &self,
        state: &mut WriterState,
        buf: &[u8],
        error: io::Error,
    ) -> io::Result<usize> {
        if is_disk_space_error(&error)
            && state.rotation.force_cleanup(&self.path).is_ok()
            && let Ok(file) = open_log_file(&self.path, true)
        {
            state.file = file;
            state.current_size = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
            if let Ok(written) = state.file.write(buf) {
                state.current_size += written as u64;
                return Ok(written);
            }
        }

        state.fallback_mode = true;
        eprintln!("[Logger] File write failed, falling back to stderr: {}", error);
        io::stderr().write(buf)
    }
}

impl Drop for RotatingWriterGuard {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            let _ = state.file.flush();
        }
    }
}

#[cfg(unix)]
fn is_disk_space_error(error: &io::Error) -> bool {
    // ENOSPC, EDQUOT
    matches!(error.raw_os_error(), Some(28) | Some(122)) || error.kind() == io::ErrorKind::StorageFull
}

#[cfg(not(unix))]
fn is_disk_space_error(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::StorageFull
}

fn open_log_file(path: &Path, append: bool) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;

    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn file_config(path: PathBuf, max_size: u64) -> FileConfig {
        FileConfig {
            enabled: true,
            path,
            append: true,
            max_size,
            max_files: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_writes_reach_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("scheme.log");
        let writer = RotatingFileWriter::new(&file_config(path.clone(), 1024)).unwrap();

        {
            let mut guard = writer.make_writer();
            guard.write_all(b"hello\n").unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        assert!(!writer.is_in_fallback_mode());
    }

    #[test]
    fn test_rotates_when_full() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scheme.log");
        let writer = RotatingFileWriter::new(&file_config(path.clone(), 4)).unwrap();

        {
            let mut guard = writer.make_writer();
            guard.write_all(b"first\n").unwrap();
            guard.write_all(b"second\n").unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 2);
    }
}
