// Operator transcript
//
// Everything shown to the operator is also appended to a transcript file.
// The file is synced after every write and closed when the scope ends,
// whether the scoped work succeeded or failed.

use log::{debug, warn};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub struct InstallLog {
    console: Box<dyn Write>,
    file: Option<File>,
    path: PathBuf,
}

impl InstallLog {
    /// Open `path` in append mode, mirroring to stdout.
    pub fn open(path: &Path) -> io::Result<Self> {
        Self::open_with_console(path, Box::new(io::stdout()))
    }

    pub fn open_with_console(path: &Path, console: Box<dyn Write>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!(
            "[PHASE: initialization] [STEP: transcript] Transcript opened at {:?}",
            path
        );
        Ok(InstallLog {
            console,
            file: Some(file),
            path: path.to_path_buf(),
        })
    }

    /// Run `work` with a transcript open at `path`; the transcript is closed before returning.
    pub fn scoped<T, E, F>(path: &Path, work: F) -> Result<T, E>
    where
        E: From<io::Error>,
        F: FnOnce(&mut InstallLog) -> Result<T, E>,
    {
        let mut log = InstallLog::open(path)?;
        Self::run_scoped(&mut log, work)
    }

    fn run_scoped<T, E, F>(log: &mut InstallLog, work: F) -> Result<T, E>
    where
        E: From<io::Error>,
        F: FnOnce(&mut InstallLog) -> Result<T, E>,
    {
        let result = work(log);
        let closed = log.close();
        match (result, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(E::from(e)),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!(
                        "[PHASE: shutdown] [STEP: transcript] Failed to close transcript after error: {}",
                        close_err
                    );
                }
                Err(e)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Flush both sides and release the file. Further writes reach the console only.
    pub fn close(&mut self) -> io::Result<()> {
        self.console.flush()?;
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            file.sync_all()?;
            debug!(
                "[PHASE: shutdown] [STEP: transcript] Transcript closed at {:?}",
                self.path
            );
        }
        Ok(())
    }
}

impl Write for InstallLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.console.write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
            file.sync_data()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.console.flush()?;
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
            file.sync_all()?;
        }
        Ok(())
    }
}

impl Drop for InstallLog {
    fn drop(&mut self) {
        if self.file.is_some() {
            if let Err(e) = self.close() {
                warn!(
                    "[PHASE: shutdown] [STEP: transcript] Failed to close transcript on drop: {}",
                    e
                );
            }
        }
    }
}
