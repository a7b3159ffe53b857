use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::Level;

use crate::log_buffer::{LogWriter, global_log};

static LOG_FILE: OnceLock<Arc<Mutex<File>>> = OnceLock::new();

/// Fans each log record out to the in-memory log and the log file; stderr
/// only gets it when neither is installed.
pub struct DelegatingWriter {
    buffer: Option<LogWriter>,
    file: Option<Arc<Mutex<File>>>,
    stderr: Option<io::Stderr>,
}

impl DelegatingWriter {
    fn new() -> Self {
        let buffer = global_log().map(|handle| handle.writer());
        let file = LOG_FILE.get().cloned();
        let stderr = (buffer.is_none() && file.is_none()).then(io::stderr);
        DelegatingWriter { buffer, file, stderr }
    }
}

impl Write for DelegatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(w) = &mut self.buffer {
            w.write_all(buf)?;
        }
        if let Some(f) = &self.file {
            f.lock().write_all(buf)?;
        }
        if let Some(s) = &mut self.stderr {
            s.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(w) = &mut self.buffer {
            w.flush()?;
        }
        if let Some(f) = &self.file {
            f.lock().flush()?;
        }
        if let Some(s) = &mut self.stderr {
            s.flush()?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubscriberMakeWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SubscriberMakeWriter {
    type Writer = DelegatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DelegatingWriter::new()
    }
}

/// Appends log output to `path` as well.
/// Only the first call has any effect.
pub fn set_log_file(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = LOG_FILE.set(Arc::new(Mutex::new(file)));
    Ok(())
}

/// Initialize the tracing subscriber at `level`. Safe to call multiple
/// times; later calls are no-ops for the global subscriber.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(SubscriberMakeWriter)
        .with_target(false)
        .with_thread_names(true)
        .try_init();
}

pub fn init_default() {
    init(Level::DEBUG);
}
