use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing_contextual::{Format, LevelHandle, LoggerConfig, Severity};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;

/// In-memory writer that captures rendered log lines.
#[derive(Clone, Debug, Default)]
pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    pub fn output(&self) -> String {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer).to_string()
    }

    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.output()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .map_err(|_| io::Error::other("capture buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// JSON, context-aware dispatcher writing into a fresh capture buffer.
#[allow(dead_code)]
pub fn json_dispatch(level: Severity) -> (tracing::Dispatch, LevelHandle, CaptureWriter) {
    let writer = CaptureWriter::default();
    let (layer, handle) = LoggerConfig {
        format: Format::Json,
        writer: BoxMakeWriter::new(writer.clone()),
        level,
        context_aware: true,
        ..LoggerConfig::default()
    }
    .build();
    let dispatch = tracing::Dispatch::new(tracing_subscriber::registry().with(layer));
    (dispatch, handle, writer)
}
