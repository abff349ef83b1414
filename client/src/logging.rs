use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleMethod {
    Error,
    Warn,
    Info,
    Debug,
}

fn console_method(level: Level) -> ConsoleMethod {
    match level {
        Level::ERROR => ConsoleMethod::Error,
        Level::WARN => ConsoleMethod::Warn,
        Level::INFO => ConsoleMethod::Info,
        _ => ConsoleMethod::Debug,
    }
}

/// Buffers one formatted event and hands it to the browser console on drop.
pub struct ConsoleWriter {
    method: ConsoleMethod,
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }
        let value = wasm_bindgen::JsValue::from_str(line);
        match self.method {
            ConsoleMethod::Error => web_sys::console::error_1(&value),
            ConsoleMethod::Warn => web_sys::console::warn_1(&value),
            ConsoleMethod::Info => web_sys::console::info_1(&value),
            ConsoleMethod::Debug => web_sys::console::debug_1(&value),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            method: ConsoleMethod::Info,
            buf: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            method: console_method(*meta.level()),
            buf: Vec::new(),
        }
    }
}

fn filter_for(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| "info".into())
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init(directive: &str) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter_for(directive))
        .with_writer(ConsoleMakeWriter)
        .without_time()
        .with_ansi(false)
        .try_init();
    if installed.is_ok() {
        tracing::debug!(directive, "logging initialised");
    }
}
