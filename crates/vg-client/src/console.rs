use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Serialized access to the user's terminal. Concurrent jobs share one
/// `Console` so their lines never interleave mid-line.
#[derive(Clone)]
pub struct Console {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self { sink: Arc::new(Mutex::new(Box::new(sink))) }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Discards everything; used when output is not wanted.
    pub fn silent() -> Self {
        Self::new(io::sink())
    }

    /// Console writing into a shared buffer, readable through the returned
    /// handle.
    pub fn capture() -> (Self, Captured) {
        let buf = Captured::default();
        (Self::new(buf.clone()), buf)
    }

    pub fn println(&self, line: impl Display) {
        let mut sink = self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Terminal output is best effort.
        let _ = writeln!(sink, "{line}");
        let _ = sink.flush();
    }

    /// Handle that prefixes every line with the job label.
    pub fn job(&self, index: usize) -> JobConsole {
        JobConsole { console: self.clone(), prefix: format!("[job {index}]") }
    }
}

#[derive(Clone)]
pub struct JobConsole {
    console: Console,
    prefix: String,
}

impl JobConsole {
    pub fn say(&self, msg: impl Display) {
        self.console.println(format_args!("{} {msg}", self.prefix));
    }
}

#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
