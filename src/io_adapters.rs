use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// A line-oriented text source the shell reads commands from.
pub trait LineSource {
    /// Blocks until one line is available.
    ///
    /// Returns `Ok(None)` once the source is permanently exhausted. The line
    /// terminator is not included in the returned text.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

impl<T: LineSource + ?Sized> LineSource for Box<T> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        (**self).read_line()
    }
}

/// Reads lines from any buffered reader: a pipe, a file, or an in-memory script.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl ReaderSource<io::StdinLock<'static>> {
    /// Source over the process's standard input.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

/// Interactive terminal input with line editing.
///
/// Ctrl-C abandons the line being typed (an empty line is returned), Ctrl-D
/// ends the input. Entered lines are not kept in any history.
pub struct EditorSource {
    editor: DefaultEditor,
    prompt: String,
}

impl EditorSource {
    pub fn new(prompt: impl Into<String>) -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            prompt: prompt.into(),
        })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        map_readline(self.editor.readline(&self.prompt))
    }
}

fn map_readline(result: rustyline::Result<String>) -> io::Result<Option<String>> {
    match result {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
        Err(ReadlineError::Eof) => Ok(None),
        Err(ReadlineError::Io(err)) => Err(err),
        Err(err) => Err(io::Error::other(err.to_string())),
    }
}

/// Console channel shared between the loop's default error output and builtins.
pub type SharedOutput = Arc<Mutex<Box<dyn Write + Send>>>;

/// Wraps `writer` as a [`SharedOutput`].
pub fn shared_output(writer: impl Write + Send + 'static) -> SharedOutput {
    Arc::new(Mutex::new(Box::new(writer)))
}

/// Writes one full line to `output` and flushes it.
pub fn write_line(output: &SharedOutput, text: &str) -> io::Result<()> {
    let mut out = output.lock().unwrap_or_else(PoisonError::into_inner);
    writeln!(out, "{text}")?;
    out.flush()
}

/// In-memory writer whose contents stay readable after it is boxed into a
/// [`SharedOutput`]. Useful for capturing console output in tests.
#[derive(Clone, Default)]
pub struct MemWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
