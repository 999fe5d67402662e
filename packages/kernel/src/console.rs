//! Where PRINT output and fault diagnostics go.

/// Text sink for running programs.
pub trait Console {
    fn write(&mut self, text: &str);

    fn write_line(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }
}

impl<T: Console + ?Sized> Console for &mut T {
    fn write(&mut self, text: &str) {
        (**self).write(text)
    }
}

/// A console that collects output until the host drains it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferConsole {
    buf: String,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> &str {
        &self.buf
    }

    /// Take the buffered output, leaving the console empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buf)
    }
}

impl Console for BufferConsole {
    fn write(&mut self, text: &str) {
        self.buf.push_str(text);
    }
}
