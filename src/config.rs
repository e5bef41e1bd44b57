/// Settings for a [`Shell`](crate::Shell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Prompt shown by the interactive editor.
    pub prompt: String,
    /// Text placed before an error when it is printed because no error
    /// listener is subscribed.
    pub error_prefix: String,
    /// Catch panicking handlers and report them as errors instead of
    /// unwinding out of the loop.
    pub catch_panics: bool,
}

impl ShellConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_error_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.error_prefix = prefix.into();
        self
    }

    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            error_prefix: "Error in handling command: ".to_string(),
            catch_panics: true,
        }
    }
}
