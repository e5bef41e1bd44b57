//! Splits a console line into tokens, honoring double quotes and backslash escapes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Unquoted,
    Quoted,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    escaping: bool,
    buffer: String,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Unquoted,
            escaping: false,
            buffer: String::new(),
        }
    }

    /// Runs the scan to the end of input and returns every token in order.
    ///
    /// There is no failure mode: an unterminated quote or a dangling backslash
    /// simply ends the scan, and the accumulated text becomes the last token.
    fn make_tokens(&mut self) -> Vec<String> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            if self.escaping {
                self.buffer.push(ch);
                self.escaping = false;
                continue;
            }

            match (self.state, ch) {
                (_, '\\') => self.escaping = true,
                (LexingState::Unquoted, '"') => self.state = LexingState::Quoted,
                (LexingState::Quoted, '"') => {
                    // A closing quote always ends the token, even when more
                    // text follows before the next space.
                    self.state = LexingState::Unquoted;
                    self.flush(&mut out);
                }
                (LexingState::Unquoted, ' ') => self.flush(&mut out),
                (_, c) => self.buffer.push(c),
            }
        }

        self.flush(&mut out);
        out
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn flush(&mut self, out: &mut Vec<String>) {
        if !self.buffer.is_empty() {
            out.push(std::mem::take(&mut self.buffer));
        }
    }
}

/// Tokenizes one input line.
///
/// Rules, applied left to right:
/// * a backslash makes the next character literal, whatever it is;
/// * `"` opens a quoted run in which spaces are content; the closing `"`
///   terminates the current token;
/// * an unquoted space separates tokens, and runs of spaces collapse;
/// * empty tokens are never produced.
///
/// ```
/// use console_commands::tokenize;
/// assert_eq!(tokenize(r#"say "hello world" twice"#), ["say", "hello world", "twice"]);
/// assert!(tokenize("   ").is_empty());
/// ```
pub fn split_into_tokens(line: &str) -> Vec<String> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_tokens()
}
