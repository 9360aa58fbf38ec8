/// Character classes used by the paste-text grammars.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn is_symbol_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// The textual spelling of a number, before conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberText<'a> {
    pub text: &'a str,
    /// Digits after the decimal point, `None` when there is no point at all.
    pub fraction_digits: Option<usize>,
}

/// A backtrackable cursor over the source text.
///
/// Unlike a tokenizing lexer, the paste format is context sensitive (the same characters are a
/// symbol in one place and part of a path or GUID in another), so grammars pull exactly the
/// lexeme they expect and rewind on failure.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.input.len());
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    pub fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Consumes `\s*` and returns how many bytes were skipped.
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.position;
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.advance();
        }
        self.position - start
    }

    /// Consumes spaces and tabs, never a line break.
    pub fn skip_inline_whitespace(&mut self) -> usize {
        let start = self.position;
        while let Some(c) = self.peek() {
            if c != ' ' && c != '\t' {
                break;
            }
            self.advance();
        }
        self.position - start
    }

    pub fn eat_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn eat_str(&mut self, expected: &str) -> bool {
        if self.rest().starts_with(expected) {
            self.position += expected.len();
            true
        } else {
            false
        }
    }

    pub fn eat_str_ignore_case(&mut self, expected: &str) -> bool {
        let rest = self.rest();
        match rest.get(..expected.len()) {
            Some(head) if head.eq_ignore_ascii_case(expected) => {
                self.position += expected.len();
                true
            }
            _ => false,
        }
    }

    pub fn next_is_word_char(&self) -> bool {
        self.peek().is_some_and(is_word_char)
    }

    /// `[A-Za-z_]\w*`
    pub fn read_symbol(&mut self) -> Option<&'a str> {
        let start = self.position;
        if !self.peek().is_some_and(is_symbol_start) {
            return None;
        }
        self.advance();
        self.read_while(is_word_char);
        Some(&self.input[start..self.position])
    }

    /// `\w*`, possibly empty.
    pub fn read_word_run(&mut self) -> &'a str {
        self.read_while(is_word_char)
    }

    pub fn read_digits(&mut self) -> &'a str {
        self.read_while(|c| c.is_ascii_digit())
    }

    pub fn read_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let start = self.position;
        while let Some(c) = self.peek() {
            if !predicate(c) {
                break;
            }
            self.advance();
        }
        &self.input[start..self.position]
    }

    /// `[+-]?\d+(\.\d+)?`, rewinding when no digits follow the sign.
    pub fn read_number_text(&mut self) -> Option<NumberText<'a>> {
        let start = self.position;
        if !self.eat_char('+') {
            self.eat_char('-');
        }
        if self.read_digits().is_empty() {
            self.position = start;
            return None;
        }
        let mut fraction_digits = None;
        let before_point = self.position;
        if self.eat_char('.') {
            let fraction = self.read_digits();
            if fraction.is_empty() {
                self.position = before_point;
            } else {
                fraction_digits = Some(fraction.len());
            }
        }
        Some(NumberText {
            text: &self.input[start..self.position],
            fraction_digits,
        })
    }

    /// Reads `"` InsideString `"` and returns the still-escaped content between the quotes.
    pub fn read_quoted(&mut self) -> Option<&'a str> {
        self.read_delimited('"')
    }

    /// Reads `'` InsideSingleQuotedString `'`.
    pub fn read_single_quoted(&mut self) -> Option<&'a str> {
        self.read_delimited('\'')
    }

    fn read_delimited(&mut self, quote: char) -> Option<&'a str> {
        let start = self.position;
        if !self.eat_char(quote) {
            return None;
        }
        let content_start = self.position;
        while let Some(c) = self.advance() {
            if c == quote {
                return Some(&self.input[content_start..self.position - quote.len_utf8()]);
            }
            if c == '\\' && self.advance().is_none() {
                break;
            }
        }
        // Unclosed
        self.position = start;
        None
    }
}
