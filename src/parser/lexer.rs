//! Line tokenizer.
//!
//! Splits one line into words and comments. Number parsing happens in
//! [`super::ast`], so a malformed value still produces a token here.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// G, M or T word selecting an operation
    Command,
    /// Any other letter word, such as `X10` or `S255`
    Parameter,
    /// `; ...` to end of line, or `( ... )`
    Comment,
    /// Run of characters that fits none of the above
    Stray,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

/// Cursor over the bytes of a single line.
struct Scanner<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.line[self.pos..].chars().next()
    }

    /// Advances while `keep` holds and returns the consumed slice.
    fn take_while(&mut self, start: usize, keep: impl Fn(char) -> bool) -> &'a str {
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.line[start..self.pos]
    }

    fn word(&mut self, start: usize) -> Token {
        let text = self.take_while(start, |c| {
            c.is_ascii_digit() || matches!(c, '.' | '-' | '+')
        });
        let kind = if is_command(text) {
            TokenKind::Command
        } else {
            TokenKind::Parameter
        };
        Token::new(kind, text)
    }

    fn parenthetical(&mut self, start: usize) -> Token {
        let end = self.line[self.pos..]
            .find(')')
            .map_or(self.line.len(), |offset| self.pos + offset + 1);
        self.pos = end;
        Token::new(TokenKind::Comment, &self.line[start..end])
    }

    fn stray(&mut self, start: usize) -> Token {
        let text = self.take_while(start, |c| !(c.is_whitespace() || c == ';' || c == '('));
        Token::new(TokenKind::Stray, text)
    }
}

/// Tokenize one line. A `;` comment and a `*` checksum both end it.
pub fn tokenize_line(line: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(line);
    let mut tokens = Vec::new();

    while let Some(c) = scanner.peek() {
        let start = scanner.pos;
        scanner.pos += c.len_utf8();

        let token = match c {
            // `%` only delimits a program on tape
            '%' => continue,
            c if c.is_whitespace() => continue,
            '*' => break,
            ';' => {
                tokens.push(Token::new(TokenKind::Comment, &line[start..]));
                break;
            }
            '(' => scanner.parenthetical(start),
            // One letter plus its number, so "G1X10" splits in two
            c if c.is_ascii_alphabetic() => scanner.word(start),
            _ => scanner.stray(start),
        };
        tokens.push(token);
    }

    tokens
}

/// G/M/T words select an operation; everything else is a parameter.
fn is_command(text: &str) -> bool {
    text.starts_with(['G', 'g', 'M', 'm', 'T', 't'])
}
