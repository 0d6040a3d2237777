//! SQL Scanner - Turns SimpleSQL text into a stream of positioned tokens

use std::{fmt::Display, iter::Peekable};

use tracing::warn;

/// Character that ends the input just like physical end of input does
pub const END_OF_STATEMENT: char = '$';

/// SimpleSQL reserved keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Asc,
    Avg,
    By,
    Count,
    Delete,
    Desc,
    From,
    Inner,
    Insert,
    Intersect,
    Into,
    Join,
    Like,
    Limit,
    Max,
    Min,
    On,
    Order,
    Select,
    Set,
    Sum,
    Union,
    Update,
    Values,
    Where,
}

/// Keyword table in alphabetical order; entry `i` is the keyword with discriminant `i`.
const KEYWORDS: [(&str, Keyword); 25] = [
    ("asc", Keyword::Asc),
    ("avg", Keyword::Avg),
    ("by", Keyword::By),
    ("count", Keyword::Count),
    ("delete", Keyword::Delete),
    ("desc", Keyword::Desc),
    ("from", Keyword::From),
    ("inner", Keyword::Inner),
    ("insert", Keyword::Insert),
    ("intersect", Keyword::Intersect),
    ("into", Keyword::Into),
    ("join", Keyword::Join),
    ("like", Keyword::Like),
    ("limit", Keyword::Limit),
    ("max", Keyword::Max),
    ("min", Keyword::Min),
    ("on", Keyword::On),
    ("order", Keyword::Order),
    ("select", Keyword::Select),
    ("set", Keyword::Set),
    ("sum", Keyword::Sum),
    ("union", Keyword::Union),
    ("update", Keyword::Update),
    ("values", Keyword::Values),
    ("where", Keyword::Where),
];

impl Keyword {
    /// Looks up a lexeme in the keyword table (case-insensitive)
    pub fn from_str(ident: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(word, _)| word.eq_ignore_ascii_case(ident))
            .map(|(_, keyword)| *keyword)
    }

    /// Returns the uppercase spelling of the keyword
    pub fn to_str(&self) -> &'static str {
        match self {
            Keyword::Asc => "ASC",
            Keyword::Avg => "AVG",
            Keyword::By => "BY",
            Keyword::Count => "COUNT",
            Keyword::Delete => "DELETE",
            Keyword::Desc => "DESC",
            Keyword::From => "FROM",
            Keyword::Inner => "INNER",
            Keyword::Insert => "INSERT",
            Keyword::Intersect => "INTERSECT",
            Keyword::Into => "INTO",
            Keyword::Join => "JOIN",
            Keyword::Like => "LIKE",
            Keyword::Limit => "LIMIT",
            Keyword::Max => "MAX",
            Keyword::Min => "MIN",
            Keyword::On => "ON",
            Keyword::Order => "ORDER",
            Keyword::Select => "SELECT",
            Keyword::Set => "SET",
            Keyword::Sum => "SUM",
            Keyword::Union => "UNION",
            Keyword::Update => "UPDATE",
            Keyword::Values => "VALUES",
            Keyword::Where => "WHERE",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Kind tag of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input or the `$` sentinel
    Eos,
    Semicolon,
    LeftParen,
    RightParen,
    Asterisk,
    Hash,
    Equal,
    Comma,
    Dot,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    NotEqual,
    /// Quoted string literal, quotes stripped
    StringLiteral,
    IntLiteral,
    RealLiteral,
    /// Table or column name
    Identifier,
    Keyword(Keyword),
    /// Character that starts no token
    Unknown,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TokenKind::Eos => "end of statement",
            TokenKind::Semicolon => ";",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Asterisk => "*",
            TokenKind::Hash => "#",
            TokenKind::Equal => "=",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::NotEqual => "<>",
            TokenKind::StringLiteral => "string literal",
            TokenKind::IntLiteral => "integer literal",
            TokenKind::RealLiteral => "real literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Keyword(keyword) => keyword.to_str(),
            TokenKind::Unknown => "unknown",
        })
    }
}

/// A single lexical token with the position where it started
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact lexeme; quotes stripped for strings, sign kept for numbers
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' @ ({}, {})", self.text, self.line, self.column)
    }
}

/// Position of the next unconsumed character of one input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerState {
    pub line: usize,
    pub column: usize,
}

impl ScannerState {
    pub fn new() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl Default for ScannerState {
    fn default() -> Self {
        Self::new()
    }
}

/// SimpleSQL lexical scanner
///
/// Holds only the character stream; line and column bookkeeping is passed in on every
/// call so that the caller owns it and can reset it per input stream.
pub struct Scanner<I: Iterator<Item = char>> {
    iter: Peekable<I>,
}

impl<I: Iterator<Item = char>> Scanner<I> {
    /// Creates a scanner over the given characters
    pub fn new(input: I) -> Self {
        Self {
            iter: input.peekable(),
        }
    }

    /// Turns the scanner into an iterator that stops after the first EOS token
    pub fn into_tokens(self) -> Tokens<I> {
        Tokens {
            scanner: self,
            state: ScannerState::new(),
            done: false,
        }
    }

    /// Scans and returns the next token, advancing `state` past it.
    ///
    /// Malformed input never fails: it yields an `Unknown` token, or a best-effort
    /// literal plus a warning.
    pub fn next_token(&mut self, state: &mut ScannerState) -> Token {
        loop {
            let Some(c) = self.iter.next() else {
                return Self::token(state, TokenKind::Eos, END_OF_STATEMENT.to_string());
            };
            match c {
                '\n' => {
                    state.line += 1;
                    state.column = 1;
                }
                c if c.is_ascii_whitespace() => state.column += 1,
                END_OF_STATEMENT => return Self::token(state, TokenKind::Eos, c.to_string()),
                '>' => {
                    return match self.next_if(|c| c == '=') {
                        Some(_) => Self::token(state, TokenKind::GreaterEqual, ">=".into()),
                        None => Self::token(state, TokenKind::Greater, ">".into()),
                    };
                }
                '<' => {
                    return match self.next_if(|c| c == '=' || c == '>') {
                        Some('=') => Self::token(state, TokenKind::LessEqual, "<=".into()),
                        Some(_) => Self::token(state, TokenKind::NotEqual, "<>".into()),
                        None => Self::token(state, TokenKind::Less, "<".into()),
                    };
                }
                '\'' | '"' => return self.scan_string(c, state),
                c if c.is_ascii_digit() => return self.scan_number(c, state),
                '-' | '+' => {
                    if let Some(token) = self.scan_signed(c, state) {
                        return token;
                    }
                }
                c if c.is_ascii_alphanumeric() => return self.scan_ident(c, state),
                c => {
                    let kind = Self::punctuation(c).unwrap_or(TokenKind::Unknown);
                    return Self::token(state, kind, c.to_string());
                }
            }
        }
    }

    /// Consumes the next character if it satisfies the predicate
    fn next_if<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<char> {
        self.iter.peek().filter(|&c| predicate(*c))?;
        self.iter.next()
    }

    /// Consumes consecutive characters while they satisfy the predicate
    fn next_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<String> {
        let mut value = String::new();
        while let Some(c) = self.next_if(&predicate) {
            value.push(c);
        }
        Some(value).filter(|v| !v.is_empty())
    }

    fn punctuation(c: char) -> Option<TokenKind> {
        Some(match c {
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '*' => TokenKind::Asterisk,
            '#' => TokenKind::Hash,
            '=' => TokenKind::Equal,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            _ => return None,
        })
    }

    /// Builds a token at the current position and advances the column by its width
    fn token(state: &mut ScannerState, kind: TokenKind, text: String) -> Token {
        let width = text.chars().count();
        Self::token_with_width(state, kind, text, width)
    }

    fn token_with_width(
        state: &mut ScannerState,
        kind: TokenKind,
        text: String,
        width: usize,
    ) -> Token {
        let token = Token {
            kind,
            text,
            line: state.line,
            column: state.column,
        };
        state.column += width;
        token
    }

    /// Scans a quoted string literal; the opening quote is already consumed.
    ///
    /// A newline or end of input closes the literal early with a warning. The newline
    /// is left in the stream so line bookkeeping still happens.
    fn scan_string(&mut self, quote: char, state: &mut ScannerState) -> Token {
        let mut val = String::new();
        while let Some(c) = self.next_if(|c| c != quote && c != '\n' && c != END_OF_STATEMENT) {
            val.push(c);
        }
        if self.next_if(|c| c == quote).is_none() {
            warn!(
                line = state.line,
                column = state.column,
                "string literal not terminated properly"
            );
        }
        let width = val.chars().count() + 2;
        Self::token_with_width(state, TokenKind::StringLiteral, val, width)
    }

    /// Scans a numeric literal whose first character (digit or sign) is already consumed
    fn scan_number(&mut self, first: char, state: &mut ScannerState) -> Token {
        let mut val = first.to_string();
        if let Some(digits) = self.next_while(|c| c.is_ascii_digit()) {
            val.push_str(&digits);
        }
        let kind = match self.next_if(|c| c == '.') {
            Some(sep) => {
                val.push(sep);
                if let Some(digits) = self.next_while(|c| c.is_ascii_digit()) {
                    val.push_str(&digits);
                }
                TokenKind::RealLiteral
            }
            None => TokenKind::IntLiteral,
        };
        Self::token(state, kind, val)
    }

    /// Handles a leading `+` or `-`: signed number, line comment, or lone sign.
    ///
    /// Returns `None` for a comment, which produces no token.
    fn scan_signed(&mut self, sign: char, state: &mut ScannerState) -> Option<Token> {
        if sign == '-' && self.next_if(|c| c == '-').is_some() {
            while self.next_if(|c| c != '\n').is_some() {}
            if self.next_if(|c| c == '\n').is_some() {
                state.line += 1;
                state.column = 1;
            }
            return None;
        }
        if self.iter.peek().is_some_and(|c| c.is_ascii_digit() || *c == '.') {
            return Some(self.scan_number(sign, state));
        }
        // a sign needs an adjacent operand
        Some(Self::token(state, TokenKind::Unknown, sign.to_string()))
    }

    /// Scans an identifier or keyword
    fn scan_ident(&mut self, first: char, state: &mut ScannerState) -> Token {
        let mut val = first.to_string();
        if let Some(rest) = self.next_while(|c| c.is_ascii_alphanumeric() || c == '_') {
            val.push_str(&rest);
        }
        let kind = Keyword::from_str(&val).map_or(TokenKind::Identifier, TokenKind::Keyword);
        Self::token(state, kind, val)
    }
}

/// Token iterator over one input stream, ending after the EOS token
pub struct Tokens<I: Iterator<Item = char>> {
    scanner: Scanner<I>,
    state: ScannerState,
    done: bool,
}

impl<I: Iterator<Item = char>> Iterator for Tokens<I> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.scanner.next_token(&mut self.state);
        self.done = token.kind == TokenKind::Eos;
        Some(token)
    }
}

/// Scans a whole string, returning every token up to and including EOS
pub fn tokenize(input: &str) -> Vec<Token> {
    Scanner::new(input.chars()).into_tokens().collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{KEYWORDS, Keyword, Scanner, ScannerState, TokenKind, tokenize};

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_scanner_literals() {
        let tokens = tokenize("123");
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[0].text, "123");
        assert_eq!(tokens[1].kind, TokenKind::Eos);

        let tokens = tokenize("-45.6");
        assert_eq!(tokens[0].kind, TokenKind::RealLiteral);
        assert_eq!(tokens[0].text, "-45.6");

        let tokens = tokenize("'it is'");
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].text, "it is");
        assert_eq!((tokens[1].line, tokens[1].column), (1, 8));

        let tokens = tokenize("\"don't\"");
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].text, "don't");
    }

    #[test]
    fn test_scanner_signs() {
        let tokens = tokenize("- 5");
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].text, "-");
        assert_eq!(tokens[1].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[1].text, "5");
        assert_eq!(tokens[1].column, 3);

        assert_eq!(kinds("+7"), vec![TokenKind::IntLiteral, TokenKind::Eos]);
        assert_eq!(texts("+7"), vec!["+7", "$"]);
        assert_eq!(kinds("+"), vec![TokenKind::Unknown, TokenKind::Eos]);
        assert_eq!(kinds("-x"), vec![
            TokenKind::Unknown,
            TokenKind::Identifier,
            TokenKind::Eos
        ]);

        let tokens = tokenize("-.5");
        assert_eq!(tokens[0].kind, TokenKind::RealLiteral);
        assert_eq!(tokens[0].text, "-.5");
    }

    #[test]
    fn test_scanner_decimal_points() {
        assert_eq!(texts("12.34.5"), vec!["12.34", ".", "5", "$"]);
        assert_eq!(kinds("12.34.5"), vec![
            TokenKind::RealLiteral,
            TokenKind::Dot,
            TokenKind::IntLiteral,
            TokenKind::Eos
        ]);
        assert_eq!(kinds("5."), vec![TokenKind::RealLiteral, TokenKind::Eos]);
        assert_eq!(texts("-..5"), vec!["-.", ".", "5", "$"]);
        assert_eq!(kinds("t.c"), vec![
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Eos
        ]);
    }

    #[test]
    fn test_scanner_comment() {
        let tokens = tokenize("-- comment\n42");
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        assert_eq!(tokens[0].text, "42");
        assert_eq!((tokens[0].line, tokens[0].column), (2, 1));

        assert_eq!(kinds("-- only a comment"), vec![TokenKind::Eos]);
    }

    #[test]
    fn test_scanner_keywords() {
        assert_eq!(kinds("SELECT"), kinds("select"));
        assert_eq!(kinds("SeLeCt")[0], TokenKind::Keyword(Keyword::Select));
        assert_eq!(kinds("selects")[0], TokenKind::Identifier);
        assert_eq!(texts("Movie_ID")[0], "Movie_ID");
        assert_eq!(kinds("_x"), vec![
            TokenKind::Unknown,
            TokenKind::Identifier,
            TokenKind::Eos
        ]);

        for (i, (word, keyword)) in KEYWORDS.iter().enumerate() {
            assert_eq!(*keyword as usize, i);
            assert_eq!(Keyword::from_str(word), Some(*keyword));
            assert_eq!(keyword.to_str().to_lowercase(), *word);
        }
        assert!(KEYWORDS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_scanner_operators() {
        assert_eq!(kinds("a>=1 b<>c<d<= e>f;(*)#,"), vec![
            TokenKind::Identifier,
            TokenKind::GreaterEqual,
            TokenKind::IntLiteral,
            TokenKind::Identifier,
            TokenKind::NotEqual,
            TokenKind::Identifier,
            TokenKind::Less,
            TokenKind::Identifier,
            TokenKind::LessEqual,
            TokenKind::Identifier,
            TokenKind::Greater,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::LeftParen,
            TokenKind::Asterisk,
            TokenKind::RightParen,
            TokenKind::Hash,
            TokenKind::Comma,
            TokenKind::Eos,
        ]);
        assert_eq!(kinds("@!"), vec![
            TokenKind::Unknown,
            TokenKind::Unknown,
            TokenKind::Eos
        ]);
    }

    #[test]
    fn test_scanner_positions() {
        let tokens = tokenize("select  title\n  from movies\n\twhere id >= 10;");
        let positions = tokens
            .iter()
            .map(|t| (t.text.as_str(), t.line, t.column))
            .collect::<Vec<_>>();
        assert_eq!(positions, vec![
            ("select", 1, 1),
            ("title", 1, 9),
            ("from", 2, 3),
            ("movies", 2, 8),
            ("where", 3, 2),
            ("id", 3, 8),
            (">=", 3, 11),
            ("10", 3, 14),
            (";", 3, 16),
            ("$", 3, 17),
        ]);
    }

    #[test]
    fn test_scanner_unterminated_string() {
        let tokens = tokenize("'abc\nx");
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].text, "abc");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!((tokens[1].line, tokens[1].column), (2, 1));

        let tokens = tokenize("\"open");
        assert_eq!(tokens[0].text, "open");
        assert_eq!(tokens[1].kind, TokenKind::Eos);
        assert_eq!(tokens[1].column, 7);
    }

    #[test]
    fn test_scanner_sentinel_and_state() {
        let mut scanner = Scanner::new("a $ b".chars());
        let mut state = ScannerState::new();
        assert_eq!(scanner.next_token(&mut state).kind, TokenKind::Identifier);
        let eos = scanner.next_token(&mut state);
        assert_eq!((eos.kind, eos.text.as_str(), eos.column), (TokenKind::Eos, "$", 3));
        assert_eq!(state, ScannerState { line: 1, column: 4 });
        // the caller decides whether to keep reading after the sentinel
        assert_eq!(scanner.next_token(&mut state).text, "b");
        assert_eq!(scanner.next_token(&mut state).kind, TokenKind::Eos);
        assert_eq!(scanner.next_token(&mut state).kind, TokenKind::Eos);
    }

    proptest! {
        #[test]
        fn prop_scanner_reaches_eos(input in "(?s).{0,64}") {
            let mut scanner = Scanner::new(input.chars());
            let mut state = ScannerState::new();
            let limit = input.chars().count() + 1;
            let mut reached = false;
            let mut last_line = 1;
            for _ in 0..limit {
                let token = scanner.next_token(&mut state);
                prop_assert!(token.line >= last_line);
                prop_assert!(token.column >= 1);
                last_line = token.line;
                if token.kind == TokenKind::Eos {
                    reached = true;
                    break;
                }
            }
            prop_assert!(reached);
        }

        #[test]
        fn prop_token_positions_point_at_lexemes(input in r#"[a-z0-9_ \t\n;(),*#=<>.'"$+-]{0,48}"#) {
            let lines = input.split('\n').map(|l| l.chars().collect::<Vec<_>>()).collect::<Vec<_>>();
            for token in tokenize(&input) {
                if token.kind == TokenKind::Eos {
                    break;
                }
                let line = &lines[token.line - 1];
                let mut start = token.column - 1;
                if token.kind == TokenKind::StringLiteral {
                    // column is the opening quote, text starts after it
                    prop_assert!(line[start] == '\'' || line[start] == '"');
                    start += 1;
                }
                let found = line[start..].iter().take(token.text.chars().count()).collect::<String>();
                prop_assert_eq!(found, token.text);
            }
        }
    }
}
