//! Token definitions for the Zen language.
//!
//! Whitespace and `#` line comments are skipped; everything else is matched
//! with maximal munch. Unrecognized bytes surface as [`Token::Error`] carrying
//! their span, which the parser reports with a source location.

use logos::Logos;

// Re-exports
pub(crate) use logos::Span;

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Token {
    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("not")]
    Not,
    #[token("and")]
    And,
    #[token("or")]
    Or,

    // Punctuation
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    // Grouping
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // Keywords
    #[token("set")]
    Set,
    #[token("function")]
    Function,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Entities
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // Literals
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,
    #[regex(r#""([^"\\\n]|\\[^\x00-\x1F])*""#)]
    Str,

    #[error]
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    #[regex(r"#[^\n]*", logos::skip)]
    Error,
}

impl Token {
    /// Human-readable name used in parser diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::Assign => "'='",
            Self::EqEq => "'=='",
            Self::NotEq => "'!='",
            Self::Lt => "'<'",
            Self::Le => "'<='",
            Self::Gt => "'>'",
            Self::Ge => "'>='",
            Self::Not => "'not'",
            Self::And => "'and'",
            Self::Or => "'or'",
            Self::Question => "'?'",
            Self::Colon => "':'",
            Self::Semi => "';'",
            Self::Comma => "','",
            Self::Dot => "'.'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Set => "'set'",
            Self::Function => "'function'",
            Self::If => "'if'",
            Self::Else => "'else'",
            Self::While => "'while'",
            Self::For => "'for'",
            Self::In => "'in'",
            Self::Return => "'return'",
            Self::Break => "'break'",
            Self::Continue => "'continue'",
            Self::True => "'true'",
            Self::False => "'false'",
            Self::Null => "'null'",
            Self::Ident => "identifier",
            Self::Number => "number literal",
            Self::Str => "string literal",
            Self::Error => "unrecognized input",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Token;
    use logos::Logos;

    fn lex(input: &str) -> Vec<(Token, String)> {
        let mut lexer = Token::lexer(input);
        let mut tokens = vec![];
        while let Some(token) = lexer.next() {
            tokens.push((token, lexer.slice().to_owned()));
        }
        tokens
    }

    fn kinds(input: &str) -> Vec<Token> {
        lex(input).into_iter().map(|(token, _)| token).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("set settings function functional"),
            vec![Token::Set, Token::Ident, Token::Function, Token::Ident]
        );
    }

    #[test]
    fn maximal_munch_on_operators() {
        assert_eq!(kinds("= == != < <= > >="), vec![
            Token::Assign,
            Token::EqEq,
            Token::NotEq,
            Token::Lt,
            Token::Le,
            Token::Gt,
            Token::Ge,
        ]);
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("0 42 3.5 1e9 2.5e-3"), vec![Token::Number; 5]);
        // hex is not a literal form; the converter path handles it
        assert_eq!(kinds("0x10"), vec![Token::Number, Token::Ident]);
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(kinds(r#""hello" "a\"b" "A""#), vec![Token::Str; 3]);
    }

    #[test]
    fn comments_and_whitespace_skipped() {
        assert_eq!(
            kinds("set x # trailing comment\n# full line\nset"),
            vec![Token::Set, Token::Ident, Token::Set]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let tokens = kinds("\"oops");
        assert!(tokens.contains(&Token::Error));
    }

    #[test]
    fn unrecognized_byte_is_an_error() {
        assert_eq!(kinds("set @"), vec![Token::Set, Token::Error]);
    }

    #[test]
    fn spans_track_offsets() {
        let mut lexer = Token::lexer("set abc");
        assert_eq!(lexer.next(), Some(Token::Set));
        assert_eq!(lexer.span(), 0..3);
        assert_eq!(lexer.next(), Some(Token::Ident));
        assert_eq!(lexer.span(), 4..7);
        assert_eq!(lexer.next(), None);
    }
}
