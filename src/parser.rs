use logos::{Lexer, Logos};

use crate::{error::LispError, expression::Expression, symbol::SymbolTable};


// A '.' only stands alone at the start of a token, so literals may contain
// dots but never begin with one.
#[derive(Debug, Clone, PartialEq, Logos)]
#[logos(skip r"\s+")]
#[logos(skip r";[^\n]*")]
enum Token<'a> {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("'")]
    Quote,

    #[token(".")]
    Dot,

    #[regex(r#""([^"\\]|\\(.|\n))*""#, unescape)]
    StringLiteral(String),

    #[regex(r#""([^"\\]|\\(.|\n))*\\?"#)]
    UnterminatedString,

    #[regex(r#"[^\s()';".][^\s()';"]*"#, |lex| lex.slice())]
    Literal(&'a str),
}

fn unescape<'a>(lex: &mut Lexer<'a, Token<'a>>) -> String {
    let slice = lex.slice();
    let body = &slice[1..slice.len() - 1];

    let mut text = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('r') => text.push('\r'),
            Some(other) => text.push(other),
            None => {}
        }
    }
    text
}

pub type ParseResult<O> = Result<O, LispError>;

/// Incremental S-expression reader over a source string.
///
/// Each call to [Reader::parse_expression] consumes exactly one expression,
/// so a source holding several top-level forms is read one form at a time.
pub struct Reader<'a> {
    lexer: Lexer<'a, Token<'a>>,
    pushback: Option<Token<'a>>,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { lexer: Token::lexer(input), pushback: None }
    }

    /// Byte offset just past the last token consumed.
    pub fn offset(&self) -> usize {
        self.lexer.span().end
    }

    fn next_token(&mut self) -> ParseResult<Option<Token<'a>>> {
        if let Some(token) = self.pushback.take() {
            return Ok(Some(token));
        }

        match self.lexer.next() {
            None => Ok(None),
            Some(Ok(Token::UnterminatedString)) => Err(LispError::UnterminatedString),
            Some(Ok(token)) => Ok(Some(token)),
            Some(Err(_)) => Err(LispError::Syntax(format!("unrecognized input '{}'", self.lexer.slice()))),
        }
    }

    fn push_back(&mut self, token: Token<'a>) {
        self.pushback = Some(token);
    }

    fn expect_token(&mut self) -> ParseResult<Token<'a>> {
        self.next_token()?.ok_or(LispError::UnexpectedEof)
    }

    /// Reads the next expression, or `None` once the input holds nothing but
    /// whitespace and comments.
    pub fn parse_expression(&mut self, symbols: &mut SymbolTable) -> ParseResult<Option<Expression>> {
        match self.next_token()? {
            None => Ok(None),
            Some(token) => self.parse_token(token, symbols).map(Some),
        }
    }

    fn parse_required(&mut self, symbols: &mut SymbolTable) -> ParseResult<Expression> {
        let token = self.expect_token()?;
        self.parse_token(token, symbols)
    }

    fn parse_token(&mut self, token: Token<'a>, symbols: &mut SymbolTable) -> ParseResult<Expression> {
        match token {
            Token::LeftParen => self.parse_list(symbols),
            Token::RightParen => Err(LispError::Syntax("unexpected ')'".to_owned())),
            Token::Dot => Err(LispError::Syntax("unexpected '.'".to_owned())),
            Token::Quote => {
                let quoted = self.parse_required(symbols)?;
                let nil = Expression::Symbol(symbols.nil().clone());
                Ok(Expression::cons(
                    Expression::Symbol(symbols.quote().clone()),
                    Expression::cons(quoted, nil),
                ))
            },
            Token::StringLiteral(text) => Ok(Expression::string(&text)),
            Token::UnterminatedString => Err(LispError::UnterminatedString),
            Token::Literal(literal) => Ok(parse_atom(literal, symbols)),
        }
    }

    // Called with the opening parenthesis already consumed. Elements are
    // collected until the closing parenthesis; a '.' after at least one
    // element introduces the final tail.
    fn parse_list(&mut self, symbols: &mut SymbolTable) -> ParseResult<Expression> {
        let mut elements = vec![];

        loop {
            match self.expect_token()? {
                Token::RightParen => {
                    return Ok(Expression::list_from(elements, Expression::Symbol(symbols.nil().clone())));
                },
                Token::Dot if !elements.is_empty() => {
                    let tail = self.parse_required(symbols)?;
                    return match self.expect_token()? {
                        Token::RightParen => Ok(Expression::list_from(elements, tail)),
                        _ => Err(LispError::Syntax("expected ')' after dotted pair".to_owned())),
                    };
                },
                token => {
                    self.push_back(token);
                    elements.push(self.parse_required(symbols)?);
                },
            }
        }
    }
}

fn parse_atom(literal: &str, symbols: &mut SymbolTable) -> Expression {
    let digits = literal.strip_prefix('-').unwrap_or(literal);
    if !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit()) {
        if let Ok(number) = literal.parse() {
            return Expression::Number(number);
        }
    }
    Expression::Symbol(symbols.intern(literal))
}

/// Reads every expression in `input`.
pub fn parse(input: &str, symbols: &mut SymbolTable) -> ParseResult<Vec<Expression>> {
    let mut reader = Reader::new(input);
    let mut expressions = vec![];

    while let Some(expression) = reader.parse_expression(symbols)? {
        expressions.push(expression);
    }

    Ok(expressions)
}
