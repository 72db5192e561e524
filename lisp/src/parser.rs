use std::fmt;

use shared::error::Error;

use crate::tokenizer::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr
{
    Atom(String),
    List(Vec<Expr>),
}

impl Expr
{
    pub fn atom(src: &str) -> Self
    {
        Self::Atom(src.to_owned())
    }

    /// Parse exactly one expression. Leftover tokens are an error.
    pub fn parse(tokens: Vec<Token>) -> Result<Self, Error>
    {
        let mut eater = TokenEater::new(&tokens);
        let expr = eater.parse()?;
        if !eater.done()
        {
            return Err(errf!(SyntaxError, "Unexpected {} after expression",
                             eater.current()?));
        }
        Ok(expr)
    }

    /// Parse the first expression and hand back the tokens after it.
    pub fn parseFirst(tokens: &[Token]) -> Result<(Self, &[Token]), Error>
    {
        let mut eater = TokenEater::new(tokens);
        let expr = eater.parse()?;
        Ok((expr, &tokens[eater.pos..]))
    }

    /// Parse all top-level expressions, e.g. of a source file.
    pub fn parseAll(tokens: Vec<Token>) -> Result<Vec<Self>, Error>
    {
        let mut eater = TokenEater::new(&tokens);
        let mut roots = Vec::new();
        while !eater.done()
        {
            roots.push(eater.parse()?);
        }
        Ok(roots)
    }

    /// Assume the node is a symbol. Return the symbol as a string.
    pub fn getSymbolName(&self) -> Result<&str, Error>
    {
        match self
        {
            Self::Atom(name) if !isNumberLiteral(name) => Ok(name),
            _ => Err(errf!(SyntaxError, "{} is not a symbol", self)),
        }
    }
}

pub fn intLiteral(s: &str) -> Option<i64>
{
    s.parse::<i64>().ok()
}

// Rust also reads "inf" and "NaN" as floats; those stay symbols here.
pub fn floatLiteral(s: &str) -> Option<f64>
{
    if s.chars().any(|c| c.is_ascii_digit())
    {
        s.parse::<f64>().ok()
    }
    else
    {
        None
    }
}

pub fn isNumberLiteral(s: &str) -> bool
{
    intLiteral(s).is_some() || floatLiteral(s).is_some()
}

impl fmt::Display for Expr
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            Self::Atom(s) => write!(f, "{}", s),
            Self::List(children) =>
            {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate()
                {
                    if i > 0
                    {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            },
        }
    }
}

struct TokenEater<'a>
{
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenEater<'a>
{
    pub fn new(tokens: &'a [Token]) -> Self
    {
        Self{ tokens: tokens, pos: 0 }
    }

    fn advance(&mut self)
    {
        self.pos += 1;
    }

    fn done(&self) -> bool
    {
        self.pos >= self.tokens.len()
    }

    fn current(&self) -> Result<&'a Token, Error>
    {
        self.tokens.get(self.pos).ok_or_else(
            || error!(SyntaxError, "Unexpected end of input"))
    }

    fn parse(&mut self) -> Result<Expr, Error>
    {
        let current = self.current()?;
        self.advance();
        match current
        {
            Token::ParenLeft => Ok(Expr::List(self.consumeToRightParen()?)),
            Token::ParenRight => Err(error!(SyntaxError, "Unexpected )")),
            Token::Atom(s) => Ok(Expr::Atom(s.clone())),
        }
    }

    fn consumeToRightParen(&mut self) -> Result<Vec<Expr>, Error>
    {
        let mut nodes = Vec::new();
        loop
        {
            let current = self.current().map_err(
                |_| error!(SyntaxError, "Missing )"))?;
            if current == &Token::ParenRight
            {
                self.advance();
                break;
            }

            nodes.push(self.parse()?);
        }
        Ok(nodes)
    }
}
