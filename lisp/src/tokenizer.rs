use std::fmt;

use shared::error::Error;

#[derive(Debug, PartialEq, Clone)]
pub enum Token
{
    ParenLeft,
    ParenRight,
    // Numbers, symbols and operators. Interpreted only at eval time.
    Atom(String),
}

impl Token
{
    pub fn atom(src: &str) -> Self
    {
        Self::Atom(src.to_owned())
    }

    pub fn src(&self) -> &str
    {
        match self
        {
            Self::ParenLeft => "(",
            Self::ParenRight => ")",
            Self::Atom(s) => s,
        }
    }
}

impl fmt::Display for Token
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.src())
    }
}

#[derive(PartialEq)]
enum State
{
    Generic,
    Atom,
}

/// Accumulates tokens and closes the `(quote ...` wrappers opened by
/// backticks once the quoted datum is complete.
struct TokenSink
{
    tokens: Vec<Token>,
    depth: usize,
    // Depths at which a backtick opened a quote wrapper, innermost last.
    quotes: Vec<usize>,
}

impl TokenSink
{
    fn new() -> Self
    {
        Self{ tokens: Vec::new(), depth: 0, quotes: Vec::new() }
    }

    fn openQuote(&mut self)
    {
        self.tokens.push(Token::ParenLeft);
        self.tokens.push(Token::atom("quote"));
        self.depth += 1;
        self.quotes.push(self.depth);
    }

    // A datum just finished at the current depth.
    fn closeQuotes(&mut self)
    {
        while self.quotes.last() == Some(&self.depth)
        {
            self.quotes.pop();
            self.tokens.push(Token::ParenRight);
            self.depth -= 1;
        }
    }

    fn pushAtom(&mut self, buffer: &[char])
    {
        self.tokens.push(Token::Atom(buffer.iter().collect()));
        self.closeQuotes();
    }

    fn pushLeft(&mut self)
    {
        self.tokens.push(Token::ParenLeft);
        self.depth += 1;
    }

    fn pushRight(&mut self) -> Result<(), Error>
    {
        if self.quotes.last() == Some(&self.depth)
        {
            return Err(error!(SyntaxError, "Nothing to quote before )"));
        }
        self.tokens.push(Token::ParenRight);
        // Unbalanced parens are reported by the parser.
        if self.depth > 0
        {
            self.depth -= 1;
            self.closeQuotes();
        }
        Ok(())
    }

    fn finish(self) -> Result<Vec<Token>, Error>
    {
        if self.quotes.last() == Some(&self.depth)
        {
            return Err(error!(SyntaxError, "Nothing to quote at end of input"));
        }
        Ok(self.tokens)
    }
}

/// Split `src` into parens and atoms. `` `x `` is rewritten to
/// `(quote x)` and `` `(a b) `` to `(quote (a b))`.
pub fn tokenize(src: &str) -> Result<Vec<Token>, Error>
{
    let mut sink = TokenSink::new();
    let mut buffer: Vec<char> = Vec::new();
    let mut state = State::Generic;

    for c in src.chars()
    {
        if state == State::Atom
        {
            if c.is_whitespace() || c == '(' || c == ')' || c == '`'
            {
                sink.pushAtom(&buffer);
                buffer.clear();
                state = State::Generic;
            }
            else
            {
                buffer.push(c);
                continue;
            }
        }

        if c == '('
        {
            sink.pushLeft();
        }
        else if c == ')'
        {
            sink.pushRight()?;
        }
        else if c == '`'
        {
            sink.openQuote();
        }
        else if !c.is_whitespace()
        {
            buffer.push(c);
            state = State::Atom;
        }
    }

    if state == State::Atom
    {
        sink.pushAtom(&buffer);
    }
    sink.finish()
}
