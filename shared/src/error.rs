use std::error::Error as StdError;
use std::fmt;

#[macro_export]
macro_rules! error
{
    ( $err_type:ident, $msg:expr ) =>
    {
        {
            $crate::error::Error::$err_type(String::from($msg))
        }
    };
}

// Construct a RuntimeError
#[macro_export]
macro_rules! rterr
{
    ($msg:literal) => { $crate::error!(RuntimeError, $msg) };
    ($msg:literal $(, $x:expr)+) =>
    {
        $crate::error!(RuntimeError, format!($msg $(, $x)+))
    };
}

// Construct an error of any kind with a formatted message.
#[macro_export]
macro_rules! errf
{
    ($err_type:ident, $msg:literal $(, $x:expr)*) =>
    {
        $crate::error!($err_type, format!($msg $(, $x)*))
    };
}

#[derive(Debug, Clone, PartialEq)]
pub enum Error
{
    /// Unbalanced parentheses, empty input, malformed special forms.
    SyntaxError(String),
    UndefinedSymbol(String),
    /// The head of an application is not a procedure.
    InvalidProcedure(String),
    ArityMismatch(String),
    TypeMismatch(String),
    RuntimeError(String),
}

impl fmt::Display for Error
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            Error::SyntaxError(msg) => write!(f, "Syntax error: {}", msg),
            Error::UndefinedSymbol(msg) => write!(f, "Undefined symbol: {}", msg),
            Error::InvalidProcedure(msg) => write!(f, "Invalid procedure: {}", msg),
            Error::ArityMismatch(msg) => write!(f, "Arity mismatch: {}", msg),
            Error::TypeMismatch(msg) => write!(f, "Type mismatch: {}", msg),
            Error::RuntimeError(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl StdError for Error
{
    fn source(&self) -> Option<&(dyn StdError + 'static)> {None}
}
