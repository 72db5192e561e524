use std::fmt;
use std::rc::Rc;

use shared::error::Error;

use crate::parser::Expr;
use crate::environment::Environment;

/// Forms whose arguments are not evaluated before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm
{
    Quote,
    Define,
    Set,
    Lambda,
    If,
}

impl SpecialForm
{
    pub const ALL: [SpecialForm; 5] = [Self::Quote, Self::Define, Self::Set,
                                       Self::Lambda, Self::If];

    pub fn name(&self) -> &'static str
    {
        match self
        {
            Self::Quote => "quote",
            Self::Define => "define",
            Self::Set => "set!",
            Self::Lambda => "lambda",
            Self::If => "if",
        }
    }
}

pub type Func = fn(&[Obj], &Environment) -> Result<Obj, Error>;

#[derive(Clone)]
pub struct Builtin
{
    name: &'static str,
    func: Func,
}

impl Builtin
{
    pub const fn new(name: &'static str, func: Func) -> Self
    {
        Self{ name: name, func: func }
    }

    pub fn name(&self) -> &'static str
    {
        self.name
    }

    pub fn call(&self, args: &[Obj], env: &Environment) -> Result<Obj, Error>
    {
        (self.func)(args, env)
    }
}

impl PartialEq for Builtin
{
    fn eq(&self, other: &Self) -> bool
    {
        self.name == other.name
    }
}

/// A closure: parameters, body, and the environment it captured.
pub struct Lambda
{
    params: Vec<String>,
    body: Vec<Expr>,
    env: Environment,
}

impl Lambda
{
    pub fn new(env: Environment, params: Vec<String>, body: Vec<Expr>) -> Self
    {
        Self{ params: params, body: body, env: env }
    }

    pub fn params(&self) -> &[String]
    {
        &self.params
    }

    pub fn body(&self) -> &[Expr]
    {
        &self.body
    }

    pub fn env(&self) -> &Environment
    {
        &self.env
    }
}

#[derive(Clone)]
pub enum ProcedureKind
{
    Special(SpecialForm),
    Builtin(Builtin),
    Lambda(Rc<Lambda>),
}

#[derive(Clone)]
pub struct Procedure
{
    // None for a lambda that was never bound by `define`.
    name: Option<String>,
    kind: ProcedureKind,
}

impl Procedure
{
    pub fn special(form: SpecialForm) -> Self
    {
        Self{ name: Some(form.name().to_owned()),
              kind: ProcedureKind::Special(form) }
    }

    pub fn builtin(b: Builtin) -> Self
    {
        Self{ name: Some(b.name().to_owned()), kind: ProcedureKind::Builtin(b) }
    }

    pub fn lambda(l: Lambda) -> Self
    {
        Self{ name: None, kind: ProcedureKind::Lambda(Rc::new(l)) }
    }

    pub fn kind(&self) -> &ProcedureKind
    {
        &self.kind
    }

    pub fn name(&self) -> &str
    {
        self.name.as_deref().unwrap_or("lambda")
    }

    pub fn isAnonymous(&self) -> bool
    {
        self.name.is_none()
    }

    /// The same procedure under another name. The closure is shared.
    pub fn withName(&self, name: &str) -> Self
    {
        Self{ name: Some(name.to_owned()), kind: self.kind.clone() }
    }
}

impl PartialEq for Procedure
{
    fn eq(&self, other: &Self) -> bool
    {
        match (&self.kind, &other.kind)
        {
            (ProcedureKind::Special(a), ProcedureKind::Special(b)) => a == b,
            (ProcedureKind::Builtin(a), ProcedureKind::Builtin(b)) => a == b,
            (ProcedureKind::Lambda(a), ProcedureKind::Lambda(b)) =>
                Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Procedure
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self.kind
        {
            ProcedureKind::Special(_) => write!(f, "{}:special-form", self.name()),
            ProcedureKind::Builtin(_) => write!(f, "{}:builtin", self.name()),
            ProcedureKind::Lambda(_) => write!(f, "{}:procedure", self.name()),
        }
    }
}

impl fmt::Debug for Procedure
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Obj
{
    Int(i64),
    Float(f64),
    Bool(bool),
    Procedure(Procedure),
    Quoted(Expr),
    None,
    Error(String),
}

macro_rules! numericalCompare
{
    ($name:ident, $op:tt) =>
    {
        pub fn $name(&self, rhs: &Self) -> Option<bool>
        {
            match (self, rhs)
            {
                (Self::Int(n), Self::Int(m)) => Some(n $op m),
                (Self::Int(n), Self::Float(m)) => Some((*n as f64) $op *m),
                (Self::Float(n), Self::Int(m)) => Some(*n $op (*m as f64)),
                (Self::Float(n), Self::Float(m)) => Some(n $op m),
                _ => None,
            }
        }
    };
}

impl Obj
{
    pub fn typeName(&self) -> &'static str
    {
        match self
        {
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::Procedure(_) => "procedure",
            Self::Quoted(_) => "quoted expression",
            Self::None => "none",
            Self::Error(_) => "error",
        }
    }

    pub fn isFloat(&self) -> bool
    {
        if let Self::Float(_) = self
        {
            true
        }
        else
        {
            false
        }
    }

    pub fn asFloat(&self) -> Option<f64>
    {
        match self
        {
            Self::Float(x) => Some(*x),
            Self::Int(x) => Some(*x as f64),
            _ => None,
        }
    }

    numericalCompare!(numericalEq, ==);
    numericalCompare!(numericalGreaterThan, >);
    numericalCompare!(numericalLessThan, <);
    numericalCompare!(numericalGreaterOrEq, >=);
    numericalCompare!(numericalLessOrEq, <=);

    /// Everything except `#f` and none counts as true, zero included.
    pub fn toBool(&self) -> bool
    {
        match self
        {
            Self::Bool(false) | Self::None => false,
            _ => true,
        }
    }

    /// The expression this value reads back as, for embedding into
    /// quoted structure.
    pub fn toExpr(&self) -> Result<Expr, Error>
    {
        match self
        {
            // inf and NaN would read back as symbols.
            Self::Float(x) if !x.is_finite() =>
                Err(errf!(TypeMismatch, "{} cannot be quoted", self)),
            Self::Int(_) | Self::Float(_) | Self::Bool(_) =>
                Ok(Expr::Atom(self.to_string())),
            Self::Quoted(e) => Ok(e.clone()),
            Self::Procedure(p) => match p.kind()
            {
                ProcedureKind::Special(_) | ProcedureKind::Builtin(_) =>
                    Ok(Expr::atom(p.name())),
                ProcedureKind::Lambda(_) =>
                    Err(errf!(TypeMismatch, "{} cannot be quoted", p)),
            },
            Self::None | Self::Error(_) =>
                Err(errf!(TypeMismatch, "{} cannot be quoted", self.typeName())),
        }
    }
}

impl fmt::Display for Obj
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            Self::Int(x) => write!(f, "{}", x),
            // Debug keeps the fraction, so 2.0 does not read back as an int.
            Self::Float(x) => write!(f, "{:?}", x),
            Self::Bool(x) => if *x { write!(f, "#t") } else { write!(f, "#f") },
            Self::Procedure(p) => write!(f, "{}", p),
            Self::Quoted(e) => write!(f, "{}", e),
            Self::None => write!(f, "#<none>"),
            Self::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl From<Error> for Obj
{
    fn from(e: Error) -> Self
    {
        Self::Error(e.to_string())
    }
}
