use shared::error::Error;

use crate::value::{Obj, Builtin, Procedure, SpecialForm};
use crate::parser::Expr;
use crate::environment::Environment;
use crate::eval;

type BuiltinResult = Result<Obj, Error>;

#[macro_export]
macro_rules! builtin_args_check
{
    ($name: literal, $args:ident == $count: literal) =>
    {
        if $args.len() != $count
        {
            return Err(errf!(ArityMismatch, "{} expects {} argument(s), got {}",
                             $name, $count, $args.len()));
        }
    };

    ($name: literal, $args:ident >= $count: literal) =>
    {
        if $args.len() < $count
        {
            return Err(errf!(ArityMismatch, "{} expects at least {} argument(s), got {}",
                             $name, $count, $args.len()));
        }
    };
}

// The quoted expression inside an argument, or a type error.
macro_rules! builtin_quoted_arg
{
    ($func_name: literal, $args:ident[$index: literal]) =>
    {
        if let Obj::Quoted(x__) = &$args[$index]
        {
            x__
        }
        else
        {
            return Err(errf!(TypeMismatch, "{}'s argument {} should be quoted, got {}",
                             $func_name, $index, $args[$index].typeName()));
        }
    };
}

fn checkNumbers(name: &str, args: &[Obj]) -> Result<(), Error>
{
    for arg in args
    {
        if arg.asFloat().is_none()
        {
            return Err(errf!(TypeMismatch, "Invalid argument for {}: {} is a {}",
                             name, arg, arg.typeName()));
        }
    }
    Ok(())
}

/// Left fold over numeric arguments. Integers stay integers until a
/// float shows up.
fn foldNumbers(name: &str, seed: Obj, rest: &[Obj],
               int_op: fn(i64, i64) -> BuiltinResult,
               float_op: fn(f64, f64) -> f64) -> BuiltinResult
{
    checkNumbers(name, rest)?;
    let mut result = seed;
    for arg in rest
    {
        result = match (&result, arg)
        {
            (Obj::Int(x), Obj::Int(y)) => int_op(*x, *y)?,
            (x, y) => match (x.asFloat(), y.asFloat())
            {
                (Some(x), Some(y)) => Obj::Float(float_op(x, y)),
                _ => return Err(errf!(TypeMismatch, "Invalid argument for {}", name)),
            },
        };
    }
    Ok(result)
}

macro_rules! make_arithm
{
    // Seeded with an identity element.
    ($name:ident, $sym:literal, identity $identity:literal, $checked:ident, $op:tt) =>
    {
        fn $name(args: &[Obj], _: &Environment) -> BuiltinResult
        {
            foldNumbers($sym, Obj::Int($identity), args,
                        |x, y| x.$checked(y).map(Obj::Int).ok_or_else(
                            || rterr!("Integer overflow in {}", $sym)),
                        |x, y| x $op y)
        }
    };
    // Seeded with the first argument.
    ($name:ident, $sym:literal, first, $checked:ident, $op:tt) =>
    {
        fn $name(args: &[Obj], _: &Environment) -> BuiltinResult
        {
            builtin_args_check!($sym, args >= 1);
            checkNumbers($sym, &args[..1])?;
            foldNumbers($sym, args[0].clone(), &args[1..],
                        |x, y| x.$checked(y).map(Obj::Int).ok_or_else(
                            || rterr!("Integer overflow in {}", $sym)),
                        |x, y| x $op y)
        }
    };
}

make_arithm!(add, "+", identity 0, checked_add, +);
make_arithm!(minus, "-", first, checked_sub, -);
make_arithm!(multiply, "*", identity 1, checked_mul, *);

fn divideInts(x: i64, y: i64) -> BuiltinResult
{
    if y == 0
    {
        return Err(rterr!("Division by zero"));
    }

    // i64::MIN / -1 overflows both % and /.
    let rem = x.checked_rem(y).ok_or_else(|| rterr!("Integer overflow in /"))?;
    if rem == 0
    {
        x.checked_div(y).map(Obj::Int).ok_or_else(
            || rterr!("Integer overflow in /"))
    }
    else
    {
        Ok(Obj::Float(x as f64 / y as f64))
    }
}

fn divide(args: &[Obj], _: &Environment) -> BuiltinResult
{
    builtin_args_check!("/", args >= 1);
    checkNumbers("/", &args[..1])?;
    foldNumbers("/", args[0].clone(), &args[1..], divideInts, |x, y| x / y)
}

macro_rules! make_compare
{
    ($name:ident, $sym:literal, $method:ident) =>
    {
        fn $name(args: &[Obj], _: &Environment) -> BuiltinResult
        {
            builtin_args_check!($sym, args == 2);
            args[0].$method(&args[1]).map(Obj::Bool).ok_or_else(
                || errf!(TypeMismatch, "{} expects numbers, got {} and {}",
                         $sym, args[0].typeName(), args[1].typeName()))
        }
    };
}

make_compare!(numLessThan, "<", numericalLessThan);
make_compare!(numLessOrEq, "<=", numericalLessOrEq);
make_compare!(numGreaterThan, ">", numericalGreaterThan);
make_compare!(numGreaterOrEq, ">=", numericalGreaterOrEq);

fn equal(args: &[Obj], _: &Environment) -> BuiltinResult
{
    builtin_args_check!("=", args == 2);
    if let Some(b) = args[0].numericalEq(&args[1])
    {
        return Ok(Obj::Bool(b));
    }

    match (&args[0], &args[1])
    {
        (Obj::Bool(x), Obj::Bool(y)) => Ok(Obj::Bool(x == y)),
        (Obj::Quoted(x), Obj::Quoted(y)) => Ok(Obj::Bool(x == y)),
        (x, y) => Err(errf!(TypeMismatch, "= cannot compare {} and {}",
                            x.typeName(), y.typeName())),
    }
}

fn abs(args: &[Obj], _: &Environment) -> BuiltinResult
{
    builtin_args_check!("abs", args == 1);
    match &args[0]
    {
        Obj::Int(x) => x.checked_abs().map(Obj::Int).ok_or_else(
            || rterr!("Integer overflow in abs")),
        Obj::Float(x) => Ok(Obj::Float(x.abs())),
        x => Err(errf!(TypeMismatch, "abs expects a number, got {}", x.typeName())),
    }
}

fn pick(name: &str, args: &[Obj], method: fn(&Obj, &Obj) -> Option<bool>)
        -> BuiltinResult
{
    if args.is_empty()
    {
        return Err(errf!(ArityMismatch, "{} expects at least 1 argument(s), got 0",
                         name));
    }
    checkNumbers(name, args)?;

    let mut best = &args[0];
    for arg in &args[1..]
    {
        if method(arg, best) == Some(true)
        {
            best = arg;
        }
    }
    Ok(best.clone())
}

fn max(args: &[Obj], _: &Environment) -> BuiltinResult
{
    pick("max", args, Obj::numericalGreaterThan)
}

fn min(args: &[Obj], _: &Environment) -> BuiltinResult
{
    pick("min", args, Obj::numericalLessThan)
}

fn not(args: &[Obj], _: &Environment) -> BuiltinResult
{
    builtin_args_check!("not", args == 1);
    Ok(Obj::Bool(!args[0].toBool()))
}

fn display(args: &[Obj], _: &Environment) -> BuiltinResult
{
    for arg in args
    {
        println!("{}", arg);
    }
    Ok(args.last().cloned().unwrap_or(Obj::None))
}

fn begin(args: &[Obj], _: &Environment) -> BuiltinResult
{
    Ok(args.last().cloned().unwrap_or(Obj::None))
}

fn car(args: &[Obj], _: &Environment) -> BuiltinResult
{
    builtin_args_check!("car", args == 1);
    match builtin_quoted_arg!("car", args[0])
    {
        atom @ Expr::Atom(_) => Ok(Obj::Quoted(atom.clone())),
        Expr::List(items) => items.first().cloned().map(Obj::Quoted)
            .ok_or_else(|| rterr!("car of empty list")),
    }
}

fn cdr(args: &[Obj], _: &Environment) -> BuiltinResult
{
    builtin_args_check!("cdr", args == 1);
    match builtin_quoted_arg!("cdr", args[0])
    {
        // An atom is a list of one.
        Expr::Atom(_) => Ok(Obj::Quoted(Expr::List(Vec::new()))),
        Expr::List(items) =>
        {
            if items.is_empty()
            {
                return Err(rterr!("cdr of empty list"));
            }
            Ok(Obj::Quoted(Expr::List(items[1..].to_vec())))
        },
    }
}

fn cons(args: &[Obj], _: &Environment) -> BuiltinResult
{
    builtin_args_check!("cons", args == 2);
    let head = args[0].toExpr()?;
    match args[1].toExpr()?
    {
        Expr::List(mut items) =>
        {
            items.insert(0, head);
            Ok(Obj::Quoted(Expr::List(items)))
        },
        atom @ Expr::Atom(_) => Ok(Obj::Quoted(Expr::List(vec![head, atom]))),
    }
}

fn nullp(args: &[Obj], _: &Environment) -> BuiltinResult
{
    builtin_args_check!("null?", args == 1);
    Ok(Obj::Bool(args[0] == Obj::Quoted(Expr::List(Vec::new()))))
}

fn listp(args: &[Obj], _: &Environment) -> BuiltinResult
{
    builtin_args_check!("list?", args == 1);
    Ok(Obj::Bool(matches!(args[0], Obj::Quoted(Expr::List(_)))))
}

fn length(args: &[Obj], _: &Environment) -> BuiltinResult
{
    builtin_args_check!("length", args == 1);
    match builtin_quoted_arg!("length", args[0])
    {
        Expr::Atom(_) => Ok(Obj::Int(1)),
        Expr::List(items) => Ok(Obj::Int(items.len() as i64)),
    }
}

fn evalQuoted(args: &[Obj], env: &Environment) -> BuiltinResult
{
    builtin_args_check!("eval", args == 1);
    match &args[0]
    {
        Obj::Quoted(expr) => eval::evalExpr(expr, env),
        other => Ok(other.clone()),
    }
}

const CONSTANTS: [&str; 2] = ["#t", "#f"];

fn constant(name: &str) -> Option<Obj>
{
    match name
    {
        "#t" => Some(Obj::Bool(true)),
        "#f" => Some(Obj::Bool(false)),
        _ => None,
    }
}

static BUILTINS: [Builtin; 22] = [
    Builtin::new("+", add),
    Builtin::new("-", minus),
    Builtin::new("*", multiply),
    Builtin::new("/", divide),
    Builtin::new(">", numGreaterThan),
    Builtin::new("<", numLessThan),
    Builtin::new(">=", numGreaterOrEq),
    Builtin::new("<=", numLessOrEq),
    Builtin::new("=", equal),
    Builtin::new("abs", abs),
    Builtin::new("max", max),
    Builtin::new("min", min),
    Builtin::new("not", not),
    Builtin::new("display", display),
    Builtin::new("begin", begin),
    Builtin::new("car", car),
    Builtin::new("cdr", cdr),
    Builtin::new("cons", cons),
    Builtin::new("null?", nullp),
    Builtin::new("length", length),
    Builtin::new("eval", evalQuoted),
    Builtin::new("list?", listp),
];

/// Resolve a name against the fixed table of special forms, builtin
/// procedures and constants.
pub fn lookup(name: &str) -> Option<Obj>
{
    if let Some(value) = constant(name)
    {
        return Some(value);
    }

    if let Some(form) = SpecialForm::ALL.iter().find(|f| f.name() == name)
    {
        return Some(Obj::Procedure(Procedure::special(*form)));
    }

    BUILTINS.iter().find(|b| b.name() == name)
        .map(|b| Obj::Procedure(Procedure::builtin(b.clone())))
}

pub fn isBuiltin(name: &str) -> bool
{
    lookup(name).is_some()
}

pub fn names() -> Vec<&'static str>
{
    let mut result: Vec<&'static str> = CONSTANTS.to_vec();
    result.extend(SpecialForm::ALL.iter().map(|f| f.name()));
    result.extend(BUILTINS.iter().map(|b| b.name()));
    result
}
