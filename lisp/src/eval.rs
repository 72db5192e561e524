use tracing::{debug, trace, warn};

use shared::error::Error;

use crate::tokenizer::tokenize;
use crate::parser::{self, Expr};
use crate::environment::Environment;
use crate::value::{Obj, Procedure, ProcedureKind, SpecialForm, Lambda};
use crate::builtin;

pub type EvalResult = Result<Obj, Error>;

/// Holds the global environment across top-level evaluations.
pub struct Evaluator
{
    env: Environment,
}

impl Evaluator
{
    pub fn new() -> Self
    {
        Self{ env: Environment::new() }
    }

    pub fn env(&self) -> &Environment
    {
        &self.env
    }

    /// Evaluate the roots in order and return the last value.
    pub fn eval(&self, roots: &[Expr]) -> EvalResult
    {
        let mut result = Obj::None;
        for root in roots
        {
            result = evalExpr(root, &self.env)?;
        }
        Ok(result)
    }

    pub fn evalSource(&self, src: &str) -> EvalResult
    {
        let tokens = tokenize(src)?;
        let roots = Expr::parseAll(tokens)?;
        self.eval(&roots)
    }
}

pub fn evalExpr(expr: &Expr, env: &Environment) -> EvalResult
{
    match expr
    {
        Expr::Atom(name) => evalAtom(name, env),
        Expr::List(nodes) => evalList(nodes, env),
    }
}

fn evalAtom(name: &str, env: &Environment) -> EvalResult
{
    if let Some(x) = parser::intLiteral(name)
    {
        Ok(Obj::Int(x))
    }
    else if let Some(x) = parser::floatLiteral(name)
    {
        Ok(Obj::Float(x))
    }
    else if let Some(v) = builtin::lookup(name)
    {
        Ok(v)
    }
    else if let Some(v) = env.find(name)
    {
        Ok(v)
    }
    else
    {
        Err(error!(UndefinedSymbol, name))
    }
}

fn evalEach(nodes: &[Expr], env: &Environment) -> Result<Vec<Obj>, Error>
{
    nodes.iter().map(|node| evalExpr(node, env)).collect()
}

fn evalList(nodes: &[Expr], env: &Environment) -> EvalResult
{
    let (head, rest) = nodes.split_first().ok_or_else(
        || error!(SyntaxError, "Cannot evaluate an empty list"))?;

    let procedure = match evalExpr(head, env)?
    {
        Obj::Procedure(p) => p,
        other => return Err(errf!(InvalidProcedure, "{} is not a procedure ({})",
                                  head, other.typeName())),
    };

    match procedure.kind()
    {
        ProcedureKind::Special(form) => evalSpecial(*form, rest, env),
        ProcedureKind::Builtin(_) | ProcedureKind::Lambda(_) =>
        {
            let args = evalEach(rest, env)?;
            apply(&procedure, &args, env)
        },
    }
}

/// Call a procedure on already evaluated arguments.
pub fn apply(procedure: &Procedure, args: &[Obj], env: &Environment) -> EvalResult
{
    trace!(procedure = procedure.name(), argc = args.len(), "apply");
    match procedure.kind()
    {
        ProcedureKind::Builtin(f) => f.call(args, env),
        ProcedureKind::Lambda(l) => callLambda(procedure, l, args),
        ProcedureKind::Special(form) =>
            Err(errf!(InvalidProcedure, "{} cannot be applied to values",
                      form.name())),
    }
}

fn callLambda(procedure: &Procedure, lambda: &Lambda, args: &[Obj]) -> EvalResult
{
    let params = lambda.params();
    if args.len() != params.len()
    {
        return Err(errf!(ArityMismatch, "{} expects {} argument(s), got {}",
                         procedure.name(), params.len(), args.len()));
    }

    let frame = lambda.env().derive();
    // The snapshot was taken before `define` bound the name, so bind it
    // here to allow self recursion.
    if !procedure.isAnonymous()
    {
        frame.define(procedure.name(), Obj::Procedure(procedure.clone()));
    }
    for (name, value) in params.iter().zip(args)
    {
        frame.define(name, value.clone());
    }

    let mut result = Obj::None;
    for expr in lambda.body()
    {
        result = evalExpr(expr, &frame)?;
    }
    Ok(result)
}

fn evalSpecial(form: SpecialForm, rest: &[Expr], env: &Environment) -> EvalResult
{
    match form
    {
        SpecialForm::Quote => evalQuote(rest),
        SpecialForm::Define => evalDefine(rest, env),
        SpecialForm::Set => evalSet(rest, env),
        SpecialForm::Lambda => evalLambda(rest, env),
        SpecialForm::If => evalIf(rest, env),
    }
}

fn evalQuote(rest: &[Expr]) -> EvalResult
{
    match rest
    {
        [] => Err(error!(ArityMismatch, "quote expects at least 1 argument(s), got 0")),
        [quoted] => Ok(Obj::Quoted(quoted.clone())),
        // (quote + 1 2) quotes the whole tail.
        _ => Ok(Obj::Quoted(Expr::List(rest.to_vec()))),
    }
}

// Symbol and value of a (define name value) or (set! name value).
fn bindingParts(form: &str, rest: &[Expr], env: &Environment)
                -> Result<(String, Obj), Error>
{
    if rest.len() != 2
    {
        return Err(errf!(ArityMismatch, "{} expects 2 argument(s), got {}",
                         form, rest.len()));
    }
    let name = rest[0].getSymbolName()?.to_owned();
    let value = evalExpr(&rest[1], env)?;
    Ok((name, value))
}

fn isLambdaForm(expr: &Expr) -> bool
{
    match expr
    {
        Expr::List(nodes) => nodes.first() == Some(&Expr::atom("lambda")),
        Expr::Atom(_) => false,
    }
}

fn evalDefine(rest: &[Expr], env: &Environment) -> EvalResult
{
    let (name, mut value) = bindingParts("define", rest, env)?;
    // Only a closure written right here takes the name. One returned by
    // a call may capture a variable of the same name.
    if isLambdaForm(&rest[1])
    {
        if let Obj::Procedure(p) = &value
        {
            value = Obj::Procedure(p.withName(&name));
        }
    }

    if builtin::isBuiltin(&name)
    {
        warn!(name = name.as_str(), "define of a builtin name is never visible");
    }
    debug!(name = name.as_str(), value = %value, "define");
    env.define(&name, value.clone());
    Ok(value)
}

fn evalSet(rest: &[Expr], env: &Environment) -> EvalResult
{
    let (name, value) = bindingParts("set!", rest, env)?;
    if env.set(&name, value.clone())
    {
        debug!(name = name.as_str(), value = %value, "set!");
        Ok(value)
    }
    else
    {
        debug!(name = name.as_str(), "set! of unbound name ignored");
        Ok(Obj::None)
    }
}

fn evalLambda(rest: &[Expr], env: &Environment) -> EvalResult
{
    let (params_node, body) = rest.split_first().ok_or_else(
        || error!(SyntaxError, "lambda expects a parameter list"))?;
    if body.is_empty()
    {
        return Err(error!(SyntaxError, "lambda expects a body"));
    }

    let params: Vec<String> = match params_node
    {
        Expr::List(nodes) => nodes.iter()
            .map(|node| node.getSymbolName().map(|s| s.to_owned()))
            .collect::<Result<Vec<String>, Error>>()?,
        Expr::Atom(_) => return Err(errf!(
            SyntaxError, "lambda expects a parameter list, got {}", params_node)),
    };

    let snapshot = env.snapshot();
    debug!(params = ?params, captured = snapshot.members().len(), "lambda");
    Ok(Obj::Procedure(Procedure::lambda(Lambda::new(snapshot, params,
                                                    body.to_vec()))))
}

fn evalIf(rest: &[Expr], env: &Environment) -> EvalResult
{
    if rest.len() != 2 && rest.len() != 3
    {
        return Err(errf!(ArityMismatch, "if expects 2 or 3 argument(s), got {}",
                         rest.len()));
    }

    if evalExpr(&rest[0], env)?.toBool()
    {
        evalExpr(&rest[1], env)
    }
    else if let Some(alternate) = rest.get(2)
    {
        evalExpr(alternate, env)
    }
    else
    {
        Ok(Obj::None)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn floatEq(lhs: Obj, rhs: Obj, delta: f64) -> bool
    {
        let l = if let Some(x) = lhs.asFloat()
        {
            x
        }
        else
        {
            return false;
        };

        let r = if let Some(x) = rhs.asFloat()
        {
            x
        }
        else
        {
            return false;
        };

        if (l - r).abs() < delta
        {
            true
        }
        else
        {
            println!("{} != {}", l, r);
            false
        }
    }

    fn assert_float_eq(lhs: Obj, rhs: f64)
    {
        assert!(lhs.isFloat());
        assert!(floatEq(lhs, Obj::Float(rhs), 1e-5));
    }

    fn evalSource(src: &str) -> EvalResult
    {
        Evaluator::new().evalSource(src)
    }

    #[test]
    fn plus() -> Result<(), Error>
    {
        let result = evalSource(r#"(+ 1 2)"#)?;
        assert_eq!(result, Obj::Int(3));
        let result = evalSource(r#"(+ 1.6 2)"#)?;
        assert_float_eq(result, 3.6);
        let result = evalSource(r#"(+ 1 2.0)"#)?;
        assert_float_eq(result, 3.0);
        let result = evalSource(r#"(+ 1 (+ 2.5 1) 2)"#)?;
        assert_float_eq(result, 6.5);
        Ok(())
    }

    #[test]
    fn minus() -> Result<(), Error>
    {
        let result = evalSource(r#"(- 1 2)"#)?;
        assert_eq!(result, Obj::Int(-1));
        let result = evalSource(r#"(- 1.6 2)"#)?;
        assert_float_eq(result, -0.4);
        let result = evalSource(r#"(- 1 (- 2.5 1) 2)"#)?;
        assert_float_eq(result, -2.5);
        Ok(())
    }

    #[test]
    fn multiply_divide() -> Result<(), Error>
    {
        let result = evalSource(r#"(* 1 (* 2.5 1) 2)"#)?;
        assert_float_eq(result, 5.0);
        let result = evalSource(r#"(/ 2 1)"#)?;
        assert_eq!(result, Obj::Int(2));
        let result = evalSource(r#"(/ 1 2)"#)?;
        assert_float_eq(result, 0.5);
        let result = evalSource(r#"(/ 1 (/ 2.5 1) 2)"#)?;
        assert_float_eq(result, 1.0 / 2.5 / 2.0);
        Ok(())
    }

    #[test]
    fn atoms() -> Result<(), Error>
    {
        assert_eq!(evalSource("42")?, Obj::Int(42));
        assert_float_eq(evalSource("-1.25")?, -1.25);
        assert_eq!(evalSource("#t")?, Obj::Bool(true));
        assert!(matches!(evalSource("nope"), Err(Error::UndefinedSymbol(_))));
        Ok(())
    }

    #[test]
    fn define_then_use() -> Result<(), Error>
    {
        let e = Evaluator::new();
        assert_eq!(e.evalSource("(define x 5)")?, Obj::Int(5));
        assert_eq!(e.evalSource("(+ x 1)")?, Obj::Int(6));
        e.evalSource("(define x 7)")?;
        assert_eq!(e.evalSource("x")?, Obj::Int(7));
        e.evalSource("(define 世界 1)")?;
        assert_eq!(e.evalSource("世界")?, Obj::Int(1));
        Ok(())
    }

    #[test]
    fn define_needs_symbol()
    {
        assert!(matches!(evalSource("(define 1 2)"), Err(Error::SyntaxError(_))));
        assert!(matches!(evalSource("(define x)"), Err(Error::ArityMismatch(_))));
    }

    #[test]
    fn set_existing_and_unbound() -> Result<(), Error>
    {
        let e = Evaluator::new();
        e.evalSource("(define r 10)")?;
        assert_eq!(e.evalSource("(set! r 2)")?, Obj::Int(2));
        assert_eq!(e.evalSource("r")?, Obj::Int(2));

        assert_eq!(e.evalSource("(set! undefined_name 5)")?, Obj::None);
        assert_eq!(e.env().find("undefined_name"), None);
        assert!(e.evalSource("undefined_name").is_err());
        Ok(())
    }

    #[test]
    fn lambda_call() -> Result<(), Error>
    {
        assert_eq!(evalSource("((lambda (x) (+ x 1)) 2)")?, Obj::Int(3));
        let e = Evaluator::new();
        e.evalSource("(define f (lambda (x) (+ 2 x)))")?;
        assert_eq!(e.evalSource("(f 4)")?, Obj::Int(6));
        assert_eq!(e.evalSource("f")?.to_string(), "f:procedure");
        Ok(())
    }

    #[test]
    fn lambda_body_sequence() -> Result<(), Error>
    {
        let e = Evaluator::new();
        e.evalSource("(define g (lambda (x) (define y (* x 2)) (+ y 1)))")?;
        assert_eq!(e.evalSource("(g 3)")?, Obj::Int(7));
        // Definitions inside the body stay in the call frame.
        assert_eq!(e.env().find("y"), None);
        Ok(())
    }

    #[test]
    fn higher_order() -> Result<(), Error>
    {
        let e = Evaluator::new();
        e.evalSource("(define adder (lambda (x) (lambda (y) (+ y x))))")?;
        e.evalSource("(define add2 (adder 2))")?;
        assert_eq!(e.evalSource("(add2 4)")?, Obj::Int(6));
        assert_eq!(e.evalSource("((adder 10) 1)")?, Obj::Int(11));
        Ok(())
    }

    #[test]
    fn captured_name_same_as_defined_name() -> Result<(), Error>
    {
        let e = Evaluator::new();
        e.evalSource("(define adder (lambda (x) (lambda (y) (+ y x))))")?;
        e.evalSource("(define x (adder 2))")?;
        assert_eq!(e.evalSource("(x 4)")?, Obj::Int(6));
        assert_eq!(e.evalSource("x")?.to_string(), "lambda:procedure");

        e.evalSource("(define g (lambda (g) (* g 2)))")?;
        assert_eq!(e.evalSource("(g 5)")?, Obj::Int(10));
        Ok(())
    }

    #[test]
    fn closure_isolation() -> Result<(), Error>
    {
        let e = Evaluator::new();
        e.evalSource("(define r 2)")?;
        e.evalSource("(define f (lambda (x) (+ r x)))")?;
        e.evalSource("(define r 10)")?;
        assert_eq!(e.evalSource("(f 1)")?, Obj::Int(3));
        e.evalSource("(set! r 20)")?;
        assert_eq!(e.evalSource("(f 1)")?, Obj::Int(3));
        Ok(())
    }

    #[test]
    fn closure_state_is_private() -> Result<(), Error>
    {
        let e = Evaluator::new();
        e.evalSource("(define n 0)")?;
        e.evalSource("(define bump (lambda () (set! n (+ n 1))))")?;
        assert_eq!(e.evalSource("(bump)")?, Obj::Int(1));
        assert_eq!(e.evalSource("(bump)")?, Obj::Int(2));
        assert_eq!(e.evalSource("n")?, Obj::Int(0));
        Ok(())
    }

    #[test]
    fn recursion() -> Result<(), Error>
    {
        let e = Evaluator::new();
        e.evalSource(
            "(define fact (lambda (n) (if (= n 0) 1 (* n (fact (- n 1))))))")?;
        assert_eq!(e.evalSource("(fact 10)")?, Obj::Int(3628800));
        Ok(())
    }

    #[test]
    fn arity_mismatch() -> Result<(), Error>
    {
        let e = Evaluator::new();
        e.evalSource("(define f (lambda (x) x))")?;
        assert!(matches!(e.evalSource("(f 1 2)"), Err(Error::ArityMismatch(_))));
        assert!(matches!(e.evalSource("(f)"), Err(Error::ArityMismatch(_))));
        // The interpreter is still usable afterwards.
        assert_eq!(e.evalSource("(f 9)")?, Obj::Int(9));
        Ok(())
    }

    #[test]
    fn bad_lambdas()
    {
        assert!(matches!(evalSource("(lambda x x)"), Err(Error::SyntaxError(_))));
        assert!(matches!(evalSource("(lambda (x))"), Err(Error::SyntaxError(_))));
        assert!(matches!(evalSource("(lambda (1) 1)"), Err(Error::SyntaxError(_))));
    }

    #[test]
    fn if_truthiness() -> Result<(), Error>
    {
        assert_eq!(evalSource("(if 0 2 1)")?, Obj::Int(2));
        assert_eq!(evalSource("(if #f 2 1)")?, Obj::Int(1));
        assert_eq!(evalSource("(if (> -1 0) 2 1)")?, Obj::Int(1));
        assert_eq!(evalSource("(if #f 2)")?, Obj::None);
        assert_eq!(evalSource("(if (if #f 1) 2 3)")?, Obj::Int(3));
        assert!(matches!(evalSource("(if #t)"), Err(Error::ArityMismatch(_))));
        Ok(())
    }

    #[test]
    fn if_skips_untaken_branch() -> Result<(), Error>
    {
        let e = Evaluator::new();
        assert_eq!(e.evalSource("(if #t 1 (undefined-thing))")?, Obj::Int(1));
        assert_eq!(e.evalSource("(if #f (define hit 1) 2)")?, Obj::Int(2));
        assert_eq!(e.env().find("hit"), None);
        Ok(())
    }

    #[test]
    fn quote() -> Result<(), Error>
    {
        assert_eq!(evalSource("(quote x)")?, Obj::Quoted(Expr::atom("x")));
        assert_eq!(evalSource("`x")?, Obj::Quoted(Expr::atom("x")));
        assert_eq!(evalSource("(quote (a b))")?.to_string(), "(a b)");
        assert_eq!(evalSource("(quote + 1 2)")?.to_string(), "(+ 1 2)");
        assert!(matches!(evalSource("(quote)"), Err(Error::ArityMismatch(_))));
        Ok(())
    }

    #[test]
    fn quote_eval_round_trip() -> Result<(), Error>
    {
        for src in &["1", "(+ 1 2)", "(* 2 (- 5 3.5))", "(if 0 2 1)",
                     "((lambda (x) (* x x)) 7)"]
        {
            let direct = evalSource(src)?;
            let round = evalSource(&format!("(eval (quote {}))", src))?;
            assert_eq!(direct, round, "{}", src);
        }
        Ok(())
    }

    #[test]
    fn eval_code_as_data() -> Result<(), Error>
    {
        let e = Evaluator::new();
        e.evalSource("(define e (quote + 1 2))")?;
        assert_eq!(e.evalSource("(eval e)")?, Obj::Int(3));
        assert_eq!(e.evalSource("(eval (car `(1 1 1)))")?, Obj::Int(1));
        assert_eq!(e.evalSource("(eval (car `((+ 1 1))))")?, Obj::Int(2));
        assert_eq!(e.evalSource("(eval (cons `+ `(1 1)))")?, Obj::Int(2));
        assert_eq!(e.evalSource("(eval (cons + `(2 3)))")?, Obj::Int(5));
        assert_eq!(e.evalSource("(eval 4)")?, Obj::Int(4));
        assert_eq!(e.evalSource("(eval (cons - `(2.5 1)))")?, Obj::Float(1.5));
        assert!(matches!(e.evalSource("(cons (/ 1.0 0) `())"),
                         Err(Error::TypeMismatch(_))));
        // eval sees the caller's bindings.
        assert_eq!(e.evalSource("((lambda (y) (eval `(* y 3))) 5)")?, Obj::Int(15));
        Ok(())
    }

    #[test]
    fn car_cdr_cons() -> Result<(), Error>
    {
        assert_eq!(evalSource("(car (quote (1 2 3)))")?.to_string(), "1");
        assert_eq!(evalSource("(cdr (quote (1 2 3)))")?.to_string(), "(2 3)");
        assert_eq!(evalSource("(cdr (quote 1 2 3))")?.to_string(), "(2 3)");
        assert_eq!(evalSource("(cons `1 `(1 1))")?.to_string(), "(1 1 1)");
        assert_eq!(evalSource("(cons `(a b) `(b c d))")?.to_string(),
                   "((a b) b c d)");
        assert_eq!(evalSource("(cons `(a b) `c)")?.to_string(), "((a b) c)");
        assert_eq!(evalSource("(cons `a `3)")?.to_string(), "(a 3)");
        Ok(())
    }

    #[test]
    fn computed_head() -> Result<(), Error>
    {
        assert_eq!(evalSource("((if #t + -) 3 2)")?, Obj::Int(5));
        assert_eq!(evalSource("((if #f + -) 3 2)")?, Obj::Int(1));
        Ok(())
    }

    #[test]
    fn invalid_procedure()
    {
        assert!(matches!(evalSource("(1 2 3)"), Err(Error::InvalidProcedure(_))));
        assert!(matches!(evalSource("((quote x) 1)"),
                         Err(Error::InvalidProcedure(_))));
        assert!(matches!(evalSource("()"), Err(Error::SyntaxError(_))));
    }

    #[test]
    fn builtins_win_over_env() -> Result<(), Error>
    {
        let e = Evaluator::new();
        e.evalSource("(define car 1)")?;
        assert_eq!(e.evalSource("(car `(5 6))")?.to_string(), "5");
        Ok(())
    }

    #[test]
    fn begin_and_display() -> Result<(), Error>
    {
        assert_eq!(evalSource("(begin 1 2 3)")?, Obj::Int(3));
        assert_eq!(evalSource("(begin)")?, Obj::None);
        assert_eq!(evalSource("(display 1 2)")?, Obj::Int(2));
        Ok(())
    }

    #[test]
    fn many_roots() -> Result<(), Error>
    {
        assert_eq!(evalSource("(define x 1) (define y 2) (+ x y)")?, Obj::Int(3));
        assert_eq!(evalSource("")?, Obj::None);
        Ok(())
    }
}
