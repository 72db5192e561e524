use std::fs;
use std::io::{BufRead, Write};

use tracing::{debug, warn};

use shared::error::Error;

use crate::eval::Evaluator;
use crate::value::Obj;
use crate::runtime_env::findLibs;

pub fn loadLibs(eval: &Evaluator, lib_files: &[&str]) -> Result<(), Error>
{
    for f in lib_files
    {
        let lib_src = fs::read_to_string(f)
            .map_err(|e| rterr!("Failed to load file {}, {}", f, e))?;
        eval.evalSource(&lib_src)?;
        debug!(file = *f, "library loaded");
    }
    Ok(())
}

/// An evaluator with the libraries from `LISP_LIB_PATH` and then
/// `lib_files` loaded.
pub fn getEval(lib_files: &[&str]) -> Result<Evaluator, Error>
{
    let eval = Evaluator::new();
    let env_libs = findLibs();
    let env_libs: Vec<&str> = env_libs.iter().map(|s| s.as_str()).collect();
    loadLibs(&eval, &env_libs)?;
    loadLibs(&eval, lib_files)?;
    Ok(eval)
}

pub fn runSource(src: &str, lib_files: &[&str]) -> Result<Obj, Error>
{
    getEval(lib_files)?.evalSource(src)
}

pub fn runFile(filename: &str, lib_files: &[&str]) -> Result<Obj, Error>
{
    let src = fs::read_to_string(filename)
        .map_err(|e| rterr!("Failed to load file {}, {}", filename, e))?;
    runSource(&src, lib_files)
}

/// Evaluate one line of input. Return None when the line asks to
/// exit. Failures come back as `Obj::Error`.
pub fn evalLine(eval: &Evaluator, line: &str) -> Option<Obj>
{
    let line = line.trim();
    if line == "exit" || line == "(exit)"
    {
        return None;
    }

    match eval.evalSource(line)
    {
        Ok(value) => Some(value),
        Err(e) =>
        {
            warn!(input = line, error = %e, "evaluation failed");
            Some(Obj::from(e))
        },
    }
}

/// Read lines from `input` until it ends or asks to exit, printing
/// each result. A failing line never stops the loop.
pub fn runRepl<R: BufRead, W: Write>(eval: &Evaluator, input: R, output: &mut W,
                                     prompt: Option<&str>) -> Result<(), Error>
{
    let io_err = |e: std::io::Error| rterr!("I/O error: {}", e);
    let mut lines = input.lines();
    loop
    {
        if let Some(p) = prompt
        {
            write!(output, "{}", p).map_err(io_err)?;
            output.flush().map_err(io_err)?;
        }

        let line = match lines.next()
        {
            Some(line) => line.map_err(io_err)?,
            None => break,
        };
        if line.trim().is_empty()
        {
            continue;
        }

        match evalLine(eval, &line)
        {
            None => break,
            Some(Obj::None) => {},
            Some(value) => writeln!(output, "{}", value).map_err(io_err)?,
        }
    }
    Ok(())
}
