use std::env;

const DEFAULT_PROMPT: &str = "lisp> ";

pub fn findPrompt() -> String
{
    if let Ok(prompt) = env::var("LISP_PROMPT")
    {
        prompt
    }
    else
    {
        DEFAULT_PROMPT.to_owned()
    }
}

/// Library files listed in `LISP_LIB_PATH`, separated by colons.
pub fn findLibs() -> Vec<String>
{
    match env::var("LISP_LIB_PATH")
    {
        Ok(paths) => splitLibPath(&paths),
        Err(_) => Vec::new(),
    }
}

fn splitLibPath(paths: &str) -> Vec<String>
{
    paths.split(':').filter(|p| !p.is_empty()).map(|p| p.to_owned()).collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn lib_path()
    {
        assert_eq!(splitLibPath("a.lisp::b/c.lisp:"),
                   vec!["a.lisp".to_owned(), "b/c.lisp".to_owned()]);
        assert!(splitLibPath("").is_empty());
    }
}
