use std::rc::Rc;
use std::cell::RefCell;
use std::collections::HashMap;

use crate::value::Obj;

struct EnvironmentInner
{
    parent: Option<Environment>,
    values: HashMap<String, Obj>,
}

impl EnvironmentInner
{
    fn new() -> Self
    {
        Self{ parent: None, values: HashMap::new() }
    }
}

/// A frame of bindings with an optional enclosing frame. Clones share
/// the same frame.
#[derive(Clone)]
pub struct Environment
{
    inner: Rc<RefCell<EnvironmentInner>>
}

impl Environment
{
    pub fn new() -> Self
    {
        Self::wrap(EnvironmentInner::new())
    }

    fn wrap(env: EnvironmentInner) -> Self
    {
        Self{ inner: Rc::new(RefCell::new(env)) }
    }

    /// A fresh child frame.
    pub fn derive(&self) -> Self
    {
        let result = Self::new();
        result.inner.borrow_mut().parent = Some(self.clone());
        result
    }

    /// Copy every binding visible from here into one new, unlinked
    /// frame. Inner bindings shadow outer ones.
    pub fn snapshot(&self) -> Self
    {
        let result = Self::new();
        self.copyInto(&mut result.inner.borrow_mut().values);
        result
    }

    fn copyInto(&self, values: &mut HashMap<String, Obj>)
    {
        let inner = self.inner.borrow();
        if let Some(parent) = &inner.parent
        {
            parent.copyInto(values);
        }
        for (name, value) in &inner.values
        {
            values.insert(name.clone(), value.clone());
        }
    }

    pub fn members(&self) -> Vec<String>
    {
        let mut result = Vec::new();
        for (name, _) in &self.inner.borrow().values
        {
            result.push(name.clone());
        }
        result
    }

    pub fn find(&self, name: &str) -> Option<Obj>
    {
        let inner = self.inner.borrow();
        if let Some(v) = inner.values.get(name)
        {
            Some(v.clone())
        }
        else if let Some(env) = &inner.parent
        {
            env.find(name)
        }
        else
        {
            None
        }
    }

    /// Overwrite the nearest existing binding of `name`. Return false
    /// if there is none.
    pub fn set(&self, name: &str, value: Obj) -> bool
    {
        let mut inner = self.inner.borrow_mut();
        if let Some(slot) = inner.values.get_mut(name)
        {
            *slot = value;
            true
        }
        else if let Some(ref upper) = inner.parent
        {
            upper.set(name, value)
        }
        else
        {
            false
        }
    }

    pub fn define(&self, name: &str, value: Obj)
    {
        self.inner.borrow_mut().values.insert(name.to_owned(), value);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn chain_lookup()
    {
        let global = Environment::new();
        global.define("x", Obj::Int(1));
        let local = global.derive();
        local.define("y", Obj::Int(2));
        assert_eq!(local.find("x"), Some(Obj::Int(1)));
        assert_eq!(local.find("y"), Some(Obj::Int(2)));
        assert_eq!(global.find("y"), None);
        assert!(!local.members().contains(&"x".to_owned()));
    }

    #[test]
    fn set_walks_chain()
    {
        let global = Environment::new();
        global.define("x", Obj::Int(1));
        let local = global.derive();
        assert!(local.set("x", Obj::Int(5)));
        assert_eq!(global.find("x"), Some(Obj::Int(5)));
        assert!(!local.set("nope", Obj::Int(5)));
        assert_eq!(local.find("nope"), None);
        assert_eq!(global.find("nope"), None);
    }

    #[test]
    fn snapshot_is_detached()
    {
        let global = Environment::new();
        global.define("r", Obj::Int(2));
        let local = global.derive();
        local.define("x", Obj::Int(3));
        local.define("r", Obj::Int(4));

        let snap = local.snapshot();
        global.define("r", Obj::Int(10));
        local.define("x", Obj::Int(30));
        assert_eq!(snap.find("r"), Some(Obj::Int(4)));
        assert_eq!(snap.find("x"), Some(Obj::Int(3)));

        snap.define("z", Obj::Int(0));
        assert_eq!(local.find("z"), None);
    }

    #[test]
    fn snapshot_flattens()
    {
        let global = Environment::new();
        global.define("k", Obj::Bool(true));
        let local = global.derive();
        local.define("j", Obj::Int(1));
        let mut names = local.snapshot().members();
        names.sort();
        assert_eq!(names, vec!["j".to_owned(), "k".to_owned()]);
    }
}
