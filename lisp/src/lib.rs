#![allow(non_snake_case)]

#[macro_use]
extern crate shared;

pub mod tokenizer;
pub mod parser;
pub mod value;
pub mod environment;
pub mod eval;
pub mod builtin;
pub mod runtime_env;
pub mod user_utils;
