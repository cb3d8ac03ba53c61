#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod check;
pub mod list;
pub mod table;
