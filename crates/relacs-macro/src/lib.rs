//! Macro file parsing and the command-stack interpreter that drives the
//! RePro runtime (spec.md §4.7): a text grammar of `macro` headers and
//! indented commands, expanded with `$variable` substitution and numeric
//! range parameters, walked by [`MacroEngine`] one [`ExecutedCommand`] at
//! a time.

mod ast;
mod engine;
mod error;
mod parser;
mod range_param;

pub use ast::{ActionFlag, CommandKind, MacroCommand, MacroDef, ParamList};
pub use engine::{ExecutedCommand, MacroEngine};
pub use error::{MacroError, MacroResult};
pub use parser::{parse_macro_file, parse_params};
pub use range_param::{looks_like_range, parse_range_param};
