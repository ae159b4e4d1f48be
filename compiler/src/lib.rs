//! zthrift-compiler
//!
//! This crate implements:
//!  1) A tokenizer + parser for the supported `.thrift` IDL subset
//!     (enums, structs, unions, lists, the common scalar types),
//!  2) A definition table with duplicate-name/field-id checks,
//!  3) A wire-type classifier for the compact protocol,
//!  4) Code generation (`compile_idl` → Zig source `String`), including the
//!     synthesized round-trip test,
//!  5) Error types (`ThriftError`) and caret diagnostics.

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod table;
pub mod classify;
pub mod gen_zig;
pub mod compiler;

pub use compiler::compile_idl;
pub use compiler::parse_idl;
pub use compiler::render_source_context;
