use crate::{
    error::ThriftError, gen_zig::generate_zig, parser::Parser, table::DefTable, types::IdlFile,
};

/// Parse IDL text into an AST.
/// Returns `Err(ThriftError)` if tokenization or parsing fails.
pub fn parse_idl(text: &str) -> Result<IdlFile, ThriftError> {
    Parser::new(text)?.parse()
}

/// Compile IDL text all the way to generated Zig source.
/// Returns `Err(ThriftError)` if any pipeline stage fails.
pub fn compile_idl(text: &str) -> Result<String, ThriftError> {
    let idl = parse_idl(text)?;
    let table = DefTable::build(&idl)?;
    generate_zig(&idl, &table)
}

/// Reproduce the offending source line (and the line above it) with a caret
/// under the failing column, to aid schema authors.
pub fn render_source_context(text: &str, row: usize, col: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = String::new();
    if row > 1 {
        if let Some(prev) = lines.get(row - 2) {
            out.push_str(prev);
            out.push('\n');
        }
    }
    if row >= 1 {
        if let Some(line) = lines.get(row - 1) {
            out.push_str(line);
            out.push('\n');
            out.push_str(&" ".repeat(col.saturating_sub(1)));
            out.push_str("^\n");
        }
    }
    out
}
