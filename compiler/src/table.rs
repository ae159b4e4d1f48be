use std::collections::HashMap;

use crate::{
    error::ThriftError,
    types::{Definition, Field, IdlFile},
    utils::quote,
};

/// Name → definition lookup, built once per file and read-only afterwards.
///
/// Name resolution is deliberately deferred to code generation: the parser
/// accepts any identifier as a type, and an undeclared reference only
/// surfaces here as an [`ThriftError::UnknownType`] lookup failure.
#[derive(Debug)]
pub struct DefTable<'a> {
    map: HashMap<&'a str, &'a Definition>,
}

impl<'a> DefTable<'a> {
    /// Build the table from a parsed file.
    ///
    /// Rejects duplicate definition names and duplicate field ids within one
    /// struct/union: a duplicate id would otherwise produce a field-tag
    /// enumeration with duplicate discriminants in the generated code.
    pub fn build(idl: &'a IdlFile) -> Result<Self, ThriftError> {
        let mut map: HashMap<&'a str, &'a Definition> = HashMap::new();
        for def in &idl.definitions {
            if map.insert(def.name(), def).is_some() {
                return Err(ThriftError::Schema(format!(
                    "The type {} is defined twice",
                    quote(def.name())
                )));
            }
            let fields: &[Field] = match def {
                Definition::Struct(d) => &d.fields,
                Definition::Union(d) => &d.fields,
                Definition::Enum(_) => continue,
            };
            let mut seen: Vec<i16> = Vec::new();
            for field in fields {
                if seen.contains(&field.id) {
                    return Err(ThriftError::Schema(format!(
                        "The id {} for field {} in {} is used twice",
                        field.id,
                        quote(&field.name),
                        quote(def.name())
                    )));
                }
                seen.push(field.id);
            }
        }
        Ok(DefTable { map })
    }

    pub fn get(&self, name: &str) -> Option<&'a Definition> {
        self.map.get(name).copied()
    }

    /// Resolve a named reference or fail with an unknown-type error.
    pub fn resolve(&self, name: &str) -> Result<&'a Definition, ThriftError> {
        self.get(name)
            .ok_or_else(|| ThriftError::UnknownType(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn parse(src: &str) -> IdlFile {
        Parser::new(src).unwrap().parse().unwrap()
    }

    #[test]
    fn test_resolution() {
        let idl = parse("enum E { A = 1 }\nstruct S { 1: E e; }");
        let table = DefTable::build(&idl).unwrap();
        assert!(matches!(table.resolve("E").unwrap(), Definition::Enum(_)));
        assert!(matches!(table.resolve("S").unwrap(), Definition::Struct(_)));
        assert!(matches!(
            table.resolve("Missing").unwrap_err(),
            ThriftError::UnknownType(name) if name == "Missing"
        ));
    }

    #[test]
    fn test_duplicate_definition_name() {
        let idl = parse("struct S { 1: i32 x; }\nstruct S { 1: i64 y; }");
        let err = DefTable::build(&idl).unwrap_err();
        assert!(matches!(err, ThriftError::Schema(msg) if msg.contains("defined twice")));
    }

    #[test]
    fn test_duplicate_field_id() {
        let idl = parse("struct S { 1: i32 x; 1: i64 y; }");
        let err = DefTable::build(&idl).unwrap_err();
        assert!(matches!(err, ThriftError::Schema(msg) if msg.contains("used twice")));
    }
}
