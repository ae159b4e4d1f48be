use serde::Serialize;

/// A field's type: either a named builtin/user-defined type or a list.
///
/// `Named` references are not validated at parse time; they resolve against
/// the definition table only when code is generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Type {
    Named(String),
    List(Box<Type>),
}

/// Default value attached to a field: an integer constant or an identifier
/// (typically an enum member name).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DefaultValue {
    Int(i64),
    Ident(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumMember {
    pub name:  String,
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDef {
    pub name:    String,
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub id:       i16,
    pub required: bool,
    pub ty:       Type,
    pub name:     String,
    pub default:  Option<DefaultValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDef {
    pub name:   String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionDef {
    pub name:   String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Definition {
    Enum(EnumDef),
    Struct(StructDef),
    Union(UnionDef),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Enum(d) => &d.name,
            Definition::Struct(d) => &d.name,
            Definition::Union(d) => &d.name,
        }
    }
}

/// A parsed IDL file: an ordered list of top-level definitions.
#[derive(Debug, PartialEq, Serialize)]
pub struct IdlFile {
    pub definitions: Vec<Definition>,
}

fn type_to_idl(ty: &Type) -> String {
    match ty {
        Type::Named(name) => name.clone(),
        Type::List(elem) => format!("list<{}>", type_to_idl(elem)),
    }
}

fn field_to_idl(field: &Field) -> String {
    let req = if field.required { "required" } else { "optional" };
    let mut line = format!(
        "  {}: {} {} {}",
        field.id,
        req,
        type_to_idl(&field.ty),
        field.name
    );
    match &field.default {
        Some(DefaultValue::Int(value)) => line.push_str(&format!(" = {}", value)),
        Some(DefaultValue::Ident(value)) => line.push_str(&format!(" = {}", value)),
        None => {}
    }
    line.push(';');
    line
}

/// Render the AST back as Thrift-IDL-like text.
///
/// Fields without a qualifier parse as optional, so they print as `optional`
/// here; the output is canonical rather than byte-identical to the input.
pub fn pretty_print(idl: &IdlFile) -> String {
    let mut lines: Vec<String> = Vec::new();
    for def in &idl.definitions {
        match def {
            Definition::Enum(d) => {
                lines.push(format!("enum {} {{", d.name));
                for member in &d.members {
                    match member.value {
                        Some(value) => lines.push(format!("  {} = {},", member.name, value)),
                        None => lines.push(format!("  {},", member.name)),
                    }
                }
                lines.push("}\n".to_string());
            }
            Definition::Struct(d) => {
                lines.push(format!("struct {} {{", d.name));
                for field in &d.fields {
                    lines.push(field_to_idl(field));
                }
                lines.push("}\n".to_string());
            }
            Definition::Union(d) => {
                lines.push(format!("union {} {{", d.name));
                for field in &d.fields {
                    lines.push(field_to_idl(field));
                }
                lines.push("}\n".to_string());
            }
        }
    }
    lines.join("\n")
}
