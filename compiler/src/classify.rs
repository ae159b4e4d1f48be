use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{
    error::ThriftError,
    table::DefTable,
    types::{Definition, Type},
};

lazy_static! {
    /// builtin scalar name → wire tag
    static ref SCALAR_WIRE: HashMap<&'static str, WireType> = {
        let mut m = HashMap::new();
        m.insert("bool", WireType::Bool);
        m.insert("double", WireType::Double);
        m.insert("string", WireType::String);
        m.insert("binary", WireType::String);
        m.insert("i8", WireType::Byte);
        m.insert("i16", WireType::I16);
        m.insert("i32", WireType::I32);
        m.insert("i64", WireType::I64);
        m
    };

    /// builtin scalar name → Zig surface type
    static ref SCALAR_ZIG: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("bool", "bool");
        m.insert("double", "f64");
        m.insert("string", "[]const u8");
        m.insert("binary", "[]const u8");
        m.insert("i8", "i8");
        m.insert("i16", "i16");
        m.insert("i32", "i32");
        m.insert("i64", "i64");
        m
    };
}

/// Wire-level type tag of the compact protocol, as spelled in generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    String,
    Struct,
}

impl WireType {
    /// `TType` member name stamped into field markers and list headers.
    pub fn ttype(self) -> &'static str {
        match self {
            WireType::Bool => "BOOL",
            WireType::Byte => "BYTE",
            WireType::I16 => "I16",
            WireType::I32 => "I32",
            WireType::I64 => "I64",
            WireType::Double => "DOUBLE",
            WireType::String => "STRING",
            WireType::Struct => "STRUCT",
        }
    }

    /// Writer frame variant carrying this tag's payload. Struct payloads are
    /// delegated to the nested type's own `write`, and double payloads have
    /// no frame yet.
    pub fn write_frame(self) -> Result<&'static str, ThriftError> {
        match self {
            WireType::Bool => Ok("Bool"),
            WireType::Byte => Ok("I08"),
            WireType::I16 => Ok("I16"),
            WireType::I32 => Ok("I32"),
            WireType::I64 => Ok("I64"),
            WireType::String => Ok("Binary"),
            WireType::Double => Err(ThriftError::NotImplemented(
                "writing double fields".to_string(),
            )),
            WireType::Struct => Err(ThriftError::NotImplemented(
                "writing struct payloads as frames".to_string(),
            )),
        }
    }

    /// Reader method for basic, non-allocating payloads. Strings require an
    /// allocator and structs delegate, so neither has a plain read method.
    pub fn read_fn(self) -> Option<&'static str> {
        match self {
            WireType::Bool => Some("readBool"),
            WireType::Byte => Some("readI08"),
            WireType::I16 => Some("readI16"),
            WireType::I32 => Some("readI32"),
            WireType::I64 => Some("readI64"),
            WireType::Double => Some("readDouble"),
            WireType::String | WireType::Struct => None,
        }
    }
}

/// Classification of a type expression: its wire tag plus whether values are
/// narrowed through an i32 representation as an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub wire:    WireType,
    pub is_enum: bool,
}

/// Map a type to its wire tag, resolving names through the table.
///
/// List types are classified at their element level only; `list<list<...>>`
/// is not supported by the generator and fails here.
pub fn classify(ty: &Type, table: &DefTable) -> Result<TypeInfo, ThriftError> {
    match ty {
        Type::Named(name) => {
            if let Some(&wire) = SCALAR_WIRE.get(name.as_str()) {
                return Ok(TypeInfo {
                    wire,
                    is_enum: false,
                });
            }
            match table.resolve(name)? {
                Definition::Enum(_) => Ok(TypeInfo {
                    wire:    WireType::I32,
                    is_enum: true,
                }),
                Definition::Struct(_) | Definition::Union(_) => Ok(TypeInfo {
                    wire:    WireType::Struct,
                    is_enum: false,
                }),
            }
        }
        Type::List(elem) => match elem.as_ref() {
            Type::List(_) => Err(ThriftError::NotImplemented(
                "list<list<...>> fields".to_string(),
            )),
            elem => classify(elem, table),
        },
    }
}

/// Ownership class of a type, used by the generated release logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Non-allocating scalar (integers, bool, double, enums).
    Inline,
    /// Allocating leaf: string/binary buffers.
    AllocatedLeaf,
    /// Owning composite: struct or union with its own deinit.
    Composite,
    /// List backing storage, plus recursively its element's class.
    List,
}

pub fn ownership(ty: &Type, table: &DefTable) -> Result<Ownership, ThriftError> {
    match ty {
        Type::Named(name) => {
            if name == "string" || name == "binary" {
                return Ok(Ownership::AllocatedLeaf);
            }
            if SCALAR_WIRE.contains_key(name.as_str()) {
                return Ok(Ownership::Inline);
            }
            match table.resolve(name)? {
                Definition::Enum(_) => Ok(Ownership::Inline),
                Definition::Struct(_) | Definition::Union(_) => Ok(Ownership::Composite),
            }
        }
        Type::List(_) => Ok(Ownership::List),
    }
}

/// Zig surface type for a field or element; non-required fields wrap in `?`.
pub fn zig_type(ty: &Type, required: bool) -> String {
    let base = match ty {
        Type::Named(name) => SCALAR_ZIG
            .get(name.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| name.clone()),
        Type::List(elem) => format!("std.ArrayList({})", zig_type(elem, true)),
    };
    if required {
        base
    } else {
        format!("?{}", base)
    }
}
