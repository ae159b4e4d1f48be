use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{
    classify::{classify, ownership, zig_type, Ownership, WireType},
    error::ThriftError,
    table::DefTable,
    types::{DefaultValue, Definition, EnumDef, Field, IdlFile, StructDef, Type, UnionDef},
};

lazy_static! {
    /// Deterministic sample literal per scalar type, used by the synthesized
    /// round-trip test.
    static ref SAMPLE_LITERALS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("bool", "true");
        m.insert("i8", "12");
        m.insert("i16", "123");
        m.insert("i32", "12345");
        m.insert("i64", "123456789");
        m.insert("string", "\"hello world\"");
        m.insert("binary", "\"hello world\"");
        m.insert("double", "3.14");
        m
    };
}

const HEADER: &str = r#"// Generated by zthrift. Do not edit by hand.
const std = @import("std");
const TCompactProtocol = @import("TCompactProtocol.zig");
const Writer = TCompactProtocol.Writer;
const Reader = TCompactProtocol.Reader;
const TType = TCompactProtocol.TType;
const FieldMeta = TCompactProtocol.FieldMeta;
const WriterError = Writer.WriterError;
const CompactProtocolError = Reader.CompactProtocolError;
const ThriftError = Reader.ThriftError;

fn use_arg(t: anytype) void {
    _ = t;
}

fn readFieldOrStop(r: *Reader) CompactProtocolError!?FieldMeta {
    const field = try r.readFieldBegin();
    if (field.tp == .STOP) return null;
    return field;
}

/// Wraps struct/union read and maps RequiredFieldMissing/CantParseUnion to
/// null, so a nested record that fails to parse degrades to "field not set".
fn readCatchThrift(T: type, r: *Reader, alloc: std.mem.Allocator) CompactProtocolError!?T {
    if (T.read(r, alloc)) |value| {
        return value;
    } else |err| switch (err) {
        ThriftError.CantParseUnion, ThriftError.RequiredFieldMissing => {
            return null;
        },
        else => |other| return other,
    }
}"#;

/// Generate the full Zig output for a parsed file: header, one emitted
/// definition per schema definition in source order, and the synthesized
/// round-trip test.
pub fn generate_zig(idl: &IdlFile, table: &DefTable) -> Result<String, ThriftError> {
    Generator { idl, table }.generate()
}

struct Generator<'a> {
    idl:   &'a IdlFile,
    table: &'a DefTable<'a>,
}

impl<'a> Generator<'a> {
    fn generate(&self) -> Result<String, ThriftError> {
        let mut parts = vec![HEADER.to_string()];
        for def in &self.idl.definitions {
            match def {
                Definition::Enum(d) => parts.push(self.generate_enum(d)?),
                Definition::Struct(d) => parts.push(self.generate_struct(d)?),
                Definition::Union(d) => parts.push(self.generate_union(d)?),
            }
        }
        parts.push(self.generate_test_block()?);
        Ok(parts.join("\n\n"))
    }

    // --- enums ---

    fn generate_enum(&self, def: &EnumDef) -> Result<String, ThriftError> {
        let mut lines = vec![format!("pub const {} = enum(i32) {{", def.name)];
        for member in &def.members {
            let value = member.value.ok_or_else(|| {
                ThriftError::NotImplemented(format!(
                    "enum member {}.{} has no explicit value (auto-numbering)",
                    def.name, member.name
                ))
            })?;
            lines.push(format!("    {} = {},", member.name, value));
        }
        lines.push("    _,".to_string());
        lines.push("};".to_string());
        Ok(lines.join("\n"))
    }

    // --- structs ---

    fn generate_struct(&self, def: &StructDef) -> Result<String, ThriftError> {
        let mut lines = vec![format!("pub const {} = struct {{", def.name)];
        for field in &def.fields {
            let mut item = format!("    {}: {}", field.name, zig_type(&field.ty, field.required));
            if let Some(default) = &field.default {
                item.push_str(&format!(" = {}", self.default_literal(field, default)));
            }
            item.push(',');
            lines.push(item);
        }
        lines.push(String::new());
        lines.push(self.field_tag_enum(&def.fields));
        lines.push(String::new());
        lines.push(self.gen_struct_write(def)?);
        lines.push(String::new());
        lines.push(self.gen_struct_read(def)?);
        lines.push(String::new());
        lines.push(self.gen_struct_deinit(def)?);
        lines.push("};".to_string());
        Ok(lines.join("\n"))
    }

    /// The closed field-name → field-id enumeration. The trailing `_` makes
    /// the enum non-exhaustive so unknown wire ids land in the default prong
    /// of the reader's dispatch and get skipped.
    fn field_tag_enum(&self, fields: &[Field]) -> String {
        let mut lines = vec!["    pub const FieldTag = enum(i16) {".to_string()];
        for field in fields {
            lines.push(format!("        {} = {},", field.name, field.id));
        }
        lines.push("        _,".to_string());
        lines.push("    };".to_string());
        lines.join("\n")
    }

    fn gen_struct_write(&self, def: &StructDef) -> Result<String, ThriftError> {
        let mut lines = Vec::new();
        lines.push(format!(
            "    pub fn write(self: *const {}, w: *Writer) WriterError!void {{",
            def.name
        ));
        if def.fields.is_empty() {
            lines.push("        use_arg(self);".to_string());
        }
        lines.push("        try w.write(.StructBegin);".to_string());
        for field in &def.fields {
            let ttype = self.field_ttype(&field.ty)?;
            if field.required {
                // the required-field invariant was satisfied at construction
                // time, so no presence check here
                lines.push(format!(
                    "        try w.write(.{{ .FieldBegin = .{{ .tp = .{}, .id = {} }} }});",
                    ttype, field.id
                ));
                self.emit_write_value(
                    &mut lines,
                    "        ",
                    &format!("self.{}", field.name),
                    &field.ty,
                )?;
                lines.push("        try w.write(.FieldEnd);".to_string());
            } else {
                // absent optional fields cost zero wire bytes
                lines.push(format!("        if (self.{}) |value| {{", field.name));
                lines.push(format!(
                    "            try w.write(.{{ .FieldBegin = .{{ .tp = .{}, .id = {} }} }});",
                    ttype, field.id
                ));
                self.emit_write_value(&mut lines, "            ", "value", &field.ty)?;
                lines.push("            try w.write(.FieldEnd);".to_string());
                lines.push("        }".to_string());
            }
        }
        lines.push("        try w.write(.FieldStop);".to_string());
        lines.push("        try w.write(.StructEnd);".to_string());
        lines.push("    }".to_string());
        Ok(lines.join("\n"))
    }

    fn gen_struct_read(&self, def: &StructDef) -> Result<String, ThriftError> {
        let mut lines = Vec::new();
        lines.push(format!(
            "    pub fn read(r: *Reader, alloc: std.mem.Allocator) CompactProtocolError!{} {{",
            def.name
        ));
        lines.push("        use_arg(alloc);".to_string());

        if def.fields.is_empty() {
            lines.push("        try r.readStructBegin();".to_string());
            lines.push("        while (try readFieldOrStop(r)) |field| {".to_string());
            lines.push("            try r.skip(field.tp);".to_string());
            lines.push("            try r.readFieldEnd();".to_string());
            lines.push("        }".to_string());
            lines.push("        try r.readStructEnd();".to_string());
            lines.push("        return .{};".to_string());
            lines.push("    }".to_string());
            return Ok(lines.join("\n"));
        }

        let init_parts: Vec<String> = def
            .fields
            .iter()
            .map(|f| {
                let value = if f.required { "undefined" } else { "null" };
                format!(".{} = {}", f.name, value)
            })
            .collect();
        lines.push(format!(
            "        var out: {} = .{{ {} }};",
            def.name,
            init_parts.join(", ")
        ));

        let is_parts: Vec<String> = def
            .fields
            .iter()
            .map(|f| format!("{}: bool = false", f.name))
            .collect();
        lines.push(format!(
            "        var is: struct {{ {} }} = .{{}};",
            is_parts.join(", ")
        ));

        // one structured cleanup block, keyed off the same is-set flags the
        // required-field validation uses, so every early return releases
        // exactly the fields that were populated
        let mut release = Vec::new();
        for field in &def.fields {
            let field_release = self.field_release_lines("                ", "out", field)?;
            if field_release.is_empty() {
                continue;
            }
            release.push(format!("            if (is.{}) {{", field.name));
            release.extend(field_release);
            release.push("            }".to_string());
        }
        if !release.is_empty() {
            lines.push("        errdefer {".to_string());
            lines.extend(release);
            lines.push("        }".to_string());
        }

        lines.push("        try r.readStructBegin();".to_string());
        lines.push("        while (try readFieldOrStop(r)) |field| {".to_string());
        lines.push("            switch (@as(FieldTag, @enumFromInt(field.id))) {".to_string());
        for field in &def.fields {
            lines.push(format!("                .{} => {{", field.name));
            self.emit_read_field(&mut lines, field)?;
            lines.push("                },".to_string());
        }
        lines.push("                _ => try r.skip(field.tp),".to_string());
        lines.push("            }".to_string());
        lines.push("            try r.readFieldEnd();".to_string());
        lines.push("        }".to_string());
        lines.push("        try r.readStructEnd();".to_string());
        for field in &def.fields {
            if field.required {
                lines.push(format!(
                    "        if (!is.{}) return ThriftError.RequiredFieldMissing;",
                    field.name
                ));
            }
        }
        lines.push("        return out;".to_string());
        lines.push("    }".to_string());
        Ok(lines.join("\n"))
    }

    /// One dispatch arm body: decode when the wire type matches the schema's
    /// expected tag for this id, otherwise skip the payload uninterpreted.
    fn emit_read_field(&self, lines: &mut Vec<String>, field: &Field) -> Result<(), ThriftError> {
        let ttype = self.field_ttype(&field.ty)?;
        lines.push(format!("                    if (field.tp == .{}) {{", ttype));
        let indent = "                        ";
        match &field.ty {
            Type::Named(name) => {
                let info = classify(&field.ty, self.table)?;
                if info.is_enum {
                    lines.push(format!(
                        "{}const value: {} = @enumFromInt(try r.readI32());",
                        indent, name
                    ));
                    lines.push(format!("{}out.{} = value;", indent, field.name));
                    lines.push(format!("{}is.{} = true;", indent, field.name));
                } else if info.wire == WireType::Struct {
                    lines.push(format!(
                        "{}if (try readCatchThrift({}, r, alloc)) |value| {{",
                        indent, name
                    ));
                    lines.push(format!("{}    out.{} = value;", indent, field.name));
                    lines.push(format!("{}    is.{} = true;", indent, field.name));
                    lines.push(format!("{}}}", indent));
                } else if info.wire == WireType::String {
                    lines.push(format!(
                        "{}out.{} = try r.readBinary(alloc);",
                        indent, field.name
                    ));
                    lines.push(format!("{}is.{} = true;", indent, field.name));
                } else {
                    let read_fn = info.wire.read_fn().ok_or_else(|| {
                        ThriftError::NotImplemented(format!(
                            "reading {} fields",
                            info.wire.ttype()
                        ))
                    })?;
                    lines.push(format!(
                        "{}out.{} = try r.{}();",
                        indent, field.name, read_fn
                    ));
                    lines.push(format!("{}is.{} = true;", indent, field.name));
                }
            }
            Type::List(elem) => {
                self.emit_read_list(lines, indent, elem)?;
                lines.push(format!("{}out.{} = list;", indent, field.name));
                lines.push(format!("{}is.{} = true;", indent, field.name));
            }
        }
        lines.push("                    } else {".to_string());
        lines.push("                        try r.skip(field.tp);".to_string());
        lines.push("                    }".to_string());
        Ok(())
    }

    /// List reads mirror list writes: header, capacity-reserved backing
    /// storage, per-element decode, list-end. The errdefer covers both the
    /// backing storage and any element-owned allocations already appended.
    fn emit_read_list(
        &self,
        lines: &mut Vec<String>,
        indent: &str,
        elem: &Type,
    ) -> Result<(), ThriftError> {
        let elem_own = match elem {
            Type::List(_) => {
                return Err(ThriftError::NotImplemented(
                    "list<list<...>> fields".to_string(),
                ))
            }
            elem => ownership(elem, self.table)?,
        };
        lines.push(format!("{}const header = try r.readListBegin();", indent));
        lines.push(format!(
            "{}var list: std.ArrayList({}) = .empty;",
            indent,
            zig_type(elem, true)
        ));
        match elem_own {
            Ownership::Inline => {
                lines.push(format!("{}errdefer list.deinit(alloc);", indent));
            }
            Ownership::AllocatedLeaf => {
                lines.push(format!("{}errdefer {{", indent));
                lines.push(format!("{}    for (list.items) |item| alloc.free(item);", indent));
                lines.push(format!("{}    list.deinit(alloc);", indent));
                lines.push(format!("{}}}", indent));
            }
            Ownership::Composite => {
                lines.push(format!("{}errdefer {{", indent));
                lines.push(format!(
                    "{}    for (list.items) |*item| item.deinit(alloc);",
                    indent
                ));
                lines.push(format!("{}    list.deinit(alloc);", indent));
                lines.push(format!("{}}}", indent));
            }
            Ownership::List => unreachable!("rejected above"),
        }
        lines.push(format!(
            "{}try list.ensureTotalCapacity(alloc, header.size);",
            indent
        ));
        lines.push(format!("{}var i: usize = 0;", indent));
        lines.push(format!("{}while (i < header.size) : (i += 1) {{", indent));
        let body = format!("{}    ", indent);
        match elem {
            Type::Named(name) => {
                let info = classify(elem, self.table)?;
                if info.is_enum {
                    lines.push(format!(
                        "{}const item: {} = @enumFromInt(try r.readI32());",
                        body, name
                    ));
                    lines.push(format!("{}try list.append(alloc, item);", body));
                } else if info.wire == WireType::Struct {
                    lines.push(format!(
                        "{}if (try readCatchThrift({}, r, alloc)) |value| {{",
                        body, name
                    ));
                    lines.push(format!("{}    var item = value;", body));
                    lines.push(format!("{}    errdefer item.deinit(alloc);", body));
                    lines.push(format!("{}    try list.append(alloc, item);", body));
                    lines.push(format!("{}}}", body));
                } else if info.wire == WireType::String {
                    lines.push(format!("{}const item = try r.readBinary(alloc);", body));
                    lines.push(format!("{}errdefer alloc.free(item);", body));
                    lines.push(format!("{}try list.append(alloc, item);", body));
                } else {
                    let read_fn = info.wire.read_fn().ok_or_else(|| {
                        ThriftError::NotImplemented(format!(
                            "reading {} list elements",
                            info.wire.ttype()
                        ))
                    })?;
                    lines.push(format!("{}const item = try r.{}();", body, read_fn));
                    lines.push(format!("{}try list.append(alloc, item);", body));
                }
            }
            Type::List(_) => unreachable!("rejected above"),
        }
        lines.push(format!("{}}}", indent));
        lines.push(format!("{}try r.readListEnd();", indent));
        Ok(())
    }

    fn gen_struct_deinit(&self, def: &StructDef) -> Result<String, ThriftError> {
        let mut body = Vec::new();
        for field in &def.fields {
            body.extend(self.field_release_lines("        ", "self", field)?);
        }
        let mut lines = Vec::new();
        lines.push(format!(
            "    pub fn deinit(self: *{}, alloc: std.mem.Allocator) void {{",
            def.name
        ));
        lines.push("        use_arg(self);".to_string());
        lines.push("        use_arg(alloc);".to_string());
        if body.is_empty() {
            lines.push("        return;".to_string());
        } else {
            lines.extend(body);
        }
        lines.push("    }".to_string());
        Ok(lines.join("\n"))
    }

    /// Release lines for one field: free strings, recurse into composites,
    /// release list elements before the list's own backing storage. Optional
    /// fields are null-checked so the same lines serve deinit and the
    /// reader's errdefer block.
    fn field_release_lines(
        &self,
        indent: &str,
        owner: &str,
        field: &Field,
    ) -> Result<Vec<String>, ThriftError> {
        let target = format!("{}.{}", owner, field.name);
        let lines = match ownership(&field.ty, self.table)? {
            Ownership::Inline => Vec::new(),
            Ownership::AllocatedLeaf => {
                if field.required {
                    vec![format!("{}alloc.free({});", indent, target)]
                } else {
                    vec![format!(
                        "{}if ({}) |value| alloc.free(value);",
                        indent, target
                    )]
                }
            }
            Ownership::Composite => {
                if field.required {
                    vec![format!("{}{}.deinit(alloc);", indent, target)]
                } else {
                    vec![format!(
                        "{}if ({}) |*value| value.deinit(alloc);",
                        indent, target
                    )]
                }
            }
            Ownership::List => {
                let elem = match &field.ty {
                    Type::List(elem) => elem.as_ref(),
                    Type::Named(_) => unreachable!("list ownership implies list type"),
                };
                let elem_own = match elem {
                    Type::List(_) => {
                        return Err(ThriftError::NotImplemented(
                            "list<list<...>> fields".to_string(),
                        ))
                    }
                    elem => ownership(elem, self.table)?,
                };
                if field.required {
                    let mut v = Vec::new();
                    match elem_own {
                        Ownership::AllocatedLeaf => v.push(format!(
                            "{}for ({}.items) |item| alloc.free(item);",
                            indent, target
                        )),
                        Ownership::Composite => v.push(format!(
                            "{}for ({}.items) |*item| item.deinit(alloc);",
                            indent, target
                        )),
                        _ => {}
                    }
                    v.push(format!("{}{}.deinit(alloc);", indent, target));
                    v
                } else {
                    let mut v = vec![format!("{}if ({}) |*list| {{", indent, target)];
                    match elem_own {
                        Ownership::AllocatedLeaf => v.push(format!(
                            "{}    for (list.items) |item| alloc.free(item);",
                            indent
                        )),
                        Ownership::Composite => v.push(format!(
                            "{}    for (list.items) |*item| item.deinit(alloc);",
                            indent
                        )),
                        _ => {}
                    }
                    v.push(format!("{}    list.deinit(alloc);", indent));
                    v.push(format!("{}}}", indent));
                    v
                }
            }
        };
        Ok(lines)
    }

    // --- unions ---

    fn generate_union(&self, def: &UnionDef) -> Result<String, ThriftError> {
        if let Some(field) = def.fields.iter().find(|f| matches!(f.ty, Type::List(_))) {
            return Err(ThriftError::NotImplemented(format!(
                "list-typed union alternative {}.{}",
                def.name, field.name
            )));
        }
        let mut lines = vec![format!("pub const {} = union(enum) {{", def.name)];
        for field in &def.fields {
            lines.push(format!(
                "    {}: {},",
                field.name,
                zig_type(&field.ty, true)
            ));
        }
        lines.push(String::new());
        lines.push(self.field_tag_enum(&def.fields));
        lines.push(String::new());
        lines.push(self.gen_union_write(def)?);
        lines.push(String::new());
        lines.push(self.gen_union_read(def)?);
        lines.push(String::new());
        lines.push(self.gen_union_deinit(def)?);
        lines.push("};".to_string());
        Ok(lines.join("\n"))
    }

    fn gen_union_write(&self, def: &UnionDef) -> Result<String, ThriftError> {
        let mut lines = Vec::new();
        lines.push(format!(
            "    pub fn write(self: *const {}, w: *Writer) WriterError!void {{",
            def.name
        ));
        lines.push("        try w.write(.StructBegin);".to_string());
        lines.push("        switch (self.*) {".to_string());
        for field in &def.fields {
            let ttype = self.field_ttype(&field.ty)?;
            lines.push(format!("            .{} => |value| {{", field.name));
            lines.push(format!(
                "                try w.write(.{{ .FieldBegin = .{{ .tp = .{}, .id = {} }} }});",
                ttype, field.id
            ));
            self.emit_write_value(&mut lines, "                ", "value", &field.ty)?;
            lines.push("                try w.write(.FieldEnd);".to_string());
            lines.push("            },".to_string());
        }
        lines.push("        }".to_string());
        lines.push("        try w.write(.FieldStop);".to_string());
        lines.push("        try w.write(.StructEnd);".to_string());
        lines.push("    }".to_string());
        Ok(lines.join("\n"))
    }

    /// The first field whose id and wire type both match wins; every later
    /// field is skipped so the struct-end framing is still consumed and
    /// sequential decodes from one buffer stay aligned.
    fn gen_union_read(&self, def: &UnionDef) -> Result<String, ThriftError> {
        let mut lines = Vec::new();
        lines.push(format!(
            "    pub fn read(r: *Reader, alloc: std.mem.Allocator) CompactProtocolError!{} {{",
            def.name
        ));
        lines.push("        use_arg(alloc);".to_string());
        lines.push(format!("        var result: ?{} = null;", def.name));
        lines.push("        errdefer if (result) |*value| value.deinit(alloc);".to_string());
        lines.push("        try r.readStructBegin();".to_string());
        lines.push("        while (try readFieldOrStop(r)) |field| {".to_string());
        lines.push("            if (result != null) {".to_string());
        lines.push("                try r.skip(field.tp);".to_string());
        lines.push("                try r.readFieldEnd();".to_string());
        lines.push("                continue;".to_string());
        lines.push("            }".to_string());
        lines.push("            switch (@as(FieldTag, @enumFromInt(field.id))) {".to_string());
        for field in &def.fields {
            lines.push(format!("                .{} => {{", field.name));
            self.emit_read_union_field(&mut lines, field)?;
            lines.push("                },".to_string());
        }
        lines.push("                _ => try r.skip(field.tp),".to_string());
        lines.push("            }".to_string());
        lines.push("            try r.readFieldEnd();".to_string());
        lines.push("        }".to_string());
        lines.push("        try r.readStructEnd();".to_string());
        lines.push("        return result orelse ThriftError.CantParseUnion;".to_string());
        lines.push("    }".to_string());
        Ok(lines.join("\n"))
    }

    fn emit_read_union_field(
        &self,
        lines: &mut Vec<String>,
        field: &Field,
    ) -> Result<(), ThriftError> {
        let ttype = self.field_ttype(&field.ty)?;
        lines.push(format!("                    if (field.tp == .{}) {{", ttype));
        let indent = "                        ";
        let name = match &field.ty {
            Type::Named(name) => name,
            Type::List(_) => unreachable!("list union alternatives rejected earlier"),
        };
        let info = classify(&field.ty, self.table)?;
        if info.is_enum {
            lines.push(format!(
                "{}const value: {} = @enumFromInt(try r.readI32());",
                indent, name
            ));
            lines.push(format!("{}result = .{{ .{} = value }};", indent, field.name));
        } else if info.wire == WireType::Struct {
            lines.push(format!(
                "{}if (try readCatchThrift({}, r, alloc)) |value| {{",
                indent, name
            ));
            lines.push(format!(
                "{}    result = .{{ .{} = value }};",
                indent, field.name
            ));
            lines.push(format!("{}}}", indent));
        } else if info.wire == WireType::String {
            lines.push(format!(
                "{}result = .{{ .{} = try r.readBinary(alloc) }};",
                indent, field.name
            ));
        } else {
            let read_fn = info.wire.read_fn().ok_or_else(|| {
                ThriftError::NotImplemented(format!("reading {} fields", info.wire.ttype()))
            })?;
            lines.push(format!(
                "{}result = .{{ .{} = try r.{}() }};",
                indent, field.name, read_fn
            ));
        }
        lines.push("                    } else {".to_string());
        lines.push("                        try r.skip(field.tp);".to_string());
        lines.push("                    }".to_string());
        Ok(())
    }

    fn gen_union_deinit(&self, def: &UnionDef) -> Result<String, ThriftError> {
        let mut cases = Vec::new();
        for field in &def.fields {
            match ownership(&field.ty, self.table)? {
                Ownership::AllocatedLeaf => {
                    cases.push(format!("            .{} => |*payload| {{", field.name));
                    cases.push("                alloc.free(payload.*);".to_string());
                    cases.push("            },".to_string());
                }
                Ownership::Composite => {
                    cases.push(format!("            .{} => |*payload| {{", field.name));
                    cases.push("                payload.deinit(alloc);".to_string());
                    cases.push("            },".to_string());
                }
                Ownership::Inline => {
                    cases.push(format!(
                        "            .{} => |payload| {{ use_arg(payload); }},",
                        field.name
                    ));
                }
                Ownership::List => unreachable!("list union alternatives rejected earlier"),
            }
        }
        let mut lines = Vec::new();
        lines.push(format!(
            "    pub fn deinit(self: *{}, alloc: std.mem.Allocator) void {{",
            def.name
        ));
        lines.push("        use_arg(alloc);".to_string());
        lines.push("        switch (self.*) {".to_string());
        lines.extend(cases);
        lines.push("        }".to_string());
        lines.push("    }".to_string());
        Ok(lines.join("\n"))
    }

    // --- shared emission helpers ---

    /// Wire tag stamped into a field-begin marker for this type.
    fn field_ttype(&self, ty: &Type) -> Result<&'static str, ThriftError> {
        match ty {
            Type::List(_) => Ok("LIST"),
            named => Ok(classify(named, self.table)?.wire.ttype()),
        }
    }

    /// Emit the payload write for `expr`, recursively for list elements.
    fn emit_write_value(
        &self,
        lines: &mut Vec<String>,
        indent: &str,
        expr: &str,
        ty: &Type,
    ) -> Result<(), ThriftError> {
        match ty {
            Type::Named(_) => {
                let info = classify(ty, self.table)?;
                if info.is_enum {
                    lines.push(format!(
                        "{}try w.write(.{{ .I32 = @intFromEnum({}) }});",
                        indent, expr
                    ));
                } else if info.wire == WireType::Struct {
                    lines.push(format!("{}try {}.write(w);", indent, expr));
                } else {
                    let frame = info.wire.write_frame()?;
                    lines.push(format!(
                        "{}try w.write(.{{ .{} = {} }});",
                        indent, frame, expr
                    ));
                }
            }
            Type::List(elem) => {
                let elem_info = classify(ty, self.table)?;
                lines.push(format!(
                    "{}try w.write(.{{ .ListBegin = .{{ .elem = .{}, .size = {}.items.len }} }});",
                    indent,
                    elem_info.wire.ttype(),
                    expr
                ));
                lines.push(format!("{}for ({}.items) |item| {{", indent, expr));
                self.emit_write_value(lines, &format!("{}    ", indent), "item", elem)?;
                lines.push(format!("{}}}", indent));
                lines.push(format!("{}try w.write(.ListEnd);", indent));
            }
        }
        Ok(())
    }

    // --- sample synthesis and the round-trip test ---

    fn default_literal(&self, field: &Field, default: &DefaultValue) -> String {
        match default {
            DefaultValue::Int(value) => value.to_string(),
            DefaultValue::Ident(name) => {
                if let Type::Named(type_name) = &field.ty {
                    if matches!(self.table.get(type_name), Some(Definition::Enum(_))) {
                        return format!(".{}", name);
                    }
                }
                name.clone()
            }
        }
    }

    fn sample_value(&self, ty: &Type) -> Result<String, ThriftError> {
        match ty {
            Type::Named(name) => {
                if let Some(&literal) = SAMPLE_LITERALS.get(name.as_str()) {
                    return Ok(literal.to_string());
                }
                match self.table.resolve(name)? {
                    Definition::Enum(d) => {
                        let first = d.members.first().ok_or_else(|| {
                            ThriftError::Schema(format!("enum \"{}\" has no members", d.name))
                        })?;
                        Ok(format!(".{}", first.name))
                    }
                    Definition::Struct(d) => self.struct_sample(d),
                    Definition::Union(d) => self.union_sample(d),
                }
            }
            Type::List(elem) => Ok(format!("std.ArrayList({}).empty", zig_type(elem, true))),
        }
    }

    fn struct_sample(&self, def: &StructDef) -> Result<String, ThriftError> {
        if def.fields.is_empty() {
            return Ok(format!("{}{{}}", def.name));
        }
        let mut args = Vec::new();
        for field in &def.fields {
            if field.required {
                args.push(format!(".{} = {}", field.name, self.sample_value(&field.ty)?));
            } else {
                args.push(format!(".{} = null", field.name));
            }
        }
        Ok(format!("{}{{ {} }}", def.name, args.join(", ")))
    }

    fn union_sample(&self, def: &UnionDef) -> Result<String, ThriftError> {
        let field = def.fields.first().ok_or_else(|| {
            ThriftError::Schema(format!("union \"{}\" has no fields", def.name))
        })?;
        Ok(format!(
            ".{{ .{} = {} }}",
            field.name,
            self.sample_value(&field.ty)?
        ))
    }

    /// Two-element fills for every list field of a top-level sample, so the
    /// reader's list path is exercised with real elements.
    fn gen_fill_list_fields(
        &self,
        var_name: &str,
        def: &StructDef,
    ) -> Result<Vec<String>, ThriftError> {
        let mut lines = Vec::new();
        for field in &def.fields {
            if let Type::List(elem) = &field.ty {
                let sample = self.sample_value(elem)?;
                if field.required {
                    lines.push(format!(
                        "    try {}.{}.ensureTotalCapacity(alloc, 2);",
                        var_name, field.name
                    ));
                    lines.push(format!(
                        "    try {}.{}.append(alloc, {});",
                        var_name, field.name, sample
                    ));
                    lines.push(format!(
                        "    try {}.{}.append(alloc, {});",
                        var_name, field.name, sample
                    ));
                    lines.push(format!(
                        "    defer {}.{}.deinit(alloc);",
                        var_name, field.name
                    ));
                } else {
                    lines.push(format!(
                        "    {}.{} = std.ArrayList({}).empty;",
                        var_name,
                        field.name,
                        zig_type(elem, true)
                    ));
                    lines.push(format!(
                        "    try {}.{}.?.ensureTotalCapacity(alloc, 2);",
                        var_name, field.name
                    ));
                    lines.push(format!(
                        "    try {}.{}.?.append(alloc, {});",
                        var_name, field.name, sample
                    ));
                    lines.push(format!(
                        "    try {}.{}.?.append(alloc, {});",
                        var_name, field.name, sample
                    ));
                    lines.push(format!(
                        "    defer {}.{}.?.deinit(alloc);",
                        var_name, field.name
                    ));
                }
            }
        }
        Ok(lines)
    }

    /// One synthesized test: construct a sample per definition, write them
    /// all in declaration order into one buffer, read them back in the same
    /// order, release everything, and compare deeply.
    fn generate_test_block(&self) -> Result<String, ThriftError> {
        let mut calls: Vec<String> = Vec::new();

        let mut struct_counter = 0;
        let mut union_counter = 0;
        for def in &self.idl.definitions {
            match def {
                Definition::Struct(d) => {
                    let var_name = format!("struct{}", struct_counter);
                    let list_fills = self.gen_fill_list_fields(&var_name, d)?;
                    let qual = if list_fills.is_empty() { "const" } else { "var" };
                    calls.push(format!(
                        "    {} {}: {} = {};",
                        qual,
                        var_name,
                        d.name,
                        self.struct_sample(d)?
                    ));
                    calls.extend(list_fills);
                    calls.push(format!("    try {}.write(&w);", var_name));
                    struct_counter += 1;
                }
                Definition::Union(d) => {
                    let var_name = format!("union{}", union_counter);
                    calls.push(format!(
                        "    const {}: {} = {};",
                        var_name,
                        d.name,
                        self.union_sample(d)?
                    ));
                    calls.push(format!("    try {}.write(&w);", var_name));
                    union_counter += 1;
                }
                Definition::Enum(_) => {}
            }
        }

        calls.push("    const written: []const u8 = w.writer.buffered();".to_string());
        calls.push("    var r: Reader = undefined;".to_string());
        calls.push("    r.init(.fixed(written));".to_string());

        let mut struct_counter = 0;
        let mut union_counter = 0;
        for def in &self.idl.definitions {
            let (var_name, type_name) = match def {
                Definition::Struct(d) => {
                    let v = format!("struct{}", struct_counter);
                    struct_counter += 1;
                    (v, d.name.as_str())
                }
                Definition::Union(d) => {
                    let v = format!("union{}", union_counter);
                    union_counter += 1;
                    (v, d.name.as_str())
                }
                Definition::Enum(_) => continue,
            };
            calls.push(format!(
                "    var {}_read = try {}.read(&r, alloc);",
                var_name, type_name
            ));
            calls.push(format!("    defer {}_read.deinit(alloc);", var_name));
            calls.push(format!(
                "    try std.testing.expectEqualDeep({}, {}_read);",
                var_name, var_name
            ));
        }

        Ok(format!(
            "test \"generated code writes and reads back every definition\" {{\n    var buf: [1024]u8 = undefined;\n    const alloc = std.testing.allocator;\n\n    var w: Writer = undefined;\n    w.init(.fixed(&buf));\n\n{}\n}}",
            calls.join("\n")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn gen(src: &str) -> Result<String, ThriftError> {
        let idl = Parser::new(src).unwrap().parse().unwrap();
        let table = DefTable::build(&idl)?;
        generate_zig(&idl, &table)
    }

    #[test]
    fn test_enum_emission() {
        let code = gen("enum Color { RED = 0, GREEN = 1 }").unwrap();
        let expected = "pub const Color = enum(i32) {\n    RED = 0,\n    GREEN = 1,\n    _,\n};";
        assert!(code.contains(expected), "missing enum block in:\n{}", code);
    }

    #[test]
    fn test_enum_auto_numbering_fails() {
        let err = gen("enum Color { RED }").unwrap_err();
        assert!(matches!(err, ThriftError::NotImplemented(msg) if msg.contains("auto-numbering")));
    }

    #[test]
    fn test_struct_field_tags_and_decl() {
        let code = gen("struct Point { 1: required i32 x; 2: required i32 y; }").unwrap();
        assert!(code.contains("pub const Point = struct {"));
        assert!(code.contains("    x: i32,"));
        assert!(code.contains("    pub const FieldTag = enum(i16) {"));
        assert!(code.contains("        x = 1,"));
        assert!(code.contains("        y = 2,"));
        assert!(code.contains("        _,"));
    }

    #[test]
    fn test_required_field_written_unconditionally() {
        let code = gen("struct P { 1: required i64 a; }").unwrap();
        assert!(code.contains("try w.write(.{ .FieldBegin = .{ .tp = .I64, .id = 1 } });"));
        assert!(code.contains("try w.write(.{ .I64 = self.a });"));
        assert!(!code.contains("if (self.a)"));
    }

    #[test]
    fn test_optional_field_skipped_when_absent() {
        let code = gen("struct P { 1: optional string s; }").unwrap();
        assert!(code.contains("if (self.s) |value| {"));
        assert!(code.contains("try w.write(.{ .Binary = value });"));
        assert!(code.contains("s: ?[]const u8,"));
    }

    #[test]
    fn test_reader_skips_mismatched_and_unknown_fields() {
        let code = gen("struct P { 1: required i32 x; }").unwrap();
        assert!(code.contains("switch (@as(FieldTag, @enumFromInt(field.id))) {"));
        assert!(code.contains("_ => try r.skip(field.tp),"));
        // mismatch branch inside the known-field arm
        assert!(code.contains("if (field.tp == .I32) {"));
        assert!(code.contains("} else {\n                        try r.skip(field.tp);"));
    }

    #[test]
    fn test_required_field_validation() {
        let code = gen("struct P { 1: required i32 x; 2: optional i32 y; }").unwrap();
        assert!(code.contains("if (!is.x) return ThriftError.RequiredFieldMissing;"));
        assert!(!code.contains("if (!is.y)"));
    }

    #[test]
    fn test_read_releases_set_fields_on_error() {
        let code =
            gen("struct Inner { 1: required string s; }\nstruct P { 1: required Inner rec; 2: optional list<string> names; }")
                .unwrap();
        assert!(code.contains("errdefer {"));
        assert!(code.contains("if (is.rec) {"));
        assert!(code.contains("out.rec.deinit(alloc);"));
        assert!(code.contains("if (is.names) {"));
        assert!(code.contains("for (list.items) |item| alloc.free(item);"));
    }

    #[test]
    fn test_nested_record_reads_through_catch_wrapper() {
        let code = gen("struct Inner { 1: required i32 v; }\nstruct P { 1: required Inner rec; }")
            .unwrap();
        assert!(code.contains("if (try readCatchThrift(Inner, r, alloc)) |value| {"));
    }

    #[test]
    fn test_enum_field_narrows_through_i32() {
        let code = gen("enum E { A = 1 }\nstruct P { 1: required E e; }").unwrap();
        assert!(code.contains("try w.write(.{ .I32 = @intFromEnum(self.e) });"));
        assert!(code.contains("const value: E = @enumFromInt(try r.readI32());"));
    }

    #[test]
    fn test_list_write_and_read() {
        let code = gen("struct P { 1: required list<i32> xs; }").unwrap();
        assert!(code
            .contains("try w.write(.{ .ListBegin = .{ .elem = .I32, .size = self.xs.items.len } });"));
        assert!(code.contains("for (self.xs.items) |item| {"));
        assert!(code.contains("try w.write(.ListEnd);"));
        assert!(code.contains("const header = try r.readListBegin();"));
        assert!(code.contains("try list.ensureTotalCapacity(alloc, header.size);"));
        assert!(code.contains("try r.readListEnd();"));
    }

    #[test]
    fn test_deinit_frees_strings_and_lists() {
        let code =
            gen("struct P { 1: required string name; 2: optional list<string> tags; }").unwrap();
        assert!(code.contains("pub fn deinit(self: *P, alloc: std.mem.Allocator) void {"));
        assert!(code.contains("alloc.free(self.name);"));
        assert!(code.contains("if (self.tags) |*list| {"));
        assert!(code.contains("list.deinit(alloc);"));
    }

    #[test]
    fn test_deinit_without_allocations_is_a_no_op() {
        let code = gen("struct P { 1: required i32 x; }").unwrap();
        let deinit = code
            .split("pub fn deinit")
            .nth(1)
            .expect("deinit method present");
        assert!(deinit.contains("return;"));
    }

    #[test]
    fn test_union_emission() {
        let code = gen("union Value { 1: i64 num; 2: string text; }").unwrap();
        assert!(code.contains("pub const Value = union(enum) {"));
        assert!(code.contains("    num: i64,"));
        assert!(code.contains("    text: []const u8,"));
        assert!(code.contains("switch (self.*) {"));
        assert!(code.contains("return result orelse ThriftError.CantParseUnion;"));
        // first conforming field wins; later fields are skipped unparsed
        assert!(code.contains("if (result != null) {"));
    }

    #[test]
    fn test_union_list_alternative_fails() {
        let err = gen("union U { 1: list<i32> xs; }").unwrap_err();
        assert!(matches!(err, ThriftError::NotImplemented(msg) if msg.contains("U.xs")));
    }

    #[test]
    fn test_double_write_fails() {
        let err = gen("struct P { 1: required double d; }").unwrap_err();
        assert!(matches!(err, ThriftError::NotImplemented(msg) if msg.contains("double")));
    }

    #[test]
    fn test_list_of_list_fails() {
        let err = gen("struct P { 1: required list<list<i32>> xs; }").unwrap_err();
        assert!(matches!(err, ThriftError::NotImplemented(_)));
    }

    #[test]
    fn test_unknown_type_fails() {
        let err = gen("struct P { 1: required Missing m; }").unwrap_err();
        assert!(matches!(err, ThriftError::UnknownType(name) if name == "Missing"));
    }

    #[test]
    fn test_field_default_emission() {
        let code = gen("enum E { A = 1 }\nstruct P { 1: optional i32 n = 7; 2: optional E e = A; }")
            .unwrap();
        assert!(code.contains("n: ?i32 = 7,"));
        assert!(code.contains("e: ?E = .A,"));
    }

    #[test]
    fn test_round_trip_test_block() {
        let code = gen(
            "struct Point { 1: required i32 x; }\nstruct Shape { 1: required Point origin; 2: optional list<i32> tags; }\nunion Pick { 1: i32 n; }",
        )
        .unwrap();
        assert!(code.contains("test \"generated code writes and reads back every definition\" {"));
        // two-element list fill on the sample
        assert!(code.contains("try struct1.tags.?.append(alloc, 12345);"));
        assert!(code.contains("try struct1.tags.?.ensureTotalCapacity(alloc, 2);"));
        // declaration-order write then read-back with deep equality
        let write0 = code.find("try struct0.write(&w);").unwrap();
        let write1 = code.find("try struct1.write(&w);").unwrap();
        let write_u = code.find("try union0.write(&w);").unwrap();
        let read0 = code.find("var struct0_read = try Point.read(&r, alloc);").unwrap();
        let read1 = code.find("var struct1_read = try Shape.read(&r, alloc);").unwrap();
        let read_u = code.find("var union0_read = try Pick.read(&r, alloc);").unwrap();
        assert!(write0 < write1 && write1 < write_u);
        assert!(write_u < read0 && read0 < read1 && read1 < read_u);
        assert!(code.contains("try std.testing.expectEqualDeep(struct0, struct0_read);"));
        assert!(code.contains("defer union0_read.deinit(alloc);"));
    }

    #[test]
    fn test_nested_sample_construction() {
        let code = gen(
            "enum Color { RED = 0, GREEN = 1 }\nstruct Point { 1: required i32 x; 2: required i32 y; }\nstruct Shape { 1: required Point origin; 2: optional Color color; }",
        )
        .unwrap();
        assert!(code.contains("Shape{ .origin = Point{ .x = 12345, .y = 12345 }, .color = null }"));
    }
}
