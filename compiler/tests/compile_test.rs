#![cfg(test)]

use zthrift_compiler::{
    compile_idl, parse_idl,
    types::{Definition, Type},
};

#[test]
fn test_parse_schema() {
    let input = r#"
    namespace zig shapes;

    enum Color {
      RED = 0,
      GREEN = 1,
    }

    struct Point {
      1: required i32 x;
      2: required i32 y;
    }

    struct Shape {
      1: required Point origin;
      2: optional Color color;
      3: optional list<i32> tags;
    }
    "#;

    let idl = parse_idl(input).expect("parse_idl failed");

    // Check number of definitions
    assert_eq!(idl.definitions.len(), 3);

    // Check enum Color
    let color_def = match &idl.definitions[0] {
        Definition::Enum(d) => d,
        other => panic!("expected enum, got {:?}", other),
    };
    assert_eq!(color_def.name, "Color");
    assert_eq!(color_def.members.len(), 2);
    assert_eq!(color_def.members[0].name, "RED");
    assert_eq!(color_def.members[0].value, Some(0));
    assert_eq!(color_def.members[1].name, "GREEN");
    assert_eq!(color_def.members[1].value, Some(1));

    // Check struct Point
    let point_def = match &idl.definitions[1] {
        Definition::Struct(d) => d,
        other => panic!("expected struct, got {:?}", other),
    };
    assert_eq!(point_def.name, "Point");
    assert_eq!(point_def.fields.len(), 2);
    assert_eq!(point_def.fields[0].id, 1);
    assert!(point_def.fields[0].required);
    assert_eq!(point_def.fields[0].ty, Type::Named("i32".into()));
    assert_eq!(point_def.fields[0].name, "x");
    assert_eq!(point_def.fields[1].id, 2);
    assert_eq!(point_def.fields[1].name, "y");

    // Check struct Shape
    let shape_def = match &idl.definitions[2] {
        Definition::Struct(d) => d,
        other => panic!("expected struct, got {:?}", other),
    };
    assert_eq!(shape_def.name, "Shape");
    assert_eq!(shape_def.fields.len(), 3);
    assert_eq!(shape_def.fields[0].ty, Type::Named("Point".into()));
    assert!(shape_def.fields[0].required);
    assert_eq!(shape_def.fields[1].ty, Type::Named("Color".into()));
    assert!(!shape_def.fields[1].required);
    assert_eq!(
        shape_def.fields[2].ty,
        Type::List(Box::new(Type::Named("i32".into())))
    );

    let zig_code = compile_idl(input).expect("compile_idl failed");
    println!("Generated Zig code:\n{}", zig_code);
}

#[test]
fn test_generated_shape_round_trip_scaffolding() {
    let input = r#"
    enum Color { RED = 0, GREEN = 1 }
    struct Point { 1: required i32 x; 2: required i32 y; }
    struct Shape {
      1: required Point origin;
      2: optional Color color;
      3: optional list<i32> tags;
    }
    "#;
    let code = compile_idl(input).expect("compile_idl failed");

    // every definition is emitted, in source order
    let color_at = code.find("pub const Color = enum(i32) {").unwrap();
    let point_at = code.find("pub const Point = struct {").unwrap();
    let shape_at = code.find("pub const Shape = struct {").unwrap();
    assert!(color_at < point_at && point_at < shape_at);

    // the fixed header binds the assumed runtime module
    assert!(code.contains("@import(\"TCompactProtocol.zig\")"));
    assert!(code.contains("fn readCatchThrift"));

    // required nested struct: written unconditionally, read through the
    // nested-degrade wrapper, validated after the loop
    assert!(code.contains("try self.origin.write(w);"));
    assert!(code.contains("if (try readCatchThrift(Point, r, alloc)) |value| {"));
    assert!(code.contains("if (!is.origin) return ThriftError.RequiredFieldMissing;"));

    // optional enum: zero bytes when absent, i32 narrowing when present
    assert!(code.contains("if (self.color) |value| {"));
    assert!(code.contains("try w.write(.{ .I32 = @intFromEnum(value) });"));

    // optional i32 list: framing plus two-element sample fill in the test
    assert!(code.contains(".ListBegin = .{ .elem = .I32, .size = value.items.len }"));
    assert!(code.contains("try struct1.tags.?.append(alloc, 12345);"));

    // the synthesized test writes and reads back in declaration order
    let w_point = code.find("try struct0.write(&w);").unwrap();
    let w_shape = code.find("try struct1.write(&w);").unwrap();
    let r_point = code
        .find("var struct0_read = try Point.read(&r, alloc);")
        .unwrap();
    let r_shape = code
        .find("var struct1_read = try Shape.read(&r, alloc);")
        .unwrap();
    assert!(w_point < w_shape && w_shape < r_point && r_point < r_shape);
    assert!(code.contains("try std.testing.expectEqualDeep(struct1, struct1_read);"));
    assert!(code.contains("defer struct1_read.deinit(alloc);"));
}

#[test]
fn test_union_round_trip_scaffolding() {
    let input = r#"
    struct Point { 1: required i32 x; 2: required i32 y; }
    union Target {
      1: Point at;
      2: string label;
    }
    "#;
    let code = compile_idl(input).expect("compile_idl failed");

    assert!(code.contains("pub const Target = union(enum) {"));
    // exactly one variant is written, based on which alternative is held
    assert!(code.contains("switch (self.*) {"));
    // exactly one variant (or a failure) comes back out
    assert!(code.contains("return result orelse ThriftError.CantParseUnion;"));
    // the sample holds the first alternative
    assert!(code.contains(".{ .at = Point{ .x = 12345, .y = 12345 } }"));
}

#[test]
fn test_unsupported_inputs_fail_closed() {
    // grammatically valid but outside the implemented subset
    assert!(compile_idl("struct S extends Base { 1: i32 x; }").is_err());
    assert!(compile_idl("enum E { A }").is_err());
    assert!(compile_idl("struct S { 1: required double d; }").is_err());
    assert!(compile_idl("struct S { 1: required list<list<i32>> xs; }").is_err());
    assert!(compile_idl("union U { 1: list<i32> xs; }").is_err());
    assert!(compile_idl("struct S { 1: map<i32, i32> m; }").is_err());
}

#[test]
fn test_parse_error_reports_exact_location() {
    let input = "struct Point {\n  1: required i32 x;\n  2 i32 y;\n}";
    let err = parse_idl(input).unwrap_err();
    let (row, col) = err.position().expect("positioned error");
    assert_eq!(row, 3);
    assert_eq!(col, 5);

    let context = zthrift_compiler::render_source_context(input, row, col);
    assert!(context.contains("  1: required i32 x;"));
    assert!(context.contains("  2 i32 y;"));
    assert!(context.ends_with("    ^\n"));
}
