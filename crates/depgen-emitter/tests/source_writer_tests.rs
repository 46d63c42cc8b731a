use depgen_emitter::SourceWriter;

#[test]
fn indentation_is_written_lazily() {
    let mut writer = SourceWriter::new("    ", "\n");
    writer.line("class A");
    writer.open_block();
    writer.line("int x;");
    writer.write_line();
    writer.write("int ");
    writer.write("y;");
    writer.write_line();
    writer.close_block("}");
    assert_eq!(writer.finish(), "class A\n{\n    int x;\n\n    int y;\n}\n");
}

#[test]
fn decrease_indent_saturates() {
    let mut writer = SourceWriter::new("\t", "\r\n");
    writer.decrease_indent();
    assert_eq!(writer.indent_level(), 0);
    writer.increase_indent();
    writer.line("a");
    assert!(writer.is_at_line_start());
    assert_eq!(writer.finish(), "\ta\r\n");
}

#[test]
fn string_literals_are_escaped() {
    let mut writer = SourceWriter::new("  ", "\n");
    writer.write_string_literal("say \"hi\"\\\n\u{1}");
    assert_eq!(writer.finish(), r#""say \"hi\"\\\n\u0001""#);
}
