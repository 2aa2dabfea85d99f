//! Indentation-aware JSON serialization for in-place edits.

use serde_json::Value;

/// Whitespace settings used when pretty-printing replacement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub tab_size: usize,
    pub insert_spaces: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            tab_size: 2,
            insert_spaces: true,
        }
    }
}

impl FormatOptions {
    fn indent_unit(&self) -> String {
        if self.insert_spaces {
            " ".repeat(self.tab_size)
        } else {
            "\t".to_owned()
        }
    }
}

/// Pretty-prints `value` so it can replace a span that starts mid-line.
///
/// The first line carries no indentation (it lands after existing text at
/// the insertion point); every continuation line is prefixed with
/// `base_indent` plus one indent unit per nesting level, so the printed
/// block lines up with the line the span starts on.
pub fn serialize_indented(value: &Value, opts: &FormatOptions, base_indent: &str) -> String {
    let unit = opts.indent_unit();
    let mut out = String::new();
    write_value(&mut out, value, base_indent, &unit, 0);
    out
}

fn write_value(out: &mut String, value: &Value, base: &str, unit: &str, depth: usize) {
    match value {
        Value::Array(items) if !items.is_empty() => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push('\n');
                push_indent(out, base, unit, depth + 1);
                write_value(out, item, base, unit, depth + 1);
            }
            out.push('\n');
            push_indent(out, base, unit, depth);
            out.push(']');
        }
        Value::Object(members) if !members.is_empty() => {
            out.push('{');
            for (i, (key, member)) in members.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push('\n');
                push_indent(out, base, unit, depth + 1);
                out.push_str(&serialize_compact(&Value::String(key.clone())));
                out.push_str(": ");
                write_value(out, member, base, unit, depth + 1);
            }
            out.push('\n');
            push_indent(out, base, unit, depth);
            out.push('}');
        }
        Value::Array(_) => out.push_str("[]"),
        Value::Object(_) => out.push_str("{}"),
        scalar => out.push_str(&serialize_compact(scalar)),
    }
}

fn push_indent(out: &mut String, base: &str, unit: &str, depth: usize) {
    out.push_str(base);
    for _ in 0..depth {
        out.push_str(unit);
    }
}

/// Serializes `value` on a single line with no extra whitespace.
pub fn serialize_compact(value: &Value) -> String {
    // Values built from parsed JSON always serialize.
    serde_json::to_string(value).unwrap_or_default()
}
