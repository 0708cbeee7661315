//! Canonical printer for document trees.
//!
//! Output is plain double-quoted JSON, which the tolerant parser reads
//! back into an equal tree.

use std::fmt::Write;

use crate::model::ConfigNode;

/// Pretty-print with two-space indentation.
pub fn to_pretty_string(node: &ConfigNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node, Some(0));
    out
}

/// Single-line rendering.
pub fn to_compact_string(node: &ConfigNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node, None);
    out
}

fn write_node(out: &mut String, node: &ConfigNode, indent: Option<usize>) {
    match node {
        ConfigNode::Null => out.push_str("null"),
        ConfigNode::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        ConfigNode::Int(i) => { let _ = write!(out, "{i}"); }
        ConfigNode::Float(f) => write_float(out, *f),
        ConfigNode::String(s) => write_string(out, s),
        ConfigNode::List(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 { out.push(','); }
                newline(out, indent.map(|d| d + 1));
                write_node(out, item, indent.map(|d| d + 1));
            }
            newline(out, indent);
            out.push(']');
        }
        ConfigNode::Map(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            for (i, (key, value)) in map.iter().enumerate() {
                if i > 0 { out.push(','); }
                newline(out, indent.map(|d| d + 1));
                write_string(out, key);
                out.push_str(": ");
                write_node(out, value, indent.map(|d| d + 1));
            }
            newline(out, indent);
            out.push('}');
        }
    }
}

fn newline(out: &mut String, indent: Option<usize>) {
    match indent {
        Some(depth) => {
            out.push('\n');
            out.extend(std::iter::repeat_n("  ", depth));
        }
        None => {}
    }
}

/// Debug formatting of f64 is shortest-roundtrip and always carries a
/// `.` or an exponent, so the value re-parses as a float.
fn write_float(out: &mut String, f: f64) {
    if f.is_finite() {
        let _ = write!(out, "{f:?}");
    } else {
        out.push_str("null");
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => { let _ = write!(out, "\\u{:04x}", c as u32); }
            c => out.push(c),
        }
    }
    out.push('"');
}
