//! CSV flattening of a decoded table.
//!
//! Field names form the header row; every record becomes one row in input
//! order, deleted records included. Null values and the deletion marker
//! render as empty text.

use crate::Table;

/// Quote a cell per RFC 4180 when it contains the delimiter, a quote or a
/// line break.
fn escape_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        let mut escaped = String::with_capacity(cell.len() + 2);
        escaped.push('"');
        for c in cell.chars() {
            if c == '"' {
                // Escaped quote: " -> ""
                escaped.push('"');
            }
            escaped.push(c);
        }
        escaped.push('"');
        escaped
    } else {
        cell.to_string()
    }
}

fn push_row<I: IntoIterator<Item = String>>(out: &mut String, cells: I) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        out.push_str(&escape_cell(&cell));
        first = false;
    }
    out.push('\n');
}

/// Serialize the whole table as CSV text.
pub fn to_csv(table: &Table) -> String {
    let mut out = String::new();

    push_row(&mut out, table.fields.iter().map(|f| f.name.clone()));

    for record in &table.records {
        push_row(&mut out, record.values.iter().map(|v| v.to_string()));
    }

    out
}
