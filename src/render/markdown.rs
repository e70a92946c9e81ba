//! Markdown table rendering.

use crate::model::Table;

/// Render a table as a GitHub-flavored Markdown table.
///
/// The first row is followed by the separator line, so a table always has a
/// header row in Markdown even when the source had none. Every line starts
/// with `|`; an empty table renders as an empty string.
pub fn table_to_markdown(table: &Table) -> String {
    let col_count = table.column_count();
    if col_count == 0 {
        return String::new();
    }

    let mut output = String::new();
    for (i, row) in table.rows.iter().enumerate() {
        output.push('|');
        for col in 0..col_count {
            let content = row
                .cells
                .get(col)
                .map(|c| escape_cell(&c.text))
                .unwrap_or_default();
            output.push_str(&format!(" {} |", content));
        }
        output.push('\n');

        if i == 0 {
            output.push('|');
            for _ in 0..col_count {
                output.push_str(" --- |");
            }
            output.push('\n');
        }
    }

    output
}

/// Keep cell text on one line and out of the column syntax.
fn escape_cell(text: &str) -> String {
    text.trim().replace('\n', " ").replace('|', "\\|")
}
