//! HTML table rendering.

use crate::model::{Table, TableRow};

/// Render a table as an HTML `<table>` element.
pub fn table_to_html(table: &Table) -> String {
    let mut output = String::from("<table>");

    if !table.header().is_empty() {
        output.push_str("<thead>");
        for row in table.header() {
            render_row(&mut output, row, "th");
        }
        output.push_str("</thead>");
    }

    output.push_str("<tbody>");
    for row in table.body() {
        render_row(&mut output, row, "td");
    }
    output.push_str("</tbody></table>");

    output
}

fn render_row(output: &mut String, row: &TableRow, tag: &str) {
    output.push_str("<tr>");
    for cell in &row.cells {
        if cell.colspan > 1 {
            output.push_str(&format!("<{} colspan=\"{}\">", tag, cell.colspan));
        } else {
            output.push_str(&format!("<{}>", tag));
        }
        output.push_str(&escape_html(cell.text.trim()));
        output.push_str(&format!("</{}>", tag));
    }
    output.push_str("</tr>");
}

/// Escape the characters that are significant in HTML text.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableCell;

    #[test]
    fn test_header_and_body() {
        let mut table = Table::with_header(1);
        table.add_row(TableRow::from_strings(["Item", "Qty"]));
        table.add_row(TableRow::from_strings(["Widget", "2"]));

        assert_eq!(
            table_to_html(&table),
            "<table><thead><tr><th>Item</th><th>Qty</th></tr></thead>\
             <tbody><tr><td>Widget</td><td>2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_without_header() {
        let mut table = Table::new();
        table.add_row(TableRow::new(vec![TableCell::text("a & b").colspan(2)]));

        assert_eq!(
            table_to_html(&table),
            "<table><tbody><tr><td colspan=\"2\">a &amp; b</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape_html("<b>\"x\"</b>"), "&lt;b&gt;&quot;x&quot;&lt;/b&gt;");
    }
}
