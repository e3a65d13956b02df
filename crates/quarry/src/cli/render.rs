//! Terminal rendering of results.

use quarry::{FormattedData, ResultEnvelope, TableData, value_text};

/// Print an envelope: CSV as raw text, tables aligned, everything else as
/// pretty JSON.
pub fn print_envelope(envelope: &ResultEnvelope) -> Result<(), serde_json::Error> {
    match envelope.data() {
        Some(FormattedData::Csv(text)) => print!("{}", text),
        Some(FormattedData::Table(table)) => print!("{}", render_table(table)),
        _ => println!("{}", serde_json::to_string_pretty(envelope)?),
    }
    Ok(())
}

/// Lay a table out in fixed-width columns, cells cut to the column width.
pub fn render_table(table: &TableData) -> String {
    let widths = table.column_widths();
    let mut out = String::new();

    let header: Vec<String> = table
        .columns()
        .iter()
        .zip(widths)
        .map(|(name, width)| cell(name, *width))
        .collect();
    out.push_str(header.join(" | ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');

    for row in table.rows() {
        let line: Vec<String> = table
            .columns()
            .iter()
            .zip(widths)
            .map(|(name, width)| {
                let text = row.get(name).map(value_text).unwrap_or_default();
                cell(&text, *width)
            })
            .collect();
        out.push_str(line.join(" | ").trim_end());
        out.push('\n');
    }

    out.push_str(&format!("({} rows)\n", table.total_rows()));
    out
}

fn cell(text: &str, width: usize) -> String {
    let cut: String = text.chars().take(width).collect();
    let pad = width.saturating_sub(cut.chars().count());
    format!("{}{}", cut, " ".repeat(pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry::{Row, format_table};
    use serde_json::json;

    fn row(province: &str, total: i64) -> Row {
        let mut row = Row::new();
        row.insert("province".into(), json!(province));
        row.insert("total".into(), json!(total));
        row
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let columns = vec!["province".to_string(), "total".to_string()];
        let table = format_table(&[row("hubei", 7), row("zhejiang", 12)], &columns);

        let text = render_table(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "province | total");
        assert_eq!(lines[1], "---------+------");
        assert_eq!(lines[2], "hubei    | 7");
        assert_eq!(lines[3], "zhejiang | 12");
        assert_eq!(lines[4], "(2 rows)");
    }

    #[test]
    fn test_cell_cuts_to_width() {
        assert_eq!(cell("abcdef", 3), "abc");
        assert_eq!(cell("ab", 4), "ab  ");
    }
}
