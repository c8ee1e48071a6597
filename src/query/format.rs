//! Fixed-width text rendering of result sets.

use crate::db::Row;
use crate::error::{KernelError, Result};

/// Renders a result set as a text table.
///
/// ```text
/// Selected 1 rows:
/// +----+------+
/// | id | name |
/// +----+------+
/// | 1  | a    |
/// +----+------+
///
/// ```
///
/// Each column is as wide as the longest of its name and its cell values,
/// measured in characters. Every row must have exactly one value per column.
pub fn format_result_set<S: AsRef<str>>(column_names: &[S], rows: &[Row]) -> Result<String> {
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if row.len() != column_names.len() {
            return Err(KernelError::render(format!(
                "row {} has {} values, expected {}",
                index + 1,
                row.len(),
                column_names.len()
            )));
        }
        cells.push(row.iter().map(|v| v.to_display_string()).collect());
    }

    let mut widths: Vec<usize> = column_names
        .iter()
        .map(|name| name.as_ref().chars().count())
        .collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut separator = String::from("+");
    for width in &widths {
        separator.push_str(&"-".repeat(width + 2));
        separator.push('+');
    }
    separator.push('\n');

    let mut text = format!("Selected {} rows:\n", rows.len());
    text.push_str(&separator);
    push_line(&mut text, column_names.iter().map(|name| name.as_ref()), &widths);
    text.push_str(&separator);
    for row in &cells {
        push_line(&mut text, row.iter().map(String::as_str), &widths);
    }
    text.push_str(&separator);
    text.push('\n');

    Ok(text)
}

/// Appends one `| a | b |` line, padding each cell to its column width.
fn push_line<'a>(text: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    text.push('|');
    for (cell, width) in cells.zip(widths) {
        text.push(' ');
        text.push_str(cell);
        text.push_str(&" ".repeat(width - cell.chars().count()));
        text.push_str(" |");
    }
    text.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_row_table() {
        let text = format_result_set(
            &["id", "name"],
            &[vec![Value::Int(1), Value::from("a")]],
        )
        .unwrap();

        assert_eq!(
            text,
            "Selected 1 rows:\n\
             +----+------+\n\
             | id | name |\n\
             +----+------+\n\
             | 1  | a    |\n\
             +----+------+\n\
             \n"
        );
    }

    #[test]
    fn test_cells_widen_columns() {
        let text = format_result_set(
            &["n", "label"],
            &[
                vec![Value::Int(12345), Value::Null],
                vec![Value::Float(1.5), Value::from("a longer label")],
            ],
        )
        .unwrap();

        assert_eq!(
            text,
            "Selected 2 rows:\n\
             +-------+----------------+\n\
             | n     | label          |\n\
             +-------+----------------+\n\
             | 12345 | NULL           |\n\
             | 1.5   | a longer label |\n\
             +-------+----------------+\n\
             \n"
        );
    }

    #[test]
    fn test_empty_result_keeps_header() {
        let text = format_result_set(&["id"], &[]).unwrap();
        assert_eq!(
            text,
            "Selected 0 rows:\n+----+\n| id |\n+----+\n+----+\n\n"
        );
    }

    #[test]
    fn test_no_columns() {
        let text = format_result_set::<&str>(&[], &[]).unwrap();
        assert_eq!(text, "Selected 0 rows:\n+\n|\n+\n+\n\n");
    }

    #[test]
    fn test_width_counts_characters_not_bytes() {
        let text = format_result_set(&["w"], &[vec![Value::from("ünï")]]).unwrap();
        assert!(text.contains("| ünï |\n"));
        assert!(text.contains("+-----+\n"));
    }

    #[test]
    fn test_duplicate_column_names_are_opaque_labels() {
        let text = format_result_set(
            &["x", "x"],
            &[vec![Value::Int(1), Value::Int(2)]],
        )
        .unwrap();
        assert!(text.contains("| x | x |\n"));
        assert!(text.contains("| 1 | 2 |\n"));
    }

    #[test]
    fn test_short_row_is_rejected() {
        let error = format_result_set(&["a", "b"], &[vec![Value::Int(1)]]).unwrap_err();
        assert!(matches!(error, KernelError::Render(_)));
        assert_eq!(error.message(), "row 1 has 1 values, expected 2");
    }

    #[test]
    fn test_long_row_is_rejected() {
        let rows = vec![
            vec![Value::Int(1)],
            vec![Value::Int(1), Value::Int(2)],
        ];
        let error = format_result_set(&["a"], &rows).unwrap_err();
        assert_eq!(error.message(), "row 2 has 2 values, expected 1");
    }

    #[test]
    fn test_formatting_is_deterministic() {
        let rows = vec![
            vec![Value::Int(1), Value::Bytes(vec![0xde, 0xad])],
            vec![Value::Bool(false), Value::Other("2024-01-01".to_string())],
        ];
        let first = format_result_set(&["a", "b"], &rows).unwrap();
        let second = format_result_set(&["a", "b"], &rows).unwrap();
        assert_eq!(first, second);
    }
}
