use colored::*;
use serde_json::json;
use crate::cli::cli_args::OutputFormat;
use crate::utils::{
    error::{ExplorerError, ExplorerResult},
    types::{FlatTable, Row, Value},
};

/// Formats flattened tables for CLI output
pub struct OutputFormatter;

impl OutputFormatter {
    /// Format a table according to the specified format
    pub fn format_result(table: &FlatTable, format: &OutputFormat) -> ExplorerResult<String> {
        match format {
            OutputFormat::Table => Ok(Self::format_table(table)),
            OutputFormat::Json => Self::format_json(table),
            OutputFormat::Csv => Self::format_csv(table),
        }
    }

    /// Format rows as a colored table; missing cells stay blank
    pub fn format_table(table: &FlatTable) -> String {
        if table.is_empty() {
            return "No results found.".dimmed().to_string();
        }

        let mut output = String::new();

        // Calculate column widths
        let mut col_widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
        for row in &table.rows {
            for (i, column) in table.columns.iter().enumerate() {
                let width = Self::cell_text(row, column).chars().count();
                col_widths[i] = col_widths[i].max(width);
            }
        }

        // Ensure minimum width
        for width in &mut col_widths {
            *width = (*width).max(8);
        }

        // Header
        output.push_str(&Self::format_table_separator(&col_widths, true));
        output.push('|');
        for (i, column) in table.columns.iter().enumerate() {
            output.push_str(&format!(" {} |", Self::pad(column.bold().cyan(), column, col_widths[i])));
        }
        output.push('\n');
        output.push_str(&Self::format_table_separator(&col_widths, false));

        // Data rows
        for row in &table.rows {
            output.push('|');
            for (i, column) in table.columns.iter().enumerate() {
                let plain = Self::cell_text(row, column);
                let colored = match row.get(column) {
                    Some(value) => Self::format_value_colored(value),
                    None => "".normal(),
                };
                output.push_str(&format!(" {} |", Self::pad(colored, &plain, col_widths[i])));
            }
            output.push('\n');
        }

        output.push_str(&Self::format_table_separator(&col_widths, true));

        // Footer with metadata
        output.push_str(&format!(
            "\n{} {} in {:.2}ms\n",
            table.row_count().to_string().green().bold(),
            if table.row_count() == 1 { "row" } else { "rows" },
            table.execution_time.as_secs_f64() * 1000.0
        ));

        output
    }

    /// Pad by visible width, escape codes do not count
    fn pad(colored: ColoredString, plain: &str, width: usize) -> String {
        let fill = width.saturating_sub(plain.chars().count());
        format!("{}{}", colored, " ".repeat(fill))
    }

    /// Format table separator line
    fn format_table_separator(col_widths: &[usize], is_border: bool) -> String {
        let edge = if is_border { '+' } else { '|' };
        let mut separator = String::new();

        separator.push(edge);
        for &width in col_widths {
            separator.push_str(&"-".repeat(width + 2));
            separator.push(edge);
        }

        separator.push('\n');
        separator
    }

    /// Format rows as JSON
    pub fn format_json(table: &FlatTable) -> ExplorerResult<String> {
        let output = json!({
            "columns": table.columns,
            "data": table.rows,
            "metadata": {
                "row_count": table.row_count(),
                "execution_time_ms": table.execution_time.as_millis() as u64,
            }
        });

        serde_json::to_string_pretty(&output).map_err(|e| ExplorerError::Output(e.to_string()))
    }

    /// Format rows as CSV with the table's column order
    pub fn format_csv(table: &FlatTable) -> ExplorerResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(&table.columns)
            .map_err(|e| ExplorerError::Output(e.to_string()))?;
        for row in &table.rows {
            let record: Vec<String> = table
                .columns
                .iter()
                .map(|column| row.get(column).map(Value::to_cell_string).unwrap_or_default())
                .collect();
            writer
                .write_record(&record)
                .map_err(|e| ExplorerError::Output(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExplorerError::Output(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| ExplorerError::Output(e.to_string()))
    }

    fn cell_text(row: &Row, column: &str) -> String {
        row.get(column).map(Value::to_string).unwrap_or_default()
    }

    /// Convert a Value to a colored string for table display
    fn format_value_colored(value: &Value) -> ColoredString {
        match value {
            Value::Text(s) => s.normal(),
            Value::Integer(i) => i.to_string().blue(),
            Value::Float(f) => f.to_string().blue(),
            Value::Boolean(true) => "true".green(),
            Value::Boolean(false) => "false".red(),
            Value::Date(d) => d.yellow(),
            Value::Null => "NULL".dimmed(),
        }
    }

    /// Format error message for CLI display
    pub fn format_error(error: &ExplorerError) -> String {
        format!("{} {}", "Error:".red().bold(), error.to_string().red())
    }

    /// Format warning message for CLI display
    pub fn format_warning(message: &str) -> String {
        format!("{} {}", "Warning:".yellow().bold(), message)
    }

    /// Format success message for CLI display
    pub fn format_success(message: &str) -> String {
        format!("{} {}", "Success:".green().bold(), message)
    }

    /// Format info message for CLI display
    pub fn format_info(message: &str) -> String {
        format!("{} {}", "Info:".blue().bold(), message)
    }
}
