use crate::runner::Output;
use colored::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    /// The command line about to be dispatched.
    Running(String),
    KeyValue { key: String, value: String },
    Plain(String),
    /// A whole stderr blob, kept verbatim.
    Error(String),
}

/// Turn one runner output into log lines.
pub fn format_output(output: &Output) -> Vec<LogLine> {
    match output {
        Output::Error(text) => vec![LogLine::Error(text.clone())],
        Output::Data(text) => text.trim().lines().map(format_line).collect(),
    }
}

/// Split on the first colon only; colon-free lines pass through unchanged.
pub fn format_line(line: &str) -> LogLine {
    match line.split_once(':') {
        Some((key, value)) => LogLine::KeyValue {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        },
        None => LogLine::Plain(line.to_string()),
    }
}

impl LogLine {
    /// Styled text for a plain terminal (one-shot subcommands).
    pub fn to_console(&self, running_label: &str, error_label: &str) -> String {
        match self {
            LogLine::Running(cmd) => format!("{} {}", running_label, cmd).dimmed().to_string(),
            LogLine::KeyValue { key, value } => format!("{} {}", format!("{}:", key).bold(), value),
            LogLine::Plain(text) => text.clone(),
            LogLine::Error(text) => format!("{} {}", error_label, text.trim_end())
                .red()
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_colon_only() {
        assert_eq!(
            format_line("Home-page: https://requests.readthedocs.io"),
            LogLine::KeyValue {
                key: "Home-page".into(),
                value: "https://requests.readthedocs.io".into(),
            }
        );
    }

    #[test]
    fn colon_free_line_is_unchanged() {
        assert_eq!(format_line("  no colon here "), LogLine::Plain("  no colon here ".into()));
    }

    #[test]
    fn pip_show_blob() {
        let blob = "Name: requests\nVersion: 2.31.0\nRequires: certifi, idna\n---\n";
        let lines = format_output(&Output::Data(blob.into()));
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[1],
            LogLine::KeyValue { key: "Version".into(), value: "2.31.0".into() }
        );
        assert_eq!(lines[3], LogLine::Plain("---".into()));
    }

    #[test]
    fn error_blob_is_verbatim() {
        let blob = "WARNING: Package(s) not found: nope\n";
        assert_eq!(
            format_output(&Output::Error(blob.into())),
            vec![LogLine::Error(blob.into())]
        );
    }

    #[test]
    fn console_marks_errors() {
        colored::control::set_override(false);
        let line = LogLine::Error("boom\n".into());
        assert_eq!(line.to_console("Running:", "Error:"), "Error: boom");
        let kv = format_line("Name: requests");
        assert_eq!(kv.to_console("Running:", "Error:"), "Name: requests");
    }
}
