//! Output formatting for CLI results
//!
//! Three output formats:
//! - Table: Human-readable tables (default)
//! - JSON: Structured JSON for scripting and automation
//! - Quiet: Minimal output, exit codes only

use std::path::Path;
use std::str::FromStr;

use comfy_table::{presets::UTF8_FULL, Table};
use gitup_updater::{ErrorLogEntry, FetchFailure, UpdateDecision};
use serde::Serialize;

use crate::ExitCode;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for scripting
    Json,
    /// Minimal output - exit codes only
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper for consistent schema
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    /// Whether the operation was successful
    pub success: bool,
    /// The response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// Command that was executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    /// Create a successful response with command context
    pub fn success_with_command(data: T, command: &str) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: Some(command.to_string()),
        }
    }
}

impl JsonResponse<()> {
    /// Create an error response
    pub fn error(message: &str) -> JsonResponse<()> {
        JsonResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: None,
        }
    }
}

/// Formats output for different modes
pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_quiet(&self) -> bool {
        self.format == OutputFormat::Quiet
    }

    /// Format the updates found by a check
    pub fn format_decisions(&self, decisions: &[UpdateDecision]) -> String {
        match self.format {
            OutputFormat::Table => self.decisions_table(decisions),
            OutputFormat::Json => self.to_json_response(&DecisionsOutput::from(decisions), "check"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format the persisted error log
    pub fn format_log(&self, entries: &[ErrorLogEntry]) -> String {
        match self.format {
            OutputFormat::Table => self.log_table(entries),
            OutputFormat::Json => self.to_json_response(&LogOutput::from(entries), "log"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format recognized header labels
    pub fn format_headers(&self, headers: &[String]) -> String {
        match self.format {
            OutputFormat::Table => headers.join("\n"),
            OutputFormat::Json => self.to_json_response(&HeadersOutput { headers }, "headers"),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format the path written by `init`
    pub fn format_written(&self, path: &Path) -> String {
        match self.format {
            OutputFormat::Table => format!("Wrote {}", path.display()),
            OutputFormat::Json => self.to_json_response(
                &WrittenOutput {
                    path: path.display().to_string(),
                },
                "init",
            ),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format error with exit code context
    pub fn format_error_with_code(&self, error: &str, code: ExitCode) -> String {
        match self.format {
            OutputFormat::Table => format!("Error: {error}"),
            OutputFormat::Json => {
                let response = JsonResponse::error(error);
                match serde_json::to_value(&response) {
                    Ok(mut output) => {
                        output["exit_code"] = serde_json::json!(code as i32);
                        output["exit_code_name"] = serde_json::json!(code.name());
                        output["exit_code_description"] = serde_json::json!(code.description());
                        self.to_json(&output)
                    }
                    Err(e) => format!("{{\"error\": \"{e}\"}}"),
                }
            }
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Progress message, verbose table mode only
    pub fn progress(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            eprintln!("... {message}");
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    fn to_json_response<T: Serialize>(&self, value: &T, command: &str) -> String {
        let response = JsonResponse::success_with_command(value, command);
        serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
            self.to_json(&JsonResponse::error(&format!("Serialization error: {e}")))
        })
    }

    fn decisions_table(&self, decisions: &[UpdateDecision]) -> String {
        if decisions.is_empty() {
            return "All tracked extensions are up to date.".to_string();
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Extension", "Slug", "New Version", "Package"]);

        for d in decisions {
            table.add_row(vec![&d.id, &d.slug, &d.new_version, &d.package]);
        }

        table.to_string()
    }

    fn log_table(&self, entries: &[ErrorLogEntry]) -> String {
        if entries.is_empty() {
            return "No logs found.".to_string();
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Item", "Time", "Target", "Response"]);

        for e in entries {
            table.add_row(vec![
                e.item.clone(),
                format_time(&e.time),
                e.target.clone(),
                describe_failure(&e.response, self.verbose),
            ]);
        }

        table.to_string()
    }
}

fn format_time(time: &chrono::DateTime<chrono::Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// One-cell rendering of a failure; bodies are cut short unless verbose.
fn describe_failure(failure: &FetchFailure, verbose: bool) -> String {
    const BODY_PREVIEW: usize = 120;

    match failure {
        FetchFailure::Transport { message } => format!("transport: {message}"),
        FetchFailure::InvalidReference { message } => format!("invalid reference: {message}"),
        FetchFailure::Status { status, body } => {
            let body = body.trim();
            if verbose || body.chars().count() <= BODY_PREVIEW {
                format!("HTTP {status}: {body}")
            } else {
                let preview: String = body.chars().take(BODY_PREVIEW).collect();
                format!("HTTP {status}: {preview}...")
            }
        }
    }
}

// JSON output structures

#[derive(Serialize)]
struct DecisionsOutput<'a> {
    updates: &'a [UpdateDecision],
    count: usize,
}

impl<'a> From<&'a [UpdateDecision]> for DecisionsOutput<'a> {
    fn from(updates: &'a [UpdateDecision]) -> Self {
        Self {
            updates,
            count: updates.len(),
        }
    }
}

#[derive(Serialize)]
struct LogOutput {
    entries: Vec<LogEntryJson>,
    count: usize,
}

#[derive(Serialize)]
struct LogEntryJson {
    item: String,
    time: i64,
    time_iso: String,
    target: String,
    response: FetchFailure,
}

impl From<&[ErrorLogEntry]> for LogOutput {
    fn from(entries: &[ErrorLogEntry]) -> Self {
        Self {
            count: entries.len(),
            entries: entries
                .iter()
                .map(|e| LogEntryJson {
                    item: e.item.clone(),
                    time: e.time.timestamp(),
                    time_iso: e.time.to_rfc3339(),
                    target: e.target.clone(),
                    response: e.response.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct HeadersOutput<'a> {
    headers: &'a [String],
}

#[derive(Serialize)]
struct WrittenOutput {
    path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn decision() -> UpdateDecision {
        UpdateDecision {
            id: "git-update/git-update.php".to_string(),
            slug: "git-update".to_string(),
            new_version: "v1.3.0".to_string(),
            package: "https://api.github.com/repos/o/r/zipball/v1.3.0".to_string(),
            url: None,
        }
    }

    fn entry(body: &str) -> ErrorLogEntry {
        ErrorLogEntry {
            item: "broken/broken.php".to_string(),
            time: chrono::Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            target: "https://api.github.com/repos/o/broken/tags".to_string(),
            response: FetchFailure::Status {
                status: 404,
                body: body.to_string(),
            },
        }
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("quiet".parse::<OutputFormat>().unwrap(), OutputFormat::Quiet);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_empty_log_message() {
        let formatter = OutputFormatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.format_log(&[]), "No logs found.");
    }

    #[test]
    fn test_log_table_contains_entry() {
        let formatter = OutputFormatter::new(OutputFormat::Table, false);
        let output = formatter.format_log(&[entry("Not Found")]);
        assert!(output.contains("broken/broken.php"));
        assert!(output.contains("2023-11-14 22:13:20 UTC"));
        assert!(output.contains("HTTP 404: Not Found"));
    }

    #[test]
    fn test_long_body_truncated_unless_verbose() {
        let body = "x".repeat(500);
        assert!(describe_failure(&entry(&body).response, false).ends_with("..."));
        assert!(describe_failure(&entry(&body).response, true).ends_with('x'));
    }

    #[test]
    fn test_json_log_envelope() {
        let formatter = OutputFormatter::new(OutputFormat::Json, false);
        let output = formatter.format_log(&[entry("Not Found")]);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["command"], "log");
        assert_eq!(value["data"]["count"], 1);
        assert_eq!(value["data"]["entries"][0]["time"], 1_700_000_000);
        assert_eq!(value["data"]["entries"][0]["response"]["status"], 404);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_decisions_table_and_json() {
        let table = OutputFormatter::new(OutputFormat::Table, false);
        assert_eq!(
            table.format_decisions(&[]),
            "All tracked extensions are up to date."
        );
        assert!(table.format_decisions(&[decision()]).contains("v1.3.0"));

        let json = OutputFormatter::new(OutputFormat::Json, false);
        let value: serde_json::Value =
            serde_json::from_str(&json.format_decisions(&[decision()])).unwrap();
        assert_eq!(value["data"]["count"], 1);
        assert_eq!(value["data"]["updates"][0]["slug"], "git-update");
    }

    #[test]
    fn test_quiet_prints_nothing() {
        let formatter = OutputFormatter::new(OutputFormat::Quiet, true);
        assert!(formatter.is_quiet());
        assert!(formatter.format_decisions(&[decision()]).is_empty());
        assert!(formatter.format_log(&[entry("x")]).is_empty());
        assert!(formatter.format_headers(&["GitHub URI".to_string()]).is_empty());
        assert!(formatter
            .format_error_with_code("boom", ExitCode::GeneralError)
            .is_empty());
    }

    #[test]
    fn test_json_error_carries_exit_code() {
        let formatter = OutputFormatter::new(OutputFormat::Json, false);
        let output = formatter.format_error_with_code("bad inventory", ExitCode::InvalidInput);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "bad inventory");
        assert_eq!(value["exit_code"], 5);
        assert_eq!(value["exit_code_name"], "INVALID_INPUT");
        assert_eq!(
            value["exit_code_description"],
            ExitCode::InvalidInput.description()
        );
    }

    #[test]
    fn test_format_written() {
        let path = Path::new("/tmp/gitup/gitup.toml");
        let table = OutputFormatter::new(OutputFormat::Table, false);
        assert_eq!(table.format_written(path), "Wrote /tmp/gitup/gitup.toml");

        let json = OutputFormatter::new(OutputFormat::Json, false);
        let value: serde_json::Value = serde_json::from_str(&json.format_written(path)).unwrap();
        assert_eq!(value["command"], "init");
        assert_eq!(value["data"]["path"], "/tmp/gitup/gitup.toml");

        let quiet = OutputFormatter::new(OutputFormat::Quiet, false);
        assert!(quiet.format_written(path).is_empty());
    }
}
