use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Where an inbound payload arrived from.
#[derive(Clone, Copy, Debug)]
pub enum Source<'a> {
    Event(&'a str),
    Channel(&'a str),
}

impl Source<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Source::Event(_) => "event",
            Source::Channel(_) => "channel",
        }
    }

    fn name(&self) -> &str {
        match self {
            Source::Event(name) | Source::Channel(name) => name,
        }
    }
}

#[derive(Serialize)]
struct PushOutput<'a> {
    kind: &'static str,
    name: &'a str,
    payload: Option<&'a Value>,
    timestamp: String,
}

pub fn print_push(source: Source<'_>, payload: Option<&Value>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PushOutput {
                kind: source.kind(),
                name: source.name(),
                payload,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "NAME", "PAYLOAD"])
                .add_row(vec![
                    source.kind().to_string(),
                    source.name().to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{}={} payload={}",
                source.kind(),
                source.name(),
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => {
            print_raw(payload);
        }
    }
}

fn print_raw(payload: Option<&Value>) {
    let mut out = std::io::stdout();
    let text = match payload {
        Some(Value::String(text)) => text.clone(),
        Some(value) => value.to_string(),
        None => String::new(),
    };
    let _ = out.write_all(text.as_bytes());
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

fn payload_preview(payload: Option<&Value>) -> String {
    match payload {
        Some(Value::String(text)) => text.clone(),
        Some(value) => value.to_string(),
        None => "<none>".to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_payloads_print_unquoted() {
        assert_eq!(payload_preview(Some(&json!("hello"))), "hello");
    }

    #[test]
    fn object_payloads_print_as_json() {
        assert_eq!(payload_preview(Some(&json!({"x": 1}))), "{\"x\":1}");
    }

    #[test]
    fn missing_payloads_print_placeholder() {
        assert_eq!(payload_preview(None), "<none>");
    }
}
