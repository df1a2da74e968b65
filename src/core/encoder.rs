//! Entry encoders
//!
//! Two encodings share one field vocabulary:
//! - Console: tab separated `time level [scope] [caller] msg [fields] [stack]`
//! - Json: one object per line with keys `level`, `time`, `scope`, `caller`,
//!   `msg`, `stack`, followed by any structured fields

use super::log_entry::Entry;
use super::timestamp::format_timestamp;

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const NAME_KEY: &str = "scope";
pub const CALLER_KEY: &str = "caller";
pub const MESSAGE_KEY: &str = "msg";
pub const STACK_KEY: &str = "stack";

/// Encoding applied to every entry of a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoder {
    /// Human-readable, tab separated
    ///
    /// Example: `2025-01-08T10:30:45.123456Z	info	main.rs:12	Request processed`
    #[default]
    Console,

    /// JSON object per line
    ///
    /// Example: `{"level":"info","time":"2025-01-08T10:30:45.123456Z","msg":"Request processed"}`
    Json,
}

impl Encoder {
    pub fn new(json: bool) -> Self {
        if json {
            Encoder::Json
        } else {
            Encoder::Console
        }
    }

    /// Encode an entry as one newline-terminated line.
    pub fn encode(&self, entry: &Entry) -> String {
        let mut line = match self {
            Encoder::Console => self.encode_console(entry),
            Encoder::Json => self.encode_json(entry),
        };
        line.push('\n');
        line
    }

    fn encode_console(&self, entry: &Entry) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(6);
        parts.push(format_timestamp(&entry.time));
        parts.push(entry.level.as_str().to_string());

        if let Some(ref name) = entry.logger_name {
            parts.push(name.clone());
        }
        if let Some(ref caller) = entry.caller {
            parts.push(caller.to_string());
        }
        parts.push(Self::sanitize(&entry.message));

        if !entry.fields.is_empty() {
            parts.push(self.fields_object(entry).to_string());
        }
        if let Some(ref stack) = entry.stack {
            parts.push(stack.clone());
        }

        parts.join("\t")
    }

    fn encode_json(&self, entry: &Entry) -> String {
        let mut json_obj = serde_json::Map::new();

        json_obj.insert(
            LEVEL_KEY.to_string(),
            serde_json::Value::String(entry.level.as_str().to_string()),
        );
        json_obj.insert(
            TIME_KEY.to_string(),
            serde_json::Value::String(format_timestamp(&entry.time)),
        );
        if let Some(ref name) = entry.logger_name {
            json_obj.insert(NAME_KEY.to_string(), serde_json::Value::String(name.clone()));
        }
        if let Some(ref caller) = entry.caller {
            json_obj.insert(
                CALLER_KEY.to_string(),
                serde_json::Value::String(caller.to_string()),
            );
        }
        json_obj.insert(
            MESSAGE_KEY.to_string(),
            serde_json::Value::String(entry.message.clone()),
        );
        if let Some(ref stack) = entry.stack {
            json_obj.insert(STACK_KEY.to_string(), serde_json::Value::String(stack.clone()));
        }

        // reserved keys win over structured fields of the same name
        for (key, value) in &entry.fields {
            if !json_obj.contains_key(key) {
                json_obj.insert(key.clone(), serde_json::Value::from(value));
            }
        }

        serde_json::Value::Object(json_obj).to_string()
    }

    fn fields_object(&self, entry: &Entry) -> serde_json::Value {
        let fields = entry
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
            .collect();
        serde_json::Value::Object(fields)
    }

    /// Keep one entry on one console line.
    fn sanitize(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_entry::Caller;
    use crate::core::log_level::Level;
    use chrono::{TimeZone, Utc};

    fn entry() -> Entry {
        let mut entry = Entry::new(Level::Info, "Hello");
        entry.time = Utc
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime");
        entry
    }

    #[test]
    fn test_console_minimal() {
        let line = Encoder::Console.encode(&entry());
        assert_eq!(line, "2025-01-08T10:30:45.000000Z\tinfo\tHello\n");
    }

    #[test]
    fn test_console_all_segments() {
        let e = entry()
            .with_logger_name("beep")
            .with_caller(Caller::new("src/server/handler.rs", 31))
            .with_stack("   0: main".to_string());
        let line = Encoder::Console.encode(&e);
        assert_eq!(
            line,
            "2025-01-08T10:30:45.000000Z\tinfo\tbeep\thandler.rs:31\tHello\t   0: main\n"
        );
    }

    #[test]
    fn test_console_escapes_control_characters() {
        let mut e = entry();
        e.message = "one\ntwo\tthree".to_string();
        let line = Encoder::Console.encode(&e);
        assert!(line.ends_with("one\\ntwo\\tthree\n"));
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn test_json_key_order() {
        let e = entry()
            .with_logger_name("beep")
            .with_caller(Caller::new("lib.rs", 3))
            .with_stack("trace".to_string());
        let line = Encoder::Json.encode(&e);
        assert_eq!(
            line,
            "{\"level\":\"info\",\"time\":\"2025-01-08T10:30:45.000000Z\",\"scope\":\"beep\",\
             \"caller\":\"lib.rs:3\",\"msg\":\"Hello\",\"stack\":\"trace\"}\n"
        );
    }

    #[test]
    fn test_json_omits_absent_keys_and_appends_fields() {
        let e = entry().with_field("user", "ana").with_field("msg", "shadowed");
        let parsed: serde_json::Value =
            serde_json::from_str(Encoder::Json.encode(&e).trim_end()).unwrap();

        assert!(parsed.get(NAME_KEY).is_none());
        assert!(parsed.get(CALLER_KEY).is_none());
        assert!(parsed.get(STACK_KEY).is_none());
        assert_eq!(parsed["msg"], "Hello");
        assert_eq!(parsed["user"], "ana");
    }

    #[test]
    fn test_console_fields_segment() {
        let e = entry().with_field("attempt", 2i64);
        let line = Encoder::Console.encode(&e);
        assert!(line.ends_with("\tHello\t{\"attempt\":2}\n"));
    }
}
