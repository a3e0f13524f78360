use serde_json::{json, Value};

pub trait EventLog {
    fn info(&self, event: &str, details: Value);
    fn error(&self, event: &str, details: Value);
}

/// Writes one JSON object per line to stderr, which CloudWatch Logs ingests as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonLineLog {
    component: &'static str,
}

impl JsonLineLog {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl EventLog for JsonLineLog {
    fn info(&self, event: &str, details: Value) {
        eprintln!("{}", log_record(self.component, None, event, details));
    }

    fn error(&self, event: &str, details: Value) {
        eprintln!("{}", log_record(self.component, Some("error"), event, details));
    }
}

fn log_record(component: &str, level: Option<&str>, event: &str, details: Value) -> Value {
    let mut record = json!({
        "component": component,
        "event": event,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "details": details,
    });
    if let (Some(level), Some(fields)) = (level, record.as_object_mut()) {
        fields.insert("level".to_string(), Value::from(level));
    }
    record
}
