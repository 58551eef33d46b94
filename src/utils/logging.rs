// Logging utilities
// Structured logging with JSON and human-readable formats

use log::Level;
use serde_json::json;

fn is_secret_key(key: &str) -> bool {
    let norm = key.to_ascii_lowercase().replace([' ', '_', '.', '-'], "");
    norm.contains("password")
        || norm == "pwd"
        || norm.ends_with("pwd")
        || norm.contains("secret")
        || norm.contains("token")
}

/// Mask a runtime property value before it is logged.
///
/// Secret-looking keys are fully masked; otherwise embedded `password=`/`pwd=`
/// pairs (JDBC/ODBC style, `;` or `&` separated) are masked in place.
pub fn mask_property_value(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        return "***".to_string();
    }

    let lower = value.to_ascii_lowercase();
    if !(lower.contains("password=") || lower.contains("pwd=")) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut part = String::new();
    for c in value.chars() {
        if c == ';' || c == '&' || c == '?' {
            out.push_str(&mask_kv_part(&part));
            out.push(c);
            part.clear();
        } else {
            part.push(c);
        }
    }
    out.push_str(&mask_kv_part(&part));
    out
}

fn mask_kv_part(part: &str) -> String {
    let Some((k, _v)) = part.split_once('=') else {
        return part.to_string();
    };

    if is_secret_key(k.trim()) {
        return format!("{}=***", k);
    }

    part.to_string()
}

/// Parse phase and step from log message
/// Extracts [PHASE: ...] and [STEP: ...] patterns
pub fn parse_log_metadata(message: &str) -> (Option<String>, Option<String>, String) {
    let mut phase = None;
    let mut step = None;
    let mut cleaned_message = message.to_string();

    // Extract [PHASE: ...]
    if let Some(start) = message.find("[PHASE:") {
        if let Some(end) = message[start..].find(']') {
            let phase_str = &message[start + 7..start + end].trim();
            phase = Some(phase_str.to_string());
            cleaned_message = format!("{} {}", &message[..start], &message[start + end + 1..])
                .trim()
                .to_string();
        }
    }

    // Extract [STEP: ...]
    if let Some(start) = cleaned_message.find("[STEP:") {
        if let Some(end) = cleaned_message[start..].find(']') {
            let step_str = &cleaned_message[start + 6..start + end].trim();
            step = Some(step_str.to_string());
            cleaned_message = format!(
                "{} {}",
                &cleaned_message[..start],
                &cleaned_message[start + end + 1..]
            )
            .trim()
            .to_string();
        }
    }

    (phase, step, cleaned_message)
}

/// Format log entry as JSON for structured logging
pub fn format_json_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_entry = json!({
        "timestamp": timestamp,
        "level": level.as_str(),
        "target": target,
        "message": message,
    });

    if let Some(phase) = phase {
        log_entry["phase"] = json!(phase);
    }

    if let Some(step) = step {
        log_entry["step"] = json!(step);
    }

    serde_json::to_string(&log_entry).unwrap_or_else(|_| "{}".to_string())
}

/// Format log entry as human-readable text
pub fn format_human_readable_log(
    timestamp: &str,
    level: Level,
    target: &str,
    message: &str,
    phase: Option<&str>,
    step: Option<&str>,
) -> String {
    let mut log_line = format!("[{}] [{}]", timestamp, level.as_str());

    if let Some(phase) = phase {
        log_line.push_str(&format!(" [PHASE: {}]", phase));
    }

    if let Some(step) = step {
        log_line.push_str(&format!(" [STEP: {}]", step));
    }

    log_line.push_str(&format!(" [{}] {}", target, message));
    log_line
}
