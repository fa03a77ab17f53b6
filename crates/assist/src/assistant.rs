use async_trait::async_trait;
use serde::Serialize;
use sim::{PartialReadings, Readings, Sensor};

use crate::error::CollaboratorError;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssistantReply {
    pub text: String,
    pub references: Vec<String>,
}

/// Free-text diagnostic assistant fed with the rack state and manual excerpts.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn ask(&self, system_state: &str, manual_context: &[String]) -> Result<AssistantReply, CollaboratorError>;
}

pub const PROMPT_TEMPLATE: &str = "\
You are a refrigeration system diagnostic assistant. Use the following context
to help diagnose the issue:

System State:
{system_state}

Relevant Manual Sections:
{manual_context}

Please provide:
1. Diagnosis
2. Confidence level (0-1.0)
3. Next steps
4. Safety warnings
5. Manual references

Format your response in a clear, structured way suitable for apprentice technicians.";

/// One `key: value unit` line per known reading, then the alarms.
pub fn format_system_state(readings: &PartialReadings) -> String {
    let mut lines: Vec<String> = Sensor::ALL
        .into_iter()
        .filter_map(|s| readings.reading(s).map(|v| format!("{}: {v} {}", s.key(), s.unit())))
        .collect();
    let alarms: Vec<&str> = readings.alarms.iter().map(String::as_str).collect();
    lines.push(format!("alarms: {}", alarms.join(", ")));
    lines.join("\n")
}

pub fn render_prompt(system_state: &str, manual_context: &[String]) -> String {
    PROMPT_TEMPLATE
        .replace("{system_state}", system_state)
        .replace("{manual_context}", &manual_context.join("\n"))
}
