use crate::delta::{destination_delta, Delta};

pub const DEFAULT_TEMPLATE: &str = "\
You maintain a source text and a destination text that must stay in correspondence.
The destination was just edited. Update the source to match, changing as little as possible.

Current source:
{source}

Destination before the edit:
{old_destination}

Destination after the edit:
{new_destination}

Destination changes:
{delta}

Steps:
1. State which parts of the destination changed.
2. Apply only the matching change to the source.
3. Leave every other part of the source exactly as written. Do not retranslate or rephrase it.

Reply with the updated source and nothing else.";

const PLACEHOLDERS: [&str; 4] = ["{source}", "{old_destination}", "{new_destination}", "{delta}"];

/// Prompt for a generative candidate generator that asks for a delta-only
/// edit of the source rather than a fresh translation.
#[derive(Debug, Clone)]
pub struct DeltaPrompt {
    template: String,
}

impl Default for DeltaPrompt {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string() }
    }
}

impl DeltaPrompt {
    /// Custom template. Must reference `{source}` and at least one of
    /// `{new_destination}` / `{delta}`, otherwise the model has nothing to
    /// reconcile.
    pub fn new(template: impl Into<String>) -> Result<Self, String> {
        let template = template.into();
        if !template.contains("{source}") {
            return Err("prompt template must contain {source}".into());
        }
        if !template.contains("{new_destination}") && !template.contains("{delta}") {
            return Err("prompt template must contain {new_destination} or {delta}".into());
        }
        Ok(Self { template })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn placeholders() -> &'static [&'static str] {
        &PLACEHOLDERS
    }

    pub fn render(&self, source: &str, old_destination: &str, new_destination: &str) -> String {
        let delta = destination_delta(old_destination, new_destination);
        self.render_with_delta(source, old_destination, new_destination, &delta)
    }

    pub fn render_with_delta(
        &self,
        source: &str,
        old_destination: &str,
        new_destination: &str,
        delta: &Delta,
    ) -> String {
        // Single pass so placeholder-looking text inside the inputs is left alone.
        let mut out = String::with_capacity(self.template.len() + source.len() + new_destination.len() * 2);
        let mut rest = self.template.as_str();
        'scan: while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            for placeholder in PLACEHOLDERS {
                if tail.starts_with(placeholder) {
                    match placeholder {
                        "{source}" => out.push_str(source),
                        "{old_destination}" => out.push_str(old_destination),
                        "{new_destination}" => out.push_str(new_destination),
                        _ => out.push_str(&delta.to_string()),
                    }
                    rest = &tail[placeholder.len()..];
                    continue 'scan;
                }
            }
            out.push('{');
            rest = &tail[1..];
        }
        out.push_str(rest);
        out
    }
}
