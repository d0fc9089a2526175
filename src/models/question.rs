use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// One of the four answer slots of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    pub const ALL: [OptionKey; 4] = [OptionKey::A, OptionKey::B, OptionKey::C, OptionKey::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::A => "A",
            OptionKey::B => "B",
            OptionKey::C => "C",
            OptionKey::D => "D",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "A" => Some(OptionKey::A),
            "B" => Some(OptionKey::B),
            "C" => Some(OptionKey::C),
            "D" => Some(OptionKey::D),
            _ => None,
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quiz question as produced by the model. Nothing in here is trusted until
/// the validator has looked at it; `id` is reassigned on acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math_class: Option<String>,
}

impl Question {
    pub fn option(&self, key: OptionKey) -> Option<&str> {
        self.options.get(key.as_str()).map(|s| s.as_str())
    }

    pub fn correct_key(&self) -> Option<OptionKey> {
        OptionKey::parse(&self.correct_answer)
    }

    /// Builds a question from a loosely-typed model object. Numbers and
    /// booleans in text fields are stringified; anything that is not an
    /// object yields `None`.
    pub fn from_model_value(v: &JsonValue) -> Option<Self> {
        let obj = v.as_object()?;

        let options = obj
            .get("options")
            .and_then(|o| o.as_object())
            .map(|o| {
                o.iter()
                    .filter_map(|(k, val)| {
                        scalar_to_string(val).map(|s| (k.trim().to_ascii_uppercase(), s))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Question {
            id: obj.get("id").and_then(|i| i.as_u64()).unwrap_or(0) as u32,
            question: text_field(v, "question"),
            options,
            correct_answer: text_field(v, "correctAnswer").trim().to_ascii_uppercase(),
            explanation: text_field(v, "explanation"),
            topic: obj.get("topic").and_then(scalar_to_string),
            math_class: obj.get("mathClass").and_then(scalar_to_string),
        })
    }
}

fn text_field(v: &JsonValue, key: &str) -> String {
    v.get(key).and_then(scalar_to_string).unwrap_or_default()
}

fn scalar_to_string(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
