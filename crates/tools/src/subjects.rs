//! Subject-combination scoring
//!
//! Validates three exam subject names against the known combination codes,
//! normalizing the informal aliases applicants type (with or without tone
//! marks), and returns the total score plus the matched code. An unmatched
//! triple is a structured invalid-combination result, not an error.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{Tool, ToolError, ToolOutput};

const TOOL_NAME: &str = "sum_subjects";

/// Official subject name with the aliases applicants use for it
struct SubjectAliases {
    official: &'static str,
    aliases: &'static [&'static str],
}

const SUBJECT_ALIASES: &[SubjectAliases] = &[
    SubjectAliases {
        official: "Toán",
        aliases: &["toán", "toán học", "toán cao cấp", "toan"],
    },
    SubjectAliases {
        official: "Vật lý",
        aliases: &["vật lý", "vật lý học", "lý", "lí", "li", "ly"],
    },
    SubjectAliases {
        official: "Hóa học",
        aliases: &["hóa", "hóa học", "hoa", "hoa hoc"],
    },
    SubjectAliases {
        official: "Tiếng Anh",
        aliases: &["tiếng anh", "anh văn", "anh ngữ", "anh"],
    },
    SubjectAliases {
        official: "Ngữ văn",
        aliases: &["ngữ văn", "văn học", "van", "văn"],
    },
    SubjectAliases {
        official: "Tiếng Nhật",
        aliases: &["tiếng nhật", "nhật ngữ", "nhat", "nhật"],
    },
];

/// Admission combination codes and their subject triples
const VALID_COMBINATIONS: &[(&str, [&str; 3])] = &[
    ("A00", ["Toán", "Vật lý", "Hóa học"]),
    ("A01", ["Toán", "Vật lý", "Tiếng Anh"]),
    ("D01", ["Toán", "Ngữ văn", "Tiếng Anh"]),
    ("D06", ["Toán", "Ngữ văn", "Tiếng Nhật"]),
    ("D07", ["Toán", "Hóa học", "Tiếng Anh"]),
];

/// Map an applicant-typed subject name to its official form
pub fn normalize_subject(name: &str) -> Option<&'static str> {
    let needle = name.trim().to_lowercase();
    SUBJECT_ALIASES
        .iter()
        .find(|s| s.official.to_lowercase() == needle || s.aliases.contains(&needle.as_str()))
        .map(|s| s.official)
}

/// Result of scoring a subject triple
#[derive(Debug, Clone, PartialEq)]
pub enum CombinationOutcome {
    /// Matched a known combination
    Valid { total: f64, code: &'static str },
    /// One or more names did not resolve to a known subject
    UnknownSubjects(Vec<String>),
    /// All names resolved but the triple matches no combination code
    NoMatchingCombination([&'static str; 3]),
}

/// Score three subjects against the combination table
pub fn score_combination(names: [&str; 3], points: [f64; 3]) -> CombinationOutcome {
    let mut normalized = [""; 3];
    let mut unknown = Vec::new();

    for (i, name) in names.iter().enumerate() {
        match normalize_subject(name) {
            Some(official) => normalized[i] = official,
            None => unknown.push(name.to_string()),
        }
    }
    if !unknown.is_empty() {
        return CombinationOutcome::UnknownSubjects(unknown);
    }

    let mut entered = normalized;
    entered.sort_unstable();

    for (code, subjects) in VALID_COMBINATIONS {
        let mut expected = *subjects;
        expected.sort_unstable();
        if expected == entered {
            return CombinationOutcome::Valid {
                total: points.iter().sum(),
                code,
            };
        }
    }

    CombinationOutcome::NoMatchingCombination(normalized)
}

fn combination_listing() -> Value {
    Value::Object(
        VALID_COMBINATIONS
            .iter()
            .map(|(code, subjects)| {
                (
                    code.to_string(),
                    Value::Array(subjects.iter().map(|s| json!(s)).collect()),
                )
            })
            .collect(),
    )
}

/// Subject-combination scoring tool
pub struct SubjectScoreTool;

impl SubjectScoreTool {
    fn require_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolError> {
        input
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params(format!("{} is required", key)))
    }

    fn require_f64(input: &Value, key: &str) -> Result<f64, ToolError> {
        let value = input
            .get(key)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ToolError::invalid_params(format!("{} is required", key)))?;
        if !(0.0..=10.0).contains(&value) {
            return Err(ToolError::invalid_params(format!(
                "{} must be between 0 and 10",
                key
            )));
        }
        Ok(value)
    }
}

#[async_trait]
impl Tool for SubjectScoreTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Tính tổng điểm ba môn thi và xác định mã tổ hợp xét tuyển (A00, A01, D01, D06, D07)"
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let names = [
            Self::require_str(&input, "subject_a_name")?,
            Self::require_str(&input, "subject_b_name")?,
            Self::require_str(&input, "subject_c_name")?,
        ];
        let points = [
            Self::require_f64(&input, "subject_a_point")?,
            Self::require_f64(&input, "subject_b_point")?,
            Self::require_f64(&input, "subject_c_point")?,
        ];

        let result = match score_combination(names, points) {
            CombinationOutcome::Valid { total, code } => json!({
                "valid": true,
                "total_score": total,
                "combination": code,
            }),
            CombinationOutcome::UnknownSubjects(unknown) => json!({
                "valid": false,
                "unknown_subjects": unknown,
                "message": "Môn học không được hỗ trợ; hãy nhập tổ hợp thuộc danh sách hợp lệ.",
                "valid_combinations": combination_listing(),
            }),
            CombinationOutcome::NoMatchingCombination(subjects) => json!({
                "valid": false,
                "entered_subjects": subjects,
                "message": "Ba môn đã nhập không khớp tổ hợp xét tuyển nào; hãy nhập tổ hợp thuộc danh sách hợp lệ.",
                "valid_combinations": combination_listing(),
            }),
        };

        Ok(ToolOutput::json(result))
    }
}
