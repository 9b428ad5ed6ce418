//! Admission cutoff comparison
//!
//! Historical cutoff tables for the national high-school graduation exam and
//! the DGNL competency assessment, 2022 through 2024, with the published
//! source for each table. A requested year outside that range is answered
//! with the nearest supported year and an explicit substitution flag.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{Tool, ToolError, ToolOutput};

pub const OLDEST_SUPPORTED_YEAR: i32 = 2022;
pub const NEWEST_SUPPORTED_YEAR: i32 = 2024;

/// One major's graduation-exam cutoff
pub struct GraduationCutoff {
    pub major: &'static str,
    pub code: &'static str,
    pub score: f64,
    pub combinations: &'static [&'static str],
}

/// One major's competency-assessment cutoff
pub struct CompetencyCutoff {
    pub major: &'static str,
    pub code: &'static str,
    pub score: f64,
}

/// A year's cutoff table with its published source
pub struct YearTable<T: 'static> {
    pub year_used: i32,
    pub substituted: bool,
    pub source: &'static str,
    pub table: &'static [T],
}

const GRADUATION_SOURCE_2024: &str = "https://tuyensinh.uit.edu.vn/2024-thong-bao-diem-chuan-xet-tuyen-theo-phuong-thuc-xet-ket-qua-thi-tot-nghiep-thpt-nam-2024";
const GRADUATION_SOURCE_2023: &str = "https://tuyensinh.uit.edu.vn/2023-thong-bao-diem-chuan-xet-tuyen-theo-phuong-thuc-xet-ket-qua-thi-tot-nghiep-thpt-nam-2023";
const GRADUATION_SOURCE_2022: &str = "https://vietnamnet.vn/diem-chuan-truong-dai-hoc-cong-nghe-thong-tin-tp-hcm-2022-2059040.html";

const COMPETENCY_SOURCE_2024: &str = "https://tuyensinh.uit.edu.vn/2024-thong-bao-diem-chuan-xet-tuyen-theo-phuong-thuc-xet-tuyen-dua-tren-ket-qua-ky-thi-danh-gia-nang-luc-do-dhqg-hcm-chuc-nam-2024";
const COMPETENCY_SOURCE_2023: &str = "https://tuyensinh.uit.edu.vn/2023-thong-bao-diem-chuan-xet-tuyen-theo-phuong-thuc-xet-tuyen-dua-tren-ket-qua-ky-thi-danh-gia-nang-luc-do-dhqg-hcm-chuc-nam-2023";
const COMPETENCY_SOURCE_2022: &str = "https://tuyensinh.uit.edu.vn/2022-thong-bao-ket-qua-xet-tuyen-dua-tren-ket-qua-ky-thi-dgnl-dhqg-hcm";

const GRADUATION_2024: &[GraduationCutoff] = &[
    GraduationCutoff { major: "Thương mại điện tử", code: "7340122", score: 26.12, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Khoa học dữ liệu", code: "7460108", score: 27.5, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Khoa học máy tính", code: "7480101", score: 27.3, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Trí tuệ nhân tạo", code: "7480107", score: 28.3, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Mạng máy tính và truyền thông dữ liệu", code: "7480102", score: 25.7, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Kỹ thuật phần mềm", code: "7480103", score: 26.85, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Hệ thống thông tin", code: "7480104", score: 26.25, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Hệ thống thông tin (CT tiên tiến)", code: "7480104_TT", score: 25.55, combinations: &["A01", "D01", "D07"] },
    GraduationCutoff { major: "Kỹ thuật máy tính", code: "7480106", score: 26.25, combinations: &["A00", "A01"] },
    GraduationCutoff { major: "Công nghệ thông tin", code: "7480201", score: 27.1, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Công nghệ thông tin (Việt - Nhật)", code: "7480201_N", score: 25.55, combinations: &["A00", "A01", "D01", "D06", "D07"] },
    GraduationCutoff { major: "An toàn thông tin", code: "7480202", score: 26.77, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Thiết kế vi mạch", code: "75202a1", score: 26.5, combinations: &["A00", "A01"] },
];

const GRADUATION_2023: &[GraduationCutoff] = &[
    GraduationCutoff { major: "Khoa học máy tính", code: "7480101", score: 26.9, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Trí tuệ nhân tạo", code: "7480107", score: 27.8, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Mạng máy tính và truyền thông dữ liệu", code: "7480102", score: 25.4, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Kỹ thuật phần mềm", code: "7480103", score: 26.9, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Hệ thống thông tin", code: "7480104", score: 26.1, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Hệ thống thông tin (CT tiên tiến)", code: "7480104_TT", score: 25.4, combinations: &["A01", "D01", "D07"] },
    GraduationCutoff { major: "Thương mại điện tử", code: "7340122", score: 25.8, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Công nghệ thông tin", code: "7480201", score: 26.9, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Công nghệ thông tin (Việt - Nhật)", code: "7480201_N", score: 25.9, combinations: &["A00", "A01", "D01", "D06", "D07"] },
    GraduationCutoff { major: "Khoa học dữ liệu", code: "7480108", score: 27.1, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "An toàn thông tin", code: "7480202", score: 26.3, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Kỹ thuật máy tính", code: "7480106", score: 25.6, combinations: &["A00", "A01"] },
    GraduationCutoff { major: "Kỹ thuật máy tính (Hệ thống nhúng và IoT)", code: "7480106_IOT", score: 25.6, combinations: &["A00", "A01"] },
    GraduationCutoff { major: "Kỹ thuật máy tính (Thiết kế vi mạch)", code: "7480106_TKVM", score: 25.4, combinations: &["A00", "A01"] },
];

const GRADUATION_2022: &[GraduationCutoff] = &[
    GraduationCutoff { major: "Khoa học máy tính", code: "7480101", score: 27.1, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Trí tuệ nhân tạo", code: "7480107", score: 28.0, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Mạng máy tính và truyền thông dữ liệu", code: "7480102", score: 26.3, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Kỹ thuật phần mềm", code: "7480103", score: 28.05, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Hệ thống thông tin", code: "7480104", score: 26.7, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Hệ thống thông tin (CT tiên tiến)", code: "7480104_TT", score: 26.2, combinations: &["A01", "D01", "D07"] },
    GraduationCutoff { major: "Thương mại điện tử", code: "7340122", score: 27.05, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Công nghệ thông tin", code: "7480201", score: 27.9, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Công nghệ thông tin (Việt - Nhật)", code: "7480201_N", score: 26.3, combinations: &["A00", "A01", "D01", "D06", "D07"] },
    GraduationCutoff { major: "Khoa học dữ liệu", code: "7480109", score: 27.05, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "An toàn thông tin", code: "7480202", score: 26.95, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Kỹ thuật máy tính", code: "7480106", score: 26.55, combinations: &["A00", "A01", "D01", "D07"] },
    GraduationCutoff { major: "Kỹ thuật máy tính (Hệ thống nhúng và IoT)", code: "7480106_IOT", score: 26.5, combinations: &["A00", "A01", "D01", "D07"] },
];

const COMPETENCY_2024: &[CompetencyCutoff] = &[
    CompetencyCutoff { major: "Thương mại điện tử", code: "7340122", score: 870.0 },
    CompetencyCutoff { major: "Khoa học dữ liệu", code: "7460108", score: 935.0 },
    CompetencyCutoff { major: "Khoa học máy tính", code: "7480101", score: 925.0 },
    CompetencyCutoff { major: "Mạng máy tính và truyền thông dữ liệu", code: "7480102", score: 855.0 },
    CompetencyCutoff { major: "Kỹ thuật phần mềm", code: "7480103", score: 926.0 },
    CompetencyCutoff { major: "Hệ thống thông tin", code: "7480104", score: 880.0 },
    CompetencyCutoff { major: "Hệ thống thông tin (CT tiên tiến)", code: "7480104_TT", score: 850.0 },
    CompetencyCutoff { major: "Kỹ thuật máy tính", code: "7480106", score: 888.0 },
    CompetencyCutoff { major: "Trí tuệ nhân tạo", code: "7480107", score: 980.0 },
    CompetencyCutoff { major: "Công nghệ thông tin", code: "7480201", score: 915.0 },
    CompetencyCutoff { major: "Công nghệ thông tin (Việt - Nhật)", code: "7480201_N", score: 850.0 },
    CompetencyCutoff { major: "An toàn thông tin", code: "7480202", score: 910.0 },
    CompetencyCutoff { major: "Thiết kế vi mạch", code: "75202a1", score: 910.0 },
];

const COMPETENCY_2023: &[CompetencyCutoff] = &[
    CompetencyCutoff { major: "Khoa học máy tính", code: "7480101", score: 915.0 },
    CompetencyCutoff { major: "Trí tuệ nhân tạo", code: "7480107", score: 970.0 },
    CompetencyCutoff { major: "Mạng máy tính và truyền thông dữ liệu", code: "7480102", score: 845.0 },
    CompetencyCutoff { major: "Kỹ thuật phần mềm", code: "7480103", score: 925.0 },
    CompetencyCutoff { major: "Hệ thống thông tin", code: "7480104", score: 855.0 },
    CompetencyCutoff { major: "Hệ thống thông tin (CT tiên tiến)", code: "7480104_TT", score: 825.0 },
    CompetencyCutoff { major: "Thương mại điện tử", code: "7340122", score: 860.0 },
    CompetencyCutoff { major: "Công nghệ thông tin", code: "7480201", score: 920.0 },
    CompetencyCutoff { major: "Công nghệ thông tin (Việt - Nhật)", code: "7480201_N", score: 845.0 },
    CompetencyCutoff { major: "Khoa học dữ liệu", code: "7480108", score: 915.0 },
    CompetencyCutoff { major: "An toàn thông tin", code: "7480202", score: 890.0 },
    CompetencyCutoff { major: "Kỹ thuật máy tính", code: "7480106", score: 870.0 },
    CompetencyCutoff { major: "Kỹ thuật máy tính (Hệ thống nhúng và IoT)", code: "7480106_IOT", score: 870.0 },
    CompetencyCutoff { major: "Kỹ thuật máy tính (Thiết kế vi mạch)", code: "7480106_TKVM", score: 810.0 },
];

const COMPETENCY_2022: &[CompetencyCutoff] = &[
    CompetencyCutoff { major: "Khoa học máy tính", code: "7480101", score: 888.0 },
    CompetencyCutoff { major: "Trí tuệ nhân tạo", code: "7480107", score: 940.0 },
    CompetencyCutoff { major: "Mạng máy tính và truyền thông dữ liệu", code: "7480102", score: 810.0 },
    CompetencyCutoff { major: "Kỹ thuật phần mềm", code: "7480103", score: 895.0 },
    CompetencyCutoff { major: "Hệ thống thông tin", code: "7480104", score: 825.0 },
    CompetencyCutoff { major: "Hệ thống thông tin (CT tiên tiến)", code: "7480104_TT", score: 800.0 },
    CompetencyCutoff { major: "Thương mại điện tử", code: "7340122", score: 852.0 },
    CompetencyCutoff { major: "Công nghệ thông tin", code: "7480201", score: 892.0 },
    CompetencyCutoff { major: "Công nghệ thông tin (Việt - Nhật)", code: "7480201_N", score: 805.0 },
    CompetencyCutoff { major: "Khoa học dữ liệu", code: "7480109", score: 880.0 },
    CompetencyCutoff { major: "An toàn thông tin", code: "7480202", score: 858.0 },
    CompetencyCutoff { major: "Kỹ thuật máy tính", code: "7480106", score: 843.0 },
    CompetencyCutoff { major: "Kỹ thuật máy tính (Hệ thống nhúng và IoT)", code: "7480106_IOT", score: 842.0 },
];

/// Graduation-exam table for a year, substituting the nearest supported one
pub fn graduation_table(year: i32) -> YearTable<GraduationCutoff> {
    match year {
        2024 => YearTable { year_used: 2024, substituted: false, source: GRADUATION_SOURCE_2024, table: GRADUATION_2024 },
        2023 => YearTable { year_used: 2023, substituted: false, source: GRADUATION_SOURCE_2023, table: GRADUATION_2023 },
        2022 => YearTable { year_used: 2022, substituted: false, source: GRADUATION_SOURCE_2022, table: GRADUATION_2022 },
        y if y > NEWEST_SUPPORTED_YEAR => YearTable { year_used: 2024, substituted: true, source: GRADUATION_SOURCE_2024, table: GRADUATION_2024 },
        _ => YearTable { year_used: 2022, substituted: true, source: GRADUATION_SOURCE_2022, table: GRADUATION_2022 },
    }
}

/// Competency-assessment table for a year, substituting the nearest supported one
pub fn competency_table(year: i32) -> YearTable<CompetencyCutoff> {
    match year {
        2024 => YearTable { year_used: 2024, substituted: false, source: COMPETENCY_SOURCE_2024, table: COMPETENCY_2024 },
        2023 => YearTable { year_used: 2023, substituted: false, source: COMPETENCY_SOURCE_2023, table: COMPETENCY_2023 },
        2022 => YearTable { year_used: 2022, substituted: false, source: COMPETENCY_SOURCE_2022, table: COMPETENCY_2022 },
        y if y > NEWEST_SUPPORTED_YEAR => YearTable { year_used: 2024, substituted: true, source: COMPETENCY_SOURCE_2024, table: COMPETENCY_2024 },
        _ => YearTable { year_used: 2022, substituted: true, source: COMPETENCY_SOURCE_2022, table: COMPETENCY_2022 },
    }
}

fn known_combination(code: &str) -> bool {
    matches!(code, "A00" | "A01" | "D01" | "D06" | "D07")
}

fn require_f64(input: &Value, key: &str) -> Result<f64, ToolError> {
    input
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| ToolError::invalid_params(format!("{} is required", key)))
}

fn require_year(input: &Value) -> Result<i32, ToolError> {
    let year = input
        .get("year")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ToolError::invalid_params("year is required"))?;
    if !(1900..=9999).contains(&year) {
        return Err(ToolError::invalid_params(format!(
            "year {} is not a plausible admission year",
            year
        )));
    }
    Ok(year as i32)
}

/// Cutoff comparison for the national graduation exam
pub struct GraduationCutoffTool;

#[async_trait]
impl Tool for GraduationCutoffTool {
    fn name(&self) -> &str {
        "compare_graduation_cutoffs"
    }

    fn description(&self) -> &str {
        "So sánh điểm thi tốt nghiệp THPT và tổ hợp với điểm chuẩn từng ngành của UIT theo năm"
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let score = require_f64(&input, "score")?;
        if !(0.0..=30.0).contains(&score) {
            return Err(ToolError::invalid_params("score must be between 0 and 30"));
        }

        let combination = input
            .get("combination")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::invalid_params("combination is required"))?
            .trim()
            .to_uppercase();
        if !known_combination(&combination) {
            return Err(ToolError::invalid_params(format!(
                "unknown combination {}; expected one of A00, A01, D01, D06, D07",
                combination
            )));
        }

        let year = require_year(&input)?;
        let table = graduation_table(year);

        let results: Vec<Value> = table
            .table
            .iter()
            .map(|major| {
                let combination_valid = major.combinations.contains(&combination.as_str());
                json!({
                    "major": major.major,
                    "major_code": major.code,
                    "is_pass": score >= major.score && combination_valid,
                    "required_score": major.score,
                    "valid_combinations": major.combinations,
                })
            })
            .collect();

        Ok(ToolOutput::json(json!({
            "year_requested": year,
            "year_used": table.year_used,
            "substituted": table.substituted,
            "source": table.source,
            "results": results,
        })))
    }
}

/// Cutoff comparison for the DGNL competency assessment
pub struct CompetencyCutoffTool;

#[async_trait]
impl Tool for CompetencyCutoffTool {
    fn name(&self) -> &str {
        "compare_competency_cutoffs"
    }

    fn description(&self) -> &str {
        "So sánh điểm thi đánh giá năng lực (ĐGNL) với điểm chuẩn từng ngành của UIT theo năm"
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let score = require_f64(&input, "score")?;
        if !(0.0..=1200.0).contains(&score) {
            return Err(ToolError::invalid_params(
                "score must be between 0 and 1200",
            ));
        }

        let year = require_year(&input)?;
        let table = competency_table(year);

        let results: Vec<Value> = table
            .table
            .iter()
            .map(|major| {
                json!({
                    "major": major.major,
                    "major_code": major.code,
                    "is_pass": score >= major.score,
                    "required_score": major.score,
                })
            })
            .collect();

        Ok(ToolOutput::json(json!({
            "year_requested": year,
            "year_used": table.year_used,
            "substituted": table.substituted,
            "source": table.source,
            "results": results,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_out_of_range_year_substitutes_2024() {
        let output = GraduationCutoffTool
            .execute(json!({"score": 27.0, "combination": "A00", "year": 2030}))
            .await
            .unwrap();

        assert_eq!(output.value["year_used"], 2024);
        assert_eq!(output.value["substituted"], true);
        assert_eq!(output.value["source"], GRADUATION_SOURCE_2024);
    }

    #[tokio::test]
    async fn test_pre_2022_year_substitutes_oldest() {
        let output = GraduationCutoffTool
            .execute(json!({"score": 27.0, "combination": "A00", "year": 2019}))
            .await
            .unwrap();

        assert_eq!(output.value["year_used"], 2022);
        assert_eq!(output.value["substituted"], true);
    }

    #[tokio::test]
    async fn test_exact_year_not_substituted() {
        let output = GraduationCutoffTool
            .execute(json!({"score": 27.0, "combination": "A00", "year": 2023}))
            .await
            .unwrap();

        assert_eq!(output.value["year_used"], 2023);
        assert_eq!(output.value["substituted"], false);
        assert_eq!(output.value["source"], GRADUATION_SOURCE_2023);
    }

    #[tokio::test]
    async fn test_pass_requires_score_and_combination() {
        // 2024 Kỹ thuật máy tính takes only A00/A01; D01 must fail even
        // with a high enough score
        let output = GraduationCutoffTool
            .execute(json!({"score": 29.0, "combination": "D01", "year": 2024}))
            .await
            .unwrap();

        let results = output.value["results"].as_array().unwrap();
        let ktmt = results
            .iter()
            .find(|r| r["major_code"] == "7480106")
            .unwrap();
        assert_eq!(ktmt["is_pass"], false);

        let cntt = results
            .iter()
            .find(|r| r["major_code"] == "7480201")
            .unwrap();
        assert_eq!(cntt["is_pass"], true);
    }

    #[tokio::test]
    async fn test_implausible_year_rejected() {
        // a year that would overflow i32 must be refused, not wrapped
        let err = GraduationCutoffTool
            .execute(json!({"score": 27.0, "combination": "A00", "year": 999999999999i64}))
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());

        let err = CompetencyCutoffTool
            .execute(json!({"score": 930.0, "year": 150}))
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn test_unknown_combination_rejected() {
        let err = GraduationCutoffTool
            .execute(json!({"score": 27.0, "combination": "B00", "year": 2024}))
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn test_competency_comparison() {
        let output = CompetencyCutoffTool
            .execute(json!({"score": 930.0, "year": 2024}))
            .await
            .unwrap();

        let results = output.value["results"].as_array().unwrap();
        // 930 beats Khoa học máy tính (925) but not Trí tuệ nhân tạo (980)
        let khmt = results
            .iter()
            .find(|r| r["major_code"] == "7480101")
            .unwrap();
        assert_eq!(khmt["is_pass"], true);
        let ttnt = results
            .iter()
            .find(|r| r["major_code"] == "7480107")
            .unwrap();
        assert_eq!(ttnt["is_pass"], false);
    }

    #[tokio::test]
    async fn test_competency_future_year_substituted() {
        let output = CompetencyCutoffTool
            .execute(json!({"score": 900.0, "year": 2026}))
            .await
            .unwrap();
        assert_eq!(output.value["year_used"], 2024);
        assert_eq!(output.value["substituted"], true);
        assert_eq!(output.value["source"], COMPETENCY_SOURCE_2024);
    }
}
