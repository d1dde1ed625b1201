//! Flattening of rubric assessments into a uniform table.
//!
//! The column set is derived once for the whole batch (`derive_columns`) and every
//! row is then built against it, so all rows carry the same columns in the same
//! order whatever the completeness of their assessments.

use crate::rubric::RubricDefinition;
use crate::submission::{AssessmentType, RubricAssessment, Submission};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Columns identifying each row, ahead of the criterion columns.
pub const IDENTITY_COLUMNS: [&str; 6] = [
    "Submission ID",
    "Student ID",
    "Student Name",
    "Rater ID",
    "Rater Name",
    "Assessment Type",
];

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Decides which rubric assessments of a submission become rows.
///
/// Canvas allows several assessments per submission (instructor grading plus
/// peer reviews). The policy makes the choice explicit instead of depending on
/// whatever order the API happens to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RaterPolicy {
    /// One row per (submission, assessment) pair.
    PerRater,
    /// One row per submission: the latest `grading` assessment, or the latest of all
    /// assessments when nobody graded with the rubric.
    #[serde(rename = "instructor")]
    PreferInstructor,
    /// One row per submission: the latest assessment whatever its type.
    Latest,
}

impl Default for RaterPolicy {
    fn default() -> Self {
        RaterPolicy::PreferInstructor
    }
}

impl RaterPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            RaterPolicy::PerRater => "per-rater",
            RaterPolicy::PreferInstructor => "instructor",
            RaterPolicy::Latest => "latest",
        }
    }

    /// Assessments of `submission` that produce rows. `None` stands for the empty row
    /// of a submission nobody assessed.
    ///
    /// The collapsing policies only choose among assessments with usable entries, and
    /// fall back to all of them when none has any.
    pub(crate) fn select<'a>(&self, submission: &'a Submission) -> Vec<Option<&'a RubricAssessment>> {
        let assessments = &submission.assessments;
        if assessments.is_empty() {
            return vec![None];
        }
        if *self == RaterPolicy::PerRater {
            return assessments.iter().map(Some).collect();
        }

        let usable: Vec<&RubricAssessment> = assessments
            .iter()
            .filter(|a| a.has_usable_entries())
            .collect();
        let candidates = if usable.is_empty() {
            assessments.iter().collect()
        } else {
            usable
        };

        match self {
            RaterPolicy::PreferInstructor => {
                let graded: Vec<_> = candidates
                    .iter()
                    .copied()
                    .filter(|a| a.assessment_type == AssessmentType::Grading)
                    .collect();
                if graded.is_empty() {
                    vec![latest(candidates.into_iter())]
                } else {
                    vec![latest(graded.into_iter())]
                }
            }
            _ => vec![latest(candidates.into_iter())],
        }
    }
}

/// Latest by `updated_at`; missing timestamps rank lowest and ties go to the later entry.
fn latest<'a, I>(assessments: I) -> Option<&'a RubricAssessment>
where
    I: Iterator<Item = &'a RubricAssessment>,
{
    assessments.max_by_key(|a| a.updated_at)
}

impl FromStr for RaterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-rater" | "per_rater" | "rater" => Ok(RaterPolicy::PerRater),
            "instructor" | "prefer-instructor" | "prefer_instructor" => {
                Ok(RaterPolicy::PreferInstructor)
            }
            "latest" => Ok(RaterPolicy::Latest),
            other => Err(format!(
                "Unknown rater policy '{}' (expected per-rater, instructor or latest)",
                other
            )),
        }
    }
}

impl fmt::Display for RaterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rubric criterion as it appears in the table header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionColumn {
    pub criterion_id: String,
    pub label: String,
}

impl CriterionColumn {
    pub fn points_header(&self) -> String {
        format!("{} Points", self.label)
    }

    pub fn rating_header(&self) -> String {
        format!("{} Rating", self.label)
    }

    pub fn comments_header(&self) -> String {
        format!("{} Comments", self.label)
    }
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    fn text(value: Option<&str>) -> CellValue {
        match value {
            Some(s) if !s.is_empty() => CellValue::Text(s.to_string()),
            _ => CellValue::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            // `{}` on f64 prints 4 rather than 4.0 and keeps fractions such as 3.5
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRow {
    pub values: Vec<CellValue>,
}

/// Flattened assessments of one assignment.
///
/// Invariant: every row has exactly `columns.len()` values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlatTable {
    pub columns: Vec<String>,
    pub criteria: Vec<CriterionColumn>,
    pub rows: Vec<FlatRow>,
}

impl FlatTable {
    /// Value of `column` in row `row`, if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.values.get(index))
    }

    /// Rows as uniform mappings (same keys, same order) for table widgets and JSON export.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.values.iter())
                    .map(|(column, value)| {
                        let json = match value {
                            CellValue::Empty => Value::Null,
                            CellValue::Number(n) => {
                                serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number)
                            }
                            CellValue::Text(s) => Value::String(s.clone()),
                        };
                        (column.clone(), json)
                    })
                    .collect()
            })
            .collect()
    }
}

fn normalize_label(name: &str) -> String {
    WHITESPACE.replace_all(name.trim(), " ").into_owned()
}

/// Derives the criterion columns for a whole batch of submissions.
///
/// The result is the union of the rubric's criteria (in rubric order) and every
/// criterion any assessment mentions, including entries rejected as malformed, in
/// order of first appearance. Criteria that only show up in later submissions are
/// therefore never lost.
///
/// Labels come from the criterion display name with whitespace collapsed. An empty
/// name becomes `Criterion <id>` and a repeated label is suffixed with ` (<id>)`, plus a
/// counter if that is taken as well, so header names stay unique.
pub fn derive_columns(
    rubric: Option<&RubricDefinition>,
    submissions: &[Submission],
) -> Vec<CriterionColumn> {
    let mut ordered: Vec<(String, Option<String>)> = Vec::new();
    let mut known: HashSet<String> = HashSet::new();

    if let Some(rubric) = rubric {
        for criterion in &rubric.criteria {
            if known.insert(criterion.id.clone()) {
                ordered.push((criterion.id.clone(), Some(criterion.description.clone())));
            }
        }
    }

    for assessment in submissions.iter().flat_map(|s| s.assessments.iter()) {
        let seen = assessment
            .entries
            .iter()
            .map(|e| (Some(&e.criterion_id), &e.criterion_name))
            .chain(
                assessment
                    .malformed
                    .iter()
                    .map(|m| (m.criterion_id.as_ref(), &m.criterion_name)),
            );
        for (criterion_id, criterion_name) in seen {
            if let Some(criterion_id) = criterion_id {
                if known.insert(criterion_id.clone()) {
                    ordered.push((criterion_id.clone(), criterion_name.clone()));
                }
            }
        }
    }

    let mut labels: HashSet<String> = HashSet::new();
    ordered
        .into_iter()
        .map(|(criterion_id, name)| {
            let mut label = normalize_label(name.as_deref().unwrap_or_default());
            if label.is_empty() {
                label = format!("Criterion {}", criterion_id);
            }
            if labels.contains(&label) {
                let base = format!("{} ({})", label, criterion_id);
                label = base.clone();
                let mut n = 2;
                while labels.contains(&label) {
                    label = format!("{} {}", base, n);
                    n += 1;
                }
            }
            labels.insert(label.clone());
            CriterionColumn {
                criterion_id,
                label,
            }
        })
        .collect()
}

fn build_row(
    submission: &Submission,
    assessment: Option<&RubricAssessment>,
    criteria: &[CriterionColumn],
) -> FlatRow {
    let assessor = assessment.and_then(|a| a.assessor.as_ref());

    let mut values = Vec::with_capacity(IDENTITY_COLUMNS.len() + criteria.len() * 3);
    values.push(CellValue::text(submission.id.as_deref()));
    values.push(CellValue::text(submission.student.id.as_deref()));
    values.push(CellValue::text(submission.student.name.as_deref()));
    values.push(CellValue::text(assessor.and_then(|u| u.id.as_deref())));
    values.push(CellValue::text(assessor.and_then(|u| u.name.as_deref())));
    values.push(CellValue::text(assessment.map(|a| a.assessment_type.as_str())));

    for column in criteria {
        match assessment.and_then(|a| a.entry(&column.criterion_id)) {
            Some(entry) => {
                values.push(entry.points.map_or(CellValue::Empty, CellValue::Number));
                values.push(CellValue::text(entry.description.as_deref()));
                values.push(CellValue::text(Some(entry.comment.as_str())));
            }
            None => {
                values.extend([CellValue::Empty, CellValue::Empty, CellValue::Empty]);
            }
        }
    }

    FlatRow { values }
}

/// Flattens the submissions of one assignment into a `FlatTable`.
///
/// Arguments:
/// - `rubric`: The assignment's rubric, when known. It fixes the column order.
/// - `submissions`: Every submission of the assignment, assessed or not.
/// - `policy`: Which assessments become rows when a submission has several.
///
/// Returns:
/// - A table whose rows follow the submission order. Under `PreferInstructor` and
///   `Latest` there is exactly one row per submission; under `PerRater` one row per
///   assessment, and one row for a submission without any. Criteria missing from an
///   assessment yield empty cells rather than missing columns.
///
/// Example:
/// ```
/// use canvas_rubric_report::{flatten, RaterPolicy, Submission};
/// use serde_json::json;
///
/// let submissions = vec![
///     Submission::from_json(&json!({
///         "_id": "1",
///         "user": {"_id": "u1", "name": "A"},
///         "rubricAssessmentsConnection": {"nodes": [{
///             "assessmentType": "grading",
///             "assessmentRatings": [
///                 {"criterion": {"_id": "c1", "description": "Clarity"}, "points": 4},
///                 {"criterion": {"_id": "c2", "description": "Correctness"}, "points": 5}
///             ]
///         }]}
///     })),
///     Submission::from_json(&json!({"_id": "2", "user": {"_id": "u2", "name": "B"}})),
/// ];
///
/// let table = flatten(None, &submissions, RaterPolicy::PreferInstructor);
/// assert_eq!(table.rows.len(), 2);
/// assert!(table.cell(1, "Clarity Points").unwrap().is_empty());
/// ```
pub fn flatten(
    rubric: Option<&RubricDefinition>,
    submissions: &[Submission],
    policy: RaterPolicy,
) -> FlatTable {
    let criteria = derive_columns(rubric, submissions);

    let mut columns: Vec<String> = IDENTITY_COLUMNS.iter().map(|c| c.to_string()).collect();
    for column in &criteria {
        columns.push(column.points_header());
        columns.push(column.rating_header());
        columns.push(column.comments_header());
    }

    let rows = submissions
        .iter()
        .flat_map(|submission| {
            policy
                .select(submission)
                .into_iter()
                .map(move |assessment| (submission, assessment))
        })
        .map(|(submission, assessment)| build_row(submission, assessment, &criteria))
        .collect();

    FlatTable {
        columns,
        criteria,
        rows,
    }
}
