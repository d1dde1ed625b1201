// Import necessary crates and modules
use crate::flatten::{flatten, FlatTable, RaterPolicy};
use crate::locator::value_as_key;
use crate::rubric::RubricDefinition;
use crate::submission::Submission;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Structure holding the parts of a GraphQL assignment node this tool works with.
///
/// Fields:
/// - `id`: The assignment `_id`.
/// - `name`: The assignment name.
/// - `rubric`: The attached rubric, `None` when the assignment has none.
/// - `submissions`: The submissions connection, `None` when the node carries no usable
///   connection (as opposed to an empty one).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AssignmentInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub rubric: Option<RubricDefinition>,
    pub submissions: Option<Vec<Submission>>,
}

impl AssignmentInfo {
    /// Converts an assignment node of `assignmentsConnection` into an `AssignmentInfo`.
    pub fn from_json(j: &Value) -> AssignmentInfo {
        let submissions = j["submissionsConnection"]["nodes"]
            .as_array()
            .map(|nodes| nodes.iter().map(Submission::from_json).collect());

        AssignmentInfo {
            id: value_as_key(&j["_id"]),
            name: j["name"].as_str().map(String::from),
            rubric: RubricDefinition::from_json(&j["rubric"]),
            submissions,
        }
    }

    /// Heading used by the renderer, e.g. `Essay 1 (1234)`.
    pub fn heading(&self) -> String {
        format!(
            "{} ({})",
            self.name.as_deref().unwrap_or("Unnamed assignment"),
            self.id.as_deref().unwrap_or("?")
        )
    }
}

/// Reason an assignment produced no table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoDataReason {
    NoRubric,
    NoSubmissions,
    NoAssessmentData,
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::NoRubric => f.write_str("No rubric found for this assignment."),
            NoDataReason::NoSubmissions => {
                f.write_str("No submissions were returned for this assignment.")
            }
            NoDataReason::NoAssessmentData => f.write_str("This rubric has no assessment data."),
        }
    }
}

/// Counts shown next to the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub submissions: usize,
    pub assessed: usize,
    /// Assessed, but at least one rubric criterion has no entry.
    pub partially_assessed: usize,
    pub unassessed: usize,
    pub malformed_entries: usize,
}

/// Flattened rubric assessments of one assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricReport {
    pub assignment_id: Option<String>,
    pub assignment_name: Option<String>,
    pub rubric_title: Option<String>,
    pub policy: RaterPolicy,
    pub table: FlatTable,
    pub summary: ReportSummary,
}

/// Enum to represent the outcome of building a report for one assignment.
///
/// Problems with single entries or submissions never show up here; they are absorbed
/// while flattening. Only whole-assignment conditions become `NoUsableData`, so the
/// caller can show a specific message instead of an empty table.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportResult {
    Ok(RubricReport),
    NoUsableData {
        assignment: AssignmentInfo,
        reason: NoDataReason,
    },
}

fn summarize(rubric: &RubricDefinition, submissions: &[Submission], policy: RaterPolicy) -> ReportSummary {
    let mut summary = ReportSummary {
        submissions: submissions.len(),
        ..ReportSummary::default()
    };

    for submission in submissions {
        summary.malformed_entries += submission
            .assessments
            .iter()
            .map(|a| a.malformed.len())
            .sum::<usize>();

        if !submission.has_usable_assessment() {
            summary.unassessed += 1;
            continue;
        }
        summary.assessed += 1;

        // Partial when any assessment that becomes a row skips a rubric criterion
        let incomplete = policy
            .select(submission)
            .into_iter()
            .flatten()
            .any(|a| rubric.criteria.iter().any(|c| a.entry(&c.id).is_none()));
        if incomplete {
            summary.partially_assessed += 1;
        }
    }

    summary
}

/// Builds the rubric report for one assignment node.
///
/// Arguments:
/// - `assignment`: The assignment node as found in the course snapshot.
/// - `policy`: Which rubric assessments become rows.
///
/// Returns:
/// - `ReportResult::Ok(report)`: The flattened table and its summary.
/// - `ReportResult::NoUsableData { .. }`: The assignment has no rubric, no submissions
///   connection, or not a single usable assessment entry.
///
/// Example:
/// ```
/// use canvas_rubric_report::{build_report, NoDataReason, RaterPolicy, ReportResult};
/// use serde_json::json;
///
/// let assignment = json!({"_id": "5", "name": "Quiz", "rubric": null});
/// match build_report(&assignment, RaterPolicy::default()) {
///     ReportResult::NoUsableData { reason, .. } => assert_eq!(reason, NoDataReason::NoRubric),
///     ReportResult::Ok(_) => unreachable!(),
/// }
/// ```
pub fn build_report(assignment: &Value, policy: RaterPolicy) -> ReportResult {
    let info = AssignmentInfo::from_json(assignment);

    let rubric = match &info.rubric {
        Some(rubric) => rubric,
        None => {
            info!("Assignment {} has no rubric", info.heading());
            return ReportResult::NoUsableData {
                assignment: info,
                reason: NoDataReason::NoRubric,
            };
        }
    };

    let submissions = match &info.submissions {
        Some(submissions) if !submissions.is_empty() => submissions,
        _ => {
            info!("Assignment {} has no submissions", info.heading());
            return ReportResult::NoUsableData {
                assignment: info,
                reason: NoDataReason::NoSubmissions,
            };
        }
    };

    if !submissions.iter().any(Submission::has_usable_assessment) {
        info!("Assignment {} has no rubric assessment data", info.heading());
        return ReportResult::NoUsableData {
            assignment: info,
            reason: NoDataReason::NoAssessmentData,
        };
    }

    let table = flatten(Some(rubric), submissions, policy);
    let summary = summarize(rubric, submissions, policy);
    debug!(
        "Flattened {} submissions of {} into {} rows x {} columns",
        submissions.len(),
        info.heading(),
        table.rows.len(),
        table.columns.len()
    );

    ReportResult::Ok(RubricReport {
        assignment_id: info.id.clone(),
        assignment_name: info.name.clone(),
        rubric_title: rubric.title.clone(),
        policy,
        table,
        summary,
    })
}
