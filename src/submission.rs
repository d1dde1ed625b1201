// Import necessary crates and modules
use crate::locator::value_as_key;
use crate::student::UserInfo;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Kind of rubric assessment, mirroring Canvas' `assessmentType`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    Grading,
    PeerReview,
    ProvisionalGrade,
    #[serde(other)] // Any assessment type this tool does not know about
    Other,
}

impl Default for AssessmentType {
    fn default() -> Self {
        AssessmentType::Other
    }
}

impl AssessmentType {
    pub fn as_str(&self) -> &str {
        match self {
            AssessmentType::Grading => "grading",
            AssessmentType::PeerReview => "peer_review",
            AssessmentType::ProvisionalGrade => "provisional_grade",
            AssessmentType::Other => "other",
        }
    }

    fn parse(s: &str) -> AssessmentType {
        match s.to_ascii_lowercase().as_str() {
            "grading" => AssessmentType::Grading,
            "peer_review" => AssessmentType::PeerReview,
            "provisional_grade" => AssessmentType::ProvisionalGrade,
            _ => AssessmentType::Other,
        }
    }
}

/// Score given for one criterion by one rater.
///
/// `points` is `None` when the rater opened the criterion without scoring it. A
/// criterion the rater skipped entirely has no `AssessmentEntry` at all.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AssessmentEntry {
    pub criterion_id: String,
    pub criterion_name: Option<String>,
    pub points: Option<f64>,
    pub description: Option<String>, // Selected rating description
    pub comment: String,
}

/// An assessment entry rejected while parsing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MalformedEntry {
    pub criterion_id: Option<String>,
    pub criterion_name: Option<String>,
    pub reason: String,
}

/// One rater's filled-in rubric for a submission.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RubricAssessment {
    pub id: Option<String>,
    pub assessor: Option<UserInfo>,
    pub assessment_type: AssessmentType,
    pub updated_at: Option<DateTime<Utc>>,
    pub entries: Vec<AssessmentEntry>,
    pub malformed: Vec<MalformedEntry>,
}

/// A student's submission together with every rubric assessment attached to it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub id: Option<String>,
    pub student: UserInfo,
    pub submitted_at: Option<DateTime<Utc>>,
    pub state: Option<String>,
    pub assessments: Vec<RubricAssessment>,
}

fn parse_timestamp(j: &Value) -> Option<DateTime<Utc>> {
    j.as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Reads a points value. `Ok(None)` for null/missing, `Err` for anything non-numeric.
fn parse_points(j: &Value) -> Result<Option<f64>, String> {
    let points = match j {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match points {
        Some(p) if p.is_finite() => Ok(Some(p)),
        _ => Err(format!("points value {} is not numeric", j)),
    }
}

fn parse_optional_text(j: &Value, field: &str) -> Result<Option<String>, String> {
    match j {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(format!("{} value {} is not text", field, other)),
    }
}

impl AssessmentEntry {
    /// Parses one element of `assessmentRatings`.
    ///
    /// Arguments:
    /// - `j`: The rating object, expected to carry `criterion { _id description }`,
    ///   `points`, `description` and `comments`.
    ///
    /// Returns:
    /// - `Ok(AssessmentEntry)`: The entry, with `points == None` when the criterion was not scored.
    /// - `Err(MalformedEntry)`: The entry has no criterion id or a field of the wrong shape
    ///   (for instance `"points": "N/A"`). The caller treats it as missing.
    pub fn from_json(j: &Value) -> Result<AssessmentEntry, MalformedEntry> {
        let criterion_id = value_as_key(&j["criterion"]["_id"]);
        let criterion_name = j["criterion"]["description"].as_str().map(String::from);

        let malformed = |reason: String| MalformedEntry {
            criterion_id: criterion_id.clone(),
            criterion_name: criterion_name.clone(),
            reason,
        };

        let id = criterion_id
            .clone()
            .ok_or_else(|| malformed("entry has no criterion id".to_string()))?;
        let points = parse_points(&j["points"]).map_err(&malformed)?;
        let description = parse_optional_text(&j["description"], "description").map_err(&malformed)?;
        let comment = parse_optional_text(&j["comments"], "comments")
            .map_err(&malformed)?
            .unwrap_or_default();

        Ok(AssessmentEntry {
            criterion_id: id,
            criterion_name,
            points,
            description,
            comment,
        })
    }

    /// True when the entry carries anything an instructor could review.
    pub fn is_usable(&self) -> bool {
        self.points.is_some() || self.description.is_some() || !self.comment.trim().is_empty()
    }
}

impl RubricAssessment {
    /// Parses one node of `rubricAssessmentsConnection`.
    ///
    /// Malformed ratings are moved to `malformed` and logged; they never abort the
    /// remaining ratings. When the same criterion is rated twice only the first
    /// rating is kept.
    pub fn from_json(j: &Value) -> RubricAssessment {
        let mut entries = Vec::new();
        let mut malformed = Vec::new();
        let mut seen = HashSet::new();

        match j["assessmentRatings"].as_array() {
            Some(ratings) => {
                for rating in ratings {
                    match AssessmentEntry::from_json(rating) {
                        Ok(entry) => {
                            if seen.insert(entry.criterion_id.clone()) {
                                entries.push(entry);
                            } else {
                                warn!(
                                    "Repeated rating for criterion {} in assessment {:?} ignored",
                                    entry.criterion_id, j["_id"]
                                );
                            }
                        }
                        Err(bad) => {
                            warn!(
                                "Malformed rating for criterion {:?} treated as missing: {}",
                                bad.criterion_id, bad.reason
                            );
                            malformed.push(bad);
                        }
                    }
                }
            }
            None if !j["assessmentRatings"].is_null() => {
                warn!("assessmentRatings is not a list: {}", j["assessmentRatings"]);
            }
            None => {}
        }

        RubricAssessment {
            id: value_as_key(&j["_id"]),
            assessor: UserInfo::from_json(&j["assessor"]),
            assessment_type: j["assessmentType"]
                .as_str()
                .map_or(AssessmentType::Other, AssessmentType::parse),
            updated_at: parse_timestamp(&j["updatedAt"]),
            entries,
            malformed,
        }
    }

    pub fn entry(&self, criterion_id: &str) -> Option<&AssessmentEntry> {
        self.entries.iter().find(|e| e.criterion_id == criterion_id)
    }

    pub fn has_usable_entries(&self) -> bool {
        self.entries.iter().any(AssessmentEntry::is_usable)
    }
}

impl Submission {
    /// Converts a GraphQL submission node into a `Submission`.
    ///
    /// This never fails: every submission must still produce a report row, so missing
    /// or badly shaped fields simply come back as `None` or an empty assessment list.
    pub fn from_json(j: &Value) -> Submission {
        if !j.is_object() {
            warn!("Submission node is not an object: {}", j);
            return Submission::default();
        }

        let assessments = j["rubricAssessmentsConnection"]["nodes"]
            .as_array()
            .map_or(Vec::new(), |nodes| {
                nodes
                    .iter()
                    .filter(|node| node.is_object())
                    .map(RubricAssessment::from_json)
                    .collect()
            });

        Submission {
            id: value_as_key(&j["_id"]),
            student: UserInfo::from_json(&j["user"]).unwrap_or_default(),
            submitted_at: parse_timestamp(&j["submittedAt"]),
            state: j["state"].as_str().map(String::from),
            assessments,
        }
    }

    pub fn has_usable_assessment(&self) -> bool {
        self.assessments.iter().any(RubricAssessment::has_usable_entries)
    }
}
