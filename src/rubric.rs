use crate::locator::value_as_key;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Rubric attached to an assignment, as returned by the GraphQL `rubric` field.
///
/// Criteria keep the order Canvas lists them in, which is also the column order
/// of the flattened report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RubricDefinition {
    pub id: Option<String>,
    pub title: Option<String>,
    pub points_possible: Option<f64>,
    pub criteria: Vec<Criterion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: String,
    pub description: String, // Display name shown on the rubric
    pub long_description: Option<String>,
    pub points: Option<f64>, // Maximum points for this criterion
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Option<String>,
    pub description: String,
    pub long_description: Option<String>,
    pub points: Option<f64>,
}

impl RubricDefinition {
    /// Parses the GraphQL rubric object.
    ///
    /// Returns `None` when the assignment has no rubric (`null`). Criteria without an
    /// `_id` cannot be matched against assessments and are skipped; a repeated `_id`
    /// keeps only its first occurrence so criterion ids stay unique.
    pub fn from_json(j: &Value) -> Option<RubricDefinition> {
        if !j.is_object() {
            return None;
        }

        let mut seen = HashSet::new();
        let criteria = j["criteria"]
            .as_array()
            .map_or(Vec::new(), |criteria| {
                criteria
                    .iter()
                    .filter_map(Criterion::from_json)
                    .filter(|criterion| {
                        if seen.insert(criterion.id.clone()) {
                            true
                        } else {
                            warn!("Duplicate rubric criterion {} ignored", criterion.id);
                            false
                        }
                    })
                    .collect()
            });

        Some(RubricDefinition {
            id: value_as_key(&j["_id"]),
            title: j["title"].as_str().map(String::from),
            points_possible: j["pointsPossible"].as_f64(),
            criteria,
        })
    }
}

impl Criterion {
    fn from_json(j: &Value) -> Option<Criterion> {
        let id = match value_as_key(&j["_id"]) {
            Some(id) => id,
            None => {
                warn!("Rubric criterion without id skipped: {}", j);
                return None;
            }
        };

        let ratings = j["ratings"].as_array().map_or(Vec::new(), |ratings| {
            ratings
                .iter()
                .map(|rating| Rating {
                    id: value_as_key(&rating["_id"]),
                    description: rating["description"].as_str().unwrap_or_default().to_string(),
                    long_description: rating["longDescription"].as_str().map(String::from),
                    points: rating["points"].as_f64(),
                })
                .collect()
        });

        Some(Criterion {
            id,
            description: j["description"].as_str().unwrap_or_default().to_string(),
            long_description: j["longDescription"].as_str().map(String::from),
            points: j["points"].as_f64(),
            ratings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rubric_from_json() {
        let rubric = RubricDefinition::from_json(&json!({
            "_id": "900",
            "title": "Essay rubric",
            "pointsPossible": 10.0,
            "criteria": [
                {
                    "_id": "c1",
                    "description": "Clarity",
                    "points": 5.0,
                    "ratings": [
                        {"_id": "r1", "description": "Clear", "points": 5.0},
                        {"_id": "r2", "description": "Unclear", "points": 0.0}
                    ]
                },
                {"_id": "c2", "description": "Correctness", "points": 5}
            ]
        }))
        .unwrap();

        assert_eq!(rubric.title.as_deref(), Some("Essay rubric"));
        assert_eq!(rubric.points_possible, Some(10.0));
        assert_eq!(rubric.criteria.len(), 2);
        assert_eq!(rubric.criteria[0].ratings.len(), 2);
        assert_eq!(rubric.criteria[1].points, Some(5.0));
        assert_eq!(rubric.criteria[0].description, "Clarity");
        assert_eq!(rubric.criteria[1].id, "c2");
    }

    #[test]
    fn test_rubric_null_is_none() {
        assert!(RubricDefinition::from_json(&json!(null)).is_none());
    }

    #[test]
    fn test_rubric_skips_duplicate_and_unidentified_criteria() {
        let rubric = RubricDefinition::from_json(&json!({
            "criteria": [
                {"_id": "c1", "description": "First"},
                {"description": "No id"},
                {"_id": "c1", "description": "Repeated"},
                {"_id": 2, "description": "Numeric id"}
            ]
        }))
        .unwrap();

        let ids: Vec<_> = rubric.criteria.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "2"]);
        assert_eq!(rubric.criteria[0].description, "First");
    }
}
