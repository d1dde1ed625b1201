// Necessary imports from standard and external crates.
use crate::locator::{find_by_key, value_as_key};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;

/// Snapshot of a Canvas course as returned by the course query.
///
/// The assignment nodes are kept as raw JSON: they are only ever looked up by id and
/// then handed to the report builder, which does its own tolerant parsing.
///
/// Fields:
/// - `id`: Canvas id of the course.
/// - `name`: Course name.
/// - `course_code`: Short course code, when Canvas returns one.
/// - `assignments`: Assignment nodes, each carrying its rubric and submissions.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CourseInfo {
    pub id: u64,
    pub name: String,
    pub course_code: Option<String>,
    pub assignments: Vec<Value>,
}

/// An entry of the assignment menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentOption {
    pub label: String,
    pub id: String,
}

impl CourseInfo {
    /// Looks up one assignment node by its `_id`.
    ///
    /// Returns `None` when no assignment has that id, for instance when it was deleted
    /// after the snapshot was taken.
    pub fn assignment(&self, assignment_id: &str) -> Option<&Value> {
        find_by_key(&self.assignments, "_id", assignment_id)
    }

    /// Menu entries for every assignment with an id, in Canvas order.
    ///
    /// Assignments without a rubric stay selectable but are marked, so the instructor
    /// knows up front that no table will come out of them.
    pub fn assignment_options(&self) -> Vec<AssignmentOption> {
        self.assignments
            .iter()
            .filter_map(|assignment| {
                let id = value_as_key(&assignment["_id"])?;
                let name = assignment["name"].as_str().unwrap_or("Unnamed assignment");
                let label = if assignment["rubric"].is_object() {
                    name.to_string()
                } else {
                    format!("{} (no rubric)", name)
                };
                Some(AssignmentOption { label, id })
            })
            .collect()
    }

    /// Lets the user pick an assignment from a terminal menu.
    ///
    /// Returns:
    /// - `Ok(Some(&Value))`: The chosen assignment node.
    /// - `Ok(None)`: The user chose EXIT or the course has no assignments.
    /// - `Err(_)`: The terminal prompt failed.
    pub fn choose_assignment(&self) -> Result<Option<&Value>, Box<dyn Error>> {
        let options = self.assignment_options();
        if options.is_empty() {
            println!("No assignments found in {}", self.name);
            return Ok(None);
        }

        let mut menu_str: Vec<String> = options.iter().map(|o| o.label.clone()).collect();
        menu_str.push("EXIT".to_string());

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Choose an assignment of {}", self.name))
            .items(&menu_str)
            .default(0)
            .interact()?;

        if selection == menu_str.len() - 1 {
            return Ok(None);
        }

        Ok(self.assignment(&options[selection].id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn course() -> CourseInfo {
        CourseInfo {
            id: 1,
            name: "Biology".to_string(),
            course_code: None,
            assignments: vec![
                json!({"_id": "10", "name": "Quiz", "rubric": null}),
                json!({"_id": "20", "name": "Essay", "rubric": {"title": "Essay rubric"}}),
                json!({"name": "Broken"}),
            ],
        }
    }

    #[test]
    fn test_assignment_lookup() {
        let course = course();
        assert_eq!(course.assignment("20").unwrap()["name"], "Essay");
        assert!(course.assignment("30").is_none());
    }

    #[test]
    fn test_assignment_options() {
        let options = course().assignment_options();
        assert_eq!(
            options,
            vec![
                AssignmentOption {
                    label: "Quiz (no rubric)".to_string(),
                    id: "10".to_string()
                },
                AssignmentOption {
                    label: "Essay".to_string(),
                    id: "20".to_string()
                },
            ]
        );
    }
}
