use crate::connection::CourseDataSource;
use crate::course::CourseInfo;
use log::{error, info};
use serde_json::Value;

/// Enum to represent the result of fetching a course snapshot.
///
/// Distinguishes a course Canvas does not know (or the token cannot see) from a
/// failure to talk to Canvas at all.
#[derive(Debug)]
pub enum CanvasResultCourse {
    Ok(CourseInfo),        // Success case with the course snapshot.
    ErrNotFound(String),   // The course id matched nothing.
    ErrConnection(String), // Request or GraphQL error with a descriptive message.
}

/// Main interface for reading course data from Canvas.
///
/// `Canvas` holds no state of its own: the data source is passed in, so the same
/// code path serves the live client and test fakes.
pub struct Canvas {}

impl Canvas {
    /// Fetches the course snapshot for `course_id`.
    ///
    /// Arguments:
    /// - `source`: Where course data comes from, usually a `CanvasClient`.
    /// - `course_id`: Canvas id of the course.
    ///
    /// Returns:
    /// - `CanvasResultCourse`: The parsed snapshot, or why it could not be obtained.
    ///
    /// Example:
    /// ```
    /// use canvas_rubric_report::{Canvas, CanvasResultCourse, CourseDataSource};
    /// use serde_json::{json, Value};
    /// use std::error::Error;
    ///
    /// struct Fixture;
    ///
    /// impl CourseDataSource for Fixture {
    ///     fn fetch_course(&self, _course_id: u64) -> Result<Value, Box<dyn Error>> {
    ///         Ok(json!({"course": {"_id": "1", "name": "Biology",
    ///             "assignmentsConnection": {"nodes": []}}}))
    ///     }
    /// }
    ///
    /// match Canvas::fetch_course(&Fixture, 1) {
    ///     CanvasResultCourse::Ok(course) => assert_eq!(course.name, "Biology"),
    ///     other => panic!("{:?}", other),
    /// }
    /// ```
    pub fn fetch_course<S>(source: &S, course_id: u64) -> CanvasResultCourse
    where
        S: CourseDataSource + ?Sized,
    {
        match source.fetch_course(course_id) {
            Ok(data) => Canvas::convert_json_to_course(course_id, &data),
            Err(e) => {
                error!("Failed to fetch course {}: {}", course_id, e);
                CanvasResultCourse::ErrConnection(format!(
                    "Failed to fetch course {} with error: {}",
                    course_id, e
                ))
            }
        }
    }

    /// Converts the GraphQL `data` object into a course snapshot.
    fn convert_json_to_course(course_id: u64, data: &Value) -> CanvasResultCourse {
        let course = &data["course"];
        if !course.is_object() {
            return CanvasResultCourse::ErrNotFound(format!(
                "Course {} was not found or is not visible with this token",
                course_id
            ));
        }

        let assignments = course["assignmentsConnection"]["nodes"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        let name = course["name"]
            .as_str()
            .map_or_else(|| format!("Course {}", course_id), String::from);

        info!("Loaded course {} with {} assignments", name, assignments.len());
        CanvasResultCourse::Ok(CourseInfo {
            id: course_id,
            name,
            course_code: course["courseCode"].as_str().map(String::from),
            assignments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::error::Error;

    struct FakeSource(Result<Value, String>);

    impl CourseDataSource for FakeSource {
        fn fetch_course(&self, _course_id: u64) -> Result<Value, Box<dyn Error>> {
            self.0.clone().map_err(|e| e.into())
        }
    }

    #[test]
    fn test_fetch_course() {
        let source = FakeSource(Ok(json!({"course": {
            "_id": "31",
            "name": "Intro to Rust",
            "courseCode": "RS101",
            "assignmentsConnection": {"nodes": [{"_id": "1", "name": "Quiz"}]}
        }})));

        match Canvas::fetch_course(&source, 31) {
            CanvasResultCourse::Ok(course) => {
                assert_eq!(course.id, 31);
                assert_eq!(course.name, "Intro to Rust");
                assert_eq!(course.course_code.as_deref(), Some("RS101"));
                assert_eq!(course.assignments.len(), 1);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_fetch_course_not_found() {
        let source = FakeSource(Ok(json!({"course": null})));
        assert!(matches!(
            Canvas::fetch_course(&source, 31),
            CanvasResultCourse::ErrNotFound(_)
        ));
    }

    #[test]
    fn test_fetch_course_connection_error() {
        let source = FakeSource(Err("HTTP request failed with status code: 500".to_string()));
        match Canvas::fetch_course(&source, 31) {
            CanvasResultCourse::ErrConnection(msg) => assert!(msg.contains("500")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
