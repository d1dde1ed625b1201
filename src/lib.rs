//! # Canvas Rubric Report
//!
//! This library pulls the rubric assessments of a Canvas LMS assignment and flattens them
//! into a table an instructor can read in the terminal or export as CSV.
//!
//! ## Core Features
//!
//! - **Course snapshot:** One GraphQL query returns a course with its assignments, their
//!   rubrics and every submission's rubric assessments.
//! - **Record lookup:** `find_by_key` drills into a single assignment or submission by id.
//! - **Flattening:** `flatten` turns the nested criterion → rating → points/comment data into
//!   rows with one uniform column set for the whole assignment, keeping students with
//!   partial or missing assessments.
//! - **Rater policy:** `RaterPolicy` decides explicitly which of several assessments of a
//!   submission (instructor, peers) become rows.
//! - **Export:** `to_csv`/`write_csv` produce the delimited file, `render_table` the
//!   terminal view.
//!
//! ## Usage
//!
//! The binary `rubric-report` runs the whole flow interactively. As a library, hand any
//! `CourseDataSource` to `Canvas::fetch_course`, look the assignment up on the returned
//! `CourseInfo` and pass it to `build_report`:
//!
//! ```
//! use canvas_rubric_report::{build_report, Canvas, CanvasResultCourse, CourseDataSource,
//!     RaterPolicy, ReportResult};
//! use serde_json::{json, Value};
//! use std::error::Error;
//!
//! struct Snapshot(Value);
//!
//! impl CourseDataSource for Snapshot {
//!     fn fetch_course(&self, _course_id: u64) -> Result<Value, Box<dyn Error>> {
//!         Ok(self.0.clone())
//!     }
//! }
//!
//! let source = Snapshot(json!({"course": {"name": "Biology", "assignmentsConnection": {"nodes": [{
//!     "_id": "20",
//!     "name": "Essay",
//!     "rubric": {"title": "Essay rubric", "criteria": [{"_id": "c1", "description": "Clarity"}]},
//!     "submissionsConnection": {"nodes": [{
//!         "_id": "s1",
//!         "user": {"_id": "u1", "name": "Ada"},
//!         "rubricAssessmentsConnection": {"nodes": [{
//!             "assessmentType": "grading",
//!             "assessmentRatings": [{"criterion": {"_id": "c1"}, "points": 4}]
//!         }]}
//!     }]}
//! }]}}}));
//!
//! let course = match Canvas::fetch_course(&source, 1) {
//!     CanvasResultCourse::Ok(course) => course,
//!     other => panic!("{:?}", other),
//! };
//! let assignment = course.assignment("20").expect("assignment exists");
//! if let ReportResult::Ok(report) = build_report(assignment, RaterPolicy::default()) {
//!     assert_eq!(report.table.rows.len(), 1);
//! }
//! ```
pub mod assignment; // Builds the report of one assignment.
pub mod canvas; // Fetches course snapshots from a data source.
pub mod config; // Settings read from the environment.
mod connection; // Manages HTTP connections and GraphQL requests to the Canvas API.
pub mod course; // Course snapshot and assignment selection.
pub mod credentials; // Handles the storage and retrieval of Canvas API credentials.
pub mod export; // CSV export.
pub mod flatten; // Flattens assessments into uniform rows.
mod locator; // Looks records up by key.
pub mod render; // Terminal rendering.
pub mod rubric; // Rubric definitions.
mod student; // Users appearing in submissions and assessments.
pub mod submission; // Submissions and their rubric assessments.

// Exports key structures for external use.
pub use assignment::{build_report, AssignmentInfo, NoDataReason, ReportResult, ReportSummary, RubricReport};
pub use canvas::{Canvas, CanvasResultCourse};
pub use config::ReportConfig;
pub use connection::{CanvasClient, CourseDataSource, HttpMethod, COURSE_QUERY};
pub use course::{AssignmentOption, CourseInfo};
pub use credentials::CanvasCredentials;
pub use export::{export_file_name, to_csv, write_csv};
pub use flatten::{derive_columns, flatten, CellValue, CriterionColumn, FlatRow, FlatTable, RaterPolicy};
pub use locator::find_by_key;
pub use render::{render_report, render_table};
pub use rubric::{Criterion, Rating, RubricDefinition};
pub use student::UserInfo;
pub use submission::{AssessmentEntry, AssessmentType, MalformedEntry, RubricAssessment, Submission};
