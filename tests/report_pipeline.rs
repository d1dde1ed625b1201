use canvas_rubric_report::{
    build_report, to_csv, Canvas, CanvasResultCourse, CellValue, CourseDataSource, CourseInfo,
    NoDataReason, RaterPolicy, ReportResult, RubricReport,
};
use serde_json::{json, Value};
use std::cell::Cell;
use std::error::Error;

/// Stands in for the Canvas client: returns a canned GraphQL `data` object.
struct FakeCanvas {
    data: Value,
    calls: Cell<u32>,
}

impl CourseDataSource for FakeCanvas {
    fn fetch_course(&self, course_id: u64) -> Result<Value, Box<dyn Error>> {
        self.calls.set(self.calls.get() + 1);
        if course_id == 404 {
            return Ok(json!({"course": null}));
        }
        Ok(self.data.clone())
    }
}

fn rating(criterion: &str, points: Value, description: &str, comments: &str) -> Value {
    json!({
        "criterion": {"_id": criterion},
        "points": points,
        "description": description,
        "comments": comments
    })
}

fn course_data() -> Value {
    json!({"course": {
        "_id": "501",
        "name": "Academic Writing",
        "courseCode": "AW-1",
        "assignmentsConnection": {"nodes": [
            {"_id": "10", "name": "Quiz", "rubric": null, "submissionsConnection": {"nodes": []}},
            {
                "_id": "20",
                "name": "Essay",
                "rubric": {
                    "_id": "r1",
                    "title": "Essay rubric",
                    "criteria": [
                        {"_id": "c1", "description": "Clarity", "points": 5},
                        {"_id": "c2", "description": "Correctness", "points": 5}
                    ]
                },
                "submissionsConnection": {"nodes": [
                    {
                        "_id": "1",
                        "user": {"_id": "u1", "name": "A"},
                        "rubricAssessmentsConnection": {"nodes": [
                            {
                                "_id": "a1",
                                "assessmentType": "peer_review",
                                "updatedAt": "2024-04-02T12:00:00Z",
                                "assessor": {"_id": "u2", "name": "B"},
                                "assessmentRatings": [rating("c1", json!(2), "Fair", "Could be clearer")]
                            },
                            {
                                "_id": "a2",
                                "assessmentType": "grading",
                                "updatedAt": "2024-04-01T12:00:00Z",
                                "assessor": {"_id": "t1", "name": "Teacher"},
                                "assessmentRatings": [
                                    rating("c1", json!(4), "Good", "Well structured, clear"),
                                    rating("c2", json!(5), "Excellent", "")
                                ]
                            }
                        ]}
                    },
                    {
                        "_id": "2",
                        "user": {"_id": "u2", "name": "B"},
                        "rubricAssessmentsConnection": {"nodes": []}
                    },
                    {
                        "_id": "3",
                        "user": {"_id": "u3", "name": "C"},
                        "rubricAssessmentsConnection": {"nodes": [{
                            "_id": "a3",
                            "assessmentType": "grading",
                            "assessor": {"_id": "t1", "name": "Teacher"},
                            "assessmentRatings": [
                                rating("c1", json!("N/A"), "Good", "odd points"),
                                rating("c2", json!(3), "Fair", "")
                            ]
                        }]}
                    }
                ]}
            },
            {
                "_id": "30",
                "name": "Draft",
                "rubric": {"title": "Draft rubric", "criteria": [{"_id": "d1", "description": "Effort"}]},
                "submissionsConnection": {"nodes": [{"_id": "9", "user": {"_id": "u9"}}]}
            }
        ]}
    }})
}

fn load_course() -> CourseInfo {
    let source = FakeCanvas {
        data: course_data(),
        calls: Cell::new(0),
    };
    match Canvas::fetch_course(&source, 501) {
        CanvasResultCourse::Ok(course) => {
            assert_eq!(source.calls.get(), 1);
            course
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

fn essay_report(policy: RaterPolicy) -> RubricReport {
    let course = load_course();
    let essay = course.assignment("20").expect("essay is in the snapshot");
    match build_report(essay, policy) {
        ReportResult::Ok(report) => report,
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn instructor_policy_gives_one_row_per_submission() {
    let report = essay_report(RaterPolicy::PreferInstructor);
    let table = &report.table;

    assert_eq!(report.assignment_name.as_deref(), Some("Essay"));
    assert_eq!(report.rubric_title.as_deref(), Some("Essay rubric"));
    assert_eq!(table.rows.len(), 3);

    assert_eq!(table.cell(0, "Rater Name"), Some(&CellValue::Text("Teacher".into())));
    assert_eq!(table.cell(0, "Clarity Points"), Some(&CellValue::Number(4.0)));
    assert_eq!(table.cell(0, "Correctness Comments"), Some(&CellValue::Empty));

    for column in &table.columns[3..] {
        assert_eq!(table.cell(1, column), Some(&CellValue::Empty), "{}", column);
    }

    assert_eq!(table.cell(2, "Clarity Points"), Some(&CellValue::Empty));
    assert_eq!(table.cell(2, "Clarity Rating"), Some(&CellValue::Empty));
    assert_eq!(table.cell(2, "Correctness Points"), Some(&CellValue::Number(3.0)));

    assert_eq!(report.summary.submissions, 3);
    assert_eq!(report.summary.assessed, 2);
    assert_eq!(report.summary.unassessed, 1);
    assert_eq!(report.summary.partially_assessed, 1);
    assert_eq!(report.summary.malformed_entries, 1);
}

#[test]
fn per_rater_policy_keeps_every_assessment() {
    let report = essay_report(RaterPolicy::PerRater);
    let raters: Vec<String> = (0..report.table.rows.len())
        .map(|row| report.table.cell(row, "Rater ID").unwrap().to_string())
        .collect();

    assert_eq!(raters, vec!["u2", "t1", "", "t1"]);
}

#[test]
fn latest_policy_prefers_newest_assessment() {
    let report = essay_report(RaterPolicy::Latest);
    assert_eq!(
        report.table.cell(0, "Assessment Type"),
        Some(&CellValue::Text("peer_review".into()))
    );
    assert_eq!(report.table.cell(0, "Correctness Points"), Some(&CellValue::Empty));
}

#[test]
fn records_are_uniform() {
    let report = essay_report(RaterPolicy::PerRater);
    let records = report.table.to_records();
    let header: Vec<&String> = report.table.columns.iter().collect();

    assert_eq!(records.len(), report.table.rows.len());
    for record in &records {
        assert_eq!(record.keys().collect::<Vec<_>>(), header);
    }
    assert_eq!(records[0]["Clarity Points"], json!(2.0));
    assert_eq!(records[1]["Student Name"], json!("A"));
    assert_eq!(records[2]["Clarity Points"], Value::Null);
}

#[test]
fn csv_export_has_header_and_one_line_per_row() {
    let report = essay_report(RaterPolicy::PreferInstructor);
    let csv = to_csv(&report.table);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "Submission ID,Student ID,Student Name,Rater ID,Rater Name,Assessment Type,\
         Clarity Points,Clarity Rating,Clarity Comments,\
         Correctness Points,Correctness Rating,Correctness Comments"
    );
    assert_eq!(
        lines[1],
        "1,u1,A,t1,Teacher,grading,4,Good,\"Well structured, clear\",5,Excellent,"
    );
    assert_eq!(lines[2], "2,u2,B,,,,,,,,,");
}

#[test]
fn whole_assignment_failures_are_explicit() {
    let course = load_course();

    let quiz = course.assignment("10").unwrap();
    assert!(matches!(
        build_report(quiz, RaterPolicy::default()),
        ReportResult::NoUsableData { reason: NoDataReason::NoRubric, .. }
    ));

    let draft = course.assignment("30").unwrap();
    assert!(matches!(
        build_report(draft, RaterPolicy::default()),
        ReportResult::NoUsableData { reason: NoDataReason::NoAssessmentData, .. }
    ));

    assert!(course.assignment("99").is_none());
}

#[test]
fn unknown_course_is_not_found() {
    let source = FakeCanvas {
        data: course_data(),
        calls: Cell::new(0),
    };
    assert!(matches!(
        Canvas::fetch_course(&source, 404),
        CanvasResultCourse::ErrNotFound(_)
    ));
}
