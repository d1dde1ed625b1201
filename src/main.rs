//! `rubric-report`: pick a course and an assignment, see its rubric assessments as a
//! table and optionally export them to CSV.

use canvas_rubric_report::{
    build_report, export_file_name, render_report, write_csv, Canvas, CanvasClient,
    CanvasCredentials, CanvasResultCourse, ReportConfig, ReportResult,
};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use dotenvy::dotenv;
use std::error::Error;
use std::process::exit;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

fn init_logging(level: &str) {
    let filter = match level.trim() {
        "" => LevelFilter::INFO,
        level => LevelFilter::from_str(level).unwrap_or(LevelFilter::INFO),
    };
    // The fmt subscriber also installs the `log` bridge used by the library.
    if let Err(e) = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Logging disabled: {}", e);
    }
}

fn ask_course_id(theme: &ColorfulTheme) -> Result<u64, Box<dyn Error>> {
    let course_id: u64 = Input::with_theme(theme)
        .with_prompt("Course ID")
        .interact_text()?;
    Ok(course_id)
}

fn run(config: &ReportConfig, client: &CanvasClient) -> Result<(), Box<dyn Error>> {
    let theme = ColorfulTheme::default();

    let course = loop {
        let course_id = match config.course_id {
            Some(id) => id,
            None => ask_course_id(&theme)?,
        };

        println!("Fetching course {}...", course_id);
        match Canvas::fetch_course(client, course_id) {
            CanvasResultCourse::Ok(course) => break course,
            CanvasResultCourse::ErrNotFound(msg) if config.course_id.is_none() => {
                eprintln!("{}. Please enter another course id.", msg);
            }
            CanvasResultCourse::ErrNotFound(msg) | CanvasResultCourse::ErrConnection(msg) => {
                return Err(msg.into());
            }
        }
    };
    println!("You have selected: {}", course.name);

    while let Some(assignment) = course.choose_assignment()? {
        match build_report(assignment, config.rater_policy) {
            ReportResult::Ok(report) => {
                println!("{}", render_report(&report));

                let export = Confirm::with_theme(&theme)
                    .with_prompt("Download CSV?")
                    .default(false)
                    .interact()?;
                if export {
                    let file_name = export_file_name(
                        report.assignment_name.as_deref(),
                        report.assignment_id.as_deref(),
                    );
                    let path = write_csv(&report.table, &config.export_dir.join(file_name))?;
                    println!("Complete! See csv: {}", path.display());
                }
            }
            ReportResult::NoUsableData { assignment, reason } => {
                println!("{}\n{}", assignment.heading(), reason);
            }
        }
    }

    Ok(())
}

fn main() {
    // A missing .env file is fine: variables may come from the shell instead.
    dotenv().ok();
    // Must precede ReportConfig::from_env, which logs invalid values.
    init_logging(&std::env::var("LOG_LEVEL").unwrap_or_default());
    let config = ReportConfig::from_env();

    let credentials = match CanvasCredentials::credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };
    let client = CanvasClient::new(credentials);

    if let Err(e) = run(&config, &client) {
        eprintln!("Error: {}", e);
        exit(1);
    }
}
