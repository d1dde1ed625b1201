// HTTP plumbing between this crate and a Canvas instance.
use crate::CanvasCredentials;
use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use serde_json::{json, Value};
use std::error::Error;
use std::io;
use std::time::Duration;

/// The number of attempts made for an HTTP request before giving up.
///
/// Only 403 responses are retried: Canvas answers 403 when a token exceeds its
/// request quota, and the quota recovers after a short pause.
pub const SYNC_ATTEMPT: u32 = 5;

/// Pause between two attempts of a rate-limited request.
const RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Enumeration representing the types of HTTP request methods used against Canvas.
///
/// `Post` carries its JSON body, which is how GraphQL queries are sent.
#[derive(Clone, Debug)]
pub enum HttpMethod {
    Get,
    Post(Value),
}

// Result of a single attempt: the response, or the status code (0 for transport failures).
pub type HttpRequestResult = Result<Response, u16>;

/// Source of course snapshots.
///
/// The report flow only depends on this trait, so it can run against a live Canvas
/// instance (`CanvasClient`) or against canned JSON in tests.
pub trait CourseDataSource {
    /// Returns the GraphQL `data` object for the course query of `course_id`.
    fn fetch_course(&self, course_id: u64) -> Result<Value, Box<dyn Error>>;
}

/// Handle used for every request to Canvas.
///
/// It is built once per process from the loaded credentials and then passed by
/// reference; the underlying `reqwest` client keeps its connection pool for the
/// lifetime of the handle.
///
/// Example:
/// ```no_run
/// use canvas_rubric_report::{CanvasClient, CanvasCredentials, CourseDataSource};
///
/// let credentials = CanvasCredentials {
///     url_canvas: "https://canvas.example.edu".to_string(),
///     token_canvas: "token".to_string(),
/// };
/// let client = CanvasClient::new(credentials);
/// let course = client.fetch_course(1234);
/// ```
#[derive(Debug, Clone)]
pub struct CanvasClient {
    client: Client,
    credentials: CanvasCredentials,
}

/// GraphQL query returning everything the report needs for one course.
pub const COURSE_QUERY: &str = r#"
query RubricAssessments($courseId: ID!) {
  course(id: $courseId) {
    _id
    name
    courseCode
    assignmentsConnection {
      nodes {
        _id
        name
        rubric {
          _id
          title
          pointsPossible
          criteria {
            _id
            description
            longDescription
            points
            ratings {
              _id
              description
              longDescription
              points
            }
          }
        }
        submissionsConnection {
          nodes {
            _id
            state
            submittedAt
            user {
              _id
              name
            }
            rubricAssessmentsConnection {
              nodes {
                _id
                assessmentType
                updatedAt
                assessor {
                  _id
                  name
                }
                assessmentRatings {
                  criterion {
                    _id
                    description
                  }
                  points
                  description
                  comments
                }
              }
            }
          }
        }
      }
    }
  }
}
"#;

impl CanvasClient {
    pub fn new(credentials: CanvasCredentials) -> CanvasClient {
        CanvasClient {
            client: Client::new(),
            credentials,
        }
    }

    /// Sends an HTTP request with a single attempt.
    fn send_http_request_single_attempt(
        &self,
        method: &HttpMethod,
        url: &str,
        params: &[(String, String)],
    ) -> HttpRequestResult {
        let request_builder = match method {
            HttpMethod::Get => self
                .client
                .get(url)
                .bearer_auth(&self.credentials.token_canvas)
                .query(params),
            HttpMethod::Post(body) => self
                .client
                .post(url)
                .bearer_auth(&self.credentials.token_canvas)
                .json(body),
        };

        match request_builder.send() {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(response.status().as_u16()),
            Err(e) => {
                debug!("Request to {} failed: {}", url, e);
                Err(0)
            }
        }
    }

    /// Sends an HTTP request with retry logic.
    ///
    /// Attempts the request up to `SYNC_ATTEMPT` times, pausing between attempts when
    /// Canvas answers 403. Any other failure is returned immediately.
    ///
    /// Arguments:
    /// - `method`: GET, or POST with its JSON body.
    /// - `url`: Absolute URL of the endpoint.
    /// - `params`: Query string parameters.
    ///
    /// Returns:
    /// - `Result<Response, Box<dyn Error>>`: The successful response or an error naming the status code.
    pub fn send_http_request(
        &self,
        method: HttpMethod,
        url: &str,
        params: Vec<(String, String)>,
    ) -> Result<Response, Box<dyn Error>> {
        let mut attempts = 0;

        while attempts < SYNC_ATTEMPT {
            match self.send_http_request_single_attempt(&method, url, &params) {
                Ok(response) => return Ok(response),
                Err(403) if attempts < SYNC_ATTEMPT - 1 => {
                    attempts += 1;
                    warn!("Canvas returned 403 for {}, retrying ({}/{})", url, attempts, SYNC_ATTEMPT);
                    std::thread::sleep(RETRY_DELAY);
                }
                Err(status) => {
                    return Err(Box::new(io::Error::new(
                        io::ErrorKind::Other,
                        format!("HTTP request failed with status code: {}", status),
                    )));
                }
            }
        }

        Err(Box::new(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "All retry attempts failed with status 403",
        )))
    }

    /// Runs a GraphQL query and returns its `data` object.
    ///
    /// Returns an error when the request fails or when the response lists GraphQL `errors`.
    pub fn post_graphql(&self, query: &str, variables: Value) -> Result<Value, Box<dyn Error>> {
        let body = json!({ "query": query, "variables": variables });
        let response = self.send_http_request(
            HttpMethod::Post(body),
            &self.credentials.graphql_url(),
            Vec::new(),
        )?;
        let payload: Value = response.json()?;
        graphql_data(payload)
    }

    /// Checks the credentials against `GET /api/v1/users/self`.
    ///
    /// Returns:
    /// - `Ok(200)`: The token is accepted.
    /// - `Err(u16)`: The status code returned by Canvas (0 for network errors).
    pub fn test_credentials(&self) -> Result<u16, u16> {
        let url = self.credentials.rest_url("users/self");
        self.send_http_request_single_attempt(&HttpMethod::Get, &url, &[])
            .map(|_| 200)
    }
}

/// Extracts `data` from a GraphQL response, turning reported `errors` into an error.
pub(crate) fn graphql_data(mut payload: Value) -> Result<Value, Box<dyn Error>> {
    if let Some(errors) = payload["errors"].as_array() {
        if !errors.is_empty() {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| e["message"].as_str().unwrap_or("unknown error").to_string())
                .collect();
            return Err(format!("GraphQL query failed: {}", messages.join("; ")).into());
        }
    }

    match payload.get_mut("data") {
        Some(data) if !data.is_null() => Ok(data.take()),
        _ => Err("GraphQL response has no data".into()),
    }
}

impl CourseDataSource for CanvasClient {
    fn fetch_course(&self, course_id: u64) -> Result<Value, Box<dyn Error>> {
        debug!("Fetching rubric assessments for course {}", course_id);
        self.post_graphql(COURSE_QUERY, json!({ "courseId": course_id.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_data_returns_data() {
        let data = graphql_data(json!({"data": {"course": {"name": "Biology"}}})).unwrap();
        assert_eq!(data["course"]["name"], "Biology");
    }

    #[test]
    fn test_graphql_data_reports_errors() {
        let err = graphql_data(json!({
            "data": null,
            "errors": [{"message": "not found"}, {"message": "denied"}]
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "GraphQL query failed: not found; denied");

        assert!(graphql_data(json!({})).is_err());
        assert!(graphql_data(json!({"data": null, "errors": []})).is_err());
    }

    #[test]
    fn test_course_query_requests_assessments() {
        for field in ["assessmentRatings", "assessor", "assessmentType", "submissionsConnection"] {
            assert!(COURSE_QUERY.contains(field), "{}", field);
        }
    }
}
