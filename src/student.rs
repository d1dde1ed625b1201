// Import necessary crates and modules
use crate::locator::value_as_key;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of a Canvas user as it appears inside an assessment snapshot.
///
/// The same structure describes both the student who owns a submission and the
/// assessor (instructor or peer) who filled in a rubric assessment.
///
/// Fields:
/// - `id`: The Canvas `_id` of the user, if the API returned one.
/// - `name`: The user's display name, if the API returned one.
///
/// Both fields are optional because users can be deleted or anonymised upstream,
/// and a missing identity must never cost the submission its row.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserInfo {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl UserInfo {
    /// Builds a `UserInfo` from a GraphQL `user`/`assessor` object.
    ///
    /// Returns `None` when the value is null or not an object.
    pub(crate) fn from_json(j: &Value) -> Option<UserInfo> {
        if !j.is_object() {
            return None;
        }
        Some(UserInfo {
            id: value_as_key(&j["_id"]),
            name: j["name"].as_str().map(String::from),
        })
    }
}
