use serde_json::Value;

/// Coerces a JSON scalar into the string form used for key comparison.
///
/// Strings are returned as-is, numbers use their JSON text (`10`, `2.5`) and
/// booleans become `true`/`false`. Null, arrays and objects have no key form.
pub(crate) fn value_as_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Finds the first record whose value at `key`, coerced to string, equals `target_value`.
///
/// Used to drill into a single assignment (or submission) of a course snapshot by id.
/// The scan follows the order of `records` and stops at the first match, so callers get
/// a reference into their own data rather than a copy.
///
/// Arguments:
/// - `records`: Loosely-typed records as returned by the Canvas API.
/// - `key`: Name of the field to compare.
/// - `target_value`: Value the field must equal after string coercion.
///
/// Returns:
/// - `Some(&Value)`: The first matching record.
/// - `None`: No record matches. This is a normal outcome (the item may have been deleted
///   upstream), not an error.
///
/// Example:
/// ```
/// use canvas_rubric_report::find_by_key;
/// use serde_json::json;
///
/// let assignments = vec![
///     json!({"_id": "10", "name": "Quiz"}),
///     json!({"_id": "20", "name": "Essay"}),
/// ];
/// let essay = find_by_key(&assignments, "_id", "20").unwrap();
/// assert_eq!(essay["name"], "Essay");
/// assert!(find_by_key(&assignments, "_id", "30").is_none());
/// ```
pub fn find_by_key<'a>(records: &'a [Value], key: &str, target_value: &str) -> Option<&'a Value> {
    records.iter().find(|record| {
        record
            .as_object()
            .and_then(|fields| fields.get(key))
            .and_then(value_as_key)
            .map_or(false, |value| value == target_value)
    })
}
