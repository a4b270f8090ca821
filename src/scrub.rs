use serde_json::Value;

pub const REDACTED: &str = "********";

pub const DEFAULT_SCRUB_FIELDS: &[&str] = &[
    "accessToken",
    "refreshToken",
    "altAccessToken",
    "altRefreshToken",
    "salesforceOrgs",
];

/// Redacts every object member named in `fields`, at any depth.
///
/// Returns the number of redacted members.
pub fn scrub<S: AsRef<str>>(value: &mut Value, fields: &[S]) -> usize {
    match value {
        Value::Object(map) => {
            let mut redacted = 0;
            for (key, member) in map.iter_mut() {
                if fields.iter().any(|f| f.as_ref() == key.as_str()) {
                    *member = Value::String(REDACTED.to_owned());
                    redacted += 1;
                } else {
                    redacted += scrub(member, fields);
                }
            }
            redacted
        }
        Value::Array(items) => items.iter_mut().map(|item| scrub(item, fields)).sum(),
        _ => 0,
    }
}
