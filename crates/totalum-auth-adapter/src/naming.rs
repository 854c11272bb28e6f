// Field-name translation between the auth contract and the Totalum store.
//
// The auth layer uses camelCase (`emailVerified`), Totalum tables use
// snake_case (`email_verified`). Totalum's own auto fields keep their names
// in both directions, and the contract identity `id` maps to `_id`.
//
// Nothing here fails: input that does not fit the expected shape passes
// through unchanged.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use totalum_auth_core::db::value::{format_timestamp, Record, Value};

/// Identity field name on the contract side.
pub const CONTRACT_ID_FIELD: &str = "id";

/// Identity field name on the remote side.
pub const REMOTE_ID_FIELD: &str = "_id";

/// Fields Totalum generates itself. Never case-translated.
pub const RESERVED_FIELDS: [&str; 5] = ["_id", "id", "createdAt", "updatedAt", "createdBy"];

/// Convert a camelCase identifier to snake_case.
///
/// Every ASCII upper-case letter gets a `_` in front, the result is
/// lower-cased and a single leading `_` is dropped.
///
/// Examples: "createdAt" -> "created_at", "userID" -> "user_i_d"
pub fn to_remote_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for ch in s.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(ch);
    }
    let lowered = out.to_lowercase();
    match lowered.strip_prefix('_') {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}

/// Convert a snake_case identifier to camelCase.
///
/// Every `_` followed by an ASCII lower-case letter collapses into the
/// upper-cased letter. Other underscores are kept.
///
/// Examples: "created_at" -> "createdAt", "user_id" -> "userId"
pub fn to_contract_case(s: &str) -> String {
    static RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_([a-z])").unwrap());
    RE.replace_all(s, |caps: &regex::Captures| caps[1].to_ascii_uppercase())
        .into_owned()
}

/// Whether `field` is one of Totalum's auto fields.
pub fn is_reserved_field(field: &str) -> bool {
    RESERVED_FIELDS.contains(&field)
}

/// Table name for a contract model. No reserved-field exemption applies.
pub fn model_to_table_name(model: &str) -> String {
    to_remote_case(model)
}

/// Remote name of a contract field used in filters and sorts.
pub fn field_to_remote(field: &str) -> String {
    if field == CONTRACT_ID_FIELD {
        REMOTE_ID_FIELD.to_string()
    } else if is_reserved_field(field) {
        field.to_string()
    } else {
        to_remote_case(field)
    }
}

/// Whether `s` starts like an ISO-8601 timestamp (`YYYY-MM-DDTHH:MM:SS`).
pub fn is_iso_date(s: &str) -> bool {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").unwrap());
    RE.is_match(s)
}

/// Parse an ISO-8601 timestamp. Strings without an offset are read as UTC.
pub fn parse_iso_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ─── Records ─────────────────────────────────────────────────────

/// Translate a contract record into remote casing.
///
/// `id` becomes `_id`, reserved fields are copied untouched (dates
/// included), other keys go through [`to_remote_case`]. Nested objects and
/// arrays are translated recursively; dates outside reserved keys are
/// written as ISO-8601 text.
pub fn record_to_remote(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| {
            if key == CONTRACT_ID_FIELD {
                (REMOTE_ID_FIELD.to_string(), value.clone())
            } else if is_reserved_field(key) {
                (key.clone(), value.clone())
            } else {
                (to_remote_case(key), value_to_remote(value))
            }
        })
        .collect()
}

fn value_to_remote(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(record_to_remote(map)),
        Value::Array(items) => Value::Array(items.iter().map(value_to_remote).collect()),
        Value::Date(d) => Value::String(format_timestamp(d)),
        other => other.clone(),
    }
}

/// Translate a remote record back into contract casing.
///
/// `_id` becomes `id`, other reserved fields are copied untouched, the rest
/// go through [`to_contract_case`]. String values that look like ISO-8601
/// timestamps become dates. Nested objects are translated recursively.
pub fn record_to_contract(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| {
            if key == REMOTE_ID_FIELD {
                (CONTRACT_ID_FIELD.to_string(), value.clone())
            } else if is_reserved_field(key) {
                (key.clone(), value.clone())
            } else {
                (to_contract_case(key), value_to_contract(value))
            }
        })
        .collect()
}

fn value_to_contract(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(record_to_contract(map)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::Object(map) => Value::Object(record_to_contract(map)),
                    other => other.clone(),
                })
                .collect(),
        ),
        Value::String(s) if is_iso_date(s) => {
            parse_iso_date(s).map_or_else(|| value.clone(), Value::Date)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use totalum_auth_core::db::value::record_from_json;

    #[test]
    fn test_to_remote_case() {
        assert_eq!(to_remote_case("createdAt"), "created_at");
        assert_eq!(to_remote_case("userId"), "user_id");
        assert_eq!(to_remote_case("emailVerified"), "email_verified");
        assert_eq!(to_remote_case("id"), "id");
        assert_eq!(to_remote_case("twoFactorEnabled"), "two_factor_enabled");
        assert_eq!(to_remote_case("userID"), "user_i_d");
        assert_eq!(to_remote_case("Session"), "session");
        assert_eq!(to_remote_case(""), "");
    }

    #[test]
    fn test_to_remote_case_strips_one_leading_separator() {
        assert_eq!(to_remote_case("_internal"), "internal");
        assert_eq!(to_remote_case("_Internal"), "_internal");
    }

    #[test]
    fn test_to_contract_case() {
        assert_eq!(to_contract_case("created_at"), "createdAt");
        assert_eq!(to_contract_case("user_id"), "userId");
        assert_eq!(to_contract_case("email_verified"), "emailVerified");
        assert_eq!(to_contract_case("id"), "id");
        assert_eq!(to_contract_case("a_1"), "a_1");
        assert_eq!(to_contract_case("trailing_"), "trailing_");
    }

    #[test]
    fn test_round_trip() {
        for name in ["emailVerified", "userId", "expiresAt", "ipAddress", "name", "twoFactorSecret"] {
            assert_eq!(to_contract_case(&to_remote_case(name)), name);
        }
    }

    #[test]
    fn test_reserved_fields() {
        for name in RESERVED_FIELDS {
            assert!(is_reserved_field(name));
        }
        assert!(!is_reserved_field("email"));
        assert!(!is_reserved_field("created_at"));
    }

    #[test]
    fn test_model_to_table_name() {
        assert_eq!(model_to_table_name("user"), "user");
        assert_eq!(model_to_table_name("twoFactor"), "two_factor");
        assert_eq!(model_to_table_name("rateLimit"), "rate_limit");
    }

    #[test]
    fn test_field_to_remote() {
        assert_eq!(field_to_remote("id"), "_id");
        assert_eq!(field_to_remote("createdAt"), "createdAt");
        assert_eq!(field_to_remote("userId"), "user_id");
    }

    #[test]
    fn test_record_to_remote_keeps_reserved_fields_raw() {
        let d = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut record = Record::new();
        record.insert("_id".into(), Value::from("a"));
        record.insert("createdAt".into(), Value::Date(d));

        let out = record_to_remote(&record);
        assert_eq!(out, record);
    }

    #[test]
    fn test_record_to_remote_translates_keys_and_dates() {
        let d = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut record = record_from_json(serde_json::json!({"fooBar": "x", "id": "u1"}));
        record.insert("expiresAt".into(), Value::Date(d));

        let out = record_to_remote(&record);
        assert_eq!(out["foo_bar"], Value::from("x"));
        assert_eq!(out["_id"], Value::from("u1"));
        assert_eq!(out["expires_at"], Value::from("2025-03-01T12:00:00.000Z"));
        assert!(!out.contains_key("id"));
    }

    #[test]
    fn test_record_to_remote_recurses() {
        let record = record_from_json(serde_json::json!({
            "metaData": {"lastLogin": 1, "tags": ["a"]},
            "linkedAccounts": [{"providerId": "google"}, "raw"]
        }));
        let out = record_to_remote(&record);
        assert_eq!(
            serde_json::Value::from(Value::Object(out)),
            serde_json::json!({
                "meta_data": {"last_login": 1, "tags": ["a"]},
                "linked_accounts": [{"provider_id": "google"}, "raw"]
            })
        );
    }

    #[test]
    fn test_record_to_contract() {
        let record = record_from_json(serde_json::json!({
            "_id": "x",
            "createdAt": "2025-01-01T00:00:00.000Z",
            "email_verified": true,
            "expires_at": "2025-02-01T10:30:00.000Z",
            "note": "2025 was a year"
        }));
        let out = record_to_contract(&record);

        assert_eq!(out["id"], Value::from("x"));
        assert!(!out.contains_key("_id"));
        // reserved: passed through untouched
        assert_eq!(out["createdAt"], Value::from("2025-01-01T00:00:00.000Z"));
        assert_eq!(out["emailVerified"], Value::from(true));
        assert_eq!(
            out["expiresAt"],
            Value::Date(Utc.with_ymd_and_hms(2025, 2, 1, 10, 30, 0).unwrap())
        );
        assert_eq!(out["note"], Value::from("2025 was a year"));
    }

    #[test]
    fn test_record_to_contract_nested() {
        let record = record_from_json(serde_json::json!({
            "profile_data": {"last_seen": "2025-01-01T00:00:00Z", "_id": "p1"},
            "items": [{"item_name": "a"}, "2025-01-01T00:00:00Z"]
        }));
        let out = record_to_contract(&record);
        let profile = out["profileData"].as_object().unwrap();
        assert!(profile["lastSeen"].as_date().is_some());
        assert_eq!(profile["id"], Value::from("p1"));

        let items = out["items"].as_array().unwrap();
        assert_eq!(items[0].get("itemName"), Some(&Value::from("a")));
        // scalars inside arrays are left alone
        assert_eq!(items[1], Value::from("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn test_identity_aliasing() {
        let out = record_to_remote(&record_from_json(serde_json::json!({"id": "x"})));
        assert_eq!(out, record_from_json(serde_json::json!({"_id": "x"})));
        let back = record_to_contract(&out);
        assert_eq!(back, record_from_json(serde_json::json!({"id": "x"})));
    }

    #[test]
    fn test_unparseable_date_like_string_passes_through() {
        let record = record_from_json(serde_json::json!({"code": "2025-99-99T99:99:99"}));
        let out = record_to_contract(&record);
        assert_eq!(out["code"], Value::from("2025-99-99T99:99:99"));
    }

    #[test]
    fn test_parse_iso_date_without_offset() {
        let d = parse_iso_date("2025-01-01T08:00:00").unwrap();
        assert_eq!(d, Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap());
        let d = parse_iso_date("2025-01-01T08:00:00.250").unwrap();
        assert_eq!(d.timestamp_subsec_millis(), 250);
    }
}
