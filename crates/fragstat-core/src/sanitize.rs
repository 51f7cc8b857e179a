//! Repairs malformed numeric fields in upstream stats payloads.

use serde_json::{Map, Number, Value};

/// Per-mode numeric fields read by the transform step.
pub const NUMERIC_STAT_FIELDS: [&str; 15] = [
    "kills",
    "matches",
    "winRate",
    "kd",
    "killsPerMatch",
    "wins",
    "top3",
    "top5",
    "top6",
    "top10",
    "top12",
    "top25",
    "score",
    "scorePerMatch",
    "minutesPlayed",
];

/// Returns a copy of `payload` where every numeric stat field under
/// `data.stats.<platform>.<mode>` that is negative, null, absent or not a number is `0`.
///
/// Everything outside the stats tree is passed through untouched. The function is
/// idempotent.
pub fn sanitize(mut payload: Value) -> Value {
    let Some(platforms) = payload
        .get_mut("data")
        .and_then(|data| data.get_mut("stats"))
        .and_then(Value::as_object_mut)
    else {
        return payload;
    };

    for modes in platforms.values_mut() {
        let Some(modes) = modes.as_object_mut() else {
            continue;
        };
        for stats in modes.values_mut() {
            if let Some(stats) = stats.as_object_mut() {
                sanitize_mode(stats);
            }
        }
    }

    payload
}

fn sanitize_mode(stats: &mut Map<String, Value>) {
    for field in NUMERIC_STAT_FIELDS {
        let repaired = match stats.get(field) {
            Some(Value::Number(number)) => repair_number(number),
            _ => Some(Value::from(0)),
        };
        if let Some(repaired) = repaired {
            stats.insert(field.to_owned(), repaired);
        }
    }
}

// None means the number is already valid.
fn repair_number(number: &Number) -> Option<Value> {
    if number.is_u64() {
        return None;
    }
    if let Some(value) = number.as_i64() {
        return (value < 0).then(|| Value::from(0));
    }
    match number.as_f64() {
        Some(value) if value.is_finite() && value >= 0.0 => None,
        _ => Some(Value::from(0)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn payload(stats: Value) -> Value {
        json!({
            "status": 200,
            "data": {
                "account": { "id": "abc", "name": "player" },
                "stats": { "gamepad": { "solo": stats } }
            }
        })
    }

    #[test]
    fn negative_and_null_fields_become_zero() {
        let sanitized = sanitize(payload(json!({
            "kills": -5,
            "matches": null,
            "kd": -1.5,
            "winRate": 12.5,
            "lastModified": "2024-01-01T00:00:00Z"
        })));

        let solo = &sanitized["data"]["stats"]["gamepad"]["solo"];
        assert_eq!(solo["kills"], json!(0));
        assert_eq!(solo["matches"], json!(0));
        assert_eq!(solo["kd"], json!(0));
        assert_eq!(solo["winRate"], json!(12.5));
        assert_eq!(solo["lastModified"], json!("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn absent_and_non_numeric_fields_are_filled_with_zero() {
        let sanitized = sanitize(payload(json!({ "kills": "lots" })));

        let solo = &sanitized["data"]["stats"]["gamepad"]["solo"];
        assert_eq!(solo["kills"], json!(0));
        for field in NUMERIC_STAT_FIELDS {
            assert!(solo.get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn sanitizing_twice_equals_sanitizing_once() {
        let raw = payload(json!({
            "kills": -1,
            "matches": 40,
            "wins": null,
            "scorePerMatch": 211.7
        }));

        let once = sanitize(raw);
        let twice = sanitize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn payload_without_stats_tree_is_returned_unchanged() {
        let error = json!({ "status": 404, "error": "the requested account does not exist" });
        assert_eq!(sanitize(error.clone()), error);
    }

    #[test]
    fn valid_fields_are_left_alone() {
        let raw = payload(json!({ "kills": 100, "kd": 1.82, "top25": 0 }));
        let sanitized = sanitize(raw.clone());

        let before = &raw["data"]["stats"]["gamepad"]["solo"];
        let after = &sanitized["data"]["stats"]["gamepad"]["solo"];
        assert_eq!(before["kills"], after["kills"]);
        assert_eq!(before["kd"], after["kd"]);
        assert_eq!(before["top25"], after["top25"]);
    }
}
