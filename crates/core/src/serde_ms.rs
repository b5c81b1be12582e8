//! Serde helpers that store durations as whole milliseconds

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    (duration.as_millis() as u64).serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Timeout {
        #[serde(with = "crate::serde_ms")]
        after: Duration,
    }

    #[test]
    fn test_duration_as_millis() {
        let json = serde_json::to_string(&Timeout {
            after: Duration::from_millis(1_500),
        })
        .unwrap();
        assert_eq!(json, r#"{"after":1500}"#);

        let parsed: Timeout = serde_json::from_str(r#"{"after":250}"#).unwrap();
        assert_eq!(parsed.after, Duration::from_millis(250));
    }
}
