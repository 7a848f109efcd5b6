use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Medical device tracked in the ambulance device list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEntry {
    pub id: String,
    pub name: String,
    pub device_id: String,
    pub warranty_until: DateTime<Utc>,
    pub price: f64,
    #[serde(default)]
    pub log_list: Vec<DeviceLog>,
}

/// Single maintenance log line attached to a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLog {
    pub id: i64,
    pub text: String,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
}

/// Field the seeded collection is indexed on.
pub const INDEXED_FIELD: &str = "id";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_payload() {
        let entry: DeviceEntry = serde_json::from_value(json!({
            "id": "d-1",
            "name": "Defibrillator",
            "deviceId": "3-def",
            "warrantyUntil": "2030-01-01T00:00:00Z",
            "price": 12.5,
            "logList": [{
                "id": 7,
                "text": "checked",
                "deviceId": "3-def",
                "createdAt": "2024-05-01T08:30:00Z"
            }]
        }))
        .expect("payload should decode");

        assert_eq!(entry.device_id, "3-def");
        assert_eq!(
            entry.warranty_until,
            Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(entry.log_list.len(), 1);
        assert_eq!(entry.log_list[0].id, 7);
    }

    #[test]
    fn missing_log_list_defaults_to_empty() {
        let entry: DeviceEntry = serde_json::from_value(json!({
            "id": "d-2",
            "name": "Monitor",
            "deviceId": "4-mon",
            "warrantyUntil": "2031-06-01T00:00:00Z",
            "price": 99.0
        }))
        .expect("payload should decode");

        assert!(entry.log_list.is_empty());
    }
}
