//! BSON mapping for the device list documents.
//!
//! Timestamps are stored as BSON datetimes (millisecond precision) so the
//! collection is queryable by date from the API service.

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};

use ambulance_init_core::{DeviceEntry, DeviceLog};

use crate::StorageError;

pub fn device_document(device: &DeviceEntry) -> Document {
    let log_list: Vec<Bson> = device
        .log_list
        .iter()
        .map(|log| Bson::Document(log_document(log)))
        .collect();

    doc! {
        "id": device.id.as_str(),
        "name": device.name.as_str(),
        "deviceId": device.device_id.as_str(),
        "warrantyUntil": to_bson_datetime(device.warranty_until),
        "price": device.price,
        "logList": log_list,
    }
}

pub fn log_document(log: &DeviceLog) -> Document {
    doc! {
        "id": log.id,
        "text": log.text.as_str(),
        "deviceId": log.device_id.as_str(),
        "createdAt": to_bson_datetime(log.created_at),
    }
}

/// Reads a stored device back into the domain type.
pub fn device_from_document(document: &Document) -> Result<DeviceEntry, StorageError> {
    let log_list = document
        .get_array("logList")?
        .iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Bson::Document(log) => log_from_document(log),
            _ => Err(StorageError::MalformedLogEntry(index)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DeviceEntry {
        id: document.get_str("id")?.to_string(),
        name: document.get_str("name")?.to_string(),
        device_id: document.get_str("deviceId")?.to_string(),
        warranty_until: from_bson_datetime(document.get_datetime("warrantyUntil")?)?,
        price: read_number(document, "price")?,
        log_list,
    })
}

fn log_from_document(document: &Document) -> Result<DeviceLog, StorageError> {
    Ok(DeviceLog {
        id: read_integer(document, "id")?,
        text: document.get_str("text")?.to_string(),
        device_id: document.get_str("deviceId")?.to_string(),
        created_at: from_bson_datetime(document.get_datetime("createdAt")?)?,
    })
}

fn to_bson_datetime(value: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(value.timestamp_millis())
}

fn from_bson_datetime(value: &BsonDateTime) -> Result<DateTime<Utc>, StorageError> {
    let millis = value.timestamp_millis();
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or(StorageError::Timestamp(millis))
}

// Documents written by the mongo shell store small numbers as doubles.
fn read_number(document: &Document, key: &str) -> Result<f64, StorageError> {
    match document.get(key) {
        Some(Bson::Int32(value)) => Ok(f64::from(*value)),
        Some(Bson::Int64(value)) => Ok(*value as f64),
        _ => Ok(document.get_f64(key)?),
    }
}

fn read_integer(document: &Document, key: &str) -> Result<i64, StorageError> {
    match document.get(key) {
        Some(Bson::Int32(value)) => Ok(i64::from(*value)),
        Some(Bson::Double(value)) if value.fract() == 0.0 => Ok(*value as i64),
        _ => Ok(document.get_i64(key)?),
    }
}
