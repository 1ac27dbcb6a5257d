use std::collections::HashSet;
use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Output columns, in sheet order.
pub const OUTPUT_COLUMNS: [&str; 3] = ["DeviceId", "ComputerName", "USBDevice"];

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One element of the device inventory array.
///
/// Only the three fields the reconciler cares about are kept; any other
/// keys in the source object are skipped during decoding. A field that is
/// missing and a field that is `null` both decode to `None`. A key repeated
/// within one object keeps its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceRecord {
    pub device_id: Option<Value>,
    pub computer_name: Option<Value>,
    pub usb_device: Option<Value>,
}

impl DeviceRecord {
    /// Comparison key for `DeviceId`, or `None` when the record has no usable id.
    ///
    /// Empty values carry no identity: `null`, `""`, numeric zero, `false`,
    /// `[]` and `{}` all yield `None`. Booleans otherwise print as `True`.
    pub fn device_key(&self) -> Option<String> {
        match self.device_id.as_ref()? {
            Value::Null | Value::Bool(false) => None,
            Value::Bool(true) => Some("True".to_string()),
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Number(n) => Some(n.to_string()),
            Value::Array(a) if a.is_empty() => None,
            Value::Object(o) if o.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for DeviceRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(field_identifier)]
        enum Field {
            DeviceId,
            ComputerName,
            #[serde(rename = "USBDevice")]
            UsbDevice,
            #[serde(other)]
            Other,
        }

        struct DeviceRecordVisitor;

        impl<'de> Visitor<'de> for DeviceRecordVisitor {
            type Value = DeviceRecord;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a device object")
            }

            fn visit_map<V>(self, mut map: V) -> Result<DeviceRecord, V::Error>
            where
                V: MapAccess<'de>,
            {
                let mut record = DeviceRecord::default();
                while let Some(key) = map.next_key()? {
                    match key {
                        Field::DeviceId => record.device_id = map.next_value()?,
                        Field::ComputerName => record.computer_name = map.next_value()?,
                        Field::UsbDevice => record.usb_device = map.next_value()?,
                        Field::Other => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(record)
            }
        }

        const FIELDS: &[&str] = &["DeviceId", "ComputerName", "USBDevice"];
        deserializer.deserialize_struct("DeviceRecord", FIELDS, DeviceRecordVisitor)
    }
}

/// Serial numbers known to the reference table.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIdSet {
    ids: HashSet<String>,
}

impl ReferenceIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ReferenceIdSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self { ids: iter.into_iter().map(Into::into).collect() }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Projection of a [`DeviceRecord`] whose id is absent from the reference set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedRecord {
    #[serde(rename = "DeviceId")]
    pub device_id: Option<Value>,
    #[serde(rename = "ComputerName")]
    pub computer_name: Option<Value>,
    #[serde(rename = "USBDevice")]
    pub usb_device: Option<Value>,
}

impl UnmatchedRecord {
    /// Cell values in [`OUTPUT_COLUMNS`] order.
    pub fn cells(&self) -> [Option<&Value>; 3] {
        [
            self.device_id.as_ref(),
            self.computer_name.as_ref(),
            self.usb_device.as_ref(),
        ]
    }
}

impl From<DeviceRecord> for UnmatchedRecord {
    fn from(record: DeviceRecord) -> Self {
        Self {
            device_id: record.device_id,
            computer_name: record.computer_name,
            usb_device: record.usb_device,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Per-run counters. `matched + skipped_without_id + unmatched == total_records`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_records: usize,
    pub matched: usize,
    pub skipped_without_id: usize,
    pub unmatched: usize,
}

impl ReconSummary {
    pub fn is_balanced(&self) -> bool {
        self.matched + self.skipped_without_id + self.unmatched == self.total_records
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub unmatched: Vec<UnmatchedRecord>,
    pub summary: ReconSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
}

impl ReconMeta {
    pub fn now() -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> DeviceRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn extra_fields_are_ignored() {
        let r = record(json!({
            "DeviceId": "A1",
            "ComputerName": "PC1",
            "USBDevice": "USB-X",
            "Vendor": "Acme",
            "Ports": [1, 2]
        }));
        assert_eq!(r.device_key().as_deref(), Some("A1"));
        assert_eq!(r.computer_name, Some(json!("PC1")));
    }

    #[test]
    fn missing_null_and_empty_ids_have_no_key() {
        assert_eq!(record(json!({"ComputerName": "PC3"})).device_key(), None);
        assert_eq!(record(json!({"DeviceId": null})).device_key(), None);
        assert_eq!(record(json!({"DeviceId": ""})).device_key(), None);
    }

    #[test]
    fn non_string_ids_are_stringified() {
        assert_eq!(record(json!({"DeviceId": 12345})).device_key().as_deref(), Some("12345"));
        assert_eq!(record(json!({"DeviceId": 1.5})).device_key().as_deref(), Some("1.5"));
        assert_eq!(record(json!({"DeviceId": -7})).device_key().as_deref(), Some("-7"));
        assert_eq!(record(json!({"DeviceId": true})).device_key().as_deref(), Some("True"));
        assert_eq!(record(json!({"DeviceId": ["a"]})).device_key().as_deref(), Some(r#"["a"]"#));
        assert_eq!(record(json!({"DeviceId": {"k": 1}})).device_key().as_deref(), Some(r#"{"k":1}"#));
    }

    #[test]
    fn empty_values_have_no_key() {
        for id in [json!(0), json!(0.0), json!(-0.0), json!(false), json!([]), json!({})] {
            assert_eq!(record(json!({"DeviceId": id.clone()})).device_key(), None, "{id}");
        }
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let r: DeviceRecord = serde_json::from_str(
            r#"{"DeviceId":"A1","DeviceId":"A2","ComputerName":"PC","ComputerName":null}"#,
        )
        .unwrap();
        assert_eq!(r.device_key().as_deref(), Some("A2"));
        assert_eq!(r.computer_name, None);
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(serde_json::from_str::<DeviceRecord>("42").is_err());
        assert!(serde_json::from_str::<DeviceRecord>(r#""A1""#).is_err());
    }

    #[test]
    fn whitespace_id_is_kept_verbatim() {
        assert_eq!(record(json!({"DeviceId": " "})).device_key().as_deref(), Some(" "));
    }

    #[test]
    fn reference_set_collapses_duplicates() {
        let set: ReferenceIdSet = ["A1", "A1", "B2"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains("A1"));
        assert!(!set.contains("C3"));
    }

    #[test]
    fn unmatched_serializes_with_source_field_names() {
        let u = UnmatchedRecord::from(record(json!({"DeviceId": "A2", "USBDevice": "USB-Y"})));
        let v = serde_json::to_value(&u).unwrap();
        assert_eq!(v, json!({"DeviceId": "A2", "ComputerName": null, "USBDevice": "USB-Y"}));
    }
}
