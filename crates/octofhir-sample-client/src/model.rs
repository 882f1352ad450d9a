//! The slice of FHIR `Bundle` and `Patient` needed to present search results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SampleError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    pub fn len(&self) -> usize {
        self.entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(default)]
    pub full_url: Option<String>,
    #[serde(default)]
    pub resource: Option<EntryResource>,
}

impl BundleEntry {
    /// The entry's resource as a `Patient`, or `InvalidArgument` when it is
    /// missing or of another kind.
    pub fn expect_patient(&self) -> Result<&Patient> {
        match &self.resource {
            Some(EntryResource::Patient(patient)) => Ok(patient),
            Some(EntryResource::Other { resource_type, .. }) => Err(
                SampleError::invalid_argument(format!(
                    "Invalid entry or resource type: expected Patient, found {resource_type}"
                )),
            ),
            None => Err(SampleError::invalid_argument(
                "Invalid entry or resource type: entry has no resource",
            )),
        }
    }
}

/// A bundle entry payload, tagged by its `resourceType`.
#[derive(Debug, Clone)]
pub enum EntryResource {
    Patient(Patient),
    Other { resource_type: String, raw: Value },
}

impl EntryResource {
    pub fn resource_type(&self) -> &str {
        match self {
            Self::Patient(_) => "Patient",
            Self::Other { resource_type, .. } => resource_type,
        }
    }
}

impl TryFrom<Value> for EntryResource {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        let resource_type = value
            .get("resourceType")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        if resource_type == "Patient" {
            Ok(Self::Patient(serde_json::from_value(value)?))
        } else {
            Ok(Self::Other {
                resource_type,
                raw: value,
            })
        }
    }
}

impl<'de> Deserialize<'de> for EntryResource {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Vec<HumanName>,
    #[serde(default)]
    pub birth_date: Option<String>,
}

impl Patient {
    /// First given name of the first name repetition, empty if absent.
    pub fn first_name(&self) -> &str {
        self.name
            .first()
            .and_then(|n| n.given.first())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Family name of the first name repetition, empty if absent.
    pub fn last_name(&self) -> &str {
        self.name
            .first()
            .and_then(|n| n.family.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HumanName {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub given: Vec<String>,
}

/// Demographics extracted from one patient entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRow {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<String>,
}

impl From<&Patient> for PatientRow {
    fn from(patient: &Patient) -> Self {
        Self {
            first_name: patient.first_name().to_string(),
            last_name: patient.last_name().to_string(),
            birth_date: patient.birth_date.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_bundle() -> Value {
        json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 2,
            "entry": [
                {
                    "fullUrl": "http://hapi.fhir.org/baseR4/Patient/1",
                    "resource": {
                        "resourceType": "Patient",
                        "id": "1",
                        "name": [{ "family": "Smith", "given": ["John", "Quincy"] }],
                        "birthDate": "1970-01-01"
                    }
                },
                {
                    "resource": {
                        "resourceType": "OperationOutcome",
                        "issue": []
                    }
                }
            ]
        })
    }

    #[test]
    fn test_deserialize_bundle_entries() {
        let bundle: Bundle = serde_json::from_value(sample_bundle()).unwrap();
        assert_eq!(bundle.resource_type, "Bundle");
        assert_eq!(bundle.total, Some(2));
        assert_eq!(bundle.len(), 2);

        let patient = bundle.entry[0].expect_patient().unwrap();
        assert_eq!(patient.id.as_deref(), Some("1"));
        assert_eq!(patient.first_name(), "John");
        assert_eq!(patient.last_name(), "Smith");
        assert_eq!(patient.birth_date.as_deref(), Some("1970-01-01"));

        let other = bundle.entry[1].resource.as_ref().unwrap();
        assert_eq!(other.resource_type(), "OperationOutcome");
    }

    #[test]
    fn test_expect_patient_rejects_other_resources() {
        let bundle: Bundle = serde_json::from_value(sample_bundle()).unwrap();
        let err = bundle.entry[1].expect_patient().unwrap_err();
        assert!(matches!(err, SampleError::InvalidArgument(_)));
        assert!(err.to_string().contains("OperationOutcome"));
    }

    #[test]
    fn test_expect_patient_rejects_empty_entry() {
        let entry = BundleEntry::default();
        assert!(matches!(
            entry.expect_patient(),
            Err(SampleError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_names_yield_empty_strings() {
        let patient: Patient =
            serde_json::from_value(json!({ "resourceType": "Patient", "id": "x" })).unwrap();
        assert_eq!(patient.first_name(), "");
        assert_eq!(patient.last_name(), "");
        assert_eq!(PatientRow::from(&patient).birth_date, None);
    }

    #[test]
    fn test_empty_bundle_without_entries() {
        let bundle: Bundle =
            serde_json::from_value(json!({ "resourceType": "Bundle", "total": 0 })).unwrap();
        assert!(bundle.is_empty());
    }
}
