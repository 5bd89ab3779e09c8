use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Which source of a remote record a metadata entry describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    /// Direct user edits of the record itself.
    Contact,
    Profile,
    DomainProfile,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSource {
    pub kind: SourceKind,
    /// Last modification time of this source, as reported by the remote.
    pub update_time: String,
}

/// A free-form key/value pair on a remote record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub key: String,
    pub value: String,
}

impl CustomField {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Partial calendar date; birthdays may omit the year.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
}

impl CalendarDate {
    pub fn has_month_day(&self) -> bool {
        matches!((self.month, self.day), (Some(m), Some(d)) if m > 0 && d > 0)
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: Some(date.year()),
            month: Some(date.month()),
            day: Some(date.day()),
        }
    }
}

/// A dated, typed event on a remote record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub formatted_kind: String,
    #[serde(default)]
    pub date: Option<CalendarDate>,
    #[serde(default)]
    pub primary: bool,
}

/// Snapshot of a remote record, restricted to whatever fields were requested.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecord {
    pub remote_id: String,
    #[serde(default)]
    pub etag: String,
    #[serde(default)]
    pub sources: Vec<RecordSource>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(default)]
    pub events: Vec<RecordEvent>,
    #[serde(default)]
    pub birthdays: Vec<CalendarDate>,
    /// Remote group ids this record belongs to.
    #[serde(default)]
    pub memberships: Vec<String>,
}

impl RemoteRecord {
    pub fn new(remote_id: impl Into<String>) -> Self {
        Self {
            remote_id: remote_id.into(),
            ..Default::default()
        }
    }

    pub fn has_birthday_month_day(&self) -> bool {
        self.birthdays.iter().any(CalendarDate::has_month_day)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordField {
    Metadata,
    CustomFields,
    Events,
    Birthdays,
    Memberships,
}

impl RecordField {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordField::Metadata => "metadata",
            RecordField::CustomFields => "userDefined",
            RecordField::Events => "events",
            RecordField::Birthdays => "birthdays",
            RecordField::Memberships => "memberships",
        }
    }
}

/// Set of record fields a read returns or a write replaces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldMask(BTreeSet<RecordField>);

impl FieldMask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: RecordField) -> Self {
        self.0.insert(field);
        self
    }

    pub fn contains(&self, field: RecordField) -> bool {
        self.0.contains(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = RecordField> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<RecordField> for FieldMask {
    fn from_iter<I: IntoIterator<Item = RecordField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(RecordField::as_str).collect();
        f.write_str(&names.join(","))
    }
}
