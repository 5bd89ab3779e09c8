use crate::config::FieldKeys;
use crate::outbox::{ChangePayload, NormalChange};
use crate::remote::{CalendarDate, CustomField, RecordEvent};

/// Builds the deep link back to a contact in the local app.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeepLink {
    base: String,
}

impl DeepLink {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// `base?cid=<id>`, or `base&cid=<id>` when the base already has a query.
    pub fn for_local_id(&self, local_id: &str) -> Option<String> {
        let local_id = local_id.trim();
        if local_id.is_empty() {
            return None;
        }
        let sep = if self.base.contains('?') { '&' } else { '?' };
        Some(format!("{}{}cid={}", self.base, sep, percent_encode(local_id)))
    }
}

/// Percent-encode everything but the URI-component unreserved set.
fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn fmt_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Merges a queued change into the remote record's current custom fields and
/// events, leaving every entry it does not manage untouched.
#[derive(Clone, Debug)]
pub struct PayloadMerger {
    keys: FieldKeys,
    link: Option<DeepLink>,
}

impl PayloadMerger {
    pub fn new(keys: FieldKeys, link_base_url: Option<&str>) -> Self {
        Self {
            keys,
            link: link_base_url
                .map(str::trim)
                .filter(|base| !base.is_empty())
                .map(DeepLink::new),
        }
    }

    pub fn keys(&self) -> &FieldKeys {
        &self.keys
    }

    /// `conf | emo | ene | est | rep | total | cadence`, blanks for missing.
    pub fn packed_value(&self, change: &NormalChange) -> String {
        [
            fmt_number(change.scores.conf),
            fmt_number(change.scores.emo),
            fmt_number(change.scores.ene),
            fmt_number(change.scores.est),
            fmt_number(change.scores.rep),
            fmt_number(change.total),
            change.cadence.code().to_string(),
        ]
        .join(" | ")
    }

    /// New custom-field list for `payload`.
    ///
    /// Normal changes replace the legacy, packed and link entries with a fresh
    /// packed value and link. Link-only changes keep the packed entry and
    /// only refresh the link.
    pub fn merge_custom_fields(
        &self,
        existing: &[CustomField],
        payload: &ChangePayload,
    ) -> Vec<CustomField> {
        let keys = &self.keys;
        let mut merged: Vec<CustomField> = existing
            .iter()
            .filter(|field| {
                let key = field.key.as_str();
                let managed = key.starts_with(keys.legacy_prefix.as_str())
                    || key == keys.legacy_packed_key
                    || key == keys.link_key;
                match payload {
                    ChangePayload::Normal(_) => !(managed || key == keys.packed_key),
                    ChangePayload::LinkOnly(_) => !managed,
                }
            })
            .cloned()
            .collect();

        if let ChangePayload::Normal(change) = payload {
            merged.push(CustomField::new(
                keys.packed_key.clone(),
                self.packed_value(change),
            ));
        }
        if let Some(link) = self
            .link
            .as_ref()
            .and_then(|link| link.for_local_id(payload.local_id()))
        {
            merged.push(CustomField::new(keys.link_key.clone(), link));
        }
        merged
    }

    /// Replace every next-contact event with at most one for the change's
    /// date.
    pub fn merge_events(&self, existing: &[RecordEvent], change: &NormalChange) -> Vec<RecordEvent> {
        let kind = self.keys.next_contact_event.as_str();
        let mut merged: Vec<RecordEvent> = existing
            .iter()
            .filter(|event| event.kind.trim() != kind)
            .cloned()
            .collect();

        if let Some(date) = change.next_contact {
            merged.push(RecordEvent {
                kind: kind.to_string(),
                formatted_kind: kind.to_string(),
                date: Some(CalendarDate::from(date)),
                primary: true,
            });
        }
        merged
    }
}
