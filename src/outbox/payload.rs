//! Queued change payloads.
//!
//! In memory a change is a [`ChangePayload`] tagged union; on disk it is the
//! JSON [`PayloadEnvelope`]:
//!
//! ```json
//! { "localId": "c-1", "remoteId": "people/c1", "displayName": "Ada",
//!   "dims": { "conf": 1.5, "emo": 2, "ene": 1, "est": 0, "rep": 1 },
//!   "cadence": "S", "total": 10, "icon": "🏗️",
//!   "nextContactDate": "2026-05-11", "mode": "" }
//! ```
//!
//! `mode` is `""` for a normal change and `"linkOnly"` for a link backfill.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::{Cadence, Scores};

const MODE_NORMAL: &str = "";
const MODE_LINK_ONLY: &str = "linkOnly";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Full local-derived field set for one contact.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalChange {
    pub local_id: String,
    pub remote_id: String,
    pub display_name: String,
    pub scores: Scores,
    pub cadence: Cadence,
    pub total: Option<f64>,
    pub icon: Option<String>,
    pub next_contact: Option<NaiveDate>,
}

/// Only ensures the deep-link field exists on the remote record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkOnlyChange {
    pub local_id: String,
    pub remote_id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChangePayload {
    Normal(NormalChange),
    LinkOnly(LinkOnlyChange),
}

impl ChangePayload {
    /// Parse a serialized envelope and check its fields.
    pub fn decode(raw: &str) -> Result<Self, PayloadError> {
        Self::try_from(PayloadEnvelope::parse(raw)?)
    }

    /// Serialize to the envelope JSON stored in the outbox.
    pub fn encode(&self) -> Result<String, PayloadError> {
        serde_json::to_string(&PayloadEnvelope::from(self))
            .map_err(|e| PayloadError::Malformed(e.to_string()))
    }

    pub fn local_id(&self) -> &str {
        match self {
            ChangePayload::Normal(change) => &change.local_id,
            ChangePayload::LinkOnly(change) => &change.local_id,
        }
    }

    pub fn is_link_only(&self) -> bool {
        matches!(self, ChangePayload::LinkOnly(_))
    }
}

/// Score dimensions as they appear in the envelope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeDims {
    #[serde(default)]
    pub conf: Option<f64>,
    #[serde(default)]
    pub emo: Option<f64>,
    #[serde(default)]
    pub ene: Option<f64>,
    #[serde(default)]
    pub est: Option<f64>,
    #[serde(default)]
    pub rep: Option<f64>,
}

/// Wire form of a queued change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadEnvelope {
    pub local_id: String,
    #[serde(default)]
    pub remote_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub dims: EnvelopeDims,
    #[serde(default)]
    pub cadence: String,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub next_contact_date: String,
    #[serde(default)]
    pub mode: String,
}

impl PayloadEnvelope {
    /// Parse the JSON shape and `mode` only; field values are checked by the
    /// conversion into [`ChangePayload`].
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        let envelope: PayloadEnvelope =
            serde_json::from_str(raw).map_err(|e| PayloadError::Malformed(e.to_string()))?;
        match envelope.mode.trim() {
            MODE_NORMAL | MODE_LINK_ONLY => Ok(envelope),
            other => Err(PayloadError::UnknownMode(other.to_string())),
        }
    }

    pub fn is_link_only(&self) -> bool {
        self.mode.trim() == MODE_LINK_ONLY
    }
}

impl From<&ChangePayload> for PayloadEnvelope {
    fn from(payload: &ChangePayload) -> Self {
        match payload {
            ChangePayload::Normal(change) => PayloadEnvelope {
                local_id: change.local_id.clone(),
                remote_id: change.remote_id.clone(),
                display_name: change.display_name.clone(),
                dims: EnvelopeDims {
                    conf: change.scores.conf,
                    emo: change.scores.emo,
                    ene: change.scores.ene,
                    est: change.scores.est,
                    rep: change.scores.rep,
                },
                cadence: change.cadence.code().to_string(),
                total: change.total,
                icon: change.icon.clone().unwrap_or_default(),
                next_contact_date: change
                    .next_contact
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
                mode: MODE_NORMAL.to_string(),
            },
            ChangePayload::LinkOnly(change) => PayloadEnvelope {
                local_id: change.local_id.clone(),
                remote_id: change.remote_id.clone(),
                mode: MODE_LINK_ONLY.to_string(),
                ..Default::default()
            },
        }
    }
}

impl TryFrom<PayloadEnvelope> for ChangePayload {
    type Error = PayloadError;

    fn try_from(envelope: PayloadEnvelope) -> Result<Self, Self::Error> {
        let local_id = envelope.local_id.trim().to_string();
        if local_id.is_empty() {
            return Err(PayloadError::Invalid("empty localId".into()));
        }
        let remote_id = envelope.remote_id.trim().to_string();

        match envelope.mode.trim() {
            MODE_LINK_ONLY => Ok(ChangePayload::LinkOnly(LinkOnlyChange {
                local_id,
                remote_id,
            })),
            MODE_NORMAL => {
                let cadence = Cadence::from_code(&envelope.cadence).ok_or_else(|| {
                    PayloadError::Invalid(format!("unknown cadence {:?}", envelope.cadence))
                })?;
                let next_contact = match envelope.next_contact_date.trim() {
                    "" => None,
                    raw => Some(NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                        PayloadError::Invalid(format!("bad nextContactDate {:?}", raw))
                    })?),
                };
                let icon = match envelope.icon.trim() {
                    "" => None,
                    icon => Some(icon.to_string()),
                };
                Ok(ChangePayload::Normal(NormalChange {
                    local_id,
                    remote_id,
                    display_name: envelope.display_name.trim().to_string(),
                    scores: Scores {
                        conf: envelope.dims.conf,
                        emo: envelope.dims.emo,
                        ene: envelope.dims.ene,
                        est: envelope.dims.est,
                        rep: envelope.dims.rep,
                    },
                    cadence,
                    total: envelope.total,
                    icon,
                    next_contact,
                }))
            }
            other => Err(PayloadError::UnknownMode(other.to_string())),
        }
    }
}

/// Why a stored payload could not be turned into a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Not valid envelope JSON.
    Malformed(String),
    /// `mode` is neither `""` nor `"linkOnly"`.
    UnknownMode(String),
    /// Structurally valid JSON with unusable values.
    Invalid(String),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Malformed(msg) => write!(f, "malformed payload: {}", msg),
            PayloadError::UnknownMode(mode) => write!(f, "unknown payload mode: {}", mode),
            PayloadError::Invalid(msg) => write!(f, "invalid payload: {}", msg),
        }
    }
}

impl std::error::Error for PayloadError {}
