use std::fmt;

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// How often a contact should be reached.
///
/// Stored and sent as its short code: `""`, `S`, `1M`, `3M`, `6M`, `A`, `C`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cadence {
    #[default]
    Unset,
    Weekly,
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
    /// Reach out on the birthday; no explicit next-contact date.
    Birthday,
}

impl Cadence {
    pub const ALL: [Cadence; 7] = [
        Cadence::Unset,
        Cadence::Weekly,
        Cadence::Monthly,
        Cadence::Quarterly,
        Cadence::Semiannual,
        Cadence::Annual,
        Cadence::Birthday,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Cadence::Unset => "",
            Cadence::Weekly => "S",
            Cadence::Monthly => "1M",
            Cadence::Quarterly => "3M",
            Cadence::Semiannual => "6M",
            Cadence::Annual => "A",
            Cadence::Birthday => "C",
        }
    }

    /// Parse a code or long name, case-insensitively. `R` is the retired code
    /// for weekly.
    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "" => Some(Cadence::Unset),
            "S" | "R" | "WEEKLY" => Some(Cadence::Weekly),
            "1M" | "MONTHLY" => Some(Cadence::Monthly),
            "3M" | "QUARTERLY" => Some(Cadence::Quarterly),
            "6M" | "SEMIANNUAL" => Some(Cadence::Semiannual),
            "A" | "ANNUAL" => Some(Cadence::Annual),
            "C" | "BIRTHDAY" => Some(Cadence::Birthday),
            _ => None,
        }
    }

    /// Suggested next-contact date counted from `today`.
    ///
    /// Month steps clamp to the end of shorter months (Jan 31 + 1M = Feb 28).
    pub fn propose_next_contact(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Cadence::Weekly => today.checked_add_signed(Duration::days(7)),
            Cadence::Monthly => today.checked_add_months(Months::new(1)),
            Cadence::Quarterly => today.checked_add_months(Months::new(3)),
            Cadence::Semiannual => today.checked_add_months(Months::new(6)),
            Cadence::Annual => today.checked_add_months(Months::new(12)),
            Cadence::Unset | Cadence::Birthday => None,
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<String> for Cadence {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Cadence::from_code(&raw).ok_or_else(|| format!("unknown cadence code {:?}", raw))
    }
}

impl From<Cadence> for String {
    fn from(cadence: Cadence) -> Self {
        cadence.code().to_string()
    }
}

/// Where a next-contact date stands relative to today and the cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextContactStatus {
    Missing,
    Past,
    /// Later than the cadence would propose today.
    TooFar,
    Ok,
}

impl NextContactStatus {
    pub fn of(next: Option<NaiveDate>, cadence: Cadence, today: NaiveDate) -> Self {
        let Some(next) = next else {
            return NextContactStatus::Missing;
        };
        if next < today {
            return NextContactStatus::Past;
        }
        match cadence.propose_next_contact(today) {
            Some(max) if next > max => NextContactStatus::TooFar,
            _ => NextContactStatus::Ok,
        }
    }
}
