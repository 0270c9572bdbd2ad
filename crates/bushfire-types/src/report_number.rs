use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Human-readable report number: `BF <year> <district-code> <sequence>`.
///
/// Assigned once when the report is first persisted and never reused, with
/// one exception: a fork back into a district the report previously left may
/// reclaim the number of the placeholder record retired by the earlier fork.
///
/// Display: `"BF 2016 SWC 001"` (sequence zero-padded to 3).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportNumber {
    year: u16,
    district_code: String,
    sequence: u32,
}

impl ReportNumber {
    pub fn new(year: u16, district_code: impl Into<String>, sequence: u32) -> Self {
        Self {
            year,
            district_code: district_code.into(),
            sequence,
        }
    }

    /// Reporting year the number was minted in.
    pub fn year(&self) -> u16 {
        self.year
    }

    /// District prefix the number was minted under.
    pub fn district_code(&self) -> &str {
        &self.district_code
    }

    /// Per-district, per-year sequence (1-based).
    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for ReportNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BF {} {} {:03}",
            self.year, self.district_code, self.sequence
        )
    }
}

impl FromStr for ReportNumber {
    type Err = DomainError;

    /// Parse the display form back into its parts.
    ///
    /// Accepts exactly four whitespace-separated tokens starting with `BF`.
    /// The sequence may carry leading zeros; they are not significant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DomainError::MalformedReportNumber {
            input: s.to_string(),
        };

        let mut parts = s.split_whitespace();
        if parts.next() != Some("BF") {
            return Err(malformed());
        }
        let year = parts.next().ok_or_else(malformed)?;
        let district_code = parts.next().ok_or_else(malformed)?;
        let sequence = parts.next().ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        let year: u16 =
            year.parse()
                .map_err(|_| DomainError::NonNumericReportNumberField {
                    input: s.to_string(),
                    field: "year",
                })?;
        let sequence: u32 =
            sequence
                .parse()
                .map_err(|_| DomainError::NonNumericReportNumberField {
                    input: s.to_string(),
                    field: "sequence",
                })?;

        Ok(Self::new(year, district_code, sequence))
    }
}
