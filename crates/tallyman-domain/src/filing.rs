//! Filing identity

use std::fmt;

/// Identity of one filing in the archive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilingRef {
    cik: String,
    accession_number: String,
}

impl FilingRef {
    /// Build a filing reference, validating both identifiers
    ///
    /// The CIK must be decimal digits (leading zeros allowed). The accession
    /// number must contain exactly 18 digits once hyphens are removed; it is
    /// stored in the dashed `##########-##-######` form.
    pub fn new(cik: &str, accession_number: &str) -> Result<Self, String> {
        let cik = cik.trim();
        if cik.is_empty() || !cik.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("Invalid CIK: {:?}", cik));
        }
        if cik.trim_start_matches('0').len() > 10 {
            return Err(format!("CIK exceeds 10 digits: {}", cik));
        }

        let compact: String = accession_number
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .collect();
        if compact.len() != 18 || !compact.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!(
                "Invalid accession number: {:?}",
                accession_number
            ));
        }
        let dashed = format!("{}-{}-{}", &compact[..10], &compact[10..12], &compact[12..]);

        Ok(Self {
            cik: cik.to_string(),
            accession_number: dashed,
        })
    }

    /// CIK as given
    pub fn cik(&self) -> &str {
        &self.cik
    }

    /// CIK without leading zeros (archive path form)
    pub fn cik_number(&self) -> &str {
        let trimmed = self.cik.trim_start_matches('0');
        if trimmed.is_empty() {
            "0"
        } else {
            trimmed
        }
    }

    /// CIK zero-padded to 10 digits (API form)
    pub fn cik_padded(&self) -> String {
        format!("{:0>10}", self.cik_number())
    }

    /// Accession number in dashed form
    pub fn accession_number(&self) -> &str {
        &self.accession_number
    }

    /// Accession number with hyphens removed
    pub fn accession_compact(&self) -> String {
        self.accession_number.replace('-', "")
    }
}

impl fmt::Display for FilingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CIK {} / {}", self.cik_number(), self.accession_number)
    }
}
