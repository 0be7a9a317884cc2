//! EDGAR archive repository
//!
//! Raw filing text comes from the archive path
//! `/Archives/edgar/data/{cik}/{accession-compact}/{accession}.txt`; the
//! parsed handle is built from the filer's company-facts JSON. Both go
//! through the governed [`ResilientClient`], and a non-success final status
//! is reported as an error rather than returned as a body.

use tallyman_domain::{DocumentRepository, FilingRef};
use tallyman_http::ResilientClient;
use tracing::{debug, info};

use crate::{ArchiveError, CompanyFactsHandle};

/// Default host for filing documents
pub const DEFAULT_ARCHIVE_BASE: &str = "https://www.sec.gov";

/// Default host for the XBRL JSON API
pub const DEFAULT_API_BASE: &str = "https://data.sec.gov";

/// Document repository over the live EDGAR archive
#[derive(Debug, Clone)]
pub struct EdgarArchive {
    client: ResilientClient,
    archive_base: String,
    api_base: String,
}

impl EdgarArchive {
    /// Create a repository using the default archive hosts
    pub fn new(client: ResilientClient) -> Self {
        Self {
            client,
            archive_base: DEFAULT_ARCHIVE_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Override both hosts (trailing slashes are ignored)
    pub fn with_base_urls(mut self, archive_base: &str, api_base: &str) -> Self {
        self.archive_base = archive_base.trim_end_matches('/').to_string();
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Client used for every request
    pub fn client(&self) -> &ResilientClient {
        &self.client
    }

    /// URL of a filing's full submission text
    pub fn document_url(&self, filing: &FilingRef) -> String {
        format!(
            "{}/Archives/edgar/data/{}/{}/{}.txt",
            self.archive_base,
            filing.cik_number(),
            filing.accession_compact(),
            filing.accession_number()
        )
    }

    /// URL of a filer's company-facts JSON
    pub fn company_facts_url(&self, filing: &FilingRef) -> String {
        format!(
            "{}/api/xbrl/companyfacts/CIK{}.json",
            self.api_base,
            filing.cik_padded()
        )
    }
}

impl DocumentRepository for EdgarArchive {
    type Error = ArchiveError;
    type Handle = CompanyFactsHandle;

    fn get_document_text(&self, filing: &FilingRef) -> Result<String, ArchiveError> {
        let url = self.document_url(filing);
        debug!(filing = %filing, url = %url, "Fetching filing document");

        let response = self.client.get(&url, None, &[])?.error_for_status()?;
        let text = response.text();

        info!(filing = %filing, bytes = text.len(), "Fetched filing document");
        Ok(text)
    }

    fn parsed_handle(&self, filing: &FilingRef) -> Result<CompanyFactsHandle, ArchiveError> {
        let url = self.company_facts_url(filing);
        debug!(filing = %filing, url = %url, "Fetching company facts");

        let headers = [("Accept".to_string(), "application/json".to_string())];
        let response = self.client.get(&url, None, &headers)?.error_for_status()?;
        let handle = CompanyFactsHandle::from_json(&response.text(), filing)?;

        info!(filing = %filing, facts = handle.len(), "Loaded company facts");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tallyman_http::{MockTransport, RequestGovernor};

    fn archive() -> EdgarArchive {
        let governor = Arc::new(RequestGovernor::new(1_000.0).unwrap());
        let client = ResilientClient::with_transport(
            "Test Suite test@example.com",
            governor,
            Arc::new(MockTransport::new()),
        )
        .unwrap();
        EdgarArchive::new(client)
    }

    #[test]
    fn test_url_composition() {
        let filing = FilingRef::new("0000320193", "0000320193-23-000106").unwrap();
        let archive = archive();
        assert_eq!(
            archive.document_url(&filing),
            "https://www.sec.gov/Archives/edgar/data/320193/000032019323000106/0000320193-23-000106.txt"
        );
        assert_eq!(
            archive.company_facts_url(&filing),
            "https://data.sec.gov/api/xbrl/companyfacts/CIK0000320193.json"
        );
    }

    #[test]
    fn test_base_override() {
        let filing = FilingRef::new("320193", "0000320193-23-000106").unwrap();
        let archive = archive().with_base_urls("http://localhost:8080/", "http://localhost:8081");
        assert!(archive
            .document_url(&filing)
            .starts_with("http://localhost:8080/Archives/"));
        assert!(archive
            .company_facts_url(&filing)
            .starts_with("http://localhost:8081/api/"));
    }
}
