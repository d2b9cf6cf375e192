//! Shareable employee links
//!
//! A link carries a review id, the employee's display fields and the store
//! endpoint as query parameters. Opening it puts the session in shared mode:
//! the holder can reach the employee form of that one review, without login.

use chrono::NaiveDate;
use url::{form_urlencoded, Url};

use crate::config::is_http_url;
use crate::review::ReviewRecord;
use crate::{Error, Result};

const PARAM_REVIEW_ID: &str = "reviewId";
const PARAM_MODE: &str = "mode";
const PARAM_NAME: &str = "name";
const PARAM_ROLE: &str = "role";
const PARAM_DB_URL: &str = "dbUrl";
const EMPLOYEE_MODE: &str = "employee";

/// Builder for shareable links
#[derive(Debug, Clone)]
pub struct SharedLink {
    base: Url,
}

impl SharedLink {
    /// Create a link builder for the application served at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL {}: {}", base_url, e)))?;
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    /// Link giving the employee access to their own review
    ///
    /// `db_url` is embedded so the employee's device writes to the same store.
    pub fn for_review(&self, review: &ReviewRecord, db_url: Option<&str>) -> String {
        let mut url = self.base.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair(PARAM_REVIEW_ID, &review.id)
                .append_pair(PARAM_MODE, EMPLOYEE_MODE)
                .append_pair(PARAM_NAME, &review.employee_name)
                .append_pair(PARAM_ROLE, &review.employee_role);
            if let Some(db_url) = db_url.filter(|u| !u.trim().is_empty()) {
                query.append_pair(PARAM_DB_URL, db_url);
            }
        }
        url.to_string()
    }
}

/// Parameters decoded from a shared link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedLinkParams {
    pub review_id: String,
    pub name: String,
    pub role: String,
    /// Store endpoint as found in the link, if any
    pub db_url: Option<String>,
}

impl SharedLinkParams {
    /// Decode a full launch URL
    ///
    /// Returns `Ok(None)` when the URL is not a shared employee link.
    pub fn from_url(url: &str) -> Result<Option<Self>> {
        let url = Url::parse(url).map_err(|e| Error::InvalidInput(format!("Invalid link: {}", e)))?;
        Ok(Self::from_query(url.query().unwrap_or("")))
    }

    /// Decode a raw query string (without the leading `?`)
    ///
    /// The mode marker and a review id are necessary and sufficient.
    pub fn from_query(query: &str) -> Option<Self> {
        let mut review_id = None;
        let mut mode = None;
        let mut name = String::new();
        let mut role = String::new();
        let mut db_url = None;

        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                PARAM_REVIEW_ID => review_id = Some(value.into_owned()),
                PARAM_MODE => mode = Some(value.into_owned()),
                PARAM_NAME => name = value.into_owned(),
                PARAM_ROLE => role = value.into_owned(),
                PARAM_DB_URL => db_url = Some(value.into_owned()),
                _ => {}
            }
        }

        let review_id = review_id.filter(|id| !id.trim().is_empty())?;
        if mode.as_deref() != Some(EMPLOYEE_MODE) {
            return None;
        }

        Some(Self {
            review_id,
            name,
            role,
            db_url,
        })
    }

    /// The store endpoint to use for this session
    ///
    /// Accepts the endpoint plain or percent-encoded; falls back to
    /// `fallback` when it is absent or unusable.
    pub fn resolve_db_url(&self, fallback: &str) -> String {
        self.db_url
            .as_deref()
            .and_then(normalize_endpoint)
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Record rendered before the authoritative copy arrives from the store
    pub fn placeholder(&self, today: NaiveDate) -> ReviewRecord {
        ReviewRecord::new(&self.review_id, &self.name, &self.role, today)
    }
}

/// Peel off up to two layers of percent-encoding until an http(s) URL appears
fn normalize_endpoint(raw: &str) -> Option<String> {
    let mut candidate = raw.trim().to_string();

    for _ in 0..3 {
        if candidate.is_empty() {
            return None;
        }
        if is_http_url(&candidate) {
            return Some(candidate);
        }
        // Literal separators mean this is not an encoded URL
        if candidate.contains('&') || candidate.contains('=') {
            return None;
        }
        candidate = form_urlencoded::parse(candidate.as_bytes())
            .next()
            .map(|(key, _)| key.into_owned())?;
    }

    None
}
