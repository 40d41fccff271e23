//! Connector configuration
//!
//! A YAML (or JSON) file carries the source properties; secrets may instead come
//! from the environment, typically via a `.env` file:
//!
//! ```yaml
//! referenceName: searchConsole
//! authenticationMethod: oAuthClient
//! clientId: my-client.apps.googleusercontent.com
//! siteFilterOption: siteUrlListOption
//! siteUrlList: example.com__SITE_KV_DELIMITER__Domain
//! startDate: "2020-05-01"
//! endDate: "2020-05-31"
//! dimensions: date,query
//! numSplits: 4
//! schema: |
//!   {"type": "record", "name": "searchAnalytics", "fields": [
//!     {"name": "date", "type": {"type": "int", "logicalType": "date"}},
//!     {"name": "query", "type": ["string", "null"]},
//!     {"name": "clicks", "type": "double"}
//!   ]}
//! ```

use crate::client::{
    Auth, AuthMethod, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, READONLY_SCOPE, ServiceAccountKey,
};
use crate::error::{ConnectorError, ValidationFailure};
use crate::fetch::RetryPolicy;
use crate::model::FetchQuery;
use crate::schema::OutputSchema;
use crate::transform::parse_iso_date;
use crate::sites::{SiteEntry, parse_site_list};

use chrono::NaiveDate;
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// `serviceFilePath` value that defers to `GOOGLE_APPLICATION_CREDENTIALS`
pub const AUTO_DETECT: &str = "auto-detect";

/// Which sites a run extracts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SiteFilter {
    /// Every site the credential can read
    #[default]
    #[serde(rename = "allUrlsOption")]
    AllUrls,
    /// Only the sites in `siteUrlList`
    #[serde(rename = "siteUrlListOption")]
    SiteUrlList,
}

/// What a worker does with a row that fails to convert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordErrorPolicy {
    /// Fail the split
    #[default]
    Abort,
    /// Log and drop the row
    Skip,
}

/// Where the site registry comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteSource {
    /// Ask the API for every visible site
    AllSites,
    Listed(Vec<SiteEntry>),
}

/// Source properties of one extraction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceConfig {
    pub reference_name: Option<String>,
    pub authentication_method: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub client_access_token: Option<String>,
    pub client_application_name: Option<String>,
    pub service_file_path: Option<String>,
    pub service_account_json_str: Option<String>,
    pub site_filter_option: SiteFilter,
    pub site_url_list: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Comma separated dimension names
    pub dimensions: Option<String>,
    pub num_splits: i32,
    /// Avro-style record schema, either as JSON text or inline
    pub schema: Option<Value>,
    pub api_base_url: Option<String>,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub on_record_error: RecordErrorPolicy,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            reference_name: None,
            authentication_method: None,
            client_id: None,
            client_secret: None,
            client_access_token: None,
            client_application_name: None,
            service_file_path: None,
            service_account_json_str: None,
            site_filter_option: SiteFilter::default(),
            site_url_list: None,
            start_date: None,
            end_date: None,
            dimensions: None,
            num_splits: 1,
            schema: None,
            api_base_url: None,
            request_timeout_secs: 60,
            max_retries: 3,
            on_record_error: RecordErrorPolicy::default(),
        }
    }
}

/// A present, non-blank value
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn env_override(target: &mut Option<String>, var: &str) {
    if let Ok(value) = std::env::var(var)
        && !value.trim().is_empty()
    {
        log::debug!("Using {} from environment", var);
        *target = Some(value);
    }
}

impl SourceConfig {
    /// Read a YAML or JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overlay secrets from the environment
    ///
    /// - SEARCH_CONSOLE_CLIENT_ID
    /// - SEARCH_CONSOLE_CLIENT_SECRET
    /// - SEARCH_CONSOLE_ACCESS_TOKEN
    /// - SEARCH_CONSOLE_SERVICE_ACCOUNT_FILE
    /// - SEARCH_CONSOLE_SERVICE_ACCOUNT_JSON
    pub fn apply_env(&mut self) {
        env_override(&mut self.client_id, "SEARCH_CONSOLE_CLIENT_ID");
        env_override(&mut self.client_secret, "SEARCH_CONSOLE_CLIENT_SECRET");
        env_override(&mut self.client_access_token, "SEARCH_CONSOLE_ACCESS_TOKEN");
        env_override(
            &mut self.service_file_path,
            "SEARCH_CONSOLE_SERVICE_ACCOUNT_FILE",
        );
        env_override(
            &mut self.service_account_json_str,
            "SEARCH_CONSOLE_SERVICE_ACCOUNT_JSON",
        );
    }

    pub fn reference_name(&self) -> &str {
        non_empty(&self.reference_name).unwrap_or("searchConsole")
    }

    /// Check every property, collecting all failures
    pub fn validate(&self) -> Vec<ValidationFailure> {
        let mut failures = Vec::new();

        match non_empty(&self.authentication_method) {
            None => failures.push(ValidationFailure::new(
                "Missing authentication method.",
                "Authentication method must be set.",
            )),
            Some(method) => match method.parse::<AuthMethod>() {
                Ok(method) => self.validate_credentials(method, &mut failures),
                Err(e) => failures.push(ValidationFailure::new(
                    format!("Invalid authentication method: {}.", e),
                    "Use oAuthClient, serviceAccount or serviceAccountJson.",
                )),
            },
        }

        let start = parse_date(&self.start_date);
        let end = parse_date(&self.end_date);
        if start.is_none() {
            failures.push(ValidationFailure::new(
                "Missing/Invalid Start Date.",
                "Please provide valid Start Date.",
            ));
        }
        if end.is_none() {
            failures.push(ValidationFailure::new(
                "Missing/Invalid End Date.",
                "Please provide valid End Date.",
            ));
        }
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            failures.push(ValidationFailure::new(
                "Start Date is after End Date.",
                "Please provide a Start Date on or before the End Date.",
            ));
        }

        if self.dimensions().is_empty() {
            failures.push(ValidationFailure::new(
                "Missing dimensions.",
                "Please provide at least one dimension.",
            ));
        }

        if let Err(e) = self.parsed_schema() {
            failures.push(ValidationFailure::new(
                format!("{}.", e),
                "Please provide a record schema.",
            ));
        }

        if self.site_filter_option == SiteFilter::SiteUrlList {
            match non_empty(&self.site_url_list) {
                None => failures.push(ValidationFailure::new(
                    "Site list empty.",
                    "Site list needs to provided.",
                )),
                Some(list) => {
                    if let Err(e) = parse_site_list(list) {
                        failures.push(ValidationFailure::new(
                            format!("{}.", e),
                            "Please fix the site list.",
                        ));
                    }
                }
            }
        }

        if self.request_timeout_secs == 0 {
            failures.push(ValidationFailure::new(
                "Request timeout is zero.",
                "Please provide a positive requestTimeoutSecs.",
            ));
        }

        if let Some(base) = non_empty(&self.api_base_url)
            && Url::parse(base).is_err()
        {
            failures.push(ValidationFailure::new(
                format!("Invalid API base URL: {}.", base),
                "Please provide an absolute URL.",
            ));
        }

        failures
    }

    fn validate_credentials(&self, method: AuthMethod, failures: &mut Vec<ValidationFailure>) {
        match method {
            AuthMethod::OAuthClient => {
                if non_empty(&self.client_id).is_none() {
                    failures.push(ValidationFailure::new(
                        "Missing client Id.",
                        "Client Id must be set.",
                    ));
                }
                if non_empty(&self.client_secret).is_none() {
                    failures.push(ValidationFailure::new(
                        "Missing client secret.",
                        "Client secret must be set.",
                    ));
                }
            }
            AuthMethod::ServiceAccount => {
                if non_empty(&self.service_file_path).is_none() {
                    failures.push(ValidationFailure::new(
                        "Missing service account.",
                        "Please provide service account file path.",
                    ));
                }
            }
            AuthMethod::ServiceAccountJson => {
                if non_empty(&self.service_account_json_str).is_none() {
                    failures.push(ValidationFailure::new(
                        "Missing service account json string.",
                        "Please provide full json account string.",
                    ));
                }
            }
        }

        // Tokens are minted outside the connector for every method
        if non_empty(&self.client_access_token).is_none() {
            failures.push(ValidationFailure::new(
                "Missing client access token.",
                format!("Client access token with scope {} must be set.", READONLY_SCOPE),
            ));
        }
    }

    /// Validate, turning any failures into one error
    pub fn check(&self) -> std::result::Result<(), ConnectorError> {
        let failures = self.validate();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ConnectorError::InvalidConfig(failures))
        }
    }

    pub fn auth_method(&self) -> Result<AuthMethod> {
        match non_empty(&self.authentication_method) {
            Some(method) => method.parse().map_err(|e: String| eyre!(e)),
            None => Ok(AuthMethod::default()),
        }
    }

    /// Build the credential, reading and checking service account keys
    pub fn auth(&self) -> Result<Auth> {
        let access_token = non_empty(&self.client_access_token)
            .ok_or_else(|| eyre!("Missing client access token"))?
            .to_string();

        match self.auth_method()? {
            AuthMethod::OAuthClient => Ok(Auth::OAuthClient {
                client_id: non_empty(&self.client_id).unwrap_or_default().to_string(),
                access_token,
            }),
            AuthMethod::ServiceAccount => {
                let path = non_empty(&self.service_file_path)
                    .ok_or_else(|| eyre!("Missing service account file path"))?;
                let path = if path == AUTO_DETECT {
                    std::env::var("GOOGLE_APPLICATION_CREDENTIALS").with_context(
                        || "GOOGLE_APPLICATION_CREDENTIALS must be set to auto-detect the service account",
                    )?
                } else {
                    path.to_string()
                };
                Ok(Auth::ServiceAccount {
                    key: ServiceAccountKey::from_file(path)?,
                    access_token,
                })
            }
            AuthMethod::ServiceAccountJson => {
                let json = non_empty(&self.service_account_json_str)
                    .ok_or_else(|| eyre!("Missing service account json string"))?;
                Ok(Auth::ServiceAccount {
                    key: ServiceAccountKey::parse(json)?,
                    access_token,
                })
            }
        }
    }

    /// Configured dimension names, in order
    pub fn dimensions(&self) -> Vec<String> {
        self.dimensions
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn fetch_query(&self) -> Result<FetchQuery> {
        let start = parse_date(&self.start_date).ok_or_else(|| eyre!("Invalid start date"))?;
        let end = parse_date(&self.end_date).ok_or_else(|| eyre!("Invalid end date"))?;
        Ok(FetchQuery::new(start, end, self.dimensions()))
    }

    pub fn parsed_schema(&self) -> std::result::Result<OutputSchema, ConnectorError> {
        match &self.schema {
            None => Err(ConnectorError::InvalidSchema("missing schema".to_string())),
            Some(Value::String(json)) => OutputSchema::parse_json(json),
            Some(inline) => OutputSchema::parse_json(&inline.to_string()),
        }
    }

    pub fn site_source(&self) -> std::result::Result<SiteSource, ConnectorError> {
        match self.site_filter_option {
            SiteFilter::AllUrls => Ok(SiteSource::AllSites),
            SiteFilter::SiteUrlList => {
                parse_site_list(non_empty(&self.site_url_list).unwrap_or_default())
                    .map(SiteSource::Listed)
            }
        }
    }

    pub fn base_url(&self) -> Result<Url> {
        let base = non_empty(&self.api_base_url).unwrap_or(DEFAULT_BASE_URL);
        Url::parse(base).with_context(|| format!("Invalid API base URL: {}", base))
    }

    /// `clientApplicationName` identifies the caller ahead of the connector's own agent
    pub fn user_agent(&self) -> String {
        match non_empty(&self.client_application_name) {
            Some(name) => format!("{} {}", name, DEFAULT_USER_AGENT),
            None => DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        }
    }
}

fn parse_date(value: &Option<String>) -> Option<NaiveDate> {
    non_empty(value).and_then(parse_iso_date)
}
