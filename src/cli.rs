//! CLI helper functions

use crate::{
    client::{SearchAnalyticsApi, SearchConsoleClient},
    config::{SiteSource, SourceConfig},
    driver::{Driver, RunSummary},
    error::{ConnectorError, ValidationFailure},
    fetch::PaginatedFetcher,
    sites::{SiteRegistry, check_sites_accessible},
    storage::NdjsonWriter,
    transform::RecordMapper,
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;

/// Load the configuration file and overlay secrets from the environment
///
/// Environment variables:
/// - SEARCH_CONSOLE_CLIENT_ID
/// - SEARCH_CONSOLE_CLIENT_SECRET
/// - SEARCH_CONSOLE_ACCESS_TOKEN
/// - SEARCH_CONSOLE_SERVICE_ACCOUNT_FILE
/// - SEARCH_CONSOLE_SERVICE_ACCOUNT_JSON
pub fn load_config(path: impl AsRef<Path>) -> Result<SourceConfig> {
    let path = path.as_ref();
    log::debug!("Loading config from {}", path.display());
    let mut config = SourceConfig::from_file(path)?;
    config.apply_env();
    Ok(config)
}

/// Build the HTTP client for the configured endpoint and credential
pub fn build_client(config: &SourceConfig) -> Result<SearchConsoleClient> {
    let auth = config.auth().context("Failed to load credentials")?;
    SearchConsoleClient::try_with_user_agent(
        config.base_url()?,
        &auth,
        config.request_timeout(),
        &config.user_agent(),
    )
    .context("Failed to create Search Console client")
}

/// Build the site registry from the configured list or the site-listing call
pub async fn resolve_registry<A: SearchAnalyticsApi>(
    config: &SourceConfig,
    api: &A,
) -> Result<SiteRegistry> {
    let registry = match config.site_source()? {
        SiteSource::Listed(entries) => SiteRegistry::from_entries(&entries),
        SiteSource::AllSites => {
            log::info!("Listing all sites visible to the credential...");
            let sites = api.list_sites().await.map_err(ConnectorError::SiteListing)?;
            if sites.is_empty() {
                return Err(ConnectorError::PartitionInput(
                    "no sites retrieved from API".to_string(),
                )
                .into());
            }
            SiteRegistry::from_rendered(sites)
        }
    };
    log::info!("Site registry: {} sites", registry.len());
    Ok(registry)
}

/// Extract every configured site into an NDJSON file
///
/// Pipeline per split: SplitExtractor → RecordMapper → NdjsonWriter
pub async fn run_extraction<A: SearchAnalyticsApi + 'static>(
    config: &SourceConfig,
    api: Arc<A>,
    output: impl AsRef<Path>,
    splits: Option<i32>,
) -> Result<RunSummary> {
    config.check()?;
    log::info!("Running {}", config.reference_name().cyan());

    let registry = resolve_registry(config, api.as_ref()).await?;
    let query = Arc::new(config.fetch_query()?);
    let schema = config.parsed_schema()?;
    let mapper = RecordMapper::new(&schema, &query.dimensions);

    let fetcher = PaginatedFetcher::new(api, query)
        .with_retry(config.retry_policy())
        .with_timeout(config.request_timeout());
    let writer = Arc::new(NdjsonWriter::create(output.as_ref())?);

    let driver = Driver::new(fetcher, mapper, Arc::clone(&writer))
        .on_record_error(config.on_record_error);
    let summary = driver
        .run(&registry, splits.unwrap_or(config.num_splits))
        .await?;

    log::info!(
        "✓ Wrote {} record(s) to {}",
        summary.records,
        writer.path().display().bright_black()
    );
    Ok(summary)
}

/// Rendered addresses of every site the credential can read
pub async fn list_sites<A: SearchAnalyticsApi>(api: &A) -> Result<Vec<String>> {
    let sites = api
        .list_sites()
        .await
        .map_err(ConnectorError::SiteListing)?;
    Ok(sites)
}

/// Check the configuration against the API: at least one visible site, and
/// every listed site accessible
pub async fn validate_remote<A: SearchAnalyticsApi>(
    config: &SourceConfig,
    api: &A,
) -> Vec<ValidationFailure> {
    let available = match api.list_sites().await {
        Ok(sites) => sites,
        Err(e) => {
            return vec![ValidationFailure::new(
                format!("{}.", e),
                "Please check the credentials and API access.",
            )];
        }
    };
    if available.is_empty() {
        return vec![ValidationFailure::new(
            "Error:",
            "No sites retrieved from API.",
        )];
    }

    match config.site_source() {
        Ok(SiteSource::Listed(entries)) => check_sites_accessible(&entries, &available),
        Ok(SiteSource::AllSites) => Vec::new(),
        Err(e) => vec![ValidationFailure::new(
            format!("{}.", e),
            "Please fix the site list.",
        )],
    }
}
