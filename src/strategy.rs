//! # Strategy Configuration Module
//!
//! ## Purpose
//! Wire-compatible citation strategy configuration: the declarative rules
//! describing how citation tokens are resolved against external content
//! sources (SharePoint, blob storage, file servers, CMS systems, custom
//! URLs), plus capability matching and upfront validation.
//!
//! ## Input/Output Specification
//! - **Input**: Strategy configuration JSON (file or HTTP endpoint),
//!   citation tokens to match
//! - **Output**: Parsed `StrategyConfig`, capability-match decisions,
//!   validation reports
//! - **Wire Format**: camelCase JSON, as delivered to the chat frontend
//!
//! ## Key Features
//! - Closed strategy-type enum with a catch-all default variant
//! - Explicit optional fields; absence always means "unrestricted"
//! - Case-insensitive extension and path-pattern matching
//! - Structured validation with errors and warnings
//! - Loading from a local file or a remote configuration endpoint

use crate::errors::{ResolverError, Result};
use crate::utils::ValidationUtils;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Full strategy configuration consumed per resolution request.
///
/// Delivered once per chat session from the backend configuration endpoint
/// and treated as read-only for the lifetime of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyConfig {
    /// Schema version string
    #[serde(default = "default_version")]
    pub version: String,
    /// Name of a preferred strategy to try first if it can handle the token
    #[serde(default)]
    pub default_strategy: Option<String>,
    /// Name of a strategy to use when no strategy matches
    #[serde(default)]
    pub fallback_strategy: Option<String>,
    /// URL used when no structured strategy applies
    #[serde(default)]
    pub legacy_base_url: Option<String>,
    /// Ordered strategy definitions. `None` means the field was not defined
    /// at all (legacy fast path); an empty list is a defined-but-empty set
    /// and goes through the normal fallback chain instead.
    #[serde(default)]
    pub strategies: Option<Vec<StrategyDefinition>>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// A named rule describing how to resolve citations against one content source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDefinition {
    /// Unique identifier, cross-referenced by defaults/fallbacks
    pub name: String,
    /// Determines URL-construction shape
    #[serde(rename = "type", default)]
    pub strategy_type: StrategyType,
    /// Root URL to prefix resolved paths with
    #[serde(default)]
    pub base_url: String,
    /// Disabled strategies are never selected
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Higher wins among multiple matching strategies
    #[serde(default)]
    pub priority: i64,
    /// Accepted extensions, case-insensitive, with or without leading dot.
    /// Empty means any extension is accepted.
    #[serde(default)]
    pub file_extensions: Vec<String>,
    /// Glob-like patterns (`*` wildcard) or substrings the token must
    /// satisfy. Empty means any path matches.
    #[serde(default)]
    pub path_patterns: Vec<String>,
    /// Authentication requirements for dereferencing resolved URLs
    #[serde(default)]
    pub authentication: Option<AuthenticationConfig>,
}

fn default_enabled() -> bool {
    true
}

/// Authentication descriptor attached to a strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationConfig {
    /// Whether dereferencing resolved URLs requires authentication
    #[serde(default)]
    pub requires_auth: bool,
    /// Headers to attach when fetching the document
    #[serde(default)]
    pub additional_headers: HashMap<String, String>,
}

/// Closed set of strategy types dispatched by the URL builder.
///
/// Unrecognized wire values deserialize to `Default`, which mirrors how the
/// frontend treated unknown types: build `{baseUrl}/{token}` when a base URL
/// is present and fall back to the content endpoint otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    Sharepoint,
    BlobStorage,
    FileServer,
    Cms,
    CustomUrl,
    #[serde(other)]
    Default,
}

impl Default for StrategyType {
    fn default() -> Self {
        StrategyType::Default
    }
}

impl StrategyType {
    /// Wire identifier, used in result metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyType::Sharepoint => "sharepoint",
            StrategyType::BlobStorage => "blob_storage",
            StrategyType::FileServer => "file_server",
            StrategyType::Cms => "cms",
            StrategyType::CustomUrl => "custom_url",
            StrategyType::Default => "default",
        }
    }
}

impl StrategyDefinition {
    /// Capability check: whether this strategy's filters accept the token.
    ///
    /// A strategy with neither extension nor pattern filters accepts any
    /// token. Returns an error only when a path pattern fails to compile;
    /// the resolver contains that failure at its top level.
    pub fn can_handle(&self, citation: &str) -> Result<bool> {
        if !self.file_extensions.is_empty() {
            let Some(ext) = token_extension(citation) else {
                return Ok(false);
            };
            let accepted = self
                .file_extensions
                .iter()
                .any(|e| normalized_extension(e) == ext);
            if !accepted {
                return Ok(false);
            }
        }

        if !self.path_patterns.is_empty() {
            let mut matched = false;
            for pattern in &self.path_patterns {
                if pattern_matches(pattern, citation)? {
                    matched = true;
                    break;
                }
            }
            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Extract the token's extension: the substring after the last `.`,
/// case-folded. Tokens without a `.` have no extension.
pub(crate) fn token_extension(token: &str) -> Option<String> {
    token
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
}

/// Normalize a configured extension for comparison: strip any leading dot,
/// case-fold.
fn normalized_extension(raw: &str) -> String {
    raw.trim_start_matches('.').to_lowercase()
}

/// Match a single configured pattern against a citation token.
///
/// Patterns containing `*` become case-insensitive regular expressions
/// anchored at both ends (`*` → `.*`); all other characters pass through to
/// the regex engine verbatim, so a malformed pattern surfaces as a compile
/// error. Patterns without `*` match via case-insensitive substring
/// containment.
pub(crate) fn pattern_matches(pattern: &str, citation: &str) -> Result<bool> {
    if pattern.contains('*') {
        let regex = compile_pattern(pattern)?;
        Ok(regex.is_match(citation))
    } else {
        Ok(citation
            .to_lowercase()
            .contains(&pattern.to_lowercase()))
    }
}

/// Compile a wildcard pattern into its anchored, case-insensitive regex
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex> {
    let expression = format!("(?i)^{}$", pattern.replace('*', ".*"));
    Regex::new(&expression).map_err(|e| ResolverError::InvalidPattern {
        pattern: pattern.to_string(),
        details: e.to_string(),
    })
}

/// One problem found while validating a strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Configuration field the issue refers to
    pub field: String,
    /// Human-readable description
    pub message: String,
}

/// Result of an upfront validation pass over a strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Hard errors; a configuration with errors is rejected at load time
    pub errors: Vec<ValidationIssue>,
    /// Soft issues; logged but not fatal
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Whether the configuration can be accepted
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl StrategyConfig {
    /// Validate the configuration, collecting errors and warnings.
    ///
    /// Duplicate strategy names are a hard error: resolution is first-wins
    /// on duplicates, which is almost never what the author intended, so
    /// duplicates are rejected before a configuration goes live. References
    /// to unknown or disabled strategies are warnings because the resolver
    /// silently ignores them.
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let strategies: &[StrategyDefinition] =
            self.strategies.as_deref().unwrap_or(&[]);

        let mut seen_names: Vec<&str> = Vec::new();
        for (i, strategy) in strategies.iter().enumerate() {
            let field = format!("strategies[{}]", i);

            if strategy.name.trim().is_empty() {
                errors.push(ValidationIssue {
                    field: format!("{}.name", field),
                    message: "strategy name must not be empty".to_string(),
                });
            } else if seen_names.contains(&strategy.name.as_str()) {
                errors.push(ValidationIssue {
                    field: format!("{}.name", field),
                    message: format!("duplicate strategy name '{}'", strategy.name),
                });
            } else {
                seen_names.push(strategy.name.as_str());
            }

            if strategy.base_url.is_empty() && strategy.strategy_type != StrategyType::Default {
                warnings.push(ValidationIssue {
                    field: format!("{}.baseUrl", field),
                    message: format!(
                        "strategy '{}' has type '{}' but no base URL",
                        strategy.name,
                        strategy.strategy_type.as_str()
                    ),
                });
            } else if !strategy.base_url.is_empty()
                && !ValidationUtils::is_valid_base_url(&strategy.base_url)
            {
                warnings.push(ValidationIssue {
                    field: format!("{}.baseUrl", field),
                    message: format!("'{}' does not look like a URL or absolute path", strategy.base_url),
                });
            }

            for pattern in &strategy.path_patterns {
                if pattern.contains('*') {
                    if let Err(e) = compile_pattern(pattern) {
                        warnings.push(ValidationIssue {
                            field: format!("{}.pathPatterns", field),
                            message: format!(
                                "pattern will not compile and will trigger error fallback: {}",
                                e
                            ),
                        });
                    }
                }
            }

            for ext in &strategy.file_extensions {
                if ext.contains('*') || ext.trim_start_matches('.').is_empty() {
                    warnings.push(ValidationIssue {
                        field: format!("{}.fileExtensions", field),
                        message: format!("'{}' is not a usable extension", ext),
                    });
                }
            }
        }

        self.check_reference(&mut warnings, "defaultStrategy", self.default_strategy.as_deref());
        self.check_reference(&mut warnings, "fallbackStrategy", self.fallback_strategy.as_deref());

        ValidationReport { errors, warnings }
    }

    fn check_reference(
        &self,
        warnings: &mut Vec<ValidationIssue>,
        field: &str,
        reference: Option<&str>,
    ) {
        let Some(name) = reference else { return };
        let strategies: &[StrategyDefinition] =
            self.strategies.as_deref().unwrap_or(&[]);
        match strategies.iter().find(|s| s.name == name) {
            None => warnings.push(ValidationIssue {
                field: field.to_string(),
                message: format!("references unknown strategy '{}'", name),
            }),
            Some(s) if !s.enabled => warnings.push(ValidationIssue {
                field: field.to_string(),
                message: format!("references disabled strategy '{}'", name),
            }),
            Some(_) => {}
        }
    }

    /// Load a strategy configuration from a local JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ResolverError::ConfigSource {
                source_name: path.display().to_string(),
                details: e.to_string(),
            })?;
        serde_json::from_str(&content).map_err(|e| ResolverError::ConfigSource {
            source_name: path.display().to_string(),
            details: format!("JSON parse error: {}", e),
        })
    }

    /// Fetch a strategy configuration from a remote endpoint
    pub async fn fetch(url: &str) -> Result<Self> {
        let response = reqwest::get(url)
            .await
            .map_err(|e| ResolverError::ConfigSource {
                source_name: url.to_string(),
                details: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ResolverError::ConfigSource {
                source_name: url.to_string(),
                details: format!("HTTP status {}", response.status()),
            });
        }

        response
            .json::<StrategyConfig>()
            .await
            .map_err(|e| ResolverError::ConfigSource {
                source_name: url.to_string(),
                details: format!("JSON parse error: {}", e),
            })
    }

    /// Load from a source string: HTTP(S) URLs are fetched, everything else
    /// is treated as a local file path.
    pub async fn load(source: &str) -> Result<Self> {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::fetch(source).await
        } else {
            Self::from_json_file(source)
        }
    }
}

/// Load the strategy configuration named by the resolver settings and run
/// it through validation.
///
/// Returns `None` when no source is configured (the service then serves
/// every citation through the legacy path). Warnings are logged; hard
/// validation errors reject the configuration when `validate_on_load` is
/// set.
pub async fn load_and_validate(
    settings: &crate::config::ResolverSettings,
) -> Result<Option<(StrategyConfig, ValidationReport)>> {
    let Some(source) = settings.strategy_source.as_deref() else {
        return Ok(None);
    };

    let config = StrategyConfig::load(source).await?;
    let report = config.validate();

    for warning in &report.warnings {
        tracing::warn!(
            field = %warning.field,
            "strategy configuration warning: {}",
            warning.message
        );
    }

    if settings.validate_on_load && !report.is_valid() {
        let details = report
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ResolverError::InvalidStrategyConfig { details });
    }

    Ok(Some((config, report)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy(name: &str) -> StrategyDefinition {
        StrategyDefinition {
            name: name.to_string(),
            strategy_type: StrategyType::Sharepoint,
            base_url: "https://contoso.sharepoint.com/sites/docs".to_string(),
            enabled: true,
            priority: 1,
            file_extensions: Vec::new(),
            path_patterns: Vec::new(),
            authentication: None,
        }
    }

    #[test]
    fn test_extension_filter() {
        let mut s = strategy("sp");
        s.file_extensions = vec!["pdf".to_string()];

        assert!(s.can_handle("report.PDF").unwrap());
        assert!(s.can_handle("a/b/report.pdf").unwrap());
        assert!(!s.can_handle("report.docx").unwrap());
        assert!(!s.can_handle("report").unwrap());
    }

    #[test]
    fn test_extension_filter_with_leading_dot() {
        let mut s = strategy("sp");
        s.file_extensions = vec![".PDF".to_string(), ".docx".to_string()];

        assert!(s.can_handle("handbook.pdf").unwrap());
        assert!(s.can_handle("policy.DOCX").unwrap());
        assert!(!s.can_handle("notes.txt").unwrap());
    }

    #[test]
    fn test_wildcard_pattern() {
        let mut s = strategy("sp");
        s.path_patterns = vec!["docs/*".to_string()];

        assert!(s.can_handle("docs/manual.pdf").unwrap());
        assert!(s.can_handle("DOCS/manual.pdf").unwrap());
        assert!(!s.can_handle("other/manual.pdf").unwrap());
    }

    #[test]
    fn test_substring_pattern() {
        let mut s = strategy("sp");
        s.path_patterns = vec!["manual".to_string()];

        assert!(s.can_handle("docs/Manual.pdf").unwrap());
        assert!(s.can_handle("user-MANUAL-v2.docx").unwrap());
        assert!(!s.can_handle("docs/guide.pdf").unwrap());
    }

    #[test]
    fn test_no_filters_accepts_anything() {
        let s = strategy("sp");
        assert!(s.can_handle("anything.xyz").unwrap());
        assert!(s.can_handle("").unwrap());
        assert!(s.can_handle("путь/файл.pdf").unwrap());
    }

    #[test]
    fn test_both_filters_must_pass() {
        let mut s = strategy("sp");
        s.file_extensions = vec!["pdf".to_string()];
        s.path_patterns = vec!["docs/*".to_string()];

        assert!(s.can_handle("docs/manual.pdf").unwrap());
        assert!(!s.can_handle("docs/manual.docx").unwrap());
        assert!(!s.can_handle("other/manual.pdf").unwrap());
    }

    #[test]
    fn test_malformed_pattern_is_an_error() {
        let mut s = strategy("sp");
        s.path_patterns = vec!["docs[*".to_string()];

        let err = s.can_handle("docs/manual.pdf").unwrap_err();
        assert_eq!(err.category(), "resolution");
    }

    #[test]
    fn test_token_extension() {
        assert_eq!(token_extension("report.PDF"), Some("pdf".to_string()));
        assert_eq!(token_extension("a.b.c"), Some("c".to_string()));
        assert_eq!(token_extension("noext"), None);
        assert_eq!(token_extension(""), None);
    }

    #[test]
    fn test_parse_camel_case_wire_format() {
        let json = r#"{
            "version": "2.1",
            "defaultStrategy": "sharepoint-main",
            "fallbackStrategy": "files",
            "legacyBaseUrl": "https://legacy.contoso.com/docs",
            "strategies": [
                {
                    "name": "sharepoint-main",
                    "type": "sharepoint",
                    "baseUrl": "https://contoso.sharepoint.com/sites/docs",
                    "priority": 10,
                    "fileExtensions": [".pdf", ".docx"],
                    "authentication": {
                        "requiresAuth": true,
                        "additionalHeaders": {"X-Doc-Source": "sharepoint"}
                    }
                },
                {
                    "name": "files",
                    "type": "file_server",
                    "baseUrl": "https://files.contoso.com"
                }
            ]
        }"#;

        let config: StrategyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.version, "2.1");
        assert_eq!(config.default_strategy.as_deref(), Some("sharepoint-main"));

        let strategies = config.strategies.as_ref().unwrap();
        assert_eq!(strategies.len(), 2);
        assert_eq!(strategies[0].strategy_type, StrategyType::Sharepoint);
        assert!(strategies[0].enabled, "enabled defaults to true");
        assert_eq!(strategies[0].priority, 10);
        let auth = strategies[0].authentication.as_ref().unwrap();
        assert!(auth.requires_auth);
        assert_eq!(
            auth.additional_headers.get("X-Doc-Source").map(String::as_str),
            Some("sharepoint")
        );
        assert_eq!(strategies[1].strategy_type, StrategyType::FileServer);
        assert_eq!(strategies[1].priority, 0);
    }

    #[test]
    fn test_unknown_type_parses_as_default() {
        let json = r#"{"name": "x", "type": "quantum_vault", "baseUrl": "https://x.example.com"}"#;
        let s: StrategyDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(s.strategy_type, StrategyType::Default);
    }

    #[test]
    fn test_absent_strategies_vs_empty_strategies() {
        let absent: StrategyConfig = serde_json::from_str(r#"{"version": "1.0"}"#).unwrap();
        assert!(absent.strategies.is_none());

        let empty: StrategyConfig =
            serde_json::from_str(r#"{"version": "1.0", "strategies": []}"#).unwrap();
        assert_eq!(empty.strategies.as_ref().map(Vec::len), Some(0));
    }

    #[test]
    fn test_validation_rejects_duplicate_names() {
        let config = StrategyConfig {
            version: "1.0".to_string(),
            default_strategy: None,
            fallback_strategy: None,
            legacy_base_url: None,
            strategies: Some(vec![strategy("docs"), strategy("docs")]),
        };

        let report = config.validate();
        assert!(!report.is_valid());
        assert!(report.errors[0].message.contains("duplicate"));
    }

    #[test]
    fn test_validation_warns_on_dangling_references() {
        let mut disabled = strategy("old");
        disabled.enabled = false;

        let config = StrategyConfig {
            version: "1.0".to_string(),
            default_strategy: Some("missing".to_string()),
            fallback_strategy: Some("old".to_string()),
            legacy_base_url: None,
            strategies: Some(vec![strategy("docs"), disabled]),
        };

        let report = config.validate();
        assert!(report.is_valid(), "dangling references are not fatal");
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].message.contains("unknown strategy 'missing'"));
        assert!(report.warnings[1].message.contains("disabled strategy 'old'"));
    }

    #[test]
    fn test_validation_warns_on_bad_pattern() {
        let mut s = strategy("docs");
        s.path_patterns = vec!["docs[*".to_string()];

        let config = StrategyConfig {
            version: "1.0".to_string(),
            default_strategy: None,
            fallback_strategy: None,
            legacy_base_url: None,
            strategies: Some(vec![s]),
        };

        let report = config.validate();
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.message.contains("error fallback")));
    }

    #[test]
    fn test_load_from_json_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"version": "1.0", "strategies": [{{"name": "docs", "type": "cms", "baseUrl": "https://cms.example.com"}}]}}"#
        )
        .unwrap();

        let config = StrategyConfig::from_json_file(file.path()).unwrap();
        let strategies = config.strategies.unwrap();
        assert_eq!(strategies[0].strategy_type, StrategyType::Cms);
    }

    #[test]
    fn test_load_missing_file() {
        let err = StrategyConfig::from_json_file("/nonexistent/strategies.json").unwrap_err();
        assert_eq!(err.category(), "strategy_config");
    }

    #[tokio::test]
    async fn test_fetch_remote_config() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "3.0",
                "strategies": [
                    {"name": "blob", "type": "blob_storage", "baseUrl": "https://stg.blob.core.windows.net/docs"}
                ]
            })))
            .mount(&server)
            .await;

        let url = format!("{}/config", server.uri());
        let config = StrategyConfig::load(&url).await.unwrap();
        assert_eq!(config.version, "3.0");
        assert_eq!(
            config.strategies.unwrap()[0].strategy_type,
            StrategyType::BlobStorage
        );
    }

    #[tokio::test]
    async fn test_fetch_remote_config_http_error() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/config"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = format!("{}/config", server.uri());
        let err = StrategyConfig::load(&url).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
