//! Site identifiers and the JSON bodies accepted by the API routes.
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;

/// How a property is identified to Google.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteType {
    /// A whole domain, verified with a DNS TXT record.
    #[serde(rename = "DOMAIN", alias = "INET_DOMAIN")]
    Domain,
    /// A URL prefix, verified with an HTML meta tag.
    #[serde(rename = "URL_PREFIX", alias = "SITE")]
    UrlPrefix,
}

impl SiteType {
    pub fn verification_method(&self) -> VerificationMethod {
        match self {
            SiteType::Domain => VerificationMethod::DnsTxt,
            SiteType::UrlPrefix => VerificationMethod::Meta,
        }
    }

    /// The Site Verification API's name for this type.
    pub fn resource_type(&self) -> &'static str {
        match self {
            SiteType::Domain => "INET_DOMAIN",
            SiteType::UrlPrefix => "SITE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationMethod {
    DnsTxt,
    Meta,
}

impl VerificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMethod::DnsTxt => "DNS_TXT",
            VerificationMethod::Meta => "META",
        }
    }
}

/// A request body with fields that must be present and non-blank.
pub trait RequestBody: DeserializeOwned {
    fn is_complete(&self) -> bool;
}

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Parses a JSON body. Anything unparsable or incomplete is a validation failure.
pub fn parse_body<T: RequestBody>(body: &[u8]) -> Result<T, ApiError> {
    let parsed = serde_json::from_slice::<T>(body).map_err(|e| {
        debug!("Rejected request body: {}", e);
        ApiError::missing_fields()
    })?;
    if parsed.is_complete() {
        Ok(parsed)
    } else {
        Err(ApiError::missing_fields())
    }
}

/// Body of `/api/verify` and `/api/confirm`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerifyRequest {
    pub site: String,
    #[serde(rename = "type")]
    pub site_type: SiteType,
}

impl RequestBody for VerifyRequest {
    fn is_complete(&self) -> bool {
        filled(&self.site)
    }
}

/// Body of `/api/property`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyRequest {
    pub site: String,
}

impl RequestBody for PropertyRequest {
    fn is_complete(&self) -> bool {
        filled(&self.site)
    }
}

/// Body of `/api/sitemap`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SitemapRequest {
    pub site: String,
    pub sitemap: String,
}

impl RequestBody for SitemapRequest {
    fn is_complete(&self) -> bool {
        filled(&self.site) && filled(&self.sitemap)
    }
}

/// Body of `/api/url`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InspectRequest {
    pub site: String,
    pub url: String,
}

impl RequestBody for InspectRequest {
    fn is_complete(&self) -> bool {
        filled(&self.site) && filled(&self.url)
    }
}

/// Body of `/api/reindex`.
///
/// `url` is optional at parse time so an ineligible request is rejected for
/// eligibility rather than for a missing field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReindexRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub eligible: Value,
}

impl ReindexRequest {
    /// Only the JSON boolean `true` asserts eligibility.
    pub fn is_eligible(&self) -> bool {
        self.eligible == Value::Bool(true)
    }
}

impl RequestBody for ReindexRequest {
    fn is_complete(&self) -> bool {
        true
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use crate::error::ApiError;

    use super::{
        InspectRequest, ReindexRequest, SiteType, SitemapRequest, VerificationMethod,
        VerifyRequest, parse_body,
    };

    #[test]
    fn test_site_type_aliases() {
        let req: VerifyRequest =
            parse_body(br#"{"site":"example.com","type":"INET_DOMAIN"}"#).unwrap();
        assert_eq!(req.site_type, SiteType::Domain);

        let req: VerifyRequest =
            parse_body(br#"{"site":"https://example.com/","type":"URL_PREFIX"}"#).unwrap();
        assert_eq!(req.site_type, SiteType::UrlPrefix);
        assert_eq!(req.site_type.verification_method(), VerificationMethod::Meta);
        assert_eq!(req.site_type.resource_type(), "SITE");
    }

    #[test]
    fn test_unknown_site_type_rejected() {
        let res = parse_body::<VerifyRequest>(br#"{"site":"example.com","type":"FTP"}"#);
        assert_eq!(res.unwrap_err(), ApiError::missing_fields());
    }

    #[test]
    fn test_missing_and_blank_fields_rejected() {
        assert!(parse_body::<SitemapRequest>(br#"{"site":"sc-domain:example.com"}"#).is_err());
        assert!(parse_body::<SitemapRequest>(br#"{"site":"  ","sitemap":"s"}"#).is_err());
        assert!(parse_body::<InspectRequest>(b"").is_err());
        assert!(parse_body::<InspectRequest>(b"{not json").is_err());
    }

    #[test]
    fn test_reindex_eligibility() {
        let req: ReindexRequest = parse_body(br#"{"url":"https://a.b/","eligible":true}"#).unwrap();
        assert!(req.is_eligible());

        let req: ReindexRequest = parse_body(br#"{"url":"https://a.b/"}"#).unwrap();
        assert!(!req.is_eligible());

        let req: ReindexRequest = parse_body(br#"{"eligible":"true"}"#).unwrap();
        assert!(!req.is_eligible());
        assert_eq!(req.url, None);
    }
}
