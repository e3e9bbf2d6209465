//! Claim lookup against the trusted verification platform
//!
//! The platform is a fixed in-memory table of already fact-checked claims. A
//! table entry matches a query when enough of its key terms appear among the
//! query's words.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::ToolInputSchema;
use crate::tools::tool::{required_str, Tool, ToolResult};

/// Outcome recorded for a fact-checked claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    True,
    False,
}

impl Verdict {
    fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "TRUE",
            Verdict::False => "FALSE",
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            Verdict::True => "✅",
            Verdict::False => "❌",
        }
    }
}

/// One fact-checked claim on the platform
#[derive(Debug, Clone)]
pub struct VerificationRecord {
    /// Normalized key terms, space separated
    pub key: &'static str,
    pub status: Verdict,
    pub verified_by: &'static str,
    pub summary: &'static str,
    pub source_urls: &'static [&'static str],
    pub confidence: &'static str,
}

/// Claims known to the platform, checked in order
pub const PLATFORM_RECORDS: &[VerificationRecord] = &[
    VerificationRecord {
        key: "bleach cures covid",
        status: Verdict::False,
        verified_by: "CDC, WHO, FDA",
        summary: "Drinking or injecting bleach is extremely dangerous and does not cure COVID-19. This has been thoroughly debunked by medical authorities.",
        source_urls: &[
            "https://www.cdc.gov/coronavirus/2019-ncov/faq.html",
            "https://www.who.int/emergencies/diseases/novel-coronavirus-2019/advice-for-public/myth-busters",
        ],
        confidence: "HIGH",
    },
    VerificationRecord {
        key: "5g causes covid",
        status: Verdict::False,
        verified_by: "WHO, FCC, Scientific Community",
        summary: "There is no scientific evidence linking 5G technology to COVID-19. Viruses cannot travel on radio waves or mobile networks.",
        source_urls: &[
            "https://www.who.int/emergencies/diseases/novel-coronavirus-2019/advice-for-public/myth-busters",
        ],
        confidence: "HIGH",
    },
    VerificationRecord {
        key: "5g towers mind control",
        status: Verdict::False,
        verified_by: "Scientific Community, FCC",
        summary: "This is a conspiracy theory with no scientific basis. 5G technology uses radio waves and cannot control minds or spread viruses.",
        source_urls: &[],
        confidence: "HIGH",
    },
    VerificationRecord {
        key: "nasa webb telescope carbon dioxide exoplanet",
        status: Verdict::True,
        verified_by: "NASA, ESA, Nature Journal",
        summary: "NASA's James Webb Space Telescope detected carbon dioxide in the atmosphere of exoplanet WASP-39 b in August 2022. Published in peer-reviewed journals.",
        source_urls: &[
            "https://www.nasa.gov/webb",
            "https://www.nature.com/articles/s41586-022-05269-w",
        ],
        confidence: "HIGH",
    },
    VerificationRecord {
        key: "uk inflation 4.2 percent november 2023",
        status: Verdict::True,
        verified_by: "Office for National Statistics (ONS), BBC",
        summary: "UK inflation fell to 4.2% in November 2023, down from 4.6% in October, according to official ONS statistics.",
        source_urls: &[
            "https://www.ons.gov.uk/economy/inflationandpriceindices",
            "https://www.bbc.com/news/business",
        ],
        confidence: "HIGH",
    },
    VerificationRecord {
        key: "vaccine kidnappers door scam",
        status: Verdict::False,
        verified_by: "Police Departments, Fact-checking orgs",
        summary: "This is a common WhatsApp hoax that has circulated in various forms. No credible reports of such incidents exist. Vaccines are not administered door-to-door in this manner.",
        source_urls: &[],
        confidence: "HIGH",
    },
];

const UNVERIFIED_REPORT: &str = "PLATFORM VERIFICATION RESULT:
Status: UNVERIFIED
Message: This claim was not found in the verification platform database.
Recommendation: Cannot verify this claim on the dedicated platform. The claim may be:
  - Too new to have been fact-checked yet
  - Not widely circulated enough to be in the database
  - Requires additional investigation from other sources

Without verification from the platform, treat this claim with caution.";

/// First record whose key terms sufficiently overlap the query's words.
///
/// A record matches when at least `max(2, 0.6 * key_terms)` of its key terms
/// are whole words of the lower-cased query.
pub fn lookup(query: &str) -> Option<&'static VerificationRecord> {
    let normalized = query.trim().to_lowercase();
    let query_terms: Vec<&str> = normalized.split_whitespace().collect();

    PLATFORM_RECORDS.iter().find(|record| {
        let key_terms: Vec<&str> = record.key.split_whitespace().collect();
        let matches = key_terms
            .iter()
            .filter(|term| query_terms.contains(*term))
            .count();
        matches as f64 >= f64::max(2.0, key_terms.len() as f64 * 0.6)
    })
}

/// Report text for a lookup result
pub fn format_report(record: Option<&VerificationRecord>) -> String {
    let Some(record) = record else {
        return UNVERIFIED_REPORT.to_string();
    };

    let mut output = format!(
        "PLATFORM VERIFICATION RESULT:\n\
         {} Status: {}\n\
         Verified By: {}\n\
         Confidence: {}\n\n\
         Summary:\n\
         {}\n",
        record.status.marker(),
        record.status.as_str(),
        record.verified_by,
        record.confidence,
        record.summary
    );

    if !record.source_urls.is_empty() {
        output.push_str("\nSources:\n");
        for url in record.source_urls {
            output.push_str(&format!("  - {}\n", url));
        }
    }

    output
}

/// Checks a claim against the platform's fact-check table.
pub struct VerifyOnPlatformTool;

impl VerifyOnPlatformTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VerifyOnPlatformTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for VerifyOnPlatformTool {
    fn name(&self) -> &str {
        "verify_on_platform"
    }

    fn description(&self) -> &str {
        "Verify a claim or news article against the trusted verification platform. \
         Searches a dedicated fact-checking database to determine whether the claim has been \
         verified or debunked. Returns the status (TRUE/FALSE/UNVERIFIED), the sources that \
         verified it, supporting URLs and a confidence level."
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::new()
            .with_properties(json!({
                "claim": {
                    "type": "string",
                    "description": "The claim, news headline, or statement to verify"
                }
            }))
            .with_required(vec!["claim".to_string()])
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let claim = required_str(input, "claim")?;
        let record = lookup(claim);

        tracing::debug!(
            "[verify_on_platform] '{}' -> {}",
            claim,
            record.map(|r| r.key).unwrap_or("UNVERIFIED")
        );

        Ok(ToolResult::success(format_report(record)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_threshold() {
        assert_eq!(lookup("Bleach cures COVID").unwrap().key, "bleach cures covid");
        assert_eq!(
            lookup("Does drinking bleach cure covid?").map(|r| r.key),
            None,
            "'cure' and 'covid?' are not exact terms"
        );
        assert_eq!(
            lookup("the 5g towers are used for mind control").unwrap().key,
            "5g towers mind control"
        );
        // 3 of 6 key terms is below 0.6 * 6
        assert!(lookup("nasa webb telescope news").is_none());
        assert_eq!(
            lookup("NASA webb telescope found carbon dioxide").unwrap().status,
            Verdict::True
        );
        assert!(lookup("the moon is made of cheese").is_none());
    }

    #[test]
    fn test_two_term_minimum() {
        assert!(lookup("covid").is_none());
        assert!(lookup("5g covid").is_some());
    }

    #[tokio::test]
    async fn test_false_report() {
        let result = VerifyOnPlatformTool::new()
            .execute(&json!({"claim": "bleach cures covid"}))
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(result.output.starts_with("PLATFORM VERIFICATION RESULT:\n❌ Status: FALSE\n"));
        assert!(result.output.contains("Verified By: CDC, WHO, FDA"));
        assert!(result.output.contains("\nSources:\n  - https://www.cdc.gov/"));
    }

    #[tokio::test]
    async fn test_report_without_sources() {
        let result = VerifyOnPlatformTool::new()
            .execute(&json!({"claim": "vaccine kidnappers door scam"}))
            .await
            .unwrap();
        assert!(!result.output.contains("Sources:"));
    }

    #[tokio::test]
    async fn test_unverified_report() {
        let result = VerifyOnPlatformTool::new()
            .execute(&json!({"claim": "aliens landed in Ohio"}))
            .await
            .unwrap();
        assert!(result.output.contains("Status: UNVERIFIED"));
        assert!(result.output.ends_with("treat this claim with caution."));
    }
}
