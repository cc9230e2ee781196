//! Static operation catalog.
//!
//! Every remote action the tools know about is an enum variant, and each
//! variant maps to exactly one [`Descriptor`] through an exhaustive `match`.

use anyhow::{Result, bail};

use crate::gh::ApiRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Patch,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub method: Method,
    /// Endpoint with a `{repo}` placeholder.
    pub endpoint: &'static str,
    /// JSON request body, sent on stdin.
    pub body: Option<&'static str>,
    pub paginated: bool,
    pub description: &'static str,
}

impl Descriptor {
    pub fn endpoint_for(&self, repo: &str) -> String {
        self.endpoint.replace("{repo}", repo)
    }

    pub fn request(&self, repo: &str) -> ApiRequest {
        ApiRequest {
            method: self.method,
            endpoint: self.endpoint_for(repo),
            body: self.body.map(str::to_string),
            paginate: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentType {
    Sbom,
    Dependabot,
    Codeql,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [Self::Sbom, Self::Dependabot, Self::Codeql];

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn descriptor(self) -> Descriptor {
        match self {
            Self::Sbom => Descriptor {
                name: "sbom",
                method: Method::Get,
                endpoint: "/repos/{repo}/dependency-graph/sbom",
                body: None,
                paginated: false,
                description: "SPDX software bill of materials",
            },
            Self::Dependabot => Descriptor {
                name: "dependabot",
                method: Method::Get,
                endpoint: "/repos/{repo}/dependabot/alerts?per_page=100&state=open",
                body: None,
                paginated: true,
                description: "Open Dependabot alerts",
            },
            Self::Codeql => Descriptor {
                name: "codeql",
                method: Method::Get,
                endpoint: "/repos/{repo}/code-scanning/alerts?per_page=100&state=open",
                body: None,
                paginated: true,
                description: "Open CodeQL code scanning alerts",
            },
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        for candidate in Self::ALL {
            if value.eq_ignore_ascii_case(candidate.name()) {
                return Ok(candidate);
            }
        }
        bail!("unsupported content type: {value} (expected sbom|dependabot|codeql)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    AdvancedSecurity,
    Codeql,
    DependabotAlerts,
    DependabotUpdates,
    SecretScanning,
    SecretPushProtection,
}

impl Feature {
    /// Enablement order. `AdvancedSecurity` must come first.
    pub const ENABLE_ORDER: [Feature; 6] = [
        Self::AdvancedSecurity,
        Self::Codeql,
        Self::DependabotAlerts,
        Self::DependabotUpdates,
        Self::SecretScanning,
        Self::SecretPushProtection,
    ];

    pub const PREREQUISITE: Feature = Self::AdvancedSecurity;

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Features that cannot be enabled without the GHAS license.
    pub fn requires_prerequisite(self) -> bool {
        matches!(
            self,
            Self::Codeql | Self::SecretScanning | Self::SecretPushProtection
        )
    }

    pub fn descriptor(self) -> Descriptor {
        match self {
            Self::AdvancedSecurity => Descriptor {
                name: "advanced_security",
                method: Method::Patch,
                endpoint: "/repos/{repo}",
                body: Some(
                    r#"{"security_and_analysis":{"advanced_security":{"status":"enabled"}}}"#,
                ),
                paginated: false,
                description: "GHAS license (required for CodeQL & secret scanning)",
            },
            Self::Codeql => Descriptor {
                name: "codeql",
                method: Method::Patch,
                endpoint: "/repos/{repo}/code-scanning/default-setup",
                body: Some(r#"{"state":"configured","query_suite":"default"}"#),
                paginated: false,
                description: "CodeQL code scanning (default setup)",
            },
            Self::DependabotAlerts => Descriptor {
                name: "dependabot_alerts",
                method: Method::Put,
                endpoint: "/repos/{repo}/vulnerability-alerts",
                body: None,
                paginated: false,
                description: "Dependabot vulnerability alerts",
            },
            Self::DependabotUpdates => Descriptor {
                name: "dependabot_updates",
                method: Method::Put,
                endpoint: "/repos/{repo}/automated-security-fixes",
                body: None,
                paginated: false,
                description: "Dependabot automated security fixes",
            },
            Self::SecretScanning => Descriptor {
                name: "secret_scanning",
                method: Method::Patch,
                endpoint: "/repos/{repo}",
                body: Some(r#"{"security_and_analysis":{"secret_scanning":{"status":"enabled"}}}"#),
                paginated: false,
                description: "Secret scanning",
            },
            Self::SecretPushProtection => Descriptor {
                name: "secret_push_protection",
                method: Method::Patch,
                endpoint: "/repos/{repo}",
                body: Some(
                    r#"{"security_and_analysis":{"secret_scanning_push_protection":{"status":"enabled"}}}"#,
                ),
                paginated: false,
                description: "Secret scanning push protection",
            },
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        for candidate in Self::ENABLE_ORDER {
            if value.eq_ignore_ascii_case(candidate.name()) {
                return Ok(candidate);
            }
        }
        bail!(
            "unsupported feature: {value} (expected one of {})",
            Self::ENABLE_ORDER
                .iter()
                .map(|feature| feature.name())
                .collect::<Vec<_>>()
                .join("|")
        )
    }

    /// Reorder a selection to follow `ENABLE_ORDER`, dropping duplicates.
    pub fn in_enable_order(selected: &[Feature]) -> Vec<Feature> {
        Self::ENABLE_ORDER
            .into_iter()
            .filter(|feature| selected.contains(feature))
            .collect()
    }
}
