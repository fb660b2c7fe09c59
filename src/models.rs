//! Data models and structures
//!
//! Defines the identification request/response shapes exchanged with the
//! browser and the configuration read from the environment.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MISSING_INPUT_MESSAGE: &str = "Either image or speciesName is required";
pub const UNDETERMINED: &str = "Unable to determine";
pub const UNKNOWN_RANK: &str = "Unknown";

/// Input to one identification: an image data URL, a species name, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species_name: Option<String>,
}

/// What a single identification asks the model about.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeciesQuery {
    Image(String),
    Name(String),
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl IdentificationRequest {
    /// Build a request, refusing one that carries neither an image nor a name.
    pub fn new(image: Option<String>, species_name: Option<String>) -> Result<Self> {
        let request = Self {
            image,
            species_name,
        };
        request.query()?;
        Ok(request)
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            image: None,
            species_name: Some(name.into()),
        }
    }

    pub fn by_image(data_url: impl Into<String>) -> Self {
        Self {
            image: Some(data_url.into()),
            species_name: None,
        }
    }

    /// Resolve the query mode. The image wins when both are supplied.
    pub fn query(&self) -> Result<SpeciesQuery> {
        if let Some(image) = non_blank(self.image.as_deref()) {
            return Ok(SpeciesQuery::Image(image.to_string()));
        }
        if let Some(name) = non_blank(self.species_name.as_deref()) {
            return Ok(SpeciesQuery::Name(name.to_string()));
        }
        Err(Error::InvalidInput(MISSING_INPUT_MESSAGE.to_string()))
    }
}

/// The seven fixed Linnaean ranks, serialized in rank order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Taxonomy {
    pub kingdom: String,
    pub phylum: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub order: String,
    pub family: String,
    pub genus: String,
    pub species: String,
}

impl Taxonomy {
    pub fn unknown() -> Self {
        Self {
            kingdom: UNKNOWN_RANK.to_string(),
            phylum: UNKNOWN_RANK.to_string(),
            class_name: UNKNOWN_RANK.to_string(),
            order: UNKNOWN_RANK.to_string(),
            family: UNKNOWN_RANK.to_string(),
            genus: UNKNOWN_RANK.to_string(),
            species: UNKNOWN_RANK.to_string(),
        }
    }

    /// `(rank, value)` pairs from kingdom down to species.
    pub fn ranks(&self) -> [(&'static str, &str); 7] {
        [
            ("kingdom", &self.kingdom),
            ("phylum", &self.phylum),
            ("class", &self.class_name),
            ("order", &self.order),
            ("family", &self.family),
            ("genus", &self.genus),
            ("species", &self.species),
        ]
    }
}

/// Normalized result of an identification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesRecord {
    pub common_name: String,
    pub scientific_name: String,
    pub taxonomy: Taxonomy,
    pub habitat: String,
    pub diet: String,
    pub behavior: String,
    pub conservation_status: String,
    pub fun_fact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_characteristics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reproduction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecological_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threats: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_interaction: Option<String>,
    /// Keys the model added beyond the schema, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Wire names of the optional descriptive fields.
pub const OPTIONAL_FIELDS: [&str; 6] = [
    "evolution",
    "physicalCharacteristics",
    "reproduction",
    "ecologicalRole",
    "threats",
    "humanInteraction",
];

pub const FALLBACK_COMMON_NAME: &str = "Unknown Species";
pub const FALLBACK_SCIENTIFIC_NAME: &str = "Species unknown";
pub const FALLBACK_FUN_FACT: &str = "Our AI is still learning about this species!";
const FALLBACK_HABITAT_CHARS: usize = 200;

impl SpeciesRecord {
    /// Placeholder record used when the model reply cannot be understood.
    ///
    /// The habitat carries the start of the raw reply so the user still sees
    /// what the model said.
    pub fn fallback(raw_content: &str) -> Self {
        let habitat = if raw_content.is_empty() {
            UNDETERMINED.to_string()
        } else {
            raw_content.chars().take(FALLBACK_HABITAT_CHARS).collect()
        };
        let undetermined = || Some(UNDETERMINED.to_string());

        Self {
            common_name: FALLBACK_COMMON_NAME.to_string(),
            scientific_name: FALLBACK_SCIENTIFIC_NAME.to_string(),
            taxonomy: Taxonomy::unknown(),
            habitat,
            diet: UNDETERMINED.to_string(),
            behavior: UNDETERMINED.to_string(),
            conservation_status: UNDETERMINED.to_string(),
            fun_fact: FALLBACK_FUN_FACT.to_string(),
            evolution: undetermined(),
            physical_characteristics: undetermined(),
            reproduction: undetermined(),
            ecological_role: undetermined(),
            threats: undetermined(),
            human_interaction: undetermined(),
            extra: serde_json::Map::new(),
        }
    }
}

/// JSON body of every failed response: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_IDENTIFY_URL: &str = "http://localhost:8000";

// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub gateway_url: String,
    pub model: String,
    pub bind_addr: String,
    pub gateway_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gateway_timeout = match lookup("AI_GATEWAY_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    Error::Configuration(format!(
                        "AI_GATEWAY_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        raw
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            api_key: lookup("LOVABLE_API_KEY").filter(|key| !key.trim().is_empty()),
            gateway_url: lookup("AI_GATEWAY_URL")
                .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            model: lookup("AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            gateway_timeout,
        })
    }
}

// Requester configuration
#[derive(Debug, Clone)]
pub struct RequesterConfig {
    pub base_url: String,
    pub anon_key: Option<String>,
}

impl RequesterConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            base_url: lookup("IDENTIFY_URL").unwrap_or_else(|| DEFAULT_IDENTIFY_URL.to_string()),
            anon_key: lookup("SUPABASE_ANON_KEY").filter(|key| !key.trim().is_empty()),
        }
    }
}
