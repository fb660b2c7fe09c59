//! Plain-text presentation of an identified species.

use crate::models::SpeciesRecord;
use std::fmt::Write as _;

/// IUCN category inferred from the free-text conservation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConservationStatus {
    CriticallyEndangered,
    Endangered,
    Vulnerable,
    NearThreatened,
    LeastConcern,
    Other,
}

impl ConservationStatus {
    /// Checked most-severe first: "critically endangered" also contains "endangered".
    pub fn classify(status: &str) -> Self {
        let lower = status.to_lowercase();
        if lower.contains("critically endangered") {
            Self::CriticallyEndangered
        } else if lower.contains("endangered") {
            Self::Endangered
        } else if lower.contains("vulnerable") {
            Self::Vulnerable
        } else if lower.contains("near threatened") {
            Self::NearThreatened
        } else if lower.contains("least concern") {
            Self::LeastConcern
        } else {
            Self::Other
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Self::CriticallyEndangered => "[!!!]",
            Self::Endangered => "[!!]",
            Self::Vulnerable => "[!]",
            Self::NearThreatened => "[~]",
            Self::LeastConcern => "[ok]",
            Self::Other => "[?]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KingdomGroup {
    Animal,
    Plant,
    Fungus,
    Microbe,
    Other,
}

impl KingdomGroup {
    pub fn classify(kingdom: &str) -> Self {
        let lower = kingdom.to_lowercase();
        if lower.contains("animalia") {
            Self::Animal
        } else if lower.contains("plantae") {
            Self::Plant
        } else if lower.contains("fungi") {
            Self::Fungus
        } else if lower.contains("bacteria") || lower.contains("archaea") {
            Self::Microbe
        } else {
            Self::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Animal => "animal",
            Self::Plant => "plant",
            Self::Fungus => "fungus",
            Self::Microbe => "microbe",
            Self::Other => "organism",
        }
    }
}

fn panel(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "\n== {} ==\n{}", title, body);
}

/// Render every panel of `record`; optional panels appear only when present.
pub fn render_record(record: &SpeciesRecord) -> String {
    let mut out = String::new();
    let group = KingdomGroup::classify(&record.taxonomy.kingdom);
    let _ = writeln!(
        out,
        "{} ({}) - {}",
        record.common_name,
        record.scientific_name,
        group.label()
    );

    let mut taxonomy = String::new();
    for (rank, value) in record.taxonomy.ranks() {
        let _ = writeln!(taxonomy, "  {:<8} {}", rank, value);
    }
    panel(&mut out, "Taxonomy", taxonomy.trim_end());

    panel(&mut out, "Habitat", &record.habitat);
    panel(&mut out, "Diet", &record.diet);
    panel(&mut out, "Behavior", &record.behavior);

    let status = ConservationStatus::classify(&record.conservation_status);
    panel(
        &mut out,
        "Conservation Status",
        &format!("{} {}", status.marker(), record.conservation_status),
    );

    let optional = [
        ("Evolution", &record.evolution),
        ("Physical Characteristics", &record.physical_characteristics),
        ("Reproduction", &record.reproduction),
        ("Ecological Role", &record.ecological_role),
        ("Threats", &record.threats),
        ("Human Interaction", &record.human_interaction),
    ];
    for (title, value) in optional {
        if let Some(value) = value {
            panel(&mut out, title, value);
        }
    }

    panel(&mut out, "Fun Fact", &record.fun_fact);
    out
}
