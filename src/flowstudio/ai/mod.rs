//! # AI Diagram Generation
//!
//! A [`DiagramGenerator`] turns a plain-language description into PlantUML
//! text. [`provider::ProviderClient`] calls a chat-completion endpoint;
//! [`canned::CannedGenerator`] answers offline from a small keyword-matched
//! library.
//!
//! [`generate_with_fallback`] is what the host calls. When the provider fails
//! (or AI generation is switched off) it returns a canned diagram instead of an
//! error, and marks the result with [`DiagramSource::Fallback`] so the caller can
//! tell the user why. Setting `features.fallback_on_ai_error = false` turns
//! provider failures back into errors.

use crate::config::FeatureToggles;
use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub mod canned;
pub mod provider;

pub const START_MARKER: &str = "@startuml";
pub const END_MARKER: &str = "@enduml";

pub trait DiagramGenerator {
    /// Produce PlantUML text (`@startuml` .. `@enduml`) for a description.
    fn generate(&self, description: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DiagramSource {
    Provider,
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDiagram {
    pub plantuml: String,
    pub source: DiagramSource,
}

impl GeneratedDiagram {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, DiagramSource::Fallback { .. })
    }
}

/// Cut the `@startuml` .. `@enduml` block out of a model reply.
///
/// Replies often wrap the diagram in a code fence or add prose around it.
pub fn extract_diagram(reply: &str) -> Option<String> {
    let start = reply.find(START_MARKER)?;
    let rest = &reply[start..];
    let end = rest.find(END_MARKER)? + END_MARKER.len();
    Some(rest[..end].to_string())
}

pub fn generate_with_fallback<G>(
    generator: &G,
    features: &FeatureToggles,
    description: &str,
) -> Result<GeneratedDiagram>
where
    G: DiagramGenerator + ?Sized,
{
    let description = description.trim();
    if description.is_empty() {
        return Err(StudioError::Validation(
            "Diagram description cannot be empty".to_string(),
        ));
    }

    if !features.ai_generation {
        info!("AI generation disabled, using canned diagram");
        return Ok(fallback(description, "AI generation is disabled".to_string()));
    }

    match generator.generate(description) {
        Ok(plantuml) => Ok(GeneratedDiagram {
            plantuml,
            source: DiagramSource::Provider,
        }),
        Err(e) if features.fallback_on_ai_error => {
            warn!(error = %e, "diagram generation failed, using canned diagram");
            Ok(fallback(description, e.to_string()))
        }
        Err(e) => Err(e),
    }
}

fn fallback(description: &str, reason: String) -> GeneratedDiagram {
    GeneratedDiagram {
        plantuml: canned::canned_diagram(description).to_string(),
        source: DiagramSource::Fallback { reason },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FailingGenerator {
        calls: Cell<usize>,
    }

    impl DiagramGenerator for FailingGenerator {
        fn generate(&self, _description: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Err(StudioError::HttpStatus {
                status: 503,
                body: "overloaded".to_string(),
            })
        }
    }

    struct FixedGenerator;

    impl DiagramGenerator for FixedGenerator {
        fn generate(&self, _description: &str) -> Result<String> {
            Ok("@startuml\nA -> B\n@enduml".to_string())
        }
    }

    #[test]
    fn test_extract_diagram_strips_fences_and_prose() {
        let reply = "Here you go:\n```plantuml\n@startuml\nA -> B\n@enduml\n```\nEnjoy!";
        assert_eq!(
            extract_diagram(reply).unwrap(),
            "@startuml\nA -> B\n@enduml"
        );
        assert!(extract_diagram("no diagram here").is_none());
        assert!(extract_diagram("@startuml\nunterminated").is_none());
    }

    #[test]
    fn test_provider_result_is_marked() {
        let out = generate_with_fallback(&FixedGenerator, &FeatureToggles::default(), "x").unwrap();
        assert_eq!(out.source, DiagramSource::Provider);
        assert!(!out.is_fallback());
    }

    #[test]
    fn test_failure_falls_back_with_reason() {
        let generator = FailingGenerator { calls: Cell::new(0) };
        let out = generate_with_fallback(&generator, &FeatureToggles::default(), "user login flow")
            .unwrap();

        assert!(out.plantuml.starts_with(START_MARKER));
        assert!(out.plantuml.contains("Auth"));
        match out.source {
            DiagramSource::Fallback { reason } => assert!(reason.contains("503")),
            other => panic!("expected fallback, got {:?}", other),
        }
        // no implicit retry
        assert_eq!(generator.calls.get(), 1);
    }

    #[test]
    fn test_failure_surfaces_when_fallback_disabled() {
        let features = FeatureToggles {
            fallback_on_ai_error: false,
            ..FeatureToggles::default()
        };
        let generator = FailingGenerator { calls: Cell::new(0) };
        let err = generate_with_fallback(&generator, &features, "orders").unwrap_err();
        assert!(matches!(err, StudioError::HttpStatus { status: 503, .. }));
    }

    #[test]
    fn test_disabled_ai_skips_generator() {
        let features = FeatureToggles {
            ai_generation: false,
            ..FeatureToggles::default()
        };
        let generator = FailingGenerator { calls: Cell::new(0) };
        let out = generate_with_fallback(&generator, &features, "class model").unwrap();
        assert!(out.is_fallback());
        assert_eq!(generator.calls.get(), 0);
    }

    #[test]
    fn test_empty_description_is_rejected() {
        let err = generate_with_fallback(&FixedGenerator, &FeatureToggles::default(), "   ")
            .unwrap_err();
        assert!(err.is_validation());
    }
}
