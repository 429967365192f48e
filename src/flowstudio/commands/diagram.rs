use crate::ai::{DiagramGenerator, DiagramSource, generate_with_fallback};
use crate::commands::{CmdMessage, CmdResult, RenderedDiagram};
use crate::config::StudioConfig;
use crate::encoder::{self, DiagramFormat};
use crate::error::{Result, StudioError};
use crate::markdown::diagram_blocks;
use crate::store::DocumentStore;

fn rendered(index: usize, text: &str, server: Option<&str>, format: DiagramFormat) -> RenderedDiagram {
    let token = encoder::encode(text);
    let url = server.map(|s| encoder::token_url(s, &token, format));
    RenderedDiagram { index, token, url }
}

/// Token (and URL, when a server is given) for standalone diagram text.
pub fn encode(text: &str, server: Option<&str>, format: DiagramFormat) -> Result<CmdResult> {
    Ok(CmdResult::default().with_diagrams(vec![rendered(0, text, server, format)]))
}

/// Recover diagram text from a token or a full render URL.
pub fn decode(token_or_url: &str) -> Result<CmdResult> {
    let token = token_or_url
        .trim()
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let text = encoder::decode(token).map_err(|e| StudioError::Validation(e.to_string()))?;
    Ok(CmdResult::default().with_text(text))
}

/// One rendered diagram per PlantUML block in a stored document.
pub fn document<S: DocumentStore>(
    store: &S,
    name: &str,
    server: Option<&str>,
    format: DiagramFormat,
) -> Result<CmdResult> {
    let doc = store.load_document(name)?;
    let diagrams: Vec<RenderedDiagram> = diagram_blocks(&doc.content)
        .iter()
        .map(|block| rendered(block.index, &block.source, server, format))
        .collect();

    let mut result = CmdResult::default();
    if diagrams.is_empty() {
        result.add_message(CmdMessage::info(format!("{} has no diagram blocks.", name)));
    }
    Ok(result.with_diagrams(diagrams))
}

/// Ask the generator for a diagram, falling back per the feature toggles.
pub fn generate<G>(generator: &G, config: &StudioConfig, description: &str) -> Result<CmdResult>
where
    G: DiagramGenerator + ?Sized,
{
    let generated = generate_with_fallback(generator, &config.features, description)?;
    let server = config
        .features
        .diagram_preview
        .then_some(config.plantuml_server.as_str());
    let diagram = rendered(0, &generated.plantuml, server, DiagramFormat::Svg);

    let mut result = CmdResult::default().with_diagrams(vec![diagram]);
    if let DiagramSource::Fallback { reason } = &generated.source {
        result.add_message(CmdMessage::warning(format!(
            "Showing a sample diagram: {}",
            reason
        )));
    }
    result.generated = Some(generated);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::canned::CannedGenerator;
    use crate::encoder::DEFAULT_SERVER;
    use crate::store::memory::fixtures::StoreFixture;

    const DOC: &str = "# Flow\n\n```plantuml\n@startuml\nA -> B\n@enduml\n```\n\n```puml\n@startuml\nB -> C\n@enduml\n```\n";

    #[test]
    fn test_encode_with_and_without_server() {
        let with = encode("@startuml\nA -> B\n@enduml", Some(DEFAULT_SERVER), DiagramFormat::Png).unwrap();
        let url = with.diagrams[0].url.as_ref().unwrap();
        assert!(url.starts_with("https://www.plantuml.com/plantuml/png/"));
        assert!(url.ends_with(&with.diagrams[0].token));

        let without = encode("@startuml\n@enduml", None, DiagramFormat::Svg).unwrap();
        assert!(without.diagrams[0].url.is_none());
    }

    #[test]
    fn test_decode_accepts_url_or_token() {
        let text = "@startuml\nAlice -> Bob\n@enduml";
        let token = encoder::encode(text);
        let url = encoder::token_url(DEFAULT_SERVER, &token, DiagramFormat::Svg);

        assert_eq!(decode(&token).unwrap().text.unwrap(), text);
        assert_eq!(decode(&url).unwrap().text.unwrap(), text);
        assert!(decode("not a token!").unwrap_err().is_validation());
    }

    #[test]
    fn test_document_diagrams() {
        let fixture = StoreFixture::new().with_document("flow", DOC);
        let res = document(&fixture.store, "flow", Some(DEFAULT_SERVER), DiagramFormat::Svg).unwrap();
        assert_eq!(res.diagrams.len(), 2);
        assert_eq!(res.diagrams[1].index, 2);
        assert_eq!(
            encoder::decode(&res.diagrams[0].token).unwrap(),
            "@startuml\nA -> B\n@enduml"
        );
    }

    #[test]
    fn test_document_without_diagrams() {
        let fixture = StoreFixture::new().with_document("plain", "# Just text");
        let res = document(&fixture.store, "plain", None, DiagramFormat::Svg).unwrap();
        assert!(res.diagrams.is_empty());
        assert_eq!(res.messages.len(), 1);
    }

    #[test]
    fn test_generate_respects_preview_toggle() {
        let mut config = StudioConfig::default();
        let res = generate(&CannedGenerator, &config, "login").unwrap();
        assert!(res.diagrams[0].url.is_some());
        assert!(!res.generated.unwrap().is_fallback());

        config.features.diagram_preview = false;
        let res = generate(&CannedGenerator, &config, "login").unwrap();
        assert!(res.diagrams[0].url.is_none());
    }

    #[test]
    fn test_generate_warns_on_fallback() {
        let mut config = StudioConfig::default();
        config.features.ai_generation = false;
        let res = generate(&CannedGenerator, &config, "orders").unwrap();
        assert!(res.generated.unwrap().is_fallback());
        assert_eq!(res.messages.len(), 1);
    }
}
