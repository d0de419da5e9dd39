//! Instruction templates sent to the oracle.
//!
//! `{document}` is replaced by the document text. Score-bearing templates ask
//! for a reply that starts with the `Score:` marker so the extractor can find
//! the number.

/// Relevance of the essay to its topic.
pub const RELEVANCE: &str = "Assess how relevant the following essay is to its topic. \
Rate relevance between 0 and 1. \
Begin your reply with 'Score: ' followed by the numeric score, then explain your rating.\n\n\
Essay: {document}";

/// Grammar and use of language.
pub const GRAMMAR: &str = "Assess the grammar and use of language in the following essay. \
Rate grammar between 0 and 1. \
Begin your reply with 'Score: ' followed by the numeric score, then explain your rating.\n\n\
Essay: {document}";

/// Organisation and structure.
pub const STRUCTURE: &str = "Assess the organisation and structure of the following essay. \
Rate structure between 0 and 1. \
Begin your reply with 'Score: ' followed by the numeric score, then explain your rating.\n\n\
Essay: {document}";

/// Depth of analysis.
pub const DEPTH: &str = "Assess the depth of analysis in the following essay. \
Rate depth between 0 and 1. \
Begin your reply with 'Score: ' followed by the numeric score, then explain your rating.\n\n\
Essay: {document}";

/// One category label for the text.
pub const CLASSIFICATION: &str = "Assign the following text to exactly one category: \
News, Blog, Research, or Other. Reply with the category name only.\n\n\
Text: {document}\n\nCategory:";

/// Comma-separated named entities.
pub const ENTITIES: &str = "List every person, organization, and location named in the \
following text. Reply with a comma-separated list only.\n\n\
Text: {document}\n\nEntities:";

/// A one-sentence summary.
pub const SUMMARY: &str = "Summarize the following text in one short sentence.\n\n\
Text: {document}\n\nSummary:";

#[cfg(test)]
mod tests {
    use pipeline::{DOCUMENT_PLACEHOLDER, SCORE_MARKER};

    use super::*;

    #[test]
    fn every_template_embeds_the_document() {
        for template in [RELEVANCE, GRAMMAR, STRUCTURE, DEPTH, CLASSIFICATION, ENTITIES, SUMMARY] {
            assert!(template.contains(DOCUMENT_PLACEHOLDER), "{template}");
        }
    }

    #[test]
    fn score_templates_request_the_marker() {
        for template in [RELEVANCE, GRAMMAR, STRUCTURE, DEPTH] {
            assert!(template.contains(&format!("'{SCORE_MARKER} '")), "{template}");
        }
    }
}
