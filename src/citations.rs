//! # Answer Citation Parsing Module
//!
//! ## Purpose
//! Extracts citation markers from generated chat answers. The generation
//! backend embeds bracket-delimited source references (`[handbook.pdf]`)
//! in its output; this module finds the candidates and validates each one
//! against the source identifiers actually present in the response's
//! supporting context.
//!
//! ## Input/Output Specification
//! - **Input**: Generated answer text, recorded source identifiers
//! - **Output**: Ordered answer fragments (text runs and validated citation
//!   markers) plus the deduplicated citation list
//! - **Validation**: A candidate is only treated as a real citation if it
//!   is a prefix of one of the recorded source identifiers
//!
//! ## Key Features
//! - Bracket-marker extraction with a precompiled expression
//! - Prefix validation against the response context
//! - Stable 1-based citation numbering, first appearance wins
//! - Unrecognized bracket text is preserved as plain text

use crate::errors::{ResolverError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Parsed representation of a generated answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAnswer {
    /// Text runs and citation markers, in answer order
    pub fragments: Vec<AnswerFragment>,
    /// Unique validated citation tokens, in order of first appearance
    pub citations: Vec<String>,
}

/// One run of a parsed answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnswerFragment {
    /// Plain answer text (including any bracket text that failed validation)
    Text {
        /// The literal text run
        content: String,
    },
    /// A validated citation marker
    Citation {
        /// The citation token, resolvable via the strategy engine
        token: String,
        /// 1-based display number, stable across repeat references
        index: usize,
    },
}

/// Answer parser with its precompiled marker expression
pub struct CitationParser {
    marker: Regex,
}

impl CitationParser {
    /// Create a parser
    pub fn new() -> Result<Self> {
        let marker = Regex::new(r"\[([^\[\]]+)\]").map_err(|e| ResolverError::Internal {
            message: format!("Failed to compile citation marker expression: {}", e),
        })?;
        Ok(Self { marker })
    }

    /// Parse a generated answer into fragments and its citation list.
    ///
    /// Bracket-delimited candidates that are not a prefix of any recorded
    /// source identifier are left in the surrounding text untouched.
    pub fn parse(&self, answer: &str, source_identifiers: &[String]) -> ParsedAnswer {
        let mut fragments = Vec::new();
        let mut citations: Vec<String> = Vec::new();
        let mut cursor = 0;

        for caps in self.marker.captures_iter(answer) {
            let (Some(marker), Some(token)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let candidate = token.as_str();
            if !is_recorded_source(candidate, source_identifiers) {
                continue;
            }

            if marker.start() > cursor {
                fragments.push(AnswerFragment::Text {
                    content: answer[cursor..marker.start()].to_string(),
                });
            }

            let index = match citations.iter().position(|c| c == candidate) {
                Some(existing) => existing + 1,
                None => {
                    citations.push(candidate.to_string());
                    citations.len()
                }
            };
            fragments.push(AnswerFragment::Citation {
                token: candidate.to_string(),
                index,
            });
            cursor = marker.end();
        }

        if cursor < answer.len() {
            fragments.push(AnswerFragment::Text {
                content: answer[cursor..].to_string(),
            });
        }

        ParsedAnswer {
            fragments,
            citations,
        }
    }
}

/// A candidate is real only if it is a prefix of a recorded source identifier
fn is_recorded_source(candidate: &str, source_identifiers: &[String]) -> bool {
    !candidate.trim().is_empty()
        && source_identifiers
            .iter()
            .any(|source| source.starts_with(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extracts_validated_citations() {
        let parser = CitationParser::new().unwrap();
        let parsed = parser.parse(
            "Per the handbook [handbook.pdf], PTO accrues monthly [policy.docx].",
            &sources(&["handbook.pdf", "policy.docx"]),
        );

        assert_eq!(parsed.citations, vec!["handbook.pdf", "policy.docx"]);
        assert_eq!(
            parsed.fragments,
            vec![
                AnswerFragment::Text {
                    content: "Per the handbook ".to_string()
                },
                AnswerFragment::Citation {
                    token: "handbook.pdf".to_string(),
                    index: 1
                },
                AnswerFragment::Text {
                    content: ", PTO accrues monthly ".to_string()
                },
                AnswerFragment::Citation {
                    token: "policy.docx".to_string(),
                    index: 2
                },
                AnswerFragment::Text {
                    content: ".".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_unrecognized_brackets_stay_as_text() {
        let parser = CitationParser::new().unwrap();
        let parsed = parser.parse(
            "This claim [citation needed] comes from [handbook.pdf].",
            &sources(&["handbook.pdf"]),
        );

        assert_eq!(parsed.citations, vec!["handbook.pdf"]);
        assert_eq!(
            parsed.fragments[0],
            AnswerFragment::Text {
                content: "This claim [citation needed] comes from ".to_string()
            }
        );
    }

    #[test]
    fn test_repeat_citations_keep_their_number() {
        let parser = CitationParser::new().unwrap();
        let parsed = parser.parse(
            "[a.pdf] then [b.pdf] then [a.pdf] again",
            &sources(&["a.pdf", "b.pdf"]),
        );

        assert_eq!(parsed.citations, vec!["a.pdf", "b.pdf"]);
        let indices: Vec<usize> = parsed
            .fragments
            .iter()
            .filter_map(|f| match f {
                AnswerFragment::Citation { index, .. } => Some(*index),
                AnswerFragment::Text { .. } => None,
            })
            .collect();
        assert_eq!(indices, vec![1, 2, 1]);
    }

    #[test]
    fn test_prefix_rule_accepts_truncated_identifier() {
        let parser = CitationParser::new().unwrap();
        let parsed = parser.parse(
            "See [report.pdf] for details.",
            &sources(&["report.pdf#page=4"]),
        );

        assert_eq!(parsed.citations, vec!["report.pdf"]);
    }

    #[test]
    fn test_no_sources_means_no_citations() {
        let parser = CitationParser::new().unwrap();
        let parsed = parser.parse("All text [handbook.pdf] here.", &[]);

        assert!(parsed.citations.is_empty());
        assert_eq!(
            parsed.fragments,
            vec![AnswerFragment::Text {
                content: "All text [handbook.pdf] here.".to_string()
            }]
        );
    }

    #[test]
    fn test_answer_without_markers() {
        let parser = CitationParser::new().unwrap();
        let parsed = parser.parse("No citations here.", &sources(&["handbook.pdf"]));

        assert!(parsed.citations.is_empty());
        assert_eq!(parsed.fragments.len(), 1);
    }

    #[test]
    fn test_adjacent_markers() {
        let parser = CitationParser::new().unwrap();
        let parsed = parser.parse("[a.pdf][b.pdf]", &sources(&["a.pdf", "b.pdf"]));

        assert_eq!(parsed.citations, vec!["a.pdf", "b.pdf"]);
        assert_eq!(parsed.fragments.len(), 2);
    }
}
