//! Line-oriented Gherkin splitter.
//!
//! This is deliberately not a Gherkin grammar: it only finds `Feature:` and
//! `Scenario:` / `Scenario Outline:` markers at line starts and slices the text
//! between them, keeping every block verbatim.

mod document;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

pub use document::*;

use crate::error::{ParseError, Result};
use crate::models::{Feature, Scenario};

const FEATURE_KEYWORD: &str = "Feature:";

static FEATURE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Feature:").expect("valid feature marker regex"));

static SCENARIO_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*Scenario(?:[ \t]+Outline)?[ \t]*:[ \t]*")
        .expect("valid scenario marker regex")
});

/// Split a document into features and their scenarios.
///
/// Text before the first `Feature:` marker is dropped. Empty input fails with
/// [`ParseError::Empty`]; input without any non-empty feature block fails with
/// [`ParseError::NoFeatures`].
pub fn parse(text: &str) -> Result<Vec<Feature>, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let starts: Vec<usize> = FEATURE_MARKER
        .find_iter(text)
        .map(|m| m.end() - FEATURE_KEYWORD.len())
        .collect();

    let mut features = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        let block = text[start..end].trim_end();
        let body = &block[FEATURE_KEYWORD.len()..];
        if body.trim().is_empty() {
            continue;
        }

        let name = first_line_name(body)
            .unwrap_or_else(|| format!("Feature_{}", features.len() + 1));
        let scenarios = parse_scenarios(block);

        features.push(Feature {
            name,
            raw_content: block.to_string(),
            scenarios,
        });
    }

    if features.is_empty() {
        return Err(ParseError::NoFeatures);
    }

    tracing::debug!(
        features = features.len(),
        scenarios = features.iter().map(|f| f.scenarios.len()).sum::<usize>(),
        "parsed gherkin document"
    );
    Ok(features)
}

/// Read a `.feature` file, or a folder of them, and parse it.
///
/// The [`Document`] is returned alongside the features so callers can derive
/// the root label from the folder name.
pub fn parse_file(path: &Path) -> Result<(Document, Vec<Feature>)> {
    let document = read_document(path)?;
    let features = parse(&document.text)?;
    Ok((document, features))
}

/// Slice a feature block into scenarios. The preamble before the first
/// scenario marker (description, Background) is not a scenario.
fn parse_scenarios(block: &str) -> Vec<Scenario> {
    let markers: Vec<(usize, usize)> = SCENARIO_MARKER
        .find_iter(block)
        .filter(|m| m.start() > 0)
        .map(|m| (m.start(), m.end()))
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, &(_, body_start))| {
            let end = markers.get(i + 1).map(|&(s, _)| s).unwrap_or(block.len());
            let part = block[body_start..end].trim_end();
            match first_line_name(part) {
                Some(name) => Scenario {
                    name,
                    raw_content: format!("Scenario: {}", part),
                },
                None => Scenario {
                    name: format!("Scenario_{}", i + 1),
                    raw_content: format!("Scenario:{}", part),
                },
            }
        })
        .collect()
}

fn first_line_name(body: &str) -> Option<String> {
    let name = body.lines().next().unwrap_or_default().trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_feature_with_scenario() {
        let features = parse(
            "Feature: Login\nScenario: Valid password\nGiven a user\nWhen they log in\nThen access is granted",
        )
        .unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].name, "Login");
        assert_eq!(features[0].scenarios.len(), 1);
        assert_eq!(features[0].scenarios[0].name, "Valid password");
        assert_eq!(
            features[0].scenarios[0].raw_content,
            "Scenario: Valid password\nGiven a user\nWhen they log in\nThen access is granted"
        );
    }

    #[test]
    fn test_indented_outline_is_normalized() {
        let features = parse(
            "Feature: Search\n  Background:\n    Given an index\n\n  Scenario Outline: By term\n    When I search <term>\n",
        )
        .unwrap();

        let scenario = &features[0].scenarios[0];
        assert_eq!(scenario.name, "By term");
        assert_eq!(scenario.raw_content, "Scenario: By term\n    When I search <term>");
        assert!(features[0].raw_content.contains("Background:"));
    }

    #[test]
    fn test_fallback_names() {
        let features = parse("Feature:\n  Scenario:\n    Given nothing\n").unwrap();

        assert_eq!(features[0].name, "Feature_1");
        assert_eq!(features[0].scenarios[0].name, "Scenario_1");
        assert_eq!(
            features[0].scenarios[0].raw_content,
            "Scenario:\n    Given nothing"
        );
    }

    #[test]
    fn test_preamble_before_first_feature_is_dropped() {
        let features = parse("# language: en\n@smoke\nFeature: Tagged\n").unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].raw_content, "Feature: Tagged");
    }

    #[test]
    fn test_marker_mid_line_is_not_a_feature() {
        let features =
            parse("Feature: Notes\n  Scenario: Quote\n    Given the text \"Feature: x\"\n").unwrap();

        assert_eq!(features.len(), 1);
        assert_eq!(features[0].scenarios.len(), 1);
    }

    #[test]
    fn test_empty_and_markerless_input() {
        assert_eq!(parse("   \n\t"), Err(ParseError::Empty));
        assert_eq!(parse("just some prose"), Err(ParseError::NoFeatures));
        assert_eq!(parse("Feature:   \n"), Err(ParseError::NoFeatures));
    }
}
