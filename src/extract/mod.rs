//! Response parsing and profile extraction
//!
//! Turns one raw model response into a short summary, a detailed analysis,
//! a complete [`ExtractedProfile`] and a [`PeerComparisonTable`].
//!
//! # Pipeline
//!
//! 1. **sections**: split on the literal separator into up to three parts
//! 2. **candidates**: in the analysis part, find the JSON object sharing the
//!    most keys with the field schema and remove it from the prose
//! 3. **narrative**: when no object is found, let registered recognizers
//!    pre-fill fields from the prose
//! 4. **normalize**: expand whatever was found into a full profile
//! 5. **peer**: parse the last part as JSON, `{}` on failure
//!
//! Nothing here fails: malformed output degrades to placeholders and the
//! raw text.
//!
//! Everything is a pure function of its input, so the extractor can be
//! shared freely across tasks.

mod candidates;
mod narrative;
mod peer;
mod sections;

pub use candidates::{find_best_json, json_candidates, schema_score, BestJson, JsonCandidate};
pub use narrative::{KeywordRecognizer, NarrativeRecognizer, NarrativeRegistry};
pub use peer::PeerComparisonTable;
pub use sections::{split_sections, SectionSet, SECTION_SEPARATOR};

use crate::profile::{normalize_profile, ExtractedProfile};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// The composite summary stored alongside a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub short_summary: String,
    pub detailed_analysis_summary: String,
}

/// Everything parsed out of one model response
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub summary: AnalysisSummary,
    pub profile: ExtractedProfile,
    pub peer_comparison: PeerComparisonTable,
}

/// Newline, any run of whitespace, newline.
///
/// `regex-lite` treats `\s` as ASCII whitespace, so the Unicode whitespace
/// characters are listed explicitly.
const BLANK_LINE_PATTERN: &str = concat!(
    r"\n[\s\x{1c}-\x{1f}\x{85}\x{a0}\x{1680}\x{2000}-\x{200a}",
    r"\x{2028}\x{2029}\x{202f}\x{205f}\x{3000}]*\n"
);

fn blank_line_runs() -> &'static Regex {
    static BLANK_LINE_RUNS: OnceLock<Regex> = OnceLock::new();
    BLANK_LINE_RUNS
        .get_or_init(|| Regex::new(BLANK_LINE_PATTERN).expect("blank-line pattern is valid"))
}

/// Remove every occurrence of `matched`, trim, and collapse blank-line runs.
fn strip_matched(section: &str, matched: &str) -> String {
    let without = section.replace(matched, "");
    blank_line_runs()
        .replace_all(without.trim(), "\n\n")
        .into_owned()
}

/// Extraction pipeline configured with a set of narrative recognizers
pub struct ProfileExtractor {
    recognizers: NarrativeRegistry,
}

impl Default for ProfileExtractor {
    fn default() -> Self {
        Self::new(NarrativeRegistry::builtin())
    }
}

impl ProfileExtractor {
    pub fn new(recognizers: NarrativeRegistry) -> Self {
        Self { recognizers }
    }

    pub fn recognizers(&self) -> &NarrativeRegistry {
        &self.recognizers
    }

    /// Split one analysis section into its prose summary and a full profile.
    pub fn extract_analysis(&self, section: &str) -> (String, ExtractedProfile) {
        let best = find_best_json(section);

        let (summary, raw) = match best.matched {
            Some(matched) => (strip_matched(section, &matched), best.object),
            None => {
                tracing::debug!("no structured data found, using narrative fallback");
                (section.to_string(), self.recognizers.recognize(section))
            }
        };

        (summary, normalize_profile(&raw))
    }

    /// Parse a complete model response.
    pub fn parse_output(&self, raw: &str) -> ParsedOutput {
        let sections = SectionSet::split(raw);
        if sections.len() < 3 {
            tracing::warn!(
                sections = sections.len(),
                "model output has fewer sections than expected"
            );
        }

        let (detailed, profile) = self.extract_analysis(sections.analysis());
        let peer_comparison = PeerComparisonTable::parse(sections.peer_comparison());

        ParsedOutput {
            summary: AnalysisSummary {
                short_summary: sections.short_summary().to_string(),
                detailed_analysis_summary: detailed,
            },
            profile,
            peer_comparison,
        }
    }
}

/// [`ProfileExtractor::extract_analysis`] with the built-in recognizers
pub fn extract_analysis_and_profile(section: &str) -> (String, ExtractedProfile) {
    ProfileExtractor::default().extract_analysis(section)
}

/// Parse a raw response into its summary object and profile
pub fn extract_sections_and_profile(raw: &str) -> (AnalysisSummary, ExtractedProfile) {
    let parsed = ProfileExtractor::default().parse_output(raw);
    (parsed.summary, parsed.profile)
}

/// [`ProfileExtractor::parse_output`] with the built-in recognizers
pub fn parse_model_output(raw: &str) -> ParsedOutput {
    ProfileExtractor::default().parse_output(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::PLACEHOLDER;

    #[test]
    fn json_is_removed_from_the_summary() {
        let section = "Strong team.\n\n{\"company_name\": \"Acme\"}\n\n\n   \nWeak moat.";
        let (summary, profile) = extract_analysis_and_profile(section);
        assert_eq!(summary, "Strong team.\n\nWeak moat.");
        assert_eq!(profile.get("company_name"), Some("Acme"));
    }

    #[test]
    fn every_occurrence_of_the_match_is_removed() {
        let obj = r#"{"industry": "tech"}"#;
        let section = format!("a {obj} b {obj} c");
        let (summary, _) = extract_analysis_and_profile(&section);
        assert_eq!(summary, "a  b  c");
    }

    #[test]
    fn unicode_whitespace_blank_lines_collapse() {
        let obj = r#"{"industry": "tech"}"#;
        let section = format!("Intro\n\u{a0}\u{3000}\n{obj}\n\u{2003}\n\nOutro");
        let (summary, _) = extract_analysis_and_profile(&section);
        assert_eq!(summary, "Intro\n\nOutro");
    }

    #[test]
    fn narrative_fallback_keeps_full_text() {
        let text = "Reddit grew its ad revenue.";
        let (summary, profile) = extract_analysis_and_profile(text);
        assert_eq!(summary, text);
        assert_eq!(profile.get("company_name"), Some("Reddit"));
        assert_eq!(profile.get("valuation"), Some(PLACEHOLDER));
    }

    #[test]
    fn no_json_and_no_recognizer_gives_placeholder_profile() {
        let extractor = ProfileExtractor::new(NarrativeRegistry::empty());
        let (summary, profile) = extractor.extract_analysis("Nothing structured.");
        assert_eq!(summary, "Nothing structured.");
        assert_eq!(profile, ExtractedProfile::placeholder());
    }

    #[test]
    fn empty_input_degrades_quietly() {
        let parsed = parse_model_output("");
        assert_eq!(parsed.summary, AnalysisSummary::default());
        assert_eq!(parsed.profile, ExtractedProfile::placeholder());
        assert!(parsed.peer_comparison.is_empty());
    }

    #[test]
    fn two_sections_leave_peer_table_empty() {
        let raw = format!("Short.\n{SECTION_SEPARATOR}\n{{\"industry\": \"ai\"}}");
        let parsed = parse_model_output(&raw);
        assert_eq!(parsed.summary.short_summary, "Short.");
        assert_eq!(parsed.summary.detailed_analysis_summary, "");
        assert_eq!(parsed.profile.get("industry"), Some("ai"));
        assert!(parsed.peer_comparison.is_empty());
    }
}
