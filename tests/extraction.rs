//! End-to-end parsing of raw model responses
//!
//! Run with: `cargo test --test extraction`

mod common;

use common::{model_response, profile_json};
use serde_json::json;
use startup_analyst::extract::{
    split_sections, KeywordRecognizer, NarrativeRegistry, SectionSet, SECTION_SEPARATOR,
};
use startup_analyst::profile::FIELDS;
use startup_analyst::{
    extract_analysis_and_profile, extract_sections_and_profile, parse_model_output,
    ProfileExtractor, PLACEHOLDER,
};

// ============================================================================
// Section splitting
// ============================================================================

#[test]
fn sections_are_trimmed_and_empty_pieces_dropped() {
    let raw = format!("  one  \n{sep}\n\n{sep}\n two \n{sep}three", sep = SECTION_SEPARATOR);
    assert_eq!(split_sections(&raw), vec!["one", "two", "three"]);

    let sections = SectionSet::split(&raw);
    assert_eq!(sections.len(), 3);
    assert_eq!(sections.short_summary(), "one");
    assert_eq!(sections.analysis(), "two");
    assert_eq!(sections.peer_comparison(), "three");
}

#[test]
fn missing_sections_fall_back() {
    let sections = SectionSet::split("only a summary");
    assert_eq!(sections.short_summary(), "only a summary");
    assert_eq!(sections.analysis(), "");
    assert_eq!(sections.peer_comparison(), "{}");
}

// ============================================================================
// Full responses
// ============================================================================

#[test]
fn simple_response_fills_two_fields() {
    let raw = "Short bit.\n===OUTPUT-SECTION-SEPARATOR===\nSome text {\"company_name\": \"Acme\", \"industry\": \"tech\"} more text\n===OUTPUT-SECTION-SEPARATOR===\n{\"comparison\":{\"columns\":[],\"companies\":[]}}";
    let parsed = parse_model_output(raw);

    assert_eq!(parsed.summary.short_summary, "Short bit.");
    assert_eq!(parsed.profile.get("company_name"), Some("Acme"));
    assert_eq!(parsed.profile.get("industry"), Some("tech"));
    for field in FIELDS {
        if field.name != "company_name" && field.name != "industry" {
            assert_eq!(parsed.profile.get(field.name), Some(PLACEHOLDER), "{}", field.name);
        }
    }
    assert_eq!(parsed.profile.len(), FIELDS.len());

    assert!(!parsed.summary.detailed_analysis_summary.contains('{'));
    assert!(parsed.summary.detailed_analysis_summary.starts_with("Some text"));
    assert!(parsed.summary.detailed_analysis_summary.ends_with("more text"));

    assert!(!parsed.peer_comparison.is_empty());
    assert!(parsed.peer_comparison.columns().is_empty());
    assert!(parsed.peer_comparison.companies().is_empty());
}

#[test]
fn richer_candidate_wins() {
    let section = format!(
        "Early notes {} and the full record {} end.",
        profile_json("Small", 2),
        profile_json("Large", 10)
    );
    let (summary, profile) = extract_analysis_and_profile(&section);
    assert_eq!(profile.get("company_name"), Some("Large"));
    assert_eq!(profile.get("tam"), Some("$40B"));
    assert!(summary.contains("\"Small\""));
    assert!(!summary.contains("\"Large\""));
}

#[test]
fn invalid_peer_section_becomes_empty_table() {
    let raw = format!(
        "s\n{sep}\n{profile}\n{sep}\nnot json at all",
        sep = SECTION_SEPARATOR,
        profile = profile_json("Acme", 3)
    );
    let parsed = parse_model_output(&raw);
    assert!(parsed.peer_comparison.is_empty());
    assert_eq!(parsed.peer_comparison.as_value(), &json!({}));
    assert_eq!(parsed.profile.get("company_name"), Some("Acme"));
}

#[test]
fn not_applicable_values_become_placeholder() {
    let raw = format!(
        "s\n{sep}\n{{\"company_name\": \"Acme\", \"revenue\": \"  N/A  \"}}\n{sep}\n{{}}",
        sep = SECTION_SEPARATOR
    );
    let (_, profile) = extract_sections_and_profile(&raw);
    assert_eq!(profile.get("revenue"), Some(PLACEHOLDER));
    assert_eq!(profile.get("company_name"), Some("Acme"));
}

#[test]
fn well_formed_response_round_trips_into_profile() {
    let parsed = parse_model_output(&model_response("Acme"));
    assert_eq!(parsed.summary.short_summary, "Acme builds warehouse robots.");
    assert_eq!(parsed.profile.specified_count(), 10);
    assert_eq!(parsed.peer_comparison.columns(), vec!["Metric", "Acme", "Rival"]);
    assert_eq!(parsed.peer_comparison.companies().len(), 2);

    let detailed = &parsed.summary.detailed_analysis_summary;
    assert!(detailed.starts_with("Detailed view of Acme."));
    assert!(detailed.ends_with("Strong team."));
    assert!(!detailed.contains("\n\n\n"));
}

#[test]
fn empty_response_degrades_to_placeholders() {
    let parsed = parse_model_output("");
    assert_eq!(parsed.summary.short_summary, "");
    assert_eq!(parsed.summary.detailed_analysis_summary, "");
    assert_eq!(parsed.profile.specified_count(), 0);
    assert!(parsed.peer_comparison.is_empty());
}

// ============================================================================
// Narrative fallback
// ============================================================================

#[test]
fn narrative_fallback_runs_without_structured_data() {
    let (summary, profile) =
        extract_analysis_and_profile("Reddit is a community platform with strong engagement.");
    assert_eq!(profile.get("company_name"), Some("Reddit"));
    assert_eq!(profile.get("industry"), Some("Social Media Platform"));
    assert_eq!(profile.get("revenue"), Some(PLACEHOLDER));
    assert_eq!(summary, "Reddit is a community platform with strong engagement.");
}

#[test]
fn zero_score_candidates_fall_back_to_narrative() {
    let (_, profile) = extract_analysis_and_profile("Reddit metrics {\"foo\": 1, \"bar\": 2}");
    assert_eq!(profile.get("company_name"), Some("Reddit"));
}

#[test]
fn custom_registry_replaces_builtin_recognizers() {
    let mut registry = NarrativeRegistry::empty();
    registry.register(KeywordRecognizer::new("acme", "acme").with_field("company_name", "Acme Corp"));
    let extractor = ProfileExtractor::new(registry);

    let (_, acme) = extractor.extract_analysis("All about ACME and its robots.");
    assert_eq!(acme.get("company_name"), Some("Acme Corp"));

    let (_, reddit) = extractor.extract_analysis("All about Reddit.");
    assert_eq!(reddit.get("company_name"), Some(PLACEHOLDER));
}
