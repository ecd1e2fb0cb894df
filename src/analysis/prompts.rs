//! Prompt text sent with every analysis request

use crate::extract::SECTION_SEPARATOR;
use crate::profile::{FIELDS, PLACEHOLDER};
use serde_json::{json, Map, Value};

/// Columns requested for the peer-comparison table
pub const PEER_COLUMNS: &[&str] = &[
    "Company Name",
    "Primary Focus",
    "Most Recent Funding Round",
    "Total Capital Raised",
    "Prominent Investors",
    "Founding Team",
    "Employee Estimate",
    "Market Traction",
    "Core Technology",
    "Revenue Model",
    "Recent News",
];

pub const MAX_PEERS: usize = 5;

/// The structured-data template: every schema field mapped to its hint
fn structured_template() -> String {
    let template: Map<String, Value> = FIELDS
        .iter()
        .map(|f| (f.name.to_string(), Value::String(f.hint.to_string())))
        .collect();
    pretty(&Value::Object(template))
}

fn peer_template() -> String {
    let row: Map<String, Value> = PEER_COLUMNS
        .iter()
        .map(|c| (c.to_string(), Value::String("...".to_string())))
        .collect();
    pretty(&json!({
        "comparison": {
            "columns": PEER_COLUMNS,
            "companies": [row],
        }
    }))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Build the analysis prompt for one startup.
///
/// Asks for three outputs separated by [`SECTION_SEPARATOR`]: a short
/// summary, a detailed analysis followed by the structured-data JSON, and
/// the peer-comparison JSON.
pub fn analysis_prompt(startup_name: &str) -> String {
    let company = if startup_name.trim().is_empty() {
        "this company"
    } else {
        startup_name
    };

    format!(
        r#"Analyze the attached startup documents and use Google Search for current information about {company}.
Useful sources for financial data: investor relations pages and annual reports, regulatory filings,
venture databases (PitchBook, CB Insights, Crunchbase), company LinkedIn pages, and analyst coverage.
Search for terms such as "{company} burn rate", "{company} balance sheet", "{company} marketing spend",
"{company} operating expenses" and "{company} financial statements".

Provide THREE outputs. Put the following line, exactly, between consecutive outputs:
{SECTION_SEPARATOR}

1. SHORT SUMMARY:
One or two plain-text lines on the startup's core business and key highlights.

{SECTION_SEPARATOR}

2. ANALYSIS SUMMARY AND STRUCTURED DATA:
A detailed analysis covering financial insights and a risk evaluation using the Scorecard Risk Method
and other relevant frameworks. Assess market risk, product risk, team and execution risk, regulatory
risk and financial risk. Give an overall risk score out of 5 (5 = very low risk, 1 = very high risk)
in the JSON field "risk_gauge", and justify it briefly, covering every risk area, in "risk_gauge_reason".
Then give the structured data JSON below with every field filled in:

{structured}

{SECTION_SEPARATOR}

3. PEER COMPARISON JSON:
A JSON object comparing {company} with up to {MAX_PEERS} peer companies, in this structure:

{peers}

Provide ONLY the JSON object for this output, without any other text.

IMPORTANT:
- Check several authoritative sources for each financial metric and prefer recent data.
- Derive metrics such as runway from the available figures; use industry benchmarks for context.
- Use "{PLACEHOLDER}" only when a value cannot be found anywhere.
- Plain text only: no Markdown, no citations, no bracketed source references.
"#,
        structured = structured_template(),
        peers = peer_template(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{find_best_json, split_sections};
    use crate::profile::schema;

    #[test]
    fn prompt_names_the_startup() {
        let prompt = analysis_prompt("acme");
        assert!(prompt.contains("current information about acme"));
        assert!(analysis_prompt("  ").contains("about this company"));
    }

    #[test]
    fn template_lists_every_field() {
        let best = find_best_json(&structured_template());
        assert_eq!(best.object.len(), schema::field_count());
        assert!(FIELDS.iter().all(|f| best.object.contains_key(f.name)));
    }

    #[test]
    fn prompt_has_three_marked_outputs() {
        let prompt = analysis_prompt("acme");
        assert_eq!(prompt.matches(SECTION_SEPARATOR).count(), 3);
        assert!(split_sections(&prompt).len() >= 3);
    }

    #[test]
    fn peer_template_is_valid_json() {
        let value: Value = serde_json::from_str(&peer_template()).unwrap();
        assert_eq!(
            value["comparison"]["columns"].as_array().unwrap().len(),
            PEER_COLUMNS.len()
        );
    }
}
