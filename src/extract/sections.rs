//! Splitting raw model output into its logical sections

/// Literal marker the model is asked to place between output sections.
pub const SECTION_SEPARATOR: &str = "===OUTPUT-SECTION-SEPARATOR===";

/// The ordered, non-empty sections of one model response.
///
/// Positional: index 0 is the short summary, 1 the analysis with its
/// structured data, 2 the peer comparison. Fewer than three sections is
/// normal when the model drops a separator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionSet {
    sections: Vec<String>,
}

impl SectionSet {
    /// Split on [`SECTION_SEPARATOR`], trimming pieces and dropping empty ones
    pub fn split(raw: &str) -> Self {
        let sections = raw
            .split(SECTION_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { sections }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.sections.get(index).map(String::as_str)
    }

    pub fn short_summary(&self) -> &str {
        self.get(0).unwrap_or("")
    }

    pub fn analysis(&self) -> &str {
        self.get(1).unwrap_or("")
    }

    /// Peer comparison text, `"{}"` when the section is missing
    pub fn peer_comparison(&self) -> &str {
        self.get(2).unwrap_or("{}")
    }

    pub fn as_slice(&self) -> &[String] {
        &self.sections
    }
}

/// Convenience wrapper returning the sections as owned strings
pub fn split_sections(raw: &str) -> Vec<String> {
    SectionSet::split(raw).sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_sections_in_order() {
        let raw = format!(
            "  one \n{sep}\n two\n{sep}\nthree  ",
            sep = SECTION_SEPARATOR
        );
        assert_eq!(split_sections(&raw), vec!["one", "two", "three"]);
    }

    #[test]
    fn no_separator_yields_trimmed_whole() {
        assert_eq!(split_sections("\n  just text \n"), vec!["just text"]);
    }

    #[test]
    fn empty_segments_are_dropped() {
        let raw = format!("{sep}\n\n{sep} a {sep}   {sep}b", sep = SECTION_SEPARATOR);
        assert_eq!(split_sections(&raw), vec!["a", "b"]);
    }

    #[test]
    fn missing_positions_fall_back() {
        let set = SectionSet::split("only a summary");
        assert_eq!(set.short_summary(), "only a summary");
        assert_eq!(set.analysis(), "");
        assert_eq!(set.peer_comparison(), "{}");

        let empty = SectionSet::split("   ");
        assert!(empty.is_empty());
        assert_eq!(empty.short_summary(), "");
    }
}
