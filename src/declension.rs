//! Polish declension heuristics.
//!
//! Two tables drive morphological matching:
//!
//! - case endings stripped from a word to reach its stem
//!   (`Xeronowi` → `Xeron`, `Krakowie` → `Krak`);
//! - stem alternations, where the final consonant changes together with the
//!   ending (`Bracadzie` → `Bracada`, `Pradze` → `Praga`).
//!
//! Neither table is consulted when the remaining stem would be shorter than
//! the minimum stem length, so short names such as `Aba` are left alone.

/// Case endings, longest first.
pub static POLISH_SUFFIXES: &[&str] = &[
    "owie", "owi", "ami", "ach", "iem", "ego", "emu", "om", "ów", "em", "ie", "ią", "ię", "ej",
    "ym", "im", "ą", "ę", "a", "u", "y", "i", "e",
];

/// `(inflected ending, base ending)` pairs, longest inflected ending first.
pub static POLISH_ALTERNATIONS: &[(&str, &str)] = &[
    ("ście", "sta"),
    ("owie", "ów"),
    ("dzie", "da"),
    ("cowi", "iec"),
    ("cie", "ta"),
    ("rze", "ra"),
    ("sze", "cha"),
    ("dze", "ga"),
    ("wie", "wa"),
    ("mie", "ma"),
    ("pie", "pa"),
    ("bie", "ba"),
    ("nie", "na"),
    ("sie", "sa"),
    ("zie", "za"),
    ("cem", "iec"),
    ("le", "ła"),
    ("ce", "ka"),
    ("ca", "iec"),
    ("cu", "iec"),
    ("ii", "ia"),
    ("ji", "ja"),
];

/// Default minimum number of characters a stem must keep.
pub const DEFAULT_MIN_STEM_LEN: usize = 3;

/// Byte offset where `suffix` starts at the end of `word`, ignoring case.
fn suffix_start(word: &str, suffix: &str) -> Option<usize> {
    let len = suffix.chars().count();
    if len == 0 {
        return None;
    }
    let (start, _) = word.char_indices().rev().nth(len - 1)?;
    (word[start..].to_lowercase() == suffix.to_lowercase()).then_some(start)
}

/// Immutable declension configuration injected into the index and resolver.
///
/// # Examples
///
/// ```
/// use kronika::DeclensionRules;
///
/// let rules = DeclensionRules::polish();
/// assert_eq!(rules.stem("Xeronowi"), "Xeron");
/// assert_eq!(rules.alternations("Bracadzie")[0], "Bracada");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclensionRules {
    suffixes: Vec<String>,
    alternations: Vec<(String, String)>,
    min_stem_len: usize,
}

impl Default for DeclensionRules {
    fn default() -> Self {
        Self::polish()
    }
}

impl DeclensionRules {
    /// Rules built from the Polish tables.
    #[must_use]
    pub fn polish() -> Self {
        Self::new(
            POLISH_SUFFIXES.iter().map(|s| (*s).to_string()),
            POLISH_ALTERNATIONS
                .iter()
                .map(|(inflected, base)| ((*inflected).to_string(), (*base).to_string())),
            DEFAULT_MIN_STEM_LEN,
        )
    }

    /// Builds rules from custom tables.
    ///
    /// Both tables are stably re-ordered longest ending first, so callers
    /// cannot accidentally let a short ending shadow a longer one.
    #[must_use]
    pub fn new(
        suffixes: impl IntoIterator<Item = String>,
        alternations: impl IntoIterator<Item = (String, String)>,
        min_stem_len: usize,
    ) -> Self {
        let mut suffixes: Vec<String> = suffixes.into_iter().filter(|s| !s.is_empty()).collect();
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
        let mut alternations: Vec<(String, String)> = alternations
            .into_iter()
            .filter(|(inflected, _)| !inflected.is_empty())
            .collect();
        alternations.sort_by_key(|(inflected, _)| std::cmp::Reverse(inflected.chars().count()));
        Self {
            suffixes,
            alternations,
            min_stem_len,
        }
    }

    /// Returns a copy with a different minimum stem length.
    #[must_use]
    pub fn with_min_stem_len(mut self, min_stem_len: usize) -> Self {
        self.min_stem_len = min_stem_len;
        self
    }

    /// Shortest stem a suffix may leave behind, in characters.
    #[must_use]
    pub const fn min_stem_len(&self) -> usize {
        self.min_stem_len
    }

    fn keeps_stem(&self, word: &str, start: usize) -> bool {
        word[..start].chars().count() >= self.min_stem_len
    }

    /// Strips the longest matching case ending from a single word.
    #[must_use]
    pub fn strip_word<'a>(&self, word: &'a str) -> &'a str {
        for suffix in &self.suffixes {
            if let Some(start) = suffix_start(word, suffix) {
                if self.keeps_stem(word, start) {
                    return &word[..start];
                }
            }
        }
        word
    }

    /// Stems every word of `text`, keeping the original casing.
    ///
    /// Words are re-joined with single spaces.
    #[must_use]
    pub fn stem(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|word| self.strip_word(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Base forms of `text` under every alternation whose inflected ending
    /// matches, in table order.
    #[must_use]
    pub fn alternations(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        let mut out = Vec::new();
        for (inflected, base) in &self.alternations {
            if let Some(start) = suffix_start(text, inflected) {
                if self.keeps_stem(text, start) {
                    let candidate = format!("{}{base}", &text[..start]);
                    if !out.contains(&candidate) {
                        out.push(candidate);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_dative() {
        assert_eq!(DeclensionRules::polish().stem("Xeronowi"), "Xeron");
    }

    #[test]
    fn test_stem_respects_min_length() {
        let rules = DeclensionRules::polish();
        assert_eq!(rules.stem("Aba"), "Aba");
        assert_eq!(rules.stem("Abaa"), "Aba");
    }

    #[test]
    fn test_longest_suffix_wins() {
        let rules = DeclensionRules::polish();
        // "ie" and "owie" both match; the longer one must be used.
        assert_eq!(rules.stem("Krakowie"), "Krak");
        assert_eq!(rules.stem("Kraków"), "Krak");
        // "i" is a substring of "owi".
        assert_eq!(rules.stem("Sandrowi"), "Sandr");
    }

    #[test]
    fn test_longest_falls_back_when_stem_too_short() {
        let rules = DeclensionRules::polish();
        // "owi" would leave "R"; "i" leaves "Row".
        assert_eq!(rules.stem("Rowi"), "Row");
    }

    #[test]
    fn test_custom_tables_are_reordered() {
        let rules = DeclensionRules::new(
            vec!["i".to_string(), "owi".to_string()],
            Vec::new(),
            3,
        );
        assert_eq!(rules.stem("Xeronowi"), "Xeron");
    }

    #[test]
    fn test_stem_preserves_case_and_diacritics() {
        let rules = DeclensionRules::polish();
        assert_eq!(rules.stem("ŁUCZNIKOWI"), "ŁUCZNIK");
        assert_eq!(rules.stem("Starego   Orrina"), "Star Orrin");
    }

    #[test]
    fn test_alternations() {
        let rules = DeclensionRules::polish();
        // "dzie" is tried before the shorter "zie".
        assert_eq!(rules.alternations("Bracadzie"), vec!["Bracada", "Bracadza"]);
        assert_eq!(rules.alternations("Pradze"), vec!["Praga"]);
        assert_eq!(rules.alternations("Erathii"), vec!["Erathia"]);
        assert_eq!(rules.alternations("Krakowie"), vec!["Kraków", "Krakowa"]);
        assert!(rules.alternations("Enroth").is_empty());
    }

    #[test]
    fn test_alternations_respect_min_stem() {
        let rules = DeclensionRules::polish();
        // Replacing "dzie" would leave a single character.
        assert!(rules.alternations("Adzie").is_empty());
    }

    #[test]
    fn test_min_stem_override() {
        let rules = DeclensionRules::polish().with_min_stem_len(5);
        assert_eq!(rules.stem("Xeronowi"), "Xeron");
        assert_eq!(rules.stem("Orrina"), "Orrin");
        assert_eq!(rules.stem("Gema"), "Gema");
    }
}
