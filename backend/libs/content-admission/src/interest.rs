// ============================================
// Interest Detector
// ============================================
//
// Infers topical interest from conversational text by lexicon lookup.
//
// A category matches iff at least one of its keywords occurs as a
// case-insensitive substring of the text. No scoring, no stemming.
// Missed paraphrases are acceptable; false positives are still gated
// by engagement history in the admission controller.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::models::Category;

/// Immutable category -> keywords mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct InterestLexicon {
    entries: BTreeMap<Category, Vec<String>>,
}

impl InterestLexicon {
    /// Build a lexicon, normalizing category names and keywords to lowercase.
    ///
    /// Empty category names and categories without any non-empty keyword are rejected.
    pub fn new<C, K, I>(entries: I) -> Result<Self, ConfigError>
    where
        C: AsRef<str>,
        K: AsRef<str>,
        I: IntoIterator<Item = (C, Vec<K>)>,
    {
        let mut normalized: BTreeMap<Category, Vec<String>> = BTreeMap::new();

        for (name, keywords) in entries {
            let category = Category::new(name);
            if category.is_empty() {
                return Err(ConfigError::Invalid("lexicon category name is empty".to_string()));
            }

            let slot = normalized.entry(category).or_default();
            for keyword in keywords {
                let keyword = keyword.as_ref().trim().to_lowercase();
                if !keyword.is_empty() && !slot.contains(&keyword) {
                    slot.push(keyword);
                }
            }
        }

        if let Some((category, _)) = normalized.iter().find(|(_, kws)| kws.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "lexicon category '{}' has no keywords",
                category
            )));
        }

        Ok(Self {
            entries: normalized,
        })
    }

    /// Parse a JSON object of the form `{"sports": ["cricket", ...], ...}`.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Self::new(raw)
    }

    pub fn from_json_file(path: &str) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::LexiconIo {
            path: path.to_string(),
            source,
        })?;
        let lexicon = Self::from_json_str(&json)?;
        info!(path = path, categories = lexicon.len(), "Interest lexicon loaded");
        Ok(lexicon)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.entries.keys()
    }

    pub fn keywords(&self, category: &Category) -> Option<&[String]> {
        self.entries.get(category).map(Vec::as_slice)
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.entries.contains_key(category)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = (&Category, &Vec<String>)> {
        self.entries.iter()
    }
}

impl Default for InterestLexicon {
    /// Built-in lexicon covering the sports / business / podcast catalog.
    fn default() -> Self {
        let entries: BTreeMap<Category, Vec<String>> = [
            (
                "sports",
                &[
                    "cricket",
                    "indian premier league",
                    "world cup",
                    "football",
                    "soccer",
                    "tennis",
                    "badminton",
                    "kabaddi",
                    "olympics",
                    "match",
                    "tournament",
                    "virat kohli",
                    "ms dhoni",
                    "sports",
                ][..],
            ),
            (
                "business",
                &[
                    "business",
                    "startup",
                    "entrepreneur",
                    "investment",
                    "investing",
                    "stock market",
                    "finance",
                    "economy",
                    "nikhil kamath",
                    "zerodha",
                    "shark tank",
                    "venture capital",
                ][..],
            ),
            (
                "podcast",
                &[
                    "podcast",
                    "ranveer",
                    "beerbiceps",
                    "interview",
                    "episode",
                    "long-form conversation",
                ][..],
            ),
        ]
        .into_iter()
        .map(|(name, kws)| (Category::new(name), kws.iter().map(|k| k.to_string()).collect()))
        .collect();

        Self { entries }
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for InterestLexicon {
    type Error = ConfigError;

    fn try_from(raw: BTreeMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<InterestLexicon> for BTreeMap<String, Vec<String>> {
    fn from(lexicon: InterestLexicon) -> Self {
        lexicon
            .entries
            .into_iter()
            .map(|(category, kws)| (category.as_str().to_string(), kws))
            .collect()
    }
}

/// Stateless keyword classifier over an [`InterestLexicon`].
#[derive(Debug, Clone, Default)]
pub struct InterestDetector {
    lexicon: InterestLexicon,
}

impl InterestDetector {
    pub fn new(lexicon: InterestLexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &InterestLexicon {
        &self.lexicon
    }

    /// Categories whose keywords occur in `text`.
    pub fn detect(&self, text: &str) -> BTreeSet<Category> {
        self.detect_with_matches(text).into_keys().collect()
    }

    /// Like [`detect`](Self::detect), also returning the matched keywords per category.
    pub fn detect_with_matches(&self, text: &str) -> BTreeMap<Category, Vec<String>> {
        let mut matches = BTreeMap::new();
        if text.trim().is_empty() {
            return matches;
        }

        let haystack = text.to_lowercase();
        for (category, keywords) in self.lexicon.iter() {
            let matched: Vec<String> = keywords
                .iter()
                .filter(|kw| haystack.contains(kw.as_str()))
                .cloned()
                .collect();

            if !matched.is_empty() {
                matches.insert(category.clone(), matched);
            }
        }

        debug!(
            text_len = text.len(),
            categories = matches.len(),
            "Interest detection completed"
        );

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> InterestDetector {
        InterestDetector::default()
    }

    #[test]
    fn test_detect_cricket_as_sports() {
        let detected = detector().detect("I love watching cricket matches");
        assert_eq!(detected, BTreeSet::from([Category::new("sports")]));
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        let d = detector();
        assert_eq!(d.detect("I LOVE CRICKET"), d.detect("i love cricket"));
        assert!(d.detect("I LOVE CRICKET").contains(&Category::new("sports")));
    }

    #[test]
    fn test_detect_multiple_categories() {
        let detected = detector().detect("I enjoy listening to podcasts about entrepreneurship");
        assert!(detected.contains(&Category::new("podcast")));
        assert!(detected.contains(&Category::new("business")));
    }

    #[test]
    fn test_detect_named_people() {
        let d = detector();
        assert!(d
            .detect("Nikhil Kamath has great investment insights")
            .contains(&Category::new("business")));
        assert!(d
            .detect("Ranveer's podcast is really inspiring")
            .contains(&Category::new("podcast")));
    }

    #[test]
    fn test_empty_and_unrelated_text() {
        let d = detector();
        assert!(d.detect("").is_empty());
        assert!(d.detect("   ").is_empty());
        assert!(d.detect("I had soup for lunch").is_empty());
    }

    #[test]
    fn test_detect_with_matches_lists_keywords() {
        let matches = detector().detect_with_matches("Cricket world cup final tonight");
        let sports = matches.get(&Category::new("sports")).unwrap();
        assert!(sports.contains(&"cricket".to_string()));
        assert!(sports.contains(&"world cup".to_string()));
    }

    #[test]
    fn test_lexicon_normalizes_and_dedups() {
        let lexicon =
            InterestLexicon::new([("Music ", vec!["Guitar", "guitar", "  ", "Piano"])]).unwrap();
        assert_eq!(
            lexicon.keywords(&Category::new("music")).unwrap(),
            &["guitar".to_string(), "piano".to_string()]
        );
    }

    #[test]
    fn test_lexicon_rejects_empty_category() {
        assert!(InterestLexicon::new([("", vec!["x"])]).is_err());
        assert!(InterestLexicon::new([("music", Vec::<String>::new())]).is_err());
    }

    #[test]
    fn test_lexicon_from_json() {
        let lexicon =
            InterestLexicon::from_json_str(r#"{"sports": ["Cricket"], "cooking": ["recipe"]}"#)
                .unwrap();
        assert_eq!(lexicon.len(), 2);

        let d = InterestDetector::new(lexicon);
        assert_eq!(
            d.detect("Any good RECIPE ideas?"),
            BTreeSet::from([Category::new("cooking")])
        );
    }

    #[test]
    fn test_lexicon_from_bad_json() {
        assert!(matches!(
            InterestLexicon::from_json_str("[1, 2]"),
            Err(ConfigError::LexiconParse(_))
        ));
    }
}
