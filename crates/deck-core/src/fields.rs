//! Placeholder fields and run-level text substitution

use std::collections::BTreeMap;

use crate::presentation::Presentation;

/// Placeholder name → replacement value. Keys are case-sensitive and applied
/// in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace every `{{key}}` in `text`. Returns the new text and the number
    /// of tokens replaced, or `None` if nothing matched.
    pub fn replace_in(&self, text: &str) -> Option<(String, usize)> {
        let mut current: Option<String> = None;
        let mut count = 0;
        for (key, value) in self.iter() {
            let token = placeholder_token(key);
            let haystack = current.as_deref().unwrap_or(text);
            let hits = haystack.matches(token.as_str()).count();
            if hits > 0 {
                count += hits;
                current = Some(haystack.replace(token.as_str(), value));
            }
        }
        current.map(|text| (text, count))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// `{{name}}`
pub fn placeholder_token(name: &str) -> String {
    format!("{{{{{}}}}}", name)
}

/// Substitute fields in the runs of every text frame of every slide.
///
/// Each run is scanned on its own: a token whose characters are split across
/// two runs (a formatting change mid-token) is not matched. Tokens with no
/// entry in `fields` are left as they are. Returns the number of tokens
/// replaced.
pub fn substitute(presentation: &mut Presentation, fields: &FieldMap) -> usize {
    if fields.is_empty() {
        return 0;
    }
    let mut replaced = 0;
    for slide in presentation.slides_mut() {
        slide.edit_runs(|text| {
            let (new_text, hits) = fields.replace_in(text)?;
            replaced += hits;
            Some(new_text)
        });
    }
    replaced
}
