use std::collections::HashMap;

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn tag(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self(DEFAULT_LOCALE.to_string())
    }
}

pub fn definition_label_key(definition_id: &str) -> String {
    format!("process.{definition_id}.name")
}

pub fn step_label_key(definition_id: &str, step_name: &str) -> String {
    format!("process.{definition_id}.step.{step_name}")
}

/// In-memory message catalog standing in for the portal localization layer.
/// Lookups fall back to the default locale, then to the supplied default.
#[derive(Clone, Debug, Default)]
pub struct MessageCatalog {
    entries: HashMap<(String, String), String>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locale: &Locale, key: impl Into<String>, text: impl Into<String>) {
        self.entries
            .insert((locale.tag().to_string(), key.into()), text.into());
    }

    /// Loads a flat key-to-text JSON object as entries for one locale.
    pub fn load_json_bundle(&mut self, locale: &Locale, json: &str) -> serde_json::Result<()> {
        let bundle: HashMap<String, String> = serde_json::from_str(json)?;
        for (key, text) in bundle {
            self.insert(locale, key, text);
        }
        Ok(())
    }

    pub fn message_or<'a>(&'a self, locale: &Locale, key: &str, default: &'a str) -> &'a str {
        if let Some(text) = self.entries.get(&(locale.tag().to_string(), key.to_string())) {
            return text;
        }
        if let Some(text) = self
            .entries
            .get(&(DEFAULT_LOCALE.to_string(), key.to_string()))
        {
            return text;
        }
        default
    }

    /// Definition ids whose localized display label contains the needle,
    /// case-insensitively, under the given locale. Used by the queue filter
    /// to fold locale-sensitive label matching into the query predicate.
    pub fn definitions_with_label_matching(&self, locale: &Locale, needle: &str) -> Vec<String> {
        let needle = needle.to_lowercase();
        let mut matched: Vec<String> = self
            .entries
            .iter()
            .filter(|((tag, _), _)| tag == locale.tag() || tag == DEFAULT_LOCALE)
            .filter_map(|((_, key), text)| {
                let definition_id = key
                    .strip_prefix("process.")
                    .and_then(|rest| rest.strip_suffix(".name"))?;
                if definition_id.contains('.') {
                    return None;
                }
                text.to_lowercase()
                    .contains(&needle)
                    .then(|| definition_id.to_string())
            })
            .collect();
        matched.sort();
        matched.dedup();
        matched
    }
}
