//! Process-wide language registry.
//!
//! Languages are loaded once and then shared read-only; lookups take a read
//! lock only.

use std::sync::LazyLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::Language;
use crate::error::Result;

static GLOBAL: LazyLock<LanguageRegistry> = LazyLock::new(LanguageRegistry::new);

/// Name → [`Language`] map
#[derive(Default)]
pub struct LanguageRegistry {
    languages: RwLock<FxHashMap<SmolStr, Language>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared registry for this process.
    pub fn global() -> &'static LanguageRegistry {
        &GLOBAL
    }

    /// Register `language` under its name, returning any language it replaced.
    pub fn register(&self, language: Language) -> Option<Language> {
        let name = SmolStr::new(language.name());
        tracing::debug!(language = %name, "registering language");
        self.languages.write().insert(name, language)
    }

    pub fn get(&self, name: &str) -> Option<Language> {
        self.languages.read().get(name).cloned()
    }

    /// Return the registered language, loading and registering it on first use.
    ///
    /// `load` runs at most once per name even under concurrent callers.
    pub fn get_or_load(&self, name: &str, load: impl FnOnce() -> Result<Language>) -> Result<Language> {
        if let Some(language) = self.get(name) {
            return Ok(language);
        }
        let mut languages = self.languages.write();
        if let Some(language) = languages.get(name) {
            return Ok(language.clone());
        }
        let language = load()?;
        tracing::debug!(language = %name, "loaded language");
        languages.insert(SmolStr::new(name), language.clone());
        Ok(language)
    }

    pub fn names(&self) -> Vec<SmolStr> {
        let mut names: Vec<SmolStr> = self.languages.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.languages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
