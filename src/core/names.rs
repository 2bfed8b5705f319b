//! Person-name normalization and the veteran lookup.
//!
//! Occupants and veterans share no key, so they are joined on normalized name variants.
//! A lookup may legitimately return several veterans; callers must handle that case.

use crate::domain::model::VeteranRecord;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.,\-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static TRAILING_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(Jr\.?|Sr\.?|III|II|IV|M\.?D\.?|Ph\.?D\.?|Capt\.?|Dr\.?)$").unwrap()
});
static ONLY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(Jr\.?|Sr\.?|III|II|IV)$").unwrap());

/// Lower-case, drop `.`, `,` and `-`, collapse whitespace.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stripped = PUNCTUATION.replace_all(&lowered, "");
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}

/// Split a suffix (Jr., III, M.D., ...) off a middle-name field.
/// Returns `(middle, suffix)`; the suffix is empty when none is found.
pub fn split_suffix(middle_field: &str) -> (String, String) {
    let middle = middle_field.trim();
    if middle.is_empty() {
        return (String::new(), String::new());
    }

    if let Some(caps) = ONLY_SUFFIX.captures(middle) {
        return (String::new(), caps[1].to_string());
    }

    if let Some(caps) = TRAILING_SUFFIX.captures(middle) {
        let suffix = caps[1].to_string();
        let cleaned = middle[..caps.get(0).map_or(middle.len(), |m| m.start())].trim();
        return (cleaned.to_string(), suffix);
    }

    (middle.to_string(), String::new())
}

/// All normalized spellings a veteran may appear under in occupants.csv.
pub fn name_variants(veteran: &VeteranRecord) -> Vec<String> {
    let join = |parts: &[&str]| {
        parts
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    };

    let first = veteran.first.as_str();
    let middle = veteran.middle.as_str();
    let last = veteran.last.as_str();
    let suffix = veteran.suffix.as_str();

    let mut variants = vec![
        normalize_name(&join(&[first, middle, last])),
        normalize_name(&join(&[first, last])),
    ];
    if !suffix.is_empty() {
        variants.push(normalize_name(&join(&[first, middle, last, suffix])));
        variants.push(normalize_name(&join(&[first, last, suffix])));
    }

    variants.retain(|v| !v.is_empty());
    variants.dedup();
    variants
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VeteranMatch<'a> {
    None,
    One(&'a VeteranRecord),
    Many(Vec<&'a VeteranRecord>),
}

impl VeteranMatch<'_> {
    pub fn is_match(&self) -> bool {
        !matches!(self, VeteranMatch::None)
    }
}

/// Normalized name variant -> every veteran that produces it.
pub struct VeteranIndex<'a> {
    by_variant: HashMap<String, Vec<&'a VeteranRecord>>,
}

impl<'a> VeteranIndex<'a> {
    pub fn build(veterans: &'a [VeteranRecord]) -> Self {
        let mut by_variant: HashMap<String, Vec<&'a VeteranRecord>> = HashMap::new();
        for veteran in veterans {
            for variant in name_variants(veteran) {
                let entry = by_variant.entry(variant).or_default();
                if !entry.iter().any(|v| v.row == veteran.row) {
                    entry.push(veteran);
                }
            }
        }
        Self { by_variant }
    }

    pub fn variant_count(&self) -> usize {
        self.by_variant.len()
    }

    pub fn lookup(&self, name: &str) -> VeteranMatch<'a> {
        match self.by_variant.get(&normalize_name(name)) {
            None => VeteranMatch::None,
            Some(found) if found.len() == 1 => VeteranMatch::One(found[0]),
            Some(found) => VeteranMatch::Many(found.clone()),
        }
    }
}
