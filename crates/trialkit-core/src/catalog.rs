//! Item catalog loading and validation.
//!
//! Loads the static target list from JSON (`targets.json`, a top-level array)
//! or TOML (`[[items]]` tables), validates every record, and builds the
//! eligible pool for a session.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::CatalogError;
use crate::model::{Deck, Item};

/// Intermediate record; every field optional so validation can name what is missing.
#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    deck: Option<String>,
    #[serde(default)]
    exemplars: Option<Vec<String>>,
    #[serde(default)]
    prompt_object: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(default)]
    items: Vec<RawItem>,
}

/// Load and validate a catalog file, choosing the format by extension.
pub fn load_catalog(path: &Path) -> Result<Vec<Item>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_catalog_json(&content),
        Some("toml") => parse_catalog_toml(&content),
        other => Err(CatalogError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

/// Parse a JSON catalog (useful for testing).
pub fn parse_catalog_json(content: &str) -> Result<Vec<Item>, CatalogError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
    if !value.is_array() {
        return Err(CatalogError::Parse("targets.json must be an array".into()));
    }
    let raw: Vec<RawItem> =
        serde_json::from_value(value).map_err(|e| CatalogError::Parse(e.to_string()))?;
    validate_records(raw)
}

/// Parse a TOML catalog with `[[items]]` tables.
pub fn parse_catalog_toml(content: &str) -> Result<Vec<Item>, CatalogError> {
    let parsed: TomlCatalog =
        toml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
    validate_records(parsed.items)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_records(raw: Vec<RawItem>) -> Result<Vec<Item>, CatalogError> {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(raw.len());

    for (record, r) in raw.into_iter().enumerate() {
        let id = non_empty(r.id).ok_or(CatalogError::MissingField { record, field: "id" })?;
        let deck_name =
            non_empty(r.deck).ok_or(CatalogError::MissingField { record, field: "deck" })?;
        let label =
            non_empty(r.label).ok_or(CatalogError::MissingField { record, field: "label" })?;

        let exemplars = r.exemplars.unwrap_or_default();
        if exemplars.is_empty() {
            return Err(CatalogError::MissingExemplars { id });
        }

        let deck: Deck = deck_name.parse().map_err(|_| CatalogError::UnknownDeck {
            id: id.clone(),
            deck: deck_name.clone(),
        })?;

        if !seen.insert(id.clone()) {
            return Err(CatalogError::DuplicateId(id));
        }

        items.push(Item {
            id,
            label,
            deck,
            exemplars,
            prompt_object: r.prompt_object,
        });
    }

    tracing::debug!(count = items.len(), "catalog validated");
    Ok(items)
}

/// Filter the catalog down to the eligible pool for a session.
///
/// Keeps items whose deck is selected and that have at least one exemplar.
/// When `only_ids` is given (a saved missed set), only those ids survive.
pub fn build_pool(items: &[Item], decks: &[Deck], only_ids: Option<&[String]>) -> Vec<Item> {
    let only: Option<HashSet<&str>> =
        only_ids.map(|ids| ids.iter().map(String::as_str).collect());

    items
        .iter()
        .filter(|item| decks.contains(&item.deck))
        .filter(|item| {
            only.as_ref()
                .map_or(true, |set| set.contains(item.id.as_str()))
        })
        .filter(|item| item.is_eligible())
        .cloned()
        .collect()
}

/// Count items per deck, in deck order.
pub fn deck_counts(items: &[Item]) -> Vec<(Deck, usize)> {
    Deck::ALL
        .iter()
        .map(|deck| (*deck, items.iter().filter(|i| i.deck == *deck).count()))
        .filter(|(_, n)| *n > 0)
        .collect()
}

/// A non-fatal issue found in an otherwise loadable catalog.
#[derive(Debug, Clone)]
pub struct CatalogWarning {
    /// The item ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a loaded catalog for issues that do not block a session.
pub fn validate_catalog(items: &[Item]) -> Vec<CatalogWarning> {
    let mut warnings = Vec::new();

    for item in items {
        if item.exemplars.iter().any(|e| e.trim().is_empty()) {
            warnings.push(CatalogWarning {
                item_id: Some(item.id.clone()),
                message: "blank exemplar reference".into(),
            });
        }
        if item.deck == Deck::Prepositions
            && item
                .prompt_object
                .as_deref()
                .map_or(true, |o| o.trim().is_empty())
        {
            warnings.push(CatalogWarning {
                item_id: Some(item.id.clone()),
                message: "prepositions target has no prompt_object; prompt will say \"it\"".into(),
            });
        }
    }

    let mut by_label: HashMap<&str, Vec<&str>> = HashMap::new();
    for item in items {
        by_label
            .entry(item.label.as_str())
            .or_default()
            .push(item.id.as_str());
    }
    let mut shared: Vec<_> = by_label.into_iter().filter(|(_, ids)| ids.len() > 1).collect();
    shared.sort();
    for (label, ids) in shared {
        warnings.push(CatalogWarning {
            item_id: None,
            message: format!("label '{label}' is shared by {}", ids.join(", ")),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_JSON: &str = r#"[
        {"id": "apple", "deck": "nouns", "label": "apple",
         "exemplars": ["assets/nouns/apple_1.png", "assets/nouns/apple_2.png"]},
        {"id": "jumping", "deck": "actions", "label": "jumping",
         "exemplars": ["assets/actions/jumping.gif"]},
        {"id": "under", "deck": "prepositions", "label": "under",
         "exemplars": ["assets/prepositions/under.png"], "prompt_object": "ball"}
    ]"#;

    #[test]
    fn parse_valid_json() {
        let items = parse_catalog_json(VALID_JSON).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].exemplars.len(), 2);
        assert_eq!(items[2].prompt_object.as_deref(), Some("ball"));
    }

    #[test]
    fn parse_valid_toml() {
        let toml = r#"
[[items]]
id = "cup"
deck = "nouns"
label = "cup"
exemplars = ["assets/nouns/cup_1.png"]
"#;
        let items = parse_catalog_toml(toml).unwrap();
        assert_eq!(items[0].deck, Deck::Nouns);
    }

    #[test]
    fn rejects_non_array() {
        let err = parse_catalog_json(r#"{"id": "apple"}"#).unwrap_err();
        assert!(err.to_string().contains("must be an array"));
    }

    #[test]
    fn rejects_missing_label() {
        let err =
            parse_catalog_json(r#"[{"id": "a", "deck": "nouns", "exemplars": ["a.png"]}]"#)
                .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MissingField {
                record: 0,
                field: "label"
            }
        ));
    }

    #[test]
    fn rejects_empty_exemplars() {
        let err =
            parse_catalog_json(r#"[{"id": "a", "deck": "nouns", "label": "a", "exemplars": []}]"#)
                .unwrap_err();
        assert_eq!(err.to_string(), "target a needs exemplars");
    }

    #[test]
    fn rejects_unknown_deck_and_duplicates() {
        let unknown =
            parse_catalog_json(r#"[{"id": "a", "deck": "verbs", "label": "a", "exemplars": ["x"]}]"#)
                .unwrap_err();
        assert!(matches!(unknown, CatalogError::UnknownDeck { .. }));

        let dupes = parse_catalog_json(
            r#"[{"id": "a", "deck": "nouns", "label": "a", "exemplars": ["x"]},
                {"id": "a", "deck": "nouns", "label": "b", "exemplars": ["y"]}]"#,
        )
        .unwrap_err();
        assert!(matches!(dupes, CatalogError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn pool_filters_by_deck_and_ids() {
        let items = parse_catalog_json(VALID_JSON).unwrap();
        let pool = build_pool(&items, &[Deck::Nouns, Deck::Actions], None);
        assert_eq!(pool.len(), 2);

        let missed = vec!["jumping".to_string(), "under".to_string()];
        let pool = build_pool(&items, &[Deck::Nouns, Deck::Actions], Some(missed.as_slice()));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].id, "jumping");
    }

    #[test]
    fn pool_drops_items_without_exemplars() {
        let mut items = parse_catalog_json(VALID_JSON).unwrap();
        items[0].exemplars.clear();
        let pool = build_pool(&items, &Deck::ALL, None);
        assert!(pool.iter().all(|i| i.id != "apple"));
    }

    #[test]
    fn warnings_for_shared_labels_and_missing_object() {
        let mut items = parse_catalog_json(VALID_JSON).unwrap();
        items[2].prompt_object = None;
        items[1].label = "apple".into();
        let warnings = validate_catalog(&items);
        assert!(warnings.iter().any(|w| w.message.contains("prompt_object")));
        assert!(warnings.iter().any(|w| w.message.contains("shared by apple, jumping")));
    }

    #[test]
    fn load_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.json");
        std::fs::write(&path, VALID_JSON).unwrap();
        assert_eq!(load_catalog(&path).unwrap().len(), 3);

        let bad = dir.path().join("targets.yaml");
        std::fs::write(&bad, "").unwrap();
        assert!(matches!(
            load_catalog(&bad),
            Err(CatalogError::UnsupportedFormat(_))
        ));
    }
}
