use std::{collections::{BTreeMap, BTreeSet}, sync::LazyLock};

use regex::Regex;

use crate::common::{Theme, UnitId, UnitRecord};

/// A comma, optionally followed by whitespace.
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*").expect("valid separator pattern"));

/// Split a raw theme field into normalized labels, dropping blank tokens.
pub fn split_themes(raw: &str) -> Vec<Theme> {
    SEPARATOR.split(raw)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(Theme::new)
        .collect()
}

/// Many-to-many mapping between units and their theme labels.
#[derive(Debug, Clone, Default)]
pub struct ThemeIndex {
    themes: Vec<Theme>, // distinct, sorted
    by_unit: BTreeMap<UnitId, Vec<Theme>>,
}

impl ThemeIndex {
    /// Build the index from unit rows. A unit listed on several rows
    /// accumulates its themes in row order.
    pub fn build<'a>(units: impl IntoIterator<Item = &'a UnitRecord>) -> Self {
        let mut by_unit: BTreeMap<UnitId, Vec<Theme>> = BTreeMap::new();
        for record in units {
            by_unit.entry(record.id.clone()).or_default()
                .extend(split_themes(&record.themes));
        }

        let themes = by_unit.values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self { themes, by_unit }
    }

    /// All distinct themes, lexicographically sorted.
    #[inline] pub fn themes(&self) -> &[Theme] { &self.themes }

    /// Themes of `unit` in input order, duplicates kept. `None` if the unit is unknown.
    #[inline]
    pub fn themes_of(&self, unit: &str) -> Option<&[Theme]> {
        self.by_unit.get(unit).map(Vec::as_slice)
    }

    /// Known units, sorted by identifier.
    #[inline] pub fn units(&self) -> impl Iterator<Item = &UnitId> + '_ { self.by_unit.keys() }

    #[inline] pub fn num_units(&self) -> usize { self.by_unit.len() }
}
