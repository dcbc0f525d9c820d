use std::collections::BTreeMap;

use ahash::AHashMap;
use tracing::{debug, warn};

use crate::common::{RegionName, Theme, UnitId};

use super::ThemeIndex;

/// The most frequent theme in `themes`.
/// Ties go to the theme that appears first in the list, so the result never
/// depends on hash iteration order.
pub fn predominant(themes: &[Theme]) -> Option<&Theme> {
    let mut counts: AHashMap<&Theme, usize> = AHashMap::with_capacity(themes.len());
    for theme in themes {
        *counts.entry(theme).or_default() += 1;
    }

    let max = counts.values().copied().max()?;
    themes.iter().find(|theme| counts[theme] == max)
}

/// Predominant theme of every unit that has at least one theme.
pub fn resolve_units(index: &ThemeIndex) -> BTreeMap<UnitId, Theme> {
    index.units()
        .filter_map(|unit| {
            let themes = index.themes_of(unit.as_str())?;
            predominant(themes).map(|theme| (unit.clone(), theme.clone()))
        })
        .collect()
}

/// Predominant theme of every region, taken from its owning unit's theme bag.
/// Regions without an owner, owned by an unknown unit, or owned by a unit with
/// no themes are left out (they render neutral).
pub fn resolve_regions(owners: &BTreeMap<RegionName, Option<UnitId>>, index: &ThemeIndex) -> BTreeMap<RegionName, Theme> {
    let mut resolved = BTreeMap::new();
    for (region, owner) in owners {
        let Some(unit) = owner else { continue };

        let Some(themes) = index.themes_of(unit.as_str()) else {
            warn!(%region, %unit, "owning unit is not in the units table; region stays neutral");
            continue
        };

        match predominant(themes) {
            Some(theme) => { resolved.insert(region.clone(), theme.clone()); }
            None => debug!(%region, %unit, "owning unit has no themes; region stays neutral"),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::UnitRecord;

    fn themes(labels: &[&str]) -> Vec<Theme> { labels.iter().copied().map(Theme::new).collect() }

    #[test]
    fn picks_the_mode() {
        let list = themes(&["Saúde", "Educação", "Educação", "Artes"]);
        assert_eq!(predominant(&list).map(Theme::as_str), Some("Educação"));
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let list = themes(&["A", "B", "A", "B"]);
        for _ in 0..32 {
            assert_eq!(predominant(&list).map(Theme::as_str), Some("A"));
        }

        let list = themes(&["B", "A", "A", "B"]);
        assert_eq!(predominant(&list).map(Theme::as_str), Some("B"));

        let list = themes(&["Saúde", "Tecnologia"]);
        assert_eq!(predominant(&list).map(Theme::as_str), Some("Saúde"));
    }

    #[test]
    fn empty_list_has_no_mode() {
        assert_eq!(predominant(&[]), None);
    }

    #[test]
    fn winner_is_a_member_with_maximal_count() {
        let list = themes(&["C", "A", "B", "C", "A", "C", "B"]);
        let winner = predominant(&list).unwrap();
        let count = |t: &Theme| list.iter().filter(|x| *x == t).count();
        assert!(list.contains(winner));
        assert!(list.iter().all(|t| count(winner) >= count(t)));
    }

    #[test]
    fn regions_follow_their_owner() {
        let index = ThemeIndex::build(&[
            UnitRecord::new("PIN", "Educação, Artes, Educação"),
            UnitRecord::new("PIR", "Saúde, Tecnologia"),
            UnitRecord::new("VAZ", ""),
        ]);

        let owners: BTreeMap<RegionName, Option<UnitId>> = [
            ("A", Some("PIN")),
            ("B", Some("PIN")),
            ("C", Some("PIR")),
            ("D", None),
            ("E", Some("XYZ")),
            ("F", Some("VAZ")),
        ].into_iter()
            .map(|(region, owner)| (RegionName::new(region), owner.map(UnitId::new)))
            .collect();

        let resolved = resolve_regions(&owners, &index);
        assert_eq!(resolved.get("A").map(Theme::as_str), Some("Educação"));
        assert_eq!(resolved.get("B").map(Theme::as_str), Some("Educação"));
        assert_eq!(resolved.get("C").map(Theme::as_str), Some("Saúde"));
        assert_eq!(resolved.len(), 3);

        let units = resolve_units(&index);
        assert_eq!(units.get("PIR").map(Theme::as_str), Some("Saúde"));
        assert!(!units.contains_key("VAZ"));
    }
}
