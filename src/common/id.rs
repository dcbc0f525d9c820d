use std::{borrow::Borrow, fmt, sync::Arc};

/// Declares a cheap-to-clone string key. Keeps the original text but avoids
/// repeated owned Strings when the same key is shared across many maps.
macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self { Self(Arc::from(id.as_ref())) }

            #[inline] pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str { &self.0 }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self { Self::new(id) }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self { Self(Arc::from(id)) }
        }
    };
}

string_key!(
    /// Identifier of an operating unit, e.g. `"PIN"`.
    UnitId
);

string_key!(
    /// Name of an administrative sub-area (municipality), the join key between
    /// the ownership table and the boundary data.
    RegionName
);

string_key!(
    /// A normalized (trimmed, non-empty) theme label.
    Theme
);

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn ordering_follows_text() {
        assert!(UnitId::new("PIN") < UnitId::new("PIR"));
        assert!(Theme::new("Artes") < Theme::new("Educação"));
    }

    #[test]
    fn lookup_by_str() {
        let mut map = BTreeMap::new();
        map.insert(RegionName::new("Campinas"), 1);
        assert_eq!(map.get("Campinas"), Some(&1));
        assert_eq!(RegionName::from("Campinas").to_string(), "Campinas");
    }
}
