//! Stable colour assignment for themes and units.

use std::{borrow::Borrow, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Simple RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self { Self { r, g, b } }

    /// Parse `#rrggbb` (case-insensitive).
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#')?;
        if digits.len() != 6 { return None }
        let bytes = hex::decode(digits).ok()?;
        Some(Self::new(bytes[0], bytes[1], bytes[2]))
    }
}

impl fmt::Display for Rgb {
    /// Format as CSS hex: #rrggbb
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", hex::encode([self.r, self.g, self.b]))
    }
}

/// HSL color: h in degrees, s and l in [0.0, 1.0].
#[derive(Clone, Copy, Debug)]
pub(crate) struct Hsl {
    pub(crate) h: f64,
    pub(crate) s: f64,
    pub(crate) l: f64,
}

impl From<Hsl> for Rgb {
    fn from(hsl: Hsl) -> Self {
        // normalize hue into [0,360)
        let h = (hsl.h % 360.0 + 360.0) % 360.0;
        let s = hsl.s.clamp(0.0, 1.0);
        let l = hsl.l.clamp(0.0, 1.0);

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = l - chroma / 2.0;

        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb::new(channel(r), channel(g), channel(b))
    }
}

/// Tableau 10 qualitative palette.
const TABLEAU: [Rgb; 10] = [
    Rgb::new(0x4e, 0x79, 0xa7),
    Rgb::new(0xf2, 0x8e, 0x2b),
    Rgb::new(0xe1, 0x57, 0x59),
    Rgb::new(0x76, 0xb7, 0xb2),
    Rgb::new(0x59, 0xa1, 0x4f),
    Rgb::new(0xed, 0xc9, 0x48),
    Rgb::new(0xb0, 0x7a, 0xa1),
    Rgb::new(0xff, 0x9d, 0xa7),
    Rgb::new(0x9c, 0x75, 0x5f),
    Rgb::new(0xba, 0xb0, 0xac),
];

const GOLDEN_ANGLE: f64 = 137.50776405;

fn golden_angle_color(index: usize) -> Hsl {
    Hsl { h: ((index as f64) * GOLDEN_ANGLE) % 360.0, s: 0.70, l: 0.55 }
}

/// Colour scheme used to turn a sorted position into a colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    /// Fixed 10-colour palette, reused cyclically.
    #[default]
    Tableau,
    /// Hues spaced by the golden angle; never repeats exactly.
    GoldenAngle,
}

impl Palette {
    /// Colour of the `index`-th entry of a sorted list.
    pub fn color(self, index: usize) -> Rgb {
        match self {
            Palette::Tableau => TABLEAU[index % TABLEAU.len()],
            Palette::GoldenAngle => golden_angle_color(index).into(),
        }
    }
}

/// Key → colour, assigned from the sorted, deduplicated key list.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorMap<K: Ord> {
    colors: BTreeMap<K, Rgb>,
}

impl<K: Ord> ColorMap<K> {
    /// Assign colours. The input order is irrelevant: keys are sorted and
    /// deduplicated before indexing into the palette.
    pub fn assign(keys: impl IntoIterator<Item = K>, palette: Palette) -> Self {
        let mut sorted = keys.into_iter().collect::<Vec<_>>();
        sorted.sort();
        sorted.dedup();

        let colors = sorted.into_iter()
            .enumerate()
            .map(|(i, key)| (key, palette.color(i)))
            .collect();

        Self { colors }
    }

    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<Rgb> where K: Borrow<Q>, Q: Ord + ?Sized {
        self.colors.get(key).copied()
    }

    #[inline] pub fn iter(&self) -> impl Iterator<Item = (&K, Rgb)> + '_ { self.colors.iter().map(|(k, c)| (k, *c)) }

    #[inline] pub fn len(&self) -> usize { self.colors.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.colors.is_empty() }
}
