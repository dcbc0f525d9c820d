use crate::common::{RegionName, Theme, UnitId};

use super::{ColorMap, Rgb};

const STROKE: Rgb = Rgb::new(0xff, 0xff, 0xff);

/// Properties of one region feature as seen by the renderer.
#[derive(Clone, Copy, Debug)]
pub struct RegionProperties<'a> {
    pub name: &'a RegionName,
    pub owner: Option<&'a UnitId>,
    pub theme: Option<&'a Theme>,
}

/// Paint instructions for one feature.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleRecord {
    pub fill: Rgb,
    pub fill_opacity: f64,
    pub stroke: Rgb,
    pub weight: f64,
}

/// Style of a region: its theme's colour, or `neutral` when the region has no
/// predominant theme (or the theme is missing from `colors`).
pub fn style_for(props: &RegionProperties<'_>, colors: &ColorMap<Theme>, neutral: Rgb) -> StyleRecord {
    match props.theme.and_then(|theme| colors.get(theme)) {
        Some(fill) => StyleRecord { fill, fill_opacity: 0.7, stroke: STROKE, weight: 0.5 },
        None => StyleRecord { fill: neutral, fill_opacity: 0.3, stroke: STROKE, weight: 0.5 },
    }
}

/// Style of a unit's coverage outline or border band.
pub fn unit_style(unit: &UnitId, colors: &ColorMap<UnitId>, neutral: Rgb) -> StyleRecord {
    let color = colors.get(unit).unwrap_or(neutral);
    StyleRecord { fill: color, fill_opacity: 0.5, stroke: color, weight: 2.0 }
}

/// Style of a unit with no predominant theme, drawn as background.
pub fn neutral_unit_style(neutral: Rgb) -> StyleRecord {
    StyleRecord { fill: neutral, fill_opacity: 0.3, stroke: neutral, weight: 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Palette;

    #[test]
    fn themed_and_neutral_regions() {
        let colors = ColorMap::assign([Theme::new("Educação"), Theme::new("Saúde")], Palette::Tableau);
        let neutral = Rgb::new(0xcc, 0xcc, 0xcc);
        let name = RegionName::new("Campinas");
        let owner = UnitId::new("PIN");
        let theme = Theme::new("Saúde");

        let themed = style_for(&RegionProperties { name: &name, owner: Some(&owner), theme: Some(&theme) }, &colors, neutral);
        assert_eq!(Some(themed.fill), colors.get("Saúde"));
        assert_eq!(themed.fill_opacity, 0.7);

        let unowned = style_for(&RegionProperties { name: &name, owner: None, theme: None }, &colors, neutral);
        assert_eq!(unowned.fill, neutral);

        let stray = Theme::new("Moda");
        let unknown = style_for(&RegionProperties { name: &name, owner: Some(&owner), theme: Some(&stray) }, &colors, neutral);
        assert_eq!(unknown.fill, neutral);
    }

    #[test]
    fn unit_styles() {
        let colors = ColorMap::assign([UnitId::new("PIN"), UnitId::new("PIR")], Palette::Tableau);
        let neutral = Rgb::new(0xcc, 0xcc, 0xcc);

        let pin = unit_style(&UnitId::new("PIN"), &colors, neutral);
        assert_eq!(Some(pin.fill), colors.get("PIN"));
        assert_eq!(pin.stroke, pin.fill);

        let background = neutral_unit_style(neutral);
        assert_eq!((background.fill, background.stroke), (neutral, neutral));
        assert!(background.fill_opacity < pin.fill_opacity);
    }
}
