use std::collections::BTreeMap;

use plotters::style::RGBColor;

use crate::error::{PlotError, Result};

/// Plain colour stored in figure models; converted to a plotters colour when
/// drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl From<Rgb> for RGBColor {
    fn from(c: Rgb) -> Self {
        RGBColor(c.0, c.1, c.2)
    }
}

impl From<colorous::Color> for Rgb {
    fn from(c: colorous::Color) -> Self {
        Rgb(c.r, c.g, c.b)
    }
}

pub const SUN: Rgb = Rgb(255, 215, 0);
pub const MOON_FOOTPRINT: Rgb = Rgb(211, 211, 211);
pub const MOON_VISITS: Rgb = Rgb(255, 165, 0);
pub const HORIZON: Rgb = Rgb(0, 0, 0);
pub const ZENITH_LIMIT: Rgb = Rgb(220, 30, 30);
pub const GRATICULE: Rgb = Rgb(200, 200, 200);
pub const ECLIPTIC: Rgb = Rgb(120, 170, 120);

/// Marker radius per passband, largest for `u`.
pub const BAND_SIZES: [(&str, u32); 6] =
    [("u", 15), ("g", 13), ("r", 11), ("i", 9), ("z", 7), ("y", 5)];

/// Stroke pattern of a reward curve, chosen by scheduler tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dash {
    Solid,
    Dashed,
    DotDash,
    Dotted,
}

impl Dash {
    pub fn for_tier(tier: usize) -> Self {
        match tier {
            0 | 1 => Dash::Solid,
            2 => Dash::Dashed,
            3 => Dash::DotDash,
            _ => Dash::Dotted,
        }
    }

    /// Dash length and gap in pixels, `None` for a solid stroke.
    pub(crate) fn pattern(self) -> Option<(u32, u32)> {
        match self {
            Dash::Solid => None,
            Dash::Dashed => Some((8, 4)),
            Dash::DotDash => Some((5, 3)),
            Dash::Dotted => Some((2, 3)),
        }
    }
}

/// Categorical colour for the `index`-th series.
pub fn categorical(index: usize) -> Rgb {
    colorous::CATEGORY10[index % colorous::CATEGORY10.len()].into()
}

/// Sequential colour map with a fixed value range.
#[derive(Debug, Clone, Copy)]
pub enum ColourMap {
    /// 0 light, `high` dark red.
    Reds { high: f64 },
    Greys { high: f64 },
}

impl ColourMap {
    pub fn colour(&self, value: f64) -> Rgb {
        let (gradient, high) = match *self {
            ColourMap::Reds { high } => (colorous::REDS, high),
            ColourMap::Greys { high } => (colorous::GREYS, high),
        };
        let t = (value / high).clamp(0.0, 1.0);
        gradient.eval_continuous(t).into()
    }
}

/// Parse `#rrggbb`.
pub fn parse_hex(hex: &str) -> Result<Rgb> {
    let digits = hex
        .strip_prefix('#')
        .filter(|d| d.len() == 6 && d.is_ascii())
        .ok_or_else(|| PlotError::InvalidColour(hex.to_string()))?;
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| PlotError::InvalidColour(hex.to_string()))
    };
    Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Marker style for each passband, in `ugrizy` order.
#[derive(Debug, Clone)]
pub struct BandStyles {
    styles: Vec<(String, Rgb, u32)>,
}

impl BandStyles {
    /// Build from configured `#rrggbb` colours; a band without a colour is
    /// drawn black.
    pub fn from_hex(colours: &BTreeMap<String, String>) -> Result<Self> {
        let styles = BAND_SIZES
            .iter()
            .map(|&(band, size)| {
                let colour = match colours.get(band) {
                    Some(hex) => parse_hex(hex)?,
                    None => Rgb(0, 0, 0),
                };
                Ok((band.to_string(), colour, size))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { styles })
    }

    pub fn get(&self, band: &str) -> Option<(Rgb, u32)> {
        self.styles
            .iter()
            .find(|(b, _, _)| b == band)
            .map(|&(_, colour, size)| (colour, size))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb, u32)> {
        self.styles.iter().map(|(b, c, s)| (b.as_str(), *c, *s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_map_to_dash_patterns() {
        assert_eq!(Dash::for_tier(0), Dash::Solid);
        assert_eq!(Dash::for_tier(1), Dash::Solid);
        assert_eq!(Dash::for_tier(2), Dash::Dashed);
        assert_eq!(Dash::for_tier(3), Dash::DotDash);
        assert_eq!(Dash::for_tier(7), Dash::Dotted);
    }

    #[test]
    fn hex_colours_parse() {
        assert_eq!(parse_hex("#ff4000").unwrap(), Rgb(255, 64, 0));
        assert!(parse_hex("ff4000").is_err());
        assert!(parse_hex("#ff40").is_err());
        assert!(parse_hex("#gg0000").is_err());
    }

    #[test]
    fn colour_maps_darken_with_value() {
        let reds = ColourMap::Reds { high: 5.0 };
        let light = reds.colour(0.0);
        let dark = reds.colour(5.0);
        let sum = |c: Rgb| u32::from(c.0) + u32::from(c.1) + u32::from(c.2);
        assert!(sum(dark) < sum(light));
        // values past the range saturate
        assert_eq!(reds.colour(50.0), dark);
    }

    #[test]
    fn band_styles_follow_ugrizy_sizes() {
        let colours = BTreeMap::from([("u".to_string(), "#56b4e9".to_string())]);
        let styles = BandStyles::from_hex(&colours).unwrap();
        assert_eq!(styles.get("u"), Some((Rgb(0x56, 0xb4, 0xe9), 15)));
        assert_eq!(styles.get("y"), Some((Rgb(0, 0, 0), 5)));
        assert!(styles.get("x").is_none());
    }
}
