use thiserror::Error;

pub const DEFAULT_COLORS: [&str; 6] = [
    "#7167F6", "#ED70B1", "#EF8759", "#99E4E5", "#F2EB47", "#89D86D",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
    #[error("palette must contain at least one color")]
    Empty,
    #[error("invalid palette color {0:?}, expected #RRGGBB")]
    InvalidColor(String),
}

/// Ordered display colors. Groups map onto it cyclically, so colors repeat
/// once there are more groups than entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    pub fn new<I, S>(colors: I) -> Result<Self, PaletteError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let colors = colors
            .into_iter()
            .map(|color| {
                let color = color.into();
                let color = color.trim().to_owned();
                if is_hex_color(&color) {
                    Ok(color)
                } else {
                    Err(PaletteError::InvalidColor(color))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }

        Ok(Self { colors })
    }

    /// Parses a comma separated list such as `#ff0000,#00ff00`.
    pub fn parse_list(raw: &str) -> Result<Self, PaletteError> {
        Self::new(raw.split(',').filter(|entry| !entry.trim().is_empty()))
    }

    pub fn color(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.iter().map(|color| (*color).to_owned()).collect(),
        }
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_cycle_by_index() {
        let palette = Palette::default();
        let k = palette.len();
        assert_eq!(palette.color(0), "#7167F6");
        assert_eq!(palette.color(k), palette.color(0));
        assert_eq!(palette.color(k + 3), palette.color(3));
    }

    #[test]
    fn rejects_empty_and_malformed_lists() {
        assert_eq!(Palette::parse_list(" , "), Err(PaletteError::Empty));
        assert_eq!(
            Palette::parse_list("#12345"),
            Err(PaletteError::InvalidColor("#12345".to_owned()))
        );
    }

    #[test]
    fn parses_custom_list() {
        let palette = Palette::parse_list("#000000, #FFFFFF").expect("valid palette");
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.color(1), "#FFFFFF");
        assert_eq!(palette.color(2), "#000000");
    }
}
