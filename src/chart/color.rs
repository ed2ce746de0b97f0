use crate::error::{Result, StatsError};
use ratatui::style::Color;

/// Parse `#RRGGBB` (leading `#` optional).
pub fn parse_hex_color(hex: &str) -> Result<(u8, u8, u8)> {
    let digits = hex.trim().trim_start_matches('#');
    let invalid = || StatsError::InvalidConfig(format!("'{hex}' is not a #RRGGBB color"));
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
    Ok((channel(0)?, channel(2)?, channel(4)?))
}

fn lighten((r, g, b): (u8, u8, u8)) -> (f64, f64, f64) {
    let lift = |c: u8| {
        let c = c as f64 / 255.0;
        (c + (1.0 - c) * 0.5).clamp(0.0, 1.0)
    };
    (lift(r), lift(g), lift(b))
}

/// `n` colors running from the base color to a half-lightened version of it.
pub fn gradient_colors(base: (u8, u8, u8), n: usize) -> Vec<Color> {
    let light = lighten(base);
    let dark = (base.0 as f64 / 255.0, base.1 as f64 / 255.0, base.2 as f64 / 255.0);
    let to_u8 = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;

    (0..n)
        .map(|i| {
            // distance from the base color
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 1.0 };
            Color::Rgb(
                to_u8(dark.0 + (light.0 - dark.0) * t),
                to_u8(dark.1 + (light.1 - dark.1) * t),
                to_u8(dark.2 + (light.2 - dark.2) * t),
            )
        })
        .collect()
}

pub fn base_color(base: (u8, u8, u8)) -> Color {
    Color::Rgb(base.0, base.1, base.2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#773ee9").unwrap(), (0x77, 0x3e, 0xe9));
        assert_eq!(parse_hex_color("FFFFFF").unwrap(), (255, 255, 255));
        assert!(parse_hex_color("#77ee9").is_err());
        assert!(parse_hex_color("#zz3ee9").is_err());
    }

    #[test]
    fn gradient_runs_from_base_to_light() {
        let colors = gradient_colors((0x77, 0x3e, 0xe9), 3);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0], Color::Rgb(0x77, 0x3e, 0xe9));
        // halfway to white
        assert_eq!(colors[2], Color::Rgb(187, 158, 244));
    }

    #[test]
    fn single_color_gradient_is_light() {
        assert_eq!(gradient_colors((0, 0, 0), 1), vec![Color::Rgb(128, 128, 128)]);
    }
}
