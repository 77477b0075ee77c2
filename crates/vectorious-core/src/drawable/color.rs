//! CSS color string parsing for raster previews.

/// Parse a CSS color string into RGBA8.
///
/// Supports `transparent`, `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` and
/// `rgba(r, g, b, a)` with `a` in `0.0..=1.0`. Returns `None` for anything else.
pub fn parse_color(color: &str) -> Option<[u8; 4]> {
    let color = color.trim();
    if color.eq_ignore_ascii_case("transparent") {
        return Some([0, 0, 0, 0]);
    }

    if let Some(hex) = color.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = color.to_ascii_lowercase();
    if let Some(args) = lower.strip_prefix("rgba(").and_then(|s| s.strip_suffix(')')) {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return None;
        }
        let alpha: f64 = parts[3].parse().ok()?;
        return Some([
            parts[0].parse().ok()?,
            parts[1].parse().ok()?,
            parts[2].parse().ok()?,
            (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]);
    }
    if let Some(args) = lower.strip_prefix("rgb(").and_then(|s| s.strip_suffix(')')) {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return None;
        }
        return Some([parts[0].parse().ok()?, parts[1].parse().ok()?, parts[2].parse().ok()?, 255]);
    }

    None
}

fn parse_hex(hex: &str) -> Option<[u8; 4]> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        // #rgb -> #rrggbb
        3 => Some([
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
            255,
        ]),
        6 => Some([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?, 255]),
        8 => Some([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        ]),
        _ => None,
    }
}
