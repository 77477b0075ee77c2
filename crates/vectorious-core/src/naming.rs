//! Per-type unique display names.
//!
//! Names are plain text conventions rather than identifiers: `Rectangle`,
//! `Rectangle (2)`, `Circle Copy`, `Circle Copy (3)`. Uniqueness is scoped to
//! drawables of the same type tag, so a `Rectangle` circle and a `Rectangle`
//! rect may coexist.

use crate::drawable::Drawable;

const COPY: &str = "Copy";

/// How a new name relates to the one it is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMode {
    /// A newly created drawable.
    Fresh,
    /// A pasted duplicate of a drawable carrying the base name.
    Copy,
}

/// Display name used for a drawable that has none.
pub fn default_name(type_tag: &str, index: usize) -> String {
    let name = match type_tag {
        "rect" => "Rectangle",
        "circle" => "Circle",
        "triangle" => "Triangle",
        "line" => "Line",
        "polygon" => "Hexagon",
        "ellipse" => "Ellipse",
        "group" => "Group",
        "path" => "Path",
        _ => "Object",
    };
    format!("{} {}", name, index + 1)
}

/// Pick a name for a drawable of `type_tag` that no existing drawable of that
/// type carries.
pub fn unique_name(objects: &[&Drawable], base_name: &str, type_tag: &str, mode: NameMode) -> String {
    let names: Vec<&str> = objects
        .iter()
        .filter(|d| d.type_tag() == type_tag)
        .filter_map(|d| d.name.as_deref())
        .filter(|name| !name.is_empty())
        .collect();

    match mode {
        NameMode::Fresh => fresh_name(&names, base_name),
        NameMode::Copy => copy_name(&names, base_name),
    }
}

fn fresh_name(names: &[&str], base_name: &str) -> String {
    let clean = clean_base(base_name);
    let originals: Vec<&str> = names.iter().copied().filter(|name| !name.contains(" Copy")).collect();

    let mut matched = false;
    let mut highest = 0;
    for name in &originals {
        if *name == clean {
            matched = true;
            highest = highest.max(1);
        } else if let Some(counter) = counter_after(name, clean) {
            matched = true;
            highest = highest.max(counter);
        }
    }

    if !matched {
        return clean.to_string();
    }

    // A free bare name is reused even when numbered siblings exist.
    let next = if originals.contains(&clean) { highest + 1 } else { 1 };
    if next == 1 {
        clean.to_string()
    } else {
        format!("{} ({})", clean, next)
    }
}

fn copy_name(names: &[&str], original: &str) -> String {
    if !names.contains(&original) {
        return original.to_string();
    }

    let copy_base = format!("{} {}", original, COPY);
    let mut matched = false;
    let mut highest = 1;
    for name in names {
        let Some(rest) = name.strip_prefix(copy_base.as_str()) else {
            continue;
        };
        if rest.is_empty() {
            matched = true;
        } else if let Some(("", counter)) = split_counter(rest.trim_start()) {
            matched = true;
            highest = highest.max(counter);
        }
    }

    if matched {
        format!("{} ({})", copy_base, highest + 1)
    } else {
        copy_base
    }
}

/// Strip a trailing ` (N)` and then a trailing ` Copy` / ` Copy (N)`.
fn clean_base(base_name: &str) -> &str {
    let base = match split_counter(base_name) {
        Some((prefix, _)) => prefix.trim_end(),
        None => base_name,
    };

    let without_counter = split_counter(base).map_or(base, |(prefix, _)| prefix).trim_end();
    let base = match without_counter.strip_suffix(COPY) {
        Some(prefix) => prefix.trim_end(),
        None => base,
    };

    base.trim()
}

/// `name` is `prefix`, optional whitespace, then `(N)`.
fn counter_after(name: &str, prefix: &str) -> Option<u64> {
    let (head, counter) = split_counter(name)?;
    let rest = head.strip_prefix(prefix)?;
    rest.chars().all(char::is_whitespace).then_some(counter)
}

/// Split `"text(N)"` into `("text", N)` when the string ends in a
/// parenthesized decimal counter.
fn split_counter(s: &str) -> Option<(&str, u64)> {
    let inner = s.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let digits = &inner[open + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let counter = digits.parse().ok()?;
    Some((&s[..open], counter))
}
