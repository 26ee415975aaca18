//! Slug derivation and validation: lowercase hyphenated identifiers, made
//! team-unique by a numeric suffix on collision.

use regex::Regex;

use crate::ids::TeamId;
use crate::store::Tables;

fn slug_regex() -> Regex {
    Regex::new(r"^[a-z0-9-]+$").expect("static regex")
}

pub fn is_valid(slug: &str) -> bool {
    !slug.is_empty() && slug_regex().is_match(slug)
}

/// Lowercase, hyphenate a display name into a candidate slug. Does not
/// itself guarantee uniqueness; combine with `unique_slug`.
pub fn slugify(name: &str) -> String {
    let mut out = String::new();
    let mut last_was_dash = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_dash = false;
        } else if !last_was_dash && !out.is_empty() {
            out.push('-');
            last_was_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("service");
    }
    out
}

/// Find the next free team-unique slug derived from `base`: `base`,
/// `base-2`, `base-3`, ... The first `N` collisions produce a bijection
/// onto `{base, base-2, ..., base-N}`.
pub fn unique_slug(tables: &Tables, team: TeamId, base: &str) -> String {
    if tables.find_service_by_slug(team, base).is_none() {
        return base.to_string();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}-{n}");
        if tables.find_service_by_slug(team, &candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}

/// Same collision behaviour, scoped to solution slugs instead of services.
pub fn unique_solution_slug(tables: &Tables, team: TeamId, base: &str) -> String {
    if tables.find_solution_by_slug(team, base).is_none() {
        return base.to_string();
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}-{n}");
        if tables.find_solution_by_slug(team, &candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Order Service!!"), "order-service");
        assert_eq!(slugify("  leading "), "leading");
        assert_eq!(slugify("___"), "service");
    }

    #[test]
    fn validates_charset() {
        assert!(is_valid("order-service-2"));
        assert!(!is_valid("Order_Service"));
        assert!(!is_valid(""));
    }
}
