//! URL-safe slugs derived from product names.

/// Lower-case ASCII alphanumerics joined by single hyphens.
///
/// Non-ASCII characters and punctuation act as separators. An input with
/// no usable characters yields `"item"` so that a slug is never empty.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("item");
    }
    slug
}

/// The `n`-th disambiguated candidate for a base slug (`n = 0` is the base).
pub fn candidate(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("  Running Shoes -- Pro  "), "running-shoes-pro");
        assert_eq!(slugify("USB-C Cable (2m)"), "usb-c-cable-2m");
    }

    #[test]
    fn empty_input_falls_back() {
        assert_eq!(slugify("!!!"), "item");
    }

    #[test]
    fn candidates_append_counter() {
        assert_eq!(candidate("phone", 0), "phone");
        assert_eq!(candidate("phone", 2), "phone-2");
    }
}
