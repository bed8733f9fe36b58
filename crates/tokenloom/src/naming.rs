//! Cross-platform identifiers derived from token paths.
//!
//! | Path | CSS variable | JS property |
//! |------|--------------|-------------|
//! | `sys.color.action.primary.default` | `--sys-color-action-primary-default` | `sysColorActionPrimaryDefault` |
//! | `ref.spacing.100` | `--ref-spacing-100` | `refSpacing100` |
//! | `cmp.button.fontSize` | `--cmp-button-font-size` | `cmpButtonFontSize` |
//!
//! Non-ASCII segment names are transliterated with `deunicode` first so
//! identifiers stay valid in every target.

use deunicode::deunicode;

/// Splits a path segment into lowercase-able words on separators and
/// camelCase boundaries.
fn words(segment: &str) -> Vec<String> {
    let ascii = deunicode(segment);
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower_or_digit = false;

    for c in ascii.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower_or_digit = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower_or_digit && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower_or_digit = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Kebab-cases a single name: `fontFamily` → `font-family`.
pub fn kebab_case(name: &str) -> String {
    words(name)
        .iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// CSS custom property name for a token path, with an optional prefix.
pub fn css_variable_name(path: &str, prefix: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        parts.push(kebab_case(prefix));
    }
    parts.extend(path.split('.').map(kebab_case).filter(|p| !p.is_empty()));
    format!("--{}", parts.join("-"))
}

/// JS property name: all words camel-cased, first word lowercase.
pub fn js_identifier(path: &str) -> String {
    let mut ident = String::new();
    for word in path.split('.').flat_map(words) {
        let lower = word.to_ascii_lowercase();
        if ident.is_empty() {
            ident.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                ident.push(first.to_ascii_uppercase());
                ident.push_str(chars.as_str());
            }
        }
    }
    match ident.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{}", ident),
        Some(_) => ident,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_variable_name() {
        assert_eq!(
            css_variable_name("sys.color.action.primary.default", None),
            "--sys-color-action-primary-default"
        );
        assert_eq!(
            css_variable_name("cmp.button.fontSize", None),
            "--cmp-button-font-size"
        );
        assert_eq!(
            css_variable_name("sys.spacing.sm", Some("acme")),
            "--acme-sys-spacing-sm"
        );
        assert_eq!(css_variable_name("sys.spacing.sm", Some("")), "--sys-spacing-sm");
    }

    #[test]
    fn test_js_identifier() {
        assert_eq!(
            js_identifier("sys.color.action.primary.default"),
            "sysColorActionPrimaryDefault"
        );
        assert_eq!(js_identifier("ref.spacing.100"), "refSpacing100");
        assert_eq!(js_identifier("ref.font.weight.semi-bold"), "refFontWeightSemiBold");
        assert_eq!(js_identifier("cmp.button.fontSize"), "cmpButtonFontSize");
        assert_eq!(js_identifier("2xl.gap"), "_2xlGap");
    }

    #[test]
    fn test_non_ascii_segments_are_transliterated() {
        assert_eq!(css_variable_name("ref.color.café", None), "--ref-color-cafe");
        assert_eq!(js_identifier("ref.color.café"), "refColorCafe");
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("letterSpacing"), "letter-spacing");
        assert_eq!(kebab_case("line height"), "line-height");
        assert_eq!(kebab_case("semi-bold"), "semi-bold");
    }
}
