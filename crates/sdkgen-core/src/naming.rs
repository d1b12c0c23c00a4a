//! Language-neutral identifier transformations.
//!
//! Casing helpers shared by every convention service, plus the cleanup rules
//! that turn arbitrary API description names (path segments, property keys,
//! enum values) into symbols.

// External imports (alphabetized)
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SYMBOL_CLEANUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^A-Za-z0-9_]+(?P<following>[A-Za-z0-9])?"#).expect("valid symbol cleanup regex")
});

static PATH_PARAMETER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(?P<name>[^}]+)\}").expect("valid path parameter regex"));

/// Property names the generated models reserve for their own plumbing
pub const STRUCTURAL_RESERVED_NAMES: &[&str] = &["additionalData", "backingStore"];

/// Convert a string to snake_case
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let mut prev_is_lowercase = false;

    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 && prev_is_lowercase {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
            prev_is_lowercase = false;
        } else if ch.is_alphanumeric() {
            result.push(ch);
            prev_is_lowercase = ch.is_lowercase() || ch.is_ascii_digit();
        } else if ch == '-' || ch == '_' || ch == ' ' || ch == '.' {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            prev_is_lowercase = false;
        }
    }

    result.trim_matches('_').to_string()
}

/// Convert a string to UpperCamelCase (PascalCase)
pub fn to_upper_camel_case(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .filter(|s| !s.is_empty())
        .map(to_first_upper)
        .collect()
}

/// Convert a string to lowerCamelCase
pub fn to_lower_camel_case(s: &str) -> String {
    to_first_lower(&to_upper_camel_case(s))
}

/// Convert a string to UPPER_SNAKE_CASE
pub fn to_upper_snake_case(s: &str) -> String {
    to_snake_case(s).to_uppercase()
}

/// Upper-case the first character, leaving the rest untouched
pub fn to_first_upper(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Lower-case the first character, leaving the rest untouched
pub fn to_first_lower(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Strip characters that cannot appear in a symbol.
///
/// A run of special characters is removed and the letter that follows it is
/// upper-cased, so `user-id` becomes `userId` and `$select` becomes `Select`.
/// A leading digit is spelled out because no target accepts it.
pub fn cleanup_symbol_name(original: &str) -> String {
    let cleaned = SYMBOL_CLEANUP.replace_all(original, |caps: &Captures| {
        caps.name("following")
            .map(|m| m.as_str().to_uppercase())
            .unwrap_or_default()
    });
    let mut result = cleaned.into_owned();
    if let Some(first) = result.chars().next() {
        if let Some(word) = spell_digit(first) {
            result = format!("{}{}", word, &result[first.len_utf8()..]);
        }
    }
    if result.is_empty() {
        return "empty".to_string();
    }
    result
}

fn spell_digit(ch: char) -> Option<&'static str> {
    let word = match ch {
        '0' => "Zero",
        '1' => "One",
        '2' => "Two",
        '3' => "Three",
        '4' => "Four",
        '5' => "Five",
        '6' => "Six",
        '7' => "Seven",
        '8' => "Eight",
        '9' => "Nine",
        _ => return None,
    };
    Some(word)
}

/// Flatten a description so it fits a single doc-comment paragraph
pub fn clean_description(description: &str) -> String {
    description
        .replace('\r', "")
        .split(|c| c == '\n' || c == '\t')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Percent-encode a parameter name so it is a valid RFC 6570 variable name
pub fn sanitize_parameter_name_for_url_template(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' {
            result.push(byte as char);
        } else {
            result.push_str(&format!("%{:02X}", byte));
        }
    }
    result
}

/// Names of the `{variables}` appearing in a path segment, in order
pub fn path_parameters(segment: &str) -> Vec<String> {
    PATH_PARAMETER
        .captures_iter(segment)
        .filter_map(|caps| caps.name("name").map(|m| m.as_str().to_string()))
        .collect()
}

/// Rewrite `{variable}` occurrences inside a segment
pub fn replace_path_parameters(segment: &str, replace: impl Fn(&str) -> String) -> String {
    PATH_PARAMETER
        .replace_all(segment, |caps: &Captures| {
            caps.name("name").map(|m| replace(m.as_str())).unwrap_or_default()
        })
        .into_owned()
}

/// Whether a segment is exactly one `{variable}`
pub fn is_single_parameter_segment(segment: &str) -> bool {
    segment.starts_with('{')
        && segment.ends_with('}')
        && segment.matches('{').count() == 1
        && segment.matches('}').count() == 1
}

/// Suffix a property name that would shadow generated plumbing
pub fn avoid_structural_names(name: String) -> String {
    if STRUCTURAL_RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(&name))
    {
        format!("{name}Property")
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("findPetsByStatus"), "find_pets_by_status");
        assert_eq!(to_snake_case("FindPetsByStatus"), "find_pets_by_status");
        assert_eq!(to_snake_case("find-pets-by-status"), "find_pets_by_status");
        assert_eq!(to_snake_case("HTTPResponse"), "httpresponse");
        assert_eq!(to_snake_case("get HTTP Response"), "get_http_response");
        assert_eq!(to_snake_case("version2Beta"), "version2_beta");
    }

    #[test]
    fn test_to_upper_camel_case() {
        assert_eq!(
            to_upper_camel_case("find_pets_by_status"),
            "FindPetsByStatus"
        );
        assert_eq!(to_upper_camel_case("findPetsByStatus"), "FindPetsByStatus");
        assert_eq!(to_upper_camel_case("http_response"), "HttpResponse");
    }

    #[test]
    fn test_to_lower_camel_case() {
        assert_eq!(to_lower_camel_case("FindPetsByStatus"), "findPetsByStatus");
        assert_eq!(to_lower_camel_case("find-pets-by-status"), "findPetsByStatus");
        assert_eq!(to_upper_snake_case("findPets"), "FIND_PETS");
    }

    #[test]
    fn test_cleanup_symbol_name() {
        assert_eq!(cleanup_symbol_name("user-id"), "userId");
        assert_eq!(cleanup_symbol_name("$select"), "Select");
        assert_eq!(cleanup_symbol_name("a.b/c"), "aBC");
        assert_eq!(cleanup_symbol_name("snake_case"), "snake_case");
        assert_eq!(cleanup_symbol_name("1stPlace"), "OnestPlace");
        assert_eq!(cleanup_symbol_name("---"), "empty");
    }

    #[test]
    fn test_clean_description() {
        assert_eq!(
            clean_description("first line\r\nsecond\tline\n"),
            "first line second line"
        );
    }

    #[test]
    fn test_sanitize_parameter_name_for_url_template() {
        assert_eq!(sanitize_parameter_name_for_url_template("user-id"), "user%2Did");
        assert_eq!(sanitize_parameter_name_for_url_template("a.b~c"), "a%2Eb%7Ec");
        assert_eq!(sanitize_parameter_name_for_url_template("$top"), "%24top");
        assert_eq!(sanitize_parameter_name_for_url_template("plain_id"), "plain_id");
    }

    #[test]
    fn test_path_parameters() {
        assert_eq!(path_parameters("{id}"), ["id"]);
        assert_eq!(path_parameters("range(start={a},end={b})"), ["a", "b"]);
        assert!(is_single_parameter_segment("{user-id}"));
        assert!(!is_single_parameter_segment("range({a})"));
        assert_eq!(
            replace_path_parameters("range(start={a})", |n| format!("With{n}")),
            "range(start=Witha)"
        );
    }

    #[test]
    fn test_avoid_structural_names() {
        assert_eq!(avoid_structural_names("additionalData".into()), "additionalDataProperty");
        assert_eq!(avoid_structural_names("name".into()), "name");
    }
}
