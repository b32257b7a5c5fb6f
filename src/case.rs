//! String case conversions used to match configuration keys against
//! constructor parameter names.

/// Convert to StudlyCase: split on `-`, `_` and whitespace, capitalize every
/// word and join them.
pub fn studly_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());

    for word in s.split(|c: char| c == '-' || c == '_' || c.is_whitespace()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }

    result
}

/// Convert to camelCase: StudlyCase with the first letter lowered.
pub fn camel_case(s: &str) -> String {
    let studly = studly_case(s);
    let mut chars = studly.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert to snake_case.
///
/// Input made only of lowercase letters is returned unchanged. Otherwise
/// whitespace is dropped, an underscore is inserted before every uppercase
/// letter that is not the first character, and the result is lowercased.
pub fn snake_case(s: &str) -> String {
    if !s.is_empty() && s.chars().all(char::is_lowercase) {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().filter(|c| !c.is_whitespace()).enumerate() {
        if c.is_uppercase() {
            if i != 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}
