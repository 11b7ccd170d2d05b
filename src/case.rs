//! Identifier case helpers used when deriving table names, prefixes and path parameter names.

/// Convert a single identifier from CamelCase to snake_case.
/// e.g. "SweetPotato" -> "sweet_potato", "userId" -> "user_id"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else if c == ' ' || c == '-' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_alphanumeric();
        }
    }
    out
}

/// Path parameter name for an entity: lower-cased, spaces to underscores, `_id` suffix.
/// e.g. "Item" -> "item_id", "Garden Potato" -> "garden_potato_id"
pub fn path_param_name(entity_name: &str) -> String {
    format!("{}_id", entity_name.to_lowercase().replace(' ', "_"))
}

/// URL prefix: lower-cased, surrounding slashes trimmed, one leading slash.
/// e.g. "Potato" -> "/potato", "/api/carrot/" -> "/api/carrot"
pub fn normalize_prefix(raw: &str) -> String {
    format!("/{}", raw.to_lowercase().trim_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_splits_on_case_boundaries() {
        assert_eq!(to_snake_case("Potato"), "potato");
        assert_eq!(to_snake_case("SweetPotato"), "sweet_potato");
        assert_eq!(to_snake_case("userId"), "user_id");
        assert_eq!(to_snake_case("Garden Potato"), "garden_potato");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn param_name_from_entity_name() {
        assert_eq!(path_param_name("Item"), "item_id");
        assert_eq!(path_param_name("Garden Potato"), "garden_potato_id");
    }

    #[test]
    fn prefix_is_lowercase_with_single_leading_slash() {
        assert_eq!(normalize_prefix("Potato"), "/potato");
        assert_eq!(normalize_prefix("/api/Carrot/"), "/api/carrot");
    }
}
