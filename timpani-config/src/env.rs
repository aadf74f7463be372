use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

/// Overwrites `*field` with the value of `var`, if set.
///
/// Mirrors `knhk-config::env::apply_env_overrides`'s "env wins over file"
/// layering, specialized for `String` fields.
pub fn env_override(var: &str, field: &mut String) {
    if let Ok(value) = std::env::var(var) {
        *field = value;
    }
}

/// Like [`env_override`] but for a `bool` field, accepting the usual
/// `true`/`false`/`1`/`0` spellings.
pub fn env_override_bool(var: &str, field: &mut bool) -> ConfigResult<()> {
    if let Ok(value) = std::env::var(var) {
        *field = match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => return Err(ConfigError::InvalidEnvValue { var: var.to_string(), value }),
        };
    }
    Ok(())
}

/// Like [`env_override`] but parses the value via `T::from_str`.
pub fn env_override_parsed<T>(var: &str, field: &mut T) -> ConfigResult<()>
where
    T: FromStr,
{
    if let Ok(value) = std::env::var(var) {
        *field = value
            .parse()
            .map_err(|_| ConfigError::InvalidEnvValue { var: var.to_string(), value: value.clone() })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_override_applies_when_set() {
        std::env::set_var("TIMPANI_TEST_STR", "override");
        let mut field = "default".to_string();
        env_override("TIMPANI_TEST_STR", &mut field);
        std::env::remove_var("TIMPANI_TEST_STR");
        assert_eq!(field, "override");
    }

    #[test]
    fn bool_override_rejects_garbage() {
        std::env::set_var("TIMPANI_TEST_BOOL", "maybe");
        let mut field = false;
        let result = env_override_bool("TIMPANI_TEST_BOOL", &mut field);
        std::env::remove_var("TIMPANI_TEST_BOOL");
        assert!(result.is_err());
    }

    #[test]
    fn parsed_override_leaves_field_untouched_when_unset() {
        std::env::remove_var("TIMPANI_TEST_PORT");
        let mut field = 7070u16;
        env_override_parsed::<u16>("TIMPANI_TEST_PORT", &mut field).unwrap();
        assert_eq!(field, 7070);
    }
}
