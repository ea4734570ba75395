//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// Strings without `${` are returned unchanged, so a bare `$` in a URL or
/// path is kept as is. Referencing an unset variable without a default is
/// an error.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let mut unset = Vec::new();
    let expanded = shellexpand::env_with_context_no_errors(value, |var| {
        let found = std::env::var(var).ok();
        if found.is_none() {
            unset.push(var.to_owned());
        }
        found
    });
    // Unset variables with a `:-` default were substituted; only bare
    // references are errors.
    if let Some(name) = unset
        .into_iter()
        .find(|name| value.contains(&format!("${{{name}}}")))
    {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{name}}} not set"),
        });
    }
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("DOCGEN_TEST_SIMPLE", "hello");
        }
        assert_eq!(expand_env("${DOCGEN_TEST_SIMPLE}", "test.field").unwrap(), "hello");
        unsafe {
            std::env::remove_var("DOCGEN_TEST_SIMPLE");
        }
    }

    #[test]
    fn test_expand_default() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::remove_var("DOCGEN_TEST_UNSET");
        }
        assert_eq!(
            expand_env("https://${DOCGEN_TEST_UNSET:-example.com}/docs", "site.root_url").unwrap(),
            "https://example.com/docs"
        );
    }

    #[test]
    fn test_expand_missing_var() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::remove_var("DOCGEN_TEST_MISSING");
        }
        let err = expand_env("${DOCGEN_TEST_MISSING}", "site.root_url").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert_eq!(
            err.to_string(),
            "Environment variable error in site.root_url: ${DOCGEN_TEST_MISSING} not set"
        );
    }

    #[test]
    fn test_expanded_value_may_contain_placeholder() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("DOCGEN_TEST_TEMPLATE", "https://example.com/${page}");
        }
        assert_eq!(
            expand_env("${DOCGEN_TEST_TEMPLATE}", "site.root_url").unwrap(),
            "https://example.com/${page}"
        );
        unsafe {
            std::env::remove_var("DOCGEN_TEST_TEMPLATE");
        }
    }

    #[test]
    fn test_literal_unchanged() {
        assert_eq!(expand_env("docs", "repository.docs_dir").unwrap(), "docs");
        assert_eq!(expand_env("https://example.com/$path", "site.root_url").unwrap(), "https://example.com/$path");
    }
}
