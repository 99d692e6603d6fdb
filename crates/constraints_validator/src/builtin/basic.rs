//! Null, boolean, size and pattern checks.

use crate::constraint_validator::ConstraintValidator;
use crate::context::ConstraintValidatorContext;
use anyhow::{Context, bail};
use constraints_core::{AttributeValue, ConstraintDescriptor, Value};
use regex::Regex;

/// `NotNull`
#[derive(Debug, Default)]
pub struct NotNullValidator;

impl ConstraintValidator for NotNullValidator {
    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
        Ok(!value.is_null())
    }
}

/// `Null`
#[derive(Debug, Default)]
pub struct NullValidator;

impl ConstraintValidator for NullValidator {
    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
        Ok(value.is_null())
    }
}

/// `AssertTrue`
#[derive(Debug, Default)]
pub struct AssertTrueValidator;

impl ConstraintValidator for AssertTrueValidator {
    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
        Ok(value.is_null() || value.as_bool() == Some(true))
    }
}

/// `AssertFalse`
#[derive(Debug, Default)]
pub struct AssertFalseValidator;

impl ConstraintValidator for AssertFalseValidator {
    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
        Ok(value.is_null() || value.as_bool() == Some(false))
    }
}

/// `NotBlank`: at least one non-whitespace character. Null is left to
/// `NotNull`.
#[derive(Debug, Default)]
pub struct NotBlankValidator;

impl ConstraintValidator for NotBlankValidator {
    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
        Ok(match value {
            Value::Null => true,
            Value::Text(s) => !s.trim().is_empty(),
            _ => false,
        })
    }
}

/// `NotEmpty`: not null and not of size zero.
#[derive(Debug, Default)]
pub struct NotEmptyValidator;

impl ConstraintValidator for NotEmptyValidator {
    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
        Ok(value.size().is_some_and(|size| size > 0))
    }
}

/// `Size(min, max)` on text, collections, maps and arrays.
#[derive(Debug, Default)]
pub struct SizeValidator {
    min: usize,
    max: usize,
}

impl ConstraintValidator for SizeValidator {
    fn initialize(&mut self, descriptor: &ConstraintDescriptor) -> anyhow::Result<()> {
        let min = descriptor.int_attribute("min").unwrap_or(0);
        let max = descriptor.int_attribute("max").unwrap_or(i64::from(i32::MAX));
        if min < 0 {
            bail!("The min parameter cannot be negative");
        }
        if max < 0 {
            bail!("The max parameter cannot be negative");
        }
        if max < min {
            bail!("The length cannot be negative");
        }
        self.min = usize::try_from(min)?;
        self.max = usize::try_from(max)?;
        Ok(())
    }

    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
        if value.is_null() {
            return Ok(true);
        }
        Ok(value
            .size()
            .is_some_and(|size| size >= self.min && size <= self.max))
    }
}

/// `Pattern(regexp, flags)`: the whole text must match.
#[derive(Debug, Default)]
pub struct PatternValidator {
    regex: Option<Regex>,
}

impl PatternValidator {
    fn inline_flags(flags: &[AttributeValue]) -> anyhow::Result<String> {
        let mut inline = String::new();
        for flag in flags {
            match flag.as_text() {
                Some("CASE_INSENSITIVE") => inline.push('i'),
                Some("MULTILINE") => inline.push('m'),
                Some("DOTALL") => inline.push('s'),
                Some("COMMENTS") => inline.push('x'),
                Some("UNICODE_CASE" | "CANON_EQ" | "UNIX_LINES") => {}
                _ => bail!("Unsupported pattern flag {}", flag),
            }
        }
        Ok(inline)
    }
}

impl ConstraintValidator for PatternValidator {
    fn initialize(&mut self, descriptor: &ConstraintDescriptor) -> anyhow::Result<()> {
        let regexp = descriptor
            .text_attribute("regexp")
            .context("Pattern requires a regexp")?;
        let flags = descriptor
            .attribute("flags")
            .and_then(AttributeValue::as_list)
            .unwrap_or_default();
        let inline = Self::inline_flags(flags)?;
        let source = if inline.is_empty() {
            format!("^(?:{})$", regexp)
        } else {
            format!("(?{})^(?:{})$", inline, regexp)
        };
        self.regex = Some(Regex::new(&source).with_context(|| format!("Invalid regular expression '{}'", regexp))?);
        Ok(())
    }

    fn is_valid(&self, value: &Value, _: &mut ConstraintValidatorContext<'_>) -> anyhow::Result<bool> {
        let Some(text) = value.as_text() else {
            return Ok(value.is_null());
        };
        let regex = self.regex.as_ref().context("Pattern validator used before initialisation")?;
        Ok(regex.is_match(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{check, descriptor};
    use constraints_core::ConstraintAnnotation;

    #[test]
    fn test_null_checks() {
        assert!(check(&mut NotNullValidator, "NotNull", &Value::Int(1)));
        assert!(!check(&mut NotNullValidator, "NotNull", &Value::Null));
        assert!(check(&mut NullValidator, "Null", &Value::Null));
        assert!(check(&mut AssertFalseValidator, "AssertFalse", &Value::Bool(false)));
        assert!(!check(&mut AssertTrueValidator, "AssertTrue", &Value::Bool(false)));
    }

    #[test]
    fn test_blank_and_empty() {
        assert!(!check(&mut NotBlankValidator, "NotBlank", &Value::from("  ")));
        assert!(check(&mut NotBlankValidator, "NotBlank", &Value::Null));
        assert!(!check(&mut NotEmptyValidator, "NotEmpty", &Value::Null));
        assert!(!check(&mut NotEmptyValidator, "NotEmpty", &Value::List(Vec::new())));
        assert!(check(&mut NotEmptyValidator, "NotEmpty", &Value::from("x")));
    }

    #[test]
    fn test_size() {
        let annotation = ConstraintAnnotation::new("Size").attr("min", 2).attr("max", 3);
        let d = descriptor(&annotation);
        let mut size = SizeValidator::default();
        size.initialize(&d).unwrap();
        assert!(crate::test_support::run(&size, &d, &Value::from("abc")));
        assert!(!crate::test_support::run(&size, &d, &Value::from("a")));
        assert!(crate::test_support::run(&size, &d, &Value::Null));

        let broken = descriptor(&ConstraintAnnotation::new("Size").attr("min", 4).attr("max", 3));
        assert!(SizeValidator::default().initialize(&broken).is_err());
    }

    #[test]
    fn test_pattern_matches_whole_text() {
        let annotation = ConstraintAnnotation::new("Pattern")
            .attr("regexp", "[a-z]+")
            .attr("flags", vec!["CASE_INSENSITIVE"]);
        let d = descriptor(&annotation);
        let mut pattern = PatternValidator::default();
        pattern.initialize(&d).unwrap();
        assert!(crate::test_support::run(&pattern, &d, &Value::from("Hello")));
        assert!(!crate::test_support::run(&pattern, &d, &Value::from("Hello world")));

        let invalid = descriptor(&ConstraintAnnotation::new("Pattern").attr("regexp", "("));
        assert!(PatternValidator::default().initialize(&invalid).is_err());
    }
}
