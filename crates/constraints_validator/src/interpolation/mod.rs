//! Message interpolation.
//!
//! Turns message templates such as `{javax.validation.constraints.Size.message}`
//! into human readable messages in three passes:
//!
//! 1. `{key}` tokens are looked up in the user bundle, then in the built-in
//!    bundle (recursively), and finally replaced by constraint attributes or
//!    message parameters. Unknown keys are left as they are.
//! 2. `${expression}` tokens are evaluated with [`Expression`].
//! 3. The escapes `\{`, `\}`, `\$` and `\\` are resolved.

mod bundle;

pub use bundle::{MessageBundle, USER_BUNDLE_BASE_NAME, parse_properties};

use crate::expression::Expression;
use constraints_core::{ConstraintDescriptor, LanguageRange, Locale, Value};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Maximum nesting of bundle lookups.
const MAX_RECURSION_DEPTH: usize = 10;

/// Variable naming the validated value in expressions.
pub const VALIDATED_VALUE: &str = "validatedValue";

/// What a template is interpolated against.
#[derive(Debug, Clone, Copy)]
pub struct InterpolationContext<'a> {
    /// The failing constraint, if any
    pub descriptor: Option<&'a ConstraintDescriptor>,
    /// The value that failed
    pub validated_value: &'a Value,
    /// Parameters added by the validator
    pub message_parameters: &'a BTreeMap<String, Value>,
    /// Expression variables added by the validator
    pub expression_variables: &'a BTreeMap<String, Value>,
}

impl<'a> InterpolationContext<'a> {
    /// Context for `descriptor` and `validated_value` without extra
    /// parameters.
    pub fn new(descriptor: Option<&'a ConstraintDescriptor>, validated_value: &'a Value) -> Self {
        static EMPTY: BTreeMap<String, Value> = BTreeMap::new();
        Self {
            descriptor,
            validated_value,
            message_parameters: &EMPTY,
            expression_variables: &EMPTY,
        }
    }

    fn parameter(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.message_parameters.get(name) {
            return Some(value.clone());
        }
        self.descriptor?.attribute(name).map(Value::from)
    }

    fn variables(&self) -> BTreeMap<String, Value> {
        let mut variables: BTreeMap<String, Value> = self
            .descriptor
            .map(|d| d.attributes.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
            .unwrap_or_default();
        variables.extend(self.message_parameters.iter().map(|(k, v)| (k.clone(), v.clone())));
        variables.extend(self.expression_variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        variables.insert(VALIDATED_VALUE.to_string(), self.validated_value.clone());
        variables
    }
}

/// Produces violation messages from templates.
pub trait MessageInterpolator: Send + Sync {
    /// Interpolates `template` for the best match of `preferences`.
    fn interpolate(
        &self,
        template: &str,
        context: &InterpolationContext<'_>,
        preferences: &[LanguageRange],
    ) -> anyhow::Result<String>;
}

/// Interpolator backed by `.properties` bundles.
#[derive(Debug, Clone)]
pub struct ResourceBundleMessageInterpolator {
    locales: Vec<Locale>,
    default_locale: Locale,
    user_bundle: MessageBundle,
    default_bundle: MessageBundle,
}

impl Default for ResourceBundleMessageInterpolator {
    fn default() -> Self {
        Self::new(Vec::new(), Locale::english(), MessageBundle::new())
    }
}

impl ResourceBundleMessageInterpolator {
    /// Creates an interpolator.
    ///
    /// # Arguments
    ///
    /// * `locales` - Locales preferences are matched against; the default
    ///   locale alone when empty
    /// * `default_locale` - Locale used when no preference matches
    /// * `user_bundle` - Messages overriding the built-in ones
    pub fn new(locales: Vec<Locale>, default_locale: Locale, user_bundle: MessageBundle) -> Self {
        let locales = if locales.is_empty() {
            vec![default_locale.clone()]
        } else {
            locales
        };
        debug!(
            locales = ?locales.iter().map(Locale::tag).collect::<Vec<_>>(),
            default_locale = %default_locale,
            "Initialized message interpolator"
        );
        Self {
            locales,
            default_locale,
            user_bundle,
            default_bundle: MessageBundle::defaults(),
        }
    }

    /// Locale chosen for `preferences`.
    pub fn resolve_locale(&self, preferences: &[LanguageRange]) -> Locale {
        LanguageRange::filter(preferences, &self.locales)
            .into_iter()
            .next()
            .unwrap_or_else(|| self.default_locale.clone())
    }

    fn lookup(&self, key: &str, locale: &Locale) -> Option<&str> {
        self.user_bundle
            .lookup(key, locale)
            .or_else(|| self.default_bundle.lookup(key, locale))
    }

    /// Pass 1: replaces `{key}` tokens.
    fn resolve_parameters(&self, template: &str, context: &InterpolationContext<'_>, locale: &Locale, depth: usize) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(c) = rest.chars().next() {
            match c {
                '\\' => {
                    let len = escape_len(rest);
                    out.push_str(&rest[..len]);
                    rest = &rest[len..];
                }
                '$' if rest[1..].starts_with('{') => {
                    let len = matching_brace(&rest[1..]).map_or(rest.len(), |end| end + 2);
                    out.push_str(&rest[..len]);
                    rest = &rest[len..];
                }
                '{' => match rest.find('}') {
                    Some(end) => {
                        let key = &rest[1..end];
                        out.push_str(&self.resolve_token(key, context, locale, depth));
                        rest = &rest[end + 1..];
                    }
                    None => {
                        out.push_str(rest);
                        rest = "";
                    }
                },
                _ => {
                    out.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
        out
    }

    fn resolve_token(&self, key: &str, context: &InterpolationContext<'_>, locale: &Locale, depth: usize) -> String {
        if let Some(value) = context.parameter(key) {
            return escape(&value.to_string());
        }
        if depth < MAX_RECURSION_DEPTH {
            if let Some(message) = self.lookup(key, locale) {
                trace!(key, locale = %locale, "Resolved message key");
                return self.resolve_parameters(message, context, locale, depth + 1);
            }
        }
        format!("{{{}}}", key)
    }

    /// Pass 2: evaluates `${expression}` tokens.
    fn evaluate_expressions(&self, message: &str, context: &InterpolationContext<'_>) -> String {
        let mut variables = None;
        let mut out = String::with_capacity(message.len());
        let mut rest = message;
        while let Some(c) = rest.chars().next() {
            if c == '\\' {
                let len = escape_len(rest);
                out.push_str(&rest[..len]);
                rest = &rest[len..];
                continue;
            }
            if c == '$' && rest[1..].starts_with('{') {
                if let Some(end) = matching_brace(&rest[1..]) {
                    let source = &rest[2..end + 1];
                    let variables = variables.get_or_insert_with(|| context.variables());
                    match Expression::parse(source).and_then(|e| e.evaluate(variables)) {
                        Ok(value) => out.push_str(&escape(&value.to_string())),
                        Err(e) => {
                            debug!(expression = source, error = %e, "Leaving expression unevaluated");
                            out.push_str(&rest[..end + 2]);
                        }
                    }
                    rest = &rest[end + 2..];
                    continue;
                }
            }
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
        out
    }
}

impl MessageInterpolator for ResourceBundleMessageInterpolator {
    fn interpolate(
        &self,
        template: &str,
        context: &InterpolationContext<'_>,
        preferences: &[LanguageRange],
    ) -> anyhow::Result<String> {
        let locale = self.resolve_locale(preferences);
        let resolved = self.resolve_parameters(template, context, &locale, 0);
        let evaluated = self.evaluate_expressions(&resolved, context);
        Ok(unescape(&evaluated))
    }
}

/// Length of the escape sequence at the start of `text`.
fn escape_len(text: &str) -> usize {
    let mut chars = text.chars();
    chars.next();
    1 + chars.next().map_or(0, char::len_utf8)
}

/// Byte offset of the `}` closing the `{` at the start of `text`.
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', _) => escaped = true,
            (q, Some(open)) if q == open => quote = None,
            (_, Some(_)) => {}
            ('\'' | '"', None) => quote = Some(c),
            ('{', None) => depth += 1,
            ('}', None) => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '$' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next_if(|n| matches!(n, '{' | '}' | '$' | '\\')) {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ConstraintDefinitions;
    use constraints_core::{ConstraintAnnotation, ConstraintLocationKind};
    use pretty_assertions::assert_eq;

    const ASSERT_FALSE: &str = "{javax.validation.constraints.AssertFalse.message}";

    fn interpolator(locales: Vec<Locale>, default_locale: Locale) -> ResourceBundleMessageInterpolator {
        ResourceBundleMessageInterpolator::new(locales, default_locale, MessageBundle::new())
    }

    fn interpolate(interpolator: &ResourceBundleMessageInterpolator, template: &str, preferences: &str) -> String {
        let preferences = LanguageRange::parse(preferences).unwrap();
        interpolator
            .interpolate(template, &InterpolationContext::new(None, &Value::Null), &preferences)
            .unwrap()
    }

    fn descriptor(annotation: ConstraintAnnotation) -> ConstraintDescriptor {
        let descriptor = ConstraintDefinitions::with_builtins()
            .build_descriptor(&annotation, ConstraintLocationKind::Field, "Order")
            .unwrap();
        (*descriptor).clone()
    }

    #[test]
    fn test_language_ranges() {
        let initialized = interpolator(vec![Locale::new("fr", "FR"), Locale::new("es", "ES")], Locale::english());
        assert_eq!(interpolate(&initialized, ASSERT_FALSE, "fr-FR,fr;q=0.9"), "doit avoir la valeur faux");
        assert_eq!(interpolate(&initialized, ASSERT_FALSE, "hr-HR,hr;q=0.9,es;q=0.7"), "debe ser falso");
        assert_eq!(interpolate(&initialized, ASSERT_FALSE, "hr-HR,hr;q=0.9"), "must be false");

        let french_default = interpolator(vec![Locale::new("es", "ES")], Locale::new("fr", "FR"));
        assert_eq!(interpolate(&french_default, ASSERT_FALSE, "hr-HR,hr;q=0.9"), "doit avoir la valeur faux");
    }

    #[test]
    fn test_attributes_and_expressions() {
        let interpolator = ResourceBundleMessageInterpolator::default();
        let inclusive = descriptor(ConstraintAnnotation::new("DecimalMin").attr("value", "0"));
        let exclusive = descriptor(
            ConstraintAnnotation::new("DecimalMin")
                .attr("value", "0")
                .attr("inclusive", false),
        );
        let render = |d: &ConstraintDescriptor| {
            interpolator
                .interpolate(&d.message_template, &InterpolationContext::new(Some(d), &Value::Null), &[])
                .unwrap()
        };
        assert_eq!(render(&inclusive), "must be greater than or equal to 0");
        assert_eq!(render(&exclusive), "must be greater than 0");

        let size = descriptor(ConstraintAnnotation::new("Size").attr("min", 2).attr("max", 4));
        assert_eq!(render(&size), "size must be between 2 and 4");
    }

    #[test]
    fn test_unknown_keys_and_escapes() {
        let interpolator = ResourceBundleMessageInterpolator::default();
        let context = InterpolationContext::new(None, &Value::Null);
        let render = |template: &str| interpolator.interpolate(template, &context, &[]).unwrap();
        assert_eq!(render("{unknown.key} stays"), "{unknown.key} stays");
        assert_eq!(render("\\{escaped\\} \\$ \\\\"), "{escaped} $ \\");
        assert_eq!(render("${1 +}"), "${1 +}");
    }

    #[test]
    fn test_user_bundle_and_validated_value() {
        let mut user = MessageBundle::new();
        user.add_properties("", "order.total = total {value} is too low, got ${validatedValue}\nnested = [{order.total}]");
        let interpolator = ResourceBundleMessageInterpolator::new(Vec::new(), Locale::english(), user);
        let mut parameters = BTreeMap::new();
        parameters.insert("value".to_string(), Value::from("{10}"));
        let validated = Value::from(3);
        let context = InterpolationContext {
            descriptor: None,
            validated_value: &validated,
            message_parameters: &parameters,
            expression_variables: &BTreeMap::new(),
        };
        assert_eq!(
            interpolator.interpolate("{nested}", &context, &[]).unwrap(),
            "[total {10} is too low, got 3]"
        );
    }

    #[test]
    fn test_attributes_shadow_bundle_keys() {
        let mut user = MessageBundle::new();
        user.add_properties("", "min = from the bundle\nsize.range = between {min} and {max}");
        let interpolator = ResourceBundleMessageInterpolator::new(Vec::new(), Locale::english(), user);
        let size = descriptor(ConstraintAnnotation::new("Size").attr("min", 2).attr("max", 4));
        let context = InterpolationContext::new(Some(&size), &Value::Null);

        assert_eq!(interpolator.interpolate("{min}", &context, &[]).unwrap(), "2");
        // Keys without an attribute still come from the bundle
        assert_eq!(interpolator.interpolate("{size.range}", &context, &[]).unwrap(), "between 2 and 4");
    }
}
