//! Option schemas and the normalizer that resolves them.
//!
//! Every option of a command resolves in increasing priority:
//! declared default < environment variable < explicit flag.
//! Enumerated options are checked against their allowed set, and integer
//! options are parsed; either failure aborts the invocation before the
//! action runs.

use std::collections::BTreeMap;

use crate::errors::ValidationError;

/// How an option takes its value on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Boolean switch, no value.
    Flag,
    /// Free-form string.
    String,
    /// Non-negative integer, e.g. a duration in seconds.
    Integer,
    /// One of a closed set of strings.
    Enum(&'static [&'static str]),
}

/// Static description of one option of a command.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: &'static str,
    pub short: Option<char>,
    pub long: &'static str,
    pub value_name: &'static str,
    pub help: &'static str,
    pub kind: ValueKind,
    pub default: Option<&'static str>,
    pub env: Option<&'static str>,
}

impl OptionSpec {
    /// A boolean switch `--long`.
    pub fn flag(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            short: None,
            long: name,
            value_name: "",
            help,
            kind: ValueKind::Flag,
            default: None,
            env: None,
        }
    }

    /// A string-valued option `--long <VALUE>`.
    pub fn string(name: &'static str, value_name: &'static str, help: &'static str) -> Self {
        Self {
            value_name,
            kind: ValueKind::String,
            ..Self::flag(name, help)
        }
    }

    pub fn integer(name: &'static str, value_name: &'static str, help: &'static str) -> Self {
        Self {
            value_name,
            kind: ValueKind::Integer,
            ..Self::flag(name, help)
        }
    }

    pub fn choice(
        name: &'static str,
        value_name: &'static str,
        allowed: &'static [&'static str],
        help: &'static str,
    ) -> Self {
        Self {
            value_name,
            kind: ValueKind::Enum(allowed),
            ..Self::flag(name, help)
        }
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn default_value(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    pub fn env(mut self, var: &'static str) -> Self {
        self.env = Some(var);
        self
    }

    /// Allowed values for enumerated options.
    pub fn allowed(&self) -> Option<&'static [&'static str]> {
        match self.kind {
            ValueKind::Enum(allowed) => Some(allowed),
            _ => None,
        }
    }

    /// Check the schema invariant: an enum default must be an allowed value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.allowed(), self.default) {
            (Some(allowed), Some(default)) if !allowed.contains(&default) => {
                Err(ValidationError::InvalidDefault {
                    option: self.name.to_string(),
                    default: default.to_string(),
                    allowed: allowed.iter().map(|s| s.to_string()).collect(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// A resolved option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Str(String),
    Bool(bool),
    Int(u64),
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Flag,
    Environment,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub value: OptionValue,
    pub source: ValueSource,
}

/// Raw option values as tokenized from the command line, keyed by option name.
/// Switches that were given appear with the value `"true"`.
pub type RawFlags = BTreeMap<String, String>;

/// Snapshot of environment variables handed to the normalizer.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Add variables that are not already set. Existing values win.
    pub fn with_fallbacks<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in pairs {
            self.vars.entry(key).or_insert(value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// Fully resolved, validated option values for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedOptions {
    values: BTreeMap<String, Resolved>,
}

impl NormalizedOptions {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name).map(|r| &r.value)
    }

    pub fn source(&self, name: &str) -> Option<ValueSource> {
        self.values.get(name).map(|r| r.source)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(OptionValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Absent switches read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(OptionValue::Bool(true)))
    }

    pub fn int(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(OptionValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolve every option of `specs` from the three sources.
pub fn normalize(
    specs: &[OptionSpec],
    raw: &RawFlags,
    env: &Environment,
) -> Result<NormalizedOptions, ValidationError> {
    let mut values = BTreeMap::new();

    for spec in specs {
        let candidate = raw
            .get(spec.name)
            .map(|v| (v.as_str(), ValueSource::Flag))
            .or_else(|| {
                spec.env
                    .and_then(|var| env.get(var))
                    .map(|v| (v, ValueSource::Environment))
            })
            .or_else(|| spec.default.map(|v| (v, ValueSource::Default)));

        let Some((text, source)) = candidate else {
            continue;
        };

        let value = convert(spec, text)?;
        values.insert(spec.name.to_string(), Resolved { value, source });
    }

    Ok(NormalizedOptions { values })
}

fn convert(spec: &OptionSpec, text: &str) -> Result<OptionValue, ValidationError> {
    match spec.kind {
        ValueKind::Flag => Ok(OptionValue::Bool(is_truthy(text))),
        ValueKind::String => Ok(OptionValue::Str(text.to_string())),
        ValueKind::Integer => text
            .trim()
            .parse::<u64>()
            .map(OptionValue::Int)
            .map_err(|_| ValidationError::InvalidNumber {
                option: spec.name.to_string(),
                value: text.to_string(),
            }),
        ValueKind::Enum(allowed) => {
            if allowed.contains(&text) {
                Ok(OptionValue::Str(text.to_string()))
            } else {
                Err(ValidationError::InvalidChoice {
                    option: spec.name.to_string(),
                    value: text.to_string(),
                    allowed: allowed.iter().map(|s| s.to_string()).collect(),
                })
            }
        }
    }
}

/// Boolean reading of a flag or environment value: `true` or `1`, any case.
pub fn is_truthy(text: &str) -> bool {
    matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMATS: &[&str] = &["json", "text", "markdown"];

    fn output_spec() -> OptionSpec {
        OptionSpec::choice("output", "FORMAT", FORMATS, "Output format")
            .short('o')
            .default_value("text")
            .env("CLI_OUTPUT")
    }

    fn raw(pairs: &[(&str, &str)]) -> RawFlags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn enum_values_pass_through_unchanged() {
        let specs = [output_spec()];
        for format in FORMATS {
            let opts = normalize(&specs, &raw(&[("output", format)]), &Environment::default())
                .unwrap();
            assert_eq!(opts.str("output"), Some(*format));
        }
    }

    #[test]
    fn enum_value_outside_set_fails() {
        let specs = [output_spec()];
        let err = normalize(&specs, &raw(&[("output", "yaml")]), &Environment::default())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidChoice { .. }));
        assert_eq!(err.option(), Some("output"));
    }

    #[test]
    fn invalid_environment_value_fails_too() {
        let specs = [output_spec()];
        let env = Environment::from_pairs([("CLI_OUTPUT", "xml")]);
        assert!(normalize(&specs, &RawFlags::new(), &env).is_err());
    }

    #[test]
    fn flag_beats_environment_beats_default() {
        let specs = [output_spec()];
        let env = Environment::from_pairs([("CLI_OUTPUT", "markdown")]);

        let opts = normalize(&specs, &raw(&[("output", "json")]), &env).unwrap();
        assert_eq!(opts.str("output"), Some("json"));
        assert_eq!(opts.source("output"), Some(ValueSource::Flag));

        let opts = normalize(&specs, &RawFlags::new(), &env).unwrap();
        assert_eq!(opts.str("output"), Some("markdown"));
        assert_eq!(opts.source("output"), Some(ValueSource::Environment));

        let opts = normalize(&specs, &RawFlags::new(), &Environment::default()).unwrap();
        assert_eq!(opts.str("output"), Some("text"));
        assert_eq!(opts.source("output"), Some(ValueSource::Default));
    }

    #[test]
    fn option_without_any_source_is_absent() {
        let specs = [OptionSpec::string("description", "DESC", "Project description")];
        let opts = normalize(&specs, &RawFlags::new(), &Environment::default()).unwrap();
        assert_eq!(opts.get("description"), None);
        assert!(opts.is_empty());
    }

    #[test]
    fn integer_options_are_parsed() {
        let specs = [OptionSpec::integer("timeout", "SECONDS", "Timeout").default_value("30")];
        let opts = normalize(&specs, &RawFlags::new(), &Environment::default()).unwrap();
        assert_eq!(opts.int("timeout"), Some(30));

        let opts = normalize(&specs, &raw(&[("timeout", "5")]), &Environment::default()).unwrap();
        assert_eq!(opts.int("timeout"), Some(5));
    }

    #[test]
    fn unparsable_integer_fails_without_clamping() {
        let specs = [OptionSpec::integer("timeout", "SECONDS", "Timeout")];
        for bad in ["abc", "-3", "1.5"] {
            let err = normalize(&specs, &raw(&[("timeout", bad)]), &Environment::default())
                .unwrap_err();
            assert!(matches!(err, ValidationError::InvalidNumber { .. }), "{bad}");
        }
    }

    #[test]
    fn switches_read_from_flags_and_environment() {
        let specs = [OptionSpec::flag("verbose", "Verbose output").env("CLI_DEBUG")];

        let opts = normalize(&specs, &RawFlags::new(), &Environment::default()).unwrap();
        assert!(!opts.flag("verbose"));

        let env = Environment::from_pairs([("CLI_DEBUG", "true")]);
        assert!(normalize(&specs, &RawFlags::new(), &env).unwrap().flag("verbose"));

        let env = Environment::from_pairs([("CLI_DEBUG", "no")]);
        assert!(!normalize(&specs, &RawFlags::new(), &env).unwrap().flag("verbose"));

        let opts = normalize(&specs, &raw(&[("verbose", "true")]), &Environment::default())
            .unwrap();
        assert!(opts.flag("verbose"));
    }

    #[test]
    fn enum_default_must_be_allowed() {
        assert!(output_spec().validate().is_ok());
        let bad = OptionSpec::choice("format", "FORMAT", &["json", "text"], "Format")
            .default_value("markdown");
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn fallbacks_do_not_override_existing_variables() {
        let env = Environment::from_pairs([("DEMO_NAME", "Ada")]).with_fallbacks([
            ("DEMO_NAME".to_string(), "Grace".to_string()),
            ("CLI_OUTPUT".to_string(), "json".to_string()),
        ]);
        assert_eq!(env.get("DEMO_NAME"), Some("Ada"));
        assert_eq!(env.get("CLI_OUTPUT"), Some("json"));
    }

    #[test]
    fn truthy_values() {
        for yes in ["true", "TRUE", " 1 "] {
            assert!(is_truthy(yes), "{yes}");
        }
        for no in ["false", "0", "yes", ""] {
            assert!(!is_truthy(no), "{no}");
        }
    }
}
