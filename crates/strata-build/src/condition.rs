//! Conditional predicates over the build axes
//!
//! Predicates gate declaration fragments. They have a small textual form:
//!
//! ```text
//! platform=Linux
//! target=Editor && configuration!=Shipping
//! group=Desktop || (platform=Android && toggle=WITH_GOOGLE_PLAY)
//! !toggle=USE_NULL_RHI
//! ```
//!
//! Axis names are checked when a predicate is parsed; axis *values* are
//! checked when the predicate is evaluated, every value before any result is
//! produced, so an unknown token fails in every context rather than only in
//! the contexts that happen to reach it.

use crate::context::{AxisParseError, BuildContext, Configuration, Platform, PlatformGroup};
use crate::error::{BuildError, BuildResult};
use crate::targets::TargetType;
use std::fmt;
use std::str::FromStr;

/// Build axis a test looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Platform,
    Group,
    Configuration,
    Target,
    Toggle,
}

impl Axis {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Group => "group",
            Self::Configuration => "configuration",
            Self::Target => "target",
            Self::Toggle => "toggle",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "platform" => Some(Self::Platform),
            "group" | "platform_group" => Some(Self::Group),
            "configuration" | "config" => Some(Self::Configuration),
            "target" | "target_type" => Some(Self::Target),
            "toggle" => Some(Self::Toggle),
            _ => None,
        }
    }
}

/// `axis=value|value` or `axis!=value|value`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AxisTest {
    pub axis: Axis,
    pub negated: bool,
    pub values: Vec<String>,
}

impl AxisTest {
    fn evaluate(&self, ctx: &BuildContext) -> Result<bool, AxisParseError> {
        // Parse every value first so unknown tokens never hide behind a match
        let mut matched = false;
        for value in &self.values {
            let hit = match self.axis {
                Axis::Platform => value.parse::<Platform>()? == ctx.platform,
                Axis::Group => value.parse::<PlatformGroup>()?.contains(ctx.platform),
                Axis::Configuration => value.parse::<Configuration>()? == ctx.configuration,
                Axis::Target => value.parse::<TargetType>()? == ctx.target_type,
                Axis::Toggle => ctx.has_toggle(value),
            };
            matched |= hit;
        }
        Ok(matched != self.negated)
    }

    fn validate(&self) -> Result<(), AxisParseError> {
        for value in &self.values {
            match self.axis {
                Axis::Platform => {
                    value.parse::<Platform>()?;
                }
                Axis::Group => {
                    value.parse::<PlatformGroup>()?;
                }
                Axis::Configuration => {
                    value.parse::<Configuration>()?;
                }
                Axis::Target => {
                    value.parse::<TargetType>()?;
                }
                Axis::Toggle => {}
            }
        }
        Ok(())
    }
}

/// A condition over a [`BuildContext`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// Always true
    Always,
    Test(AxisTest),
    Not(Box<Predicate>),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Parse the textual form
    pub fn parse(input: &str) -> BuildResult<Self> {
        Parser::new(input)?.parse()
    }

    fn test(axis: Axis, values: &[&str]) -> Self {
        Self::Test(AxisTest {
            axis,
            negated: false,
            values: values.iter().map(|v| v.to_string()).collect(),
        })
    }

    /// `platform=<any of platforms>`
    pub fn platform(platforms: &[&str]) -> Self {
        Self::test(Axis::Platform, platforms)
    }

    /// `group=<any of groups>`
    pub fn group(groups: &[&str]) -> Self {
        Self::test(Axis::Group, groups)
    }

    /// `configuration=<any of configurations>`
    pub fn configuration(configurations: &[&str]) -> Self {
        Self::test(Axis::Configuration, configurations)
    }

    /// `target=<any of target types>`
    pub fn target(targets: &[&str]) -> Self {
        Self::test(Axis::Target, targets)
    }

    /// `toggle=<name>`
    pub fn toggle(name: &str) -> Self {
        Self::test(Axis::Toggle, &[name])
    }

    /// Logical negation
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Logical conjunction with `other`
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Self::All(mut parts) => {
                parts.push(other);
                Self::All(parts)
            }
            this => Self::All(vec![this, other]),
        }
    }

    /// Logical disjunction with `other`
    pub fn or(self, other: Predicate) -> Self {
        match self {
            Self::Any(mut parts) => {
                parts.push(other);
                Self::Any(parts)
            }
            this => Self::Any(vec![this, other]),
        }
    }

    /// Check every axis value in the predicate without evaluating it
    pub fn validate(&self) -> BuildResult<()> {
        self.check()
            .map_err(|e| BuildError::invalid_condition(self.to_string(), e))
    }

    fn check(&self) -> Result<(), AxisParseError> {
        match self {
            Self::Always => Ok(()),
            Self::Test(test) => test.validate(),
            Self::Not(inner) => inner.check(),
            Self::All(parts) | Self::Any(parts) => parts.iter().try_for_each(Predicate::check),
        }
    }

    /// Evaluate against a context
    pub fn evaluate(&self, ctx: &BuildContext) -> BuildResult<bool> {
        self.eval(ctx)
            .map_err(|e| BuildError::invalid_condition(self.to_string(), e))
    }

    fn eval(&self, ctx: &BuildContext) -> Result<bool, AxisParseError> {
        // No short-circuiting: every branch is visited so errors are context-independent
        match self {
            Self::Always => Ok(true),
            Self::Test(test) => test.evaluate(ctx),
            Self::Not(inner) => Ok(!inner.eval(ctx)?),
            Self::All(parts) => {
                let mut result = true;
                for part in parts {
                    result &= part.eval(ctx)?;
                }
                Ok(result)
            }
            Self::Any(parts) => {
                let mut result = false;
                for part in parts {
                    result |= part.eval(ctx)?;
                }
                Ok(result)
            }
        }
    }
}

impl FromStr for Predicate {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn grouped(p: &Predicate, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match p {
                Predicate::All(_) | Predicate::Any(_) => write!(f, "({})", p),
                _ => write!(f, "{}", p),
            }
        }

        match self {
            Self::Always => f.write_str("always"),
            Self::Test(test) => write!(
                f,
                "{}{}{}",
                test.axis.name(),
                if test.negated { "!=" } else { "=" },
                test.values.join("|")
            ),
            Self::Not(inner) => {
                f.write_str("!")?;
                grouped(inner, f)
            }
            Self::All(parts) | Self::Any(parts) => {
                let sep = if matches!(self, Self::All(_)) { " && " } else { " || " };
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    grouped(part, f)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Eq,
    NotEq,
    Bang,
    Pipe,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::NotEq);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Bang);
                i += 1;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || matches!(chars[i], '_' | '-' | '.'))
                {
                    i += 1;
                }
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{}'", other)),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> BuildResult<Self> {
        let tokens = tokenize(input).map_err(|e| BuildError::invalid_condition(input, e))?;
        Ok(Self {
            input,
            tokens,
            pos: 0,
        })
    }

    fn error(&self, reason: impl ToString) -> BuildError {
        BuildError::invalid_condition(self.input, reason)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn parse(mut self) -> BuildResult<Predicate> {
        if self.tokens.is_empty() {
            return Err(self.error("empty condition"));
        }
        let predicate = self.parse_or()?;
        if let Some(token) = self.peek() {
            return Err(self.error(format!("unexpected {:?} after condition", token)));
        }
        Ok(predicate)
    }

    fn parse_or(&mut self) -> BuildResult<Predicate> {
        let mut parts = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.bump();
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Predicate::Any(parts)
        })
    }

    fn parse_and(&mut self) -> BuildResult<Predicate> {
        let mut parts = vec![self.parse_unary()?];
        while self.peek() == Some(&Token::And) {
            self.bump();
            parts.push(self.parse_unary()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Predicate::All(parts)
        })
    }

    fn parse_unary(&mut self) -> BuildResult<Predicate> {
        match self.bump() {
            Some(Token::Bang) => Ok(self.parse_unary()?.negate()),
            Some(Token::Open) => {
                let inner = self.parse_or()?;
                match self.bump() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(self.error("missing ')'")),
                }
            }
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("always") => {
                Ok(Predicate::Always)
            }
            Some(Token::Word(axis_name)) => {
                let axis = Axis::from_name(&axis_name)
                    .ok_or_else(|| self.error(format!("unknown axis '{}'", axis_name)))?;
                let negated = match self.bump() {
                    Some(Token::Eq) => false,
                    Some(Token::NotEq) => true,
                    _ => return Err(self.error(format!("expected '=' or '!=' after '{}'", axis_name))),
                };
                let mut values = Vec::new();
                loop {
                    match self.bump() {
                        Some(Token::Word(value)) => values.push(value),
                        _ => return Err(self.error(format!("expected a value for '{}'", axis_name))),
                    }
                    if self.peek() == Some(&Token::Pipe) {
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(Predicate::Test(AxisTest {
                    axis,
                    negated,
                    values,
                }))
            }
            Some(token) => Err(self.error(format!("unexpected {:?}", token))),
            None => Err(self.error("unexpected end of condition")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ctx(platform: Platform, configuration: Configuration, target: TargetType) -> BuildContext {
        BuildContext::new(platform, configuration, target)
    }

    fn win64_game() -> BuildContext {
        ctx(Platform::Win64, Configuration::Development, TargetType::Game)
    }

    #[rstest]
    #[case("platform=Win64", true)]
    #[case("platform=Linux", false)]
    #[case("platform!=Linux", true)]
    #[case("platform=Linux|Win64", true)]
    #[case("group=Windows", true)]
    #[case("group=Apple", false)]
    #[case("config=Development", true)]
    #[case("target=Editor", false)]
    #[case("!target=Editor", true)]
    #[case("platform=Win64 && target=Game", true)]
    #[case("platform=Win64 && target=Editor", false)]
    #[case("platform=Linux || target=Game", true)]
    #[case("platform=Linux || (group=Desktop && !configuration=Shipping)", true)]
    #[case("toggle=WITH_STEAM", false)]
    #[case("always", true)]
    fn test_evaluate(#[case] text: &str, #[case] expected: bool) {
        let predicate = Predicate::parse(text).unwrap();
        assert_eq!(predicate.evaluate(&win64_game()).unwrap(), expected, "{}", text);
    }

    #[test]
    fn test_toggle_matches_context() {
        let predicate = Predicate::parse("toggle=WITH_STEAM").unwrap();
        let ctx = win64_game().with_toggle("WITH_STEAM");
        assert!(predicate.evaluate(&ctx).unwrap());
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let predicate = Predicate::parse("platform=Linux || platform=Win64 && target=Editor").unwrap();
        assert!(!predicate.evaluate(&win64_game()).unwrap());
        assert!(matches!(predicate, Predicate::Any(ref parts) if parts.len() == 2));
    }

    #[test]
    fn test_unknown_platform_token_fails_even_when_unreached() {
        // The first branch is true, but the second names an unknown platform
        let predicate = Predicate::parse("platform=Win64 || platform=Amiga").unwrap();
        let err = predicate.evaluate(&win64_game()).unwrap_err();
        match err {
            BuildError::InvalidCondition { fragment, reason } => {
                assert_eq!(fragment, "platform=Win64 || platform=Amiga");
                assert!(reason.contains("Amiga"));
            }
            other => panic!("expected InvalidCondition, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_target_type_fails() {
        let predicate = Predicate::target(&["Tool"]);
        assert!(matches!(
            predicate.evaluate(&win64_game()),
            Err(BuildError::InvalidCondition { .. })
        ));
        assert!(predicate.validate().is_err());
    }

    #[test]
    fn test_unknown_toggle_is_not_an_error() {
        let predicate = Predicate::toggle("ANYTHING_GOES");
        assert!(predicate.validate().is_ok());
        assert!(!predicate.evaluate(&win64_game()).unwrap());
    }

    #[rstest]
    #[case("")]
    #[case("platform")]
    #[case("platform=")]
    #[case("flavour=Vanilla")]
    #[case("(platform=Linux")]
    #[case("platform=Linux)")]
    #[case("platform=Linux &&")]
    #[case("platform=Linux $ target=Game")]
    fn test_parse_errors(#[case] text: &str) {
        assert!(
            matches!(Predicate::parse(text), Err(BuildError::InvalidCondition { .. })),
            "{:?} should not parse",
            text
        );
    }

    #[rstest]
    #[case("platform=Linux")]
    #[case("platform!=Linux|Mac")]
    #[case("platform=Linux && target=Editor")]
    #[case("!(platform=Linux || platform=Mac) && toggle=WITH_STEAM")]
    fn test_display_round_trips(#[case] text: &str) {
        let predicate = Predicate::parse(text).unwrap();
        let reparsed = Predicate::parse(&predicate.to_string()).unwrap();
        assert_eq!(predicate, reparsed);
    }

    #[test]
    fn test_builder_helpers() {
        let predicate = Predicate::platform(&["Linux"])
            .or(Predicate::platform(&["Mac"]))
            .and(Predicate::target(&["Editor"]));
        assert_eq!(predicate.to_string(), "(platform=Linux || platform=Mac) && target=Editor");

        let linux_editor = ctx(Platform::Linux, Configuration::Debug, TargetType::Editor);
        assert!(predicate.evaluate(&linux_editor).unwrap());
        assert!(!predicate.negate().evaluate(&linux_editor).unwrap());
    }
}
