//! Build axes and the per-request build context
//!
//! A [`BuildContext`] is the (platform, configuration, target type, toggles)
//! tuple every conditional declaration is reduced against. All axis values
//! parse case-insensitively and display in their canonical spelling.

use crate::targets::TargetType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An axis token that does not name a known value
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {axis} '{value}'")]
pub struct AxisParseError {
    /// Axis the token was parsed for ("platform", "configuration", ...)
    pub axis: &'static str,
    /// The rejected token
    pub value: String,
}

impl AxisParseError {
    pub(crate) fn new(axis: &'static str, value: &str) -> Self {
        Self {
            axis,
            value: value.to_string(),
        }
    }
}

/// The platform being built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// 32-bit Windows
    Win32,
    /// 64-bit Windows
    Win64,
    Mac,
    XboxOne,
    PS4,
    IOS,
    Android,
    HTML5,
    Linux,
    TVOS,
    Switch,
}

impl Platform {
    /// Every known platform, in declaration order
    pub const ALL: [Platform; 11] = [
        Self::Win32,
        Self::Win64,
        Self::Mac,
        Self::XboxOne,
        Self::PS4,
        Self::IOS,
        Self::Android,
        Self::HTML5,
        Self::Linux,
        Self::TVOS,
        Self::Switch,
    ];

    /// Canonical platform name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Win32 => "Win32",
            Self::Win64 => "Win64",
            Self::Mac => "Mac",
            Self::XboxOne => "XboxOne",
            Self::PS4 => "PS4",
            Self::IOS => "IOS",
            Self::Android => "Android",
            Self::HTML5 => "HTML5",
            Self::Linux => "Linux",
            Self::TVOS => "TVOS",
            Self::Switch => "Switch",
        }
    }

    /// Whether this platform is in the given group
    pub fn is_in(&self, group: PlatformGroup) -> bool {
        group.contains(*self)
    }
}

impl FromStr for Platform {
    type Err = AxisParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AxisParseError::new("platform", s))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named sets of platforms that conditions can test against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformGroup {
    /// Win32 and Win64
    Windows,
    /// Windows plus XboxOne
    Microsoft,
    /// Mac, IOS and TVOS
    Apple,
    /// IOS and TVOS (TVOS compiles IOS code)
    IOS,
    Unix,
    Android,
    Sony,
    /// Win32, Win64, Mac and Linux
    Desktop,
}

impl PlatformGroup {
    pub const ALL: [PlatformGroup; 8] = [
        Self::Windows,
        Self::Microsoft,
        Self::Apple,
        Self::IOS,
        Self::Unix,
        Self::Android,
        Self::Sony,
        Self::Desktop,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Microsoft => "Microsoft",
            Self::Apple => "Apple",
            Self::IOS => "IOS",
            Self::Unix => "Unix",
            Self::Android => "Android",
            Self::Sony => "Sony",
            Self::Desktop => "Desktop",
        }
    }

    /// Platforms belonging to this group
    pub fn platforms(&self) -> &'static [Platform] {
        use Platform::*;
        match self {
            Self::Windows => &[Win32, Win64],
            Self::Microsoft => &[Win32, Win64, XboxOne],
            Self::Apple => &[Mac, IOS, TVOS],
            Self::IOS => &[IOS, TVOS],
            Self::Unix => &[Linux],
            Self::Android => &[Android],
            Self::Sony => &[PS4],
            Self::Desktop => &[Win32, Win64, Mac, Linux],
        }
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.platforms().contains(&platform)
    }
}

impl FromStr for PlatformGroup {
    type Err = AxisParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AxisParseError::new("platform group", s))
    }
}

impl fmt::Display for PlatformGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Configuration {
    /// Debug configuration
    Debug,
    /// Development, but with optimization disabled for game modules
    DebugGame,
    /// Development configuration (default)
    Development,
    /// Shipping configuration
    Shipping,
    /// Test configuration
    Test,
}

impl Configuration {
    pub const ALL: [Configuration; 5] = [
        Self::Debug,
        Self::DebugGame,
        Self::Development,
        Self::Shipping,
        Self::Test,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::DebugGame => "DebugGame",
            Self::Development => "Development",
            Self::Shipping => "Shipping",
            Self::Test => "Test",
        }
    }

    /// Whether this configuration builds without optimization by default
    pub fn is_debug(&self) -> bool {
        matches!(self, Self::Debug | Self::DebugGame)
    }
}

#[allow(clippy::derivable_impls)]
impl Default for Configuration {
    fn default() -> Self {
        Self::Development
    }
}

impl FromStr for Configuration {
    type Err = AxisParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AxisParseError::new("configuration", s))
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The build axis a resolution runs for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildContext {
    pub platform: Platform,
    pub configuration: Configuration,
    pub target_type: TargetType,
    /// Extra feature toggles, kept sorted
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub toggles: BTreeSet<String>,
}

impl BuildContext {
    /// Create a context with no toggles
    pub fn new(platform: Platform, configuration: Configuration, target_type: TargetType) -> Self {
        Self {
            platform,
            configuration,
            target_type,
            toggles: BTreeSet::new(),
        }
    }

    /// Enable a toggle
    pub fn with_toggle(mut self, toggle: impl Into<String>) -> Self {
        self.toggles.insert(toggle.into());
        self
    }

    /// Enable several toggles
    pub fn with_toggles<I, S>(mut self, toggles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.toggles.extend(toggles.into_iter().map(Into::into));
        self
    }

    pub fn has_toggle(&self, toggle: &str) -> bool {
        self.toggles.contains(toggle)
    }

    /// Definitions every module in this context is compiled with
    ///
    /// Derived only from the axes, so two equal contexts always produce the
    /// same list in the same order.
    pub fn global_definitions(&self) -> Vec<String> {
        let flag = |on: bool| if on { 1 } else { 0 };
        let mut defs = vec![
            format!("WITH_EDITOR={}", flag(self.target_type.is_editor())),
            format!("IS_PROGRAM={}", flag(self.target_type == TargetType::Program)),
            format!("WITH_SERVER_CODE={}", flag(self.target_type.has_server_code())),
            format!("BUILD_{}=1", self.configuration.name().to_uppercase()),
            format!("COMPILED_PLATFORM={}", self.platform),
            format!("COMPILED_TARGET={}", self.target_type),
        ];
        defs.extend(self.toggles.iter().map(|t| format!("{}=1", t)));
        defs
    }
}

impl fmt::Display for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.platform, self.target_type, self.configuration
        )?;
        if !self.toggles.is_empty() {
            let toggles: Vec<&str> = self.toggles.iter().map(String::as_str).collect();
            write!(f, " [{}]", toggles.join(","))?;
        }
        Ok(())
    }
}
