//! # Inspector Configuration
//!
//! Display limits and feature switches consulted by every decode step.
//!
//! The host usually creates the configuration with
//! [`InspectorConfig::from_env`] and then forwards user commands to
//! [`crate::Session::apply_setting`], which accepts the command names the
//! runtime's debugger helpers have always used (`svm-print-array-limit 20`,
//! `svm-print-address enable`, ...).
//!
//! ## Environment Variables
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `SVMPROBE_PRETTY_PRINT` | `pretty_printing_enabled` |
//! | `SVMPROBE_HLREP` | `high_level_representations_enabled` |
//! | `SVMPROBE_SHOW_ADDRESSES` | `show_addresses` |
//! | `SVMPROBE_CYCLE_CHECK` | `cycle_checking_enabled` |
//! | `SVMPROBE_CSTR_LIMIT` | `cstring_length_limit` |
//! | `SVMPROBE_ARRAY_LIMIT` | `array_element_limit` |
//! | `SVMPROBE_DEPTH_LIMIT` | `cycle_depth_limit` |
//! | `SVMPROBE_STATIC_FIELDS` | `show_static_fields` |
//! | `SVMPROBE_COMPLETE_STATICS` | `complete_static_variables` |

use std::env;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::cycles::CyclePolicy;
use crate::error::{InspectError, InspectResult};

/// Display limits and switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorConfig
{
    /// Bytes shown for a `CPointer(char)` string; 0 disables C-string decoding.
    pub cstring_length_limit: usize,
    /// Elements shown per array before eliding; 0 hides all elements.
    pub array_element_limit: usize,
    /// Ancestor hops checked by the cycle guard.
    pub cycle_depth_limit: usize,
    /// Show static fields next to instance fields.
    pub show_static_fields: bool,
    /// Append ` @ 0x…` to object, array, enum and string labels.
    pub show_addresses: bool,
    /// Track parent links and elide cyclic branches.
    pub cycle_checking_enabled: bool,
    /// Let registered high-level representations replace generic objects.
    pub high_level_representations_enabled: bool,
    /// Master switch; when off the decoder never overrides default display.
    pub pretty_printing_enabled: bool,
    /// Offer static variable names during completion.
    pub complete_static_variables: bool,
}

impl Default for InspectorConfig
{
    fn default() -> Self
    {
        Self {
            cstring_length_limit: 40,
            array_element_limit: 10,
            cycle_depth_limit: 1,
            show_static_fields: false,
            show_addresses: false,
            cycle_checking_enabled: true,
            high_level_representations_enabled: false,
            pretty_printing_enabled: true,
            complete_static_variables: false,
        }
    }
}

impl InspectorConfig
{
    /// Defaults overlaid with `SVMPROBE_*` environment variables.
    ///
    /// Unparsable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self
    {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns per variable name.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self
    {
        let mut config = Self::default();
        for setting in Setting::ALL {
            let Some(raw) = lookup(setting.env_var()) else {
                continue;
            };
            if let Err(err) = config.set_from_env(setting, raw.trim()) {
                warn!(variable = setting.env_var(), error = %err, "ignoring environment override");
            }
        }
        config
    }

    /// Cycle guard parameters derived from this configuration.
    pub fn cycle_policy(&self) -> CyclePolicy
    {
        CyclePolicy {
            enabled: self.cycle_checking_enabled,
            depth_limit: self.cycle_depth_limit,
        }
    }

    /// Apply a settings command.
    ///
    /// An empty `arg` reports the current value. Switches accept `on`/`enable`
    /// and `off`/`disable`; other words fall back to the switch's historical
    /// default reading (switches that start enabled treat them as "enable",
    /// switches that start disabled as "disable"). Limits take an integer;
    /// negative numbers count as 0.
    ///
    /// ## Errors
    ///
    /// - `UnknownSetting` for an unknown command name
    /// - `InvalidSetting` for a limit that is not an integer
    pub fn apply(&mut self, name: &str, arg: &str) -> InspectResult<SettingOutcome>
    {
        let setting: Setting = name.parse()?;
        let arg = arg.trim();
        if arg.is_empty() {
            return Ok(SettingOutcome::Report(self.describe(setting)));
        }

        if setting.is_limit() {
            let value = arg.parse::<i64>().map_err(|_| InspectError::InvalidSetting {
                name: setting.name().to_string(),
                value: arg.to_string(),
            })?;
            self.set_limit(setting, usize::try_from(value.max(0)).unwrap_or(usize::MAX));
        } else {
            let enabled = match arg {
                "on" | "enable" => true,
                "off" | "disable" => false,
                _ => setting.lenient_reading(),
            };
            self.set_switch(setting, enabled);
        }
        Ok(SettingOutcome::Changed(setting))
    }

    /// Current value in the `svm-… is enabled` / `current value N` format.
    pub fn describe(&self, setting: Setting) -> String
    {
        match setting.limit_value(self) {
            Some(value) => format!("{} current value {value}", setting.name()),
            None => {
                let state = if self.switch_value(setting) { "enabled" } else { "disabled" };
                format!("{} is {state}", setting.name())
            }
        }
    }

    fn set_from_env(&mut self, setting: Setting, raw: &str) -> InspectResult<()>
    {
        let invalid = || InspectError::InvalidSetting {
            name: setting.env_var().to_string(),
            value: raw.to_string(),
        };
        if setting.is_limit() {
            let value = raw.parse::<usize>().map_err(|_| invalid())?;
            self.set_limit(setting, value);
        } else {
            let enabled = match raw.to_lowercase().as_str() {
                "1" | "true" | "on" | "enable" | "yes" => true,
                "0" | "false" | "off" | "disable" | "no" => false,
                _ => return Err(invalid()),
            };
            self.set_switch(setting, enabled);
        }
        Ok(())
    }

    fn set_limit(&mut self, setting: Setting, value: usize)
    {
        match setting {
            Setting::CStringLimit => self.cstring_length_limit = value,
            Setting::ArrayLimit => self.array_element_limit = value,
            Setting::DepthLimit => self.cycle_depth_limit = value,
            _ => {}
        }
    }

    fn set_switch(&mut self, setting: Setting, enabled: bool)
    {
        match setting {
            Setting::PrettyPrint => self.pretty_printing_enabled = enabled,
            Setting::HighLevel => self.high_level_representations_enabled = enabled,
            Setting::Addresses => self.show_addresses = enabled,
            Setting::CycleCheck => self.cycle_checking_enabled = enabled,
            Setting::StaticFields => self.show_static_fields = enabled,
            Setting::CompleteStatics => self.complete_static_variables = enabled,
            _ => {}
        }
    }

    fn switch_value(&self, setting: Setting) -> bool
    {
        match setting {
            Setting::PrettyPrint => self.pretty_printing_enabled,
            Setting::HighLevel => self.high_level_representations_enabled,
            Setting::Addresses => self.show_addresses,
            Setting::CycleCheck => self.cycle_checking_enabled,
            Setting::StaticFields => self.show_static_fields,
            Setting::CompleteStatics => self.complete_static_variables,
            _ => false,
        }
    }
}

/// Settings addressable by command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting
{
    /// `svm-print`
    PrettyPrint,
    /// `svm-use-hlrep`
    HighLevel,
    /// `svm-print-address`
    Addresses,
    /// `svm-selfref-check`
    CycleCheck,
    /// `svm-print-cstr-limit`
    CStringLimit,
    /// `svm-print-array-limit`
    ArrayLimit,
    /// `svm-print-depth-limit`
    DepthLimit,
    /// `svm-print-static-fields`
    StaticFields,
    /// `svm-complete-static-variables`
    CompleteStatics,
}

impl Setting
{
    /// Every setting, in command-listing order.
    pub const ALL: [Setting; 9] = [
        Setting::PrettyPrint,
        Setting::HighLevel,
        Setting::Addresses,
        Setting::CycleCheck,
        Setting::CStringLimit,
        Setting::ArrayLimit,
        Setting::DepthLimit,
        Setting::StaticFields,
        Setting::CompleteStatics,
    ];

    /// Command name.
    pub const fn name(self) -> &'static str
    {
        match self {
            Setting::PrettyPrint => "svm-print",
            Setting::HighLevel => "svm-use-hlrep",
            Setting::Addresses => "svm-print-address",
            Setting::CycleCheck => "svm-selfref-check",
            Setting::CStringLimit => "svm-print-cstr-limit",
            Setting::ArrayLimit => "svm-print-array-limit",
            Setting::DepthLimit => "svm-print-depth-limit",
            Setting::StaticFields => "svm-print-static-fields",
            Setting::CompleteStatics => "svm-complete-static-variables",
        }
    }

    /// Environment variable overriding the default.
    pub const fn env_var(self) -> &'static str
    {
        match self {
            Setting::PrettyPrint => "SVMPROBE_PRETTY_PRINT",
            Setting::HighLevel => "SVMPROBE_HLREP",
            Setting::Addresses => "SVMPROBE_SHOW_ADDRESSES",
            Setting::CycleCheck => "SVMPROBE_CYCLE_CHECK",
            Setting::CStringLimit => "SVMPROBE_CSTR_LIMIT",
            Setting::ArrayLimit => "SVMPROBE_ARRAY_LIMIT",
            Setting::DepthLimit => "SVMPROBE_DEPTH_LIMIT",
            Setting::StaticFields => "SVMPROBE_STATIC_FIELDS",
            Setting::CompleteStatics => "SVMPROBE_COMPLETE_STATICS",
        }
    }

    /// `true` for integer limits, `false` for switches.
    pub const fn is_limit(self) -> bool
    {
        matches!(self, Setting::CStringLimit | Setting::ArrayLimit | Setting::DepthLimit)
    }

    /// Candidate words for completing a switch argument.
    pub fn argument_candidates(self, prefix: &str) -> Vec<&'static str>
    {
        if self.is_limit() {
            return Vec::new();
        }
        ["enable", "disable"]
            .into_iter()
            .filter(|word| word.starts_with(prefix))
            .collect()
    }

    // Reading of an unrecognized switch argument.
    const fn lenient_reading(self) -> bool
    {
        !matches!(self, Setting::StaticFields | Setting::CompleteStatics)
    }

    fn limit_value(self, config: &InspectorConfig) -> Option<usize>
    {
        match self {
            Setting::CStringLimit => Some(config.cstring_length_limit),
            Setting::ArrayLimit => Some(config.array_element_limit),
            Setting::DepthLimit => Some(config.cycle_depth_limit),
            _ => None,
        }
    }
}

impl FromStr for Setting
{
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        Setting::ALL
            .into_iter()
            .find(|setting| setting.name() == s)
            .ok_or_else(|| InspectError::UnknownSetting(s.to_string()))
    }
}

impl fmt::Display for Setting
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// Result of [`InspectorConfig::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingOutcome
{
    /// Empty argument: the current value, formatted for display.
    Report(String),
    /// The setting was updated.
    Changed(Setting),
}
