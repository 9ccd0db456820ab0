/*
 * SPDX-FileCopyrightText: 2020 Stalwart Labs LLC <hello@stalw.art>
 *
 * SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-SEL
 */

use std::time::Duration;

use ahash::AHashMap;

/// Flat `key = value` configuration with typed getters. Lines starting
/// with `#` and blank lines are ignored; later keys override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub keys: AHashMap<String, String>,
    pub warnings: Vec<String>,
}

pub trait ParseValue: Sized {
    fn parse_value(value: &str) -> Result<Self, String>;
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut config = Config::default();
        for (num, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(format!("Invalid line {}: {line:?}", num + 1));
            };
            config
                .keys
                .insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(config)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.keys.get(key).map(|v| v.as_str())
    }

    /// Typed lookup; a malformed value is reported as a warning and read
    /// as absent, matching how the server treats bad settings at reload.
    pub fn property<T: ParseValue>(&mut self, key: &str) -> Option<T> {
        let value = self.keys.get(key)?;
        match T::parse_value(value) {
            Ok(value) => Some(value),
            Err(err) => {
                self.warnings.push(format!("{key}: {err}"));
                None
            }
        }
    }

    pub fn property_or_default<T: ParseValue>(&mut self, key: &str, default: T) -> T {
        self.property(key).unwrap_or(default)
    }

    pub fn property_require<T: ParseValue>(&mut self, key: &str) -> Result<T, String> {
        match self.keys.get(key) {
            Some(value) => T::parse_value(value).map_err(|err| format!("{key}: {err}")),
            None => Err(format!("Missing property {key:?}")),
        }
    }

    pub fn values(&self, key: &str) -> impl Iterator<Item = &str> {
        self.keys
            .get(key)
            .map(|v| v.as_str())
            .unwrap_or_default()
            .split(',')
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl ParseValue for String {
    fn parse_value(value: &str) -> Result<Self, String> {
        Ok(value.to_string())
    }
}

impl ParseValue for bool {
    fn parse_value(value: &str) -> Result<Self, String> {
        match value {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(format!("Invalid boolean {value:?}")),
        }
    }
}

impl ParseValue for Duration {
    fn parse_value(value: &str) -> Result<Self, String> {
        let (digits, multiplier) = if let Some(value) = value.strip_suffix("ms") {
            (value, 1)
        } else if let Some(value) = value.strip_suffix('s') {
            (value, 1000)
        } else if let Some(value) = value.strip_suffix('m') {
            (value, 60 * 1000)
        } else if let Some(value) = value.strip_suffix('h') {
            (value, 60 * 60 * 1000)
        } else if let Some(value) = value.strip_suffix('d') {
            (value, 24 * 60 * 60 * 1000)
        } else {
            (value, 1000)
        };
        digits
            .trim()
            .parse::<u64>()
            .map(|v| Duration::from_millis(v * multiplier))
            .map_err(|_| format!("Invalid duration {value:?}"))
    }
}

macro_rules! impl_parse_int {
    ($($t:ty),*) => {
        $(impl ParseValue for $t {
            fn parse_value(value: &str) -> Result<Self, String> {
                value
                    .parse()
                    .map_err(|_| format!("Invalid integer {value:?}"))
            }
        })*
    };
}

impl_parse_int!(u8, u16, u32, u64, usize, i32, i64);
