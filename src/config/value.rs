//! Typed access to node values and properties.
//!
//! Everything in a tree is stored as text. [ConfigValue] converts between that text and
//! scalar Rust types, failing with [ConfigError::ConversionFailed] on input the target
//! type can't represent.

use crate::error::ConfigError;

pub trait ConfigValue: Sized {
    /// Name used in conversion errors.
    const TYPE_NAME: &'static str;

    fn from_config_str(text: &str) -> Result<Self, ConfigError>;

    fn to_config_string(&self) -> String;
}

fn conversion_failed<T: ConfigValue>(text: &str) -> ConfigError {
    ConfigError::ConversionFailed {
        value: text.to_string(),
        target: T::TYPE_NAME,
    }
}

impl ConfigValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_config_str(text: &str) -> Result<Self, ConfigError> {
        Ok(text.to_string())
    }

    fn to_config_string(&self) -> String {
        self.clone()
    }
}

/// Only the exact words `true` and `false`.
impl ConfigValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_config_str(text: &str) -> Result<Self, ConfigError> {
        match text.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(conversion_failed::<bool>(text)),
        }
    }

    fn to_config_string(&self) -> String {
        self.to_string()
    }
}

impl ConfigValue for char {
    const TYPE_NAME: &'static str = "char";

    fn from_config_str(text: &str) -> Result<Self, ConfigError> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(conversion_failed::<char>(text)),
        }
    }

    fn to_config_string(&self) -> String {
        self.to_string()
    }
}

macro_rules! parsed_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ConfigValue for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn from_config_str(text: &str) -> Result<Self, ConfigError> {
                    text.trim()
                        .parse::<$ty>()
                        .map_err(|_| conversion_failed::<$ty>(text))
                }

                fn to_config_string(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

parsed_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// `None` is stored as `null`; reading accepts `null` or an empty string.
impl<T: ConfigValue> ConfigValue for Option<T> {
    const TYPE_NAME: &'static str = T::TYPE_NAME;

    fn from_config_str(text: &str) -> Result<Self, ConfigError> {
        match text.trim() {
            "" | "null" => Ok(None),
            _ => T::from_config_str(text).map(Some),
        }
    }

    fn to_config_string(&self) -> String {
        match self {
            Some(value) => value.to_config_string(),
            None => "null".to_string(),
        }
    }
}
