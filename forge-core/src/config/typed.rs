use super::{ClientConfig, ConfigError};

/// A strongly-typed view over a [`ClientConfig`], upgraded via
/// [`ClientConfig::with_typed`].
///
/// Implement this for an application-defined settings struct to get typed
/// field access instead of calling [`ClientConfig::get`] by dotted key at
/// every call site:
///
/// ```ignore
/// struct WeatherSettings { max_attempts: i64, region: String }
///
/// impl ConfigProperties for WeatherSettings {
///     fn prefix() -> &'static str { "weather" }
///     fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
///         Ok(Self {
///             max_attempts: config.get_or("weather.max_attempts", 3),
///             region: config.get("weather.region")?,
///         })
///     }
/// }
/// ```
pub trait ConfigProperties: Sized {
    /// The configuration key prefix this section reads under.
    fn prefix() -> &'static str;

    /// Construct from a raw `ClientConfig`.
    fn from_config(config: &ClientConfig) -> Result<Self, ConfigError>;
}
