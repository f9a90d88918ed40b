//! Error types for the Ember monitor.

use std::io;

/// Errors produced by the Ember monitor crates.
///
/// The console variants render to the exact diagnostic strings the monitor
/// prints, so handlers can return typed errors while the console output
/// stays stable: `Usage` carries the usage line shown when a command is
/// invoked with too few parameters, `BadArgument` names the argument that
/// failed numeric validation.
#[derive(Debug, thiserror::Error)]
pub enum EmberError {
    /// Too few parameters; payload is the command's usage line.
    #[error("{0}")]
    Usage(&'static str),

    /// A named argument failed validation (e.g. malformed numeric).
    #[error("Incorrect {0}")]
    BadArgument(&'static str),

    /// A positional parameter failed validation, for variadic data lists.
    #[error("Incorrect value of parameter {0}")]
    BadParameter(usize),

    #[error("too many parameters (max {0})")]
    TooManyParams(usize),

    #[error("line too long (max {0} bytes)")]
    LineTooLong(usize),

    /// A peripheral operation failed; payload is the printed diagnostic.
    #[error("{0}")]
    Hardware(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("console output error")]
    Fmt(#[from] std::fmt::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, EmberError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_renders_bare_usage_line() {
        let e = EmberError::Usage("mr <address> [length]");
        assert_eq!(format!("{e}"), "mr <address> [length]");
    }

    #[test]
    fn bad_argument_names_the_argument() {
        let e = EmberError::BadArgument("address");
        assert_eq!(format!("{e}"), "Incorrect address");
    }

    #[test]
    fn bad_parameter_names_the_position() {
        let e = EmberError::BadParameter(3);
        assert_eq!(format!("{e}"), "Incorrect value of parameter 3");
    }

    #[test]
    fn too_many_params_display() {
        let e = EmberError::TooManyParams(48);
        assert_eq!(format!("{e}"), "too many parameters (max 48)");
    }

    #[test]
    fn line_too_long_display() {
        let e = EmberError::LineTooLong(256);
        assert_eq!(format!("{e}"), "line too long (max 256 bytes)");
    }

    #[test]
    fn hardware_renders_bare_diagnostic() {
        let e = EmberError::Hardware("Error during I2C write".into());
        assert_eq!(format!("{e}"), "Error during I2C write");
    }

    #[test]
    fn config_error_display() {
        let e = EmberError::Config("duplicate command name: mr".into());
        assert_eq!(format!("{e}"), "config error: duplicate command name: mr");
    }

    #[test]
    fn toml_error_from_conversion() {
        let bad_toml = "this is [[[not valid toml";
        let toml_err = toml::from_str::<toml::Value>(bad_toml).unwrap_err();
        let e: EmberError = toml_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("TOML parse error"));
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: EmberError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn error_is_debug() {
        let e = EmberError::BadArgument("length");
        let dbg = format!("{e:?}");
        assert!(dbg.contains("BadArgument"));
    }

    #[test]
    fn result_alias_ok() {
        let r: Result<u32> = Ok(7);
        assert_eq!(r.unwrap(), 7);
    }

    #[test]
    fn result_alias_err() {
        let r: Result<u32> = Err(EmberError::Usage("crc <address> <length>"));
        assert!(r.is_err());
    }
}
