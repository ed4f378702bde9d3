//! INI configuration files behind [`ConfigPort`].
//!
//! Section and key names are case-insensitive. A value that is present but
//! does not parse as the requested type falls back to the caller's default
//! with a warning naming the file it came from.

use crate::domain::error::DaytraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use log::warn;
use std::fmt::Display;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    ini: Ini,
    source: String,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DaytraderError> {
        let source = path.as_ref().display().to_string();
        let mut ini = Ini::new();
        ini.load(path.as_ref())
            .map_err(|reason| DaytraderError::ConfigParse {
                file: source.clone(),
                reason,
            })?;
        Ok(Self { ini, source })
    }

    pub fn from_string(content: &str) -> Result<Self, DaytraderError> {
        let source = "<inline>".to_string();
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|reason| DaytraderError::ConfigParse {
                file: source.clone(),
                reason,
            })?;
        Ok(Self { ini, source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn or_default<T: Display>(
        &self,
        section: &str,
        key: &str,
        parsed: Result<Option<T>, String>,
        default: T,
    ) -> T {
        match parsed {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(reason) => {
                warn!("{}: [{section}] {key}: {reason}; using {default}", self.source);
                default
            }
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.or_default(section, key, self.ini.getint(section, key), default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.or_default(section, key, self.ini.getfloat(section, key), default)
    }
}
