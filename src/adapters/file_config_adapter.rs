//! INI file configuration adapter.

use crate::domain::error::ScreenerError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScreenerError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| ScreenerError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ScreenerError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ScreenerError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    const SAMPLE: &str = r#"
[screener]
data_dir = /data/prices
symbols = AAPL, MSFT, NVDA
strategies = stage2,canslim
workers = 4

[stage2]
rsi_min = 65.5

[bora]
method = slope
"#;

    #[test]
    fn from_string_parses_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("screener", "data_dir"),
            Some("/data/prices".to_string())
        );
        assert_eq!(
            adapter.get_string("screener", "symbols"),
            Some("AAPL, MSFT, NVDA".to_string())
        );
        assert_eq!(adapter.get_string("bora", "method"), Some("slope".to_string()));
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("screener", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn values_are_trimmed_raw_text() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_string("screener", "workers"), Some("4".to_string()));
        assert_eq!(adapter.get_string("stage2", "rsi_min"), Some("65.5".to_string()));
        let adapter = FileConfigAdapter::from_string("[stage2]
fast_period = abc 
").unwrap();
        assert_eq!(adapter.get_string("stage2", "fast_period"), Some("abc".to_string()));
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config(SAMPLE);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("screener", "strategies"),
            Some("stage2,canslim".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/screen.ini");
        assert!(matches!(
            result,
            Err(ScreenerError::ConfigParse { ref file, .. }) if file.contains("screen.ini")
        ));
    }
}
