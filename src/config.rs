//! Runtime settings for the ingestion tools.

use std::env;
use std::path::PathBuf;

use crate::errors::WsprDataErr;

/// Environment variable naming the sqlite database file.
const ENV_DB: &str = "WSPR_DB";
/// Environment variable naming the directory downloaded archives are kept in.
const ENV_WORK_DIR: &str = "WSPR_WORK_DIR";

/// Settings required by every ingestion run.
///
/// Built once at startup and passed by reference to whatever needs it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the sqlite database file. Created on first use.
    pub db_path: PathBuf,
    /// Directory where downloaded archives are kept between runs.
    pub work_dir: PathBuf,
}

impl Config {
    /// Build a configuration from explicit paths.
    pub fn new<P, Q>(db_path: P, work_dir: Q) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
    {
        Config {
            db_path: db_path.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// Requires `WSPR_DB` and `WSPR_WORK_DIR`. An unset or empty value is an
    /// error naming the offending variable.
    pub fn from_env() -> Result<Self, WsprDataErr> {
        let db_path = env::var_os(ENV_DB)
            .filter(|val| !val.is_empty())
            .map(PathBuf::from)
            .ok_or(WsprDataErr::MissingConfig(ENV_DB))?;

        let work_dir = env::var_os(ENV_WORK_DIR)
            .filter(|val| !val.is_empty())
            .map(PathBuf::from)
            .ok_or(WsprDataErr::MissingConfig(ENV_WORK_DIR))?;

        Ok(Config { db_path, work_dir })
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    // One test covers all the environment cases since the environment is
    // shared by every test in the process.
    #[test]
    fn from_env_requires_both_variables() {
        env::remove_var(ENV_DB);
        env::remove_var(ENV_WORK_DIR);

        match Config::from_env() {
            Err(WsprDataErr::MissingConfig(key)) => assert_eq!(key, ENV_DB),
            res => panic!("unexpected result: {:?}", res),
        }

        env::set_var(ENV_DB, "/tmp/wspr-test/spots.db");
        match Config::from_env() {
            Err(WsprDataErr::MissingConfig(key)) => assert_eq!(key, ENV_WORK_DIR),
            res => panic!("unexpected result: {:?}", res),
        }

        env::set_var(ENV_WORK_DIR, "");
        match Config::from_env() {
            Err(WsprDataErr::MissingConfig(key)) => assert_eq!(key, ENV_WORK_DIR),
            res => panic!("unexpected result: {:?}", res),
        }

        env::set_var(ENV_WORK_DIR, "/tmp/wspr-test");
        let config = Config::from_env().expect("both variables are set");
        assert_eq!(config.db_path, PathBuf::from("/tmp/wspr-test/spots.db"));
        assert_eq!(config.work_dir, PathBuf::from("/tmp/wspr-test"));

        env::remove_var(ENV_DB);
        env::remove_var(ENV_WORK_DIR);
    }
}
