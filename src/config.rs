//! `GopiumConfig`: the CLI's entire configuration surface. There is no
//! file-based config -- the command line *is* the config -- so this struct
//! exists to give the orchestrator one typed value to build from instead of
//! threading a dozen separate arguments.

use crate::platform::Platform;
use crate::strategies::TagType;

#[derive(Debug, Clone)]
pub struct GopiumConfig {
    pub walker_name: String,
    pub package_name: String,
    pub strategies: Vec<String>,
    pub package_path: String,
    pub package_build_envs: Vec<String>,
    pub package_build_flags: Vec<String>,
    pub walker_regexp: String,
    pub walker_deep: bool,
    pub walker_backref: bool,
    pub tag_type: TagType,
    pub timeout: u64,
    pub platform: Platform,
}

impl Default for GopiumConfig {
    fn default() -> Self {
        Self {
            walker_name: "json_std".to_string(),
            package_name: String::new(),
            strategies: Vec::new(),
            package_path: ".".to_string(),
            package_build_envs: Vec::new(),
            package_build_flags: Vec::new(),
            walker_regexp: ".*".to_string(),
            walker_deep: false,
            walker_backref: false,
            tag_type: TagType::None,
            timeout: 0,
            platform: Platform::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_walks_every_struct_with_no_timeout() {
        let cfg = GopiumConfig::default();
        assert_eq!(cfg.walker_regexp, ".*");
        assert_eq!(cfg.timeout, 0);
        assert_eq!(cfg.walker_name, "json_std");
    }
}
