pub const PROCESSING_CONFIG_YAML: &str = include_str!("../templates/processing_config.yaml");
pub const CONF_ALPY600_YAML: &str = include_str!("../templates/conf_alpy600.yaml");
pub const CONF_STAREX2400_YAML: &str = include_str!("../templates/conf_starex2400.yaml");
pub const SPECINTI_INI_YAML: &str = include_str!("../templates/specinti_ini.yaml");
