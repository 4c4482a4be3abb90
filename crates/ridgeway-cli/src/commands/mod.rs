//! CLI command implementations

pub mod config_cmd;
pub mod drive;
pub mod generate;
pub mod mesh;
pub mod probe;

#[cfg(test)]
pub(crate) fn small_config() -> crate::config::RidgewayConfig {
    let overrides = crate::config::Overrides {
        seed: Some("cli-test".to_string()),
        segments: Some(32),
        ..Default::default()
    };
    crate::config::RidgewayConfig::load_layers(&[], |_| None, &overrides).unwrap()
}
