use crate::commands::{CmdMessage, CmdResult, StudioPaths};
use crate::config::StudioConfig;
use crate::error::{Result, StudioError};

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(paths: &StudioPaths, action: ConfigAction) -> Result<CmdResult> {
    let dir = &paths.data;
    match action {
        ConfigAction::ShowAll => {
            let config = StudioConfig::load(dir)?;
            Ok(CmdResult::default().with_config(config))
        }
        ConfigAction::ShowKey(key) => {
            let config = StudioConfig::load(dir)?;
            let val = config
                .get(&key)
                .ok_or_else(|| StudioError::Validation(format!("Unknown config key: {}", key)))?;
            let mut result = CmdResult::default();
            result.add_message(CmdMessage::info(val));
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            let mut config = StudioConfig::load(dir)?;
            config.set(&key, &value).map_err(StudioError::Validation)?;
            config.save(dir)?;
            let display_val = config.get(&key).unwrap_or_else(|| value.clone());
            let mut result = CmdResult::default().with_config(config);
            result.add_message(CmdMessage::success(format!("{} set to {}", key, display_val)));
            Ok(result)
        }
    }
}
