use std::fmt;
use std::time::Duration;

use clap::ValueEnum;

use crate::constants::{FAST_MODEL_SETTLE_MS, SLOW_MODEL_SETTLE_MS};

/// Device models the tool knows how to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DeviceModel {
    /// Fast responder, bare commands
    Ettr,

    /// Slow responder, commands end with a carriage return
    Up30,
}

/// Abstract commands, mapped to literal strings per model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum CommandKey {
    HeatStart,
    HeatStop,
    PuffStart,
    PuffStop,
    VersionCheck,
    FlashInfo,
}

const ETTR_COMMANDS: &[(CommandKey, &str)] = &[
    (CommandKey::HeatStart, "heat start"),
    (CommandKey::HeatStop, "heat stop"),
    (CommandKey::PuffStart, "ph on"),
    (CommandKey::PuffStop, "ph off"),
    (CommandKey::VersionCheck, "version"),
    (CommandKey::FlashInfo, "flr"),
];

const UP30_COMMANDS: &[(CommandKey, &str)] = &[
    (CommandKey::HeatStart, "h on"),
    (CommandKey::HeatStop, "h off"),
    (CommandKey::PuffStart, "p o"),
    (CommandKey::PuffStop, "p x"),
    (CommandKey::VersionCheck, "flash print all"),
    (CommandKey::FlashInfo, "flash print all"),
];

impl DeviceModel {
    pub const ALL: [DeviceModel; 2] = [DeviceModel::Ettr, DeviceModel::Up30];

    fn commands(self) -> &'static [(CommandKey, &'static str)] {
        match self {
            DeviceModel::Ettr => ETTR_COMMANDS,
            DeviceModel::Up30 => UP30_COMMANDS,
        }
    }

    /// Literal command string for `key`, if this model defines one
    pub fn command(self, key: CommandKey) -> Option<&'static str> {
        self.commands()
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, literal)| *literal)
    }

    /// Character the device expects at the end of every command
    pub fn terminator(self) -> Option<char> {
        match self {
            DeviceModel::Ettr => None,
            DeviceModel::Up30 => Some('\r'),
        }
    }

    /// How long to leave the device alone after a command
    pub fn settle_delay(self) -> Duration {
        match self {
            DeviceModel::Ettr => Duration::from_millis(FAST_MODEL_SETTLE_MS),
            DeviceModel::Up30 => Duration::from_millis(SLOW_MODEL_SETTLE_MS),
        }
    }

    /// Wire bytes for `text`: the model's terminator is appended unless the
    /// text already ends with it.
    pub fn encode(self, text: &str) -> Vec<u8> {
        let mut command = text.to_owned();
        if let Some(terminator) = self.terminator() {
            if !command.ends_with(terminator) {
                command.push(terminator);
            }
        }
        command.into_bytes()
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceModel::Ettr => write!(f, "ETTR"),
            DeviceModel::Up30 => write!(f, "UP30"),
        }
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => write!(f, "{}", value.get_name()),
            None => write!(f, "{:?}", self),
        }
    }
}

/// Look up the literal string for `key` on `model`
pub fn resolve(model: DeviceModel, key: CommandKey) -> Option<&'static str> {
    model.command(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_is_defined_for_every_model() {
        for model in DeviceModel::ALL {
            for key in CommandKey::value_variants() {
                assert!(resolve(model, *key).is_some(), "{} lacks {}", model, key);
            }
        }
    }

    #[test]
    fn models_map_keys_to_their_own_literals() {
        assert_eq!(resolve(DeviceModel::Ettr, CommandKey::PuffStart), Some("ph on"));
        assert_eq!(resolve(DeviceModel::Up30, CommandKey::PuffStart), Some("p o"));
        assert_eq!(
            resolve(DeviceModel::Up30, CommandKey::VersionCheck),
            Some("flash print all")
        );
        assert_eq!(resolve(DeviceModel::Ettr, CommandKey::FlashInfo), Some("flr"));
    }

    #[test]
    fn terminator_is_appended_once() {
        assert_eq!(DeviceModel::Up30.encode("h on"), b"h on\r".to_vec());
        assert_eq!(DeviceModel::Up30.encode("h on\r"), b"h on\r".to_vec());
    }

    #[test]
    fn models_without_terminator_send_text_verbatim() {
        assert_eq!(DeviceModel::Ettr.encode("heat start"), b"heat start".to_vec());
        assert_eq!(DeviceModel::Ettr.encode(""), Vec::<u8>::new());
    }

    #[test]
    fn encoding_holds_for_all_models() {
        for model in DeviceModel::ALL {
            for text in ["version", "flash print all\r", ""] {
                let encoded = model.encode(text);
                match model.terminator() {
                    Some(t) => {
                        let t = t as u8;
                        assert_eq!(encoded.last(), Some(&t));
                        let body = text.trim_end_matches(t as char);
                        assert_eq!(&encoded[..encoded.len() - 1], body.as_bytes());
                    }
                    None => assert_eq!(encoded, text.as_bytes()),
                }
            }
        }
    }

    #[test]
    fn fast_model_settles_sooner() {
        assert!(DeviceModel::Ettr.settle_delay() < DeviceModel::Up30.settle_delay());
        assert_eq!(DeviceModel::Up30.settle_delay(), Duration::from_millis(600));
    }

    #[test]
    fn names_parse_from_cli_values() {
        assert_eq!(DeviceModel::from_str("up30", true), Ok(DeviceModel::Up30));
        assert_eq!(
            CommandKey::from_str("heat-start", true),
            Ok(CommandKey::HeatStart)
        );
        assert_eq!(CommandKey::FlashInfo.to_string(), "flash-info");
        assert_eq!(DeviceModel::Ettr.to_string(), "ETTR");
    }
}
