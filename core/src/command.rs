use serde::{Deserialize, Serialize};

/// The user-facing actions a host wires to its controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    Initialize,
    GenerateSchedule,
    StartRacing,
    Pause,
    Resume,
    ResetGame,
}

impl PlayerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize       => "initialize",
            Self::GenerateSchedule => "generate_schedule",
            Self::StartRacing      => "start_racing",
            Self::Pause            => "pause",
            Self::Resume           => "resume",
            Self::ResetGame        => "reset_game",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_json() {
        let cmd: PlayerCommand = serde_json::from_str(r#"{"cmd":"start_racing"}"#).unwrap();
        assert_eq!(cmd, PlayerCommand::StartRacing);
        assert_eq!(cmd.name(), "start_racing");
    }
}
