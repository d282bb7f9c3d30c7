use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum PlayerAction {
    #[serde(rename_all = "camelCase")]
    StartQuiz { player_name: String },

    #[serde(rename_all = "camelCase")]
    SelectAnswer {
        question_index: usize,
        option_index: usize,
    },

    NextQuestion,
    PrevQuestion,
    UseHint,
    SubmitQuiz,
    ResetQuiz,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum AdminAction {
    /// Requires a bearer token in the `token` query parameter.
    OpenDashboard,
    RefreshResults,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Player(PlayerAction),
    Admin(AdminAction),
}
