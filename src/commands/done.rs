use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo, StateChange};

pub struct DoneCommand;

#[async_trait]
impl Command for DoneCommand {
    fn name(&self) -> &str {
        "/done"
    }

    fn aliases(&self) -> &[&str] {
        &["/finalize"]
    }

    fn description(&self) -> &str {
        "finalize the workflow intent and show its analysis"
    }

    async fn execute(&self, _info: &SessionInfo<'_>) -> CommandResult {
        CommandResult::StateChanged(StateChange::FinalizeChat)
    }
}
