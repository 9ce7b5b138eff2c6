use async_trait::async_trait;

use super::{Command, CommandResult, Mode, SessionInfo};

pub struct EndpointCommand;

#[async_trait]
impl Command for EndpointCommand {
    fn name(&self) -> &str {
        "/endpoint"
    }

    fn description(&self) -> &str {
        "show the backend endpoints in use"
    }

    async fn execute(&self, info: &SessionInfo<'_>) -> CommandResult {
        println!("{}", describe(info));
        CommandResult::Handled
    }
}

fn describe(info: &SessionInfo<'_>) -> String {
    let mut out = format!(
        "  analyze   {}\n  chat      {}\n  prompt    {}\n  config    {}",
        info.endpoint, info.chat_endpoint, info.prompt_body, info.db_path
    );
    if let (Mode::Chat, Some(id)) = (info.mode, info.session_id) {
        out.push_str(&format!("\n  session   {id}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{chat_info, test_info};

    #[tokio::test]
    async fn returns_handled() {
        assert!(matches!(
            EndpointCommand.execute(&test_info()).await,
            CommandResult::Handled
        ));
    }

    #[test]
    fn describes_endpoints() {
        let text = describe(&test_info());
        assert!(text.contains("http://127.0.0.1:8000/analyze"));
        assert!(text.contains("http://127.0.0.1:8000/chat"));
        assert!(text.contains("trimmed"));
        assert!(!text.contains("session"));
    }

    #[test]
    fn chat_mode_shows_session() {
        let text = describe(&chat_info());
        assert!(text.contains("session   00000000-0000-0000-0000-000000000000"));
    }
}
