use anyhow::Result;
use services::AppServices;

use crate::prompt::Input;

pub async fn execute(app: &AppServices, yes: bool) -> Result<()> {
    if !yes {
        let mut input = Input::stdin();
        let reply = input
            .ask("This deletes all sessions and mistakes. Type `yes` to continue: ")
            .await?;
        if reply.as_deref() != Some("yes") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let summary = app.reset_all_data().await?;
    println!(
        "Removed {} sessions and {} mistakes; preferences restored to defaults.",
        summary.sessions_removed, summary.wrong_answers_removed
    );
    Ok(())
}
