use anyhow::Result;
use quickcal_core::model::{PreferencesUpdate, UserPreferences};
use services::AppServices;

pub async fn execute(
    app: &AppServices,
    questions: Option<u32>,
    sound: Option<bool>,
    haptics: Option<bool>,
    auto_submit: Option<bool>,
) -> Result<()> {
    let update = PreferencesUpdate {
        questions_per_session: questions,
        sound_enabled: sound,
        haptic_feedback_enabled: haptics,
        auto_submit_enabled: auto_submit,
    };

    let preferences = app.preferences();
    let current = if update.is_empty() {
        preferences.load().await?
    } else {
        preferences.update(update).await?
    };
    print_preferences(&current);
    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn print_preferences(prefs: &UserPreferences) {
    println!("questions per session  {}", prefs.questions_per_session());
    println!("sound                  {}", on_off(prefs.sound_enabled()));
    println!("haptic feedback        {}", on_off(prefs.haptic_feedback_enabled()));
    println!("auto submit            {}", on_off(prefs.auto_submit_enabled()));
}
