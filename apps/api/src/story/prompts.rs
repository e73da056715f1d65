// Prompt text for story generation.
// Profile values are interpolated as-is; the provider treats them as plain text.

use crate::story::request::StoryProfile;

/// System role for every story completion.
pub const STORY_SYSTEM: &str = "You are a creative children's story writer who creates \
    engaging, age-appropriate bedtime stories. Keep responses concise.";

/// Closing instructions appended to every story prompt.
pub const STORY_GUIDELINES: &str = "Make the story engaging, age-appropriate, and include a positive message.\n\
    Keep the story between 500-800 words.";

/// Builds the user prompt for a validated profile.
/// Optional fields contribute one sentence each, only when present.
pub fn build_story_prompt(profile: &StoryProfile) -> String {
    let mut lines = vec![format!(
        "Create a bedtime story for a {} year old child named {}.",
        profile.age, profile.child_name
    )];

    if let Some(interests) = &profile.interests {
        lines.push(format!("The child is interested in: {interests}."));
    }
    if let Some(goals) = &profile.learning_goals {
        lines.push(format!("The story should teach about: {goals}."));
    }
    if let Some(emotions) = &profile.emotions {
        lines.push(format!("The child is currently feeling: {emotions}."));
    }

    lines.push(STORY_GUIDELINES.to_string());
    lines.join("\n")
}
