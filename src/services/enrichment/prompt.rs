use crate::models::UserProfile;

/// Builds the matchmaker prompt for one (requester, candidate) pair
///
/// The prompt carries both profiles' names, traits and bios, and pins the
/// reply to a fenced JSON object with `summary`, `totalScore` and 3-4
/// `similarFeatures` entries.
pub fn build_match_prompt(requester: &UserProfile, candidate: &UserProfile) -> String {
    format!(
        r#"You are a thoughtful matchmaker. Assess how compatible these two people are.

## Person A
{person_a}

## Person B
{person_b}

Reply with a single JSON object inside a ```json fenced block, with exactly these fields:
- "summary": one or two sentences describing the pair
- "totalScore": an integer from 0 to 100 for overall compatibility
- "similarFeatures": an object with 3-4 named areas of similarity, each an object with
  "score" (integer 0-100) and "explanation" (one sentence)

Base the assessment only on the information above."#,
        person_a = describe(requester),
        person_b = describe(candidate),
    )
}

fn describe(profile: &UserProfile) -> String {
    let traits = if profile.traits.is_empty() {
        "(none listed)".to_string()
    } else {
        profile.traits.join(", ")
    };
    let bio = match profile.bio.trim() {
        "" => "(no bio)",
        bio => bio,
    };

    format!(
        "- Name: {}\n- Traits: {}\n- Bio: {}",
        profile.display_name, traits, bio
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;

    #[test]
    fn test_prompt_mentions_both_profiles() {
        let a = UserProfile::new(UserId::new("a"), "Ada")
            .with_traits(["curious", "night owl"])
            .with_bio("Builds engines.");
        let b = UserProfile::new(UserId::new("b"), "Grace").with_traits(["curious"]);

        let prompt = build_match_prompt(&a, &b);

        assert!(prompt.contains("Ada"));
        assert!(prompt.contains("curious, night owl"));
        assert!(prompt.contains("Builds engines."));
        assert!(prompt.contains("Grace"));
        assert!(prompt.contains("(no bio)"));
        assert!(prompt.contains("similarFeatures"));
        assert!(prompt.contains("totalScore"));
    }

    #[test]
    fn test_prompt_handles_traitless_profile() {
        let a = UserProfile::new(UserId::new("a"), "Ada");
        let prompt = build_match_prompt(&a, &a);
        assert!(prompt.contains("(none listed)"));
    }
}
