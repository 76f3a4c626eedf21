use crate::summarize::UrlRole;
use protoscribe_fetch::PromptPair;

/// Chooses the instructions sent with an image of a given role.
pub trait PromptSelector: Send + Sync {
    fn prompts_for(&self, role: UrlRole) -> PromptPair;
}

impl<F> PromptSelector for F
where
    F: Fn(UrlRole) -> PromptPair + Send + Sync,
{
    fn prompts_for(&self, role: UrlRole) -> PromptPair {
        self(role)
    }
}

/// Stock UX-analysis prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrompts;

impl PromptSelector for DefaultPrompts {
    fn prompts_for(&self, role: UrlRole) -> PromptPair {
        match role {
            UrlRole::Frame => PromptPair::new(
                "You are an expert UX design analyst focusing on full-screen UI layout understanding.",
                "Analyze this full screen UI design: 1. What is its purpose? 2. What are the key \
                 components? 3. How is the visual hierarchy organised? Keep it under 100 words.",
            ),
            UrlRole::SourceElement => PromptPair::new(
                "You are a UI element recognizer identifying clickable controls and icons.",
                "Analyze this UI element: 1. What is it? 2. Why would a user interact with it? \
                 3. Which visual cues signal that? Keep it under 60 words.",
            ),
            UrlRole::DestinationElement => PromptPair::new(
                "You analyze UI screens reached after a user action.",
                "Analyze this destination screen: 1. What just happened? 2. What is displayed? \
                 3. How does it differ from a typical previous screen? Keep it under 80 words.",
            ),
            UrlRole::General => PromptPair::new(
                "You are a UX design summarizer.",
                "Describe this image briefly in under 60 words.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_role_gets_distinct_prompts() {
        let roles = [
            UrlRole::Frame,
            UrlRole::SourceElement,
            UrlRole::DestinationElement,
            UrlRole::General,
        ];
        let prompts: Vec<PromptPair> = roles
            .iter()
            .map(|r| DefaultPrompts.prompts_for(*r))
            .collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in &prompts[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_closure_selector() {
        let selector = |role: UrlRole| PromptPair::new(format!("{role:?}"), "describe");
        assert_eq!(selector.prompts_for(UrlRole::Frame).system, "Frame");
    }
}
