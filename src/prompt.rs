//! Prompt construction for the classification request.

use crate::category::Category;
use crate::classification::Schema;

/// Builds the instruction sent to the model for one review.
pub fn build_prompt(review_text: &str, schema: Schema) -> String {
    let mut prompt = format!(
        "Analyze the sentiment of the following hotel review.\n\
         Review: '{review_text}'\n\n\
         Classify the review overall as exactly one of Positive, Neutral or Negative, \
         and give it an integer rating from 0 to 5.\n"
    );

    match schema {
        Schema::Categories => {
            let categories = Category::ALL
                .iter()
                .map(|c| c.label())
                .collect::<Vec<_>>()
                .join(", ");
            prompt.push_str(&format!(
                "Check whether the review mentions any of these categories: [{categories}].\n\
                 For each category the review mentions, and only those, classify its sentiment \
                 as Positive, Neutral or Negative. Leave out categories the review does not mention.\n\n\
                 Respond with a single JSON object and nothing else. Use the key \"classify\" for \
                 the overall sentiment (a string), \"rating\" for the rating (an integer), and the \
                 exact category name as the key for each mentioned category.\n\
                 Example: {{\"classify\": \"Positive\", \"rating\": 4, \"Cleanliness\": \"Positive\", \
                 \"Location\": \"Neutral\"}}\n\
                 Example with no categories mentioned: {{\"classify\": \"Neutral\", \"rating\": 3}}\n"
            ));
        }
        Schema::Confidence => {
            prompt.push_str(
                "Also give a confidence score between 0 and 1 for your classification.\n\n\
                 Respond with a single JSON object and nothing else, with exactly the keys \
                 \"classify\" (a string), \"rating\" (an integer) and \"confidence\" (a number).\n\
                 Example: {\"classify\": \"Negative\", \"rating\": 1, \"confidence\": 0.9}\n",
            );
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_review_text() {
        let p = build_prompt("Great stay, spotless room", Schema::Categories);
        assert!(p.contains("Great stay, spotless room"));
    }

    #[test]
    fn test_categories_prompt_lists_every_category() {
        let p = build_prompt("", Schema::Categories);
        for c in Category::ALL {
            assert!(p.contains(c.label()), "missing {c}");
        }
        assert!(p.contains("\"classify\""));
        assert!(!p.contains("confidence"));
    }

    #[test]
    fn test_confidence_prompt_omits_categories() {
        let p = build_prompt("", Schema::Confidence);
        assert!(p.contains("\"confidence\""));
        assert!(!p.contains("Cleanliness"));
    }
}
