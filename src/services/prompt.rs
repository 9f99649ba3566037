use crate::core::story::PAGE_COUNT;

pub const STORY_STYLE: &str = "Disney-Pixar and Looney Toons inspired";

fn age_guidance(age: u8) -> &'static str {
    match age {
        0..=5 => {
            "Use very short sentences (under 8 words) and only simple, everyday words. \
             Repeat key words so a young listener can follow along."
        }
        6..=8 => {
            "Use short sentences (under 12 words) and familiar vocabulary. \
             One or two new words are fine if the picture explains them."
        }
        _ => {
            "Use clear sentences (under 18 words). Richer vocabulary and a little \
             gentle humour are welcome."
        }
    }
}

pub fn storybook_prompt(title: &str, story: &str, age: u8) -> String {
    let skeleton_pages = (1..=PAGE_COUNT)
        .map(|n| {
            format!(
                "    {{ \"page_number\": {}, \"title\": \"\", \"text\": \"\", \"emotion\": \"\", \"image_prompt\": \"\" }}",
                n
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "Create a five-page illustrated children's storybook based on the story below.\n\
        \n\
        Title: \"{title}\"\n\
        Age: {age} years old\n\
        Story: \"\"\"{story}\"\"\"\n\
        \n\
        First check the story is suitable for a {age}-year-old. If any part is scary, violent, \
        sad or meant for adults, rewrite it so it is gentle and reassuring while keeping the \
        main characters and idea.\n\
        \n\
        Each page must include:\n\
        - \"title\": 2-5 words\n\
        - \"text\": 2-4 short sentences (max 70 words)\n\
        - \"emotion\": one simple feeling (e.g., happy, brave, curious)\n\
        - \"image_prompt\": a clear visual description for an illustration\n\
        \n\
        Use warm, imaginative storytelling suitable for a {age}-year-old \
        in New Zealand or Australia. Avoid fear, violence, or adult themes.\n\
        {guidance}\n\
        \n\
        Keep the tone friendly and curious, encouraging themes of kindness, friendship, \
        and discovery.\n\
        \n\
        Illustration direction:\n\
        - Disney-Pixar × Looney Toons style\n\
        - Bright colors, rounded shapes, expressive characters, playful energy.\n\
        - Describe the main character's look the same way on every page.\n\
        \n\
        Return JSON only in this exact format:\n\
        \n\
        {{\n  \"story_title\": \"{title}\",\n  \"target_age\": {age},\n  \"style\": \"{style}\",\n  \"pages\": [\n{pages}\n  ]\n}}\n",
        title = title,
        age = age,
        story = story,
        guidance = age_guidance(age),
        style = STORY_STYLE,
        pages = skeleton_pages,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_inputs() {
        let prompt = storybook_prompt("The Brave Fox", "A fox explores a spooky forest.", 6);
        assert!(prompt.contains("Title: \"The Brave Fox\""));
        assert!(prompt.contains("Age: 6 years old"));
        assert!(prompt.contains("A fox explores a spooky forest."));
        assert!(prompt.contains("\"target_age\": 6"));
        assert!(prompt.contains("Return JSON only"));
    }

    #[test]
    fn test_prompt_lists_five_pages() {
        let prompt = storybook_prompt("Fox", "A fox.", 6);
        for n in 1..=5 {
            assert!(prompt.contains(&format!("\"page_number\": {},", n)));
        }
        assert!(!prompt.contains("\"page_number\": 6"));
    }

    #[test]
    fn test_guidance_varies_by_age() {
        let young = storybook_prompt("Fox", "A fox.", 3);
        let middle = storybook_prompt("Fox", "A fox.", 7);
        let older = storybook_prompt("Fox", "A fox.", 11);
        assert!(young.contains("under 8 words"));
        assert!(middle.contains("under 12 words"));
        assert!(older.contains("under 18 words"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(storybook_prompt("Fox", "A fox.", 9), storybook_prompt("Fox", "A fox.", 9));
    }
}
