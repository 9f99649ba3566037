use crate::core::story::CharacterHint;

pub const STYLE_DIRECTIVE: &str = "Illustration style: consistent cartoon art style across the whole book, \
Disney-Pixar × Looney Toons inspired, bright colors, rounded shapes, friendly character design, \
expressive faces, playful energy.";

pub const KID_SAFE_DIRECTIVE: &str = "Tone: cheerful, gentle and kid-friendly, suitable for a children's \
picture book. Nothing scary, sad, dangerous or violent. No text or lettering in the image.";

pub const FIRST_PAGE_CHARACTER_DIRECTIVE: &str = "Character design: this is the first page. Invent one \
clear, specific design for the main character (face shape, eye color and shape, fur/skin/hair coloring, \
size and build, clothing and accessories) and draw it plainly so the exact same design can be reused \
on every later page.";

pub const LATER_PAGE_CHARACTER_DIRECTIVE: &str = "Character design: draw the EXACT SAME main character \
established on page 1, with identical face, eyes, coloring, size and clothing. Do not redesign or \
restyle the character.";

#[derive(Debug, Clone, Copy)]
pub struct StoryContext<'a> {
    pub title: &'a str,
    pub scene: &'a str,
}

/// Builds the enhanced prompt for one page. Pure string composition; callers
/// skip pages whose raw prompt is empty.
pub fn enhance_image_prompt(
    image_prompt: &str,
    page_number: u32,
    hint: Option<&CharacterHint>,
    context: Option<StoryContext<'_>>,
) -> String {
    let mut parts = vec![image_prompt.trim().trim_end_matches('.').to_string() + "."];

    if let Some(ctx) = context {
        if !ctx.title.trim().is_empty() {
            parts.push(format!("From the children's story \"{}\".", ctx.title.trim()));
        }
        if !ctx.scene.trim().is_empty() {
            parts.push(format!("Scene: {}", ctx.scene.trim()));
        }
    }

    parts.push(STYLE_DIRECTIVE.to_string());
    parts.push(KID_SAFE_DIRECTIVE.to_string());

    if page_number <= 1 {
        parts.push(FIRST_PAGE_CHARACTER_DIRECTIVE.to_string());
    } else {
        parts.push(LATER_PAGE_CHARACTER_DIRECTIVE.to_string());
        if let Some(hint) = hint {
            parts.push(format!("Main character as described on page 1: \"{}\".", hint.as_str()));
        }
    }

    parts.join(" ")
}

/// Takes a verbatim excerpt of page 1's image prompt, at most `max_chars`
/// characters, cut back to a word boundary when truncated.
pub fn derive_character_hint(page_one_prompt: &str, max_chars: usize) -> Option<CharacterHint> {
    let prompt = page_one_prompt.trim();
    if prompt.is_empty() || max_chars == 0 {
        return None;
    }
    if prompt.chars().count() <= max_chars {
        return Some(CharacterHint::new(prompt));
    }

    let cut: String = prompt.chars().take(max_chars).collect();
    let excerpt = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => cut[..idx].trim_end().to_string(),
        _ => cut,
    };
    Some(CharacterHint::new(excerpt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_invents_character() {
        let prompt = enhance_image_prompt("A small fox in a meadow", 1, None, None);
        assert!(prompt.starts_with("A small fox in a meadow."));
        assert!(prompt.contains(STYLE_DIRECTIVE));
        assert!(prompt.contains(KID_SAFE_DIRECTIVE));
        assert!(prompt.contains(FIRST_PAGE_CHARACTER_DIRECTIVE));
        assert!(!prompt.contains(LATER_PAGE_CHARACTER_DIRECTIVE));
    }

    #[test]
    fn test_directive_order() {
        let prompt = enhance_image_prompt("A fox", 1, None, None);
        let style = prompt.find(STYLE_DIRECTIVE).unwrap();
        let kid = prompt.find(KID_SAFE_DIRECTIVE).unwrap();
        let character = prompt.find(FIRST_PAGE_CHARACTER_DIRECTIVE).unwrap();
        assert!(style < kid && kid < character);
    }

    #[test]
    fn test_later_pages_reuse_character_with_hint() {
        let hint = CharacterHint::new("A small orange fox with a green scarf");
        let prompt = enhance_image_prompt("The fox crosses a river.", 3, Some(&hint), None);
        assert!(prompt.starts_with("The fox crosses a river."));
        assert!(prompt.contains(LATER_PAGE_CHARACTER_DIRECTIVE));
        assert!(prompt.ends_with("\"A small orange fox with a green scarf\"."));
    }

    #[test]
    fn test_later_pages_without_hint() {
        let prompt = enhance_image_prompt("The fox sleeps", 5, None, None);
        assert!(prompt.contains(LATER_PAGE_CHARACTER_DIRECTIVE));
        assert!(!prompt.contains("as described on page 1"));
    }

    #[test]
    fn test_story_context_is_included() {
        let ctx = StoryContext { title: "The Brave Fox", scene: "The fox finds a lantern." };
        let prompt = enhance_image_prompt("A fox", 2, None, Some(ctx));
        assert!(prompt.contains("\"The Brave Fox\""));
        assert!(prompt.contains("Scene: The fox finds a lantern."));
        assert!(prompt.find("Scene:").unwrap() < prompt.find(STYLE_DIRECTIVE).unwrap());
    }

    #[test]
    fn test_hint_short_prompt_kept_whole() {
        let hint = derive_character_hint("  A tiny blue owl  ", 150).unwrap();
        assert_eq!(hint.as_str(), "A tiny blue owl");
    }

    #[test]
    fn test_hint_truncates_on_word_boundary() {
        let hint = derive_character_hint("A small orange fox with a green scarf", 20).unwrap();
        assert_eq!(hint.as_str(), "A small orange fox");
        assert!("A small orange fox with a green scarf".starts_with(hint.as_str()));
    }

    #[test]
    fn test_hint_single_long_word() {
        let hint = derive_character_hint("Supercalifragilistic", 5).unwrap();
        assert_eq!(hint.as_str(), "Super");
    }

    #[test]
    fn test_no_hint_from_empty_prompt() {
        assert!(derive_character_hint("   ", 150).is_none());
        assert!(derive_character_hint("A fox", 0).is_none());
    }
}
