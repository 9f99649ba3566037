pub mod enhancer;
pub mod illustrator;
pub mod image;
pub mod llm;
pub mod parser;
pub mod placeholder;
pub mod prompt;
pub mod safety;
pub mod story;

pub(crate) fn preview(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdefghij", 4), "abcd...");
        assert_eq!(preview("éééé", 2), "éé...");
    }
}
