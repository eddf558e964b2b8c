//! Gathering slide markdown for a list of micro-skills.
//!
//! The language-model call itself is a [`CompletionService`] supplied by the
//! caller. Calls are made one at a time with a fixed pause between them;
//! there is no pause after the last call.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pause between completion calls.
pub const DEFAULT_CALL_DELAY: Duration = Duration::from_millis(500);

/// Marker counted in generated markdown to number the next batch.
const SLIDE_MARKER: &str = "# Slide";

const PROMPT_TEMPLATE: &str = "\
Assume the role of an experienced {job_role} responsible for {expertise}. \
Using your real-world experience and responsibilities as context, you are tasked \
with creating a training presentation for fresh engineering graduates.

The presentation focuses on practices related to the core skill: {core_skill}.

Each response focuses on one micro-skill and can have 1 to 5 slides, depending on complexity.

Each slide must include:
- Title formatted as: # Slide X: Slide Title
- 3-5 bullet points (start each with '-'). Keep each under 15 words.
- If including a table, limit to max 5 columns and 6 rows.
- Add speaker notes at the end using: speaker notes:
- Make all content compatible with markdown.
- Avoid LaTeX and keep formatting clean.

Now generate 1 to 5 slides starting from Slide {slide_start} for the micro-skill:
{microskill_title} - {microskill_details}
";

/// One `Title|Details` line of the micro-skill list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroSkill {
    pub title: String,
    pub details: String,
}

/// Who the training is for and what it covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingBrief {
    pub job_role: String,
    pub expertise: String,
    pub core_skill: String,
}

/// Text-completion backend: prompt in, markdown out.
pub trait CompletionService {
    fn complete(&mut self, prompt: &str) -> std::result::Result<String, String>;
}

impl<F> CompletionService for F
where
    F: FnMut(&str) -> std::result::Result<String, String>,
{
    fn complete(&mut self, prompt: &str) -> std::result::Result<String, String> {
        self(prompt)
    }
}

/// Parse micro-skills, one `Title|Details` per line. Lines without a `|`
/// are ignored.
pub fn parse_microskills(text: &str) -> Vec<MicroSkill> {
    text.lines()
        .filter_map(|line| {
            let (title, details) = line.trim().split_once('|')?;
            Some(MicroSkill {
                title: title.trim().to_string(),
                details: details.trim().to_string(),
            })
        })
        .collect()
}

/// Fill the slide-generation prompt for one micro-skill.
pub fn build_prompt(brief: &TrainingBrief, skill: &MicroSkill, slide_start: usize) -> String {
    PROMPT_TEMPLATE
        .replace("{job_role}", &brief.job_role)
        .replace("{expertise}", &brief.expertise)
        .replace("{core_skill}", &brief.core_skill)
        .replace("{slide_start}", &slide_start.to_string())
        .replace("{microskill_title}", &skill.title)
        .replace("{microskill_details}", &skill.details)
}

/// Generate markdown for every micro-skill and join it with blank lines.
///
/// `progress` is called before each request with a message and the fraction
/// of skills started. The first failed call aborts the batch.
pub fn collect_markdown<S, P>(
    service: &mut S,
    brief: &TrainingBrief,
    skills: &[MicroSkill],
    delay: Duration,
    mut progress: P,
) -> Result<String>
where
    S: CompletionService + ?Sized,
    P: FnMut(&str, f32),
{
    let mut parts = Vec::with_capacity(skills.len());
    let mut slide_start = 1;

    for (i, skill) in skills.iter().enumerate() {
        progress(
            &format!("Processing micro-skill {} of {}...", i + 1, skills.len()),
            (i + 1) as f32 / skills.len() as f32,
        );

        let prompt = build_prompt(brief, skill, slide_start);
        let markdown = service.complete(&prompt).map_err(|e| {
            Error::CompletionError(format!("micro-skill '{}': {}", skill.title, e))
        })?;

        let produced = markdown.matches(SLIDE_MARKER).count();
        log::debug!(
            "Micro-skill '{}' produced {} slides starting at {}",
            skill.title,
            produced,
            slide_start
        );
        slide_start += produced;
        parts.push(markdown);

        if !delay.is_zero() && i + 1 < skills.len() {
            std::thread::sleep(delay);
        }
    }

    Ok(parts.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn brief() -> TrainingBrief {
        TrainingBrief {
            job_role: "Test Engineer".into(),
            expertise: "board bring-up".into(),
            core_skill: "Soldering".into(),
        }
    }

    #[test]
    fn test_parse_microskills() {
        let skills = parse_microskills("Flux|Why flux matters\nno pipe here\n  Tinning | Tip care | extra \n");
        assert_eq!(
            skills,
            vec![
                MicroSkill {
                    title: "Flux".into(),
                    details: "Why flux matters".into()
                },
                MicroSkill {
                    title: "Tinning".into(),
                    details: "Tip care | extra".into()
                },
            ]
        );
    }

    #[test]
    fn test_build_prompt_fills_fields() {
        let skill = MicroSkill {
            title: "Flux".into(),
            details: "Why flux matters".into(),
        };
        let prompt = build_prompt(&brief(), &skill, 4);
        assert!(prompt.contains("experienced Test Engineer responsible for board bring-up"));
        assert!(prompt.contains("core skill: Soldering"));
        assert!(prompt.contains("starting from Slide 4"));
        assert!(prompt.contains("Flux - Why flux matters"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_collect_markdown_numbers_batches() {
        let skills = parse_microskills("A|a\nB|b\n");
        let mut prompts = Vec::new();
        let mut service = |prompt: &str| -> std::result::Result<String, String> {
            prompts.push(prompt.to_string());
            Ok("# Slide 1: x\n\n# Slide 2: y".to_string())
        };
        let mut seen = Vec::new();
        let markdown = collect_markdown(&mut service, &brief(), &skills, Duration::ZERO, |msg, frac| {
            seen.push((msg.to_string(), frac))
        })
        .unwrap();

        assert_eq!(markdown, "# Slide 1: x\n\n# Slide 2: y\n\n# Slide 1: x\n\n# Slide 2: y");
        assert!(prompts[0].contains("starting from Slide 1"));
        assert!(prompts[1].contains("starting from Slide 3"));
        assert_eq!(seen[1], ("Processing micro-skill 2 of 2...".to_string(), 1.0));
    }

    #[test]
    fn test_no_pause_after_last_call() {
        let skills = parse_microskills("A|a\n");
        let mut service = |_: &str| -> std::result::Result<String, String> { Ok("# Slide 1: x".to_string()) };
        let start = Instant::now();
        collect_markdown(&mut service, &brief(), &skills, Duration::from_secs(30), |_, _| {}).unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_pause_between_calls() {
        let skills = parse_microskills("A|a\nB|b\n");
        let mut service = |_: &str| -> std::result::Result<String, String> { Ok(String::new()) };
        let start = Instant::now();
        collect_markdown(&mut service, &brief(), &skills, Duration::from_millis(50), |_, _| {}).unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_collect_markdown_stops_on_error() {
        let skills = parse_microskills("A|a\nB|b\n");
        let mut calls = 0;
        let mut service = |_: &str| -> std::result::Result<String, String> {
            calls += 1;
            Err("rate limited".to_string())
        };
        let err = collect_markdown(&mut service, &brief(), &skills, Duration::ZERO, |_, _| {})
            .unwrap_err();
        assert!(matches!(err, Error::CompletionError(ref m) if m.contains("rate limited")));
        drop(service);
        assert_eq!(calls, 1);
    }
}
