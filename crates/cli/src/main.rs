//! CLI tool for turning training markdown or HTML into PowerPoint decks.

use anyhow::{bail, Context, Result};
use clap::Parser;
use deck_core::{
    collect_markdown, load_source, parse_markdown, parse_microskills, CompletionService, ContentTree,
    ExtractedDeck, GeneratorConfig, TrainingBrief,
};
use deck_pptx::{PptxReader, PresentationGenerator};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

/// Build a slide deck (plus speaker-notes transcript) from markdown or HTML.
#[derive(Parser, Debug)]
#[command(name = "md2deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file(s): markdown/HTML to build, or .pptx with --inspect
    #[arg(required_unless_present = "microskills")]
    input: Vec<PathBuf>,

    /// Generate the slides from a micro-skill list (one `Title|Details` per line)
    #[arg(long, requires = "complete", conflicts_with = "inspect")]
    microskills: Option<PathBuf>,

    /// Shell command that reads a prompt on stdin and prints slide markdown
    #[arg(long)]
    complete: Option<String>,

    /// Job role the trainer speaks as
    #[arg(long, default_value = "")]
    job_role: String,

    /// Area of expertise of that role
    #[arg(long, default_value = "")]
    expertise: String,

    /// Core skill the training covers
    #[arg(long, default_value = "")]
    core_skill: String,

    /// Pause between completion calls, in milliseconds
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,

    /// Output .pptx path (default: first input's name with .pptx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Presentation title, used when the content has no heading
    #[arg(short, long)]
    title: Option<String>,

    /// JSON file overriding generator settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the contents of existing .pptx files instead of building
    #[arg(long)]
    inspect: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if args.inspect {
        for input_path in &args.input {
            match inspect_file(input_path) {
                Ok(deck) => print_deck(&deck, args.json)?,
                Err(e) => eprintln!("Error inspecting {}: {:#}", input_path.display(), e),
            }
        }
        return Ok(());
    }

    if let Some(skills_path) = &args.microskills {
        return generate(&args, skills_path);
    }

    build(&args)
}

fn load_config(args: &Args) -> Result<GeneratorConfig> {
    match &args.config {
        Some(path) => GeneratorConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(GeneratorConfig::default()),
    }
}

fn build(args: &Args) -> Result<()> {
    let config = load_config(args)?;

    let mut trees = Vec::with_capacity(args.input.len());
    for input_path in &args.input {
        let (format, tree) = load_source(input_path)
            .with_context(|| format!("Failed to load {}", input_path.display()))?;
        if args.verbose {
            eprintln!("Loaded {} as {:?}", input_path.display(), format);
        }
        trees.push(tree);
    }
    let tree = ContentTree::concat(trees);

    let output = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&args.input[0]),
    };
    write_deck(args, config, &tree, &output)
}

/// Ask the completion command for each micro-skill's slides, keep the joined
/// markdown beside the deck, then build the deck from it.
fn generate(args: &Args, skills_path: &Path) -> Result<()> {
    let config = load_config(args)?;
    let text = fs::read_to_string(skills_path)
        .with_context(|| format!("Failed to read {}", skills_path.display()))?;
    let skills = parse_microskills(&text);
    if skills.is_empty() {
        bail!("no `Title|Details` lines in {}", skills_path.display());
    }
    let Some(command) = &args.complete else {
        bail!("--microskills needs --complete");
    };

    let brief = TrainingBrief {
        job_role: args.job_role.clone(),
        expertise: args.expertise.clone(),
        core_skill: args.core_skill.clone(),
    };
    let mut service = ShellCompletion::new(command);
    let markdown = collect_markdown(
        &mut service,
        &brief,
        &skills,
        Duration::from_millis(args.delay_ms),
        |message, _| log::info!("{}", message),
    )
    .context("Slide generation failed")?;

    let output = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(skills_path),
    };
    let markdown_path = generated_markdown_path(&output);
    if let Some(parent) = markdown_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&markdown_path, &markdown)
        .with_context(|| format!("Failed to write {}", markdown_path.display()))?;
    if !args.json {
        println!("Wrote {}", markdown_path.display());
    }

    write_deck(args, config, &parse_markdown(&markdown), &output)
}

fn write_deck(args: &Args, config: GeneratorConfig, tree: &ContentTree, output: &Path) -> Result<()> {
    let generator = PresentationGenerator::new(config);
    let report = generator
        .try_create_presentation(tree, output, args.title.as_deref())
        .with_context(|| format!("Failed to create {}", output.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Wrote {} ({} slides, {} notes)",
            report.output.display(),
            report.slides,
            report.notes
        );
        println!("Wrote {}", report.transcript.display());
        if report.fallback {
            eprintln!("warning: no content found, deck contains the fallback slide");
        }
    }
    Ok(())
}

/// `notes.md` becomes `notes.pptx` beside it.
fn default_output_path(input_path: &Path) -> PathBuf {
    input_path.with_extension("pptx")
}

/// `deck.pptx` keeps its generated source as `deck_slides.md`.
fn generated_markdown_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("presentation");
    output.with_file_name(format!("{}_slides.md", stem))
}

/// Completion backend that pipes the prompt into a shell command and reads
/// the markdown from its stdout.
struct ShellCompletion {
    command: String,
}

impl ShellCompletion {
    fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }

    fn shell(&self) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C");
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c");
            cmd
        };
        cmd.arg(&self.command);
        cmd
    }
}

impl CompletionService for ShellCompletion {
    fn complete(&mut self, prompt: &str) -> std::result::Result<String, String> {
        let mut child = self
            .shell()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| format!("failed to run `{}`: {}", self.command, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .map_err(|e| format!("failed to send prompt: {}", e))?;
        }

        let out = child
            .wait_with_output()
            .map_err(|e| format!("failed to wait for `{}`: {}", self.command, e))?;
        if !out.status.success() {
            return Err(format!("`{}` exited with {}", self.command, out.status));
        }
        String::from_utf8(out.stdout).map_err(|e| format!("output is not UTF-8: {}", e))
    }
}

fn inspect_file(input_path: &Path) -> Result<ExtractedDeck> {
    if input_path.extension().and_then(|e| e.to_str()) != Some("pptx") {
        bail!("not a .pptx file");
    }
    let file = File::open(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let filename = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    let deck = PptxReader::new().read(BufReader::new(file), filename)?;
    log::debug!("{}: {} slides", filename, deck.slides.len());
    Ok(deck)
}

fn print_deck(deck: &ExtractedDeck, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(deck)?);
        return Ok(());
    }

    println!("{}", deck.filename);
    for slide in &deck.slides {
        println!();
        println!(
            "Slide {}: {}",
            slide.number,
            slide.title.as_deref().unwrap_or("(untitled)")
        );
        for line in &slide.lines {
            println!("{}- {}", "  ".repeat(line.level as usize + 1), line.text);
        }
        for table in &slide.tables {
            for row in table {
                println!("  | {} |", row.join(" | "));
            }
        }
        if let Some(notes) = &slide.notes {
            println!("  Notes: {}", notes);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("course/soldering.md")),
            PathBuf::from("course/soldering.pptx")
        );
        assert_eq!(default_output_path(Path::new("canvas")), PathBuf::from("canvas.pptx"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["md2deck", "a.md", "b.html", "-o", "out.pptx", "--json"]).unwrap();
        assert_eq!(args.input.len(), 2);
        assert_eq!(args.output, Some(PathBuf::from("out.pptx")));
        assert!(args.json);
        assert!(!args.inspect);
    }

    #[test]
    fn test_inspect_rejects_non_pptx() {
        assert!(inspect_file(Path::new("notes.md")).is_err());
    }

    #[test]
    fn test_microskills_args() {
        let args = Args::try_parse_from([
            "md2deck",
            "--microskills",
            "skills.txt",
            "--complete",
            "llm-cli",
            "--core-skill",
            "Soldering",
            "--delay-ms",
            "0",
        ])
        .unwrap();
        assert!(args.input.is_empty());
        assert_eq!(args.microskills, Some(PathBuf::from("skills.txt")));
        assert_eq!(args.core_skill, "Soldering");
        assert_eq!(args.delay_ms, 0);

        assert!(Args::try_parse_from(["md2deck"]).is_err());
        assert!(Args::try_parse_from(["md2deck", "--microskills", "skills.txt"]).is_err());
    }

    #[test]
    fn test_generated_markdown_path() {
        assert_eq!(
            generated_markdown_path(Path::new("out/skills.pptx")),
            PathBuf::from("out/skills_slides.md")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_completion_pipes_prompt() {
        let mut service = ShellCompletion::new("cat");
        assert_eq!(service.complete("# Slide 1: Echo").unwrap(), "# Slide 1: Echo");

        let mut failing = ShellCompletion::new("cat >/dev/null; exit 3");
        let err = failing.complete("prompt").unwrap_err();
        assert!(err.contains("exited"));
    }

    #[cfg(unix)]
    #[test]
    fn test_generate_from_microskills() {
        let tmp = tempfile::TempDir::new().unwrap();
        let skills = tmp.path().join("skills.txt");
        fs::write(&skills, "Flux|Why flux matters\n").unwrap();
        let output = tmp.path().join("training.pptx");

        let args = Args::try_parse_from([
            "md2deck",
            "--microskills",
            skills.to_str().unwrap(),
            "--complete",
            "cat >/dev/null; printf '# Slide 1: Flux\\n\\n- Clean the pad\\n\\nspeaker notes: Show the pad\\n'",
            "--delay-ms",
            "0",
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        generate(&args, &skills).unwrap();

        assert!(output.exists());
        let markdown = fs::read_to_string(tmp.path().join("training_slides.md")).unwrap();
        assert!(markdown.starts_with("# Slide 1: Flux"));
        let transcript = fs::read_to_string(tmp.path().join("training_speaker_notes.txt")).unwrap();
        assert_eq!(transcript, "Slide 1:\nShow the pad\n\n");
    }
}
