use colored::Colorize;

use crate::error::Result;
use crate::gemini::GeminiClient;
use crate::qa::{self, parse_structured, StructuredAnswer};
use crate::settings::load_settings;
use crate::summary::summarize;

use super::load_with_progress;

const WRAP_WIDTH: usize = 100;

fn render_structured(parsed: &StructuredAnswer, width: usize) -> String {
    let mut lines = vec![
        format!("{} {}", "Tópico:".bold(), parsed.topic),
        format!("{} {}", "Resumo:".bold(), parsed.summary),
    ];
    if !parsed.sources.is_empty() {
        lines.push(format!("{} {}", "Fontes:".bold(), parsed.sources.join(", ")));
    }
    if !parsed.tools_used.is_empty() {
        lines.push(format!("{} {}", "Ferramentas:".bold(), parsed.tools_used.join(", ")));
    }
    lines.push(format!("{}\n{}", "Análise:".bold(), textwrap::fill(&parsed.analysis, width)));
    lines.join("\n")
}

pub(crate) fn print_answer(answer: &str, structured: bool) {
    let width = WRAP_WIDTH;
    println!("\n{}", "[Resposta]".bold());
    for line in answer.lines() {
        println!("{}", textwrap::fill(line, width));
    }
    println!("{}", "-".repeat(width));

    if structured {
        match parse_structured(answer) {
            Ok(parsed) => println!("{}", render_structured(&parsed, width)),
            Err(e) => eprintln!("{} {e}", "Warning:".yellow().bold()),
        }
    }
}

pub fn run(archive: &str, question: &str, structured: bool) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        return Ok(());
    }
    // Credential is checked before the archive is read.
    let client = GeminiClient::from_env(&load_settings())?;
    let dataset = load_with_progress(archive)?;

    println!("{} {question}", "[Pergunta]".bold());
    let answer = qa::ask(&client, &summarize(Some(&dataset)), question)?;
    print_answer(&answer, structured);
    Ok(())
}
