use std::io::{BufRead, Write};
use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::gemini::GeminiClient;
use crate::session::Session;
use crate::settings::load_settings;

use super::{ask::print_answer, progress_line, report};

const HELP: &str = "\
Comandos:
  load <arquivo.zip>   carrega um arquivo ZIP com as NF-e
  summary              mostra o resumo enviado ao modelo
  report               mostra as estatísticas em tabelas
  status               mostra o arquivo carregado
  help                 mostra esta ajuda
  quit                 encerra a sessão
Qualquer outro texto é enviado como pergunta.";

enum Line<'a> {
    Load(&'a str),
    Summary,
    Report,
    Status,
    Help,
    Quit,
    Question(&'a str),
    Empty,
}

fn parse_line(line: &str) -> Line<'_> {
    let line = line.trim();
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match head {
        "" => Line::Empty,
        "load" => Line::Load(rest.trim()),
        "summary" => Line::Summary,
        "report" => Line::Report,
        "status" => Line::Status,
        "help" | "?" => Line::Help,
        "quit" | "exit" => Line::Quit,
        _ => Line::Question(line),
    }
}

struct Shell {
    session: Session,
    client: Option<GeminiClient>,
    config_error: Option<String>,
}

impl Shell {
    fn load(&mut self, path: &str) {
        if path.is_empty() {
            println!("Uso: load <arquivo.zip>");
            return;
        }
        let mut progress = progress_line;
        match self.session.load(Path::new(path), &mut progress) {
            Ok(ds) => {
                println!("Dados carregados com sucesso!");
                println!(
                    "{} notas, {} itens. Resumo estatístico disponível para análise.",
                    ds.headers.len(),
                    ds.items.len()
                );
            }
            Err(e) => eprintln!("\nErro ao carregar arquivo: {e}"),
        }
    }

    fn status(&self) {
        match self.session.dataset() {
            Some(ds) => {
                println!("Arquivo:   {}", ds.source.display());
                println!("SHA-256:   {}", ds.checksum);
                println!("Notas:     {}", ds.headers.len());
                println!("Itens:     {}", ds.items.len());
            }
            None => println!("Arquivo ZIP não selecionado"),
        }
        if let Some(msg) = &self.config_error {
            println!("{}", msg.yellow());
        }
    }

    fn question(&self, question: &str) {
        let Some(client) = &self.client else {
            let msg = self.config_error.as_deref().unwrap_or_default();
            eprintln!("{} {msg}", "[Erro]".red().bold());
            return;
        };
        println!("{} {question}", "[Pergunta]".bold());
        println!("Processando análise...");
        match self.session.ask(client, question) {
            Ok(answer) => print_answer(&answer, false),
            Err(e) => eprintln!("\n{} {e}", "[Erro]".red().bold()),
        }
    }
}

/// Run the session loop over any line source; returns when input ends or
/// on `quit`.
pub(crate) fn run_loop(input: impl BufRead, archive: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let (client, config_error) = match GeminiClient::from_env(&settings) {
        Ok(c) => (Some(c), None),
        Err(e) => (None, Some(e.to_string())),
    };
    let mut shell = Shell {
        session: Session::new(),
        client,
        config_error,
    };
    if let Some(msg) = &shell.config_error {
        eprintln!("{} {msg}", "Warning:".yellow().bold());
    }
    if let Some(path) = archive {
        shell.load(path);
    }
    println!("Digite 'help' para ver os comandos.");

    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;
    for line in input.lines() {
        let line = line?;
        match parse_line(&line) {
            Line::Empty => {}
            Line::Load(path) => shell.load(path),
            Line::Summary => println!("{}", shell.session.summary()),
            Line::Report => match shell.session.dataset() {
                Some(ds) => report::print(ds),
                None => println!("{}", shell.session.summary()),
            },
            Line::Status => shell.status(),
            Line::Help => println!("{HELP}"),
            Line::Quit => break,
            Line::Question(q) => shell.question(q),
        }
        write!(stdout, "> ")?;
        stdout.flush()?;
    }
    println!();
    Ok(())
}

pub fn run(archive: Option<&str>) -> Result<()> {
    let stdin = std::io::stdin();
    run_loop(stdin.lock(), archive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_commands() {
        assert!(matches!(parse_line("load  /tmp/a.zip "), Line::Load("/tmp/a.zip")));
        assert!(matches!(parse_line("load"), Line::Load("")));
        assert!(matches!(parse_line(" summary"), Line::Summary));
        assert!(matches!(parse_line("quit"), Line::Quit));
        assert!(matches!(parse_line("exit"), Line::Quit));
        assert!(matches!(parse_line("   "), Line::Empty));
    }

    #[test]
    fn test_parse_line_question_keeps_whole_text() {
        match parse_line("Quais os 5 produtos mais vendidos?") {
            Line::Question(q) => assert_eq!(q, "Quais os 5 produtos mais vendidos?"),
            _ => panic!("expected a question"),
        }
        // a command word only counts as the first token
        assert!(matches!(parse_line("summary do mês"), Line::Summary));
    }
}
