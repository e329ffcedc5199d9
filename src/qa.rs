use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AnalystError, Result};

/// A text completion backend. Implementations fail with
/// [`AnalystError::Remote`] when the call itself goes wrong.
pub trait CompletionService {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Structured block the prompt asks the model to include in its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    pub topic: String,
    pub summary: String,
    pub sources: Vec<String>,
    pub tools_used: Vec<String>,
    pub analysis: String,
}

const FORMAT_INSTRUCTIONS: &str = r#"The output should be formatted as a JSON instance that conforms to the JSON schema below.

As an example, for the schema {"properties": {"foo": {"title": "Foo", "description": "a list of strings", "type": "array", "items": {"type": "string"}}}, "required": ["foo"]}
the object {"foo": ["bar", "baz"]} is a well-formatted instance of the schema. The object {"properties": {"foo": ["bar", "baz"]}} is not well-formatted.

Here is the output schema:
```
{"properties": {"topic": {"title": "Topic", "type": "string"}, "summary": {"title": "Summary", "type": "string"}, "sources": {"items": {"type": "string"}, "title": "Sources", "type": "array"}, "tools_used": {"items": {"type": "string"}, "title": "Tools Used", "type": "array"}, "analysis": {"title": "Analysis", "type": "string"}}, "required": ["topic", "summary", "sources", "tools_used", "analysis"]}
```"#;

pub fn build_prompt(data_summary: &str, question: &str) -> String {
    format!(
        "Você é um analista especializado em dados fiscais e notas fiscais eletrônicas (NF-e).

Contexto sobre os dados:
{data_summary}

Instruções para análise:
1. Responda com precisão baseando-se exclusivamente nos dados fornecidos
2. Para cálculos, mostre o raciocínio passo a passo
3. Ao mencionar valores monetários, formate como R$ 1.234,56
4. Para operações interestaduais, considere o CFOP e UF de origem/destino
5. Para produtos, utilize a descrição e NCM quando relevante
6. wrap the output and provide no other text
 {FORMAT_INSTRUCTIONS}

Pergunta: {question}

Responda de forma estruturada:
1. Análise solicitada
2. Metodologia utilizada
3. Resultados encontrados
4. Observações relevantes
"
    )
}

/// Send the question with the data summary. Remote failures come back as
/// [`AnalystError::Unanswerable`] carrying the remote message unchanged.
pub fn ask(service: &dyn CompletionService, data_summary: &str, question: &str) -> Result<String> {
    let prompt = build_prompt(data_summary, question);
    info!(prompt_chars = prompt.len(), "sending question");
    service.complete(&prompt).map_err(|e| {
        warn!("completion failed: {e}");
        match e {
            AnalystError::Remote(msg) => AnalystError::Unanswerable(msg),
            other => AnalystError::Unanswerable(other.to_string()),
        }
    })
}

static JSON_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid JSON fence regex")
});

/// Pull the structured block out of a free-text answer. Accepts a fenced
/// ```json block or the outermost bare `{...}`.
pub fn parse_structured(answer: &str) -> Result<StructuredAnswer> {
    let fenced = JSON_FENCE_RE.captures(answer).and_then(|c| c.get(1));
    let candidate = match fenced {
        Some(m) => m.as_str(),
        None => {
            let start = answer.find('{');
            let end = answer.rfind('}');
            match (start, end) {
                (Some(s), Some(e)) if s < e => &answer[s..=e],
                _ => {
                    return Err(AnalystError::StructuredAnswer(
                        "no JSON object in answer".to_string(),
                    ))
                }
            }
        }
    };
    serde_json::from_str(candidate).map_err(|e| AnalystError::StructuredAnswer(e.to_string()))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;

    use super::*;

    /// Deterministic stand-in that records prompts and replays a canned reply.
    pub struct Canned {
        pub reply: std::result::Result<String, String>,
        pub prompts: RefCell<Vec<String>>,
    }

    impl Canned {
        pub fn answering(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }

        pub fn failing(msg: &str) -> Self {
            Self {
                reply: Err(msg.to_string()),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl CompletionService for Canned {
        fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.reply.clone().map_err(AnalystError::Remote)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::Canned;
    use super::*;

    #[test]
    fn test_prompt_embeds_summary_and_question() {
        let prompt = build_prompt("RESUMO-XYZ", "Qual o maior valor?");
        assert!(prompt.contains("Contexto sobre os dados:\nRESUMO-XYZ\n"));
        assert!(prompt.contains("Pergunta: Qual o maior valor?"));
        assert!(prompt.contains("\"tools_used\""));
        assert!(prompt.contains("the object {\"foo\": [\"bar\", \"baz\"]} is a well-formatted instance"));
        assert!(prompt.contains("is not well-formatted.\n\nHere is the output schema:"));
        assert!(prompt.contains("4. Observações relevantes"));
    }

    #[test]
    fn test_ask_returns_raw_text() {
        let svc = Canned::answering("resposta bruta");
        let answer = ask(&svc, "resumo", "pergunta?").unwrap();
        assert_eq!(answer, "resposta bruta");
        let prompts = svc.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("resumo"));
    }

    #[test]
    fn test_remote_error_is_surfaced_verbatim() {
        let svc = Canned::failing("429 quota exceeded");
        let err = ask(&svc, "resumo", "pergunta?").unwrap_err();
        match err {
            AnalystError::Unanswerable(msg) => assert_eq!(msg, "429 quota exceeded"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_structured_fenced() {
        let answer = "Segue:\n```json\n{\"topic\": \"t\", \"summary\": \"s\", \"sources\": [\"a\"], \"tools_used\": [], \"analysis\": \"x\"}\n```\nfim";
        let parsed = parse_structured(answer).unwrap();
        assert_eq!(parsed.topic, "t");
        assert_eq!(parsed.sources, vec!["a"]);
    }

    #[test]
    fn test_parse_structured_bare() {
        let answer = "{\"topic\": \"t\", \"summary\": \"s\", \"sources\": [], \"tools_used\": [\"calc\"], \"analysis\": \"x\"}";
        let parsed = parse_structured(answer).unwrap();
        assert_eq!(parsed.tools_used, vec!["calc"]);
    }

    #[test]
    fn test_parse_structured_failure_is_recoverable() {
        let err = parse_structured("apenas texto livre").unwrap_err();
        assert!(matches!(err, AnalystError::StructuredAnswer(_)));
        let err = parse_structured("{\"topic\": 1}").unwrap_err();
        assert!(matches!(err, AnalystError::StructuredAnswer(_)));
    }
}
