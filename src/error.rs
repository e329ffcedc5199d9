use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("cannot open archive: {0}")]
    Open(#[source] std::io::Error),

    #[error("missing member '{0}' in archive")]
    MissingMember(String),

    #[error("cannot read archive: {0}")]
    Corrupt(#[from] zip::result::ZipError),
}

#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Parse error in {member}: {detail}")]
    Parse { member: String, detail: String },

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Não foi possível processar a pergunta: {0}")]
    Unanswerable(String),

    #[error("Structured answer error: {0}")]
    StructuredAnswer(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalystError {
    pub fn parse(member: &str, detail: impl Into<String>) -> Self {
        Self::Parse {
            member: member.to_string(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalystError>;
