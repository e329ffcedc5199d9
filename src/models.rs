use std::path::PathBuf;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer};

pub const ACCESS_KEY: &str = "CHAVE DE ACESSO";

/// Columns that must be present in the header CSV.
pub const HEADER_COLUMNS: &[&str] = &[
    ACCESS_KEY,
    "MODELO",
    "SÉRIE",
    "NÚMERO",
    "NATUREZA DA OPERAÇÃO",
    "DATA EMISSÃO",
    "EVENTO MAIS RECENTE",
    "DATA/HORA EVENTO MAIS RECENTE",
    "CPF/CNPJ Emitente",
    "RAZÃO SOCIAL EMITENTE",
    "INSCRIÇÃO ESTADUAL EMITENTE",
    "UF EMITENTE",
    "MUNICÍPIO EMITENTE",
    "CNPJ DESTINATÁRIO",
    "NOME DESTINATÁRIO",
    "UF DESTINATÁRIO",
    "INDICADOR IE DESTINATÁRIO",
    "DESTINO DA OPERAÇÃO",
    "CONSUMIDOR FINAL",
    "PRESENÇA DO COMPRADOR",
    "VALOR NOTA FISCAL",
];

/// Columns that must be present in the items CSV. Extra columns are ignored.
pub const ITEM_COLUMNS: &[&str] = &[
    ACCESS_KEY,
    "NÚMERO PRODUTO",
    "DESCRIÇÃO DO PRODUTO/SERVIÇO",
    "CÓDIGO NCM/SH",
    "NCM/SH (TIPO DE PRODUTO)",
    "CFOP",
    "QUANTIDADE",
    "UNIDADE",
    "VALOR UNITÁRIO",
    "VALOR TOTAL",
];

#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
pub struct HeaderRecord {
    #[serde(rename = "CHAVE DE ACESSO")]
    pub access_key: String,
    #[serde(rename = "MODELO")]
    pub model: String,
    #[serde(rename = "SÉRIE")]
    pub series: String,
    #[serde(rename = "NÚMERO")]
    pub number: String,
    #[serde(rename = "NATUREZA DA OPERAÇÃO")]
    pub operation_nature: String,
    #[serde(rename = "DATA EMISSÃO")]
    pub issued_at: String,
    #[serde(rename = "EVENTO MAIS RECENTE")]
    pub latest_event: String,
    #[serde(rename = "DATA/HORA EVENTO MAIS RECENTE")]
    pub latest_event_at: String,
    #[serde(rename = "CPF/CNPJ Emitente")]
    pub issuer_tax_id: String,
    #[serde(rename = "RAZÃO SOCIAL EMITENTE")]
    pub issuer_name: String,
    #[serde(rename = "INSCRIÇÃO ESTADUAL EMITENTE")]
    pub issuer_state_registration: String,
    #[serde(rename = "UF EMITENTE")]
    pub issuer_state: String,
    #[serde(rename = "MUNICÍPIO EMITENTE")]
    pub issuer_municipality: String,
    #[serde(rename = "CNPJ DESTINATÁRIO")]
    pub recipient_tax_id: String,
    #[serde(rename = "NOME DESTINATÁRIO")]
    pub recipient_name: String,
    #[serde(rename = "UF DESTINATÁRIO")]
    pub recipient_state: String,
    #[serde(rename = "INDICADOR IE DESTINATÁRIO")]
    pub recipient_taxpayer_indicator: String,
    #[serde(rename = "DESTINO DA OPERAÇÃO")]
    pub operation_destination: String,
    #[serde(rename = "CONSUMIDOR FINAL")]
    pub final_consumer: String,
    #[serde(rename = "PRESENÇA DO COMPRADOR")]
    pub buyer_presence: String,
    #[serde(rename = "VALOR NOTA FISCAL", deserialize_with = "decimal")]
    pub invoice_value: BigDecimal,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "CHAVE DE ACESSO")]
    pub access_key: String,
    #[serde(rename = "NÚMERO PRODUTO")]
    pub sequence: String,
    #[serde(rename = "DESCRIÇÃO DO PRODUTO/SERVIÇO")]
    pub description: String,
    #[serde(rename = "CÓDIGO NCM/SH")]
    pub ncm_code: String,
    #[serde(rename = "NCM/SH (TIPO DE PRODUTO)")]
    pub ncm_category: String,
    #[serde(rename = "CFOP")]
    pub cfop: String,
    #[serde(rename = "QUANTIDADE", deserialize_with = "decimal")]
    pub quantity: BigDecimal,
    #[serde(rename = "UNIDADE")]
    pub unit: String,
    #[serde(rename = "VALOR UNITÁRIO", deserialize_with = "decimal")]
    pub unit_price: BigDecimal,
    #[serde(rename = "VALOR TOTAL", deserialize_with = "decimal")]
    pub line_total: BigDecimal,
}

/// One row of the header/item left join, as indices into [`Dataset`].
///
/// Holding indices keeps the header fields identical across every row that
/// shares an access key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinedRecord {
    pub header: usize,
    pub item: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: PathBuf,
    pub checksum: String,
    pub headers: Vec<HeaderRecord>,
    pub items: Vec<ItemRecord>,
    pub joined: Vec<JoinedRecord>,
}

impl Dataset {
    pub fn rows(&self) -> impl Iterator<Item = (&HeaderRecord, Option<&ItemRecord>)> + '_ {
        self.joined
            .iter()
            .map(|j| (&self.headers[j.header], j.item.map(|i| &self.items[i])))
    }
}

/// Parse a monetary or quantity value. Accepts `1234.56`, `1234,56`,
/// `1,234.56` and `1.234,56`.
pub fn parse_decimal(raw: &str) -> Option<BigDecimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let normalized = match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', "."),
        _ => s.to_string(),
    };
    BigDecimal::from_str(&normalized).ok()
}

fn decimal<'de, D>(deserializer: D) -> std::result::Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_decimal(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal value '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_decimal_formats() {
        assert_eq!(parse_decimal("1234.56"), Some(dec("1234.56")));
        assert_eq!(parse_decimal("1234,56"), Some(dec("1234.56")));
        assert_eq!(parse_decimal("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_decimal("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_decimal("  -42.50 "), Some(dec("-42.5")));
        assert_eq!(parse_decimal("7"), Some(dec("7")));
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("   "), None);
        assert_eq!(parse_decimal("abc"), None);
    }
}
