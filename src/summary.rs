use std::collections::HashMap;

use bigdecimal::BigDecimal;

use crate::fmt::{cents, freq_dict, money};
use crate::models::Dataset;

pub const NO_DATA: &str = "Nenhum dado carregado";

pub const SCHEMA_DESCRIPTION: &str = "\
## Estrutura dos Dados de Notas Fiscais:

### Arquivo de Cabeçalho (202401_NFs_Cabecalho.csv):
- CHAVE DE ACESSO: Identificador único da NF-e
- MODELO: Modelo do documento fiscal (ex: 55 - NF-e)
- SÉRIE: Série da nota fiscal
- NÚMERO: Número da nota fiscal
- NATUREZA DA OPERAÇÃO: Descrição da operação (Venda, Devolução, etc.)
- DATA EMISSÃO: Data e hora de emissão da nota
- EVENTO MAIS RECENTE: Último evento ocorrido com a NF-e
- DATA/HORA EVENTO MAIS RECENTE: Quando ocorreu o último evento
- CPF/CNPJ Emitente: Documento do emissor
- RAZÃO SOCIAL EMITENTE: Nome da empresa emissora
- INSCRIÇÃO ESTADUAL EMITENTE: IE do emissor
- UF EMITENTE: Estado do emissor
- MUNICÍPIO EMITENTE: Cidade do emissor
- CNPJ DESTINATÁRIO: Documento do destinatário
- NOME DESTINATÁRIO: Razão social do destinatário
- UF DESTINATÁRIO: Estado do destinatário
- INDICADOR IE DESTINATÁRIO: Se destinatário é contribuinte
- DESTINO DA OPERAÇÃO: 1-Interna, 2-Interestadual
- CONSUMIDOR FINAL: 0-Não, 1-Sim
- PRESENÇA DO COMPRADOR: 0-Não se aplica, 1-Presencial, etc.
- VALOR NOTA FISCAL: Valor total da nota

### Arquivo de Itens (202401_NFs_Itens.csv):
- NÚMERO PRODUTO: Número sequencial do item
- DESCRIÇÃO DO PRODUTO/SERVIÇO: Nome detalhado do produto
- CÓDIGO NCM/SH: Código da Nomenclatura Comum do Mercosul
- NCM/SH (TIPO DE PRODUTO): Descrição do tipo de produto
- CFOP: Código Fiscal de Operações e Prestações
- QUANTIDADE: Quantidade do item
- UNIDADE: Unidade de medida (UN, KG, L, etc.)
- VALOR UNITÁRIO: Preço unitário do item
- VALOR TOTAL: Valor total do item (quantidade × unitário)
";

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ValueStats {
    pub total: BigDecimal,
    pub mean: Option<BigDecimal>,
    pub max: Option<BigDecimal>,
    pub min: Option<BigDecimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub invoice_count: usize,
    pub item_count: usize,
    pub joined_count: usize,
    pub headers_without_items: usize,
    pub invoice_value: ValueStats,
    pub top_recipients: Vec<(String, usize)>,
    pub top_products: Vec<(String, usize)>,
    pub top_operations: Vec<(String, usize)>,
    pub issuer_states: Vec<(String, usize)>,
    pub recipient_states: Vec<(String, usize)>,
}

/// Count occurrences, most frequent first. Equal counts are ordered by value
/// so the result does not depend on row order. Values are counted as read;
/// empty ones are skipped.
pub fn value_counts<'a>(values: impl Iterator<Item = &'a str>, limit: Option<usize>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values.filter(|v| !v.is_empty()) {
        *counts.entry(v).or_default() += 1;
    }
    let mut entries: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(v, c)| (v.to_string(), c))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

pub fn value_stats<'a>(values: impl Iterator<Item = &'a BigDecimal>) -> ValueStats {
    let mut total = BigDecimal::from(0);
    let mut count = 0i64;
    let mut max: Option<&BigDecimal> = None;
    let mut min: Option<&BigDecimal> = None;
    for v in values {
        total = total + v;
        count += 1;
        if max.map_or(true, |m| v > m) {
            max = Some(v);
        }
        if min.map_or(true, |m| v < m) {
            min = Some(v);
        }
    }
    let mean = (count > 0).then(|| cents(&(&total / BigDecimal::from(count))));
    ValueStats {
        total,
        mean,
        max: max.cloned(),
        min: min.cloned(),
    }
}

pub fn compute(ds: &Dataset) -> Statistics {
    let headers = &ds.headers;
    Statistics {
        invoice_count: headers.len(),
        item_count: ds.items.len(),
        joined_count: ds.joined.len(),
        headers_without_items: ds.rows().filter(|(_, item)| item.is_none()).count(),
        invoice_value: value_stats(headers.iter().map(|h| &h.invoice_value)),
        top_recipients: value_counts(headers.iter().map(|h| h.recipient_name.as_str()), Some(3)),
        top_products: value_counts(ds.items.iter().map(|i| i.description.as_str()), Some(5)),
        top_operations: value_counts(headers.iter().map(|h| h.operation_nature.as_str()), Some(5)),
        issuer_states: value_counts(headers.iter().map(|h| h.issuer_state.as_str()), None),
        recipient_states: value_counts(headers.iter().map(|h| h.recipient_state.as_str()), None),
    }
}

// ---------------------------------------------------------------------------
// Report text
// ---------------------------------------------------------------------------

fn money_opt(val: &Option<BigDecimal>) -> String {
    val.as_ref().map(money).unwrap_or_else(|| "R$ -".to_string())
}

pub fn render(stats: &Statistics) -> String {
    let v = &stats.invoice_value;
    format!(
        "\n## Estatísticas dos Dados:\n\
         - Total de notas: {}\n\
         - Total de itens: {}\n\
         - Valor total: {}\n\
         - Média por nota: {}\n\
         - Maior nota: {}\n\
         - Menor nota: {}\n\
         - Principais destinatários: {}\n\
         - Principais produtos: {}\n\
         - Tipos de operação mais comuns: {}\n\
         - Distribuição por UF emitente: {}\n\
         - Distribuição por UF destinatário: {}\n",
        stats.invoice_count,
        stats.item_count,
        money(&v.total),
        money_opt(&v.mean),
        money_opt(&v.max),
        money_opt(&v.min),
        freq_dict(&stats.top_recipients),
        freq_dict(&stats.top_products),
        freq_dict(&stats.top_operations),
        freq_dict(&stats.issuer_states),
        freq_dict(&stats.recipient_states),
    )
}

/// Full report for the prompt: schema narrative followed by statistics.
/// Returns [`NO_DATA`] when nothing has been loaded.
pub fn summarize(ds: Option<&Dataset>) -> String {
    match ds {
        None => NO_DATA.to_string(),
        Some(ds) => format!("{SCHEMA_DESCRIPTION}{}", render(&compute(ds))),
    }
}
