use crate::text;

/// One concept of the tender vocabulary and the surface forms it expands to.
/// Entries are stored folded (lowercase, accents stripped).
pub struct SynonymEntry {
	pub concept: &'static str,
	pub synonyms: &'static [&'static str],
}

pub const SYNONYMS: &[SynonymEntry] = &[
	SynonymEntry {
		concept: "modalidade",
		synonyms: &["pregao", "concorrencia", "tomada de precos", "convite", "leilao"],
	},
	SynonymEntry {
		concept: "prazo",
		synonyms: &["data limite", "vencimento", "cronograma", "vigencia"],
	},
	SynonymEntry {
		concept: "valor",
		synonyms: &["preco", "orcamento estimado", "montante", "custo"],
	},
	SynonymEntry {
		concept: "garantia",
		synonyms: &["caucao", "seguro-garantia", "fianca bancaria"],
	},
	SynonymEntry {
		concept: "habilitacao",
		synonyms: &["qualificacao", "regularidade fiscal", "capacidade tecnica"],
	},
	SynonymEntry {
		concept: "tecnica",
		synonyms: &["especificacao", "termo de referencia", "projeto basico"],
	},
	SynonymEntry {
		concept: "execucao",
		synonyms: &["fornecimento", "prestacao dos servicos", "ordem de servico"],
	},
	SynonymEntry {
		concept: "contrato",
		synonyms: &["instrumento contratual", "termo de contrato", "ata de registro"],
	},
	SynonymEntry {
		concept: "impugnacao",
		synonyms: &["esclarecimento", "questionamento", "pedido de esclarecimento"],
	},
	SynonymEntry {
		concept: "abertura",
		synonyms: &["sessao publica", "credenciamento", "recebimento das propostas"],
	},
	SynonymEntry {
		concept: "penalidade",
		synonyms: &["sancao", "multa", "advertencia"],
	},
	SynonymEntry {
		concept: "recurso",
		synonyms: &["contrarrazoes", "intencao de recurso", "prazo recursal"],
	},
	SynonymEntry {
		concept: "objeto",
		synonyms: &["finalidade", "escopo", "descricao do objeto"],
	},
	SynonymEntry {
		concept: "pagamento",
		synonyms: &["nota fiscal", "empenho", "faturamento"],
	},
	SynonymEntry {
		concept: "documentacao",
		synonyms: &["certidao", "declaracao", "atestado", "comprovante"],
	},
];

/// Entries triggered by a folded query: the query mentions the concept or any
/// of its synonyms.
pub fn matching_entries(folded_query: &str) -> Vec<&'static SynonymEntry> {
	SYNONYMS
		.iter()
		.filter(|entry| {
			folded_query.contains(entry.concept)
				|| entry.synonyms.iter().any(|synonym| folded_query.contains(synonym))
		})
		.collect()
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryTopic {
	Value,
	Deadline,
	Participation,
}

const VALUE_TRIGGERS: &[&str] = &["valor", "preco", "custo", "orcamento", "estimado"];
const DEADLINE_TRIGGERS: &[&str] = &["prazo", "vencimento", "entrega", "cronograma"];
const PARTICIPATION_TRIGGERS: &[&str] = &["particip", "habilita", "qualifica", "credenciamento"];

/// First matching class wins; queries touching several classes keep the
/// listed precedence.
pub fn infer_topic(folded_query: &str) -> Option<QueryTopic> {
	if VALUE_TRIGGERS.iter().any(|trigger| folded_query.contains(trigger)) {
		return Some(QueryTopic::Value);
	}
	if DEADLINE_TRIGGERS.iter().any(|trigger| folded_query.contains(trigger)) {
		return Some(QueryTopic::Deadline);
	}
	if PARTICIPATION_TRIGGERS.iter().any(|trigger| folded_query.contains(trigger)) {
		return Some(QueryTopic::Participation);
	}

	None
}

pub fn topic_matches_path(topic: QueryTopic, folded_path: &str) -> bool {
	let needles: &[&str] = match topic {
		QueryTopic::Value => &["valor", "preco"],
		QueryTopic::Deadline => &["prazo", "entrega", "vigencia"],
		QueryTopic::Participation => &["participacao", "habilitacao", "credenciamento"],
	};

	needles.iter().any(|needle| folded_path.contains(needle))
}
