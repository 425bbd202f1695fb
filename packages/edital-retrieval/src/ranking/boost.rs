use edital_config::RankingBoost;
use edital_domain::{
	Chunk, SectionType,
	lexicon::{self, QueryTopic},
	text,
};

/// Additive position/type/topic bonus, independent of textual similarity.
/// Components: a criticality curve, a depth bonus, a section type bonus, the
/// first matching path rule, and a query topic match. The sum is clamped to
/// `[0, cap]`.
pub fn structural_boost(chunk: &Chunk, topic: Option<QueryTopic>, cfg: &RankingBoost) -> f32 {
	let folded_path = text::fold(&chunk.hierarchy_path);
	let mut boost = criticality_component(chunk.criticality, cfg)
		+ depth_component(chunk.depth, cfg)
		+ type_component(chunk.section_type, cfg);

	// Table order decides, not position in the path: only the first rule
	// whose keyword occurs anywhere in the path adds its bonus.
	if let Some(rule) =
		cfg.path_rules.iter().find(|rule| folded_path.contains(&text::fold(&rule.contains)))
	{
		boost += rule.bonus;
	}
	if let Some(topic) = topic
		&& lexicon::topic_matches_path(topic, &folded_path)
	{
		boost += cfg.topic_bonus;
	}

	boost.clamp(0.0, cfg.cap)
}

/// Piecewise linear in criticality, steeper above the knee.
pub fn criticality_component(criticality: f32, cfg: &RankingBoost) -> f32 {
	let criticality = criticality.clamp(0.0, 1.0);

	if criticality <= cfg.criticality_knee {
		criticality * cfg.criticality_lower_slope
	} else {
		cfg.criticality_knee * cfg.criticality_lower_slope
			+ (criticality - cfg.criticality_knee) * cfg.criticality_upper_slope
	}
}

pub fn depth_component(depth: u32, cfg: &RankingBoost) -> f32 {
	match depth {
		0 => cfg.depth_zero,
		1 => cfg.depth_one,
		_ => (cfg.deep_base - depth as f32 * cfg.deep_step).max(cfg.deep_floor),
	}
}

pub fn type_component(section_type: SectionType, cfg: &RankingBoost) -> f32 {
	match section_type {
		SectionType::Title => cfg.type_bonus.title,
		SectionType::Item => cfg.type_bonus.item,
		SectionType::Subitem => cfg.type_bonus.subitem,
		SectionType::Prose => cfg.type_bonus.prose,
	}
}
