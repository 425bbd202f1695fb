use regex::Regex;

use edital_config::Chunking;
use edital_domain::{SectionType, text};

pub(crate) const ROOT: usize = 0;

/// Intermediate parse node. Sections live in a flat arena indexed by `id`;
/// `parent` is an index into the same arena, never an owning reference.
#[derive(Clone, Debug)]
pub struct Section {
	pub id: usize,
	pub title: String,
	pub content: String,
	pub depth: u32,
	pub parent: Option<usize>,
	pub path: String,
	pub criticality: f32,
	pub section_type: SectionType,
	pub start_pos: usize,
	pub end_pos: usize,
}

#[derive(Debug)]
pub struct Outline {
	pub sections: Vec<Section>,
}
impl Outline {
	pub fn has_headings(&self) -> bool {
		self.sections.len() > 1
	}
}

struct HeadingPatterns {
	subitem: Regex,
	item: Regex,
	title: Regex,
}

fn heading_patterns() -> Option<HeadingPatterns> {
	Some(HeadingPatterns {
		subitem: Regex::new(r"^\s*(\d+(?:\.\d+){2,})\.?\s*[-–—]?\s*(\S.*)$").ok()?,
		item: Regex::new(r"^\s*(\d+\.\d+)\.?\s*[-–—]?\s*(\S.*)$").ok()?,
		title: Regex::new(r"^\s*(\d+)\s*(?:[.)]|[-–—])\s*(\S.*)$").ok()?,
	})
}

struct Heading<'a> {
	title: &'a str,
	depth: u32,
	section_type: SectionType,
}

/// Most-specific class wins: subitem (`N.N.N`, any deeper) > item (`N.N`) >
/// title (numbered upper-case line). Numbered lines with lowercase text are
/// not headings.
fn classify_line<'a>(patterns: &HeadingPatterns, line: &'a str) -> Option<Heading<'a>> {
	if let Some(captures) = patterns.subitem.captures(line) {
		let number = captures.get(1)?.as_str();
		let title = heading_title(captures.get(2)?.as_str());

		return Some(Heading {
			title,
			depth: number.matches('.').count() as u32,
			section_type: SectionType::Subitem,
		});
	}
	if let Some(captures) = patterns.item.captures(line) {
		let title = heading_title(captures.get(2)?.as_str());

		return Some(Heading { title, depth: 1, section_type: SectionType::Item });
	}
	if let Some(captures) = patterns.title.captures(line) {
		let title = heading_title(captures.get(2)?.as_str());

		if is_upper_heading(title) {
			return Some(Heading { title, depth: 0, section_type: SectionType::Title });
		}
	}

	None
}

fn heading_title(raw: &str) -> &str {
	raw.trim().trim_end_matches('.').trim_end()
}

fn is_upper_heading(title: &str) -> bool {
	let mut has_letter = false;

	for ch in title.chars() {
		if ch.is_alphabetic() {
			has_letter = true;

			if ch.is_lowercase() {
				return false;
			}
		}
	}

	has_letter
}

pub fn parse_outline(raw: &str, cfg: &Chunking) -> Outline {
	let mut sections = vec![Section {
		id: ROOT,
		title: String::new(),
		content: String::new(),
		depth: 0,
		parent: None,
		path: String::new(),
		criticality: 0.0,
		section_type: SectionType::Prose,
		start_pos: 0,
		end_pos: 0,
	}];
	let Some(patterns) = heading_patterns() else {
		sections[ROOT].content = raw.to_string();
		sections[ROOT].end_pos = raw.len();

		return Outline { sections };
	};
	let mut stack: Vec<usize> = Vec::new();
	let mut offset = 0_usize;

	for raw_line in raw.split_inclusive('\n') {
		let line_start = offset;

		offset += raw_line.len();

		let line = raw_line.trim_end_matches(['\r', '\n']);

		if let Some(heading) = classify_line(&patterns, line) {
			while let Some(&top) = stack.last() {
				if sections[top].depth >= heading.depth {
					stack.pop();
				} else {
					break;
				}
			}

			let parent = stack.last().copied().unwrap_or(ROOT);
			let lowered = heading.title.to_lowercase();
			let path = if parent == ROOT {
				lowered
			} else {
				format!("{}.{lowered}", sections[parent].path)
			};
			let id = sections.len();

			sections.push(Section {
				id,
				title: heading.title.to_string(),
				content: String::new(),
				depth: heading.depth,
				parent: Some(parent),
				path,
				criticality: 0.0,
				section_type: heading.section_type,
				start_pos: line_start,
				end_pos: offset,
			});
			stack.push(id);
		} else {
			let target = stack.last().copied().unwrap_or(ROOT);
			let section = &mut sections[target];

			section.content.push_str(raw_line);
			section.end_pos = offset;
		}
	}

	assign_criticality(&mut sections, cfg);

	Outline { sections }
}

fn assign_criticality(sections: &mut [Section], cfg: &Chunking) {
	for section in sections.iter_mut() {
		let type_weight = match section.section_type {
			SectionType::Title => cfg.type_weights.title,
			SectionType::Item => cfg.type_weights.item,
			SectionType::Subitem => cfg.type_weights.subitem,
			SectionType::Prose => cfg.type_weights.prose,
		};
		let folded_path = text::fold(&section.path);
		let mut keyword_weight = 0.0_f32;

		for keyword in &cfg.keywords {
			if folded_path.contains(&text::fold(&keyword.contains)) {
				keyword_weight = keyword_weight.max(keyword.weight);
			}
		}

		section.criticality = (type_weight + keyword_weight).clamp(0.0, 1.0);
	}
}
