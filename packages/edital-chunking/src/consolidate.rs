use unicode_segmentation::UnicodeSegmentation;

use edital_domain::SectionType;

use crate::outline::Outline;

/// A chunk candidate before ids and document metadata are attached.
#[derive(Clone, Debug)]
pub struct ProtoChunk {
	pub text: String,
	pub hierarchy_path: String,
	pub depth: u32,
	pub criticality: f32,
	pub section_type: SectionType,
	pub parent: Option<usize>,
	pub section_count: u32,
}

/// Arena order equals document order, so a plain iteration over the section
/// table is already the depth-first flattening.
pub fn flatten(outline: &Outline, raw: &str) -> Vec<ProtoChunk> {
	let mut protos = Vec::with_capacity(outline.sections.len());

	for section in &outline.sections {
		let text = raw[section.start_pos..section.end_pos].trim();

		if text.is_empty() {
			continue;
		}

		protos.push(ProtoChunk {
			text: text.to_string(),
			hierarchy_path: section.path.clone(),
			depth: section.depth,
			criticality: section.criticality,
			section_type: section.section_type,
			parent: section.parent,
			section_count: 1,
		});
	}

	protos
}

/// Greedy forward merge. The accumulator absorbs the next fragment only while
/// all three hold: same parent section, accumulator still under `min_chars`,
/// and the merged text stays within `max_chars`. A trailing fragment with no
/// same-parent successor is kept even when it stays under the minimum.
pub fn consolidate(protos: Vec<ProtoChunk>, min_chars: usize, max_chars: usize) -> Vec<ProtoChunk> {
	let mut merged: Vec<ProtoChunk> = Vec::with_capacity(protos.len());

	for proto in protos {
		if let Some(last) = merged.last_mut() {
			let last_chars = last.text.chars().count();
			let proto_chars = proto.text.chars().count();

			if last.parent == proto.parent
				&& last_chars < min_chars
				&& last_chars + proto_chars + 2 <= max_chars
			{
				last.text.push_str("\n\n");
				last.text.push_str(&proto.text);
				last.criticality = last.criticality.max(proto.criticality);
				last.section_count += proto.section_count;

				continue;
			}
		}

		merged.push(proto);
	}

	merged.into_iter().flat_map(|proto| split_oversized(proto, max_chars)).collect()
}

/// Splits a single proto that outgrew `max_chars` on sentence boundaries,
/// falling back to a hard character split for sentences that alone exceed the
/// limit. Every piece keeps the proto's section metadata.
fn split_oversized(proto: ProtoChunk, max_chars: usize) -> Vec<ProtoChunk> {
	if proto.text.chars().count() <= max_chars {
		return vec![proto];
	}

	let mut pieces = Vec::new();
	let mut current = String::new();
	let mut current_chars = 0_usize;

	for sentence in proto.text.split_sentence_bounds() {
		let sentence_chars = sentence.chars().count();

		if current_chars > 0 && current_chars + sentence_chars > max_chars {
			pieces.push(std::mem::take(&mut current));
			current_chars = 0;
		}
		if sentence_chars > max_chars {
			for ch in sentence.chars() {
				if current_chars == max_chars {
					pieces.push(std::mem::take(&mut current));
					current_chars = 0;
				}

				current.push(ch);
				current_chars += 1;
			}
		} else {
			current.push_str(sentence);
			current_chars += sentence_chars;
		}
	}

	if !current.is_empty() {
		pieces.push(current);
	}

	pieces
		.into_iter()
		.filter_map(|piece| {
			let text = piece.trim();

			if text.is_empty() {
				return None;
			}

			Some(ProtoChunk {
				text: text.to_string(),
				hierarchy_path: proto.hierarchy_path.clone(),
				depth: proto.depth,
				criticality: proto.criticality,
				section_type: proto.section_type,
				parent: proto.parent,
				section_count: proto.section_count,
			})
		})
		.collect()
}
