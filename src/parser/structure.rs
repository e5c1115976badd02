// file: src/parser/structure.rs
// description: font-statistics driven segmentation of a layout into sections
// reference: two-pass heading detection (body-size inference, then segmentation)

use crate::config::{StructureConfig, StyleSampling};
use crate::models::DocumentSection;
use crate::parser::layout::{DocumentLayout, TextBlock};
use std::collections::HashMap;
use tracing::debug;

/// Representative style of a block, sampled from one of its spans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub font_size: f32,
    pub bold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Body,
    H1,
    H2,
}

impl BlockKind {
    pub fn is_heading(self) -> bool {
        !matches!(self, Self::Body)
    }
}

#[derive(Debug, Clone)]
pub struct DocumentStructure {
    pub body_size: f32,
    pub sections: Vec<DocumentSection>,
}

/// Most frequent rounded span size; ties go to the size seen first.
///
/// Rounding is half-to-even, so 10.5 counts as 10 and 11.5 as 12.
pub fn infer_body_size(layout: &DocumentLayout, default_size: f32) -> f32 {
    let mut positions: HashMap<i64, usize> = HashMap::new();
    let mut counts: Vec<(i64, usize)> = Vec::new();

    for span in layout.spans() {
        if !span.font_size.is_finite() {
            continue;
        }
        let rounded = span.font_size.round_ties_even() as i64;
        match positions.get(&rounded) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(rounded, counts.len());
                counts.push((rounded, 1));
            }
        }
    }

    let mut best: Option<(i64, usize)> = None;
    for &(size, count) in &counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((size, count));
        }
    }

    best.map_or(default_size, |(size, _)| size as f32)
}

impl StyleSampling {
    pub fn sample(self, block: &TextBlock) -> Option<BlockStyle> {
        match self {
            Self::FirstSpan => block.spans().next().map(|span| BlockStyle {
                font_size: span.font_size,
                bold: span.bold,
            }),
            Self::Majority => majority_style(block),
        }
    }
}

fn majority_style(block: &TextBlock) -> Option<BlockStyle> {
    let mut weights: Vec<(BlockStyle, usize)> = Vec::new();

    for span in block.spans() {
        let weight = span.text.trim().chars().count();
        let style = BlockStyle {
            font_size: span.font_size,
            bold: span.bold,
        };
        match weights.iter_mut().find(|(seen, _)| *seen == style) {
            Some((_, total)) => *total += weight,
            None => weights.push((style, weight)),
        }
    }

    let mut best: Option<(BlockStyle, usize)> = None;
    for (style, weight) in weights {
        if best.is_none_or(|(_, best_weight)| weight > best_weight) {
            best = Some((style, weight));
        }
    }
    best.map(|(style, _)| style)
}

/// Size-relative heading thresholds for one document.
#[derive(Debug, Clone, Copy)]
pub struct HeadingClassifier {
    body_size: f32,
    h1_multiplier: f32,
    h2_multiplier: f32,
}

impl HeadingClassifier {
    pub fn new(body_size: f32, h1_multiplier: f32, h2_multiplier: f32) -> Self {
        Self {
            body_size,
            h1_multiplier,
            h2_multiplier,
        }
    }

    pub fn from_config(body_size: f32, config: &StructureConfig) -> Self {
        Self::new(
            body_size,
            config.h1_size_multiplier,
            config.h2_size_multiplier,
        )
    }

    pub fn classify(&self, style: BlockStyle) -> BlockKind {
        if !style.bold {
            return BlockKind::Body;
        }

        let h1_floor = self.body_size * self.h1_multiplier;
        let h2_floor = self.body_size * self.h2_multiplier;

        if style.font_size > h1_floor {
            BlockKind::H1
        } else if style.font_size > h2_floor {
            BlockKind::H2
        } else {
            BlockKind::Body
        }
    }
}

pub struct DocumentStructureParser {
    config: StructureConfig,
}

impl DocumentStructureParser {
    pub fn new(config: StructureConfig) -> Self {
        Self { config }
    }

    pub fn parse(&self, layout: &DocumentLayout) -> Vec<DocumentSection> {
        self.analyze(layout).sections
    }

    pub fn analyze(&self, layout: &DocumentLayout) -> DocumentStructure {
        let body_size = infer_body_size(layout, self.config.default_body_size);
        let sections = self.segment(layout, body_size);

        debug!(
            "{}: body size {} -> {} section(s)",
            layout.name,
            body_size,
            sections.len()
        );

        DocumentStructure {
            body_size,
            sections,
        }
    }

    /// Second pass: walk blocks in reading order and cut sections at headings.
    ///
    /// Sections with no body text (a heading directly followed by another
    /// heading) are dropped.
    pub fn segment(&self, layout: &DocumentLayout, body_size: f32) -> Vec<DocumentSection> {
        let classifier = HeadingClassifier::from_config(body_size, &self.config);
        let mut sections = Vec::new();
        let mut current = DocumentSection::introduction(&layout.name);

        for page in &layout.pages {
            for block in &page.blocks {
                let Some(style) = self.config.style_sampling.sample(block) else {
                    continue;
                };

                let text = block.text();
                if text.is_empty() {
                    continue;
                }

                if classifier.classify(style).is_heading() {
                    let next = DocumentSection::new(text, page.number, &layout.name);
                    let finished = std::mem::replace(&mut current, next);
                    if finished.has_content() {
                        sections.push(finished);
                    } else {
                        debug!("Dropping empty section '{}'", finished.title);
                    }
                } else {
                    current.push_line(text);
                }
            }
        }

        if current.has_content() {
            sections.push(current);
        }

        sections
    }
}
