//! Builds the outline tree from validated headings.

use crate::model::{FontSummary, LeveledHeading, Outline, OutlineEntry, OutlineNode};

/// Turns leveled headings into a nested [`Outline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineAssembler;

impl OutlineAssembler {
    /// Create an assembler.
    pub fn new() -> Self {
        Self
    }

    /// Assemble the title and the validated headings, in reading order.
    pub fn assemble(&self, title: Option<&LeveledHeading<'_>>, headings: &[LeveledHeading<'_>]) -> Outline {
        let mut outline = Outline::new();
        outline.title = title.map(|t| node_for(t, 0));
        for heading in headings {
            insert(&mut outline.nodes, node_for(heading, heading.level()));
        }
        outline
    }

    /// Rebuild a tree from flat entries, e.g. a previously emitted outline.
    pub fn from_entries(&self, title: Option<&OutlineEntry>, entries: &[OutlineEntry]) -> Outline {
        let mut outline = Outline::new();
        outline.title = title.map(node_from_entry);
        for entry in entries {
            insert(&mut outline.nodes, node_from_entry(entry));
        }
        outline
    }
}

/// Descend into the last node while it is shallower than the new node.
fn insert(nodes: &mut Vec<OutlineNode>, node: OutlineNode) {
    match nodes.last_mut() {
        Some(last) if last.level < node.level => insert(&mut last.children, node),
        _ => nodes.push(node),
    }
}

fn node_for(heading: &LeveledHeading<'_>, level: u8) -> OutlineNode {
    let fragment = heading.fragment();
    let mut node = OutlineNode::new(level, heading.text(), fragment.page, round3(heading.confidence));
    node.font = Some(FontSummary {
        size: fragment.font.size,
        family: fragment.font.family.clone(),
    });
    node
}

fn node_from_entry(entry: &OutlineEntry) -> OutlineNode {
    let mut node = OutlineNode::new(entry.level, entry.title.clone(), entry.page, entry.confidence);
    node.font = entry.font.clone();
    node
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BoundingBox, ComponentScores, FontDescriptor, HeadingRole, ScoredCandidate, TextFragment,
    };

    fn fragment(text: &str, page: u32) -> TextFragment {
        TextFragment::new(
            text,
            page,
            BoundingBox::new(72.0, 100.0, 200.0, 14.0),
            FontDescriptor::new("Helvetica-Bold", 14.0),
        )
    }

    fn heading(fragment: &TextFragment, role: HeadingRole) -> LeveledHeading<'_> {
        LeveledHeading::new(
            ScoredCandidate {
                fragment,
                scores: ComponentScores::default(),
                confidence: 0.7654,
                centered: false,
            },
            role,
        )
    }

    #[test]
    fn test_assemble_nests_by_level() {
        let fragments = vec![
            fragment("Intro", 1),
            fragment("Scope", 1),
            fragment("Details", 2),
            fragment("Method", 3),
            fragment("Setup", 3),
        ];
        let levels = [1, 2, 3, 1, 2];
        let headings: Vec<_> = fragments
            .iter()
            .zip(levels)
            .map(|(f, l)| heading(f, HeadingRole::Level(l)))
            .collect();

        let outline = OutlineAssembler::new().assemble(None, &headings);
        assert_eq!(outline.nodes.len(), 2);
        assert_eq!(outline.nodes[0].children[0].children[0].title, "Details");
        assert_eq!(outline.nodes[1].children[0].title, "Setup");
        assert_eq!(outline.total_items(), 5);
        assert!((outline.nodes[0].confidence - 0.765).abs() < 1e-6);
        assert_eq!(
            outline.nodes[0].font.as_ref().map(|f| f.family.as_str()),
            Some("Helvetica-Bold")
        );
    }

    #[test]
    fn test_title_is_separate_from_nodes() {
        let title = fragment("Annual Report", 1);
        let first = fragment("Summary", 1);
        let headings = vec![heading(&first, HeadingRole::Level(1))];
        let outline = OutlineAssembler::new().assemble(Some(&heading(&title, HeadingRole::Title)), &headings);

        assert_eq!(outline.title.as_ref().map(|t| t.level), Some(0));
        assert_eq!(outline.total_items(), 1);
    }

    #[test]
    fn test_reassembly_is_idempotent() {
        let fragments = vec![fragment("A", 1), fragment("B", 1), fragment("C", 2)];
        let levels = [1, 2, 1];
        let headings: Vec<_> = fragments
            .iter()
            .zip(levels)
            .map(|(f, l)| heading(f, HeadingRole::Level(l)))
            .collect();

        let assembler = OutlineAssembler::new();
        let first = assembler.assemble(None, &headings);
        let second = assembler.assemble(None, &headings);
        assert_eq!(first, second);

        let rebuilt = assembler.from_entries(None, &first.flatten());
        assert_eq!(rebuilt, first);
    }

    #[test]
    fn test_empty() {
        let outline = OutlineAssembler::new().assemble(None, &[]);
        assert!(outline.is_empty());
        assert!(outline.title.is_none());
    }
}
