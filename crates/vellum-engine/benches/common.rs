use vellum_engine::editing::{Document, DocumentNode, TextNode};

/// Build a document of `paragraphs` text nodes with small varied content.
pub fn generate_document(paragraphs: usize) -> Document {
    let nodes: Vec<DocumentNode> = (0..paragraphs)
        .map(|i| {
            DocumentNode::Text(TextNode::new(format!(
                "Paragraph {i} with some editable content to move through."
            )))
        })
        .collect();
    Document::from_nodes(nodes).expect("Should build document")
}
