//! Document tree to Markdown

use super::model::{Block, Document, Inline, Section};

pub fn write_markdown(document: &Document) -> String {
    let mut output = format!("# {}\n", escape(&document.title));
    for block in &document.blocks {
        emit_block(&mut output, block);
    }
    for section in &document.sections {
        emit_section(&mut output, section, 2);
    }
    output
}

fn emit_section(output: &mut String, section: &Section, level: usize) {
    output.push('\n');
    if let Some(anchor) = &section.anchor {
        output.push_str(&format!("<a id=\"{}\"></a>\n\n", anchor));
    }
    output.push_str(&format!("{} {}\n", "#".repeat(level.min(6)), escape(&section.title)));
    for block in &section.blocks {
        emit_block(output, block);
    }
    for subsection in &section.sections {
        emit_section(output, subsection, level + 1);
    }
}

fn emit_block(output: &mut String, block: &Block) {
    output.push('\n');
    match block {
        Block::Paragraph(inlines) => {
            output.push_str(&inline_text(inlines));
            output.push('\n');
        }
        Block::List(items) => {
            for item in items {
                output.push_str(&format!("- {}\n", inline_text(item)));
            }
        }
        Block::Table { header, rows } => {
            let header: Vec<String> = header.iter().map(|cell| escape_cell(cell)).collect();
            output.push_str(&format!("| {} |\n", header.join(" | ")));
            output.push_str(&format!("|{}\n", " --- |".repeat(header.len())));
            for row in rows {
                let cells: Vec<String> = row.iter().map(|cell| escape_cell(&inline_text(cell))).collect();
                output.push_str(&format!("| {} |\n", cells.join(" | ")));
            }
        }
    }
}

fn inline_text(inlines: &[Inline]) -> String {
    inlines
        .iter()
        .map(|inline| match inline {
            Inline::Text(text) => escape(text),
            Inline::Strong(text) => format!("**{}**", escape(text)),
            Inline::Code(text) => format!("`{}`", text.replace('`', "'")),
            Inline::Link { text, href } => format!("[{}]({})", escape(text), href.replace(' ', "%20")),
            Inline::Anchor(anchor) => format!("<a id=\"{}\"></a>", anchor),
        })
        .collect()
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '[' | ']' | '<' | '>' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_with_anchor_and_table() {
        let document = Document {
            title: "Spec".into(),
            blocks: vec![],
            sections: vec![Section {
                title: "Person".into(),
                anchor: Some("person-1".into()),
                blocks: vec![Block::Table {
                    header: vec!["Name".into(), "Type".into()],
                    rows: vec![vec![
                        vec![Inline::Strong("name".into())],
                        vec![Inline::local("Text", "text-1")],
                    ]],
                }],
                sections: vec![],
            }],
        };
        let markdown = write_markdown(&document);
        assert!(markdown.contains("<a id=\"person-1\"></a>\n\n## Person\n"));
        assert!(markdown.contains("| **name** | [Text](#text-1) |"));
    }
}
