use ido_core::{GraphModel, HasMetadata, PieConfig, keys};
use serde_json::Value;

use crate::text::quoted;
use crate::writer::CodeWriter;
use crate::{own_edges, own_nodes};

pub(crate) fn write(model: &GraphModel, config: &PieConfig, writer: &mut CodeWriter) {
    writer.line(if config.show_data { "pie showData" } else { "pie" });
    writer.indent();
    if let Some(title) = &config.title {
        writer.line(format!("title {title}"));
    }

    let nodes = own_nodes(model, writer);
    for node in &nodes {
        let value = match node.meta(keys::VALUE) {
            Some(Value::Number(number)) => number.to_string(),
            Some(Value::String(raw)) if !raw.trim().is_empty() => {
                writer.warn(format!(
                    "slice '{}' has a non-numeric value: {raw}",
                    node.id
                ));
                raw.trim().to_string()
            }
            _ => {
                writer.warn(format!("slice '{}' has no value and was skipped", node.id));
                continue;
            }
        };
        writer.line(format!("{} : {value}", quoted(&node.label)));
    }
    // Pie charts have no edges; this only reports any that are present.
    own_edges(model, &nodes, writer);
    writer.dedent();
}

#[cfg(test)]
mod tests {
    use ido_core::{HasMetadata, keys};
    use ido_parser::parse;

    use crate::serialize;

    #[test]
    fn header_title_and_slices() {
        let source = "pie showData title Pets adopted\n\"Dogs\" : 386\n\"Cats\" : 85.5\n\"Say #quot;hi#quot;\" : 1";
        let output = serialize(&parse(source)).expect("serializes");
        assert_eq!(
            output.code,
            "pie showData\n    title Pets adopted\n    \"Dogs\" : 386\n    \"Cats\" : 85.5\n    \"Say #quot;hi#quot;\" : 1\n"
        );
        assert!(output.warnings.is_empty());
        assert_eq!(parse(&output.code).nodes[2].label, "Say \"hi\"");
    }

    #[test]
    fn odd_values_warn() {
        let mut model = parse("pie\n\"Other\" : lots\n\"Gone\" : 3");
        if let Some(node) = model.node_mut("Gone") {
            node.metadata.remove(keys::VALUE);
        }
        let output = serialize(&model).expect("serializes");
        assert_eq!(output.code, "pie\n    \"Other\" : lots\n");
        assert_eq!(output.warnings.len(), 2, "{:?}", output.warnings);
        assert!(model.nodes[0].meta_str(keys::VALUE).is_some());
    }
}
