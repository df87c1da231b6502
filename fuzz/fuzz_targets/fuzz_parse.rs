#![no_main]

use ido_core::DiagramType;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let model = ido_parser::parse(input);
    assert!(model.check().is_ok(), "{:?}", model.check());
    let _ = serde_json::to_string(&model);

    // Force each parser over the same text regardless of its header.
    for diagram_type in DiagramType::ALL {
        let model = ido_parser::parse_as(input, diagram_type);
        assert_eq!(model.diagram_type, diagram_type);
        assert!(model.check().is_ok(), "{diagram_type}: {:?}", model.check());
    }
});
