#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let model = ido_parser::parse(input);
    let serialized = ido_serializer::serialize(&model).expect("parsed models always serialize");
    let reparsed = ido_parser::parse_as(&serialized.code, model.diagram_type);
    assert!(reparsed.check().is_ok(), "{:?}", reparsed.check());

    // Serializing the re-parsed model must not fail either.
    ido_serializer::serialize(&reparsed).expect("re-parsed models always serialize");
});
