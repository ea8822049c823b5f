//! Snapshot tests
//!
//! Loads each fixtures/*.hcl file individually and compares if the
//! variables found against fixtures/schema.yaml change.
use hclref::{documents::Documents, format, lower::detect_variables, schema::Block};
use std::path::Path;

#[test]
fn snapshots() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HCLREF_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let schema_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schema.yaml");
    let schema: Block = format::load(&schema_path).expect("schema must load");
    schema.validate().expect("schema must be valid");

    insta::glob!("fixtures/*.hcl", |path| {
        let mut documents = Documents::default();
        documents.load_file(path).expect("fixture must parse");

        let lowering = detect_variables(&documents, &schema);

        insta::assert_json_snapshot!(lowering);
    });
}
