fn main() {
    // Generate code for the tests in tests/ (pulled in via include!), so it
    // never takes part in a normal library build
    let out_dir = std::env::var("OUT_DIR").unwrap();
    mapgen_codegen::GeneratorBuilder::new("fixtures/tables.yaml")
        .schema_file("fixtures/schema.sql")
        .output_root(&out_dir)
        .generate()
        .expect("codegen failed");

    println!("cargo:rerun-if-changed=fixtures/tables.yaml");
    println!("cargo:rerun-if-changed=fixtures/schema.sql");
}
