/// Builds the gRPC client and server code for `proto/catalog.proto` using
/// `tonic-prost-build`.
///
/// Besides the message types and service traits, a serialized
/// `FileDescriptorSet` is written to `OUT_DIR/catalog_descriptor.bin` so the
/// server can expose gRPC reflection without shipping the `.proto` file.
///
/// # Panics
///
/// Panics if code generation fails (missing `protoc`, invalid schema). Cargo
/// surfaces the message as a build script failure.
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("catalog_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    println!("cargo:rerun-if-changed=proto/catalog.proto");

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/catalog.proto"], &["proto"])
        .unwrap();
}
