use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let protos_dir = PathBuf::from("protos");

    let mut proto_files = Vec::new();
    for entry in std::fs::read_dir(&protos_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) == Some("proto") {
            proto_files.push(path.to_string_lossy().into_owned());
        }
    }
    proto_files.sort();

    let mut config = prost_build::Config::new();
    config.type_attribute(".", "#[derive(serde::Serialize, serde::Deserialize)]");
    config.compile_protos(&proto_files, &[protos_dir.to_string_lossy().as_ref()])?;

    for proto_file in &proto_files {
        println!("cargo:rerun-if-changed={}", proto_file);
    }
    println!("cargo:rerun-if-changed=protos");

    Ok(())
}
