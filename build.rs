use std::fs;
use std::io;

const PROTO_OUT_DIR: &str = "./generated/";

fn main() -> io::Result<()> {
    println!("cargo:rerun-if-changed=protos/paxos.proto");

    fs::create_dir_all(PROTO_OUT_DIR)?;
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .out_dir(PROTO_OUT_DIR)
        .compile(&["./protos/paxos.proto"], &["./protos/"])
}
