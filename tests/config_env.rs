use std::path::PathBuf;

use clap::Parser;
use texforge::config::{CliArgs, load};

// Environment variables are process-wide; this binary holds the only test that sets them.
#[test]
fn environment_layer_uses_texforge_prefix_and_section_separator() {
    // SAFETY: no other thread in this test binary reads or writes the environment.
    unsafe {
        std::env::set_var("TEXFORGE_ARTIFACTS__DIRECTORY", "/srv/texforge-pdfs");
        std::env::set_var("TEXFORGE_SERVER__PORT", "9001");
        std::env::set_var("TEXFORGE_COMPILER__MAX_CONCURRENCY", "3");
    }

    let settings = load(&CliArgs::parse_from(["texforge"])).expect("settings load");
    assert_eq!(
        settings.artifacts.directory,
        PathBuf::from("/srv/texforge-pdfs")
    );
    assert_eq!(settings.server.addr.port(), 9001);
    assert_eq!(
        settings.compiler.max_concurrency.map(|limit| limit.get()),
        Some(3)
    );

    let overridden = load(&CliArgs::parse_from([
        "texforge",
        "serve",
        "--artifacts-directory",
        "/tmp/override",
    ]))
    .expect("settings load");
    assert_eq!(overridden.artifacts.directory, PathBuf::from("/tmp/override"));
    assert_eq!(overridden.server.addr.port(), 9001);
}
