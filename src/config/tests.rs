use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.compiler.program, PathBuf::from("pdflatex"));
    assert_eq!(settings.compiler.timeout, Duration::from_secs(120));
    assert!(settings.compiler.max_concurrency.is_none());
    assert!(settings.compiler.scratch_dir.is_none());
    assert_eq!(
        settings.artifacts.directory,
        std::env::temp_dir().join(DEFAULT_ARTIFACTS_DIRNAME)
    );
    assert!(settings.artifacts.public_base_url.is_none());
    assert_eq!(
        settings.server.max_request_bytes.get(),
        DEFAULT_MAX_REQUEST_BYTES
    );
}

#[test]
fn compiler_overrides_apply() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        compiler: CompilerOverrides {
            program: Some(PathBuf::from("/opt/texlive/bin/lualatex")),
            timeout_seconds: Some(60),
            scratch_dir: Some(PathBuf::from("/var/tmp/texforge")),
            max_concurrency: Some(4),
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");
    let options = CompileOptions::from(&settings.compiler);

    assert_eq!(
        settings.compiler.program,
        PathBuf::from("/opt/texlive/bin/lualatex")
    );
    assert_eq!(options.timeout, Duration::from_secs(60));
    assert_eq!(
        options.scratch_dir.as_deref(),
        Some(std::path::Path::new("/var/tmp/texforge"))
    );
    assert_eq!(options.max_concurrency.map(NonZeroUsize::get), Some(4));
}

#[test]
fn zero_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.compiler.timeout_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("invalid timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "compiler.timeout_seconds",
            ..
        }
    ));
}

#[test]
fn zero_concurrency_is_rejected() {
    let mut raw = RawSettings::default();
    raw.compiler.max_concurrency = Some(0);

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn public_base_url_gets_trailing_slash() {
    let mut raw = RawSettings::default();
    raw.artifacts.public_base_url = Some("https://cdn.example.com/pdfs".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    let base = settings.artifacts.public_base_url.expect("base url");
    assert_eq!(base.as_str(), "https://cdn.example.com/pdfs/");
    assert_eq!(
        base.join("abcd1234-report.pdf").expect("join").as_str(),
        "https://cdn.example.com/pdfs/abcd1234-report.pdf"
    );
}

#[test]
fn invalid_public_base_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.artifacts.public_base_url = Some("not a url".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn blank_public_base_url_is_ignored() {
    let mut raw = RawSettings::default();
    raw.artifacts.public_base_url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.artifacts.public_base_url.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["texforge"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_arguments() {
    let args = CliArgs::parse_from([
        "texforge",
        "serve",
        "--server-port",
        "9000",
        "--compiler-program",
        "xelatex",
        "--compiler-timeout-seconds",
        "90",
        "--artifacts-directory",
        "/srv/pdfs",
        "--log-json",
        "true",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            let overrides = &serve.overrides;
            assert_eq!(overrides.server_port, Some(9000));
            assert_eq!(
                overrides.compiler.program.as_deref(),
                Some(std::path::Path::new("xelatex"))
            );
            assert_eq!(overrides.compiler.timeout_seconds, Some(90));
            assert_eq!(
                overrides.artifacts_directory.as_deref(),
                Some(std::path::Path::new("/srv/pdfs"))
            );
            assert_eq!(overrides.log_json, Some(true));
        }
    }
}
