use super::*;

// ============================================================================
// DIRECTIVE PARSING
// ============================================================================

#[test]
fn test_include_target_quoted_and_angled() {
    assert_eq!(include_target("#include \"common.hlsli\""), Some("common.hlsli"));
    assert_eq!(include_target("  #  include <lib/math.hlsli>"), Some("lib/math.hlsli"));
}

#[test]
fn test_include_target_ignores_other_lines() {
    assert_eq!(include_target("#define FOO 1"), None);
    assert_eq!(include_target("float4 main() : SV_Target;"), None);
    assert_eq!(include_target("#include common.hlsli"), None);
}

// ============================================================================
// EXPANSION
// ============================================================================

#[test]
fn test_expand_includes_inlines_nested_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.hlsli"), "#include \"b.hlsli\"\nfloat a;").unwrap();
    std::fs::write(dir.path().join("b.hlsli"), "float b;").unwrap();

    let out = expand_includes("#include \"a.hlsli\"\nfloat c;", Some(dir.path())).unwrap();
    assert_eq!(out, "float b;\nfloat a;\nfloat c;\n");
}

#[test]
fn test_expand_includes_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = expand_includes("#include \"nope.hlsli\"", Some(dir.path())).unwrap_err();
    assert!(matches!(err, Error::InvalidResource(ref msg) if msg.contains("nope.hlsli")));
}

#[test]
fn test_expand_includes_rejects_cycles() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("loop.hlsli"), "#include \"loop.hlsli\"").unwrap();

    let err = expand_includes("#include \"loop.hlsli\"", Some(dir.path())).unwrap_err();
    assert!(matches!(err, Error::InvalidResource(ref msg) if msg.contains("depth")));
}

#[test]
fn test_resolve_include_prefers_requesting_directory() {
    let root = tempfile::tempdir().unwrap();
    let sub = root.path().join("sub");
    std::fs::create_dir(&sub).unwrap();
    std::fs::write(root.path().join("x.hlsli"), "root").unwrap();
    std::fs::write(sub.join("x.hlsli"), "sub").unwrap();

    let requesting = sub.join("main.hlsl");
    let (_, content) =
        resolve_include("x.hlsli", requesting.to_str().unwrap(), Some(root.path())).unwrap();
    assert_eq!(content, "sub");
}
