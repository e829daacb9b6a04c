use super::*;

// ============================================================================
// STABLE INTERFACE NAMES
// ============================================================================

#[test]
fn test_stable_io_name_maps_all_prefixes() {
    assert_eq!(stable_io_name("_p2vs_location0").as_deref(), Some("sp_Attrib_0"));
    assert_eq!(stable_io_name("_vs2fs_location3").as_deref(), Some("sp_ToFrag_var3"));
    assert_eq!(stable_io_name("_fs2p_location1").as_deref(), Some("sp_FragColor_1"));
}

#[test]
fn test_stable_io_name_rejects_other_identifiers() {
    assert_eq!(stable_io_name("_vs2fs_location"), None);
    assert_eq!(stable_io_name("_vs2fs_locationX"), None);
    assert_eq!(stable_io_name("color"), None);
}

// ============================================================================
// IDENTIFIER RENAMING
// ============================================================================

#[test]
fn test_rename_identifiers_whole_tokens_only() {
    let src = "vec4 a = ab + a_b + a;";
    let out = rename_identifiers(src, |t| (t == "a").then(|| "z".to_string()));
    assert_eq!(out, "vec4 z = ab + a_b + z;");
}

#[test]
fn test_rename_identifiers_skips_numeric_literals() {
    let src = "float e5 = 1.0e5 + e5;";
    let out = rename_identifiers(src, |t| (t == "e5").then(|| "x".to_string()));
    assert_eq!(out, "float x = 1.0e5 + x;");
}

#[test]
fn test_rename_identifiers_keeps_non_ascii() {
    let src = "// héllo\nint a;";
    let out = rename_identifiers(src, |t| (t == "a").then(|| "b".to_string()));
    assert_eq!(out, "// héllo\nint b;");
}

// ============================================================================
// VERTEX WRAPPER
// ============================================================================

#[test]
fn test_wrap_vertex_main_inserts_flip_uniform_after_preamble() {
    let src = "#version 330 core\n#extension GL_ARB_foo : require\nin vec4 p;\nvoid main() {\n    gl_Position = p;\n}\n";
    let out = wrap_vertex_main(src);

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "#version 330 core");
    assert_eq!(lines[1], "#extension GL_ARB_foo : require");
    assert_eq!(lines[2], "uniform float sp_FlipY;");
    assert!(out.contains("void sp_main() {"));
    assert!(out.contains("gl_Position.y *= sp_FlipY;"));
    assert_eq!(out.matches("void main()").count(), 1);
}

#[test]
fn test_wrap_vertex_main_without_preamble() {
    let out = wrap_vertex_main("void main() {}");
    assert!(out.starts_with("uniform float sp_FlipY;\n"));
    assert!(out.contains("void sp_main() {}"));
}
