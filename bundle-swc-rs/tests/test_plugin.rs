use rstest::rstest;
use std::fs;
use std::path::Path;
use std::sync::Once;

use bundle_swc_rs::resolver::resolve;
use bundle_swc_rs::{
    ChunkInfo, Compiler, Error, MinifyOptions, MinifyPlugin, Plugin, PluginOptions, SwcPlugin,
};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use tempfile::{tempdir, TempDir};

static INIT: Once = Once::new();

pub fn initialize() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn plugin_from_json(json: &str) -> SwcPlugin {
    initialize();
    let options: PluginOptions =
        serde_json::from_str(json).unwrap_or_else(|e| panic!("Invalid options {json}: {e}"));
    SwcPlugin::new(options).unwrap()
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn id_in(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

#[rstest]
#[case(&["util.ts", "util.mjs", "util.js", "util.tsx", "util.jsx"], "util.ts")]
#[case(&["util.js", "util.mjs"], "util.mjs")]
#[case(&["util.jsx", "util.tsx"], "util.tsx")]
#[case(&["util.jsx"], "util.jsx")]
#[tokio::test]
async fn test_resolve_priority(#[case] existing: &[&str], #[case] expected: &str) {
    initialize();
    let files: Vec<(&str, &str)> = existing.iter().map(|name| (*name, "")).collect();
    let dir = project(&files);

    let resolved = resolve(&dir.path().join("util"), false).await;
    assert_eq!(resolved, Some(dir.path().join(expected)));
}

#[tokio::test]
async fn test_resolve_missing_and_directory_index() {
    initialize();
    let dir = project(&[("lib/index.tsx", ""), ("lib/index.js", "")]);

    assert_eq!(resolve(&dir.path().join("nothing"), false).await, None);
    assert_eq!(resolve(&dir.path().join("lib"), false).await, None);
    assert_eq!(
        resolve(&dir.path().join("lib"), true).await,
        Some(dir.path().join("lib").join("index.js"))
    );
}

#[tokio::test]
async fn test_resolve_id_hook() {
    let plugin = plugin_from_json(r#"{"tsconfig": false}"#);
    let dir = project(&[("src/util.ts", ""), ("src/components/index.tsx", "")]);
    let importer = id_in(dir.path(), "src/main.ts");

    let util = plugin.resolve_id("./util", Some(&importer)).await.unwrap();
    assert_eq!(util, Some(id_in(dir.path(), "src/util.ts")));

    let components = plugin.resolve_id("./components", Some(&importer)).await.unwrap();
    assert_eq!(components, Some(id_in(dir.path(), "src/components/index.tsx")));

    let parent = plugin
        .resolve_id("../src/util", Some(&importer))
        .await
        .unwrap();
    assert_eq!(parent, Some(id_in(dir.path(), "src/util.ts")));

    assert_eq!(plugin.resolve_id("./missing", Some(&importer)).await.unwrap(), None);
    assert_eq!(plugin.resolve_id("./util", None).await.unwrap(), None);
    assert_eq!(plugin.resolve_id("react", Some(&importer)).await.unwrap(), None);
}

#[tokio::test]
async fn test_resolve_id_defers_virtual_modules() {
    let plugin = plugin_from_json("{}");
    let dir = project(&[("src/util.ts", "")]);
    let importer = id_in(dir.path(), "src/main.ts");
    assert_eq!(
        plugin.resolve_id("\0./util", Some(&importer)).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_transform_strips_type_annotations() {
    let plugin = plugin_from_json(r#"{"tsconfig": false}"#);
    let output = plugin
        .transform("const x: number = 1", "a.ts")
        .await
        .unwrap()
        .expect("a.ts is eligible");
    assert!(output.code.contains("const x = 1"), "{}", output.code);
    assert!(!output.code.contains(": number"));
    assert!(output.map.is_some());
}

#[tokio::test]
async fn test_transform_preserves_nul_bytes() {
    let plugin = plugin_from_json(r#"{"tsconfig": false}"#);
    let source = "import \"\0commonjs-helpers\";\nexport const tag: string = \"\0\";\n";
    let output = plugin
        .transform(source, "src/a.ts")
        .await
        .unwrap()
        .expect("a.ts is eligible");
    assert!(output.code.contains("\"\0commonjs-helpers\""), "{:?}", output.code);
    assert_eq!(output.code.matches('\0').count(), 2);
    assert!(!output.code.contains(bundle_swc_rs::escape::VIRTUAL_MODULE_MARKER));

    let map = output.map.expect("separate source map");
    assert!(!map.contains('\0'));
    let map: serde_json::Value = serde_json::from_str(&map).unwrap();
    assert_eq!(map["sourcesContent"][0].as_str(), Some(source));
}

#[rstest]
#[case("src/a.vendor/node_modules/x.js")]
#[case("node_modules/pkg/index.ts")]
#[case("\0virtual.ts")]
#[case("src/a.css")]
#[tokio::test]
async fn test_transform_skips_with_default_filter(#[case] id: &str) {
    let plugin = plugin_from_json(r#"{"tsconfig": false}"#);
    assert_eq!(plugin.transform("export {}", id).await.unwrap(), None);
}

#[tokio::test]
async fn test_extension_gate_with_permissive_include() {
    let plugin = plugin_from_json(r#"{"include": [], "exclude": [], "tsconfig": false}"#);
    assert_eq!(plugin.transform("a { color: red }", "a.css").await.unwrap(), None);
    assert_eq!(plugin.transform("export {}", "a.mts").await.unwrap(), None);
    assert!(plugin
        .transform("export {}", "node_modules/x.js")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_ambient_tsconfig_shapes_output() {
    let plugin = plugin_from_json("{}");
    let dir = project(&[(
        "tsconfig.json",
        r#"{
            // preact
            "compilerOptions": {"jsx": "react", "jsxFactory": "h", "jsxFragmentFactory": "Fragment"}
        }"#,
    )]);
    let id = id_in(dir.path(), "src/app.jsx");

    let output = plugin
        .transform("export const el = <div />;", &id)
        .await
        .unwrap()
        .expect("app.jsx is eligible");
    assert!(output.code.contains("h(\"div\""), "{}", output.code);
    assert!(!output.code.contains("React.createElement"));
}

#[tokio::test]
async fn test_user_options_win_over_tsconfig() {
    let plugin = plugin_from_json(r#"{"jsc": {"transform": {"react": {"pragma": "jsx"}}}}"#);
    let dir = project(&[("tsconfig.json", r#"{"compilerOptions": {"jsxFactory": "h"}}"#)]);
    let id = id_in(dir.path(), "app.jsx");

    let output = plugin
        .transform("export const el = <span />;", &id)
        .await
        .unwrap()
        .unwrap();
    assert!(output.code.contains("jsx(\"span\""), "{}", output.code);
}

#[tokio::test]
async fn test_malformed_tsconfig_fails_the_module() {
    let plugin = plugin_from_json("{}");
    let dir = project(&[("tsconfig.json", "{ \"compilerOptions\": { ")]);
    let id = id_in(dir.path(), "a.ts");

    let result = plugin.transform("export {}", &id).await;
    assert!(matches!(result, Err(Error::TsconfigParse { .. })));
}

#[tokio::test]
async fn test_transform_error_carries_module_id() {
    let plugin = plugin_from_json(r#"{"tsconfig": false}"#);
    let err = plugin
        .transform("const = ;", "src/broken.ts")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transform { .. }));
    assert_eq!(err.origin(), Some("src/broken.ts"));
}

#[tokio::test]
async fn test_inline_source_maps() {
    let plugin = plugin_from_json(r#"{"tsconfig": false, "sourceMaps": "inline"}"#);
    let source = "import \"\0helpers\";\nexport const x: number = 1\n";
    let output = plugin.transform(source, "a.ts").await.unwrap().unwrap();
    assert_eq!(output.map, None);

    let (code, encoded) = output
        .code
        .split_once("\n//# sourceMappingURL=data:application/json;base64,")
        .expect("inline source map comment");
    assert!(code.contains("\0helpers"));
    let map = BASE64_STANDARD.decode(encoded.trim_end()).unwrap();
    let map: serde_json::Value = serde_json::from_slice(&map).unwrap();
    assert_eq!(map["sourcesContent"][0].as_str(), Some(source));
}

#[rstest]
#[case(r#"{"tsconfig": false, "jsc": {"target": "es5"}}"#)]
#[case(r#"{"tsconfig": false, "jsc": {"target": "ES2017"}}"#)]
#[tokio::test]
async fn test_target_below_emitted_syntax_is_rejected(#[case] options: &str) {
    let plugin = plugin_from_json(options);
    let result = plugin
        .transform("export const f = (a: number) => a ?? 1; class A { x = 1 }", "a.ts")
        .await;
    assert!(matches!(result, Err(Error::UnsupportedTarget(_))), "{:?}", result);
}

#[tokio::test]
async fn test_ambient_target_below_emitted_syntax_is_rejected() {
    let plugin = plugin_from_json("{}");
    let dir = project(&[("tsconfig.json", r#"{"compilerOptions": {"target": "ES5"}}"#)]);
    let result = plugin.transform("export {}", &id_in(dir.path(), "a.ts")).await;
    assert!(matches!(result, Err(Error::UnsupportedTarget(t)) if t == "es5"));
}

#[tokio::test]
async fn test_supported_target_compiles() {
    let plugin = plugin_from_json(r#"{"tsconfig": false, "jsc": {"target": "es2022"}}"#);
    let output = plugin
        .transform("export class A { x: number = 1 }", "a.ts")
        .await
        .unwrap()
        .unwrap();
    assert!(output.code.contains("x = 1"), "{}", output.code);
}

const CHUNK: &str = "export function add(first, second) {\n    const unusedLocal = 1;\n    return first + second;\n}\n";

#[tokio::test]
async fn test_render_chunk_defers_without_minify() {
    let plugin = plugin_from_json(r#"{"tsconfig": false}"#);
    let output = plugin
        .render_chunk(CHUNK, &ChunkInfo::new("index.js"))
        .await
        .unwrap();
    assert_eq!(output, None);
}

#[tokio::test]
async fn test_render_chunk_minifies_every_chunk() {
    let plugin = plugin_from_json(r#"{"minify": true}"#);
    for name in ["index.js", "vendor.js", "lazy-chunk.js"] {
        let output = plugin
            .render_chunk(CHUNK, &ChunkInfo::new(name))
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("{name} was not minified"));
        assert!(output.code.len() < CHUNK.len());
        assert!(output.code.contains("add"), "{}", output.code);
        assert!(!output.code.contains("unusedLocal"), "{}", output.code);
        assert!(!output.code.contains("first"), "{}", output.code);
    }
}

#[tokio::test]
async fn test_minify_plugin_minifies_chunks_only() {
    initialize();
    let compiler = Compiler::new();
    let plugin = MinifyPlugin::with_compiler(MinifyOptions::default(), compiler.clone());
    let other = MinifyPlugin::with_compiler(
        serde_json::from_str(r#"{"sourceMap": true, "inlineSourcesContent": true}"#).unwrap(),
        compiler,
    );

    assert_eq!(plugin.transform("const a: number = 1", "a.ts").await.unwrap(), None);

    let chunk = format!("import \"\0helpers\";\n{CHUNK}");
    let output = plugin
        .render_chunk(&chunk, &ChunkInfo::new("main.js"))
        .await
        .unwrap()
        .unwrap();
    assert!(output.code.len() < chunk.len());
    assert!(output.code.contains("\0helpers"));
    assert_eq!(output.map, None);

    let with_map = other
        .render_chunk(&chunk, &ChunkInfo::new("main.js"))
        .await
        .unwrap()
        .unwrap();
    let map = with_map.map.expect("source map");
    assert!(!map.contains('\0'));
    let map: serde_json::Value = serde_json::from_str(&map).unwrap();
    assert!(map.get("mappings").is_some());
}

#[test]
fn test_plugin_names() {
    initialize();
    let swc = SwcPlugin::new(PluginOptions::default()).unwrap();
    let minify = MinifyPlugin::new(MinifyOptions::default());
    let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(swc), Box::new(minify)];
    let names: Vec<&str> = plugins.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["swc", "swc-minify"]);
}
