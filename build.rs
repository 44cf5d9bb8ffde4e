// build.rs

use glob::glob;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A matrix fixture discovered in the `data/` directory.
#[derive(Debug)]
struct Fixture {
    pub name: String,
    pub path: PathBuf,
}

/// Discovers all `*.sym` matrix fixtures under `data/`.
fn get_all_fixtures(manifest_dir: &Path) -> Vec<Fixture> {
    let pattern = manifest_dir.join("data").join("*.sym");
    glob(&pattern.to_string_lossy())
        .expect("Failed to read glob pattern")
        .filter_map(Result::ok)
        .map(|path| {
            let name = path
                .file_stem()
                .unwrap()
                .to_string_lossy()
                .replace(['-', '.'], "_");
            Fixture { name, path }
        })
        .collect()
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    println!("cargo:rerun-if-changed=data");

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("fixture_tests.rs");
    let mut file = BufWriter::new(File::create(&dest_path).unwrap());

    // Generate a separate `#[test]` function for each fixture.
    for fixture in get_all_fixtures(&manifest_dir) {
        let path_str = fixture.path.to_str().unwrap();
        writeln!(
            file,
            r#"
#[test]
fn fixture_{name}() -> anyhow::Result<()> {{
    let fixture = Fixture {{
        name: "{name}",
        path: "{path}".into(),
    }};
    run_fixture(&fixture)
}}
"#,
            name = fixture.name,
            path = path_str.escape_default()
        )
        .unwrap();
    }
}
