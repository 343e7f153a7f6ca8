use std::{
    collections::BTreeMap,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

fn main() {
    println!("cargo::rerun-if-changed=migrations");

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let migrations_rs = out_dir.join("migrations.rs");
    emit_migrations(&migrations_rs);
    println!("cargo::rustc-env=MIGRATIONS={}", migrations_rs.display());
}

/// Write all migrations as a `&[Migration]` slice literal, ordered by name.
fn emit_migrations(path: &Path) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = BufWriter::new(file);
    write!(&mut writer, "&[").unwrap();
    for (name, Scripts { up, down }) in collect_migrations() {
        write!(
            &mut writer,
            "Migration{{name:{name:?},up:{up:?},down:{down:?}}},"
        )
        .unwrap();
    }
    write!(&mut writer, "]").unwrap();
    writer.flush().unwrap();
}

#[derive(Default)]
struct Scripts {
    up: String,
    down: String,
}

fn collect_migrations() -> BTreeMap<String, Scripts> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");

    let mut out = BTreeMap::<String, Scripts>::new();
    for file in dir.read_dir().unwrap() {
        let file = file.unwrap();
        let file_name = file.file_name().into_string().unwrap();
        let content = || std::fs::read_to_string(file.path()).unwrap();

        if let Some(name) = file_name.strip_suffix(".up.sql") {
            out.entry(name.into()).or_default().up = content();
        } else if let Some(name) = file_name.strip_suffix(".down.sql") {
            out.entry(name.into()).or_default().down = content();
        }
    }
    out
}
