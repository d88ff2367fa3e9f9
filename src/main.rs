use std::{
    env,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    process::exit,
};

use anyhow::{bail, Context as _, Result};
use hack_vm::{extract_vm_name, is_vm_file, read_vm_file, translate_command, CodeWriter, Parser};

/// Collects file paths from the given path: the path itself if it is a
/// `.vm` file, or every `.vm` file directly inside it if it is a directory.
fn collect_file_paths<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let path = path.as_ref();

    if path.is_dir() {
        for entry in path.read_dir()?.filter_map(|e| e.map(|e| e.path()).ok()) {
            if is_vm_file(&entry) {
                paths.push(entry);
            }
        }
        paths.sort();
    } else if is_vm_file(path) {
        paths.push(path.to_path_buf());
    } else {
        bail!("could not read {}", path.display());
    }

    Ok(paths)
}

/// Derives the single output `.asm` path for a given input path: a sibling
/// file for a single source file, or `<dir>/<dir-name>.asm` for a directory.
fn output_path(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("could not derive a name for {}", path.display()))?;
        Ok(path.join(format!("{name}.asm")))
    } else {
        Ok(path.with_extension("asm"))
    }
}

fn help() -> ! {
    println!(
        "\
vm file name or directory is not given.

Usage: hack-vm <vm filename or directory>
"
    );
    exit(0);
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(input) = args.get(1) else {
        help();
    };
    let input = Path::new(input);

    let file_paths = collect_file_paths(input).context("could not retrieve given vm files")?;
    if file_paths.is_empty() {
        bail!("no .vm files found at {}", input.display());
    }

    let mut sources = Vec::new();
    for path in &file_paths {
        let name = extract_vm_name(path)?;
        let program = read_vm_file(path).unwrap_or_else(|e| {
            eprintln!("could not load vm file {}: {e}", path.display());
            exit(1);
        });
        sources.push((name, program));
    }

    let out_path = output_path(input)?;
    if out_path.exists() {
        println!("overwriting existing {}", out_path.display());
    }

    let file = File::create(&out_path)
        .with_context(|| format!("could not create {}", out_path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut cw = CodeWriter::new(&mut writer)?;

    for (name, program) in &sources {
        cw.set_unit(*name);
        let parser = Parser::new(name, program);
        for result in parser {
            match result {
                Ok((_, command)) => translate_command(&mut cw, &command)?,
                Err(err) => {
                    eprintln!("{err}");
                    exit(1);
                }
            }
        }
    }

    cw.finish()?;
    Ok(())
}
