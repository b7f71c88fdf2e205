use sonic::{
    cli::{self, BuildMode, Command},
    package,
    resolver::{self, Session},
};
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

fn main() -> ExitCode {
    match cli::arguments() {
        Command::New { name } => match package::create_project(&name) {
            Ok(root) => {
                println!("created project \u{2018}{}\u{2019}", root.display());
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("error: could not create project \u{2018}{name}\u{2019}: {error}");
                ExitCode::FAILURE
            }
        },
        Command::Compile { path, options } => compile(path, options),
    }
}

fn compile(path: Option<PathBuf>, options: cli::BuildOptions) -> ExitCode {
    let path = path.unwrap_or_else(|| PathBuf::from("."));
    let entry = package::entry_file(&path);
    let project_root = entry
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    // the manifest is opaque to the front-end; only the target triple is
    // consumed
    let target = package::Manifest::discover(&project_root)
        .ok()
        .flatten()
        .and_then(|manifest| manifest.target);

    match (&target, options.mode) {
        (Some(target), BuildMode::Release) => {
            println!("compiling {} for {target} (release)", entry.display());
        }
        (Some(target), BuildMode::Debug) => {
            println!("compiling {} for {target}", entry.display());
        }
        (None, _) => println!("compiling {}", entry.display()),
    }

    let mut session = Session::new(project_root);
    let analysis = resolver::analyze_entry(&mut session, &entry);

    let errors = session.reporter.flush(Some(&session.map));
    if errors || analysis.errors {
        return ExitCode::FAILURE;
    }

    let modules = analysis.programs.len();
    println!(
        "analyzed {modules} module{}",
        if modules == 1 { "" } else { "s" }
    );

    ExitCode::SUCCESS
}
