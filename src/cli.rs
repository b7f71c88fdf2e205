//! The command-line interface of the driver.

use clap::{Arg, ArgAction};
use std::path::PathBuf;

pub enum Command {
    /// `sonic new <name>`
    New { name: String },
    /// `sonic compile [path] [options]`
    Compile {
        path: Option<PathBuf>,
        options: BuildOptions,
    },
}

#[derive(Clone, Copy, Default)]
pub struct BuildOptions {
    pub mode: BuildMode,
    pub optimization: OptimizationLevel,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum OptimizationLevel {
    None,
    #[default]
    Default,
    O2,
    O3,
    Fast,
}

pub fn arguments() -> Command {
    let mut command = clap::Command::new(crate::NAME)
        .version(crate::VERSION)
        .about("The compiler of the Sonic programming language")
        .arg(
            Arg::new("author")
                .long("author")
                .action(ArgAction::SetTrue)
                .help("Print the authors and exit"),
        )
        .arg(
            Arg::new("license")
                .long("license")
                .action(ArgAction::SetTrue)
                .help("Print the license and exit"),
        )
        .subcommand(
            clap::Command::new("new")
                .about("Create a new project folder")
                .arg(Arg::new("NAME").required(true).help("The project name")),
        )
        .subcommand(
            clap::Command::new("compile")
                .about("Compile the given source file or project folder")
                .arg(
                    Arg::new("PATH")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("A source file or a project folder (its src/main.sn is used)"),
                )
                .arg(
                    Arg::new("debug")
                        .long("debug")
                        .action(ArgAction::SetTrue)
                        .help("Build in debug mode"),
                )
                .arg(
                    Arg::new("release")
                        .long("release")
                        .action(ArgAction::SetTrue)
                        .help("Build in release mode"),
                )
                .arg(
                    Arg::new("no-opt")
                        .long("no-opt")
                        .action(ArgAction::SetTrue)
                        .help("Disable optimization"),
                )
                .arg(
                    Arg::new("optimization")
                        .short('O')
                        .value_parser(["2", "3", "fast"])
                        .help("Set the optimization level"),
                ),
        );

    let matches = command.clone().get_matches();

    if matches.get_flag("author") {
        println!("{}", crate::AUTHOR);
        std::process::exit(0);
    }
    if matches.get_flag("license") {
        println!("{}", crate::LICENSE);
        std::process::exit(0);
    }

    match matches.subcommand() {
        Some(("new", matches)) => Command::New {
            name: matches.get_one::<String>("NAME").unwrap().clone(),
        },
        Some(("compile", matches)) => {
            let mode = if matches.get_flag("release") {
                BuildMode::Release
            } else {
                BuildMode::Debug
            };

            let optimization = if matches.get_flag("no-opt") {
                OptimizationLevel::None
            } else {
                match matches.get_one::<String>("optimization").map(String::as_str) {
                    Some("2") => OptimizationLevel::O2,
                    Some("3") => OptimizationLevel::O3,
                    Some("fast") => OptimizationLevel::Fast,
                    _ => OptimizationLevel::Default,
                }
            };

            Command::Compile {
                path: matches.get_one::<PathBuf>("PATH").cloned(),
                options: BuildOptions { mode, optimization },
            }
        }
        _ => {
            command.print_help().ok();
            std::process::exit(1);
        }
    }
}
