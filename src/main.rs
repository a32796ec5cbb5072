use std::{ffi::OsString, fs, path::PathBuf, process::ExitCode};

use clap::{ArgAction, Parser, Subcommand};
use log::{debug, LevelFilter};
#[cfg(windows)]
use resutil::NativePlatform;
use resutil::{
    constants::ERROR_BAD_ARGUMENTS, known_types, ResourceEditor, ResourceError, ResourceId, ResourcePlatform,
    ResourceType,
};

/// Options accepted in the `/name:value` form.
const SLASH_OPTIONS: [&str; 8] = ["in", "out", "type", "id", "idIn", "idOut", "verbose", "portable"];

#[derive(Parser)]
#[command(
    name = "resutil",
    version,
    about = "Read, write and enumerate resources of Windows executables and libraries",
    after_help = type_help()
)]
struct Cli {
    /// Raise the log level, repeat for more detail.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Use the portable resource implementation instead of the Windows resource API.
    #[arg(long, global = true, hide = cfg!(not(windows)))]
    portable: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write raw data into the specified file resource.
    Write {
        /// File containing the raw data.
        #[arg(long = "in")]
        input: PathBuf,
        /// Target file.
        #[arg(long = "out")]
        output: PathBuf,
        /// Type of the resource.
        #[arg(long = "type")]
        resource_type: String,
        /// Resource id.
        #[arg(long)]
        id: String,
    },
    /// Read the specified resource and dump it to disk.
    Read {
        /// Source file.
        #[arg(long = "in")]
        input: PathBuf,
        /// Target file.
        #[arg(long = "out")]
        output: PathBuf,
        /// Type of the resource.
        #[arg(long = "type")]
        resource_type: String,
        /// Resource id.
        #[arg(long)]
        id: String,
    },
    /// Enumerate resources of a given type.
    #[command(name = "enum")]
    Enum {
        /// Source file.
        #[arg(long = "in")]
        input: PathBuf,
        /// Type of the resources.
        #[arg(long = "type")]
        resource_type: String,
    },
    /// Enumerate resource types.
    #[command(name = "enumTypes", alias = "enum-types")]
    EnumTypes {
        /// Source file.
        #[arg(long = "in")]
        input: PathBuf,
    },
    /// Enumerate the languages of a resource.
    #[command(name = "enumLangs", alias = "enum-langs")]
    EnumLangs {
        /// Source file.
        #[arg(long = "in")]
        input: PathBuf,
        /// Type of the resource.
        #[arg(long = "type")]
        resource_type: String,
        /// Resource id.
        #[arg(long)]
        id: String,
    },
    /// Copy a resource from one file to another.
    Copy {
        /// Source file.
        #[arg(long = "in")]
        input: PathBuf,
        /// Target file.
        #[arg(long = "out")]
        output: PathBuf,
        /// Type of the resource.
        #[arg(long = "type")]
        resource_type: String,
        /// Resource id in the source file.
        #[arg(long = "idIn")]
        id_in: String,
        /// Resource id for the target file.
        #[arg(long = "idOut")]
        id_out: String,
    },
}

fn type_help() -> String {
    let names = known_types().map(|(name, _)| name).collect::<Vec<_>>();
    format!(
        "Predefined resource types are: {}\nCustom types can be specified as strings, \
         wrap them in double quotes to use a predefined name as a custom type.",
        names.join(", ")
    )
}

/// Rewrite `/name:value` and `/name` arguments into `--name=value` and `--name`.
fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(option) = text.strip_prefix('/') else {
                return arg;
            };
            let (name, value) = match option.split_once(':') {
                Some((name, value)) => (name, Some(value)),
                None => (option, None),
            };
            if !SLASH_OPTIONS.contains(&name) {
                return arg;
            }
            match value {
                Some(value) => format!("--{}={}", name, value).into(),
                None => format!("--{}", name).into(),
            }
        })
        .collect()
}

fn run<P: ResourcePlatform>(editor: &ResourceEditor<P>, command: Command) -> Result<(), ResourceError> {
    match command {
        Command::Write {
            input,
            output,
            resource_type,
            id,
        } => {
            let data = fs::read(&input).map_err(|source| ResourceError::Io { path: input, source })?;
            editor.write(&data, &output, &ResourceType::resolve(&resource_type), &ResourceId::parse(&id)?)
        }
        Command::Read {
            input,
            output,
            resource_type,
            id,
        } => {
            let data = editor.read(&input, &ResourceType::resolve(&resource_type), &ResourceId::parse(&id)?)?;
            fs::write(&output, data).map_err(|source| ResourceError::Io { path: output, source })
        }
        Command::Enum { input, resource_type } => {
            for id in editor.enumerate_ids(&input, &ResourceType::resolve(&resource_type))? {
                println!("{}", id);
            }
            Ok(())
        }
        Command::EnumTypes { input } => {
            for name in editor.enumerate_types(&input)? {
                println!("{}", name);
            }
            Ok(())
        }
        Command::EnumLangs {
            input,
            resource_type,
            id,
        } => {
            let languages = editor.enumerate_languages(
                &input,
                &ResourceType::resolve(&resource_type),
                &ResourceId::parse(&id)?,
            )?;
            for language in languages {
                println!("{}", language);
            }
            Ok(())
        }
        Command::Copy {
            input,
            output,
            resource_type,
            id_in,
            id_out,
        } => editor.copy(
            &input,
            &ResourceType::resolve(&resource_type),
            &ResourceId::parse(&id_in)?,
            &output,
            &ResourceId::parse(&id_out)?,
        ),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(ERROR_BAD_ARGUMENTS as u8)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();

    #[cfg(windows)]
    let result = if cli.portable {
        debug!("using portable resource platform");
        run(&ResourceEditor::new(), cli.command)
    } else {
        run(&ResourceEditor::with_platform(NativePlatform), cli.command)
    };
    #[cfg(not(windows))]
    let result = {
        debug!("using portable resource platform (requested: {})", cli.portable);
        run(&ResourceEditor::new(), cli.command)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if e.is_argument_error() {
                ExitCode::from(ERROR_BAD_ARGUMENTS as u8)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(args: &[&str]) -> Vec<String> {
        normalize_args(args.iter().map(OsString::from))
            .into_iter()
            .map(|arg| arg.into_string().unwrap())
            .collect()
    }

    #[test]
    fn rewrites_slash_options() {
        assert_eq!(
            normalized(&["resutil", "write", "/in:data.bin", "/out:C:\\app.exe", "/type:rcdata", "/id:1"]),
            ["resutil", "write", "--in=data.bin", "--out=C:\\app.exe", "--type=rcdata", "--id=1"]
        );
        assert_eq!(normalized(&["resutil", "copy", "/idIn:1", "/idOut:2"]), [
            "resutil", "copy", "--idIn=1", "--idOut=2"
        ]);
    }

    #[test]
    fn keeps_paths_and_unknown_options() {
        assert_eq!(normalized(&["resutil", "read", "--in", "/tmp/app.exe", "/foo:bar"]), [
            "resutil",
            "read",
            "--in",
            "/tmp/app.exe",
            "/foo:bar"
        ]);
    }

    #[test]
    fn parses_slash_syntax() {
        let cli = Cli::try_parse_from(normalize_args(
            ["resutil", "enumTypes", "/in:app.exe"].iter().map(OsString::from),
        ))
        .unwrap();
        assert!(matches!(cli.command, Command::EnumTypes { input } if input == PathBuf::from("app.exe")));

        let cli = Cli::try_parse_from(["resutil", "enum-langs", "--in", "app.exe", "--type", "icon", "--id", "1"])
            .unwrap();
        assert!(matches!(cli.command, Command::EnumLangs { .. }));
    }

    #[test]
    fn rejects_missing_arguments() {
        let error = Cli::try_parse_from(["resutil", "read", "--in", "app.exe"]).err().unwrap();
        assert!(error.use_stderr());
    }

    #[test]
    fn lists_type_names() {
        let help = type_help();
        assert!(help.contains("accelerator, anicursor"));
        assert!(help.contains("version, vxd"));
    }
}
