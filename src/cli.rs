use clap::Parser;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

use crate::config::{
    Config, DEFAULT_CODE_STYLE, DEFAULT_DEBUG_COPY, DEFAULT_PLACEHOLDER, DOCUMENT_PATH,
};
use crate::naming::derive_output_name;

#[derive(Parser, Debug)]
#[command(name = "mlx-remove-code")]
#[command(version)]
#[command(
    about = "Replace the code in a MATLAB live script (.mlx) with a placeholder",
    long_about = "Expands the .mlx archive, replaces the text of every paragraph styled as \
                  code in matlab/document.xml with a placeholder, and packs the result into \
                  a new .mlx file."
)]
#[command(after_help = "Examples:\n  \
  mlx-remove-code lesson1_soln.mlx              writes lesson1.mlx\n  \
  mlx-remove-code lesson2.mlx                   writes lesson2_nocode.mlx\n  \
  mlx-remove-code input.mlx -o output.mlx       writes output.mlx")]
pub struct Cli {
    /// Path to the input MLX file
    #[arg(value_name = "INPUT_FILE")]
    pub input_file: String,

    /// Path to the output MLX file (default: derived from the input name)
    #[arg(short = 'o', long = "output-file", value_name = "FILE")]
    pub output_file: Option<String>,

    /// Paragraph style that marks code
    #[arg(long, env = "MLX_CODE_STYLE", default_value = DEFAULT_CODE_STYLE)]
    pub style: String,

    /// Text that replaces each code paragraph
    #[arg(long, env = "MLX_PLACEHOLDER", default_value = DEFAULT_PLACEHOLDER)]
    pub placeholder: String,

    /// Where to write a copy of the rewritten document
    #[arg(long, value_name = "PATH", default_value = DEFAULT_DEBUG_COPY)]
    pub debug_copy: PathBuf,

    /// Do not write the debug copy
    #[arg(long, conflicts_with = "debug_copy")]
    pub no_debug_copy: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Explicit output path, or the name derived from the input.
    pub fn output_file(&self) -> String {
        self.output_file
            .clone()
            .unwrap_or_else(|| derive_output_name(&self.input_file))
    }

    pub fn config(&self) -> Config {
        Config {
            code_style: self.style.clone(),
            placeholder: self.placeholder.clone(),
            document_path: DOCUMENT_PATH.to_string(),
            debug_copy: (!self.no_debug_copy).then(|| self.debug_copy.clone()),
            scratch_root: None,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mlx-remove-code").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn output_defaults_to_derived_name() {
        assert_eq!(parse(&["hw3_soln.mlx"]).output_file(), "hw3.mlx");
        assert_eq!(parse(&["hw3.mlx"]).output_file(), "hw3_nocode.mlx");
    }

    #[test]
    fn explicit_output_wins() {
        let cli = parse(&["in.mlx", "-o", "out.mlx"]);
        assert_eq!(cli.output_file(), "out.mlx");
        let cli = parse(&["in.mlx", "--output-file", "other.mlx"]);
        assert_eq!(cli.output_file(), "other.mlx");
    }

    #[test]
    fn config_defaults() {
        let config = parse(&["in.mlx"]).config();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn debug_copy_flags() {
        let config = parse(&["in.mlx", "--no-debug-copy"]).config();
        assert_eq!(config.debug_copy, None);
        let config = parse(&["in.mlx", "--debug-copy", "/tmp/doc.xml"]).config();
        assert_eq!(config.debug_copy, Some(PathBuf::from("/tmp/doc.xml")));
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(parse(&["in.mlx"]).log_level(), LevelFilter::INFO);
        assert_eq!(parse(&["in.mlx", "-v"]).log_level(), LevelFilter::DEBUG);
        assert_eq!(parse(&["in.mlx", "-vv"]).log_level(), LevelFilter::TRACE);
        assert_eq!(parse(&["in.mlx", "-q"]).log_level(), LevelFilter::ERROR);
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(["mlx-remove-code"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
