mod telemetry;

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use recast::{
    Action, Budget, ContentType, Dialect, Dictionary, DocumentExtractor, EngineConfig, Outcome,
    Request, RuleLibrary, TextExtractor, TranslationReport, engine::DEFAULT_CONTEXT_RADIUS, process,
    translate_template,
};

use crate::telemetry::{LogFormat, TelemetryError};

#[derive(Parser)]
#[command(name = "recast")]
#[command(about = "Recast - test and apply JavaScript find/replace patterns")]
#[command(version)]
struct Cli {
    /// Log filter directives, e.g. `recast=debug`
    #[arg(long, global = true, env = "RECAST_LOG", default_value = "warn")]
    log_filter: String,
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every match of a pattern with context
    Test {
        /// The find pattern (JavaScript dialect, no delimiters)
        pattern: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Replace every match of a pattern
    Substitute {
        /// The find pattern (JavaScript dialect, no delimiters)
        pattern: String,
        /// The replacement template ($1, $&, ${name}, $$)
        template: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Show the host form of a replacement template
    Translate {
        /// The template to translate
        template: String,
        /// Dialect the template is written in
        #[arg(long, default_value = "javascript")]
        dialect: String,
        /// Show the parsed parts
        #[arg(short, long)]
        debug: bool,
    },
    /// Browse and apply stored rule dictionaries
    Rules {
        /// Root of the rule tree, laid out as <purpose>/<language>/<dictionary>.xml
        #[arg(long, env = "RECAST_RULES_DIR", default_value = "rules")]
        root: PathBuf,
        #[command(subcommand)]
        command: RulesCommand,
    },
}

#[derive(Subcommand)]
enum RulesCommand {
    /// List rule purposes
    Purposes,
    /// List the languages of a purpose
    Languages { purpose: String },
    /// List the dictionaries of a purpose and language
    Dictionaries { purpose: String, language: String },
    /// Print the rules of a dictionary
    Show {
        purpose: String,
        language: String,
        dictionary: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Substitute with every active rule of a dictionary, in order
    Apply {
        purpose: String,
        language: String,
        dictionary: String,
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        limits: LimitArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Match letters regardless of case
    #[arg(short, long)]
    ignore_case: bool,
    #[command(flatten)]
    limits: LimitArgs,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Args)]
struct InputArgs {
    /// Text to scan; stdin is read when neither --text nor --file is given
    #[arg(short, long, conflicts_with = "file")]
    text: Option<String>,
    /// Document to scan (.txt or .docx)
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[derive(Args)]
struct LimitArgs {
    /// Characters of context around each match
    #[arg(long, default_value_t = DEFAULT_CONTEXT_RADIUS)]
    radius: usize,
    /// Abort a scan after this many backtracking steps
    #[arg(long, env = "RECAST_BACKTRACK_LIMIT")]
    backtrack_limit: Option<usize>,
    /// Maximum compiled pattern size in bytes
    #[arg(long, env = "RECAST_SIZE_LIMIT")]
    size_limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Engine(#[from] recast::Error),
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl LimitArgs {
    fn config(&self) -> EngineConfig {
        EngineConfig {
            context_radius: self.radius,
            budget: Budget {
                backtrack_limit: self.backtrack_limit,
                size_limit: self.size_limit,
            },
        }
    }
}

impl InputArgs {
    fn read_text(&self) -> Result<String, CliError> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            let content_type = ContentType::from_path(path)?;
            let bytes = std::fs::read(path)?;
            tracing::debug!(target: "recast", path = %path.display(), bytes = bytes.len(), "read document");
            return Ok(DocumentExtractor.extract(content_type, &bytes)?);
        }
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    }
}

impl RunArgs {
    fn config(&self) -> EngineConfig {
        self.limits.config()
    }

    fn request(&self, pattern: String, template: Option<String>, action: Action) -> Result<Request, CliError> {
        Ok(Request {
            find_pattern: pattern,
            replace_template: template,
            case_sensitive: !self.ignore_case,
            text: self.input.read_text()?,
            action,
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    telemetry::initialise(&cli.log_filter, cli.log_format)?;

    match cli.command {
        Commands::Test { pattern, run: args } => {
            let request = args.request(pattern, None, Action::Test)?;
            let outcome = process(&request, &args.config())?;
            print_outcome(&request, &outcome, args.output)
        }
        Commands::Substitute {
            pattern,
            template,
            run: args,
        } => {
            let request = args.request(pattern, Some(template), Action::Substitute)?;
            let outcome = process(&request, &args.config())?;
            print_outcome(&request, &outcome, args.output)
        }
        Commands::Translate {
            template,
            dialect,
            debug,
        } => cmd_translate(&template, &dialect, debug),
        Commands::Rules { root, command } => cmd_rules(&RuleLibrary::new(root), command),
    }
}

fn print_outcome(request: &Request, outcome: &Outcome, output: OutputFormat) -> Result<(), CliError> {
    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    match outcome {
        Outcome::Matches { matches } if matches.is_empty() => {
            println!("{}", "No matches found".red());
        }
        Outcome::Matches { matches } => {
            println!("{}", "Testing pattern...".bold());
            println!("  Pattern: {}", request.find_pattern.cyan());
            println!(
                "{} {}",
                "Found".bold(),
                format!("{} match(es)", matches.len()).green()
            );
            println!();

            for (i, m) in matches.iter().enumerate() {
                println!(
                    "  [{}] {}..{} = {}",
                    i + 1,
                    m.start_offset,
                    m.end_offset,
                    m.matched_text.green()
                );
                println!("      {}", m.context_snippet.dimmed());
            }
        }
        Outcome::Substituted { substituted_text } => {
            print!("{substituted_text}");
        }
    }
    Ok(())
}

fn cmd_translate(template: &str, dialect: &str, debug: bool) -> Result<(), CliError> {
    let dialect: Dialect = dialect.parse()?;

    if debug {
        println!("{}", TranslationReport::new(template, dialect));
    } else {
        println!("{}", "Output:".bold());
        println!("  {}", translate_template(template, dialect).to_host_syntax().green());
    }
    Ok(())
}

fn cmd_rules(library: &RuleLibrary, command: RulesCommand) -> Result<(), CliError> {
    match command {
        RulesCommand::Purposes => print_names(&library.purposes()?),
        RulesCommand::Languages { purpose } => print_names(&library.languages(&purpose)?),
        RulesCommand::Dictionaries { purpose, language } => {
            print_names(&library.dictionaries(&purpose, &language)?)
        }
        RulesCommand::Show {
            purpose,
            language,
            dictionary,
            output,
        } => {
            let dictionary = library.load(&purpose, &language, &dictionary)?;
            print_dictionary(&dictionary, output)
        }
        RulesCommand::Apply {
            purpose,
            language,
            dictionary,
            input,
            limits,
            output,
        } => {
            let names = [purpose.as_str(), language.as_str(), dictionary.as_str()];
            let substituted_text = apply_dictionary(library, names, &input, &limits)?;
            if output == OutputFormat::Json {
                let outcome = Outcome::Substituted { substituted_text };
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print!("{substituted_text}");
            }
            Ok(())
        }
    }
}

fn apply_dictionary(
    library: &RuleLibrary,
    [purpose, language, dictionary]: [&str; 3],
    input: &InputArgs,
    limits: &LimitArgs,
) -> Result<String, CliError> {
    let dictionary = library.load(purpose, language, dictionary)?;
    let active = dictionary.active_rules().count();
    tracing::debug!(target: "recast", dictionary = %dictionary.name, active, "applying dictionary");
    Ok(dictionary.apply(&input.read_text()?, &limits.config())?)
}

fn print_names(names: &[String]) -> Result<(), CliError> {
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn print_dictionary(dictionary: &Dictionary, output: OutputFormat) -> Result<(), CliError> {
    if output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(dictionary)?);
        return Ok(());
    }

    println!("{} ({} rules)", dictionary.name.bold(), dictionary.rules.len());
    for rule in &dictionary.rules {
        let status = if rule.active { "on ".green() } else { "off".dimmed() };
        println!(
            "  [{}] {} {} -> {}",
            status,
            rule.id,
            rule.find.cyan(),
            rule.replace.cyan()
        );
        if !rule.description.is_empty() {
            println!("        {}", rule.description.dimmed());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_test_command() {
        let cli = Cli::try_parse_from(["recast", "test", "cat", "--text", "cats", "-i"]).unwrap();
        let Commands::Test { pattern, run } = cli.command else {
            panic!("expected test command");
        };
        assert_eq!(pattern, "cat");
        assert!(run.ignore_case);
        assert_eq!(run.config().context_radius, DEFAULT_CONTEXT_RADIUS);
    }

    #[test]
    fn test_parse_substitute_command() {
        let cli = Cli::try_parse_from([
            "recast",
            "substitute",
            r"(\w+)@(\w+)",
            "$2 via $1",
            "--text",
            "user@host",
            "--backtrack-limit",
            "500",
        ])
        .unwrap();
        let Commands::Substitute { template, run, .. } = cli.command else {
            panic!("expected substitute command");
        };
        assert_eq!(template, "$2 via $1");
        assert_eq!(run.config().budget.backtrack_limit, Some(500));
    }

    #[test]
    fn test_text_and_file_conflict() {
        let result = Cli::try_parse_from([
            "recast", "test", "a", "--text", "a", "--file", "a.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rules_apply() {
        let cli = Cli::try_parse_from([
            "recast", "rules", "--root", "/srv/rules", "apply", "editing", "en-GB", "house.xml",
            "--text", "colour", "--radius", "10",
        ])
        .unwrap();
        let Commands::Rules { root, command } = cli.command else {
            panic!("expected rules command");
        };
        assert_eq!(root, PathBuf::from("/srv/rules"));
        let RulesCommand::Apply { dictionary, input, limits, .. } = command else {
            panic!("expected apply");
        };
        assert_eq!(dictionary, "house.xml");
        assert_eq!(input.text.as_deref(), Some("colour"));
        assert_eq!(limits.config().context_radius, 10);
    }

    #[test]
    fn test_rules_apply_from_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = temp_dir.path().join("editing").join("en-GB");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("house.xml"),
            concat!(
                r#"<dictionary>"#,
                r#"<rule id="1" find="colour" replace="color" active="true"/>"#,
                r#"<rule id="2" find="wheel" replace="disc" active="false"/>"#,
                r#"</dictionary>"#,
            ),
        )
        .unwrap();
        let root = temp_dir.path().to_string_lossy().into_owned();

        let cli = Cli::try_parse_from([
            "recast", "rules", "--root", &root, "apply", "editing", "en-GB", "house.xml",
            "--text", "Colour wheel",
        ])
        .unwrap();
        let Commands::Rules { root, command } = cli.command else {
            panic!("expected rules command");
        };
        let RulesCommand::Apply { purpose, language, dictionary, input, limits, .. } = command else {
            panic!("expected apply");
        };

        let library = RuleLibrary::new(root);
        let names = [purpose.as_str(), language.as_str(), dictionary.as_str()];
        let output = apply_dictionary(&library, names, &input, &limits).unwrap();
        assert_eq!(output, "color wheel");
    }

    #[test]
    fn test_inline_text_request() {
        let cli = Cli::try_parse_from(["recast", "test", "cat", "--text", "a cat"]).unwrap();
        let Commands::Test { pattern, run } = cli.command else {
            panic!("expected test command");
        };
        let request = run.request(pattern, None, Action::Test).unwrap();
        let outcome = process(&request, &run.config()).unwrap();
        let Outcome::Matches { matches } = outcome else {
            panic!("expected matches");
        };
        assert_eq!(matches[0].start_offset, 2);
    }
}
