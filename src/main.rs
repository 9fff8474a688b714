//! 命令行入口

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tokio::task::LocalSet;

use autotranslate::core::{
    detect_language, print_error_message, print_info_message, translate_document,
    AutoTranslateOptions,
};
use autotranslate::env::{generate_env_docs, EnvConfig};
use autotranslate::translation::{ConfigManager, TargetLanguage, TranslationResult};

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate an HTML document as if it were a live page
    Translate(TranslateArgs),

    /// Print the resolved target language and the signal that produced it
    Detect,

    /// Persist a preferred target language
    SetLanguage {
        /// Language code (e.g. 'ru', 'zh-TW')
        #[arg(value_name = "CODE")]
        code: String,
    },

    /// Remove the persisted language preference
    ClearLanguage,

    /// Print the environment variable documentation
    EnvDocs,
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input HTML file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write the result to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Force the target language instead of detecting it
    #[arg(short, long, value_name = "CODE")]
    lang: Option<String>,

    /// Root selector to translate (e.g. 'body', 'header, main')
    #[arg(short, long)]
    selector: Option<String>,

    /// Input encoding (defaults to the document's declared charset)
    #[arg(short, long)]
    encoding: Option<String>,

    /// Translation endpoint URL
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
}

/// Autotranslate - live DOM auto-translation
#[derive(Parser, Debug)]
#[command(name = "autotranslate")]
#[command(version)]
#[command(about = "Translate the text of HTML documents into the visitor's language")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// 初始化日志，输出到 stderr
fn init_logging(env_config: &EnvConfig) {
    let level = env_config
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(!env_config.no_color)
        .with_writer(io::stderr)
        .try_init();
}

fn load_options(cli: &Cli) -> TranslationResult<AutoTranslateOptions> {
    let manager = ConfigManager::load_with(cli.config.as_deref())?;
    Ok(AutoTranslateOptions {
        config: manager.into_config(),
        ..Default::default()
    })
}

async fn run_translate(mut options: AutoTranslateOptions, args: TranslateArgs) -> TranslationResult<()> {
    if let Some(endpoint) = args.endpoint {
        options.config.endpoint.url = endpoint;
        ConfigManager::validate_config(&options.config)?;
    }
    options.language = args.lang;
    options.selector = args.selector;
    options.encoding = args.encoding;

    let input = fs::read(&args.input)?;
    let result = translate_document(&input, &options).await?;

    tracing::info!(
        "已翻译为 {}: 写回 {} 处",
        result.language,
        result.stats.writes_applied
    );

    match args.output {
        Some(path) => fs::write(path, &result.html)?,
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(&result.html)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> TranslationResult<()> {
    let options = load_options(&cli)?;

    match cli.command {
        Commands::Translate(args) => run_translate(options, args).await?,
        Commands::Detect => {
            let resolution = detect_language(&options)?;
            print_info_message(resolution.language.as_str());
            match resolution.signal {
                Some(signal) => print_info_message(&format!("source: {} ({})", resolution.source, signal)),
                None => print_info_message(&format!("source: {}", resolution.source)),
            }
        }
        Commands::SetLanguage { code } => {
            let language = TargetLanguage::new(&code)?;
            let saved = options.preference_store().save(&language)?;
            print_info_message(&format!("saved {} at {}", saved.language, saved.saved_at));
        }
        Commands::ClearLanguage => {
            if options.preference_store().clear()? {
                print_info_message("cleared");
            } else {
                print_info_message("no preference stored");
            }
        }
        Commands::EnvDocs => print_info_message(&generate_env_docs()),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let env_config = EnvConfig::from_env().unwrap_or_else(|e| {
        print_error_message(&e.to_string());
        EnvConfig::default()
    });
    init_logging(&env_config);
    tracing::debug!("{}", env_config.summary());

    let result = LocalSet::new().run_until(run(cli)).await;
    if let Err(e) = result {
        print_error_message(&format!("Error: {}", e));
        process::exit(1);
    }
}
