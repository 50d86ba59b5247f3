use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use betameta::io::write_dataframe;
use betameta::ld::{
    LdAnnotationProvider, RscriptProvider, read_snp_list, write_result_annotation,
};
use betameta::logging::init_tracing;
use betameta::meta::{MetaConfig, run_meta};
use betameta::pool::DEFAULT_RANDOM_EFFECTS_THRESHOLD;
use betameta::types::ReconcileStrategy;

#[derive(Parser)]
#[command(name = "betameta")]
#[command(about = "Meta-analysis of per-study association summary statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    FirstRecord,
    MinPValue,
}

impl From<Strategy> for ReconcileStrategy {
    fn from(value: Strategy) -> Self {
        match value {
            Strategy::FirstRecord => ReconcileStrategy::FirstRecord,
            Strategy::MinPValue => ReconcileStrategy::MinPValue,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    Meta {
        #[arg(long, required = true)]
        input_dir: PathBuf,
        #[arg(long, required = true)]
        output: PathBuf,
        #[arg(long)]
        forest_plot: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Strategy::MinPValue)]
        strategy: Strategy,
        #[arg(long, default_value_t = DEFAULT_RANDOM_EFFECTS_THRESHOLD)]
        random_effects_threshold: f64,
        /// Comma separated CANONICAL=HEADER pairs, e.g. SNP=RSID,P_VAL=P
        #[arg(long)]
        column_names: Option<String>,
        #[arg(long)]
        log_name: Option<String>,
        /// R script run on the pooled SNPs after the meta-analysis
        #[arg(long, requires = "ld_output")]
        ld_script: Option<PathBuf>,
        #[arg(long, requires = "ld_script")]
        ld_output: Option<PathBuf>,
        #[arg(long)]
        rscript: Option<PathBuf>,
    },
    Ld {
        #[arg(long, required = true)]
        snps: PathBuf,
        #[arg(long, required = true)]
        script: PathBuf,
        #[arg(long, required = true)]
        output: PathBuf,
        #[arg(long)]
        rscript: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Meta {
            input_dir,
            output,
            forest_plot,
            strategy,
            random_effects_threshold,
            column_names,
            log_name,
            ld_script,
            ld_output,
            rscript,
        } => {
            let column_names = column_names
                .map(|v| parse_column_names(&v))
                .transpose()?
                .unwrap_or_default();
            let config = MetaConfig {
                input_dir,
                output,
                forest_plot,
                strategy: strategy.into(),
                random_effects_threshold,
                column_names,
                log_name,
            };
            let ld = match (ld_script, ld_output) {
                (Some(script), Some(ld_output)) => {
                    Some((RscriptProvider::new(script, rscript)?, ld_output))
                }
                _ => None,
            };
            let out = run_meta(&config)?;
            println!(
                "Meta-analysis complete: {} variant(s) from {} file(s)",
                out.report.groups, out.report.normalize.files_read
            );
            if let Some((provider, ld_output)) = &ld {
                write_result_annotation(&out.results, provider, ld_output)?;
            }
        }
        Command::Ld {
            snps,
            script,
            output,
            rscript,
        } => {
            let snps = read_snp_list(&snps)?;
            let provider = RscriptProvider::new(script, rscript)?;
            let table = provider.annotate(&snps)?;
            write_dataframe(&table, &output, "NA")?;
        }
    }

    Ok(())
}

fn split_string_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_column_names(input: &str) -> anyhow::Result<HashMap<String, String>> {
    let mut out = HashMap::new();
    for pair in split_string_list(input) {
        let (canonical, header) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected CANONICAL=HEADER, got {pair}"))?;
        out.insert(canonical.trim().to_string(), header.trim().to_string());
    }
    Ok(out)
}
